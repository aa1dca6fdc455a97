//! 运行时值

use super::error::FaultKind;
use crate::parser::Var;
use serde::{Deserialize, Serialize};

/// BASIC 的真值
pub const TRUE: f64 = -1.0;
pub const FALSE: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Str(String),
}

impl Value {
    /// 变量未赋值时的初值
    pub fn default_for(var: &Var) -> Value {
        if var.is_string() {
            Value::Str(String::new())
        } else {
            Value::Number(0.0)
        }
    }

    pub fn from_bool(b: bool) -> Value {
        Value::Number(if b { TRUE } else { FALSE })
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn as_number(&self) -> Result<f64, FaultKind> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Str(_) => Err(FaultKind::TypeMismatch),
        }
    }

    pub fn into_string(self) -> Result<String, FaultKind> {
        match self {
            Value::Str(s) => Ok(s),
            Value::Number(_) => Err(FaultKind::TypeMismatch),
        }
    }

    /// 检查能否存入 `var`
    pub fn check_for(&self, var: &Var) -> Result<(), FaultKind> {
        if self.is_string() == var.is_string() {
            Ok(())
        } else {
            Err(FaultKind::TypeMismatch)
        }
    }
}

/// 数值结果必须有限
pub fn finite(n: f64) -> Result<f64, FaultKind> {
    if n.is_finite() {
        Ok(n)
    } else if n.is_nan() {
        Err(FaultKind::IllegalFunctionCall)
    } else {
        Err(FaultKind::Overflow)
    }
}

/// 逻辑运算的操作数：四舍五入到 16 位有符号整数
pub fn to_int16(n: f64) -> Result<i32, FaultKind> {
    let rounded = n.round();
    if (-32768.0..=32767.0).contains(&rounded) {
        Ok(rounded as i32)
    } else {
        Err(FaultKind::Overflow)
    }
}

/// 非负整数参数（字符串长度、字符数等）
pub fn to_count(n: f64, max: usize) -> Result<usize, FaultKind> {
    let rounded = n.round();
    if rounded < 0.0 || rounded > max as f64 {
        Err(FaultKind::IllegalFunctionCall)
    } else {
        Ok(rounded as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_suffix() {
        assert_eq!(Value::default_for(&Var::new("A$")), Value::Str(String::new()));
        assert_eq!(Value::default_for(&Var::new("A")), Value::Number(0.0));
    }

    #[test]
    fn test_type_checks() {
        assert_eq!(Value::Str("x".into()).as_number(), Err(FaultKind::TypeMismatch));
        assert!(Value::Number(1.0).check_for(&Var::new("N%")).is_ok());
        assert_eq!(
            Value::Number(1.0).check_for(&Var::new("N$")),
            Err(FaultKind::TypeMismatch)
        );
    }

    #[test]
    fn test_int16_range() {
        assert_eq!(to_int16(32767.4), Ok(32767));
        assert_eq!(to_int16(-32768.0), Ok(-32768));
        assert_eq!(to_int16(40000.0), Err(FaultKind::Overflow));
    }

    #[test]
    fn test_finite() {
        assert_eq!(finite(f64::INFINITY), Err(FaultKind::Overflow));
        assert_eq!(finite(f64::NAN), Err(FaultKind::IllegalFunctionCall));
        assert_eq!(finite(2.5), Ok(2.5));
    }
}
