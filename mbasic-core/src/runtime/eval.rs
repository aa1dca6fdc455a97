//! 表达式求值与内建函数

use super::error::FaultKind;
use super::format::{format_number, parse_prefix};
use super::machine::{Devices, Machine};
use super::value::{finite, to_count, to_int16, Value};
use crate::parser::{BinaryOp, Builtin, Expr, UnaryOp};
use mbasic_vfs::OpenMode;

/// 字符串最大长度
pub const MAX_STRING: usize = 255;

/// 顺序文件的 LOC 以 128 字节为一个记录
const SEQUENTIAL_RECORD: usize = 128;

impl Machine {
    pub(super) fn eval(&self, expr: &Expr, dev: &mut Devices<'_>) -> Result<Value, FaultKind> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Var(var) => Ok(self.variable(var)),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, dev)?.as_number()?;
                let result = match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Not => f64::from(!to_int16(value)?),
                };
                Ok(Value::Number(result))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, dev)?;
                let right = self.eval(right, dev)?;
                binary(*op, left, right)
            }
            Expr::Call { func, args } => self.call(*func, args, dev),
        }
    }

    pub(super) fn eval_number(&self, expr: &Expr, dev: &mut Devices<'_>) -> Result<f64, FaultKind> {
        self.eval(expr, dev)?.as_number()
    }

    pub(super) fn eval_string(&self, expr: &Expr, dev: &mut Devices<'_>) -> Result<String, FaultKind> {
        self.eval(expr, dev)?.into_string()
    }

    fn call(&self, func: Builtin, args: &[Expr], dev: &mut Devices<'_>) -> Result<Value, FaultKind> {
        let value = match func {
            Builtin::Len => {
                let s = self.eval_string(arg(args, 0)?, dev)?;
                Value::Number(s.chars().count() as f64)
            }
            Builtin::Left => {
                let s = self.eval_string(arg(args, 0)?, dev)?;
                let n = to_count(self.eval_number(arg(args, 1)?, dev)?, MAX_STRING)?;
                Value::Str(s.chars().take(n).collect())
            }
            Builtin::Right => {
                let s = self.eval_string(arg(args, 0)?, dev)?;
                let n = to_count(self.eval_number(arg(args, 1)?, dev)?, MAX_STRING)?;
                let skip = s.chars().count().saturating_sub(n);
                Value::Str(s.chars().skip(skip).collect())
            }
            Builtin::Mid => {
                let s = self.eval_string(arg(args, 0)?, dev)?;
                let start = to_count(self.eval_number(arg(args, 1)?, dev)?, MAX_STRING)?;
                if start == 0 {
                    return Err(FaultKind::IllegalFunctionCall);
                }
                let len = match args.get(2) {
                    Some(arg) => to_count(self.eval_number(arg, dev)?, MAX_STRING)?,
                    None => usize::MAX,
                };
                Value::Str(s.chars().skip(start - 1).take(len).collect())
            }
            Builtin::Str => Value::Str(format_number(self.eval_number(arg(args, 0)?, dev)?)),
            Builtin::Val => Value::Number(parse_prefix(&self.eval_string(arg(args, 0)?, dev)?)),
            Builtin::Chr => {
                let code = to_count(self.eval_number(arg(args, 0)?, dev)?, 255)?;
                Value::Str(char::from(code as u8).to_string())
            }
            Builtin::Asc => {
                let s = self.eval_string(arg(args, 0)?, dev)?;
                let first = s.chars().next().ok_or(FaultKind::IllegalFunctionCall)?;
                Value::Number(f64::from(u32::from(first)))
            }
            Builtin::Int => Value::Number(self.eval_number(arg(args, 0)?, dev)?.floor()),
            Builtin::Abs => Value::Number(self.eval_number(arg(args, 0)?, dev)?.abs()),
            Builtin::Sgn => {
                let n = self.eval_number(arg(args, 0)?, dev)?;
                let sign = if n > 0.0 {
                    1.0
                } else if n < 0.0 {
                    -1.0
                } else {
                    0.0
                };
                Value::Number(sign)
            }
            Builtin::Sqr => {
                let n = self.eval_number(arg(args, 0)?, dev)?;
                if n < 0.0 {
                    return Err(FaultKind::IllegalFunctionCall);
                }
                Value::Number(n.sqrt())
            }
            Builtin::Eof => {
                let channel = self.eval_channel(arg(args, 0)?, dev)?;
                let handle = self.handle(channel)?;
                let buffered = self.fields.get(&channel).is_some_and(|q| !q.is_empty());
                Value::from_bool(!buffered && dev.files.eof(handle)?)
            }
            Builtin::Lof => {
                let handle = self.handle(self.eval_channel(arg(args, 0)?, dev)?)?;
                Value::Number(dev.files.length(handle)? as f64)
            }
            Builtin::Loc => {
                let handle = self.handle(self.eval_channel(arg(args, 0)?, dev)?)?;
                let record_length = match dev.files.mode(handle)? {
                    OpenMode::Random => dev.files.record_length(handle)?,
                    _ => SEQUENTIAL_RECORD,
                };
                Value::Number((dev.files.position(handle)? / record_length.max(1)) as f64)
            }
            Builtin::Pos => {
                self.eval(arg(args, 0)?, dev)?;
                Value::Number((dev.terminal.column() + 1) as f64)
            }
            Builtin::InputChars => {
                let n = to_count(self.eval_number(arg(args, 0)?, dev)?, MAX_STRING)?;
                if n == 0 {
                    return Err(FaultKind::IllegalFunctionCall);
                }
                match args.get(1) {
                    Some(channel) => {
                        let handle = self.handle(self.eval_channel(channel, dev)?)?;
                        let text = dev.files.read_chars(handle, n)?;
                        if text.chars().count() < n {
                            return Err(FaultKind::InputPastEnd);
                        }
                        Value::Str(text)
                    }
                    // 键盘：只取已经缓冲的按键
                    None => {
                        let mut text = String::new();
                        while text.chars().count() < n {
                            match dev.terminal.inkey() {
                                Some(key) => text.push(key),
                                None => break,
                            }
                        }
                        Value::Str(text)
                    }
                }
            }
            Builtin::Inkey => Value::Str(dev.terminal.inkey().map(String::from).unwrap_or_default()),
        };
        Ok(value)
    }
}

fn arg(args: &[Expr], index: usize) -> Result<&Expr, FaultKind> {
    args.get(index).ok_or(FaultKind::IllegalFunctionCall)
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, FaultKind> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => numeric(op, a, b),
        (Value::Str(a), Value::Str(b)) => {
            let result = match op {
                BinaryOp::Add => {
                    if a.chars().count() + b.chars().count() > MAX_STRING {
                        return Err(FaultKind::StringTooLong);
                    }
                    return Ok(Value::Str(a + &b));
                }
                BinaryOp::Eq => a == b,
                BinaryOp::Ne => a != b,
                BinaryOp::Lt => a < b,
                BinaryOp::Le => a <= b,
                BinaryOp::Gt => a > b,
                BinaryOp::Ge => a >= b,
                _ => return Err(FaultKind::TypeMismatch),
            };
            Ok(Value::from_bool(result))
        }
        _ => Err(FaultKind::TypeMismatch),
    }
}

fn numeric(op: BinaryOp, a: f64, b: f64) -> Result<Value, FaultKind> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(FaultKind::DivisionByZero);
            }
            a / b
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(FaultKind::DivisionByZero);
            }
            a.powf(b)
        }
        BinaryOp::Mod => {
            let (x, y) = (a.round(), b.round());
            if y == 0.0 {
                return Err(FaultKind::DivisionByZero);
            }
            x % y
        }
        BinaryOp::Eq => return Ok(Value::from_bool(a == b)),
        BinaryOp::Ne => return Ok(Value::from_bool(a != b)),
        BinaryOp::Lt => return Ok(Value::from_bool(a < b)),
        BinaryOp::Le => return Ok(Value::from_bool(a <= b)),
        BinaryOp::Gt => return Ok(Value::from_bool(a > b)),
        BinaryOp::Ge => return Ok(Value::from_bool(a >= b)),
        BinaryOp::And => f64::from(to_int16(a)? & to_int16(b)?),
        BinaryOp::Or => f64::from(to_int16(a)? | to_int16(b)?),
    };
    Ok(Value::Number(finite(result)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(binary(BinaryOp::Add, num(2.0), num(3.0)), Ok(num(5.0)));
        assert_eq!(binary(BinaryOp::Pow, num(2.0), num(10.0)), Ok(num(1024.0)));
        assert_eq!(binary(BinaryOp::Mod, num(7.0), num(3.0)), Ok(num(1.0)));
        assert_eq!(binary(BinaryOp::Mod, num(-7.0), num(3.0)), Ok(num(-1.0)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            binary(BinaryOp::Div, num(1.0), num(0.0)),
            Err(FaultKind::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Mod, num(1.0), num(0.4)),
            Err(FaultKind::DivisionByZero)
        );
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            binary(BinaryOp::Mul, num(1e300), num(1e300)),
            Err(FaultKind::Overflow)
        );
    }

    #[test]
    fn test_comparisons_yield_minus_one() {
        assert_eq!(binary(BinaryOp::Lt, num(1.0), num(2.0)), Ok(num(-1.0)));
        assert_eq!(binary(BinaryOp::Gt, num(1.0), num(2.0)), Ok(num(0.0)));
        assert_eq!(
            binary(BinaryOp::Eq, Value::Str("A".into()), Value::Str("A".into())),
            Ok(num(-1.0))
        );
    }

    #[test]
    fn test_logic_is_bitwise() {
        assert_eq!(binary(BinaryOp::And, num(-1.0), num(5.0)), Ok(num(5.0)));
        assert_eq!(binary(BinaryOp::Or, num(4.0), num(1.0)), Ok(num(5.0)));
    }

    #[test]
    fn test_string_concat_and_mismatch() {
        assert_eq!(
            binary(BinaryOp::Add, Value::Str("AB".into()), Value::Str("C".into())),
            Ok(Value::Str("ABC".into()))
        );
        assert_eq!(
            binary(BinaryOp::Add, Value::Str("A".into()), num(1.0)),
            Err(FaultKind::TypeMismatch)
        );
        assert_eq!(
            binary(BinaryOp::Sub, Value::Str("A".into()), Value::Str("B".into())),
            Err(FaultKind::TypeMismatch)
        );
    }
}
