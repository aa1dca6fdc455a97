//! 表达式 AST

use serde::{Deserialize, Serialize};

/// 变量引用；名称包含类型后缀，`A` 与 `A$` 是两个不同的变量
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
}

impl Var {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_string(&self) -> bool {
        self.name.ends_with('$')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// 内建函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Builtin {
    Len,
    Left,
    Right,
    Mid,
    Str,
    Val,
    Chr,
    Asc,
    Int,
    Abs,
    Sgn,
    Sqr,
    Eof,
    Lof,
    Loc,
    Pos,
    InputChars,
    Inkey,
}

impl Builtin {
    /// 按名称（大写，含 `$`）查找
    pub fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "LEN" => Builtin::Len,
            "LEFT$" => Builtin::Left,
            "RIGHT$" => Builtin::Right,
            "MID$" => Builtin::Mid,
            "STR$" => Builtin::Str,
            "VAL" => Builtin::Val,
            "CHR$" => Builtin::Chr,
            "ASC" => Builtin::Asc,
            "INT" => Builtin::Int,
            "ABS" => Builtin::Abs,
            "SGN" => Builtin::Sgn,
            "SQR" => Builtin::Sqr,
            "EOF" => Builtin::Eof,
            "LOF" => Builtin::Lof,
            "LOC" => Builtin::Loc,
            "POS" => Builtin::Pos,
            "INPUT$" => Builtin::InputChars,
            "INKEY$" => Builtin::Inkey,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Len => "LEN",
            Builtin::Left => "LEFT$",
            Builtin::Right => "RIGHT$",
            Builtin::Mid => "MID$",
            Builtin::Str => "STR$",
            Builtin::Val => "VAL",
            Builtin::Chr => "CHR$",
            Builtin::Asc => "ASC",
            Builtin::Int => "INT",
            Builtin::Abs => "ABS",
            Builtin::Sgn => "SGN",
            Builtin::Sqr => "SQR",
            Builtin::Eof => "EOF",
            Builtin::Lof => "LOF",
            Builtin::Loc => "LOC",
            Builtin::Pos => "POS",
            Builtin::InputChars => "INPUT$",
            Builtin::Inkey => "INKEY$",
        }
    }

    /// 允许的参数个数范围
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Builtin::Inkey => (0, 0),
            Builtin::Left | Builtin::Right => (2, 2),
            Builtin::Mid => (2, 3),
            Builtin::InputChars => (1, 2),
            _ => (1, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Str(String),
    Var(Var),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
    },
}
