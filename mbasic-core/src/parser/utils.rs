use super::expr::BinaryOp;
use crate::lexer::TokenKind;

/// 二元运算符优先级（数值越大越先结合，0 表示不是二元运算符）
///
/// `NOT` 是一元运算符，其操作数按关系运算级别解析（见 parser），
/// 一元负号的操作数按 `NEG_PRECEDENCE` 解析，所以 `-2^2` 等于 `-(2^2)`。
pub fn get_precedence(op: TokenKind) -> i32 {
    match op {
        TokenKind::Or => 10,
        TokenKind::And => 20,
        TokenKind::Equal
        | TokenKind::NotEqual
        | TokenKind::Less
        | TokenKind::Greater
        | TokenKind::LessEqual
        | TokenKind::GreaterEqual => 40,
        TokenKind::Plus | TokenKind::Minus => 50,
        TokenKind::Mod => 60,
        TokenKind::Asterisk | TokenKind::Slash => 70,
        TokenKind::Caret => 90,
        _ => 0,
    }
}

pub const NOT_PRECEDENCE: i32 = 30;
pub const NEG_PRECEDENCE: i32 = 80;

pub fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Or => BinaryOp::Or,
        TokenKind::And => BinaryOp::And,
        TokenKind::Equal => BinaryOp::Eq,
        TokenKind::NotEqual => BinaryOp::Ne,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::LessEqual => BinaryOp::Le,
        TokenKind::GreaterEqual => BinaryOp::Ge,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Mod => BinaryOp::Mod,
        TokenKind::Asterisk => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Caret => BinaryOp::Pow,
        _ => return None,
    };
    Some(op)
}
