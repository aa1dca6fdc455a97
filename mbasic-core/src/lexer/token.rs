//! MBASIC Token 类型定义

use super::types::Span;
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
#[repr(u8)]
pub enum TokenKind {
    // 语句关键字
    Print = 0,
    Input,
    Line,
    Let,
    Goto,
    Gosub,
    Return,
    If,
    Then,
    Else,
    For,
    To,
    Step,
    Next,
    End,
    Stop,
    Rem,
    Open,
    Close,
    As,
    Kill,
    Name,
    Get,
    Put,
    Cls,
    Width,
    Output,
    Append,
    Random,

    // 运算符关键字
    And = 50,
    Or,
    Not,
    Mod,

    // 字面量
    Number = 100,
    String,

    // 标识符（含类型后缀，如 `A$`、`N%`）
    Identifier = 120,

    // 双字符符号
    NotEqual = 130,
    LessEqual,
    GreaterEqual,

    // 单字符符号
    Equal = 150,
    Less,
    Greater,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Caret,
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Colon,
    Hash,

    // 结构
    Newline = 200,
    #[default]
    Eof,
}

/// 关键字表（大写拼写 → token）
static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("PRINT", Print),
        ("INPUT", Input),
        ("LINE", Line),
        ("LET", Let),
        ("GOTO", Goto),
        ("GOSUB", Gosub),
        ("RETURN", Return),
        ("IF", If),
        ("THEN", Then),
        ("ELSE", Else),
        ("FOR", For),
        ("TO", To),
        ("STEP", Step),
        ("NEXT", Next),
        ("END", End),
        ("STOP", Stop),
        ("REM", Rem),
        ("OPEN", Open),
        ("CLOSE", Close),
        ("AS", As),
        ("KILL", Kill),
        ("NAME", Name),
        ("GET", Get),
        ("PUT", Put),
        ("CLS", Cls),
        ("WIDTH", Width),
        ("OUTPUT", Output),
        ("APPEND", Append),
        ("RANDOM", Random),
        ("AND", And),
        ("OR", Or),
        ("NOT", Not),
        ("MOD", Mod),
    ])
});

impl TokenKind {
    /// 按大写拼写查找关键字
    pub fn keyword(word: &str) -> Option<TokenKind> {
        KEYWORDS.get(word).copied()
    }

    pub fn is_keyword(&self) -> bool {
        (*self as u8) < 100
    }

    /// 用于错误消息的可读名称
    pub fn describe(&self) -> &'static str {
        use TokenKind::*;
        match *self {
            Number => "number",
            String => "string",
            Identifier => "identifier",
            NotEqual => "'<>'",
            LessEqual => "'<='",
            GreaterEqual => "'>='",
            Equal => "'='",
            Less => "'<'",
            Greater => "'>'",
            Plus => "'+'",
            Minus => "'-'",
            Asterisk => "'*'",
            Slash => "'/'",
            Caret => "'^'",
            LeftParen => "'('",
            RightParen => "')'",
            Comma => "','",
            Semicolon => "';'",
            Colon => "':'",
            Hash => "'#'",
            Newline => "end of line",
            Eof => "end of input",
            keyword => KEYWORDS
                .iter()
                .find(|(_, kind)| **kind == keyword)
                .map(|(word, _)| *word)
                .unwrap_or("keyword"),
        }
    }
}

impl From<TokenKind> for u8 {
    fn from(val: TokenKind) -> Self {
        val as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 原始文本：标识符为大写名称，字符串为去掉引号的内容，数字为原文
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}
