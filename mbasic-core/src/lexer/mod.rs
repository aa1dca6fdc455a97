//! 词法分析
//!
//! 把整段程序源码切分为 token 序列。行结构通过 `Newline` token 保留，
//! 行号（`10`、`20`……）本身只是普通的 `Number` token，由 parser 解释。
//!
//! 关键字之间必须有分隔（`FOR I=1 TO 9`），不支持 MBASIC 的关键字粘连写法。

pub mod error;
pub mod token;
pub mod types;

pub use error::{ErrorKind, LexerError};
pub use token::{Token, TokenKind};
pub use types::{Coordinate, Span};

use tracing::trace;

const TARGET: &str = "mbasic::lexer";

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// 完整扫描源码；遇到第一个错误即停止
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        while let Some(ch) = self.peek() {
            let start = self.coordinate();
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    self.push(TokenKind::Newline, start, "");
                    self.advance();
                }
                '"' => self.scan_string(start)?,
                '\'' => self.scan_remark(start),
                c if c.is_ascii_digit() => self.scan_number(start)?,
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.scan_number(start)?
                }
                c if c.is_ascii_alphabetic() => self.scan_word(start),
                '?' => {
                    self.advance();
                    self.push(TokenKind::Print, start, "PRINT");
                }
                '<' => {
                    self.advance();
                    let kind = match self.peek() {
                        Some('>') => self.take(TokenKind::NotEqual),
                        Some('=') => self.take(TokenKind::LessEqual),
                        _ => TokenKind::Less,
                    };
                    self.push(kind, start, "");
                }
                '>' => {
                    self.advance();
                    let kind = match self.peek() {
                        Some('=') => self.take(TokenKind::GreaterEqual),
                        Some('<') => self.take(TokenKind::NotEqual),
                        _ => TokenKind::Greater,
                    };
                    self.push(kind, start, "");
                }
                '=' => {
                    self.advance();
                    let kind = match self.peek() {
                        Some('<') => self.take(TokenKind::LessEqual),
                        Some('>') => self.take(TokenKind::GreaterEqual),
                        _ => TokenKind::Equal,
                    };
                    self.push(kind, start, "");
                }
                _ => {
                    let kind = match ch {
                        '+' => TokenKind::Plus,
                        '-' => TokenKind::Minus,
                        '*' => TokenKind::Asterisk,
                        '/' => TokenKind::Slash,
                        '^' => TokenKind::Caret,
                        '(' => TokenKind::LeftParen,
                        ')' => TokenKind::RightParen,
                        ',' => TokenKind::Comma,
                        ';' => TokenKind::Semicolon,
                        ':' => TokenKind::Colon,
                        '#' => TokenKind::Hash,
                        other => return Err(LexerError::at(ErrorKind::InvalidChar(other), start)),
                    };
                    self.advance();
                    self.push(kind, start, "");
                }
            }
        }
        let end = self.coordinate();
        self.push(TokenKind::Eof, end, "");
        trace!(target: TARGET, tokens = self.tokens.len(), lines = self.line, "tokenized");
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// 消费一个字符并返回给定 kind（用于双字符符号）
    fn take(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.line, self.column)
    }

    fn push(&mut self, kind: TokenKind, start: Coordinate, text: impl Into<String>) {
        let span = Span::new(start, self.coordinate());
        self.tokens.push(Token::new(kind, span, text));
    }

    fn scan_string(&mut self, start: Coordinate) -> Result<(), LexerError> {
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\n') | None => {
                    return Err(LexerError::at(ErrorKind::UnterminatedString, start));
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        self.push(TokenKind::String, start, text);
        Ok(())
    }

    /// `REM` 和 `'` 注释吞掉本行剩余内容
    fn scan_remark(&mut self, start: Coordinate) {
        if self.peek() == Some('\'') {
            self.advance();
        }
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        self.push(TokenKind::Rem, start, text.trim_end_matches('\r').to_string());
    }

    fn scan_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(c);
            self.advance();
        }
    }

    fn scan_number(&mut self, start: Coordinate) -> Result<(), LexerError> {
        let mut text = String::new();
        self.scan_digits(&mut text);
        if self.peek() == Some('.') {
            text.push('.');
            self.advance();
            self.scan_digits(&mut text);
        }

        // 指数部分：只有后面紧跟数字或符号时才视为指数，否则留给标识符
        if matches!(self.peek(), Some('E' | 'e' | 'D' | 'd')) {
            let next = self.peek_at(1);
            let signed = matches!(next, Some('+' | '-'));
            let digit_after = if signed { self.peek_at(2) } else { next };
            if signed || digit_after.is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                text.push('E');
                if signed {
                    if let Some(sign) = self.advance() {
                        text.push(sign);
                    }
                }
                let before = text.len();
                self.scan_digits(&mut text);
                if text.len() == before {
                    return Err(LexerError::at(ErrorKind::InvalidNumber(text), start));
                }
            }
        }

        // 类型后缀对数值没有影响
        if matches!(self.peek(), Some('!' | '#' | '%')) {
            self.advance();
        }

        if text.parse::<f64>().is_err() {
            return Err(LexerError::at(ErrorKind::InvalidNumber(text), start));
        }
        self.push(TokenKind::Number, start, text);
        Ok(())
    }

    fn scan_word(&mut self, start: Coordinate) {
        let mut word = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '.') {
            word.push(c.to_ascii_uppercase());
            self.advance();
        }

        // `$` 后缀永远构成标识符（`A$`、`LEFT$`、`INPUT$`）
        if self.peek() == Some('$') {
            self.advance();
            word.push('$');
            self.push(TokenKind::Identifier, start, word);
            return;
        }

        if let Some(kind) = TokenKind::keyword(&word) {
            if kind == TokenKind::Rem {
                self.scan_remark(start);
            } else {
                self.push(kind, start, word);
            }
            return;
        }

        if let Some(suffix) = self.peek().filter(|c| matches!(c, '%' | '!' | '#')) {
            self.advance();
            word.push(suffix);
        }
        self.push(TokenKind::Identifier, start, word);
    }
}

/// 便捷函数：扫描整段源码
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    Lexer::new(source).tokenize()
}
