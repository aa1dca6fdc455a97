//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use mbasic_config::Phase;
use mbasic_core::parser::ErrorLocation;
use mbasic_core::{CompileError, FaultKind};
use serde::Serialize;
use thiserror::Error;

/// 词法错误（结构化）
pub use mbasic_core::LexerError;

/// 语法错误（结构化）
pub use mbasic_core::ParserError;

/// 运行时错误（带 BASIC 行号）
pub use mbasic_core::RuntimeFault;

/// 会话错误类型
///
/// `Display` 即会话 `last_error()` 的文本。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// 词法分析错误
    #[error("Lexer error at line {}, col {}: {}", .0.line(), .0.column(), .0.message)]
    Lexer(LexerError),

    /// 语法分析错误
    #[error("{}", parse_text(.0))]
    Parser(ParserError),

    /// 运行时错误
    #[error("Runtime error at line {}: {}", .0.line, .0.kind)]
    Runtime(RuntimeFault),
}

fn parse_text(e: &ParserError) -> String {
    match (e.line(), e.column()) {
        (Some(line), Some(col)) => format!("Parse error at line {line}, col {col}: {}", e.message()),
        _ => format!("Parse error at end of input: {}", e.message()),
    }
}

impl From<CompileError> for SessionError {
    fn from(e: CompileError) -> Self {
        match e {
            CompileError::Lexer(e) => SessionError::Lexer(e),
            CompileError::Parser(e) => SessionError::Parser(e),
        }
    }
}

impl From<RuntimeFault> for SessionError {
    fn from(e: RuntimeFault) -> Self {
        SessionError::Runtime(e)
    }
}

impl SessionError {
    /// 获取错误行号
    ///
    /// 词法/语法错误是源码行（1 起）；运行时错误是 BASIC 行号。
    pub fn line(&self) -> Option<usize> {
        match self {
            SessionError::Lexer(e) => Some(e.line()),
            SessionError::Parser(e) => e.line(),
            SessionError::Runtime(e) => Some(e.line as usize),
        }
    }

    /// 获取错误列号（运行时错误没有列号）
    pub fn column(&self) -> Option<usize> {
        match self {
            SessionError::Lexer(e) => Some(e.column()),
            SessionError::Parser(e) => e.column(),
            SessionError::Runtime(_) => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            SessionError::Lexer(_) => Phase::Lexer,
            SessionError::Parser(_) => Phase::Parser,
            SessionError::Runtime(_) => Phase::Vm,
        }
    }

    /// MBASIC 错误码（仅运行时错误）
    pub fn code(&self) -> Option<u8> {
        match self {
            SessionError::Runtime(e) => Some(e.code()),
            _ => None,
        }
    }

    /// 是否在载入阶段产生（源码上下文有意义）
    pub fn is_load_error(&self) -> bool {
        !matches!(self, SessionError::Runtime(_))
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 可以直接打印，上层应用可以序列化为 JSON。
    pub fn to_report(&self) -> ErrorReport {
        match self {
            SessionError::Lexer(e) => ErrorReport {
                phase: Phase::Lexer,
                line: Some(e.line()),
                column: Some(e.column()),
                error_kind: format!("{:?}", e.kind),
                code: None,
                message: e.message.clone(),
            },
            SessionError::Parser(e) => {
                let (line, column) = match &e.location {
                    ErrorLocation::At(coord) => (Some(coord.line), Some(coord.column)),
                    ErrorLocation::Eof => (None, None),
                };
                ErrorReport {
                    phase: Phase::Parser,
                    line,
                    column,
                    error_kind: kind_name(&format!("{:?}", e.kind)),
                    code: None,
                    message: e.message(),
                }
            }
            SessionError::Runtime(e) => ErrorReport {
                phase: Phase::Vm,
                line: Some(e.line as usize),
                column: None,
                error_kind: kind_name(&format!("{:?}", e.kind)),
                code: Some(e.code()),
                message: e.kind.to_string(),
            },
        }
    }

    pub fn fault_kind(&self) -> Option<&FaultKind> {
        match self {
            SessionError::Runtime(e) => Some(&e.kind),
            _ => None,
        }
    }
}

/// `UnexpectedToken { .. }` → `UnexpectedToken`
fn kind_name(debug: &str) -> String {
    debug
        .split(|c: char| c == ' ' || c == '(' || c == '{')
        .next()
        .unwrap_or(debug)
        .to_string()
}

/// 结构化错误报告
///
/// 上层应用（CLI、Web）可以根据自己的需求格式化。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// 错误阶段: lexer, parser, vm
    pub phase: Phase,
    /// 行号；运行时错误为 BASIC 行号
    pub line: Option<usize>,
    /// 列号（1 起）
    pub column: Option<usize>,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    /// MBASIC 错误码
    pub code: Option<u8>,
    /// 人类可读的错误消息
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(
                f,
                "[{}:{}] {} error: {}",
                line,
                col,
                self.phase.as_str(),
                self.message
            ),
            (Some(line), None) => write!(
                f,
                "[line {}] {} error: {}",
                line,
                self.phase.as_str(),
                self.message
            ),
            _ => write!(f, "[{}] error: {}", self.phase.as_str(), self.message),
        }
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式（Web API 使用）
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase.as_str(), self.message)
    }
}
