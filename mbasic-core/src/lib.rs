//! MBASIC Core - 解释器核心（纯逻辑，不直接做 IO）
//!
//! 包含词法分析、语法分析和可挂起的执行机。
//! 终端与文件都经由注入的 `Terminal` / `FileSystem` 访问，
//! 本 crate 不读写真实终端，也不接触宿主文件系统。
//!
//! 配置通过参数显式传入，不使用全局状态。

pub mod io;
pub mod lexer;
pub mod parser;
pub mod runtime;

use thiserror::Error;
use tracing::debug;

pub use io::{HostConsole, InputReply, MemoryConsole, Terminal};
pub use lexer::{Coordinate, LexerError};
pub use parser::{ParserError, Program, ProgramLine, Stmt};
pub use runtime::{
    Devices, FaultKind, Halt, InputTarget, Machine, Pc, PendingInput, RuntimeFault, Step, Value,
};

// Re-export config types from mbasic-config
pub use mbasic_config::{ExecConfig, FileConfig, Phase, TerminalConfig, INFINITE_WIDTH};

/// 编译期错误：词法或语法
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Lexer error: {0}")]
    Lexer(#[from] LexerError),
    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),
}

impl CompileError {
    /// 源码行号（1 起）；语法错误落在输入末尾时为 `None`
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::Lexer(e) => Some(e.line()),
            CompileError::Parser(e) => e.line(),
        }
    }

    pub fn column(&self) -> Option<usize> {
        match self {
            CompileError::Lexer(e) => Some(e.column()),
            CompileError::Parser(e) => e.column(),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            CompileError::Lexer(_) => Phase::Lexer,
            CompileError::Parser(_) => Phase::Parser,
        }
    }
}

/// 源码 → 按行号排序的程序
pub fn compile(source: &str) -> Result<Program, CompileError> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::parse(tokens)?;
    debug!(
        target: "mbasic::parser",
        lines = program.len(),
        "program compiled"
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_sorts_lines() {
        let program = compile("20 PRINT 2\n10 PRINT 1\n").unwrap();
        let numbers: Vec<u32> = program.lines().iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![10, 20]);
    }

    #[test]
    fn test_lexer_error_has_position() {
        let err = compile("10 PRINT \"open\n").unwrap_err();
        assert!(matches!(err, CompileError::Lexer(_)));
        assert_eq!(err.line(), Some(1));
        assert_eq!(err.phase(), Phase::Lexer);
    }

    #[test]
    fn test_parser_error_has_position() {
        let err = compile("10 PRINT 1\n20 GOTO\n").unwrap_err();
        assert!(matches!(err, CompileError::Parser(_)));
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.phase(), Phase::Parser);
    }
}
