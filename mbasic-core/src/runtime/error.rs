//! 运行时错误
//!
//! 每个错误都带 MBASIC 的错误码，消息文本与 MBASIC 一致。

use mbasic_vfs::FileError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    #[error("NEXT without FOR")]
    NextWithoutFor,
    #[error("RETURN without GOSUB")]
    ReturnWithoutGosub,
    #[error("Illegal function call")]
    IllegalFunctionCall,
    #[error("Overflow")]
    Overflow,
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Undefined line number")]
    UndefinedLine,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Type mismatch")]
    TypeMismatch,
    #[error("String too long")]
    StringTooLong,
    #[error("FOR without NEXT")]
    ForWithoutNext,
    #[error("Bad file number")]
    BadFileNumber,
    #[error("File not found")]
    FileNotFound,
    #[error("Bad file mode")]
    BadFileMode,
    #[error("File already open")]
    FileAlreadyOpen,
    #[error("Device I/O error")]
    DeviceIo,
    #[error("File already exists")]
    FileAlreadyExists,
    #[error("Disk full")]
    DiskFull,
    #[error("Input past end")]
    InputPastEnd,
    #[error("Bad record number")]
    BadRecordNumber,
}

impl FaultKind {
    /// MBASIC 错误码（`ERR` 的值）
    pub fn code(&self) -> u8 {
        match self {
            FaultKind::NextWithoutFor => 1,
            FaultKind::ReturnWithoutGosub => 3,
            FaultKind::IllegalFunctionCall => 5,
            FaultKind::Overflow => 6,
            FaultKind::OutOfMemory => 7,
            FaultKind::UndefinedLine => 8,
            FaultKind::DivisionByZero => 11,
            FaultKind::TypeMismatch => 13,
            FaultKind::StringTooLong => 15,
            FaultKind::ForWithoutNext => 26,
            FaultKind::BadFileNumber => 52,
            FaultKind::FileNotFound => 53,
            FaultKind::BadFileMode => 54,
            FaultKind::FileAlreadyOpen => 55,
            FaultKind::DeviceIo => 57,
            FaultKind::FileAlreadyExists => 58,
            FaultKind::DiskFull => 61,
            FaultKind::InputPastEnd => 62,
            FaultKind::BadRecordNumber => 63,
        }
    }
}

impl From<FileError> for FaultKind {
    fn from(error: FileError) -> Self {
        match error {
            FileError::NotFound { .. } => FaultKind::FileNotFound,
            FileError::BadHandle(_) => FaultKind::BadFileNumber,
            FileError::BadRecord { .. } | FileError::BadRecordLength { .. } => {
                FaultKind::BadRecordNumber
            }
            FileError::TooLarge { .. } => FaultKind::DiskFull,
            FileError::Store(_) => FaultKind::DeviceIo,
        }
    }
}

/// 带行号的运行时错误
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} in {line}")]
pub struct RuntimeFault {
    /// 出错语句所在的 BASIC 行号
    pub line: u32,
    pub kind: FaultKind,
}

impl RuntimeFault {
    pub fn new(line: u32, kind: FaultKind) -> Self {
        Self { line, kind }
    }

    pub fn code(&self) -> u8 {
        self.kind.code()
    }

    /// 不带行号的消息
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbasic_vfs::{Handle, StoreError};

    #[test]
    fn test_display_matches_mbasic() {
        let fault = RuntimeFault::new(30, FaultKind::DivisionByZero);
        assert_eq!(fault.to_string(), "Division by zero in 30");
        assert_eq!(fault.code(), 11);
        assert_eq!(fault.message(), "Division by zero");
    }

    #[test]
    fn test_file_error_mapping() {
        let cases = [
            (
                FileError::NotFound { name: "X".into() },
                FaultKind::FileNotFound,
            ),
            (FileError::BadHandle(Handle(3)), FaultKind::BadFileNumber),
            (FileError::BadRecord { record: 0 }, FaultKind::BadRecordNumber),
            (FileError::TooLarge { length: usize::MAX }, FaultKind::DiskFull),
            (
                FileError::Store(StoreError::Poisoned),
                FaultKind::DeviceIo,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(FaultKind::from(error), expected);
        }
    }
}
