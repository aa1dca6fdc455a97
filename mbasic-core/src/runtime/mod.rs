//! 运行时：可挂起的逐语句执行机
//!
//! - `Machine`：程序计数器、变量、FOR/GOSUB 栈、文件通道
//! - 表达式求值与内建函数
//! - PRINT 排版、INPUT 的挂起与恢复
//! - 文件语句（经由 `FileSystem`）

mod console;
pub mod error;
mod eval;
mod files;
pub mod format;
pub mod machine;
pub mod value;

pub use error::{FaultKind, RuntimeFault};
pub use files::MAX_CHANNELS;
pub use machine::{Devices, Halt, InputTarget, Machine, Pc, PendingInput, Step};
pub use value::Value;
