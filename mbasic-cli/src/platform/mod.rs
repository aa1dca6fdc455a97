//! Platform - 平台适配层
//!
//! 所有 IO 副作用都在这里实现：
//! - CLI 格式化输出
//! - 标准输入输出控制台
//! - Ctrl-C 处理

pub mod cli;
pub mod console;
pub mod interrupt;

// 重导出 CLI 功能
pub use cli::{print_error_with_source, print_source_context};
pub use console::StdConsole;
pub use interrupt::{Interrupt, INTERRUPTED_EXIT_CODE};
