//! 语法分析：token 序列 → `Program`

pub mod error;
pub mod expr;
pub mod parser;
pub mod program;
pub mod stmt;
mod utils;

pub use error::{ErrorLocation, ParseResult, ParserError, ParserErrorKind};
pub use expr::{BinaryOp, Builtin, Expr, UnaryOp, Var};
pub use parser::{parse, Parser};
pub use program::{Program, ProgramLine};
pub use stmt::{ModeSpec, PrintItem, Stmt};
