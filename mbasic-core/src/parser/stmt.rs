//! 语句 AST
//!
//! 一行里的语句是扁平列表。`IF` 不嵌套子语句：THEN 分支就是紧跟其后的
//! 语句，`else_at` 指向 ELSE 分支在本行中的下标；THEN 分支执行到 `Else`
//! 标记时跳到下一行。这样程序计数器只需要（行下标, 语句下标）两个数。

use super::expr::{Expr, Var};
use mbasic_vfs::OpenMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrintItem {
    Expr(Expr),
    Tab(Expr),
    Spc(Expr),
    /// `,` 跳到下一个输出区
    Comma,
    /// `;` 紧接输出
    Semicolon,
}

/// OPEN 的模式：关键字写法在解析时确定，`OPEN "O", #1, ...` 写法在运行时求值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModeSpec {
    Fixed(OpenMode),
    Dynamic(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Rem,
    Let {
        target: Var,
        value: Expr,
    },
    Print {
        channel: Option<Expr>,
        items: Vec<PrintItem>,
    },
    Input {
        prompt: Option<String>,
        /// 提示后是否追加 `? `（`;` 分隔或无提示时为真）
        question: bool,
        targets: Vec<Var>,
    },
    InputFile {
        channel: Expr,
        targets: Vec<Var>,
    },
    LineInput {
        prompt: Option<String>,
        target: Var,
    },
    LineInputFile {
        channel: Expr,
        target: Var,
    },
    Goto(u32),
    Gosub(u32),
    Return,
    If {
        condition: Expr,
        else_at: Option<usize>,
    },
    Else,
    For {
        var: Var,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
    },
    Next {
        vars: Vec<Var>,
    },
    End,
    Stop,
    Cls,
    Width(Expr),
    Open {
        name: Expr,
        mode: ModeSpec,
        channel: Expr,
        record_length: Option<Expr>,
    },
    Close {
        channels: Vec<Expr>,
    },
    Kill(Expr),
    Name {
        from: Expr,
        to: Expr,
    },
    Put {
        channel: Expr,
        record: Option<Expr>,
        value: Expr,
    },
    Get {
        channel: Expr,
        record: Option<Expr>,
        target: Var,
    },
}
