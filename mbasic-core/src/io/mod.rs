//! 终端 I/O
//!
//! `HostConsole` 是宿主实现的接口；`Terminal` 包住它并跟踪光标列，
//! 供 `PRINT` 的 `,`/`TAB`/`POS` 使用。列只是记账，不做物理换行。

mod memory;

pub use memory::MemoryConsole;

use mbasic_config::{TerminalConfig, INFINITE_WIDTH};

/// 宿主对一次行输入请求的答复
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputReply {
    /// 阻塞式宿主（如命令行）直接给出一行
    Ready(String),
    /// 事件循环宿主稍后通过 `provide_input` 交付
    Pending,
}

/// 宿主控制台
pub trait HostConsole: Send {
    /// 输出文本，不等待
    fn print(&mut self, text: &str);

    /// 请求一行输入（不含行尾换行）
    fn read_line(&mut self) -> InputReply;

    /// 非阻塞地取一个按键
    fn inkey(&mut self) -> Option<char> {
        None
    }

    fn clear_screen(&mut self) {}
}

pub struct Terminal {
    console: Box<dyn HostConsole>,
    column: usize,
    width: usize,
    zone_width: usize,
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("column", &self.column)
            .field("width", &self.width)
            .field("zone_width", &self.zone_width)
            .finish_non_exhaustive()
    }
}

impl Terminal {
    pub fn new(console: Box<dyn HostConsole>, config: &TerminalConfig) -> Self {
        Self {
            console,
            column: 0,
            width: config.width.max(1),
            zone_width: config.zone_width.max(1),
        }
    }

    /// 输出文本并更新列
    pub fn print(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        for ch in text.chars() {
            self.advance(ch);
        }
        self.console.print(text);
    }

    fn advance(&mut self, ch: char) {
        self.column = match ch {
            '\n' | '\r' => 0,
            '\t' => (self.column / 8 + 1) * 8,
            _ => self.column + 1,
        };
        if self.width != INFINITE_WIDTH && self.column >= self.width {
            self.column = 0;
        }
    }

    /// 输出提示（非空时）并请求一行；得到整行时列归零
    pub fn input(&mut self, prompt: &str) -> InputReply {
        self.print(prompt);
        let reply = self.console.read_line();
        if matches!(reply, InputReply::Ready(_)) {
            self.column = 0;
        }
        reply
    }

    /// 挂起的输入被交付之后调用
    pub fn finish_input(&mut self) {
        self.column = 0;
    }

    pub fn inkey(&mut self) -> Option<char> {
        self.console.inkey()
    }

    pub fn clear_screen(&mut self) {
        self.console.clear_screen();
        self.column = 0;
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn set_column(&mut self, column: usize) {
        self.column = column;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// 小于 1 的宽度按 1 处理
    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(1);
        if self.width != INFINITE_WIDTH && self.column >= self.width {
            self.column = 0;
        }
    }

    pub fn zone_width(&self) -> usize {
        self.zone_width
    }

    pub fn console_mut(&mut self) -> &mut dyn HostConsole {
        self.console.as_mut()
    }
}
