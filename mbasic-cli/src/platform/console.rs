//! 标准输入输出控制台

use mbasic_api::{HostConsole, InputReply};
use std::io::{self, BufRead, Write};

/// 阻塞式控制台：输出到 stdout，从 stdin 读行
///
/// stdin 到达末尾时回答 `Pending`，会话停在 `AwaitingInput`，由调用方决定停止。
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        Self
    }
}

impl HostConsole for StdConsole {
    fn print(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn read_line(&mut self) -> InputReply {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => InputReply::Pending,
            Ok(_) => InputReply::Ready(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn clear_screen(&mut self) {
        // ANSI: 清屏并回到左上角
        self.print("\x1b[2J\x1b[H");
    }
}
