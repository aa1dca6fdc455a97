use super::{HostConsole, InputReply};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct ConsoleState {
    output: String,
    lines: VecDeque<String>,
    keys: VecDeque<char>,
    clears: usize,
}

/// 内存控制台：收集输出，按队列提供输入
///
/// 克隆共享同一份状态，测试和事件循环宿主可以一边交给 `Terminal`，
/// 一边在外面读输出、塞按键。没有排队的行时 `read_line` 返回
/// `Pending`；挂起期间塞入的按键留在队列里。
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    state: Arc<Mutex<ConsoleState>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 预置一行输入
    pub fn push_line(&self, line: impl Into<String>) {
        self.lock().lines.push_back(line.into());
    }

    pub fn push_keys(&self, keys: &str) {
        self.lock().keys.extend(keys.chars());
    }

    /// 目前为止的全部输出
    pub fn output(&self) -> String {
        self.lock().output.clone()
    }

    /// 取走输出并清空缓冲
    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.lock().output)
    }

    pub fn clear_count(&self) -> usize {
        self.lock().clears
    }

    pub fn pending_keys(&self) -> usize {
        self.lock().keys.len()
    }
}

impl HostConsole for MemoryConsole {
    fn print(&mut self, text: &str) {
        self.lock().output.push_str(text);
    }

    fn read_line(&mut self) -> InputReply {
        match self.lock().lines.pop_front() {
            Some(line) => InputReply::Ready(line),
            None => InputReply::Pending,
        }
    }

    fn inkey(&mut self) -> Option<char> {
        self.lock().keys.pop_front()
    }

    fn clear_screen(&mut self) {
        self.lock().clears += 1;
    }
}
