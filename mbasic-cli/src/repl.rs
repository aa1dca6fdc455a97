//! 交互式编辑环境
//!
//! 带行号的输入进入程序编辑器，其余输入当作宿主命令：
//! `NEW` `LIST` `RUN` `CLS` `FILES` `LOAD "f"` `SAVE "f"` `SYSTEM`。
//! 每条命令之后打印 `Ok`。

use crate::logging::CLI_TARGET;
use crate::platform::{print_error_with_source, Interrupt};
use mbasic_api::{Edit, ExecutionSession, HostStore, ProgramEditor, SessionState};
use std::io::{self, BufRead, Write};

/// 宿主命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    List,
    Run,
    Cls,
    Files,
    Load(String),
    Save(String),
    System,
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Command {
        let input = input.trim();
        let (word, rest) = match input.find(|c: char| c.is_whitespace() || c == '"') {
            Some(i) => (&input[..i], input[i..].trim()),
            None => (input, ""),
        };
        match word.to_ascii_uppercase().as_str() {
            "NEW" => Command::New,
            "LIST" => Command::List,
            "RUN" => Command::Run,
            "CLS" => Command::Cls,
            "FILES" => Command::Files,
            "SYSTEM" | "EXIT" | "QUIT" => Command::System,
            "LOAD" if !rest.is_empty() => Command::Load(unquote(rest)),
            "SAVE" if !rest.is_empty() => Command::Save(unquote(rest)),
            _ => Command::Unknown(input.to_string()),
        }
    }
}

/// `"NAME.BAS"` → `NAME.BAS`；右引号可省略
fn unquote(text: &str) -> String {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text).to_string()
}

/// FILES 的一行：名字占 20 列
pub fn format_file_entry(name: &str, size: usize) -> String {
    format!("{:<20}{} bytes", name, size)
}

pub struct Repl {
    session: ExecutionSession,
    editor: ProgramEditor,
    interrupt: Interrupt,
}

impl Repl {
    pub fn new(session: ExecutionSession, interrupt: Interrupt) -> Self {
        Self {
            session,
            editor: ProgramEditor::new(),
            interrupt,
        }
    }

    /// 读 stdin 直到 `SYSTEM` 或输入结束
    pub fn run(mut self) {
        println!("MBASIC host {}", env!("CARGO_PKG_VERSION"));
        println!("Ok");
        let stdin = io::stdin();
        loop {
            let _ = io::stdout().flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim_end_matches(['\r', '\n']);
            match self.editor.enter(line) {
                Edit::Stored(_) | Edit::Deleted(_) => continue,
                Edit::Rejected(number) => {
                    println!("?Illegal line number {}", number);
                    continue;
                }
                Edit::Direct(text) if text.is_empty() => continue,
                Edit::Direct(text) => {
                    if !self.execute(Command::parse(&text)) {
                        break;
                    }
                }
            }
            println!("Ok");
        }
    }

    /// 执行一条命令；`SYSTEM` 时返回 false
    fn execute(&mut self, command: Command) -> bool {
        tracing::debug!(target: CLI_TARGET, ?command, "repl command");
        match command {
            Command::New => {
                self.editor.clear();
                self.session.clear();
            }
            Command::List => {
                for line in self.editor.lines() {
                    println!("{}", line);
                }
            }
            Command::Run => {
                self.run_program();
            }
            Command::Cls => self.session.terminal_mut().clear_screen(),
            Command::Files => match self.session.list_files() {
                Ok(files) => {
                    for (name, size) in files {
                        println!("{}", format_file_entry(&name, size));
                    }
                }
                Err(e) => println!("?{}", e),
            },
            Command::Load(name) => self.load_file(&name),
            Command::Save(name) => {
                let store = self.session.files().store();
                if let Err(e) = store.write(&name, self.editor.source().as_bytes()) {
                    println!("?{}", e);
                }
            }
            Command::System => return false,
            Command::Unknown(_) => println!("?Syntax error"),
        }
        true
    }

    /// 运行编辑器里的程序；被 Ctrl-C 或输入结束打断时打印 `Break` 并返回 true
    fn run_program(&mut self) -> bool {
        let source = self.editor.source();
        if !self.session.load(&source) {
            if let Some(error) = self.session.error() {
                print_error_with_source(error, &source);
            }
            return false;
        }
        let session = &mut self.session;
        let ((), interrupted) = self.interrupt.guard(|| session.run());
        // stdin 已经读完，输入永远不会到来
        let input_ended = self.session.state() == SessionState::AwaitingInput;
        if input_ended {
            self.session.stop();
        }
        if input_ended || (interrupted && self.session.state() == SessionState::Stopped) {
            println!();
            println!("Break");
            return true;
        }
        false
    }

    /// 先按原名找，找不到再试大写名
    fn load_file(&mut self, name: &str) {
        let store = self.session.files().store();
        let content = match store.read(name) {
            Ok(Some(content)) => Some(content),
            Ok(None) => store.read(&name.to_ascii_uppercase()).ok().flatten(),
            Err(e) => {
                println!("?{}", e);
                return;
            }
        };
        match content {
            Some(bytes) => {
                self.editor = ProgramEditor::from_source(&String::from_utf8_lossy(&bytes));
                self.session.clear();
            }
            None => println!("?File not found"),
        }
    }
}
