//! 执行会话
//!
//! 一个会话拥有一个程序、一台执行机、一个终端和一张打开文件表。
//! 宿主通过 `load`/`run`/`tick`/`provide_input` 等驱动它，
//! 所有失败都体现为状态和 `last_error()`，不会 panic。
//!
//! # 状态机
//! ```text
//! Unloaded --load--> Loaded --run/tick--> Running --+--> Stopped
//!                                            |      +--> Error
//!                                            |      +--> AwaitingInput --provide_input--> Running
//!                                            +--pause--> Paused --resume--> Running
//! ```

use crate::config::SessionConfig;
use crate::control::{ControlHandle, ControlRequest};
use crate::error::{ErrorReport, SessionError};
use crate::types::SessionState;
use mbasic_core::{compile, Devices, Halt, HostConsole, Machine, Program, RuntimeFault, Step, Terminal};
use mbasic_vfs::middleware::{LoggedLayer, UppercaseLayer};
use mbasic_vfs::{FileHooks, FileResult, FileSystem, HostStore, StoreBuilder};
use std::sync::Arc;
use tracing::{debug, info, warn};

const TARGET: &str = "mbasic::session";

pub struct ExecutionSession {
    config: SessionConfig,
    state: SessionState,
    source: String,
    program: Option<Program>,
    machine: Option<Machine>,
    terminal: Terminal,
    files: FileSystem,
    last_error: Option<SessionError>,
    /// 由 `run()` 启动：恢复后继续驱动到底
    driving: bool,
    control: ControlHandle,
}

impl std::fmt::Debug for ExecutionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionSession")
            .field("state", &self.state)
            .field("terminal", &self.terminal)
            .field("files", &self.files)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl ExecutionSession {
    /// 创建会话；存储外面会套上日志层，按配置再套上大写文件名层
    pub fn new(
        console: Box<dyn HostConsole>,
        store: Arc<dyn HostStore>,
        config: SessionConfig,
    ) -> Self {
        let mut builder = StoreBuilder::new(store).with(LoggedLayer::new());
        if config.files.uppercase_names {
            builder = builder.with(UppercaseLayer::new());
        }
        let files = FileSystem::new(Arc::new(builder.build()));
        let terminal = Terminal::new(console, &config.terminal);
        Self {
            config,
            state: SessionState::Unloaded,
            source: String::new(),
            program: None,
            machine: None,
            terminal,
            files,
            last_error: None,
            driving: false,
            control: ControlHandle::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FileHooks>) -> Self {
        self.files.set_hooks(Some(hooks));
        self
    }

    // ==================== 生命周期 ====================

    /// 编译并载入程序；失败时回到 `Unloaded` 并记录错误
    pub fn load(&mut self, source: &str) -> bool {
        self.clear();
        match compile(source) {
            Ok(program) => {
                info!(target: TARGET, lines = program.len(), "program loaded");
                self.source = source.to_string();
                self.program = Some(program);
                self.state = SessionState::Loaded;
                true
            }
            Err(e) => {
                let error = SessionError::from(e);
                warn!(target: TARGET, error = %error, "load failed");
                self.last_error = Some(error);
                false
            }
        }
    }

    /// 运行到结束、挂起、出错或被控制请求打断
    ///
    /// 从 `Stopped` 开始时用新的执行机从第一行重跑。
    pub fn run(&mut self) {
        match self.state {
            SessionState::Loaded | SessionState::Stopped => {
                self.start();
                self.driving = true;
                self.drive();
            }
            SessionState::Running => {
                self.driving = true;
                self.drive();
            }
            _ => {}
        }
    }

    /// 协作式执行：最多 `statements_per_tick` 条语句
    ///
    /// 运行还能继续时返回 true。
    pub fn tick(&mut self) -> bool {
        if self.state == SessionState::Loaded {
            self.start();
            self.driving = false;
        }
        if self.state == SessionState::Running {
            for _ in 0..self.config.exec.statements_per_tick.max(1) {
                self.execute_one();
                if self.state != SessionState::Running {
                    break;
                }
            }
        }
        self.state.is_running()
    }

    pub fn pause(&mut self) {
        if self.state == SessionState::Running {
            debug!(target: TARGET, line = self.current_line(), "paused");
            self.state = SessionState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == SessionState::Paused {
            debug!(target: TARGET, line = self.current_line(), "resumed");
            self.state = SessionState::Running;
            if self.driving {
                self.drive();
            }
        }
    }

    /// 结束运行；丢弃挂起的输入并关闭（保存）所有文件
    pub fn stop(&mut self) {
        if !self.state.is_running() {
            return;
        }
        if let Some(machine) = self.machine.as_mut() {
            machine.cancel_input();
        }
        info!(target: TARGET, line = self.current_line(), "stopped");
        self.close_files();
        self.state = SessionState::Stopped;
        self.driving = false;
    }

    /// 交付一行输入；只在 `AwaitingInput` 时有效
    pub fn provide_input(&mut self, text: &str) {
        if self.state != SessionState::AwaitingInput {
            return;
        }
        let (Some(program), Some(machine)) = (self.program.as_ref(), self.machine.as_mut()) else {
            return;
        };
        let mut dev = Devices {
            terminal: &mut self.terminal,
            files: &mut self.files,
        };
        let result = machine.provide_input(program, text, &mut dev);
        self.state = SessionState::Running;
        self.apply(result);
        if self.driving && self.state == SessionState::Running {
            self.drive();
        }
    }

    /// 保留程序，丢弃运行状态
    pub fn reset(&mut self) {
        if self.program.is_none() {
            return;
        }
        self.close_files();
        self.machine = None;
        self.last_error = None;
        self.driving = false;
        self.control.clear();
        self.state = SessionState::Loaded;
    }

    /// 丢弃一切，回到 `Unloaded`
    pub fn clear(&mut self) {
        self.close_files();
        self.machine = None;
        self.program = None;
        self.source.clear();
        self.last_error = None;
        self.driving = false;
        self.control.clear();
        self.state = SessionState::Unloaded;
    }

    // ==================== 查询 ====================

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 最近一次错误的文本，没有则为空串
    pub fn last_error(&self) -> String {
        self.last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn last_error_report(&self) -> Option<ErrorReport> {
        self.last_error.as_ref().map(SessionError::to_report)
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.program.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// 程序计数器所在的 BASIC 行号，没有则为 0
    pub fn current_line(&self) -> u32 {
        match (&self.program, &self.machine) {
            (Some(program), Some(machine)) => machine.current_line(program).unwrap_or(0),
            _ => 0,
        }
    }

    /// 载入时的源码原文
    pub fn list_program(&self) -> &str {
        &self.source
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// 挂起的 INPUT 提示
    pub fn pending_prompt(&self) -> Option<&str> {
        self.machine
            .as_ref()
            .and_then(Machine::pending)
            .map(|pending| pending.prompt.as_str())
    }

    pub fn width(&self) -> usize {
        self.terminal.width()
    }

    pub fn set_width(&mut self, width: usize) {
        self.terminal.set_width(width);
    }

    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal {
        &mut self.terminal
    }

    pub fn files(&self) -> &FileSystem {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut FileSystem {
        &mut self.files
    }

    /// 存储里的全部文件：`(名字, 字节数)`
    pub fn list_files(&self) -> FileResult<Vec<(String, usize)>> {
        self.files.list()
    }

    // ==================== 内部 ====================

    fn start(&mut self) {
        if self.program.is_none() {
            return;
        }
        self.close_files();
        self.machine = Some(Machine::new(
            self.config.exec.clone(),
            self.config.files.default_record_length,
        ));
        self.last_error = None;
        self.control.clear();
        self.state = SessionState::Running;
        info!(target: TARGET, "run started");
    }

    fn drive(&mut self) {
        while self.state == SessionState::Running {
            self.execute_one();
        }
    }

    /// 先处理控制请求，再执行一条语句
    fn execute_one(&mut self) {
        match self.control.take() {
            Some(ControlRequest::Pause) => {
                self.pause();
                return;
            }
            Some(ControlRequest::Stop) => {
                self.stop();
                return;
            }
            None => {}
        }

        let (Some(program), Some(machine)) = (self.program.as_ref(), self.machine.as_mut()) else {
            self.state = SessionState::Stopped;
            return;
        };
        let mut dev = Devices {
            terminal: &mut self.terminal,
            files: &mut self.files,
        };
        let result = machine.step(program, &mut dev);
        self.apply(result);
    }

    fn apply(&mut self, result: Result<Step, RuntimeFault>) {
        match result {
            Ok(Step::Continue) => {}
            Ok(Step::Suspended) => {
                debug!(target: TARGET, line = self.current_line(), "awaiting input");
                self.state = SessionState::AwaitingInput;
            }
            Ok(Step::Halted(halt)) => self.finish(halt),
            Err(fault) => self.fail(fault),
        }
    }

    fn finish(&mut self, halt: Halt) {
        info!(target: TARGET, ?halt, "run finished");
        self.close_files();
        self.state = SessionState::Stopped;
        self.driving = false;
    }

    fn fail(&mut self, fault: RuntimeFault) {
        let error = SessionError::Runtime(fault);
        let text = error.to_string();
        warn!(target: TARGET, error = %text, "runtime error");
        self.terminal.print(&format!("\n{text}\n"));
        self.last_error = Some(error);
        self.close_files();
        self.state = SessionState::Error;
        self.driving = false;
    }

    fn close_files(&mut self) {
        match self.files.close_all() {
            Ok(0) => {}
            Ok(n) => debug!(target: TARGET, closed = n, "closed open files"),
            Err(e) => warn!(target: TARGET, error = %e, "closing files failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbasic_core::MemoryConsole;
    use mbasic_vfs::MemoryStore;

    fn session() -> (ExecutionSession, MemoryConsole, MemoryStore) {
        let console = MemoryConsole::new();
        let store = MemoryStore::new();
        let session = ExecutionSession::new(
            Box::new(console.clone()),
            Arc::new(store.clone()),
            SessionConfig::default(),
        );
        (session, console, store)
    }

    #[test]
    fn test_load_and_run() {
        let (mut session, console, _) = session();
        assert!(session.load("10 PRINT \"HI\"\n"));
        assert_eq!(session.state(), SessionState::Loaded);
        session.run();
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(console.output(), "HI\n");
        assert_eq!(session.list_program(), "10 PRINT \"HI\"\n");
    }

    #[test]
    fn test_load_failure_unloads() {
        let (mut session, _, _) = session();
        assert!(session.load("10 PRINT 1\n"));
        assert!(!session.load("PRINT 1\n"));
        assert_eq!(session.state(), SessionState::Unloaded);
        assert!(!session.is_loaded());
        assert!(session.last_error().starts_with("Parse error at line 1, col 1: "));
        assert_eq!(session.list_program(), "");
    }

    #[test]
    fn test_runtime_error_is_echoed() {
        let (mut session, console, _) = session();
        session.load("10 PRINT 1\n20 X = 1 / 0\n");
        session.run();
        assert_eq!(session.state(), SessionState::Error);
        assert_eq!(session.last_error(), "Runtime error at line 20: Division by zero");
        assert_eq!(
            console.output(),
            " 1 \n\nRuntime error at line 20: Division by zero\n"
        );
        assert_eq!(session.last_error_report().and_then(|r| r.code), Some(11));

        // Error 状态下 run() 不做事
        session.run();
        assert_eq!(session.state(), SessionState::Error);
        session.reset();
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(session.last_error(), "");
    }

    #[test]
    fn test_input_round_trip() {
        let (mut session, console, _) = session();
        session.load("10 INPUT \"N\"; N\n20 PRINT N * 2\n");
        session.run();
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.pending_prompt(), Some("N? "));
        assert_eq!(session.current_line(), 10);

        session.provide_input("x");
        assert_eq!(session.state(), SessionState::AwaitingInput);
        session.provide_input("21");
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(console.output(), "N? ?Redo from start\nN?  42 \n");
    }

    #[test]
    fn test_tick_is_cooperative() {
        let (mut session, console, _) = session();
        session.load("10 PRINT 1\n20 PRINT 2\n30 PRINT 3\n");
        assert!(session.tick());
        assert_eq!(console.output(), " 1 \n");
        assert!(session.tick());
        assert!(session.tick());
        assert!(!session.tick());
        assert!(!session.is_running());
        assert_eq!(console.output(), " 1 \n 2 \n 3 \n");
    }

    #[test]
    fn test_pause_resume_does_not_repeat() {
        let (mut session, console, _) = session();
        session.load("10 PRINT 1\n20 PRINT 2\n30 PRINT 3\n");
        session.tick();
        session.pause();
        assert_eq!(session.state(), SessionState::Paused);
        assert!(session.tick());
        assert_eq!(console.output(), " 1 \n");
        session.resume();
        assert_eq!(session.state(), SessionState::Running);
        while session.tick() {}
        assert_eq!(console.output(), " 1 \n 2 \n 3 \n");
    }

    #[test]
    fn test_control_handle_stops_run() {
        let (mut session, _, _) = session();
        session.load("10 GOTO 10\n");
        session.tick();
        session.control().request_stop();
        assert!(!session.tick());
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_control_handle_pauses_run() {
        let (mut session, _, _) = session();
        session.load("10 GOTO 10\n");
        let control = session.control();
        session.tick();
        control.request_pause();
        session.run();
        assert_eq!(session.state(), SessionState::Paused);
        session.stop();
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_stop_discards_pending_input() {
        let (mut session, _, _) = session();
        session.load("10 INPUT A\n20 PRINT A\n");
        session.run();
        session.stop();
        assert_eq!(session.pending_prompt(), None);
        session.provide_input("5");
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_stop_persists_open_files() {
        let (mut session, _, store) = session();
        session.load("10 OPEN \"O\", #1, \"LOG.TXT\"\n20 PRINT #1, \"ENTRY\"\n30 INPUT A\n");
        session.run();
        assert_eq!(session.files().open_count(), 1);
        session.stop();
        assert_eq!(session.files().open_count(), 0);
        assert_eq!(store.get("LOG.TXT"), Some(b"ENTRY\n".to_vec()));
    }

    #[test]
    fn test_rerun_from_stopped_starts_over() {
        let (mut session, console, _) = session();
        session.load("10 PRINT \"A\"\n20 STOP\n30 PRINT \"B\"\n");
        session.run();
        assert_eq!(session.state(), SessionState::Stopped);
        session.run();
        assert_eq!(console.output(), "A\nBreak in 20\nA\nBreak in 20\n");
    }

    #[test]
    fn test_clear_unloads() {
        let (mut session, _, _) = session();
        session.load("10 PRINT 1\n");
        session.clear();
        assert_eq!(session.state(), SessionState::Unloaded);
        assert!(!session.tick());
        session.run();
        assert_eq!(session.state(), SessionState::Unloaded);
    }

    #[test]
    fn test_uppercase_names() {
        let console = MemoryConsole::new();
        let store = MemoryStore::new();
        let mut config = SessionConfig::default();
        config.files.uppercase_names = true;
        let mut session =
            ExecutionSession::new(Box::new(console), Arc::new(store.clone()), config);
        session.load("10 OPEN \"O\", #1, \"data.txt\"\n20 PRINT #1, 1\n30 CLOSE\n");
        session.run();
        assert!(store.get("DATA.TXT").is_some());
    }

    #[test]
    fn test_session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ExecutionSession>();
    }
}
