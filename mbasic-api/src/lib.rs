//! MBASIC API - Execution session layer
//!
//! Provides the embedding surface of the interpreter:
//! - `ExecutionSession`: the load/run/tick/input state machine
//! - `SessionConfig`: terminal, file and execution settings
//! - `SessionError` / `ErrorReport`: unified, structured errors
//! - `ProgramEditor`: numbered line entry for interactive hosts
//!
//! Sessions are explicit objects; there is no global instance.

pub mod config;
pub mod control;
pub mod editor;
pub mod error;
pub mod session;
pub mod types;

pub use config::SessionConfig;
pub use control::{ControlHandle, ControlRequest};
pub use editor::{Edit, ProgramEditor};
pub use error::{ErrorReport, LexerError, ParserError, RuntimeFault, SessionError};
pub use session::ExecutionSession;
pub use types::SessionState;

// Re-export the host-facing building blocks
pub use mbasic_config;
pub use mbasic_core;
pub use mbasic_vfs;
pub use mbasic_config::{
    ExecConfig, FileConfig, LogConfig, LogFormat, LogLevel, Phase, TerminalConfig,
};
pub use mbasic_core::{FaultKind, HostConsole, InputReply, MemoryConsole};
pub use mbasic_vfs::{
    DirectoryStore, FileError, FileHooks, HookOpen, HostStore, MemoryStore, OpenMode, StoreError,
};

use std::sync::Arc;

/// 内存存储 + 内存控制台的会话，测试与嵌入示例使用
pub fn memory_session(config: SessionConfig) -> (ExecutionSession, MemoryConsole, MemoryStore) {
    let console = MemoryConsole::new();
    let store = MemoryStore::new();
    let session = ExecutionSession::new(
        Box::new(console.clone()),
        Arc::new(store.clone()),
        config,
    );
    (session, console, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_session_runs() {
        let (mut session, console, _) = memory_session(SessionConfig::default());
        assert!(session.load("10 PRINT 40 + 2\n"));
        session.run();
        assert_eq!(console.output(), " 42 \n");
    }
}
