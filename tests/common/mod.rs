//! 测试辅助工具
//!
//! 跨 crate 的端到端测试：内存存储 + 内存控制台上的会话

#![allow(dead_code)]

use mbasic::mbasic_vfs::FileSystem;
use mbasic::{memory_session, ExecutionSession, MemoryConsole, MemoryStore, SessionConfig};
use std::sync::Arc;

pub struct Host {
    pub session: ExecutionSession,
    pub console: MemoryConsole,
    pub store: MemoryStore,
}

/// 默认配置的会话
pub fn host() -> Host {
    host_with(SessionConfig::default())
}

pub fn host_with(config: SessionConfig) -> Host {
    let (session, console, store) = memory_session(config);
    Host {
        session,
        console,
        store,
    }
}

/// 载入并运行到停下，返回终端输出
pub fn run_code(code: &str) -> (Host, String) {
    let mut host = host();
    assert!(host.session.load(code), "load failed: {}", host.session.last_error());
    host.session.run();
    let output = host.console.output();
    (host, output)
}

/// 直接在内存存储上的文件桥
pub fn file_system() -> (FileSystem, MemoryStore) {
    let store = MemoryStore::new();
    (FileSystem::new(Arc::new(store.clone())), store)
}
