//! Ctrl-C 处理
//!
//! 程序运行期间 Ctrl-C 转成会话的停止请求；其余时间照常退出进程。

use crate::logging::CLI_TARGET;
use mbasic_api::ControlHandle;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::signal;

/// Ctrl-C 的退出码（128 + SIGINT）
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Default)]
struct State {
    /// 正在运行程序
    armed: AtomicBool,
    /// 运行期间按过 Ctrl-C
    hit: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    state: Arc<State>,
}

impl Interrupt {
    /// 在后台线程上监听 Ctrl-C
    pub fn install(control: ControlHandle) -> Self {
        let interrupt = Self::default();
        let listener = interrupt.clone();
        let spawned = thread::Builder::new()
            .name("ctrl-c".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        tracing::warn!(target: CLI_TARGET, error = %e, "Ctrl-C handler unavailable");
                        return;
                    }
                };
                runtime.block_on(async move {
                    while signal::ctrl_c().await.is_ok() {
                        if !listener.fire(&control) {
                            process::exit(INTERRUPTED_EXIT_CODE);
                        }
                    }
                });
            });
        if let Err(e) = spawned {
            tracing::warn!(target: CLI_TARGET, error = %e, "Ctrl-C handler unavailable");
        }
        interrupt
    }

    /// 运行期间把 Ctrl-C 转成停止请求；不在运行期间返回 false
    pub fn fire(&self, control: &ControlHandle) -> bool {
        if !self.state.armed.load(Ordering::Acquire) {
            return false;
        }
        tracing::debug!(target: CLI_TARGET, "interrupted");
        self.state.hit.store(true, Ordering::Release);
        control.request_stop();
        true
    }

    /// 在运行期间执行 `f`，同时返回期间是否按过 Ctrl-C
    pub fn guard<T>(&self, f: impl FnOnce() -> T) -> (T, bool) {
        self.state.hit.store(false, Ordering::Release);
        self.state.armed.store(true, Ordering::Release);
        let value = f();
        self.state.armed.store(false, Ordering::Release);
        (value, self.state.hit.swap(false, Ordering::AcqRel))
    }
}
