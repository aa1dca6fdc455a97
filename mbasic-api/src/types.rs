//! API 类型定义
//!
//! 会话状态。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 执行会话的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// 没有载入程序
    #[default]
    Unloaded,
    /// 已载入，尚未运行
    Loaded,
    Running,
    Paused,
    /// 等待宿主调用 `provide_input`
    AwaitingInput,
    /// 运行结束（END、STOP、执行完毕或被 `stop()`）
    Stopped,
    /// 运行时错误
    Error,
}

impl SessionState {
    /// 运行还没有结束
    pub fn is_running(self) -> bool {
        matches!(
            self,
            SessionState::Running | SessionState::Paused | SessionState::AwaitingInput
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Unloaded => "unloaded",
            SessionState::Loaded => "loaded",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::AwaitingInput => "awaiting_input",
            SessionState::Stopped => "stopped",
            SessionState::Error => "error",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
