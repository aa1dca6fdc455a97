//! 会话配置
//!
//! 把 `mbasic-config` 的终端、文件、执行配置组合成一个 `SessionConfig`

use mbasic_config::{ExecConfig, FileConfig, TerminalConfig};
use serde::{Deserialize, Serialize};

/// Execution session configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub terminal: TerminalConfig,
    pub files: FileConfig,
    pub exec: ExecConfig,
}

impl SessionConfig {
    /// 调整每次 `tick()` 执行的语句数（至少 1）
    pub fn with_statements_per_tick(mut self, n: usize) -> Self {
        self.exec.statements_per_tick = n.max(1);
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.terminal.width = width;
        self
    }
}
