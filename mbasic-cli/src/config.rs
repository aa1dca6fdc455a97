//! CLI 配置
//!
//! 可选的 JSON 配置文件，命令行参数覆盖其中的值

use mbasic_api::{LogConfig, SessionConfig};
use serde::Deserialize;
use std::path::Path;

/// 配置文件结构
///
/// ```json
/// {
///   "session": { "terminal": { "width": 72 }, "files": { "uppercase_names": true } },
///   "log": { "level": "info", "phases": { "files": "trace" }, "format": "json" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub session: SessionConfig,
    pub log: LogConfig,
}

impl CliConfig {
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("invalid config: {}", e))
    }

    /// 读取并解析配置文件
    pub fn read(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        Self::from_json(&content).map_err(|e| format!("'{}': {}", path.display(), e))
    }
}
