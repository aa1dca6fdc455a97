//! MBASIC Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all MBASIC crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Width value that MBASIC treats as "never wrap".
pub const INFINITE_WIDTH: usize = 255;

/// Terminal behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Column at which the tracked cursor wraps back to 0
    pub width: usize,
    /// Width of a PRINT comma zone
    pub zone_width: usize,
}

/// Virtual file defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Record length used when OPEN gives none
    pub default_record_length: usize,
    /// Store file names upper-cased, the way CP/M did
    pub uppercase_names: bool,
}

/// Configuration for execution limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Statements executed by one cooperative tick
    pub statements_per_tick: usize,
    /// Maximum GOSUB nesting
    pub max_gosub_depth: usize,
    /// Maximum FOR nesting
    pub max_for_depth: usize,
}

/// Log verbosity, mirrors the `tracing` levels plus `off`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

/// Logging configuration: a global level with optional per-phase overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub phases: BTreeMap<Phase, LogLevel>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Effective level for one phase
    pub fn level_for(&self, phase: Phase) -> LogLevel {
        self.phases.get(&phase).copied().unwrap_or(self.level)
    }
}

/// Execution phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexer,
    Parser,
    Vm,
    Files,
    Store,
    Session,
}

impl Phase {
    /// All phases, in pipeline order
    pub const ALL: [Phase; 6] = [
        Phase::Lexer,
        Phase::Parser,
        Phase::Vm,
        Phase::Files,
        Phase::Store,
        Phase::Session,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lexer => "lexer",
            Phase::Parser => "parser",
            Phase::Vm => "vm",
            Phase::Files => "files",
            Phase::Store => "store",
            Phase::Session => "session",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("mbasic::{}", self.as_str())
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            width: 80,
            zone_width: 14,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            default_record_length: 128,
            uppercase_names: false,
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            statements_per_tick: 1,
            max_gosub_depth: 256,
            max_for_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_terminal_config() {
        let cfg = TerminalConfig::default();
        assert_eq!(cfg.width, 80);
        assert_eq!(cfg.zone_width, 14);
    }

    #[test]
    fn test_default_file_config() {
        let cfg = FileConfig::default();
        assert_eq!(cfg.default_record_length, 128);
        assert!(!cfg.uppercase_names);
    }

    #[test]
    fn test_default_exec_config() {
        let cfg = ExecConfig::default();
        assert_eq!(cfg.statements_per_tick, 1);
        assert_eq!(cfg.max_gosub_depth, 256);
        assert_eq!(cfg.max_for_depth, 64);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Lexer.as_str(), "lexer");
        assert_eq!(Phase::Vm.target(), "mbasic::vm");
        assert_eq!(Phase::Session.target(), "mbasic::session");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: ExecConfig = serde_json::from_str(r#"{"statements_per_tick": 50}"#).unwrap();
        assert_eq!(cfg.statements_per_tick, 50);
        assert_eq!(cfg.max_gosub_depth, 256);

        let term: TerminalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(term, TerminalConfig::default());
    }

    #[test]
    fn test_log_level_override() {
        let cfg: LogConfig =
            serde_json::from_str(r#"{"level": "info", "phases": {"vm": "trace"}}"#).unwrap();
        assert_eq!(cfg.level_for(Phase::Vm), LogLevel::Trace);
        assert_eq!(cfg.level_for(Phase::Lexer), LogLevel::Info);
        assert_eq!(cfg.format, LogFormat::Compact);
    }

    #[test]
    fn test_phase_serde_name() {
        let phase: Phase = serde_json::from_str("\"files\"").unwrap();
        assert_eq!(phase, Phase::Files);
    }
}
