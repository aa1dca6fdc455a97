//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。日志写到 stderr，
//! 程序输出独占 stdout。

use mbasic_api::{LogConfig, LogFormat, LogLevel, Phase};
use std::io;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};

/// CLI 自身的日志 target
pub const CLI_TARGET: &str = "mbasic::cli";

pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

/// 全局级别 + 各阶段覆盖
pub fn build_targets(config: &LogConfig) -> Targets {
    Phase::ALL.iter().fold(
        Targets::new()
            .with_default(level_filter(config.level))
            .with_target(CLI_TARGET, level_filter(config.level)),
        |targets, phase| targets.with_target(phase.target(), level_filter(config.level_for(*phase))),
    )
}

/// 使用指定格式和日志配置初始化日志系统
pub fn init(config: &LogConfig) {
    let targets = build_targets(config);
    let layer = create_format_layer(config.format).with_filter(targets);
    // 重复初始化（测试中）时忽略
    let _ = tracing_subscriber::registry().with(layer).try_init();
}

/// Create formatter layer based on format
fn create_format_layer(format: LogFormat) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync> {
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_phase_override_is_applied() {
        let mut config = LogConfig {
            level: LogLevel::Warn,
            ..LogConfig::default()
        };
        config.phases.insert(Phase::Vm, LogLevel::Trace);
        let targets = build_targets(&config);

        assert!(targets.would_enable("mbasic::vm", &Level::TRACE));
        assert!(!targets.would_enable("mbasic::lexer", &Level::INFO));
        assert!(targets.would_enable("mbasic::lexer", &Level::WARN));
    }

    #[test]
    fn test_off_disables_everything() {
        let config = LogConfig {
            level: LogLevel::Off,
            ..LogConfig::default()
        };
        let targets = build_targets(&config);
        assert!(!targets.would_enable("mbasic::session", &Level::ERROR));
    }
}
