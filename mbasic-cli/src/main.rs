//! MBASIC CLI - 命令行宿主
//!
//! 纯前端，无解释器逻辑。只负责参数解析、组装会话并驱动它。

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

mod config;
mod logging;
mod platform;
mod repl;

use crate::config::CliConfig;
use crate::logging::CLI_TARGET;
use crate::platform::{print_error_with_source, Interrupt, StdConsole, INTERRUPTED_EXIT_CODE};
use mbasic_api::{
    DirectoryStore, ExecutionSession, HostStore, LogFormat, LogLevel, MemoryStore, Phase,
    SessionState,
};

#[derive(Parser)]
#[command(name = "mbasic", about = "MBASIC interpreter host", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: Options,
}

#[derive(Subcommand)]
enum Command {
    /// 运行一个程序文件
    Run {
        /// 源文件路径
        file: PathBuf,
    },
    /// 交互式编辑环境
    Repl,
}

#[derive(Args)]
struct Options {
    /// 程序可见的文件目录（默认使用内存存储）
    #[arg(long, global = true, value_name = "DIR")]
    files: Option<PathBuf>,

    /// 终端宽度
    #[arg(long, global = true)]
    width: Option<usize>,

    /// JSON 配置文件
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 全局日志级别
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevelArg>,

    /// 单个阶段的日志级别，例如 `--log-phase vm=trace`
    #[arg(long, global = true, value_name = "PHASE=LEVEL", value_parser = parse_phase_level)]
    log_phase: Vec<(Phase, LogLevel)>,

    /// 日志输出格式
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    /// 文件名统一转为大写
    #[arg(long, global = true)]
    uppercase_names: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let config = match build_config(&cli.options) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    logging::init(&config.log);

    let store: Arc<dyn HostStore> = match &cli.options.files {
        Some(dir) => Arc::new(DirectoryStore::new(dir)),
        None => Arc::new(MemoryStore::new()),
    };
    let session = ExecutionSession::new(Box::new(StdConsole::new()), store, config.session);
    let interrupt = Interrupt::install(session.control());

    match cli.command {
        Command::Run { file } => process::exit(run_file(session, &file, &interrupt)),
        Command::Repl => repl::Repl::new(session, interrupt).run(),
    }
}

/// 运行程序文件，返回退出码
fn run_file(mut session: ExecutionSession, path: &Path, interrupt: &Interrupt) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Cannot read file '{}': {}", path.display(), e);
            return 1;
        }
    };
    tracing::info!(target: CLI_TARGET, file = %path.display(), "running");

    if !session.load(&source) {
        if let Some(error) = session.error() {
            print_error_with_source(error, &source);
        }
        return 1;
    }
    let ((), interrupted) = interrupt.guard(|| session.run());

    match session.state() {
        // stdin 已经读完
        SessionState::AwaitingInput => {
            session.stop();
            eprintln!("\nInput ended at line {}", session.current_line());
            1
        }
        // 错误文本已经回显到终端
        SessionState::Error => 1,
        SessionState::Stopped if interrupted => {
            println!();
            println!("Break in {}", session.current_line());
            INTERRUPTED_EXIT_CODE
        }
        _ => 0,
    }
}

/// 配置文件打底，命令行参数覆盖
fn build_config(options: &Options) -> Result<CliConfig, String> {
    let mut config = match &options.config {
        Some(path) => CliConfig::read(path)?,
        None => CliConfig::default(),
    };

    if let Some(width) = options.width {
        config.session.terminal.width = width;
    }
    if options.uppercase_names {
        config.session.files.uppercase_names = true;
    }
    if let Some(level) = options.log_level {
        config.log.level = to_log_level(level);
    }
    for (phase, level) in &options.log_phase {
        config.log.phases.insert(*phase, *level);
    }
    if let Some(format) = options.log_format {
        config.log.format = match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        };
    }
    Ok(config)
}

fn to_log_level(level: LogLevelArg) -> LogLevel {
    match level {
        LogLevelArg::Off => LogLevel::Off,
        LogLevelArg::Error => LogLevel::Error,
        LogLevelArg::Warn => LogLevel::Warn,
        LogLevelArg::Info => LogLevel::Info,
        LogLevelArg::Debug => LogLevel::Debug,
        LogLevelArg::Trace => LogLevel::Trace,
    }
}

/// `vm=trace` → `(Phase::Vm, LogLevel::Trace)`
fn parse_phase_level(s: &str) -> Result<(Phase, LogLevel), String> {
    let (phase, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PHASE=LEVEL, got '{}'", s))?;
    let phase = Phase::ALL
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(phase.trim()))
        .ok_or_else(|| format!("unknown phase '{}'", phase))?;
    let level = LogLevelArg::from_str(level.trim(), true).map(to_log_level)?;
    Ok((phase, level))
}
