//! 测试辅助工具
//!
//! 提供端到端测试的辅助函数：编译、逐语句执行到停止，收集终端输出

#![allow(dead_code)]

use mbasic_core::{
    compile, Devices, ExecConfig, Halt, Machine, MemoryConsole, RuntimeFault, Step, Terminal,
    TerminalConfig,
};
use mbasic_vfs::{FileSystem, MemoryStore};
use std::sync::Arc;

/// 一次执行的结果
#[derive(Debug)]
pub struct ExecResult {
    pub halt: Halt,
    pub output: String,
    pub machine: Machine,
}

#[derive(Debug)]
pub enum ExecError {
    Compile(String),
    Runtime { fault: RuntimeFault, output: String },
    /// 输入队列已空，程序还在等输入
    Suspended { output: String },
}

/// 执行 MBASIC 程序（无输入，空文件库）
///
/// # Example
/// ```
/// let result = run_code("10 PRINT 1+2").unwrap();
/// assert_eq!(result.output, " 3 \n");
/// ```
pub fn run_code(code: &str) -> Result<ExecResult, ExecError> {
    run_with_store(code, &[], &MemoryStore::new())
}

/// 执行并预先排好键盘输入行
pub fn run_with_input(code: &str, input: &[&str]) -> Result<ExecResult, ExecError> {
    run_with_store(code, input, &MemoryStore::new())
}

/// 执行并使用给定的文件库；`MemoryStore` 的克隆共享内容，执行后可直接检查
pub fn run_with_store(
    code: &str,
    input: &[&str],
    store: &MemoryStore,
) -> Result<ExecResult, ExecError> {
    let program = compile(code).map_err(|e| ExecError::Compile(e.to_string()))?;

    let console = MemoryConsole::new();
    for line in input {
        console.push_line(*line);
    }
    let mut terminal = Terminal::new(Box::new(console.clone()), &TerminalConfig::default());
    let mut files = FileSystem::new(Arc::new(store.clone()));
    let mut machine = Machine::new(ExecConfig::default(), 128);
    let mut dev = Devices {
        terminal: &mut terminal,
        files: &mut files,
    };

    loop {
        match machine.step(&program, &mut dev) {
            Ok(Step::Continue) => {}
            Ok(Step::Halted(halt)) => {
                return Ok(ExecResult {
                    halt,
                    output: console.output(),
                    machine,
                })
            }
            Ok(Step::Suspended) => {
                return Err(ExecError::Suspended {
                    output: console.output(),
                })
            }
            Err(fault) => {
                return Err(ExecError::Runtime {
                    fault,
                    output: console.output(),
                })
            }
        }
    }
}

/// 只取输出，出错即 panic
pub fn output_of(code: &str) -> String {
    match run_code(code) {
        Ok(result) => result.output,
        Err(e) => panic!("program failed: {:?}", e),
    }
}

/// 期望运行时错误，返回错误本身
pub fn fault_of(code: &str) -> RuntimeFault {
    match run_code(code) {
        Err(ExecError::Runtime { fault, .. }) => fault,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}
