//! 执行机
//!
//! `Machine` 一次执行一条语句。程序计数器是（行下标, 语句下标），
//! 整个状态可以序列化；INPUT 在宿主还没有给出输入时把请求记在
//! `pending` 里并返回 `Step::Suspended`，之后由 `provide_input` 接着执行。

use super::error::{FaultKind, RuntimeFault};
use super::value::{finite, Value};
use crate::io::Terminal;
use crate::parser::{Expr, Program, Stmt, Var};
use mbasic_config::ExecConfig;
use mbasic_vfs::{FileSystem, Handle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, trace};

pub(super) const TARGET: &str = "mbasic::vm";

/// 语句能用到的外部设备
pub struct Devices<'a> {
    pub terminal: &'a mut Terminal,
    pub files: &'a mut FileSystem,
}

/// 程序计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pc {
    /// `Program::lines()` 的下标
    pub line: usize,
    /// 行内语句下标
    pub stmt: usize,
}

/// 程序停止的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    End,
    Stop,
    /// 执行完最后一行
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// 等待宿主输入
    Suspended,
    Halted(Halt),
}

/// 挂起的输入请求要写入的目标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputTarget {
    /// `INPUT`：逗号分隔的字段
    Fields(Vec<Var>),
    /// `LINE INPUT`：整行
    Line(Var),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInput {
    /// 已经显示过的提示（重新输入时再显示一次）
    pub prompt: String,
    pub target: InputTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct ForFrame {
    pub var: Var,
    pub end: f64,
    pub step: f64,
    /// 循环体第一条语句
    pub body: Pc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub(super) pc: Pc,
    vars: BTreeMap<String, Value>,
    for_stack: Vec<ForFrame>,
    gosub_stack: Vec<Pc>,
    /// BASIC 通道号 → 打开的文件
    pub(super) channels: BTreeMap<u32, Handle>,
    /// INPUT# 已读入但未消费的字段
    pub(super) fields: BTreeMap<u32, VecDeque<String>>,
    /// PRINT# 的列位置
    pub(super) file_columns: BTreeMap<u32, usize>,
    pub(super) pending: Option<PendingInput>,
    limits: ExecConfig,
    pub(super) record_length: usize,
}

impl Machine {
    pub fn new(limits: ExecConfig, default_record_length: usize) -> Self {
        Self {
            pc: Pc::default(),
            vars: BTreeMap::new(),
            for_stack: Vec::new(),
            gosub_stack: Vec::new(),
            channels: BTreeMap::new(),
            fields: BTreeMap::new(),
            file_columns: BTreeMap::new(),
            pending: None,
            limits,
            record_length: default_record_length,
        }
    }

    pub fn pc(&self) -> Pc {
        self.pc
    }

    pub fn pending(&self) -> Option<&PendingInput> {
        self.pending.as_ref()
    }

    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }

    /// 丢弃挂起的输入请求；程序计数器仍停在 INPUT 语句上
    pub fn cancel_input(&mut self) -> Option<PendingInput> {
        self.pending.take()
    }

    /// 当前（或下一条将要执行的）语句所在的 BASIC 行号
    pub fn current_line(&self, program: &Program) -> Option<u32> {
        let mut index = self.pc.line;
        let mut stmt = self.pc.stmt;
        // 越过行尾即下一行
        while let Some(line) = program.line(index) {
            if stmt < line.statements.len() {
                return Some(line.number);
            }
            index += 1;
            stmt = 0;
        }
        None
    }

    /// 变量的当前值，未赋值时为类型默认值
    pub fn variable(&self, var: &Var) -> Value {
        self.vars
            .get(&var.name)
            .cloned()
            .unwrap_or_else(|| Value::default_for(var))
    }

    pub(super) fn assign(&mut self, var: &Var, value: Value) -> Result<(), FaultKind> {
        value.check_for(var)?;
        self.vars.insert(var.name.clone(), value);
        Ok(())
    }

    pub fn open_channels(&self) -> Vec<u32> {
        self.channels.keys().copied().collect()
    }

    /// 执行一条语句
    pub fn step(&mut self, program: &Program, dev: &mut Devices<'_>) -> Result<Step, RuntimeFault> {
        if self.pending.is_some() {
            return Ok(Step::Suspended);
        }
        let Some(stmt) = self.fetch(program) else {
            let last = program.lines().last().map(|l| l.number).unwrap_or(0);
            self.close_all(dev)
                .map_err(|kind| RuntimeFault::new(last, kind))?;
            debug!(target: TARGET, "program completed");
            return Ok(Step::Halted(Halt::Completed));
        };
        let line = program.line(self.pc.line).map(|l| l.number).unwrap_or(0);
        trace!(target: TARGET, line, stmt = self.pc.stmt, "step");
        self.execute(stmt, program, dev)
            .map_err(|kind| RuntimeFault::new(line, kind))
    }

    /// 把越过行尾的计数器推进到下一行，返回要执行的语句
    fn fetch<'p>(&mut self, program: &'p Program) -> Option<&'p Stmt> {
        loop {
            let line = program.line(self.pc.line)?;
            if let Some(stmt) = line.statements.get(self.pc.stmt) {
                return Some(stmt);
            }
            self.pc = Pc {
                line: self.pc.line + 1,
                stmt: 0,
            };
        }
    }

    pub(super) fn advance(&mut self) {
        self.pc.stmt += 1;
    }

    fn next_line(&mut self) {
        self.pc = Pc {
            line: self.pc.line + 1,
            stmt: 0,
        };
    }

    fn jump(&mut self, program: &Program, number: u32) -> Result<(), FaultKind> {
        let line = program.find(number).ok_or(FaultKind::UndefinedLine)?;
        self.pc = Pc { line, stmt: 0 };
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt, program: &Program, dev: &mut Devices<'_>) -> Result<Step, FaultKind> {
        match stmt {
            Stmt::Rem => self.advance(),
            Stmt::Let { target, value } => {
                let value = self.eval(value, dev)?;
                self.assign(target, value)?;
                self.advance();
            }
            Stmt::Print { channel: None, items } => {
                self.print_terminal(items, dev)?;
                self.advance();
            }
            Stmt::Print {
                channel: Some(channel),
                items,
            } => {
                self.print_file(channel, items, dev)?;
                self.advance();
            }
            Stmt::Input {
                prompt,
                question,
                targets,
            } => {
                let mut text = prompt.clone().unwrap_or_default();
                if *question {
                    text.push_str("? ");
                }
                return self.request_input(
                    PendingInput {
                        prompt: text,
                        target: InputTarget::Fields(targets.clone()),
                    },
                    dev,
                );
            }
            Stmt::LineInput { prompt, target } => {
                if !target.is_string() {
                    return Err(FaultKind::TypeMismatch);
                }
                return self.request_input(
                    PendingInput {
                        prompt: prompt.clone().unwrap_or_default(),
                        target: InputTarget::Line(target.clone()),
                    },
                    dev,
                );
            }
            Stmt::InputFile { channel, targets } => {
                self.input_file(channel, targets, dev)?;
                self.advance();
            }
            Stmt::LineInputFile { channel, target } => {
                self.line_input_file(channel, target, dev)?;
                self.advance();
            }
            Stmt::Goto(number) => self.jump(program, *number)?,
            Stmt::Gosub(number) => {
                if self.gosub_stack.len() >= self.limits.max_gosub_depth {
                    return Err(FaultKind::OutOfMemory);
                }
                let ret = Pc {
                    line: self.pc.line,
                    stmt: self.pc.stmt + 1,
                };
                self.jump(program, *number)?;
                self.gosub_stack.push(ret);
            }
            Stmt::Return => {
                self.pc = self
                    .gosub_stack
                    .pop()
                    .ok_or(FaultKind::ReturnWithoutGosub)?;
            }
            Stmt::If { condition, else_at } => {
                let truth = self.eval_number(condition, dev)?;
                if truth != 0.0 {
                    self.advance();
                } else {
                    match else_at {
                        Some(index) => self.pc.stmt = *index,
                        None => self.next_line(),
                    }
                }
            }
            // THEN 分支执行完毕
            Stmt::Else => self.next_line(),
            Stmt::For {
                var,
                start,
                end,
                step,
            } => self.exec_for(program, var, start, end, step.as_ref(), dev)?,
            Stmt::Next { vars } => self.exec_next(vars)?,
            Stmt::End => {
                self.close_all(dev)?;
                debug!(target: TARGET, "END");
                return Ok(Step::Halted(Halt::End));
            }
            Stmt::Stop => {
                let line = self.current_line(program).unwrap_or(0);
                dev.terminal.print(&format!("Break in {line}\n"));
                self.advance();
                return Ok(Step::Halted(Halt::Stop));
            }
            Stmt::Cls => {
                dev.terminal.clear_screen();
                self.advance();
            }
            Stmt::Width(width) => {
                let width = self.eval_number(width, dev)?.round();
                if !(1.0..=255.0).contains(&width) {
                    return Err(FaultKind::IllegalFunctionCall);
                }
                dev.terminal.set_width(width as usize);
                self.advance();
            }
            Stmt::Open {
                name,
                mode,
                channel,
                record_length,
            } => {
                self.exec_open(name, mode, channel, record_length.as_ref(), dev)?;
                self.advance();
            }
            Stmt::Close { channels } => {
                self.exec_close(channels, dev)?;
                self.advance();
            }
            Stmt::Kill(name) => {
                self.exec_kill(name, dev)?;
                self.advance();
            }
            Stmt::Name { from, to } => {
                self.exec_name(from, to, dev)?;
                self.advance();
            }
            Stmt::Put {
                channel,
                record,
                value,
            } => {
                self.exec_put(channel, record.as_ref(), value, dev)?;
                self.advance();
            }
            Stmt::Get {
                channel,
                record,
                target,
            } => {
                self.exec_get(channel, record.as_ref(), target, dev)?;
                self.advance();
            }
        }
        Ok(Step::Continue)
    }

    fn exec_for(
        &mut self,
        program: &Program,
        var: &Var,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        dev: &mut Devices<'_>,
    ) -> Result<(), FaultKind> {
        if var.is_string() {
            return Err(FaultKind::TypeMismatch);
        }
        let start = self.eval_number(start, dev)?;
        let end = self.eval_number(end, dev)?;
        let step = match step {
            Some(step) => self.eval_number(step, dev)?,
            None => 1.0,
        };
        self.assign(var, Value::Number(start))?;

        // 同一变量的旧循环（以及它里面的循环）作废
        if let Some(index) = self.for_stack.iter().rposition(|f| f.var == *var) {
            self.for_stack.truncate(index);
        }

        let body = Pc {
            line: self.pc.line,
            stmt: self.pc.stmt + 1,
        };
        if !loop_continues(start, end, step) {
            self.pc = find_next(program, body, var).ok_or(FaultKind::ForWithoutNext)?;
            return Ok(());
        }
        if self.for_stack.len() >= self.limits.max_for_depth {
            return Err(FaultKind::OutOfMemory);
        }
        self.for_stack.push(ForFrame {
            var: var.clone(),
            end,
            step,
            body,
        });
        self.pc = body;
        Ok(())
    }

    fn exec_next(&mut self, vars: &[Var]) -> Result<(), FaultKind> {
        if vars.is_empty() {
            let frame = self.for_stack.last().ok_or(FaultKind::NextWithoutFor)?.clone();
            if !self.iterate(frame)? {
                self.advance();
            }
            return Ok(());
        }
        for var in vars {
            let index = self
                .for_stack
                .iter()
                .rposition(|f| f.var == *var)
                .ok_or(FaultKind::NextWithoutFor)?;
            self.for_stack.truncate(index + 1);
            let frame = self.for_stack[index].clone();
            if self.iterate(frame)? {
                return Ok(());
            }
        }
        self.advance();
        Ok(())
    }

    /// 步进循环变量；继续则跳回循环体并返回 true，结束则弹出该循环
    fn iterate(&mut self, frame: ForFrame) -> Result<bool, FaultKind> {
        let current = self.variable(&frame.var).as_number()?;
        let next = finite(current + frame.step)?;
        self.assign(&frame.var, Value::Number(next))?;
        if loop_continues(next, frame.end, frame.step) {
            self.pc = frame.body;
            Ok(true)
        } else {
            self.for_stack.pop();
            Ok(false)
        }
    }

    /// 关闭程序打开的全部通道
    pub(super) fn close_all(&mut self, dev: &mut Devices<'_>) -> Result<(), FaultKind> {
        let channels: Vec<u32> = self.channels.keys().copied().collect();
        let mut first_error = None;
        for channel in channels {
            if let Err(kind) = self.close_channel(channel, dev) {
                first_error.get_or_insert(kind);
            }
        }
        match first_error {
            Some(kind) => Err(kind),
            None => Ok(()),
        }
    }
}

fn loop_continues(value: f64, end: f64, step: f64) -> bool {
    if step >= 0.0 {
        value <= end
    } else {
        value >= end
    }
}

/// 从 `from` 起找与 FOR 配对的 NEXT，返回其后一条语句的位置
fn find_next(program: &Program, from: Pc, var: &Var) -> Option<Pc> {
    let mut depth = 0usize;
    let mut pc = from;
    loop {
        let line = program.line(pc.line)?;
        let Some(stmt) = line.statements.get(pc.stmt) else {
            pc = Pc {
                line: pc.line + 1,
                stmt: 0,
            };
            continue;
        };
        match stmt {
            Stmt::For { .. } => depth += 1,
            Stmt::Next { vars } => {
                let closes = vars.len().max(1);
                if depth < closes && (vars.is_empty() || vars.get(depth) == Some(var)) {
                    return Some(Pc {
                        line: pc.line,
                        stmt: pc.stmt + 1,
                    });
                }
                depth = depth.saturating_sub(closes);
            }
            _ => {}
        }
        pc.stmt += 1;
    }
}
