//! 文件语句：OPEN / CLOSE / INPUT# / LINE INPUT# / PUT / GET / KILL / NAME

use super::console::split_fields;
use super::error::FaultKind;
use super::format::parse_prefix;
use super::machine::{Devices, Machine, TARGET};
use super::value::Value;
use crate::parser::{Expr, ModeSpec, Var};
use mbasic_vfs::{Handle, OpenMode};
use tracing::debug;

/// 通道号范围 1..=15
pub const MAX_CHANNELS: u32 = 15;

/// 随机文件记录号上限
const MAX_RECORD: f64 = 32767.0;

/// `OPEN "O", ...` 写法的模式字符串，只看首字母
fn parse_mode(text: &str) -> Result<OpenMode, FaultKind> {
    match text.trim_start().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('I') => Ok(OpenMode::Input),
        Some('O') => Ok(OpenMode::Output),
        Some('A') => Ok(OpenMode::Append),
        Some('R') => Ok(OpenMode::Random),
        _ => Err(FaultKind::BadFileMode),
    }
}

impl Machine {
    pub(super) fn eval_channel(&self, expr: &Expr, dev: &mut Devices<'_>) -> Result<u32, FaultKind> {
        let n = self.eval_number(expr, dev)?.round();
        if (1.0..=f64::from(MAX_CHANNELS)).contains(&n) {
            Ok(n as u32)
        } else {
            Err(FaultKind::BadFileNumber)
        }
    }

    pub(super) fn handle(&self, channel: u32) -> Result<Handle, FaultKind> {
        self.channels
            .get(&channel)
            .copied()
            .ok_or(FaultKind::BadFileNumber)
    }

    fn handle_in_mode(
        &self,
        channel: &Expr,
        modes: &[OpenMode],
        dev: &mut Devices<'_>,
    ) -> Result<(u32, Handle), FaultKind> {
        let channel = self.eval_channel(channel, dev)?;
        let handle = self.handle(channel)?;
        if !modes.contains(&dev.files.mode(handle)?) {
            return Err(FaultKind::BadFileMode);
        }
        Ok((channel, handle))
    }

    pub(super) fn exec_open(
        &mut self,
        name: &Expr,
        mode: &ModeSpec,
        channel: &Expr,
        record_length: Option<&Expr>,
        dev: &mut Devices<'_>,
    ) -> Result<(), FaultKind> {
        let mode = match mode {
            ModeSpec::Fixed(mode) => *mode,
            ModeSpec::Dynamic(expr) => parse_mode(&self.eval_string(expr, dev)?)?,
        };
        let channel = self.eval_channel(channel, dev)?;
        let name = self.eval_string(name, dev)?;
        if self.channels.contains_key(&channel) {
            return Err(FaultKind::FileAlreadyOpen);
        }
        let record_length = match record_length {
            Some(expr) => {
                let n = self.eval_number(expr, dev)?.round();
                if !(1.0..=MAX_RECORD).contains(&n) {
                    return Err(FaultKind::IllegalFunctionCall);
                }
                n as usize
            }
            None => self.record_length,
        };

        let handle = dev.files.open(&name, mode, record_length)?;
        debug!(target: TARGET, channel, %handle, name, %mode, "OPEN");
        self.channels.insert(channel, handle);
        Ok(())
    }

    /// 关闭一个通道；没打开的通道忽略
    pub(super) fn close_channel(&mut self, channel: u32, dev: &mut Devices<'_>) -> Result<(), FaultKind> {
        self.fields.remove(&channel);
        self.file_columns.remove(&channel);
        if let Some(handle) = self.channels.remove(&channel) {
            dev.files.close(handle)?;
        }
        Ok(())
    }

    pub(super) fn exec_close(&mut self, channels: &[Expr], dev: &mut Devices<'_>) -> Result<(), FaultKind> {
        if channels.is_empty() {
            return self.close_all(dev);
        }
        for channel in channels {
            let channel = self.eval_channel(channel, dev)?;
            self.close_channel(channel, dev)?;
        }
        Ok(())
    }

    /// 下一个逗号/换行分隔的字段
    fn next_field(&mut self, channel: u32, handle: Handle, dev: &mut Devices<'_>) -> Result<String, FaultKind> {
        loop {
            if let Some(field) = self.fields.get_mut(&channel).and_then(|q| q.pop_front()) {
                return Ok(field);
            }
            let line = dev.files.read_line(handle)?.ok_or(FaultKind::InputPastEnd)?;
            self.fields
                .entry(channel)
                .or_default()
                .extend(split_fields(&line));
        }
    }

    pub(super) fn input_file(&mut self, channel: &Expr, targets: &[Var], dev: &mut Devices<'_>) -> Result<(), FaultKind> {
        let (channel, handle) = self.handle_in_mode(channel, &[OpenMode::Input], dev)?;
        for var in targets {
            let field = self.next_field(channel, handle, dev)?;
            let value = if var.is_string() {
                Value::Str(field)
            } else {
                Value::Number(parse_prefix(&field))
            };
            self.assign(var, value)?;
        }
        Ok(())
    }

    /// 读取下一整行；INPUT# 留下的半行字段被丢弃
    pub(super) fn line_input_file(&mut self, channel: &Expr, target: &Var, dev: &mut Devices<'_>) -> Result<(), FaultKind> {
        if !target.is_string() {
            return Err(FaultKind::TypeMismatch);
        }
        let (channel, handle) = self.handle_in_mode(channel, &[OpenMode::Input], dev)?;
        self.fields.remove(&channel);
        let line = dev.files.read_line(handle)?.ok_or(FaultKind::InputPastEnd)?;
        self.assign(target, Value::Str(line))
    }

    /// 随机文件：有记录号时先定位
    fn seek_for_record(
        &self,
        handle: Handle,
        record: Option<&Expr>,
        dev: &mut Devices<'_>,
    ) -> Result<usize, FaultKind> {
        let record_length = dev.files.record_length(handle)?;
        if let Some(record) = record {
            let n = self.eval_number(record, dev)?.round();
            if !(1.0..=MAX_RECORD).contains(&n) {
                return Err(FaultKind::BadRecordNumber);
            }
            dev.files.seek_record(handle, n as u64, record_length)?;
        }
        Ok(record_length)
    }

    /// PUT：字符串按记录长度补空格或截断后写入
    pub(super) fn exec_put(
        &mut self,
        channel: &Expr,
        record: Option<&Expr>,
        value: &Expr,
        dev: &mut Devices<'_>,
    ) -> Result<(), FaultKind> {
        let (_, handle) = self.handle_in_mode(channel, &[OpenMode::Random], dev)?;
        let record_length = self.seek_for_record(handle, record, dev)?;
        let mut bytes = self.eval_string(value, dev)?.into_bytes();
        bytes.resize(record_length, b' ');
        dev.files.write_raw(handle, &bytes)?;
        Ok(())
    }

    /// GET：读一整条记录，去掉末尾补的 NUL
    pub(super) fn exec_get(
        &mut self,
        channel: &Expr,
        record: Option<&Expr>,
        target: &Var,
        dev: &mut Devices<'_>,
    ) -> Result<(), FaultKind> {
        if !target.is_string() {
            return Err(FaultKind::TypeMismatch);
        }
        let (_, handle) = self.handle_in_mode(channel, &[OpenMode::Random], dev)?;
        let record_length = self.seek_for_record(handle, record, dev)?;
        let mut bytes = dev.files.read_raw(handle, record_length)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        self.assign(target, Value::Str(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn is_open_by_name(&self, name: &str, dev: &Devices<'_>) -> bool {
        self.channels
            .values()
            .any(|handle| dev.files.name(*handle).is_ok_and(|open| open == name))
    }

    pub(super) fn exec_kill(&mut self, name: &Expr, dev: &mut Devices<'_>) -> Result<(), FaultKind> {
        let name = self.eval_string(name, dev)?;
        if self.is_open_by_name(&name, dev) {
            return Err(FaultKind::FileAlreadyOpen);
        }
        if !dev.files.exists(&name) {
            return Err(FaultKind::FileNotFound);
        }
        dev.files.remove(&name)?;
        Ok(())
    }

    pub(super) fn exec_name(&mut self, from: &Expr, to: &Expr, dev: &mut Devices<'_>) -> Result<(), FaultKind> {
        let from = self.eval_string(from, dev)?;
        let to = self.eval_string(to, dev)?;
        if !dev.files.exists(&from) {
            return Err(FaultKind::FileNotFound);
        }
        if dev.files.exists(&to) {
            return Err(FaultKind::FileAlreadyExists);
        }
        dev.files.rename(&from, &to)?;
        Ok(())
    }
}
