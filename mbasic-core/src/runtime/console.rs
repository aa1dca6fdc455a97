//! PRINT 排版与 INPUT

use super::error::{FaultKind, RuntimeFault};
use super::format::{format_number, parse_field};
use super::machine::{Devices, InputTarget, Machine, PendingInput, Step};
use super::value::{to_count, Value};
use crate::io::{InputReply, Terminal};
use crate::parser::{Expr, PrintItem, Program};
use mbasic_config::INFINITE_WIDTH;
use mbasic_vfs::OpenMode;

/// 求值后的 PRINT 项
enum Piece {
    Text(String),
    /// 下一个输出区
    Zone,
    /// 1-based 目标列
    Tab(usize),
    Spc(usize),
}

/// PRINT 输出的去处：终端或文件
trait PrintSink {
    fn emit(&mut self, text: &str);
    fn column(&self) -> usize;
    fn width(&self) -> usize;
    fn zone_width(&self) -> usize;
}

impl PrintSink for Terminal {
    fn emit(&mut self, text: &str) {
        self.print(text);
    }

    fn column(&self) -> usize {
        Terminal::column(self)
    }

    fn width(&self) -> usize {
        Terminal::width(self)
    }

    fn zone_width(&self) -> usize {
        Terminal::zone_width(self)
    }
}

/// 一条 PRINT# 的输出，写进文件前先攒在这里
struct FileText {
    text: String,
    column: usize,
    zone_width: usize,
}

impl PrintSink for FileText {
    fn emit(&mut self, text: &str) {
        for ch in text.chars() {
            self.column = if ch == '\n' { 0 } else { self.column + 1 };
        }
        self.text.push_str(text);
    }

    fn column(&self) -> usize {
        self.column
    }

    fn width(&self) -> usize {
        INFINITE_WIDTH
    }

    fn zone_width(&self) -> usize {
        self.zone_width
    }
}

fn layout(pieces: &[Piece], newline: bool, sink: &mut dyn PrintSink) {
    let width = sink.width();
    let finite = width != INFINITE_WIDTH;
    for piece in pieces {
        match piece {
            Piece::Text(text) => sink.emit(text),
            Piece::Zone => {
                let column = sink.column();
                let zone = sink.zone_width().max(1);
                let next = (column / zone + 1) * zone;
                // 放不下一个完整的输出区就换行
                if finite && next + zone > width {
                    sink.emit("\n");
                } else {
                    sink.emit(&" ".repeat(next - column));
                }
            }
            Piece::Tab(target) => {
                let mut target = target.saturating_sub(1);
                if finite {
                    target %= width;
                }
                if sink.column() > target {
                    sink.emit("\n");
                }
                let pad = target - sink.column();
                sink.emit(&" ".repeat(pad));
            }
            Piece::Spc(n) => sink.emit(&" ".repeat(*n)),
        }
    }
    if newline {
        sink.emit("\n");
    }
}

/// 把一行输入拆成字段；双引号括起的字段原样保留（含逗号与空格）
pub(super) fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut rest = line;
    loop {
        let trimmed = rest.trim_start();
        if let Some(quoted) = trimmed.strip_prefix('"') {
            let (text, after) = match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            };
            fields.push(text.to_string());
            match after.find(',') {
                Some(comma) => rest = &after[comma + 1..],
                None => return fields,
            }
        } else {
            match trimmed.find(',') {
                Some(comma) => {
                    fields.push(trimmed[..comma].trim_end().to_string());
                    rest = &trimmed[comma + 1..];
                }
                None => {
                    fields.push(trimmed.trim_end().to_string());
                    return fields;
                }
            }
        }
    }
}

impl Machine {
    fn render(&self, items: &[PrintItem], dev: &mut Devices<'_>) -> Result<(Vec<Piece>, bool), FaultKind> {
        let mut pieces = Vec::with_capacity(items.len());
        for item in items {
            match item {
                PrintItem::Expr(expr) => {
                    let piece = match self.eval(expr, dev)? {
                        Value::Number(n) => format!("{} ", format_number(n)),
                        Value::Str(s) => s,
                    };
                    pieces.push(Piece::Text(piece));
                }
                PrintItem::Tab(expr) => {
                    let column = to_count(self.eval_number(expr, dev)?, 255)?;
                    pieces.push(Piece::Tab(column.max(1)));
                }
                PrintItem::Spc(expr) => {
                    pieces.push(Piece::Spc(to_count(self.eval_number(expr, dev)?, 255)?));
                }
                PrintItem::Comma => pieces.push(Piece::Zone),
                PrintItem::Semicolon => {}
            }
        }
        let newline = !matches!(
            items.last(),
            Some(PrintItem::Comma | PrintItem::Semicolon)
        );
        Ok((pieces, newline))
    }

    pub(super) fn print_terminal(&self, items: &[PrintItem], dev: &mut Devices<'_>) -> Result<(), FaultKind> {
        let (pieces, newline) = self.render(items, dev)?;
        layout(&pieces, newline, &mut *dev.terminal);
        Ok(())
    }

    pub(super) fn print_file(
        &mut self,
        channel: &Expr,
        items: &[PrintItem],
        dev: &mut Devices<'_>,
    ) -> Result<(), FaultKind> {
        let channel = self.eval_channel(channel, dev)?;
        let handle = self.handle(channel)?;
        if !matches!(dev.files.mode(handle)?, OpenMode::Output | OpenMode::Append) {
            return Err(FaultKind::BadFileMode);
        }

        let (pieces, newline) = self.render(items, dev)?;
        let mut out = FileText {
            text: String::new(),
            column: self.file_columns.get(&channel).copied().unwrap_or(0),
            zone_width: dev.terminal.zone_width(),
        };
        layout(&pieces, newline, &mut out);
        match out.text.strip_suffix('\n') {
            Some(line) => dev.files.write_line(handle, line)?,
            None => dev.files.write(handle, &out.text)?,
        }
        self.file_columns.insert(channel, out.column);
        Ok(())
    }

    /// 显示提示并请求一行；宿主暂时给不出时挂起
    pub(super) fn request_input(&mut self, request: PendingInput, dev: &mut Devices<'_>) -> Result<Step, FaultKind> {
        loop {
            match dev.terminal.input(&request.prompt) {
                InputReply::Ready(line) => {
                    if self.accept_input(&request.target, &line, dev)? {
                        self.advance();
                        return Ok(Step::Continue);
                    }
                }
                InputReply::Pending => {
                    self.pending = Some(request);
                    return Ok(Step::Suspended);
                }
            }
        }
    }

    /// 交付挂起的输入；没有挂起的请求时什么也不做
    ///
    /// 数值字段不合法时显示 `?Redo from start` 并重新请求，
    /// 这时可能再次返回 `Step::Suspended`。
    pub fn provide_input(
        &mut self,
        program: &Program,
        text: &str,
        dev: &mut Devices<'_>,
    ) -> Result<Step, RuntimeFault> {
        let Some(request) = self.pending.take() else {
            return Ok(Step::Continue);
        };
        dev.terminal.finish_input();
        let line = self.current_line(program).unwrap_or(0);
        let fault = |kind| RuntimeFault::new(line, kind);
        if self.accept_input(&request.target, text, dev).map_err(fault)? {
            self.advance();
            return Ok(Step::Continue);
        }
        self.request_input(request, dev).map_err(fault)
    }

    /// 把一行输入写进目标变量；需要重新输入时返回 false
    fn accept_input(&mut self, target: &InputTarget, line: &str, dev: &mut Devices<'_>) -> Result<bool, FaultKind> {
        let vars = match target {
            InputTarget::Line(var) => {
                self.assign(var, Value::Str(line.to_string()))?;
                return Ok(true);
            }
            InputTarget::Fields(vars) => vars,
        };

        let fields = split_fields(line);
        let mut values = Vec::with_capacity(vars.len());
        for (var, field) in vars.iter().zip(&fields) {
            let value = if var.is_string() {
                Value::Str(field.clone())
            } else {
                match parse_field(field) {
                    Some(n) => Value::Number(n),
                    None => break,
                }
            };
            values.push(value);
        }
        if values.len() < vars.len() {
            dev.terminal.print("?Redo from start\n");
            return Ok(false);
        }

        for (var, value) in vars.iter().zip(values) {
            self.assign(var, value)?;
        }
        if fields.len() > vars.len() {
            dev.terminal.print("?Extra ignored\n");
        }
        Ok(true)
    }
}
