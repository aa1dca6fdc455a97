//! 编译后的程序：按行号排序的语句行

use super::stmt::Stmt;

/// 一个带行号的程序行
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLine {
    /// BASIC 行号
    pub number: u32,
    /// 该行在源文本中的行（1-based），用于诊断
    pub source_line: usize,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    lines: Vec<ProgramLine>,
}

impl Program {
    /// 按行号排序；重复行号保留最后出现的那一行
    pub fn new(lines: Vec<ProgramLine>) -> Self {
        let mut sorted: Vec<ProgramLine> = Vec::with_capacity(lines.len());
        for line in lines {
            match sorted.binary_search_by_key(&line.number, |l| l.number) {
                Ok(idx) => sorted[idx] = line,
                Err(idx) => sorted.insert(idx, line),
            }
        }
        Self { lines: sorted }
    }

    pub fn lines(&self) -> &[ProgramLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&ProgramLine> {
        self.lines.get(index)
    }

    /// 行号 → 行下标
    pub fn find(&self, number: u32) -> Option<usize> {
        self.lines.binary_search_by_key(&number, |l| l.number).ok()
    }

    pub fn statement(&self, line: usize, stmt: usize) -> Option<&Stmt> {
        self.lines.get(line)?.statements.get(stmt)
    }

    /// 语句总数
    pub fn statement_count(&self) -> usize {
        self.lines.iter().map(|l| l.statements.len()).sum()
    }
}
