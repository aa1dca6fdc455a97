//! 程序编辑器
//!
//! 交互式宿主的行编辑：带行号的输入插入或替换该行，只有行号则删除该行。
//! 列表始终按行号排序。

use mbasic_core::parser::error::MAX_LINE_NUMBER;
use std::collections::BTreeMap;

/// 一次输入的效果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// 插入或替换了该行
    Stored(u32),
    /// 删除了该行（不存在也算）
    Deleted(u32),
    /// 不以行号开头：交给宿主当命令处理
    Direct(String),
    /// 行号超出 0..=65529
    Rejected(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramEditor {
    lines: BTreeMap<u32, String>,
}

impl ProgramEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从整段源码建立（空行跳过，不带行号的行忽略）
    pub fn from_source(source: &str) -> Self {
        let mut editor = Self::new();
        for line in source.lines() {
            editor.enter(line);
        }
        editor
    }

    pub fn enter(&mut self, input: &str) -> Edit {
        let input = input.trim_end_matches(['\r', '\n']);
        let trimmed = input.trim_start();
        let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Edit::Direct(trimmed.to_string());
        }

        let number = match trimmed[..digits].parse::<u32>() {
            Ok(n) if n <= MAX_LINE_NUMBER => n,
            _ => return Edit::Rejected(trimmed[..digits].to_string()),
        };
        if trimmed[digits..].trim().is_empty() {
            self.lines.remove(&number);
            return Edit::Deleted(number);
        }
        self.lines.insert(number, trimmed.to_string());
        Edit::Stored(number)
    }

    pub fn delete(&mut self, number: u32) -> bool {
        self.lines.remove(&number).is_some()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// 按行号排序的全部行
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.values().map(String::as_str)
    }

    /// 可直接交给 `load()` 的源码，每行以 `\n` 结尾
    pub fn source(&self) -> String {
        let mut text = String::new();
        for line in self.lines.values() {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_sorted() {
        let mut editor = ProgramEditor::new();
        assert_eq!(editor.enter("20 PRINT 2"), Edit::Stored(20));
        assert_eq!(editor.enter("10 PRINT 1"), Edit::Stored(10));
        assert_eq!(editor.source(), "10 PRINT 1\n20 PRINT 2\n");
    }

    #[test]
    fn test_replace_and_delete() {
        let mut editor = ProgramEditor::from_source("10 PRINT 1\n20 PRINT 2\n");
        editor.enter("10 PRINT \"ONE\"");
        assert_eq!(editor.enter("20"), Edit::Deleted(20));
        assert_eq!(editor.lines().collect::<Vec<_>>(), vec!["10 PRINT \"ONE\""]);
    }

    #[test]
    fn test_direct_and_rejected() {
        let mut editor = ProgramEditor::new();
        assert_eq!(editor.enter("  list"), Edit::Direct("list".into()));
        assert_eq!(editor.enter("70000 PRINT"), Edit::Rejected("70000".into()));
        assert!(editor.is_empty());
    }
}
