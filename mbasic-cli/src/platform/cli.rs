//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和源码上下文打印。

use mbasic_api::SessionError;

/// 打印错误；载入阶段的错误附带源代码上下文
pub fn print_error_with_source(e: &SessionError, source: &str) {
    eprintln!("{}", e);

    if !e.is_load_error() {
        return;
    }
    if let (Some(error_line), Some(col)) = (e.line(), e.column()) {
        print_source_context(source, error_line, col);
    }
}

/// 打印源代码上下文（显示错误行前后几行）
pub fn print_source_context(source: &str, error_line: usize, error_col: usize) {
    eprint!("{}", render_source_context(source, error_line, error_col));
}

fn render_source_context(source: &str, error_line: usize, error_col: usize) -> String {
    const CONTEXT_LINES: usize = 2; // 错误行前后显示的上下文行数

    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();
    let mut out = String::new();

    if error_line == 0 || error_line > total_lines {
        return out;
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(total_lines);

    // 行号的最大宽度用于对齐
    let width = end_line.to_string().len();
    let separator = "-".repeat(width + 1);

    out.push_str(&format!("{separator}|--\n"));
    for line_idx in start_line..=end_line {
        out.push_str(&format!("{:>width$} | {}\n", line_idx, lines[line_idx - 1]));
        if line_idx == error_line {
            // 指向错误位置的标记
            let marker = " ".repeat(error_col.saturating_sub(1));
            out.push_str(&format!("{:width$} | {marker}^\n", ""));
        }
    }
    out.push_str(&format!("{separator}|--\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_marks_column() {
        let source = "10 PRINT 1\n20 FOR I = 1 10\n30 NEXT\n";
        let text = render_source_context(source, 2, 14);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "--|--");
        assert_eq!(lines[1], "1 | 10 PRINT 1");
        assert_eq!(lines[2], "2 | 20 FOR I = 1 10");
        assert_eq!(lines[3], "  |              ^");
        assert_eq!(lines[4], "3 | 30 NEXT");
    }

    #[test]
    fn test_out_of_range_line_prints_nothing() {
        assert_eq!(render_source_context("10 END\n", 5, 1), "");
        assert_eq!(render_source_context("10 END\n", 0, 1), "");
    }
}
