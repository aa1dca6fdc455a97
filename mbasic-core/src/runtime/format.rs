//! 数值的文本形式：`PRINT`、`STR$`、`VAL` 与 `INPUT` 共用

/// 单精度显示：最多 7 位有效数字
const SIGNIFICANT_DIGITS: usize = 7;

/// MBASIC 风格的数值文本，非负数带前导空格
///
/// `5` → `" 5"`，`-0.5` → `"-.5"`，`1E7` → `" 1E+07"`。
/// PRINT 另外追加一个尾随空格，STR$ 不追加。
pub fn format_number(n: f64) -> String {
    let sign = if n < 0.0 { "-" } else { " " };
    format!("{sign}{}", magnitude(n.abs()))
}

fn magnitude(abs: f64) -> String {
    if abs == 0.0 {
        return "0".to_string();
    }

    // 先按有效数字四舍五入，再看指数
    let sci = format!("{:.*e}", SIGNIFICANT_DIGITS - 1, abs);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci.clone(), 0),
    };

    if exponent >= SIGNIFICANT_DIGITS as i32 || exponent < -3 {
        let mantissa = trim_fraction(&mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}E{sign}{:02}", exponent.abs());
    }

    let decimals = (SIGNIFICANT_DIGITS as i32 - 1 - exponent).max(0) as usize;
    let fixed = trim_fraction(&format!("{abs:.decimals$}"));
    match fixed.strip_prefix("0.") {
        Some(rest) => format!(".{rest}"),
        None => fixed,
    }
}

fn trim_fraction(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

/// `VAL` 语义：跳过前导空白，取最长的数值前缀，没有则为 0
pub fn parse_prefix(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut best = 0.0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
        if seen_digit {
            if let Ok(n) = text[..end].parse::<f64>() {
                best = n;
            }
        }
    }
    if !seen_digit {
        return 0.0;
    }

    // 指数部分完整时才采纳
    if matches!(bytes.get(end), Some(b'E' | b'e' | b'D' | b'd')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(|b| b.is_ascii_digit()) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            let candidate = format!("{}E{}", &text[..end], &text[end + 1..exp_end]);
            if let Ok(n) = candidate.parse::<f64>() {
                best = n;
            }
        }
    }
    best
}

/// `INPUT` 语义：整个字段必须是一个数，空字段为 0
pub fn parse_field(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    let valid = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'E' | 'e' | 'D' | 'd'));
    if !valid {
        return None;
    }
    text.replace(['D', 'd'], "E").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_integers() {
        assert_eq!(format_number(5.0), " 5");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(0.0), " 0");
        assert_eq!(format_number(1234567.0), " 1234567");
    }

    #[test]
    fn test_format_fractions() {
        assert_eq!(format_number(0.5), " .5");
        assert_eq!(format_number(-0.25), "-.25");
        assert_eq!(format_number(3.14159265), " 3.141593");
        assert_eq!(format_number(0.1 + 0.2), " .3");
        assert_eq!(format_number(1.0 / 3.0), " .3333333");
    }

    #[test]
    fn test_format_exponent() {
        assert_eq!(format_number(1e7), " 1E+07");
        assert_eq!(format_number(12345678.0), " 1.234568E+07");
        assert_eq!(format_number(0.0001), " 1E-04");
        assert_eq!(format_number(-2.5e-5), "-2.5E-05");
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix("  42abc"), 42.0);
        assert_eq!(parse_prefix("-3.5"), -3.5);
        assert_eq!(parse_prefix("1E3X"), 1000.0);
        assert_eq!(parse_prefix("2E"), 2.0);
        assert_eq!(parse_prefix("abc"), 0.0);
        assert_eq!(parse_prefix("."), 0.0);
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field(" 12 "), Some(12.0));
        assert_eq!(parse_field(""), Some(0.0));
        assert_eq!(parse_field("1D2"), Some(100.0));
        assert_eq!(parse_field("abc"), None);
        assert_eq!(parse_field("inf"), None);
    }
}
