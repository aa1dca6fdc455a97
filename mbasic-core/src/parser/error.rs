use crate::lexer::types::Coordinate;

/// 语法错误，包含位置信息
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    /// 错误类型
    pub kind: ParserErrorKind,
    /// 错误发生的位置
    pub location: ErrorLocation,
}

/// 错误位置信息
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorLocation {
    /// 特定位置
    At(Coordinate),
    /// 文件末尾
    Eof,
}

/// 语法错误类型
#[derive(Debug, Clone, PartialEq)]
pub enum ParserErrorKind {
    /// 意外的token
    UnexpectedToken {
        found: String,
        expected: Vec<String>,
    },
    /// 非空行必须以行号开头
    MissingLineNumber,
    /// 行号超出 0..=65529
    InvalidLineNumber(String),
    /// 无效的数字格式
    InvalidNumberFormat(String),
    /// 缺少右括号
    MissingRightParen,
    /// 期望变量
    ExpectedVariable { found: String },
    /// 未知函数，或参数个数不对
    BadFunctionCall(String),
    /// 表达式或 IF 嵌套超过 `MAX_NESTING`
    TooComplex,
    /// 自定义错误消息
    Custom(String),
}

/// MBASIC 允许的最大行号
pub const MAX_LINE_NUMBER: u32 = 65529;

/// 表达式树高与 IF 嵌套的上限
pub const MAX_NESTING: usize = 128;

impl ParserError {
    /// 在指定位置创建错误
    pub fn at(kind: ParserErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            location: ErrorLocation::At(Coordinate { line, column }),
        }
    }

    /// 在当前位置创建错误（从token获取位置）
    pub fn here(kind: ParserErrorKind, coordinate: Coordinate) -> Self {
        Self {
            kind,
            location: ErrorLocation::At(coordinate),
        }
    }

    /// 在文件末尾创建错误
    pub fn at_eof(kind: ParserErrorKind) -> Self {
        Self {
            kind,
            location: ErrorLocation::Eof,
        }
    }

    /// 获取行号（如果可用）
    pub fn line(&self) -> Option<usize> {
        match &self.location {
            ErrorLocation::At(coord) => Some(coord.line),
            ErrorLocation::Eof => None,
        }
    }

    /// 获取列号（如果可用）
    pub fn column(&self) -> Option<usize> {
        match &self.location {
            ErrorLocation::At(coord) => Some(coord.column),
            ErrorLocation::Eof => None,
        }
    }

    /// 不带位置前缀的消息
    pub fn message(&self) -> String {
        match &self.kind {
            ParserErrorKind::UnexpectedToken { found, expected } => {
                if expected.is_empty() {
                    format!("Unexpected {found}")
                } else {
                    format!("Unexpected {}, expected: {}", found, expected.join(", "))
                }
            }
            ParserErrorKind::MissingLineNumber => "Line number expected".to_string(),
            ParserErrorKind::InvalidLineNumber(s) => format!("Invalid line number: {s}"),
            ParserErrorKind::InvalidNumberFormat(s) => format!("Invalid number format: '{s}'"),
            ParserErrorKind::MissingRightParen => "Missing right parenthesis ')'".to_string(),
            ParserErrorKind::ExpectedVariable { found } => {
                format!("Expected variable, found: {found}")
            }
            ParserErrorKind::BadFunctionCall(msg) => msg.clone(),
            ParserErrorKind::TooComplex => "Expression too complex".to_string(),
            ParserErrorKind::Custom(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let location_prefix = match &self.location {
            ErrorLocation::At(coord) => format!("{}:{}", coord.line, coord.column),
            ErrorLocation::Eof => "EOF".to_string(),
        };
        write!(f, "[{location_prefix}] {}", self.message())
    }
}

impl std::error::Error for ParserError {}

/// 解析结果类型
pub type ParseResult<T> = Result<T, ParserError>;
