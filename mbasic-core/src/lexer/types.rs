//! 通用位置类型

use serde::{Deserialize, Serialize};

/// 源代码坐标（1-based）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub line: usize,
    pub column: usize,
}

impl Coordinate {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// 源代码范围（span）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Coordinate,
    pub end: Coordinate,
}

impl Span {
    /// 创建新的 span
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        Self { start, end }
    }

    /// 从单个坐标创建 span（用于单 token）
    pub fn at(coord: Coordinate) -> Self {
        Self {
            start: coord,
            end: coord,
        }
    }
}
