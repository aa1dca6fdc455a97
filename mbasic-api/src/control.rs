//! 跨线程的运行控制
//!
//! 宿主回调（例如 Ctrl-C 处理器）只能拿到 `ControlHandle`，
//! 请求在语句之间由会话处理。

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const NONE: u8 = 0;
const PAUSE: u8 = 1;
const STOP: u8 = 2;

/// 待处理的控制请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    Pause,
    Stop,
}

/// 可克隆、可跨线程的控制句柄
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    request: Arc<AtomicU8>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_pause(&self) {
        // 已有的停止请求优先
        let _ = self
            .request
            .compare_exchange(NONE, PAUSE, Ordering::AcqRel, Ordering::Acquire);
    }

    pub fn request_stop(&self) {
        self.request.store(STOP, Ordering::Release);
    }

    /// 取出并清除当前请求
    pub fn take(&self) -> Option<ControlRequest> {
        match self.request.swap(NONE, Ordering::AcqRel) {
            PAUSE => Some(ControlRequest::Pause),
            STOP => Some(ControlRequest::Stop),
            _ => None,
        }
    }

    pub fn clear(&self) {
        self.request.store(NONE, Ordering::Release);
    }
}
