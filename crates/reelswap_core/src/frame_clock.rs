//! 帧时钟
//!
//! 时间（毫秒）与帧号之间的换算。帧号从 1 开始。

use crate::PlayerError;

/// 默认帧率
pub const DEFAULT_FRAME_RATE: f64 = 24.0;

// 1000 / fps 不能精确表示，取整前补一点
const FRAME_EPSILON: f64 = 1e-6;

/// 时间 -> 帧号: `floor(time_ms * fps / 1000) + 1`
pub fn frame_of(time_ms: f64, fps: f64) -> i32 {
    (time_ms * fps / 1000.0 + FRAME_EPSILON).floor() as i32 + 1
}

/// 帧号 -> 时间: `(frame - 1) * (1000 / fps)`
pub fn time_of(frame: i32, fps: f64) -> f64 {
    (frame as f64 - 1.0) * (1000.0 / fps)
}

/// 固定帧率的帧时钟
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: f64,
}

impl FrameClock {
    pub fn new(fps: f64) -> Result<Self, PlayerError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(PlayerError::InvalidFrameRate(fps));
        }
        Ok(Self { fps })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// 单帧时长（毫秒）
    pub fn frame_duration_ms(&self) -> f64 {
        1000.0 / self.fps
    }

    pub fn frame_of(&self, time_ms: f64) -> i32 {
        frame_of(time_ms, self.fps)
    }

    pub fn time_of(&self, frame: i32) -> f64 {
        time_of(frame, self.fps)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FRAME_RATE,
        }
    }
}
