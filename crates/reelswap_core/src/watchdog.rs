//! 跳帧看门狗
//!
//! 部分引擎在短距离跳帧时不会抛出跳帧完成事件，这里每帧轮询引擎时间，
//! 落在目标附近即视为跳帧完成。与原生事件谁先到谁生效，另一方为空操作。

/// 默认容差（约 1 帧）
pub const DEFAULT_SEEK_TOLERANCE_MS: f64 = 40.0;

/// 单个槽位的跳帧状态
#[derive(Debug, Clone)]
pub struct SeekWatchdog {
    pending: bool,
    target_ms: f64,
    tolerance_ms: f64,
    interval_ticks: u32,
    ticks_since_poll: u32,
}

impl SeekWatchdog {
    /// `interval_ticks` 为轮询间隔，至少 1
    pub fn new(tolerance_ms: f64, interval_ticks: u32) -> Self {
        Self {
            pending: false,
            target_ms: 0.0,
            tolerance_ms,
            interval_ticks: interval_ticks.max(1),
            ticks_since_poll: 0,
        }
    }

    /// 记录新的跳帧目标，覆盖旧目标
    pub fn arm(&mut self, target_ms: f64) {
        self.pending = true;
        self.target_ms = target_ms;
        self.ticks_since_poll = 0;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn target_ms(&self) -> Option<f64> {
        self.pending.then_some(self.target_ms)
    }

    pub fn tolerance_ms(&self) -> f64 {
        self.tolerance_ms
    }

    /// 每帧调用。引擎时间进入容差范围时清除等待并返回 true（只返回一次）
    pub fn poll(&mut self, current_ms: f64) -> bool {
        if !self.pending {
            return false;
        }

        self.ticks_since_poll += 1;
        if self.ticks_since_poll < self.interval_ticks {
            return false;
        }
        self.ticks_since_poll = 0;

        if (current_ms - self.target_ms).abs() < self.tolerance_ms {
            self.pending = false;
            return true;
        }
        false
    }

    /// 原生跳帧完成事件到达。返回是否确有等待中的跳帧
    pub fn complete(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    pub fn reset(&mut self) {
        self.pending = false;
        self.ticks_since_poll = 0;
    }
}

impl Default for SeekWatchdog {
    fn default() -> Self {
        Self::new(DEFAULT_SEEK_TOLERANCE_MS, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_watchdog_never_fires() {
        let mut dog = SeekWatchdog::default();
        assert!(!dog.poll(0.0));
        assert!(!dog.complete());
        assert_eq!(dog.target_ms(), None);
    }

    #[test]
    fn test_fires_once_within_tolerance() {
        let mut dog = SeekWatchdog::default();
        dog.arm(1000.0);

        assert!(!dog.poll(500.0));
        assert!(!dog.poll(960.0)); // 差 40ms，不算
        assert!(dog.poll(1020.0));
        assert!(!dog.poll(1000.0));
        assert!(!dog.is_pending());
    }

    #[test]
    fn test_native_event_and_poll_are_idempotent() {
        let mut dog = SeekWatchdog::default();
        dog.arm(250.0);
        assert!(dog.complete());
        assert!(!dog.poll(250.0));
        assert!(!dog.complete());

        dog.arm(250.0);
        assert!(dog.poll(250.0));
        assert!(!dog.complete());
    }

    #[test]
    fn test_new_target_supersedes_old() {
        let mut dog = SeekWatchdog::default();
        dog.arm(100.0);
        dog.arm(2000.0);
        assert_eq!(dog.target_ms(), Some(2000.0));
        assert!(!dog.poll(100.0));
        assert!(dog.poll(1990.0));
    }

    #[test]
    fn test_poll_interval() {
        let mut dog = SeekWatchdog::new(10.0, 3);
        dog.arm(0.0);
        assert!(!dog.poll(0.0));
        assert!(!dog.poll(0.0));
        assert!(dog.poll(0.0));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut dog = SeekWatchdog::new(10.0, 0);
        dog.arm(0.0);
        assert!(dog.poll(5.0));
    }

    #[test]
    fn test_reset_clears_pending() {
        let mut dog = SeekWatchdog::default();
        dog.arm(100.0);
        dog.reset();
        assert!(!dog.poll(100.0));
        assert!(!dog.complete());
    }
}
