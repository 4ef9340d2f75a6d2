//! 模拟播放引擎
//!
//! 由宿主调用 [`SimHandle::advance`] 推进时间。加载和跳帧都有延迟，
//! 短距离跳帧可以配置为不抛出完成事件，用来复现部分平台解码器的行为。

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, trace};
use reelswap_core::{
    EngineError, EngineEventKind, ErrorCode, EventSink, PlaybackEngine, SourceLocation,
};
use serde::{Deserialize, Serialize};

use crate::{SimLibrary, SimMedia};

/// 引擎延迟与怪癖
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimQuirks {
    /// 打开到首帧就绪经过的 advance 次数
    pub load_ticks: u32,
    /// 跳帧完成经过的 advance 次数
    pub seek_ticks: u32,
    /// 跳帧距离小于该值时不抛出完成事件
    pub silent_seek_below_ms: f64,
}

impl Default for SimQuirks {
    fn default() -> Self {
        Self {
            load_ticks: 3,
            seek_ticks: 2,
            silent_seek_below_ms: 0.0,
        }
    }
}

/// 累计统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub opens: u32,
    pub closes: u32,
    pub seeks: u32,
    pub silent_seeks: u32,
}

#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    target_ms: f64,
    from_ms: f64,
    ticks_left: u32,
}

#[derive(Debug)]
struct SimState {
    library: Rc<SimLibrary>,
    quirks: SimQuirks,
    media: Option<SimMedia>,
    location: Option<SourceLocation>,
    ready: bool,
    load_ticks_left: Option<u32>,
    position_ms: f64,
    playing: bool,
    looping: bool,
    pending_seek: Option<PendingSeek>,
    sink: Option<EventSink>,
    stats: SimStats,
}

impl SimState {
    fn duration_ms(&self) -> f64 {
        self.media.map(|media| media.duration_ms).unwrap_or(0.0)
    }

    fn step(&mut self, dt_ms: f64) -> Vec<EngineEventKind> {
        let mut events = Vec::new();
        if self.media.is_none() {
            return events;
        }

        if let Some(left) = self.load_ticks_left {
            if left <= 1 {
                self.load_ticks_left = None;
                self.ready = true;
                events.push(EngineEventKind::FirstFrameReady);
            } else {
                self.load_ticks_left = Some(left - 1);
            }
            return events;
        }

        if let Some(seek) = self.pending_seek.as_mut() {
            if seek.ticks_left > 1 {
                seek.ticks_left -= 1;
                return events;
            }
            let seek = *seek;
            self.pending_seek = None;
            self.position_ms = seek.target_ms;
            if (seek.target_ms - seek.from_ms).abs() < self.quirks.silent_seek_below_ms {
                trace!("Silent seek to {:.1}ms", seek.target_ms);
                self.stats.silent_seeks += 1;
            } else {
                events.push(EngineEventKind::FinishedSeeking);
            }
            return events;
        }

        if self.playing && self.ready {
            let duration_ms = self.duration_ms();
            self.position_ms += dt_ms;
            if self.position_ms >= duration_ms {
                if self.looping && duration_ms > 0.0 {
                    self.position_ms %= duration_ms;
                } else {
                    self.position_ms = duration_ms;
                    self.playing = false;
                    events.push(EngineEventKind::FinishedPlaying);
                }
            }
        }
        events
    }
}

/// 模拟引擎，交给控制器持有
#[derive(Debug)]
pub struct SimEngine {
    state: Rc<RefCell<SimState>>,
}

/// 宿主侧句柄，用于推进时间和查看引擎状态
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Rc<RefCell<SimState>>,
}

impl SimEngine {
    pub fn new(library: Rc<SimLibrary>, quirks: SimQuirks) -> (Self, SimHandle) {
        let state = Rc::new(RefCell::new(SimState {
            library,
            quirks,
            media: None,
            location: None,
            ready: false,
            load_ticks_left: None,
            position_ms: 0.0,
            playing: false,
            looping: false,
            pending_seek: None,
            sink: None,
            stats: SimStats::default(),
        }));
        let handle = SimHandle {
            state: state.clone(),
        };
        (Self { state }, handle)
    }
}

impl SimHandle {
    /// 推进 `dt_ms` 毫秒，返回发出的事件数
    pub fn advance(&self, dt_ms: f64) -> usize {
        let (events, sink) = {
            let mut state = self.state.borrow_mut();
            let events = state.step(dt_ms);
            (events, state.sink.clone())
        };

        let Some(sink) = sink else {
            return 0;
        };
        events
            .into_iter()
            .filter(|kind| sink.emit(*kind, ErrorCode::None))
            .count()
    }

    pub fn location(&self) -> Option<SourceLocation> {
        self.state.borrow().location.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().media.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn is_seeking(&self) -> bool {
        self.state.borrow().pending_seek.is_some()
    }

    pub fn position_ms(&self) -> f64 {
        self.state.borrow().position_ms
    }

    pub fn has_listener(&self) -> bool {
        self.state.borrow().sink.is_some()
    }

    pub fn stats(&self) -> SimStats {
        self.state.borrow().stats
    }
}

impl PlaybackEngine for SimEngine {
    fn open(&mut self, location: &SourceLocation) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        let media = state
            .library
            .resolve(location)
            .ok_or_else(|| EngineError::NotFound(location.to_string()))?;

        debug!("Sim opening {} ({:.0}ms)", location, media.duration_ms);
        state.media = Some(media);
        state.location = Some(location.clone());
        state.ready = false;
        state.load_ticks_left = Some(state.quirks.load_ticks.max(1));
        state.position_ms = 0.0;
        state.playing = false;
        state.pending_seek = None;
        state.stats.opens += 1;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.media = None;
        state.location = None;
        state.ready = false;
        state.load_ticks_left = None;
        state.position_ms = 0.0;
        state.playing = false;
        state.pending_seek = None;
        state.stats.closes += 1;
    }

    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = state.media.is_some();
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn rewind(&mut self) {
        let mut state = self.state.borrow_mut();
        state.position_ms = 0.0;
        state.pending_seek = None;
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }

    fn seek(&mut self, time_ms: f64) {
        let mut state = self.state.borrow_mut();
        if state.media.is_none() {
            return;
        }
        let target_ms = time_ms.clamp(0.0, state.duration_ms());
        let seek = PendingSeek {
            target_ms,
            from_ms: state.position_ms,
            ticks_left: state.quirks.seek_ticks.max(1),
        };
        state.pending_seek = Some(seek);
        state.stats.seeks += 1;
    }

    fn can_play(&self) -> bool {
        self.state.borrow().ready
    }

    fn is_playing(&self) -> bool {
        let state = self.state.borrow();
        state.playing && state.ready
    }

    fn current_time_ms(&self) -> f64 {
        self.state.borrow().position_ms
    }

    fn duration_ms(&self) -> f64 {
        self.state.borrow().duration_ms()
    }

    fn attach_events(&mut self, sink: EventSink) {
        self.state.borrow_mut().sink = Some(sink);
    }

    fn detach_events(&mut self) {
        self.state.borrow_mut().sink = None;
    }
}
