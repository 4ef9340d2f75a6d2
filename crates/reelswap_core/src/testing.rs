//! 测试用引擎：记录调用，时间和事件由测试手动驱动

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::{
    EngineError, EngineEventKind, ErrorCode, EventSink, LocationKind, PlaybackEngine,
    SourceLocation,
};

#[derive(Debug, Default)]
pub struct MockState {
    pub unavailable: Vec<LocationKind>,
    pub open_attempts: Vec<SourceLocation>,
    pub open: Option<SourceLocation>,
    pub playing: bool,
    pub looping: bool,
    pub time_ms: f64,
    pub duration_ms: f64,
    pub seeks: Vec<f64>,
    pub rewinds: u32,
    pub closes: u32,
    pub sink: Option<EventSink>,
}

#[derive(Debug, Clone)]
pub struct MockEngine {
    state: Rc<RefCell<MockState>>,
}

impl MockEngine {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                duration_ms,
                ..Default::default()
            })),
        }
    }

    pub fn state(&self) -> Ref<'_, MockState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    pub fn set_time(&self, time_ms: f64) {
        self.state.borrow_mut().time_ms = time_ms;
    }

    /// 经事件出口发送；未挂接监听时返回 false
    pub fn fire(&self, kind: EngineEventKind) -> bool {
        match &self.state.borrow().sink {
            Some(sink) => sink.emit(kind, ErrorCode::None),
            None => false,
        }
    }
}

impl PlaybackEngine for MockEngine {
    fn open(&mut self, location: &SourceLocation) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        state.open_attempts.push(location.clone());
        if state.unavailable.contains(&location.kind) {
            return Err(EngineError::NotFound(location.path.clone()));
        }
        state.open = Some(location.clone());
        state.playing = false;
        state.time_ms = 0.0;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open = None;
        state.playing = false;
        state.closes += 1;
    }

    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = state.open.is_some();
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn rewind(&mut self) {
        let mut state = self.state.borrow_mut();
        state.time_ms = 0.0;
        state.rewinds += 1;
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }

    fn seek(&mut self, time_ms: f64) {
        self.state.borrow_mut().seeks.push(time_ms);
    }

    fn can_play(&self) -> bool {
        self.state.borrow().open.is_some()
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    fn current_time_ms(&self) -> f64 {
        self.state.borrow().time_ms
    }

    fn duration_ms(&self) -> f64 {
        self.state.borrow().duration_ms
    }

    fn attach_events(&mut self, sink: EventSink) {
        self.state.borrow_mut().sink = Some(sink);
    }

    fn detach_events(&mut self) {
        self.state.borrow_mut().sink = None;
    }
}
