//! 播放引擎接口
//!
//! 解码、跳帧、播放由外部引擎完成，控制器只通过 [`PlaybackEngine`] 驱动它们，
//! 并通过 [`EventSink`] 接收引擎事件。

use std::fmt;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// 播放器槽位（0 或 1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    pub const FIRST: SlotId = SlotId(0);
    pub const SECOND: SlotId = SlotId(1);
    pub const ALL: [SlotId; 2] = [SlotId::FIRST, SlotId::SECOND];

    pub fn new(index: usize) -> Option<Self> {
        (index < 2).then_some(SlotId(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// 另一个槽位
    pub fn other(self) -> Self {
        SlotId(1 - self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// 槽位角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 当前显示的播放器
    #[default]
    Current,
    /// 后台加载的播放器
    Standby,
}

/// 视频所在位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// 持久化存储（下载目录）
    Persistent,
    /// 随包资源
    Bundled,
}

/// 解析后的打开位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub kind: LocationKind,
    pub path: String,
}

impl SourceLocation {
    pub fn new(kind: LocationKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.path)
    }
}

/// 引擎打开错误
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Source not found: {0}")]
    NotFound(String),
    #[error("Source rejected: {0}")]
    Rejected(String),
}

/// 引擎事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEventKind {
    /// 首帧可显示（视频加载完成）
    FirstFrameReady,
    /// 跳帧完成
    FinishedSeeking,
    /// 播放结束
    FinishedPlaying,
}

/// 引擎错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCode {
    #[default]
    None,
    LoadFailed,
    DecodeFailed,
}

/// 引擎事件，带来源槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineEvent {
    pub slot: SlotId,
    pub kind: EngineEventKind,
    pub error: ErrorCode,
}

impl EngineEvent {
    pub fn new(slot: SlotId, kind: EngineEventKind) -> Self {
        Self {
            slot,
            kind,
            error: ErrorCode::None,
        }
    }
}

/// 引擎事件出口，由控制器在挂接监听时交给引擎
#[derive(Debug, Clone)]
pub struct EventSink {
    slot: SlotId,
    tx: Sender<EngineEvent>,
}

impl EventSink {
    pub fn new(slot: SlotId, tx: Sender<EngineEvent>) -> Self {
        Self { slot, tx }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// 发送事件；控制器已释放时返回 false
    pub fn emit(&self, kind: EngineEventKind, error: ErrorCode) -> bool {
        self.tx
            .send(EngineEvent {
                slot: self.slot,
                kind,
                error,
            })
            .is_ok()
    }
}

/// 外部播放引擎
pub trait PlaybackEngine {
    /// 打开视频；位置无效时返回错误，由调用方尝试备用位置
    fn open(&mut self, location: &SourceLocation) -> Result<(), EngineError>;
    fn close(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn rewind(&mut self);
    fn set_looping(&mut self, looping: bool);
    fn seek(&mut self, time_ms: f64);

    fn can_play(&self) -> bool;
    fn is_playing(&self) -> bool;
    fn current_time_ms(&self) -> f64;
    fn duration_ms(&self) -> f64;

    /// 挂接事件监听
    fn attach_events(&mut self, sink: EventSink);
    /// 移除全部事件监听
    fn detach_events(&mut self);
}
