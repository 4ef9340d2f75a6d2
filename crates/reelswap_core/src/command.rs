//! 播放命令和状态事件定义

use serde::{Deserialize, Serialize};

use crate::{Role, SlotId};

/// 播放器命令（宿主 -> 控制器）
///
/// 命令不携带回调，结果通过 [`PlayerEvent`] 观察。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// 打开视频
    Open {
        source: String,
        #[serde(default)]
        defer_swap: bool,
    },
    /// 跳到指定帧
    Seek {
        frame: i32,
        #[serde(default)]
        role: Role,
    },
    /// 播放
    Play {
        #[serde(default)]
        looping: bool,
    },
    /// 暂停
    Pause,
    /// 回到开头并播放
    Rewind,
    /// 播放一段（起始帧到结束帧）
    Stage {
        start: i32,
        end: i32,
        #[serde(default)]
        looping: bool,
        #[serde(default)]
        role: Role,
    },
    /// 关闭视频
    Close {
        #[serde(default)]
        remove_listeners: bool,
    },
    /// 释放全部资源
    Release,
}

/// 状态事件（控制器 -> 宿主）
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// 打开请求已提交给引擎
    Opened { slot: SlotId, source: String },
    /// 两个位置都打不开
    OpenFailed { source: String },
    /// 首帧就绪
    FrameReady { slot: SlotId },
    /// 跳帧完成（原生事件或看门狗）
    SeekFinished { slot: SlotId },
    /// 播放结束
    PlayFinished { slot: SlotId },
    /// 播放器已切换
    Swapped { current: SlotId },
    /// 一段播放到达结束帧
    StageEnded { end_frame: i32 },
    /// 视频已关闭
    Closed,
    /// 资源已释放
    Released,
}
