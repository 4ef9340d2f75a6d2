//! reelswap_core - 双缓冲视频播放控制
//!
//! 两个播放引擎交替工作：一个负责当前显示，另一个在后台预加载下一段视频，
//! 加载完成（或跳帧完成）后无缝切换。

mod callback;
mod command;
mod config;
mod controller;
mod engine;
mod error;
mod frame_clock;
mod open;
mod stage;
mod surface;
mod watchdog;

#[cfg(test)]
mod testing;

pub use callback::*;
pub use command::*;
pub use config::*;
pub use controller::*;
pub use engine::*;
pub use error::*;
pub use frame_clock::*;
pub use open::*;
pub use stage::*;
pub use surface::*;
pub use watchdog::*;
