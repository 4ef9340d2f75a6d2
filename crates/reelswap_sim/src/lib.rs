//! reelswap_sim - 模拟播放引擎
//!
//! 无需真实解码器即可驱动 [`reelswap_core::DualPlayer`]，用于命令行演示和端到端测试。

mod engine;
mod library;
mod rig;

pub use engine::*;
pub use library::*;
pub use rig::*;
