//! 错误定义

use crate::EngineError;

/// 播放控制器错误
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("Player is not initialized")]
    NotInitialized,

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    #[error("Cannot open {path}: {primary}; fallback: {fallback}")]
    SourceUnavailable {
        path: String,
        primary: EngineError,
        fallback: EngineError,
    },
}

/// 配置错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}
