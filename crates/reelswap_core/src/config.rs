//! 播放器配置

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, DEFAULT_FRAME_RATE, DEFAULT_SEEK_TOLERANCE_MS};

/// 播放器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// 帧率
    pub frame_rate: f64,
    /// 看门狗判定跳帧完成的容差（毫秒）
    pub seek_tolerance_ms: f64,
    /// 看门狗轮询间隔（tick 数）
    pub watchdog_interval_ticks: u32,
    /// 持久化存储位置的路径前缀
    pub persistent_prefix: String,
    /// 状态事件通道容量
    pub status_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            seek_tolerance_ms: DEFAULT_SEEK_TOLERANCE_MS,
            watchdog_interval_ticks: 1,
            persistent_prefix: "Download/".to_string(),
            status_capacity: 64,
        }
    }
}

impl PlayerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(ConfigError::Invalid("frame_rate must be positive"));
        }
        if !self.seek_tolerance_ms.is_finite() || self.seek_tolerance_ms <= 0.0 {
            return Err(ConfigError::Invalid("seek_tolerance_ms must be positive"));
        }
        if self.watchdog_interval_ticks == 0 {
            return Err(ConfigError::Invalid("watchdog_interval_ticks must be at least 1"));
        }
        if self.status_capacity == 0 {
            return Err(ConfigError::Invalid("status_capacity must be at least 1"));
        }
        Ok(())
    }

    /// 持久化存储中的路径
    pub fn persistent_path(&self, source: &str) -> String {
        format!("{}{}", self.persistent_prefix, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_player() {
        let config = PlayerConfig::default();
        assert_eq!(config.frame_rate, 24.0);
        assert_eq!(config.seek_tolerance_ms, 40.0);
        assert_eq!(config.persistent_path("intro.mp4"), "Download/intro.mp4");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PlayerConfig::from_json_str(r#"{"frame_rate": 30.0}"#).unwrap();
        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.seek_tolerance_ms, 40.0);
        assert_eq!(config.watchdog_interval_ticks, 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            PlayerConfig::from_json_str(r#"{"frame_rate": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PlayerConfig::from_json_str(r#"{"watchdog_interval_ticks": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PlayerConfig::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
