//! 模拟媒体库

use std::collections::HashMap;

use reelswap_core::{LocationKind, SourceLocation};
use serde::{Deserialize, Serialize};

/// 一段模拟视频
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimMedia {
    pub duration_ms: f64,
}

/// 媒体库条目（脚本中的写法）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimMediaEntry {
    pub location: LocationKind,
    pub path: String,
    pub duration_ms: f64,
}

/// 按位置和路径查找的媒体库
#[derive(Debug, Clone, Default)]
pub struct SimLibrary {
    entries: HashMap<(LocationKind, String), SimMedia>,
}

impl SimLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = SimMediaEntry>,
    {
        let mut library = Self::new();
        for entry in entries {
            library.insert(entry.location, entry.path, entry.duration_ms);
        }
        library
    }

    pub fn with_media(mut self, location: LocationKind, path: &str, duration_ms: f64) -> Self {
        self.insert(location, path.to_string(), duration_ms);
        self
    }

    pub fn insert(&mut self, location: LocationKind, path: String, duration_ms: f64) {
        self.entries
            .insert((location, path), SimMedia { duration_ms });
    }

    pub fn resolve(&self, location: &SourceLocation) -> Option<SimMedia> {
        self.entries
            .get(&(location.kind, location.path.clone()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
