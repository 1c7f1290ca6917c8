// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ember_data::WorldConfig;
use serde::Deserialize;

/// Everything the runtime reads at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub world: WorldConfig,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub tick_rate_hz: f64,
    /// Stop after this many ticks. Runs until terminated when `None`.
    pub max_ticks: Option<u64>,
    /// Prefab documents, loaded before the scenes.
    pub prefabs: Vec<PathBuf>,
    pub scenes: Vec<PathBuf>,
    /// Where every non-prefab scene is written on shutdown.
    pub output_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig {
                default_scene: Some("Main".to_owned()),
                ..WorldConfig::default()
            },
            log_filter: "info".to_owned(),
            tick_rate_hz: 60.0,
            max_ticks: Some(600),
            prefabs: Vec::new(),
            scenes: Vec::new(),
            output_dir: None,
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read runtime config {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("Failed to parse runtime config {}", path.display()))
    }
}
