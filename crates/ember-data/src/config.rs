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

//! World configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ecs::GameState;
use crate::error::EcsError;

/// Settings fixed when a [`World`](crate::ecs::World) is created.
///
/// Every field has a default, so a RON file only needs the values it changes:
///
/// ```ron
/// (max_entities: 4096, default_scene: Some("Main"))
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Upper bound on simultaneously live entities.
    pub max_entities: u32,
    /// A scene created together with the world, if any.
    pub default_scene: Option<String>,
    /// The game state the first tick runs in.
    pub initial_state: GameState,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: 2000,
            default_scene: None,
            initial_state: GameState::Start,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, EcsError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EcsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EcsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = WorldConfig::from_ron_str("(max_entities: 16)").unwrap();
        assert_eq!(config.max_entities, 16);
        assert_eq!(config.default_scene, None);
        assert_eq!(config.initial_state, GameState::Start);
    }

    #[test]
    fn full_config_parses() {
        let config =
            WorldConfig::from_ron_str(r#"(max_entities: 8, default_scene: Some("Main"), initial_state: Running)"#)
                .unwrap();
        assert_eq!(config.default_scene.as_deref(), Some("Main"));
        assert_eq!(config.initial_state, GameState::Running);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            WorldConfig::from_ron_str("(max_entities: \"many\")"),
            Err(EcsError::Config(_))
        ));
    }
}
