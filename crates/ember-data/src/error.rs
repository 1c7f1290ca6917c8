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

//! Error type shared by every fallible world operation.

use ember_core::{EntityId, ReflectError};
use std::path::PathBuf;
use thiserror::Error;

/// Failures the world cannot turn into a safe no-op.
///
/// Invariant violations such as adding a component twice are logged and
/// ignored instead; these variants cover exhaustion, I/O, malformed input and
/// lookups the caller has to know failed.
#[derive(Debug, Error)]
pub enum EcsError {
    #[error("entity capacity of {capacity} exhausted and no recycled index is available")]
    CapacityExhausted { capacity: u32 },

    #[error("unknown scene `{0}`")]
    UnknownScene(String),

    #[error("scene `{0}` is already loaded")]
    SceneAlreadyLoaded(String),

    #[error("component `{0}` is not registered")]
    UnknownComponent(String),

    #[error("cannot register more than {max} component types")]
    ComponentLimitReached { max: usize },

    #[error("system `{0}` is already registered")]
    DuplicateSystem(&'static str),

    #[error("entity {0} is not alive")]
    InvalidEntity(EntityId),

    #[error("invalid prefab `{name}`: {reason}")]
    InvalidPrefab { name: String, reason: String },

    #[error("failed to access `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document `{}`", path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration")]
    Config(#[from] ron::error::SpannedError),

    #[error(transparent)]
    Reflect(#[from] ReflectError),
}
