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

//! Globally unique identifiers attached to entities.
//!
//! Scene documents persist the GUID of every entity under the `entityGUID` key,
//! which is what lets a reloaded scene be matched against the one it was saved from.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A random (v4) UUID identifying an entity across save and load cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(Uuid);

impl Guid {
    /// The nil GUID, used before an entity has been given an identity.
    pub const NIL: Guid = Guid(Uuid::nil());

    /// Generates a fresh random GUID.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the hyphenated textual form written into scene documents.
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }

    /// Returns `true` for [`Guid::NIL`].
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::NIL
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}
