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

use ember_core::reflect::Reflect;
use ember_core::Guid;
use ember_macros::Component;

/// Identity and bookkeeping every entity carries.
///
/// Besides the display fields it records prefab linkage: an instance has
/// `is_prefab` set and names its template scene in `prefab_name`. The GUID
/// is not reflected; documents store it under `entityGUID` instead.
#[derive(Debug, Clone, PartialEq, Reflect, Component)]
pub struct Name {
    /// Display name.
    pub name: String,
    /// Free-form tag used for lookups by gameplay code.
    pub tag: String,
    /// Layer index, used by rendering and physics filtering.
    pub layer: u32,
    /// Whether the entity is drawn.
    pub visible: bool,
    /// Set on entities instanced from a prefab.
    pub is_prefab: bool,
    /// The prefab scene this entity was instanced from.
    pub prefab_name: String,
    #[reflect(skip)]
    pub guid: Guid,
}

impl Name {
    /// Creates a name with default tag, layer and visibility.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns true if the template-controlled fields equal `template`'s.
    ///
    /// Prefab linkage and the GUID belong to the instance and are ignored.
    pub fn matches_template(&self, template: &Name) -> bool {
        self.name == template.name
            && self.tag == template.tag
            && self.layer == template.layer
            && self.visible == template.visible
    }

    /// Copies the template-controlled fields from `template`.
    pub fn apply_template(&mut self, template: &Name) {
        self.name.clone_from(&template.name);
        self.tag.clone_from(&template.tag);
        self.layer = template.layer;
        self.visible = template.visible;
    }
}

impl Default for Name {
    fn default() -> Self {
        Self {
            name: String::from("Entity"),
            tag: String::from("Untagged"),
            layer: 0,
            visible: true,
            is_prefab: false,
            prefab_name: String::new(),
            guid: Guid::NIL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_fields_ignore_linkage_and_guid() {
        let template = Name::new("Crate");
        let mut instance = Name {
            is_prefab: true,
            prefab_name: String::from("crate"),
            guid: Guid::new_v4(),
            ..Name::new("Other")
        };
        assert!(!instance.matches_template(&template));

        instance.apply_template(&template);
        assert!(instance.matches_template(&template));
        assert!(instance.is_prefab);
        assert!(!instance.guid.is_nil());
    }
}
