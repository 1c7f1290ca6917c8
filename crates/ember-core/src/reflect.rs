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

//! Runtime reflection over plain data.
//!
//! A type opts in by implementing [`Reflect`], usually through
//! `#[derive(Reflect)]`. The derive only has to describe the fields: their
//! declared names, and an ordered walk yielding each one as a `&dyn Reflect`.
//! Saving, loading, comparing and deep-copying are then written once here, on
//! top of that walk, and recurse until they reach a leaf (a number, a `bool`,
//! a `String`...) whose behaviour comes from serde and `PartialEq`.
//!
//! Sequences of reflected values (`Vec<T>`) recurse element by element and
//! are saved as JSON arrays.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::any::Any;
use thiserror::Error;

pub use ember_macros::Reflect;

/// Errors raised while reading a reflected value back from a document.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// A struct was expected to be stored as a JSON object.
    #[error("expected an object for `{type_name}`, found {found}")]
    ExpectedObject {
        /// The reflected type being loaded.
        type_name: &'static str,
        /// A short description of the value that was found instead.
        found: &'static str,
    },
    /// A sequence was expected to be stored as a JSON array.
    #[error("expected an array for `{type_name}`, found {found}")]
    ExpectedArray {
        /// The reflected type being loaded.
        type_name: &'static str,
        /// A short description of the value that was found instead.
        found: &'static str,
    },
    /// A leaf value could not be converted into its Rust type.
    #[error("invalid value for `{type_name}`: {source}")]
    InvalidValue {
        /// The leaf type being loaded.
        type_name: &'static str,
        /// The underlying conversion error.
        #[source]
        source: serde_json::Error,
    },
    /// Loading one field of a struct failed.
    #[error("field `{type_name}.{field}`: {source}")]
    Field {
        /// The struct owning the field.
        type_name: &'static str,
        /// The declared field name.
        field: &'static str,
        /// The error raised by the field itself.
        #[source]
        source: Box<ReflectError>,
    },
}

/// Describes a JSON value in error messages.
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A value whose fields can be enumerated and visited at runtime.
///
/// Implementors only need to provide the field walk; every generic operation
/// has a default built on [`Reflect::fields`] and [`Reflect::fields_mut`].
/// Leaf types override the operations directly instead.
pub trait Reflect: Any + Send + Sync {
    /// The short name of the type, used as the key in scene documents.
    fn type_name(&self) -> &'static str;

    /// Upcasts to `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to `Any` for mutable downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The declared names of the reflected fields, in declaration order.
    fn field_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Each reflected field paired with its name, in declaration order.
    fn fields(&self) -> Vec<(&'static str, &dyn Reflect)> {
        Vec::new()
    }

    /// Mutable counterpart of [`Reflect::fields`].
    fn fields_mut(&mut self) -> Vec<(&'static str, &mut dyn Reflect)> {
        Vec::new()
    }

    /// Writes every field under its declared name into a JSON object.
    fn save(&self) -> Value {
        let mut object = Map::new();
        for (name, field) in self.fields() {
            object.insert(name.to_owned(), field.save());
        }
        Value::Object(object)
    }

    /// Reads every field back from a JSON object produced by [`Reflect::save`].
    ///
    /// Fields missing from the document keep their current value, which lets
    /// older documents load after a field has been added to the type.
    fn load(&mut self, value: &Value) -> Result<(), ReflectError> {
        let type_name = self.type_name();
        let Value::Object(object) = value else {
            return Err(ReflectError::ExpectedObject {
                type_name,
                found: describe(value),
            });
        };
        for (name, field) in self.fields_mut() {
            match object.get(name) {
                Some(field_value) => {
                    field
                        .load(field_value)
                        .map_err(|source| ReflectError::Field {
                            type_name,
                            field: name,
                            source: Box::new(source),
                        })?
                }
                None => log::debug!("`{type_name}.{name}` missing from document, keeping its value"),
            }
        }
        Ok(())
    }

    /// Returns `true` when `other` is the same type and every field is equal.
    fn reflect_eq(&self, other: &dyn Reflect) -> bool {
        if self.as_any().type_id() != other.as_any().type_id() {
            return false;
        }
        let mine = self.fields();
        let theirs = other.fields();
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(theirs.iter())
                .all(|((_, a), (_, b))| a.reflect_eq(*b))
    }

    /// Deep-copies every field of `source` into `self`.
    ///
    /// Returns `false`, leaving `self` untouched, when `source` is another type.
    fn duplicate_from(&mut self, source: &dyn Reflect) -> bool {
        if self.as_any().type_id() != source.as_any().type_id() {
            return false;
        }
        let theirs = source.fields();
        self.fields_mut()
            .into_iter()
            .zip(theirs)
            .all(|((_, dst), (_, src))| dst.duplicate_from(src))
    }
}

impl<'a> dyn Reflect + 'a {
    /// Returns the concrete value if it is a `T`.
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns the concrete value mutably if it is a `T`.
    pub fn downcast_mut<T: Reflect>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Looks a field up by its declared name.
    pub fn field(&self, name: &str) -> Option<&dyn Reflect> {
        self.fields()
            .into_iter()
            .find_map(|(field_name, field)| (field_name == name).then_some(field))
    }

    /// Looks a field up by its declared name, mutably.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect> {
        self.fields_mut()
            .into_iter()
            .find_map(|(field_name, field)| (field_name == name).then_some(field))
    }
}

macro_rules! impl_reflect_value {
    ($($ty:ty),* $(,)?) => {$(
        impl Reflect for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn save(&self) -> Value {
                serde_json::to_value(self).unwrap_or(Value::Null)
            }

            fn load(&mut self, value: &Value) -> Result<(), ReflectError> {
                *self = <$ty>::deserialize(value).map_err(|source| ReflectError::InvalidValue {
                    type_name: stringify!($ty),
                    source,
                })?;
                Ok(())
            }

            fn reflect_eq(&self, other: &dyn Reflect) -> bool {
                other.as_any().downcast_ref::<$ty>().is_some_and(|other| self == other)
            }

            fn duplicate_from(&mut self, source: &dyn Reflect) -> bool {
                match source.as_any().downcast_ref::<$ty>() {
                    Some(value) => {
                        *self = value.clone();
                        true
                    }
                    None => false,
                }
            }
        }
    )*};
}

impl_reflect_value!(bool, char, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, String);

// JSON has no literal for NaN or the infinities, so they are saved as the
// strings `"NaN"`, `"inf"` and `"-inf"`.
macro_rules! impl_reflect_float {
    ($($ty:ident),* $(,)?) => {$(
        impl Reflect for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn save(&self) -> Value {
                if self.is_nan() {
                    Value::from("NaN")
                } else if self.is_infinite() {
                    Value::from(if self.is_sign_positive() { "inf" } else { "-inf" })
                } else {
                    Value::from(*self)
                }
            }

            fn load(&mut self, value: &Value) -> Result<(), ReflectError> {
                *self = match value.as_str() {
                    Some("NaN") => $ty::NAN,
                    Some("inf") => $ty::INFINITY,
                    Some("-inf") => $ty::NEG_INFINITY,
                    _ => <$ty>::deserialize(value).map_err(|source| ReflectError::InvalidValue {
                        type_name: stringify!($ty),
                        source,
                    })?,
                };
                Ok(())
            }

            fn reflect_eq(&self, other: &dyn Reflect) -> bool {
                other
                    .as_any()
                    .downcast_ref::<$ty>()
                    .is_some_and(|other| self == other || self.to_bits() == other.to_bits())
            }

            fn duplicate_from(&mut self, source: &dyn Reflect) -> bool {
                match source.as_any().downcast_ref::<$ty>() {
                    Some(value) => {
                        *self = *value;
                        true
                    }
                    None => false,
                }
            }
        }
    )*};
}

impl_reflect_float!(f32, f64);

impl<T: Reflect + Default> Reflect for Vec<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn save(&self) -> Value {
        Value::Array(self.iter().map(Reflect::save).collect())
    }

    fn load(&mut self, value: &Value) -> Result<(), ReflectError> {
        let Value::Array(items) = value else {
            return Err(ReflectError::ExpectedArray {
                type_name: std::any::type_name::<Self>(),
                found: describe(value),
            });
        };
        let mut loaded = Vec::with_capacity(items.len());
        for item in items {
            let mut element = T::default();
            element.load(item)?;
            loaded.push(element);
        }
        *self = loaded;
        Ok(())
    }

    fn reflect_eq(&self, other: &dyn Reflect) -> bool {
        other.as_any().downcast_ref::<Self>().is_some_and(|other| {
            self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.reflect_eq(b))
        })
    }

    fn duplicate_from(&mut self, source: &dyn Reflect) -> bool {
        let Some(source) = source.as_any().downcast_ref::<Self>() else {
            return false;
        };
        let mut copy = Vec::with_capacity(source.len());
        for item in source {
            let mut element = T::default();
            if !element.duplicate_from(item) {
                return false;
            }
            copy.push(element);
        }
        *self = copy;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Reflect, Default, Debug, PartialEq)]
    struct Inner {
        weight: f32,
        labels: Vec<String>,
    }

    #[derive(Reflect, Default, Debug, PartialEq)]
    struct Outer {
        id: u32,
        inner: Inner,
        history: Vec<Inner>,
        #[reflect(skip)]
        cache: u64,
    }

    fn sample() -> Outer {
        Outer {
            id: 7,
            inner: Inner {
                weight: 0.25,
                labels: vec!["a".into(), "b".into()],
            },
            history: vec![Inner {
                weight: -3.5,
                labels: vec![],
            }],
            cache: 99,
        }
    }

    #[test]
    fn derive_lists_fields_in_declaration_order() {
        let value = sample();
        assert_eq!(value.type_name(), "Outer");
        assert_eq!(value.field_names(), &["id", "inner", "history"]);
        let names: Vec<_> = value.fields().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["id", "inner", "history"]);
    }

    #[test]
    fn save_nests_structs_and_sequences() {
        let saved = sample().save();
        assert_eq!(
            saved,
            json!({
                "id": 7,
                "inner": { "weight": 0.25, "labels": ["a", "b"] },
                "history": [ { "weight": -3.5, "labels": [] } ]
            })
        );
    }

    #[test]
    fn load_restores_saved_fields_and_ignores_skipped_ones() {
        // --- 1. ARRANGE ---
        let original = sample();
        let saved = original.save();
        let mut loaded = Outer::default();

        // --- 2. ACT ---
        loaded.load(&saved).unwrap();

        // --- 3. ASSERT ---
        assert!(loaded.reflect_eq(&original));
        assert_eq!(loaded.cache, 0, "skipped fields are not persisted");
    }

    #[test]
    fn load_keeps_missing_fields_and_reports_bad_ones() {
        let mut value = sample();
        value.load(&json!({ "id": 3 })).unwrap();
        assert_eq!(value.id, 3);
        assert_eq!(value.inner.weight, 0.25);

        let err = value.load(&json!({ "id": "three" })).unwrap_err();
        assert!(matches!(err, ReflectError::Field { field: "id", .. }));
        let err = value.load(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ReflectError::ExpectedObject { .. }));
    }

    #[test]
    fn non_finite_floats_survive_save_and_load() {
        // --- 1. ARRANGE ---
        let original = Inner {
            weight: f32::INFINITY,
            labels: vec![],
        };
        let values = [f64::NAN, f64::NEG_INFINITY, 1.5];

        // --- 2. ACT ---
        let saved = original.save();
        let mut loaded = Inner::default();
        loaded.load(&saved).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(saved, json!({ "weight": "inf", "labels": [] }));
        assert_eq!(loaded.weight, f32::INFINITY);
        for value in values {
            let mut restored = 0.0f64;
            restored.load(&value.save()).unwrap();
            assert!(restored.reflect_eq(&value), "{value} did not round trip");
        }
        assert!(f32::NAN.reflect_eq(&f32::NAN));
        let mut speed = 0.0f32;
        assert!(speed.load(&json!("fast")).is_err());
    }

    #[test]
    fn compare_short_circuits_on_sequence_length() {
        let a = sample();
        let mut b = sample();
        assert!(a.reflect_eq(&b));
        b.history.push(Inner::default());
        assert!(!a.reflect_eq(&b));
        assert!(!a.reflect_eq(&5u32), "different types never compare equal");
    }

    #[test]
    fn duplicate_is_a_deep_copy() {
        let source = sample();
        let mut target = Outer::default();
        assert!(target.duplicate_from(&source));
        assert!(target.reflect_eq(&source));

        target.inner.labels.push("c".into());
        assert_eq!(source.inner.labels.len(), 2);
        assert!(!target.duplicate_from(&1.0f32));
    }

    #[test]
    fn fields_are_reachable_by_name() {
        let mut value = sample();
        let dyn_value: &mut dyn Reflect = &mut value;
        *dyn_value
            .field_mut("id")
            .and_then(|f| f.downcast_mut::<u32>())
            .unwrap() = 42;
        assert_eq!(value.id, 42);
        let dyn_value: &dyn Reflect = &value;
        assert!(dyn_value.field("cache").is_none());
        assert_eq!(
            dyn_value.field("inner").and_then(|f| f.field("weight")).and_then(|f| f.downcast_ref::<f32>()),
            Some(&0.25)
        );
    }
}
