//! Resource views: externally safe projections of internal records.
//!
//! A view is the record's JSON object minus the record type's explicit
//! omission list. Nothing is renamed or computed. A present-but-null attribute
//! stays `null`; an omitted attribute disappears entirely.

use core::marker::PhantomData;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Internal record that may leave the service as a [`ResourceView`].
pub trait Resource: Serialize {
    /// Display name, used in diagnostics.
    const NAME: &'static str;

    /// Serialized keys that must never appear in a view.
    const OMITTED: &'static [&'static str];
}

/// Drop `omitted` keys from `fields`; everything else passes through untouched.
pub fn project(mut fields: Map<String, Value>, omitted: &[&str]) -> Map<String, Value> {
    for key in omitted {
        fields.remove(*key);
    }
    fields
}

/// Projection of one `T` record. Built on demand for a response, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceView<T> {
    fields: Map<String, Value>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Resource> ResourceView<T> {
    /// Project a record.
    ///
    /// # Panics
    ///
    /// If `record` does not serialize to a JSON object. Records are plain
    /// derived structs, so this is a bug in the record type, not bad input.
    pub fn of(record: &T) -> Self {
        match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => Self::from_fields(fields),
            Ok(other) => panic!("{} must serialize to a JSON object, got {other}", T::NAME),
            Err(e) => panic!("{} failed to serialize: {e}", T::NAME),
        }
    }

    /// Project already-serialized record fields.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields: project(fields, T::OMITTED),
            _record: PhantomData,
        }
    }

    /// Apply the omission list again. Always equal to `self`.
    pub fn reproject(&self) -> Self {
        Self::from_fields(self.fields.clone())
    }
}

impl<T> ResourceView<T> {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl<T> Serialize for ResourceView<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
