// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Row layouts: ordered field metadata shared by every row of a stream.

use crate::value::{Value, ValueType};

/// A row of values positionally aligned with a [`RowLayout`].
pub type Row = Vec<Value>;

/// Metadata describing one field of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueMeta {
    /// Field name, unique within a layout.
    pub name: String,
    /// Declared type of the field.
    pub value_type: ValueType,
    /// Display length hint.
    #[cfg_attr(feature = "serde", serde(default))]
    pub length: Option<u32>,
    /// Display precision hint.
    #[cfg_attr(feature = "serde", serde(default))]
    pub precision: Option<u32>,
    /// Name of the stage that produced the field.
    #[cfg_attr(feature = "serde", serde(default))]
    pub origin: Option<String>,
}

impl ValueMeta {
    /// Creates metadata with no length, precision or origin.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            length: None,
            precision: None,
            origin: None,
        }
    }

    /// Sets the length and precision hints.
    pub fn with_length(mut self, length: u32, precision: u32) -> Self {
        self.length = Some(length);
        self.precision = Some(precision);
        self
    }

    /// Sets the origin stage name.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Ordered list of field metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RowLayout {
    fields: Vec<ValueMeta>,
}

impl RowLayout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn push(&mut self, meta: ValueMeta) {
        self.fields.push(meta);
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the layout has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field metadata at `index`.
    pub fn get(&self, index: usize) -> Option<&ValueMeta> {
        self.fields.get(index)
    }

    /// Finds the first field named `name`, returning its index and metadata.
    pub fn search(&self, name: &str) -> Option<(usize, &ValueMeta)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, meta)| meta.name == name)
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &ValueMeta> {
        self.fields.iter()
    }

    /// Field names in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|m| m.name.as_str()).collect()
    }
}

impl FromIterator<ValueMeta> for RowLayout {
    fn from_iter<I: IntoIterator<Item = ValueMeta>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_returns_first_match_with_index() {
        let layout: RowLayout = [
            ValueMeta::new("a", ValueType::Integer),
            ValueMeta::new("b", ValueType::String),
            ValueMeta::new("b", ValueType::Integer),
        ]
        .into_iter()
        .collect();
        let (idx, meta) = layout.search("b").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(meta.value_type, ValueType::String);
        assert!(layout.search("c").is_none());
    }
}
