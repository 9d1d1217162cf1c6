// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Layout and row builders for edge streams.

use echo_closure::{Row, RowLayout, Value, ValueMeta, ValueType};

/// Fluent builder for [`RowLayout`]s.
///
/// ```
/// use echo_closure::ValueType;
/// use echo_closure_dry_tests::LayoutBuilder;
///
/// let layout = LayoutBuilder::new()
///     .field("label", ValueType::String)
///     .field("parent", ValueType::Integer)
///     .build();
/// assert_eq!(layout.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    layout: RowLayout,
}

impl LayoutBuilder {
    /// Start an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field with no length hints.
    pub fn field(mut self, name: &str, value_type: ValueType) -> Self {
        self.layout.push(ValueMeta::new(name, value_type));
        self
    }

    /// Append a field with length and precision hints.
    pub fn sized_field(mut self, name: &str, value_type: ValueType, length: u32) -> Self {
        self.layout
            .push(ValueMeta::new(name, value_type).with_length(length, 0));
        self
    }

    /// Finish.
    pub fn build(self) -> RowLayout {
        self.layout
    }
}

/// Two-column `parent`, `child` layout of the given id type.
pub fn edge_layout(id_type: ValueType) -> RowLayout {
    LayoutBuilder::new()
        .field("parent", id_type)
        .field("child", id_type)
        .build()
}

/// Integer edge rows for [`edge_layout`]`(ValueType::Integer)`.
pub fn int_edge_rows(edges: &[(i64, i64)]) -> Vec<Row> {
    edges
        .iter()
        .map(|&(p, c)| vec![Value::Integer(p), Value::Integer(c)])
        .collect()
}

/// String edge rows for [`edge_layout`]`(ValueType::String)`.
pub fn str_edge_rows(edges: &[(&str, &str)]) -> Vec<Row> {
    edges
        .iter()
        .map(|&(p, c)| vec![Value::from(p), Value::from(c)])
        .collect()
}
