// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Output schema negotiation and design-time checks.
//!
//! The closure table always has exactly three columns: the parent id and child
//! id fields copied from the upstream layout, followed by a new integer
//! distance field. Nothing else from the upstream row survives.

use crate::error::ClosureError;
use crate::layout::{RowLayout, ValueMeta};
use crate::settings::ClosureSettings;
use crate::value::ValueType;

/// Display length assigned to the generated distance field.
pub const DEFAULT_INTEGER_LENGTH: u32 = 15;

/// Negotiated output layout plus where to find the ids in upstream rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    layout: RowLayout,
    parent_index: usize,
    child_index: usize,
    parent_type: ValueType,
    child_type: ValueType,
}

impl OutputSchema {
    /// Output layout: `[parent, child, distance]`.
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Column of the parent id in upstream rows.
    pub fn parent_index(&self) -> usize {
        self.parent_index
    }

    /// Column of the child id in upstream rows.
    pub fn child_index(&self) -> usize {
        self.child_index
    }

    /// Declared type of the parent id.
    pub fn parent_type(&self) -> ValueType {
        self.parent_type
    }

    /// Declared type of the child id.
    pub fn child_type(&self) -> ValueType {
        self.child_type
    }

    /// Upstream name of the parent id field.
    pub fn parent_field(&self) -> &str {
        self.layout.get(0).map_or("", |m| m.name.as_str())
    }

    /// Upstream name of the child id field.
    pub fn child_field(&self) -> &str {
        self.layout.get(1).map_or("", |m| m.name.as_str())
    }
}

/// Derives the output layout from `upstream` and the configured field names.
///
/// `upstream` is only read; consumers sharing it see no change.
///
/// # Errors
///
/// [`ClosureError::Configuration`] when a field name is empty, an id field is
/// absent from `upstream`, or two output fields would share a name.
pub fn negotiate_schema(
    settings: &ClosureSettings,
    upstream: &RowLayout,
) -> Result<OutputSchema, ClosureError> {
    for (what, name) in [
        ("parent id", &settings.parent_id_field),
        ("child id", &settings.child_id_field),
        ("distance", &settings.distance_field),
    ] {
        if name.trim().is_empty() {
            return Err(ClosureError::Configuration(format!(
                "the {what} fieldname is empty"
            )));
        }
    }

    let (parent_index, parent_meta) = upstream.search(&settings.parent_id_field).ok_or_else(|| {
        ClosureError::Configuration(format!(
            "the fieldname of the parent id could not be found: `{}`",
            settings.parent_id_field
        ))
    })?;
    let (child_index, child_meta) = upstream.search(&settings.child_id_field).ok_or_else(|| {
        ClosureError::Configuration(format!(
            "the fieldname of the child id could not be found: `{}`",
            settings.child_id_field
        ))
    })?;

    if settings.parent_id_field == settings.child_id_field {
        return Err(ClosureError::Configuration(format!(
            "parent and child id fields must differ: `{}`",
            settings.parent_id_field
        )));
    }
    if settings.distance_field == settings.parent_id_field
        || settings.distance_field == settings.child_id_field
    {
        return Err(ClosureError::Configuration(format!(
            "distance field `{}` collides with an id field",
            settings.distance_field
        )));
    }

    let distance = ValueMeta::new(settings.distance_field.clone(), ValueType::Integer)
        .with_length(DEFAULT_INTEGER_LENGTH, 0)
        .with_origin(settings.transform_name.clone());
    let layout: RowLayout = [parent_meta.clone(), child_meta.clone(), distance]
        .into_iter()
        .collect();

    Ok(OutputSchema {
        parent_type: parent_meta.value_type,
        child_type: child_meta.value_type,
        layout,
        parent_index,
        child_index,
    })
}

/// Severity of a [`CheckRemark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemarkLevel {
    /// The checked condition holds.
    Ok,
    /// The checked condition fails; execution would be rejected.
    Error,
}

/// One design-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRemark {
    /// Severity.
    pub level: RemarkLevel,
    /// Human-readable message.
    pub message: String,
}

impl CheckRemark {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            level: RemarkLevel::Ok,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: RemarkLevel::Error,
            message: message.into(),
        }
    }

    /// Returns `true` for [`RemarkLevel::Error`].
    pub fn is_error(&self) -> bool {
        self.level == RemarkLevel::Error
    }
}

/// Reports whether the configured id fields exist in `upstream`.
///
/// Produces one remark per id field. A report containing any error means
/// [`negotiate_schema`] would also reject the settings.
pub fn check(settings: &ClosureSettings, upstream: &RowLayout) -> Vec<CheckRemark> {
    let mut remarks = Vec::with_capacity(2);
    if upstream.search(&settings.parent_id_field).is_some() {
        remarks.push(CheckRemark::ok("The fieldname of the parent id could be found"));
    } else {
        remarks.push(CheckRemark::error(
            "The fieldname of the parent id could not be found.",
        ));
    }
    if upstream.search(&settings.child_id_field).is_some() {
        remarks.push(CheckRemark::ok("The fieldname of the child id could be found"));
    } else {
        remarks.push(CheckRemark::error(
            "The fieldname of the child id could not be found.",
        ));
    }
    remarks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> RowLayout {
        [
            ValueMeta::new("name", ValueType::String),
            ValueMeta::new("id", ValueType::Integer).with_length(9, 0),
            ValueMeta::new("parent", ValueType::Integer).with_length(9, 0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn layout_is_parent_child_distance() {
        let settings = ClosureSettings::new("parent", "id", "depth");
        let schema = negotiate_schema(&settings, &upstream()).unwrap();
        assert_eq!(schema.layout().field_names(), vec!["parent", "id", "depth"]);
        assert_eq!(schema.parent_index(), 2);
        assert_eq!(schema.child_index(), 1);

        let distance = schema.layout().get(2).unwrap();
        assert_eq!(distance.value_type, ValueType::Integer);
        assert_eq!(distance.length, Some(DEFAULT_INTEGER_LENGTH));
        assert_eq!(distance.origin.as_deref(), Some("closure"));
        // id metadata is copied verbatim
        assert_eq!(schema.layout().get(0).unwrap().length, Some(9));
    }

    #[test]
    fn missing_field_is_configuration_error() {
        let settings = ClosureSettings::new("nope", "id", "depth");
        let err = negotiate_schema(&settings, &upstream()).unwrap_err();
        assert!(matches!(err, ClosureError::Configuration(msg) if msg.contains("parent id")));
    }

    #[test]
    fn colliding_names_are_rejected() {
        let same = ClosureSettings::new("id", "id", "depth");
        assert!(negotiate_schema(&same, &upstream()).is_err());
        let clash = ClosureSettings::new("parent", "id", "id");
        assert!(negotiate_schema(&clash, &upstream()).is_err());
        let empty = ClosureSettings::new("parent", "id", " ");
        assert!(negotiate_schema(&empty, &upstream()).is_err());
    }

    #[test]
    fn upstream_is_untouched() {
        let up = upstream();
        let before = up.clone();
        let _ = negotiate_schema(&ClosureSettings::new("parent", "id", "depth"), &up);
        assert_eq!(up, before);
    }

    #[test]
    fn check_reports_each_field() {
        let remarks = check(&ClosureSettings::new("parent", "missing", "d"), &upstream());
        assert_eq!(remarks.len(), 2);
        assert!(!remarks[0].is_error());
        assert!(remarks[1].is_error());
    }
}
