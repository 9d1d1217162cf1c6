// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolved transform settings, read once at execution start.

/// Default name of the parent id field.
pub const DEFAULT_PARENT_ID_FIELD: &str = "parent_id";
/// Default name of the child id field.
pub const DEFAULT_CHILD_ID_FIELD: &str = "child_id";
/// Default name of the generated distance field.
pub const DEFAULT_DISTANCE_FIELD: &str = "distance";
/// Default transform name, used as the origin of the distance field.
pub const DEFAULT_TRANSFORM_NAME: &str = "closure";

/// What to do with a row whose id fields cannot be read as an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MalformedRowPolicy {
    /// Drop the row, log a warning and count it.
    #[default]
    Skip,
    /// Fail the transform.
    Abort,
}

/// Settings for one closure transform.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClosureSettings {
    /// Upstream field holding the parent id.
    pub parent_id_field: String,
    /// Upstream field holding the child id.
    pub child_id_field: String,
    /// Name of the generated distance field.
    pub distance_field: String,
    /// Emit a `(root, root, 0)` row for every node without incoming edges.
    pub root_id_zero: bool,
    /// Handling of rows with null or mistyped id values.
    pub malformed_rows: MalformedRowPolicy,
    /// Upper bound on distinct edges held in memory.
    pub max_edges: Option<u64>,
    /// Upper bound on computed closure pairs.
    pub max_pairs: Option<u64>,
    /// Name of this transform instance, recorded as the distance field origin.
    pub transform_name: String,
}

impl Default for ClosureSettings {
    fn default() -> Self {
        Self {
            parent_id_field: DEFAULT_PARENT_ID_FIELD.to_owned(),
            child_id_field: DEFAULT_CHILD_ID_FIELD.to_owned(),
            distance_field: DEFAULT_DISTANCE_FIELD.to_owned(),
            root_id_zero: false,
            malformed_rows: MalformedRowPolicy::Skip,
            max_edges: None,
            max_pairs: None,
            transform_name: DEFAULT_TRANSFORM_NAME.to_owned(),
        }
    }
}

impl ClosureSettings {
    /// Settings with the given field names and defaults elsewhere.
    pub fn new(
        parent_id_field: impl Into<String>,
        child_id_field: impl Into<String>,
        distance_field: impl Into<String>,
    ) -> Self {
        Self {
            parent_id_field: parent_id_field.into(),
            child_id_field: child_id_field.into(),
            distance_field: distance_field.into(),
            ..Self::default()
        }
    }

    /// Sets the root self-row policy.
    pub fn with_root_id_zero(mut self, root_id_zero: bool) -> Self {
        self.root_id_zero = root_id_zero;
        self
    }

    /// Sets the malformed row policy.
    pub fn with_malformed_rows(mut self, policy: MalformedRowPolicy) -> Self {
        self.malformed_rows = policy;
        self
    }

    /// Sets the edge limit.
    pub fn with_max_edges(mut self, limit: u64) -> Self {
        self.max_edges = Some(limit);
        self
    }

    /// Sets the closure pair limit.
    pub fn with_max_pairs(mut self, limit: u64) -> Self {
        self.max_pairs = Some(limit);
        self
    }
}
