// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings service and storage port for closure transforms.

use echo_closure::{ClosureError, ClosureSettings};
use thiserror::Error;
use tracing::debug;

/// Storage port for raw settings blobs (keyed by profile name).
pub trait ConfigStore {
    /// Load a raw blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for settings storage.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Stored settings are structurally unusable.
    #[error("invalid settings: {0}")]
    Invalid(ClosureError),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes [`ClosureSettings`] as JSON and delegates storage to a [`ConfigStore`].
pub struct SettingsService<S> {
    store: S,
}

impl<S> SettingsService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> SettingsService<S>
where
    S: ConfigStore,
{
    /// Load settings stored under `key`. Returns `Ok(None)` if missing or empty.
    ///
    /// Fields absent from the stored document take their defaults.
    pub fn load(&self, key: &str) -> Result<Option<ClosureSettings>, ConfigError> {
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let settings = serde_json::from_slice(&bytes)?;
                debug!(key, "loaded closure settings");
                Ok(Some(settings))
            }
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Like [`load`](Self::load), but rejects settings with empty field names.
    ///
    /// Whether the id fields exist upstream can only be decided once the
    /// upstream layout is known; that check belongs to schema negotiation.
    pub fn load_validated(&self, key: &str) -> Result<Option<ClosureSettings>, ConfigError> {
        let Some(settings) = self.load(key)? else {
            return Ok(None);
        };
        validate(&settings)?;
        Ok(Some(settings))
    }

    /// Serialize and persist `settings` under `key`.
    pub fn save(&self, key: &str, settings: &ClosureSettings) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(settings)?;
        self.store.save_raw(key, &data)?;
        debug!(key, "saved closure settings");
        Ok(())
    }
}

/// Rejects settings whose field names are blank.
pub fn validate(settings: &ClosureSettings) -> Result<(), ConfigError> {
    for (what, name) in [
        ("parent id", &settings.parent_id_field),
        ("child id", &settings.child_id_field),
        ("distance", &settings.distance_field),
    ] {
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid(ClosureError::Configuration(format!(
                "the {what} fieldname is empty"
            ))));
        }
    }
    Ok(())
}
