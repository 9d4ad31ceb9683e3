//! Save/load contract for feature-collection assets.
//!
//! The planner never reaches into storage itself; callers persist the
//! collections it returns through an [`AssetStore`]. Failures come back as
//! [`StoreError`] values so the storage owner decides on retry and alerting.

use geojson::FeatureCollection;
use thiserror::Error;

/// Errors from [`AssetStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Asset names are limited to ASCII letters, digits, `-`, `_` and `/`
    /// separated segments that do not start with a dot.
    #[error("invalid asset name `{name}`")]
    InvalidName {
        /// Rejected name.
        name: String,
    },
    /// Reading or writing the backing medium failed.
    #[error("I/O failure for asset `{name}`: {source}")]
    Io {
        /// Asset being accessed.
        name: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Stored bytes were not a valid feature collection.
    #[error("asset `{name}` is not a valid feature collection: {source}")]
    Decode {
        /// Asset being read.
        name: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The collection could not be serialised.
    #[error("failed to encode asset `{name}`: {source}")]
    Encode {
        /// Asset being written.
        name: String,
        /// Serialiser error.
        #[source]
        source: serde_json::Error,
    },
    /// Another user of the store panicked while holding its lock.
    #[error("asset store lock poisoned")]
    Poisoned,
}

/// Persists feature collections by name.
pub trait AssetStore: Send + Sync {
    /// Store `collection` under `name`, replacing any previous version.
    fn save(&self, name: &str, collection: &FeatureCollection) -> Result<(), StoreError>;

    /// Fetch the collection stored under `name`, if any.
    fn load(&self, name: &str) -> Result<Option<FeatureCollection>, StoreError>;
}

/// Check an asset name against the portable naming rules.
///
/// # Examples
///
/// ```
/// use fieldplan_core::store::validate_asset_name;
///
/// assert!(validate_asset_name("job-7/micro_routes").is_ok());
/// assert!(validate_asset_name("../etc/passwd").is_err());
/// ```
pub fn validate_asset_name(name: &str) -> Result<(), StoreError> {
    let valid_segment = |segment: &str| {
        !segment.is_empty()
            && !segment.starts_with('.')
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if name.split('/').all(valid_segment) {
        Ok(())
    } else {
        Err(StoreError::InvalidName {
            name: name.to_owned(),
        })
    }
}
