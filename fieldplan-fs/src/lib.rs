//! Filesystem asset store built on `cap-std` and `camino`.
//!
//! [`FsAssetStore`] persists planner output as GeoJSON files beneath a single
//! root directory. All access goes through a capability handle on that root,
//! so asset names can never escape it.
#![forbid(unsafe_code)]

use std::io;
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use fieldplan_core::store::validate_asset_name;
use fieldplan_core::{AssetStore, StoreError};
use geojson::FeatureCollection;
use log::debug;

/// File extension appended to every asset name.
pub const ASSET_EXTENSION: &str = "geojson";

/// Stores each asset as `<root>/<name>.geojson`.
///
/// Names may contain `/` to group assets into subdirectories, which are
/// created on first save. Writes go to a temporary sibling first and are
/// renamed into place, so readers never observe a half-written file.
#[derive(Debug)]
pub struct FsAssetStore {
    root: fs_utf8::Dir,
    root_path: Utf8PathBuf,
}

impl FsAssetStore {
    /// Open the store rooted at `path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be created or opened.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        let (base, relative) = base_dir_and_relative(path)?;
        let root = if relative.as_os_str().is_empty() {
            base
        } else {
            base.create_dir_all(&relative)?;
            base.open_dir(&relative)?
        };
        Ok(Self {
            root,
            root_path: path.to_path_buf(),
        })
    }

    /// Directory the store was opened on.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root_path
    }

    fn ensure_parent(&self, file: &Utf8Path) -> io::Result<()> {
        match file.parent() {
            Some(parent) if !parent.as_str().is_empty() => self.root.create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

/// Relative file path for an asset name.
fn asset_file(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{name}.{ASSET_EXTENSION}"))
}

fn io_error(name: &str) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        name: name.to_owned(),
        source,
    }
}

impl AssetStore for FsAssetStore {
    fn save(&self, name: &str, collection: &FeatureCollection) -> Result<(), StoreError> {
        validate_asset_name(name)?;
        let file = asset_file(name);
        let staging = Utf8PathBuf::from(format!("{file}.tmp"));
        let bytes = serde_json::to_vec_pretty(collection).map_err(|source| StoreError::Encode {
            name: name.to_owned(),
            source,
        })?;

        self.ensure_parent(&file).map_err(io_error(name))?;
        self.root.write(&staging, &bytes).map_err(io_error(name))?;
        self.root
            .rename(&staging, &self.root, &file)
            .map_err(io_error(name))?;
        debug!(
            "saved {} features to {}/{file}",
            collection.features.len(),
            self.root_path
        );
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<FeatureCollection>, StoreError> {
        validate_asset_name(name)?;
        let file = asset_file(name);
        let bytes = match self.root.read(&file) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(name)(err)),
        };
        let collection =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
                name: name.to_owned(),
                source,
            })?;
        Ok(Some(collection))
    }
}

/// Split an absolute or relative path into an ambient base directory and a
/// relative suffix that `cap-std` can resolve beneath it.
fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();

    let (base, std_relative) = match std_path.components().next() {
        // Windows absolute path with a drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;

            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_path.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from store path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from store path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_path.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(std_relative)
        .map_err(|_| io::Error::other("non-UTF-8 store path"))?;

    Ok((dir, relative))
}
