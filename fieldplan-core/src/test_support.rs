//! Fixtures shared by unit, behaviour and property tests.

use geo::{Coord, MultiPolygon, Polygon, Rect};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{Cell, Crs, LocalProjection, Region, Target};

/// A metric CRS for data that is already in metres.
#[must_use]
pub const fn metric_crs() -> Crs {
    Crs::Local(LocalProjection::at_null_island())
}

/// Axis-aligned square with its lower-left corner at `origin`.
#[must_use]
pub fn square(origin: Coord<f64>, side: f64) -> Polygon<f64> {
    Rect::new(
        origin,
        Coord {
            x: origin.x + side,
            y: origin.y + side,
        },
    )
    .to_polygon()
}

/// Metric square region `[0, side] × [0, side]`.
///
/// # Panics
///
/// Panics if `side` is not positive.
#[must_use]
pub fn square_region(side: f64) -> Region {
    Region::from_polygon(metric_crs(), square(Coord::zero(), side))
        .unwrap_or_else(|err| panic!("square region of side {side}: {err}"))
}

/// Grid of square cells, numbered row by row from the origin.
///
/// # Panics
///
/// Panics if `size` is not positive.
#[must_use]
pub fn grid_cells(columns: usize, rows: usize, size: f64) -> Vec<Cell> {
    (0..rows)
        .flat_map(|row| (0..columns).map(move |column| (row, column)))
        .enumerate()
        .map(|(id, (row, column))| {
            #[expect(clippy::cast_precision_loss, reason = "grid indices are small")]
            let origin = Coord {
                x: column as f64 * size,
                y: row as f64 * size,
            };
            Cell::new(id, MultiPolygon::new(vec![square(origin, size)]))
                .unwrap_or_else(|err| panic!("grid cell {id}: {err}"))
        })
        .collect()
}

/// `count` targets drawn uniformly from `extent` with a fixed seed.
#[must_use]
pub fn scattered_targets(count: usize, extent: Rect<f64>, seed: u64) -> Vec<Target> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (min, max) = (extent.min(), extent.max());
    (0..count)
        .map(|index| {
            let location = Coord {
                x: rng.gen_range(min.x..max.x),
                y: rng.gen_range(min.y..max.y),
            };
            Target::new(format!("target-{index:04}"), location)
        })
        .collect()
}

#[cfg(feature = "serde")]
pub use memory_store::MemoryAssetStore;

#[cfg(feature = "serde")]
mod memory_store {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use geojson::FeatureCollection;

    use crate::store::{AssetStore, StoreError, validate_asset_name};

    /// In-memory [`AssetStore`] holding serialised collections.
    ///
    /// Collections are stored as JSON text so decoding paths are exercised
    /// just as they are with a real backend.
    #[derive(Debug, Default)]
    pub struct MemoryAssetStore {
        assets: Mutex<HashMap<String, String>>,
    }

    impl MemoryAssetStore {
        /// Number of stored assets.
        #[must_use]
        pub fn len(&self) -> usize {
            self.assets
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .len()
        }

        /// Whether the store is empty.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl AssetStore for MemoryAssetStore {
        fn save(&self, name: &str, collection: &FeatureCollection) -> Result<(), StoreError> {
            validate_asset_name(name)?;
            let text = serde_json::to_string(collection).map_err(|source| StoreError::Encode {
                name: name.to_owned(),
                source,
            })?;
            self.assets
                .lock()
                .map_err(|_| StoreError::Poisoned)?
                .insert(name.to_owned(), text);
            Ok(())
        }

        fn load(&self, name: &str) -> Result<Option<FeatureCollection>, StoreError> {
            validate_asset_name(name)?;
            let guard = self.assets.lock().map_err(|_| StoreError::Poisoned)?;
            guard
                .get(name)
                .map(|text| {
                    serde_json::from_str(text).map_err(|source| StoreError::Decode {
                        name: name.to_owned(),
                        source,
                    })
                })
                .transpose()
        }
    }
}
