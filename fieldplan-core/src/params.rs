//! Stage parameters and the aggregate planning configuration.
//!
//! Defaults mirror the values field teams have used in production: half-acre
//! cells, 225 m depot radius and a 25-vehicle fleet capped at 850 m.

use std::time::Duration;

use crate::error::PlanningError;

/// Square metres in one international acre.
pub const SQUARE_METERS_PER_ACRE: f64 = 4046.86;

/// Relative guard applied before flooring the cell count.
const CELL_COUNT_GUARD: f64 = 1e-9;

/// Tessellation parameters.
///
/// # Examples
///
/// ```
/// use fieldplan_core::TessellationParams;
///
/// let params = TessellationParams::default().with_target_cell_area_square_meters(10_000.0);
/// assert_eq!(params.target_cell_count(1_000_000.0).ok(), Some(100));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TessellationParams {
    /// Desired area of one cell in acres.
    pub target_cell_area_acres: f64,
    /// Upper bound on Lloyd relaxation passes.
    pub max_iterations: usize,
    /// Largest seed movement, in metres, treated as converged.
    pub tolerance: f64,
    /// RNG seed for initial sampling; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            target_cell_area_acres: 0.5,
            max_iterations: 15,
            tolerance: 1e-3,
            seed: None,
        }
    }
}

impl TessellationParams {
    /// Set the target cell area in square metres.
    #[must_use]
    pub fn with_target_cell_area_square_meters(mut self, area: f64) -> Self {
        self.target_cell_area_acres = area / SQUARE_METERS_PER_ACRE;
        self
    }

    /// Fix the sampling seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Target cell area in square metres.
    #[must_use]
    pub fn target_cell_area_square_meters(&self) -> f64 {
        self.target_cell_area_acres * SQUARE_METERS_PER_ACRE
    }

    /// Reject unusable parameters.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if !(self.target_cell_area_acres.is_finite() && self.target_cell_area_acres > 0.0) {
            return Err(PlanningError::invalid_argument(
                "target cell area must be positive",
            ));
        }
        if self.max_iterations == 0 {
            return Err(PlanningError::invalid_argument(
                "max_iterations must be at least one",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(PlanningError::invalid_argument("tolerance must be positive"));
        }
        Ok(())
    }

    /// Number of cells for a region of `region_area` square metres.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "the quotient is finite, non-negative and floored"
    )]
    pub fn target_cell_count(&self, region_area: f64) -> Result<usize, PlanningError> {
        self.validate()?;
        let ratio = region_area / self.target_cell_area_square_meters();
        let count = (ratio * (1.0 + CELL_COUNT_GUARD)).floor();
        if !count.is_finite() || count < 1.0 {
            return Err(PlanningError::invalid_argument(format!(
                "region area {region_area:.1} m² is smaller than one target cell"
            )));
        }
        Ok(count as usize)
    }
}

/// Depot placement parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DepotParams {
    /// Service radius in metres.
    pub depot_radius_meters: f64,
    /// Grid candidates per radius; spacing is `radius / grid_density`.
    pub grid_density: u32,
}

impl Default for DepotParams {
    fn default() -> Self {
        Self {
            depot_radius_meters: 225.0,
            grid_density: 4,
        }
    }
}

impl DepotParams {
    /// Reject unusable parameters.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if !(self.depot_radius_meters.is_finite() && self.depot_radius_meters > 0.0) {
            return Err(PlanningError::invalid_argument(format!(
                "depot radius must be positive, got {}",
                self.depot_radius_meters
            )));
        }
        if self.grid_density == 0 {
            return Err(PlanningError::invalid_argument(
                "grid density must be at least one",
            ));
        }
        Ok(())
    }

    /// Spacing between grid candidates in metres.
    #[must_use]
    pub fn grid_spacing(&self) -> f64 {
        self.depot_radius_meters / f64::from(self.grid_density)
    }
}

/// Macro routing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoutingParams {
    /// Vehicles available per depot.
    pub num_vehicles: usize,
    /// Hard cap on each route's transit distance in metres.
    pub max_distance_meters: u64,
    /// Slack, in metres, each node may add toward the soft lower bound.
    pub distance_slack: u64,
    /// Cost per metre of shortfall below `max_distance_meters`.
    pub distance_slack_penalty: u64,
    /// Trailing vehicles exempt from the soft lower bound.
    pub slack_routes: usize,
    /// Search budget per depot, in seconds.
    pub time_limit_seconds: u64,
}

impl Default for RoutingParams {
    fn default() -> Self {
        Self {
            num_vehicles: 25,
            max_distance_meters: 850,
            distance_slack: 50,
            distance_slack_penalty: 10_000,
            slack_routes: 5,
            time_limit_seconds: 15,
        }
    }
}

impl RoutingParams {
    /// Reject unusable parameters.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.num_vehicles == 0 {
            return Err(PlanningError::invalid_argument(
                "at least one vehicle is required",
            ));
        }
        if self.slack_routes > self.num_vehicles {
            return Err(PlanningError::invalid_argument(format!(
                "slack_routes ({}) exceeds num_vehicles ({})",
                self.slack_routes, self.num_vehicles
            )));
        }
        if self.max_distance_meters == 0 {
            return Err(PlanningError::invalid_argument(
                "max_distance_meters must be positive",
            ));
        }
        Ok(())
    }

    /// Search budget as a [`Duration`].
    #[must_use]
    pub const fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_seconds)
    }

    /// Vehicles subject to the soft lower bound.
    #[must_use]
    pub const fn penalised_vehicles(&self) -> usize {
        self.num_vehicles.saturating_sub(self.slack_routes)
    }
}

/// All parameters for one planning run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlanningConfig {
    /// Tessellation stage.
    pub tessellation: TessellationParams,
    /// Depot placement stage.
    pub depots: DepotParams,
    /// Macro routing stage.
    pub routing: RoutingParams,
}

impl PlanningConfig {
    /// Validate every stage's parameters.
    pub fn validate(&self) -> Result<(), PlanningError> {
        self.tessellation.validate()?;
        self.depots.validate()?;
        self.routing.validate()
    }
}

/// Errors raised while loading a configuration document.
#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document could not be parsed.
    #[error("failed to parse planning configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document parsed but holds unusable values.
    #[error(transparent)]
    Invalid(#[from] PlanningError),
}

#[cfg(feature = "serde")]
impl PlanningConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldplan_core::PlanningConfig;
    ///
    /// # fn main() -> Result<(), fieldplan_core::ConfigError> {
    /// let config = PlanningConfig::from_json_str(r#"{"depots": {"depot_radius_meters": 600.0}}"#)?;
    /// assert_eq!(config.depots.grid_density, 4);
    /// assert_eq!(config.routing.num_vehicles, 25);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration from a reader.
    pub fn from_json_reader(reader: impl std::io::Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
