//! Behavioural tests for configuration loading using rstest-bdd.

use std::cell::RefCell;

use fieldplan_core::{
    ConfigError, DepotParams, PlanningConfig, PlanningError, RoutingParams, TessellationParams,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct ConfigWorld {
    document: RefCell<String>,
    outcome: RefCell<Option<Result<PlanningConfig, ConfigError>>>,
}

impl ConfigWorld {
    fn loaded(&self) -> PlanningConfig {
        match self.outcome.borrow().as_ref() {
            Some(Ok(config)) => config.clone(),
            Some(Err(err)) => panic!("expected configuration to load: {err}"),
            None => panic!("configuration should be loaded before assertions"),
        }
    }
}

#[fixture]
fn world() -> ConfigWorld {
    ConfigWorld::default()
}

#[given("a document setting only the depot radius")]
fn given_radius_document(world: &ConfigWorld) {
    world
        .document
        .replace(r#"{"depots": {"depot_radius_meters": 600.0}}"#.to_owned());
}

#[given("a document with more slack routes than vehicles")]
fn given_slack_document(world: &ConfigWorld) {
    world
        .document
        .replace(r#"{"routing": {"num_vehicles": 2, "slack_routes": 3}}"#.to_owned());
}

#[given("a truncated document")]
fn given_truncated_document(world: &ConfigWorld) {
    world.document.replace(r#"{"routing": {"#.to_owned());
}

#[when("the configuration is loaded")]
fn when_loaded(world: &ConfigWorld) {
    let outcome = PlanningConfig::from_json_reader(world.document.borrow().as_bytes());
    world.outcome.replace(Some(outcome));
}

#[then("the depot radius is 600 metres")]
fn then_radius(world: &ConfigWorld) {
    let radius = world.loaded().depots.depot_radius_meters;
    assert!((radius - 600.0).abs() < f64::EPSILON);
}

#[then("the other parameters keep their defaults")]
fn then_defaults(world: &ConfigWorld) {
    let config = world.loaded();
    assert_eq!(config.depots.grid_density, DepotParams::default().grid_density);
    assert_eq!(config.routing, RoutingParams::default());
    assert_eq!(config.tessellation, TessellationParams::default());
}

#[then("loading fails as invalid")]
fn then_invalid(world: &ConfigWorld) {
    assert!(matches!(
        world.outcome.borrow().as_ref(),
        Some(Err(ConfigError::Invalid(PlanningError::InvalidArgument { .. })))
    ));
}

#[then("loading fails to parse")]
fn then_parse_error(world: &ConfigWorld) {
    assert!(matches!(
        world.outcome.borrow().as_ref(),
        Some(Err(ConfigError::Parse(_)))
    ));
}

#[scenario(path = "tests/features/config.feature", index = 0)]
fn partial_document_takes_defaults(world: ConfigWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/config.feature", index = 1)]
fn excess_slack_routes_rejected(world: ConfigWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/config.feature", index = 2)]
fn malformed_json_rejected(world: ConfigWorld) {
    let _ = world;
}
