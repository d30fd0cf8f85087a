//! Scenario simulation for the conflict engine.
//!
//! Provides flight paths, canned scenarios and a fixed-step runner that
//! feeds aircraft snapshots to the conflict registry.

mod paths;
mod runner;
mod scenarios;

pub use paths::{CircularPath, FlightPath, LinearPath};
pub use runner::{run_scenario, RunOptions, RunSummary};
pub use scenarios::{
    create_collision_scenario, create_crossing_scenario, create_head_on_scenario,
    create_parallel_ils_scenario, create_random_scenario, create_runway_scenario,
    default_airport, Scenario, ScenarioAircraft,
};
