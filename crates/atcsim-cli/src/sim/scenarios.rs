//! Pre-defined traffic scenarios for exercising the conflict engine.

use std::sync::Arc;

use atcsim_core::spatial::FT_PER_KM;
use atcsim_core::{AirportLayout, FlightCategory, LayoutError, RunwayPairRelationship};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::paths::{CircularPath, LinearPath};
use super::FlightPath;

/// One aircraft in a scenario.
pub struct ScenarioAircraft {
    pub callsign: String,
    pub path: Arc<dyn FlightPath>,
    pub category: FlightCategory,
    pub runway: Option<String>,
    pub precision_guided: bool,
    pub takeoff_time: Option<f64>,
}

impl ScenarioAircraft {
    pub fn new(callsign: impl Into<String>, path: Arc<dyn FlightPath>) -> Self {
        Self {
            callsign: callsign.into(),
            path,
            category: FlightCategory::Arrival,
            runway: None,
            precision_guided: false,
            takeoff_time: None,
        }
    }

    pub fn departing(mut self, runway: &str) -> Self {
        self.category = FlightCategory::Departure;
        self.runway = Some(runway.to_string());
        self
    }

    pub fn on_approach(mut self, runway: &str) -> Self {
        self.category = FlightCategory::Arrival;
        self.runway = Some(runway.to_string());
        self.precision_guided = true;
        self
    }
}

/// A named scenario: an airport and the traffic flying around it.
pub struct Scenario {
    pub name: String,
    pub layout: AirportLayout,
    pub aircraft: Vec<ScenarioAircraft>,
}

/// Field with two parallel runways 3200 ft apart.
pub fn default_airport() -> Result<AirportLayout, LayoutError> {
    let mut layout = AirportLayout::new(13.0);
    layout.add_strip("28L", "10R")?.add_strip("28R", "10L")?;
    layout.set_relationship(
        "28L",
        "28R",
        RunwayPairRelationship {
            parallel: true,
            lateral_distance_km: 3200.0 / FT_PER_KM,
        },
    )?;
    layout.set_relationship(
        "10L",
        "10R",
        RunwayPairRelationship {
            parallel: true,
            lateral_distance_km: 3200.0 / FT_PER_KM,
        },
    )?;
    Ok(layout)
}

/// Two aircraft on reciprocal tracks at the same level, passing with a
/// small lateral offset.
pub fn create_head_on_scenario() -> Result<Scenario, LayoutError> {
    let east = LinearPath::along_track((-20.0, 0.0), 90.0, 40.0, 9_000.0, 250.0);
    let west = LinearPath::along_track((20.0, 0.8), 270.0, 40.0, 9_000.0, 250.0);

    Ok(Scenario {
        name: "head_on".to_string(),
        layout: default_airport()?,
        aircraft: vec![
            ScenarioAircraft::new("AAL101", Arc::new(east)),
            ScenarioAircraft::new("UAL202", Arc::new(west)),
        ],
    })
}

/// Two aircraft crossing at right angles, 200 ft apart vertically.
pub fn create_crossing_scenario() -> Result<Scenario, LayoutError> {
    let east = LinearPath::along_track((-15.0, 0.0), 90.0, 30.0, 8_000.0, 240.0);
    let north = LinearPath::along_track((0.0, -14.0), 0.0, 30.0, 8_200.0, 240.0);

    Ok(Scenario {
        name: "crossing".to_string(),
        layout: default_airport()?,
        aircraft: vec![
            ScenarioAircraft::new("DAL303", Arc::new(east)),
            ScenarioAircraft::new("SWA404", Arc::new(north)),
        ],
    })
}

/// Staggered ILS approaches to 28L and 28R.
pub fn create_parallel_ils_scenario() -> Result<Scenario, LayoutError> {
    let spacing_km = 3200.0 / FT_PER_KM;
    let left = LinearPath::along_track((18.0, 0.0), 270.0, 18.0, 5_000.0, 160.0)
        .with_vertical_rate(-700.0);
    let right = LinearPath::along_track((20.0, spacing_km), 270.0, 20.0, 5_000.0, 160.0)
        .with_vertical_rate(-700.0);

    Ok(Scenario {
        name: "parallel_ils".to_string(),
        layout: default_airport()?,
        aircraft: vec![
            ScenarioAircraft::new("JBU505", Arc::new(left)).on_approach("28L"),
            ScenarioAircraft::new("ASA606", Arc::new(right)).on_approach("28R"),
        ],
    })
}

/// Two departures rolling toward each other from opposite ends of one runway.
pub fn create_runway_scenario() -> Result<Scenario, LayoutError> {
    let west_end = LinearPath::along_track((0.0, 0.0), 90.0, 3.0, 13.0, 140.0);
    let east_end = LinearPath::along_track((3.5, 0.0), 270.0, 3.0, 13.0, 140.0);

    Ok(Scenario {
        name: "runway".to_string(),
        layout: default_airport()?,
        aircraft: vec![
            ScenarioAircraft::new("SKW707", Arc::new(west_end)).departing("10R"),
            ScenarioAircraft::new("SKW808", Arc::new(east_end)).departing("28L"),
        ],
    })
}

/// Two aircraft flown into each other.
pub fn create_collision_scenario() -> Result<Scenario, LayoutError> {
    let east = LinearPath::along_track((-5.0, 3.0), 90.0, 10.0, 4_000.0, 250.0);
    let west = LinearPath::along_track((5.0, 3.0), 270.0, 10.0, 4_050.0, 250.0);

    Ok(Scenario {
        name: "collision".to_string(),
        layout: default_airport()?,
        aircraft: vec![
            ScenarioAircraft::new("FFT909", Arc::new(east)),
            ScenarioAircraft::new("NKS010", Arc::new(west)),
        ],
    })
}

/// Random traffic around the field, reproducible from `seed`.
pub fn create_random_scenario(count: usize, seed: u64) -> Result<Scenario, LayoutError> {
    const FLIGHT_LEVELS: [f64; 5] = [4_000.0, 5_000.0, 6_000.0, 7_000.0, 8_000.0];
    let mut rng = StdRng::seed_from_u64(seed);

    let aircraft = (0..count)
        .map(|i| {
            let callsign = format!("N{:03}", i + 1);
            let altitude = FLIGHT_LEVELS[rng.random_range(0..FLIGHT_LEVELS.len())]
                + rng.random_range(-300.0..300.0);
            let start = (rng.random_range(-25.0..25.0), rng.random_range(-25.0..25.0));
            let speed = rng.random_range(180.0..300.0);

            let path: Arc<dyn FlightPath> = if rng.random_bool(0.2) {
                Arc::new(CircularPath::new(
                    start,
                    rng.random_range(2.0..5.0),
                    altitude,
                    speed,
                    rng.random_range(0.0..std::f64::consts::TAU),
                    rng.random_bool(0.5),
                ))
            } else {
                Arc::new(LinearPath::along_track(
                    start,
                    rng.random_range(0.0..360.0),
                    60.0,
                    altitude,
                    speed,
                ))
            };
            ScenarioAircraft::new(callsign, path)
        })
        .collect();

    Ok(Scenario {
        name: format!("random_{seed}"),
        layout: default_airport()?,
        aircraft,
    })
}
