//! Fixed-step scenario runner.

use serde::Serialize;

use atcsim_core::{
    AircraftId, AircraftSnapshot, ConflictEventKind, ConflictRegistry, ConflictReport,
    DepartureQueueBoard, RunwayId, Scoreboard, ScoringRules, SeparationRules, TickContext,
};

use super::scenarios::{Scenario, ScenarioAircraft};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub ticks: u32,
    pub tick_secs: f64,
}

/// Outcome of a complete scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub ticks: u32,
    pub score: i64,
    pub collisions: usize,
    pub runway_collisions: usize,
    pub separation_losses: usize,
    pub peak_trackers: usize,
    pub hit: Vec<String>,
}

fn snapshot_at(aircraft: &ScenarioAircraft, t: f64) -> AircraftSnapshot {
    let (x, y, altitude_ft) = aircraft.path.get_position(t);
    let track = aircraft.path.get_track(t).to_radians();

    AircraftSnapshot {
        id: AircraftId::new(aircraft.callsign.clone()),
        position: [x, y],
        altitude_ft,
        heading_rad: track,
        ground_track_rad: track,
        speed_kt: aircraft.path.get_speed_kt(),
        category: aircraft.category,
        assigned_runway: aircraft.runway.as_deref().map(RunwayId::new),
        precision_guided: aircraft.precision_guided,
        visible: true,
        taxiing: false,
        takeoff_time: aircraft.takeoff_time,
    }
}

/// Run `scenario` for the configured number of ticks.
///
/// `on_tick` receives the simulated time and the active conflicts after
/// every scan.
pub fn run_scenario(
    scenario: &Scenario,
    rules: SeparationRules,
    scoring: ScoringRules,
    options: RunOptions,
    mut on_tick: impl FnMut(f64, &[ConflictReport]),
) -> RunSummary {
    let mut registry = ConflictRegistry::new(rules);
    let mut board = Scoreboard::new(scoring);
    let mut queues = DepartureQueueBoard::new();
    for aircraft in &scenario.aircraft {
        if let Some(runway) = &aircraft.runway {
            if aircraft.takeoff_time.is_none() && aircraft.category.is_departure() {
                queues.enqueue(
                    RunwayId::new(runway.clone()),
                    AircraftId::new(aircraft.callsign.clone()),
                );
            }
        }
    }

    tracing::info!(
        "Running scenario '{}' with {} aircraft for {} ticks",
        scenario.name,
        scenario.aircraft.len(),
        options.ticks
    );

    let mut peak_trackers = 0;
    for tick in 0..options.ticks {
        let now = f64::from(tick) * options.tick_secs;
        let snapshots: Vec<AircraftSnapshot> = scenario
            .aircraft
            .iter()
            .map(|aircraft| snapshot_at(aircraft, now))
            .collect();

        let mut ctx = TickContext {
            now,
            airfield: &scenario.layout,
            events: &mut board,
            queues: &mut queues,
        };
        registry.tick(&snapshots, &mut ctx);
        peak_trackers = peak_trackers.max(registry.len());

        let report = registry.report();
        if !report.is_empty() {
            tracing::debug!("t={:.0}s: {} active conflict(s)", now, report.len());
        }
        on_tick(now, &report);
    }

    let mut hit: Vec<String> = scenario
        .aircraft
        .iter()
        .filter(|aircraft| registry.is_hit(&AircraftId::new(aircraft.callsign.clone())))
        .map(|aircraft| aircraft.callsign.clone())
        .collect();
    hit.sort();

    RunSummary {
        scenario: scenario.name.clone(),
        ticks: options.ticks,
        score: board.score(),
        collisions: board.count(ConflictEventKind::Collision),
        runway_collisions: board.count(ConflictEventKind::RunwayCollision),
        separation_losses: board.count(ConflictEventKind::SeparationLoss),
        peak_trackers,
        hit,
    }
}
