//! Outbound collaborators: scoring/logging and runway departure queues.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::models::{AircraftId, RunwayId};

/// Scoring and logging sink for conflict events.
///
/// Each method is called once per event edge, never once per tick.
pub trait ConflictEvents {
    /// Two aircraft collided.
    fn collision(&mut self, a: &AircraftId, b: &AircraftId);

    /// Two departures are converging on opposite ends of one runway.
    fn runway_collision(&mut self, a: &AircraftId, b: &AircraftId);

    /// Lateral separation was lost.
    fn separation_loss(&mut self, _a: &AircraftId, _b: &AircraftId) {}
}

/// Runway departure queues.
pub trait DepartureQueues {
    /// Remove the aircraft from every queue it waits in. No-op if absent.
    fn remove_aircraft(&mut self, id: &AircraftId);
}

/// Collaborator that ignores queue removal requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopQueues;

impl DepartureQueues for NoopQueues {
    fn remove_aircraft(&mut self, _id: &AircraftId) {}
}

/// Departure queues keyed by runway end.
#[derive(Debug, Default, Clone)]
pub struct DepartureQueueBoard {
    queues: HashMap<RunwayId, VecDeque<AircraftId>>,
}

impl DepartureQueueBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, runway: RunwayId, id: AircraftId) {
        self.queues.entry(runway).or_default().push_back(id);
    }

    pub fn queue(&self, runway: &RunwayId) -> Option<&VecDeque<AircraftId>> {
        self.queues.get(runway)
    }

    pub fn is_queued(&self, id: &AircraftId) -> bool {
        self.queues.values().any(|queue| queue.contains(id))
    }
}

impl DepartureQueues for DepartureQueueBoard {
    fn remove_aircraft(&mut self, id: &AircraftId) {
        for queue in self.queues.values_mut() {
            queue.retain(|queued| queued != id);
        }
    }
}

/// Score penalties per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub collision: i64,
    pub runway_collision: i64,
    pub separation_loss: i64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            collision: -1000,
            runway_collision: -500,
            separation_loss: -200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictEventKind {
    Collision,
    RunwayCollision,
    SeparationLoss,
}

/// One recorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictEvent {
    pub kind: ConflictEventKind,
    pub aircraft: (AircraftId, AircraftId),
}

/// In-memory event log with a running score.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Scoreboard {
    #[serde(skip)]
    rules: ScoringRules,
    score: i64,
    events: Vec<ConflictEvent>,
}

impl Scoreboard {
    pub fn new(rules: ScoringRules) -> Self {
        Self {
            rules,
            score: 0,
            events: Vec::new(),
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn events(&self) -> &[ConflictEvent] {
        &self.events
    }

    pub fn count(&self, kind: ConflictEventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }

    fn record(&mut self, kind: ConflictEventKind, a: &AircraftId, b: &AircraftId) {
        self.score += match kind {
            ConflictEventKind::Collision => self.rules.collision,
            ConflictEventKind::RunwayCollision => self.rules.runway_collision,
            ConflictEventKind::SeparationLoss => self.rules.separation_loss,
        };
        self.events.push(ConflictEvent {
            kind,
            aircraft: (a.clone(), b.clone()),
        });
    }
}

impl ConflictEvents for Scoreboard {
    fn collision(&mut self, a: &AircraftId, b: &AircraftId) {
        self.record(ConflictEventKind::Collision, a, b);
    }

    fn runway_collision(&mut self, a: &AircraftId, b: &AircraftId) {
        self.record(ConflictEventKind::RunwayCollision, a, b);
    }

    fn separation_loss(&mut self, a: &AircraftId, b: &AircraftId) {
        self.record(ConflictEventKind::SeparationLoss, a, b);
    }
}
