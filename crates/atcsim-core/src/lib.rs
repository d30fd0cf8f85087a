//! Conflict and separation detection for a tick-based air traffic simulator.
//!
//! Each tick the [`ConflictRegistry`] scans every aircraft pair, creating a
//! [`ConflictTracker`] for pairs inside the broad-phase bounding box and
//! updating the trackers it already owns.

pub mod airfield;
pub mod conflict;
pub mod events;
pub mod models;
pub mod registry;
pub mod rules;
pub mod spatial;

pub use airfield::{AirportLayout, Airfield, LayoutError};
pub use conflict::{
    ConflictRule, ConflictTracker, ProximityVerdict, TickContext, UpdateOutcome, ViolationRule,
};
pub use events::{
    ConflictEvent, ConflictEventKind, ConflictEvents, DepartureQueueBoard, DepartureQueues,
    NoopQueues, Scoreboard, ScoringRules,
};
pub use models::{
    AircraftId, AircraftSnapshot, FlightCategory, PairKey, RunwayId, RunwayPairRelationship,
};
pub use registry::{ConflictRegistry, ConflictReport};
pub use rules::{ParallelApproachBand, ParallelApproachTable, RulesError, SeparationRules};
pub use spatial::euclidean_distance;
