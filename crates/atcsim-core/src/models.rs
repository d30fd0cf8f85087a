//! Core data models for the conflict engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aircraft identifier (callsign).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AircraftId(pub String);

impl AircraftId {
    pub fn new(callsign: impl Into<String>) -> Self {
        Self(callsign.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AircraftId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Runway end identifier, e.g. `28R`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunwayId(pub String);

impl RunwayId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunwayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunwayId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightCategory {
    #[default]
    Arrival,
    Departure,
}

impl FlightCategory {
    pub fn is_departure(self) -> bool {
        matches!(self, FlightCategory::Departure)
    }
}

/// Per-tick view of an aircraft, produced by the physics step.
///
/// Positions are kilometres on the airspace plane (x east, y north).
/// Headings and ground tracks are radians, 0 = north, clockwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftSnapshot {
    pub id: AircraftId,
    pub position: [f64; 2],
    pub altitude_ft: f64,
    #[serde(default)]
    pub heading_rad: f64,
    #[serde(default)]
    pub ground_track_rad: f64,
    #[serde(default)]
    pub speed_kt: f64,
    #[serde(default)]
    pub category: FlightCategory,
    #[serde(default)]
    pub assigned_runway: Option<RunwayId>,
    /// Established on an instrument approach
    #[serde(default)]
    pub precision_guided: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub taxiing: bool,
    /// Simulated seconds at which the aircraft left the runway
    #[serde(default)]
    pub takeoff_time: Option<f64>,
}

fn default_visible() -> bool {
    true
}

impl AircraftSnapshot {
    /// Create an airborne, visible snapshot with only the required fields.
    pub fn new(id: impl Into<String>, x_km: f64, y_km: f64, altitude_ft: f64) -> Self {
        Self {
            id: AircraftId::new(id),
            position: [x_km, y_km],
            altitude_ft,
            heading_rad: 0.0,
            ground_track_rad: 0.0,
            speed_kt: 0.0,
            category: FlightCategory::Arrival,
            assigned_runway: None,
            precision_guided: false,
            visible: true,
            taxiing: false,
            takeoff_time: None,
        }
    }

    /// Set ground track (degrees) and speed. Heading follows the track.
    pub fn with_track(mut self, track_deg: f64, speed_kt: f64) -> Self {
        self.ground_track_rad = track_deg.to_radians();
        self.heading_rad = self.ground_track_rad;
        self.speed_kt = speed_kt;
        self
    }

    pub fn with_runway(mut self, runway: impl Into<String>) -> Self {
        self.assigned_runway = Some(RunwayId::new(runway));
        self
    }

    pub fn with_category(mut self, category: FlightCategory) -> Self {
        self.category = category;
        self
    }

    pub fn precision_guided(mut self, guided: bool) -> Self {
        self.precision_guided = guided;
        self
    }

    pub fn with_takeoff_time(mut self, takeoff_time: f64) -> Self {
        self.takeoff_time = Some(takeoff_time);
        self
    }

    pub fn is_precision_guided(&self) -> bool {
        self.precision_guided
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_taxiing(&self) -> bool {
        self.taxiing
    }
}

/// Precomputed relationship between two runway ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunwayPairRelationship {
    pub parallel: bool,
    /// Perpendicular spacing between centerlines; meaningful only when parallel
    pub lateral_distance_km: f64,
}

/// Unordered aircraft pair. `PairKey::new(a, b) == PairKey::new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PairKey(AircraftId, AircraftId);

impl PairKey {
    pub fn new(a: &AircraftId, b: &AircraftId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }

    pub fn first(&self) -> &AircraftId {
        &self.0
    }

    pub fn second(&self) -> &AircraftId {
        &self.1
    }

    pub fn contains(&self, id: &AircraftId) -> bool {
        &self.0 == id || &self.1 == id
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_unordered() {
        let a = AircraftId::from("AAL12");
        let b = AircraftId::from("UAL7");
        assert_eq!(PairKey::new(&a, &b), PairKey::new(&b, &a));
        assert_eq!(PairKey::new(&b, &a).first(), &a);
        assert!(PairKey::new(&a, &b).contains(&b));
    }

    #[test]
    fn test_snapshot_defaults_from_json() {
        let json = r#"{"id": "DAL5", "position": [1.0, 2.0], "altitude_ft": 5000}"#;
        let snapshot: AircraftSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.is_visible());
        assert!(!snapshot.is_taxiing());
        assert!(snapshot.assigned_runway.is_none());
        assert_eq!(snapshot.category, FlightCategory::Arrival);
    }
}
