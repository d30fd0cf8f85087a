//! Airport runway lookups needed by the conflict engine.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::models::{RunwayId, RunwayPairRelationship};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("runway `{0}` is listed on more than one strip")]
    DuplicateRunwayEnd(RunwayId),
    #[error("strip {0} uses the same runway end twice")]
    DegenerateStrip(RunwayId),
    #[error("relationship {0}/{1} has invalid lateral distance {2}")]
    InvalidLateralDistance(RunwayId, RunwayId, f64),
    #[error("failed to read airport layout: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse airport layout: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only view of the airport the conflict engine queries each tick.
pub trait Airfield {
    /// Field elevation (ft MSL).
    fn elevation_ft(&self) -> f64;

    /// Relationship between two runway ends, regardless of argument order.
    fn relationship(&self, a: &RunwayId, b: &RunwayId) -> Option<RunwayPairRelationship>;

    /// True when both ends belong to the same physical strip.
    fn same_strip(&self, a: &RunwayId, b: &RunwayId) -> bool;
}

/// One entry of the precomputed relationship table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipEntry {
    pub first: RunwayId,
    pub second: RunwayId,
    pub parallel: bool,
    #[serde(default)]
    pub lateral_distance_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLayout {
    #[serde(default)]
    elevation_ft: f64,
    #[serde(default)]
    strips: Vec<[RunwayId; 2]>,
    #[serde(default)]
    relationships: Vec<RelationshipEntry>,
}

/// Static airport geometry: strips and their pairwise relationships.
#[derive(Debug, Clone, Default)]
pub struct AirportLayout {
    elevation_ft: f64,
    /// Runway end -> strip index
    strip_of: HashMap<RunwayId, usize>,
    strips: Vec<[RunwayId; 2]>,
    relationships: HashMap<(RunwayId, RunwayId), RunwayPairRelationship>,
}

impl AirportLayout {
    pub fn new(elevation_ft: f64) -> Self {
        Self {
            elevation_ft,
            ..Self::default()
        }
    }

    /// Register a physical runway by its two ends.
    pub fn add_strip(
        &mut self,
        end_a: impl Into<String>,
        end_b: impl Into<String>,
    ) -> Result<&mut Self, LayoutError> {
        let end_a = RunwayId::new(end_a);
        let end_b = RunwayId::new(end_b);
        if end_a == end_b {
            return Err(LayoutError::DegenerateStrip(end_a));
        }
        for end in [&end_a, &end_b] {
            if self.strip_of.contains_key(end) {
                return Err(LayoutError::DuplicateRunwayEnd(end.clone()));
            }
        }

        let index = self.strips.len();
        self.strip_of.insert(end_a.clone(), index);
        self.strip_of.insert(end_b.clone(), index);
        self.strips.push([end_a, end_b]);
        Ok(self)
    }

    /// Record the relationship between two runway ends.
    pub fn set_relationship(
        &mut self,
        a: impl Into<String>,
        b: impl Into<String>,
        relationship: RunwayPairRelationship,
    ) -> Result<&mut Self, LayoutError> {
        let a = RunwayId::new(a);
        let b = RunwayId::new(b);
        if !relationship.lateral_distance_km.is_finite() || relationship.lateral_distance_km < 0.0 {
            return Err(LayoutError::InvalidLateralDistance(
                a,
                b,
                relationship.lateral_distance_km,
            ));
        }
        self.relationships.insert(Self::key(&a, &b), relationship);
        Ok(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, LayoutError> {
        let raw: RawLayout = serde_json::from_str(raw)?;
        let mut layout = Self::new(raw.elevation_ft);
        for [a, b] in raw.strips {
            layout.add_strip(a.0, b.0)?;
        }
        for entry in raw.relationships {
            layout.set_relationship(
                entry.first.0,
                entry.second.0,
                RunwayPairRelationship {
                    parallel: entry.parallel,
                    lateral_distance_km: entry.lateral_distance_km,
                },
            )?;
        }
        Ok(layout)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// All runway ends known to the layout.
    pub fn runway_ends(&self) -> HashSet<&RunwayId> {
        self.strip_of.keys().collect()
    }

    fn key(a: &RunwayId, b: &RunwayId) -> (RunwayId, RunwayId) {
        if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        }
    }
}

impl Airfield for AirportLayout {
    fn elevation_ft(&self) -> f64 {
        self.elevation_ft
    }

    fn relationship(&self, a: &RunwayId, b: &RunwayId) -> Option<RunwayPairRelationship> {
        self.relationships.get(&Self::key(a, b)).copied()
    }

    fn same_strip(&self, a: &RunwayId, b: &RunwayId) -> bool {
        match (self.strip_of.get(a), self.strip_of.get(b)) {
            (Some(strip_a), Some(strip_b)) => strip_a == strip_b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SFO: &str = r#"{
        "elevation_ft": 13,
        "strips": [["28L", "10R"], ["28R", "10L"], ["1L", "19R"]],
        "relationships": [
            {"first": "28L", "second": "28R", "parallel": true, "lateral_distance_km": 0.229}
        ]
    }"#;

    #[test]
    fn test_layout_from_json() {
        let layout = AirportLayout::from_json(SFO).unwrap();
        assert_eq!(layout.elevation_ft(), 13.0);
        assert_eq!(layout.runway_ends().len(), 6);

        let rel = layout
            .relationship(&"28R".into(), &"28L".into())
            .expect("lookup is order-insensitive");
        assert!(rel.parallel);
        assert!(layout.relationship(&"28L".into(), &"1L".into()).is_none());
    }

    #[test]
    fn test_same_strip() {
        let layout = AirportLayout::from_json(SFO).unwrap();
        assert!(layout.same_strip(&"28L".into(), &"10R".into()));
        assert!(!layout.same_strip(&"28L".into(), &"10L".into()));
        assert!(!layout.same_strip(&"28L".into(), &"99X".into()));
    }

    #[test]
    fn test_duplicate_runway_end_rejected() {
        let mut layout = AirportLayout::new(0.0);
        layout.add_strip("9", "27").unwrap();
        assert!(matches!(
            layout.add_strip("27", "9R"),
            Err(LayoutError::DuplicateRunwayEnd(_))
        ));
        assert!(matches!(
            layout.add_strip("4", "4"),
            Err(LayoutError::DegenerateStrip(_))
        ));
    }
}
