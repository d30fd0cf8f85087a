//! Separation rules and thresholds for the conflict engine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::spatial::{km_to_ft, nm_to_km};

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("rule `{name}` must be a positive finite number, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("parallel-track threshold ({parallel_deg}°) must be below reciprocal threshold ({reciprocal_deg}°)")]
    InvertedCourseThresholds { parallel_deg: f64, reciprocal_deg: f64 },
    #[error("parallel-approach band {index} ({max_spacing_ft} ft) is not above the previous band")]
    UnorderedApproachBands { index: usize, max_spacing_ft: f64 },
    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for separation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationRules {
    /// Broad-phase box half-size; no rule can fire beyond this (km)
    pub bounding_box_km: f64,
    /// Horizontal distance below which two aircraft collide (km)
    pub collision_distance_km: f64,
    /// Vertical distance below which two aircraft collide (ft)
    pub collision_altitude_ft: f64,
    /// Maximum distance for a same-strip runway collision warning (km)
    pub runway_collision_distance_km: f64,
    /// Separation checks are skipped below this height above the field (ft)
    pub min_agl_ft: f64,
    /// Separation checks are skipped this long after takeoff (s)
    pub takeoff_grace_secs: f64,
    /// Vertical separation that satisfies the rules on its own (ft)
    pub vertical_separation_ft: f64,
    /// Standard lateral separation minimum (nm)
    pub lateral_separation_nm: f64,
    /// Early-warning band beyond the lateral minimum (nm)
    pub notice_buffer_nm: f64,
    /// Tracks closer than this are treated as parallel courses (deg)
    pub parallel_course_deg: f64,
    /// Tracks further apart than this are treated as reciprocal (deg)
    pub reciprocal_course_deg: f64,
    /// Reduced minima for simultaneous approaches to parallel runways
    pub parallel_approach: ParallelApproachTable,
}

/// Lateral minima for approaches to parallel runways, by centerline spacing.
///
/// Spacings below `min_spacing_ft` or above the last band use the
/// standard minimum. Otherwise the first band whose `max_spacing_ft` is
/// not exceeded applies. Bands must be in strictly ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelApproachTable {
    pub min_spacing_ft: f64,
    pub bands: Vec<ParallelApproachBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelApproachBand {
    pub max_spacing_ft: f64,
    pub lateral_separation_nm: f64,
}

impl Default for ParallelApproachTable {
    fn default() -> Self {
        Self {
            min_spacing_ft: 2500.0,
            bands: vec![
                ParallelApproachBand {
                    max_spacing_ft: 3600.0,
                    lateral_separation_nm: 1.0,
                },
                ParallelApproachBand {
                    max_spacing_ft: 4300.0,
                    lateral_separation_nm: 1.5,
                },
                ParallelApproachBand {
                    max_spacing_ft: 9000.0,
                    lateral_separation_nm: 2.0,
                },
            ],
        }
    }
}

impl ParallelApproachTable {
    /// Reduced minimum (nm) for the given spacing, if one applies.
    pub fn minimum_nm(&self, spacing_ft: f64) -> Option<f64> {
        if spacing_ft < self.min_spacing_ft {
            return None;
        }
        self.bands
            .iter()
            .find(|band| spacing_ft <= band.max_spacing_ft)
            .map(|band| band.lateral_separation_nm)
    }
}

impl Default for SeparationRules {
    fn default() -> Self {
        Self {
            bounding_box_km: 14.816, // 8 nm
            collision_distance_km: 0.05,
            collision_altitude_ft: 160.0,
            runway_collision_distance_km: 10.0,
            min_agl_ft: 990.0,
            takeoff_grace_secs: 60.0,
            vertical_separation_ft: 1000.0,
            lateral_separation_nm: 3.0, // FAA standard
            notice_buffer_nm: 1.0,
            parallel_course_deg: 15.0,
            reciprocal_course_deg: 165.0,
            parallel_approach: ParallelApproachTable::default(),
        }
    }
}

impl SeparationRules {
    /// Load rules from a JSON file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, RulesError> {
        let rules: Self = serde_json::from_str(raw)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        let positive = [
            ("bounding_box_km", self.bounding_box_km),
            ("collision_distance_km", self.collision_distance_km),
            ("collision_altitude_ft", self.collision_altitude_ft),
            ("runway_collision_distance_km", self.runway_collision_distance_km),
            ("vertical_separation_ft", self.vertical_separation_ft),
            ("lateral_separation_nm", self.lateral_separation_nm),
            ("parallel_course_deg", self.parallel_course_deg),
            ("reciprocal_course_deg", self.reciprocal_course_deg),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(RulesError::NotPositive { name, value });
            }
        }

        let non_negative = [
            ("min_agl_ft", self.min_agl_ft),
            ("takeoff_grace_secs", self.takeoff_grace_secs),
            ("notice_buffer_nm", self.notice_buffer_nm),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(RulesError::NotPositive { name, value });
            }
        }

        let mut previous_max_ft = self.parallel_approach.min_spacing_ft;
        for (index, band) in self.parallel_approach.bands.iter().enumerate() {
            if !band.lateral_separation_nm.is_finite() || band.lateral_separation_nm <= 0.0 {
                return Err(RulesError::NotPositive {
                    name: "parallel_approach.lateral_separation_nm",
                    value: band.lateral_separation_nm,
                });
            }
            if band.max_spacing_ft.is_nan() || band.max_spacing_ft <= previous_max_ft {
                return Err(RulesError::UnorderedApproachBands {
                    index,
                    max_spacing_ft: band.max_spacing_ft,
                });
            }
            previous_max_ft = band.max_spacing_ft;
        }

        if self.parallel_course_deg >= self.reciprocal_course_deg {
            return Err(RulesError::InvertedCourseThresholds {
                parallel_deg: self.parallel_course_deg,
                reciprocal_deg: self.reciprocal_course_deg,
            });
        }
        Ok(())
    }

    pub fn lateral_separation_km(&self) -> f64 {
        nm_to_km(self.lateral_separation_nm)
    }

    pub fn notice_buffer_km(&self) -> f64 {
        nm_to_km(self.notice_buffer_nm)
    }

    /// Lateral minimum (km) for simultaneous approaches to parallel
    /// runways whose centerlines are `spacing_km` apart.
    ///
    /// Spacings beyond the last band fall back to the standard minimum.
    pub fn parallel_approach_minimum_km(&self, spacing_km: f64) -> f64 {
        self.parallel_approach
            .minimum_nm(km_to_ft(spacing_km))
            .map(nm_to_km)
            .unwrap_or_else(|| self.lateral_separation_km())
    }
}
