//! Spatial math for conflict detection and distance calculations.
//!
//! All positions are planar kilometres; angles are radians with
//! 0 = north, increasing clockwise.

use std::f64::consts::{PI, TAU};

/// Kilometres per nautical mile.
pub const KM_PER_NM: f64 = 1.852;
/// Feet per kilometre.
pub const FT_PER_KM: f64 = 3280.839_895;

/// Determinants below this are treated as parallel rays.
const PARALLEL_EPSILON: f64 = 1e-9;

pub fn nm_to_km(nm: f64) -> f64 {
    nm * KM_PER_NM
}

pub fn km_to_ft(km: f64) -> f64 {
    km * FT_PER_KM
}

/// Straight-line distance between two planar points (km).
pub fn euclidean_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Smallest signed angle from `b` to `a`, in `(-PI, PI]`.
pub fn angle_offset(a: f64, b: f64) -> f64 {
    let mut offset = (a - b) % TAU;
    if offset > PI {
        offset -= TAU;
    } else if offset <= -PI {
        offset += TAU;
    }
    offset
}

/// Unit direction vector for a ground track.
pub fn track_vector(track_rad: f64) -> [f64; 2] {
    [track_rad.sin(), track_rad.cos()]
}

fn cross(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

/// Signed distances of each ray origin from the point where the two
/// ground-track lines cross.
///
/// Positive means the aircraft has not yet reached the crossing point.
/// Returns `None` when the tracks are (near) parallel and no crossing
/// point exists.
pub fn distances_to_track_crossing(
    origin1: [f64; 2],
    track1_rad: f64,
    origin2: [f64; 2],
    track2_rad: f64,
) -> Option<(f64, f64)> {
    let d1 = track_vector(track1_rad);
    let d2 = track_vector(track2_rad);
    let denom = cross(d1, d2);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let between = [origin2[0] - origin1[0], origin2[1] - origin1[1]];
    let t1 = cross(between, d2) / denom;
    let t2 = cross(between, d1) / denom;
    Some((t1, t2))
}
