//! Broad-phase pair scan and ownership of live conflict trackers.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::conflict::{ConflictRule, ConflictTracker, TickContext, UpdateOutcome, ViolationRule};
use crate::models::{AircraftId, AircraftSnapshot, PairKey};
use crate::rules::SeparationRules;

/// Snapshot of one live tracker, for display and logging.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    pub pair: PairKey,
    pub distance_km: f64,
    pub altitude_delta_ft: f64,
    pub collided: bool,
    pub conflicts: BTreeSet<ConflictRule>,
    pub violations: BTreeSet<ViolationRule>,
}

impl From<&ConflictTracker> for ConflictReport {
    fn from(tracker: &ConflictTracker) -> Self {
        Self {
            pair: tracker.pair().clone(),
            distance_km: tracker.distance_km(),
            altitude_delta_ft: tracker.altitude_delta_ft(),
            collided: tracker.is_collided(),
            conflicts: tracker.conflicts().clone(),
            violations: tracker.violations().clone(),
        }
    }
}

/// Owns at most one [`ConflictTracker`] per unordered aircraft pair.
#[derive(Debug, Default)]
pub struct ConflictRegistry {
    rules: SeparationRules,
    trackers: HashMap<PairKey, ConflictTracker>,
    /// Aircraft involved in a collision
    hit: HashSet<AircraftId>,
}

impl ConflictRegistry {
    pub fn new(rules: SeparationRules) -> Self {
        Self {
            rules,
            trackers: HashMap::new(),
            hit: HashSet::new(),
        }
    }

    pub fn rules(&self) -> &SeparationRules {
        &self.rules
    }

    /// Run one scan over every unordered pair in `aircraft`.
    ///
    /// Existing trackers are updated; untracked pairs inside the bounding
    /// box get a new tracker. Trackers referencing aircraft missing from
    /// the list are released first.
    pub fn tick(&mut self, aircraft: &[AircraftSnapshot], ctx: &mut TickContext<'_>) {
        let present: HashSet<&AircraftId> = aircraft.iter().map(|a| &a.id).collect();
        self.trackers.retain(|key, _| {
            let keep = present.contains(key.first()) && present.contains(key.second());
            if !keep {
                tracing::debug!("releasing conflict {} (aircraft gone)", key);
            }
            keep
        });
        self.hit.retain(|id| present.contains(id));

        let bounding_box_km = self.rules.bounding_box_km;

        for (i, a) in aircraft.iter().enumerate() {
            for b in &aircraft[i + 1..] {
                if a.id == b.id {
                    continue;
                }
                let key = PairKey::new(&a.id, &b.id);

                let outcome = match self.trackers.get_mut(&key) {
                    Some(tracker) => tracker.update(a, b, &self.rules, ctx),
                    None => {
                        let dx = (a.position[0] - b.position[0]).abs();
                        let dy = (a.position[1] - b.position[1]).abs();
                        if dx > bounding_box_km || dy > bounding_box_km {
                            continue;
                        }

                        let mut tracker = ConflictTracker::new(a, b);
                        let outcome = tracker.update(a, b, &self.rules, ctx);
                        if outcome != UpdateOutcome::Release {
                            tracing::debug!("tracking conflict {}", key);
                            self.trackers.insert(key.clone(), tracker);
                        }
                        outcome
                    }
                };

                match outcome {
                    UpdateOutcome::Active => {}
                    UpdateOutcome::Collided => {
                        self.hit.insert(a.id.clone());
                        self.hit.insert(b.id.clone());
                    }
                    UpdateOutcome::Release => {
                        if self.trackers.remove(&key).is_some() {
                            tracing::debug!("releasing conflict {}", key);
                        }
                    }
                }
            }
        }
    }

    /// Release every tracker referencing `id`. Safe to call repeatedly.
    pub fn remove_aircraft(&mut self, id: &AircraftId) {
        self.trackers.retain(|key, _| !key.contains(id));
        self.hit.remove(id);
    }

    pub fn tracker(&self, a: &AircraftId, b: &AircraftId) -> Option<&ConflictTracker> {
        self.trackers.get(&PairKey::new(a, b))
    }

    pub fn has_conflict(&self, a: &AircraftId, b: &AircraftId) -> bool {
        self.tracker(a, b).is_some_and(ConflictTracker::has_conflict)
    }

    pub fn has_violation(&self, a: &AircraftId, b: &AircraftId) -> bool {
        self.tracker(a, b).is_some_and(ConflictTracker::has_violation)
    }

    /// True if the aircraft is in conflict with anyone.
    pub fn aircraft_has_conflict(&self, id: &AircraftId) -> bool {
        self.trackers_for(id).any(ConflictTracker::has_conflict)
    }

    /// True if the aircraft has lost separation with anyone.
    pub fn aircraft_has_violation(&self, id: &AircraftId) -> bool {
        self.trackers_for(id).any(ConflictTracker::has_violation)
    }

    pub fn is_hit(&self, id: &AircraftId) -> bool {
        self.hit.contains(id)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConflictTracker> {
        self.trackers.values()
    }

    /// Reports for trackers with an active conflict or violation, sorted by pair.
    pub fn report(&self) -> Vec<ConflictReport> {
        let mut reports: Vec<ConflictReport> = self
            .trackers
            .values()
            .filter(|t| t.has_conflict() || t.has_violation() || t.is_collided())
            .map(ConflictReport::from)
            .collect();
        reports.sort_by(|a, b| a.pair.cmp(&b.pair));
        reports
    }

    fn trackers_for<'a>(&'a self, id: &'a AircraftId) -> impl Iterator<Item = &'a ConflictTracker> {
        self.trackers
            .iter()
            .filter(move |(key, _)| key.contains(id))
            .map(|(_, tracker)| tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airfield::AirportLayout;
    use crate::events::{NoopQueues, Scoreboard};

    fn scan(registry: &mut ConflictRegistry, aircraft: &[AircraftSnapshot]) {
        let layout = AirportLayout::new(0.0);
        let mut board = Scoreboard::default();
        let mut queues = NoopQueues;
        let mut ctx = TickContext {
            now: 0.0,
            airfield: &layout,
            events: &mut board,
            queues: &mut queues,
        };
        registry.tick(aircraft, &mut ctx);
    }

    #[test]
    fn test_bounding_box_rejects_far_pairs() {
        let mut registry = ConflictRegistry::default();
        let fleet = vec![
            AircraftSnapshot::new("AAL1", 0.0, 0.0, 5_000.0),
            AircraftSnapshot::new("UAL2", 20.0, 0.0, 5_000.0),
        ];
        scan(&mut registry, &fleet);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_diagonal_pair_inside_box_is_released() {
        // Both axes pass the box test but the real distance exceeds it
        let mut registry = ConflictRegistry::default();
        let fleet = vec![
            AircraftSnapshot::new("AAL1", 0.0, 0.0, 5_000.0),
            AircraftSnapshot::new("UAL2", 12.0, 12.0, 5_000.0),
        ];
        scan(&mut registry, &fleet);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_one_tracker_per_pair() {
        let mut registry = ConflictRegistry::default();
        let fleet = vec![
            AircraftSnapshot::new("AAL1", 0.0, 0.0, 5_000.0),
            AircraftSnapshot::new("UAL2", 3.0, 0.0, 5_000.0),
            AircraftSnapshot::new("DAL3", 0.0, 3.0, 5_000.0),
        ];
        scan(&mut registry, &fleet);
        scan(&mut registry, &fleet);
        assert_eq!(registry.len(), 3);

        let reversed: Vec<AircraftSnapshot> = fleet.iter().rev().cloned().collect();
        scan(&mut registry, &reversed);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_remove_aircraft_is_idempotent() {
        let mut registry = ConflictRegistry::default();
        let fleet = vec![
            AircraftSnapshot::new("AAL1", 0.0, 0.0, 5_000.0),
            AircraftSnapshot::new("UAL2", 3.0, 0.0, 5_000.0),
            AircraftSnapshot::new("DAL3", 0.0, 3.0, 5_000.0),
        ];
        scan(&mut registry, &fleet);

        let gone = AircraftId::from("AAL1");
        registry.remove_aircraft(&gone);
        registry.remove_aircraft(&gone);
        assert_eq!(registry.len(), 1);
        assert!(!registry.aircraft_has_conflict(&gone));
    }

    #[test]
    fn test_vanished_aircraft_released_on_next_tick() {
        let mut registry = ConflictRegistry::default();
        let mut fleet = vec![
            AircraftSnapshot::new("AAL1", 0.0, 0.0, 5_000.0),
            AircraftSnapshot::new("UAL2", 3.0, 0.0, 5_000.0),
        ];
        scan(&mut registry, &fleet);
        assert_eq!(registry.len(), 1);

        fleet.pop();
        scan(&mut registry, &fleet);
        assert!(registry.is_empty());
    }
}
