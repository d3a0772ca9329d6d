//! Run statistics for a tank.

use crate::types::BehaviorKind;
use serde::{Deserialize, Serialize};

/// Creature-ticks spent in each behavior state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorCensus {
    counts: [u64; 4],
}

impl BehaviorCensus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: BehaviorKind) {
        self.counts[kind.index()] += 1;
    }

    pub fn get(&self, kind: BehaviorKind) -> u64 {
        self.counts[kind.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn merge(&mut self, other: &BehaviorCensus) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }
}

/// What happened during a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub bounces: u32,
    pub startles: u32,
    pub transitions: u32,
    pub food_eaten: u32,
    /// Behavior state of every creature at the end of the tick
    pub census: BehaviorCensus,
}

/// Totals accumulated over the lifetime of a simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankStats {
    pub ticks: u64,
    pub bounces: u64,
    pub startles: u64,
    pub transitions: u64,
    pub food_eaten: u64,
    pub census: BehaviorCensus,
}

impl TankStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one committed tick into the totals
    pub fn absorb(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.bounces += u64::from(report.bounces);
        self.startles += u64::from(report.startles);
        self.transitions += u64::from(report.transitions);
        self.food_eaten += u64::from(report.food_eaten);
        self.census.merge(&report.census);
    }

    /// Whether any creature has ever ended a tick in `kind`
    pub fn observed(&self, kind: BehaviorKind) -> bool {
        self.census.get(kind) > 0
    }

    pub fn observed_all(&self) -> bool {
        BehaviorKind::all().iter().all(|kind| self.observed(*kind))
    }
}
