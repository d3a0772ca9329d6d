//! Creature state and management.

use crate::behavior::{self, Behavior};
use crate::tank::Tank;
use fishtank_core::{BehaviorDurations, BehaviorKind, CreatureId, SpeciesConfig, StyleRef, Vec2};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// A creature in the tank
#[derive(Debug, Clone)]
pub struct Creature {
    pub id: CreatureId,
    pub species: String,
    pub position: Vec2,
    /// Per-tick velocity at cruising speed; never longer than the species' max speed
    pub heading: Vec2,
    pub behavior: Behavior,
    pub style: Option<StyleRef>,
    pub age: u64,
    pub(crate) rng: ChaCha8Rng,
}

/// Random stream private to one creature: the simulation seed, forked by id
pub(crate) fn creature_rng(seed: u64, id: CreatureId) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(id.0);
    rng
}

impl Creature {
    /// Create a creature at a caller-chosen position.
    ///
    /// A missing or zero-length heading is replaced by a random direction at
    /// the species' max speed; a supplied heading is clamped to that speed.
    pub fn new(
        id: CreatureId,
        species: &SpeciesConfig,
        position: Vec2,
        heading: Option<Vec2>,
        seed: u64,
        durations: &BehaviorDurations,
    ) -> Self {
        let rng = creature_rng(seed, id);
        Self::with_rng(id, species, position, heading, rng, durations)
    }

    /// Create a creature somewhere inside its species' depth band
    pub fn spawn(
        id: CreatureId,
        species: &SpeciesConfig,
        tank: &Tank,
        seed: u64,
        durations: &BehaviorDurations,
    ) -> Self {
        let mut rng = creature_rng(seed, id);
        let position = behavior::destination_in_band(tank, &species.depth_band, &mut rng);
        Self::with_rng(id, species, position, None, rng, durations)
    }

    fn with_rng(
        id: CreatureId,
        species: &SpeciesConfig,
        position: Vec2,
        heading: Option<Vec2>,
        mut rng: ChaCha8Rng,
        durations: &BehaviorDurations,
    ) -> Self {
        let heading = match heading {
            Some(h) if h.length() > 0.0 && h.length().is_finite() => {
                h.clamp_length(species.max_speed)
            }
            _ => Vec2::from_angle(rng.gen_range(0.0..TAU), species.max_speed),
        };
        let style = species.pigments.choose(&mut rng).copied().map(StyleRef);
        let initial = durations.initial_idle;
        let behavior = Behavior::Idle {
            remaining: rng.gen_range(initial.min..=initial.max),
        };

        Self {
            id,
            species: species.name.clone(),
            position,
            heading,
            behavior,
            style,
            age: 0,
            rng,
        }
    }

    pub fn kind(&self) -> BehaviorKind {
        self.behavior.kind()
    }

    /// Whether the glyph should be drawn mirrored
    pub fn facing_left(&self) -> bool {
        self.heading.x < 0.0
    }

    pub fn snapshot(&self) -> CreatureSnapshot {
        CreatureSnapshot {
            id: self.id,
            species: self.species.clone(),
            position: self.position,
            heading: self.heading,
            behavior: self.kind(),
            remaining: self.behavior.remaining(),
            style: self.style,
            age: self.age,
        }
    }
}

/// Comparable, serializable view of a creature (without its random stream)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    pub id: CreatureId,
    pub species: String,
    pub position: Vec2,
    pub heading: Vec2,
    pub behavior: BehaviorKind,
    pub remaining: u32,
    pub style: Option<StyleRef>,
    pub age: u64,
}

impl From<&Creature> for CreatureSnapshot {
    fn from(creature: &Creature) -> Self {
        creature.snapshot()
    }
}
