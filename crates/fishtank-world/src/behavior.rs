//! Behavior state machine and movement policy.
//!
//! A creature's tick runs in a fixed order: proximity startle, state
//! countdown and transition, steering, movement with wall bounce, eating.
//! All randomness comes from the creature's own stream, and everything the
//! policy knows about the rest of the tank arrives through [`Surroundings`],
//! a read-only snapshot taken before the tick began.

use crate::creature::Creature;
use crate::tank::Tank;
use fishtank_core::{
    BehaviorConfig, BehaviorKind, CreatureId, DepthBand, FoodConfig, FoodId, SpeciesConfig, Vec2,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Current behavior with its per-state data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Drifting along the current heading at reduced speed
    Idle { remaining: u32 },
    /// Sustained swim along the current heading
    Cruising { remaining: u32 },
    /// Steering toward `target` (radians) at the species' turn rate
    Turning { remaining: u32, target: f64 },
    /// Brief dash at boosted speed
    Startled { remaining: u32 },
}

impl Behavior {
    pub fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::Idle { .. } => BehaviorKind::Idle,
            Behavior::Cruising { .. } => BehaviorKind::Cruising,
            Behavior::Turning { .. } => BehaviorKind::Turning,
            Behavior::Startled { .. } => BehaviorKind::Startled,
        }
    }

    pub fn remaining(&self) -> u32 {
        match *self {
            Behavior::Idle { remaining }
            | Behavior::Cruising { remaining }
            | Behavior::Turning { remaining, .. }
            | Behavior::Startled { remaining } => remaining,
        }
    }

    /// Count one tick down. Returns true once the state has run out.
    fn tick_down(&mut self) -> bool {
        let remaining = match self {
            Behavior::Idle { remaining }
            | Behavior::Cruising { remaining }
            | Behavior::Turning { remaining, .. }
            | Behavior::Startled { remaining } => remaining,
        };
        *remaining = remaining.saturating_sub(1);
        *remaining == 0
    }
}

/// Another creature's position as of the start of the tick
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub id: CreatureId,
    pub position: Vec2,
}

/// A food particle's position as of the start of the tick
#[derive(Debug, Clone, Copy)]
pub struct FoodSighting {
    pub id: FoodId,
    pub position: Vec2,
}

/// Read-only view of the tank handed to the policy for one tick
pub struct Surroundings<'a> {
    pub tank: &'a Tank,
    pub config: &'a BehaviorConfig,
    pub food_config: &'a FoodConfig,
    pub neighbors: &'a [Neighbor],
    pub food: &'a [FoodSighting],
    pub point_of_interest: Vec2,
}

/// What happened to one creature during its step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    pub bounced: bool,
    pub startled: bool,
    pub transition: Option<(BehaviorKind, BehaviorKind)>,
    pub ate: Option<FoodId>,
}

/// Advance one creature by one tick
pub fn step(
    creature: &mut Creature,
    species: &SpeciesConfig,
    env: &Surroundings<'_>,
) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    let config = env.config;

    // Startle cue from a close neighbour
    if creature.kind() != BehaviorKind::Startled {
        if let Some(neighbor) = nearest_neighbor(creature, env.neighbors, config.startle_radius) {
            if creature.rng.gen_bool(config.startle_chance) {
                let away = creature.position - neighbor.position;
                startle(creature, species, config, away);
                outcome.startled = true;
            }
        }
    }

    if !outcome.startled && creature.behavior.tick_down() {
        let from = creature.kind();
        let to = next_state(creature, species, env);
        enter(creature, species, env, to);
        outcome.transition = Some((from, to));
    }

    // Steering
    let target_food = if creature.kind() != BehaviorKind::Startled {
        nearest_food(creature.position, env.food, env.food_config.sight_radius)
    } else {
        None
    };
    if let Some(food) = target_food {
        let toward = (food.position - creature.position).angle();
        creature.heading = creature.heading.rotate_toward(toward, species.turn_rate);
    } else if let Behavior::Turning { target, .. } = creature.behavior {
        creature.heading = creature.heading.rotate_toward(target, species.turn_rate);
    }

    // Movement
    let displacement = creature.heading * config.speed.get(creature.kind());
    let proposed = creature.position + displacement;
    if env.tank.contains(proposed) {
        creature.position = proposed;
    } else {
        let (position, heading) = env.tank.clamp_or_reflect(proposed, creature.heading);
        creature.position = position;
        creature.heading = heading;
        outcome.bounced = true;

        if creature.kind() != BehaviorKind::Startled {
            let remaining = sample_duration(creature, config, BehaviorKind::Startled);
            creature.behavior = Behavior::Startled { remaining };
            outcome.startled = true;
        }
    }

    if let Some(food) = target_food {
        if creature.position.distance(food.position) <= env.food_config.eat_radius {
            outcome.ate = Some(food.id);
        }
    }

    creature.age += 1;
    outcome
}

fn nearest_neighbor(creature: &Creature, neighbors: &[Neighbor], radius: f64) -> Option<Neighbor> {
    neighbors
        .iter()
        .filter(|n| n.id != creature.id)
        .map(|n| (n, creature.position.distance(n.position)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| *n)
}

fn nearest_food(position: Vec2, food: &[FoodSighting], radius: f64) -> Option<FoodSighting> {
    food.iter()
        .map(|f| (f, position.distance(f.position)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(f, _)| *f)
}

/// Dash directly away from `away`, or in a random direction when the
/// neighbour sits on top of us.
fn startle(creature: &mut Creature, species: &SpeciesConfig, config: &BehaviorConfig, away: Vec2) {
    let angle = if away.length() > 1e-9 {
        away.angle()
    } else {
        creature.rng.gen_range(0.0..TAU)
    };
    creature.heading = Vec2::from_angle(angle, species.max_speed);
    let remaining = sample_duration(creature, config, BehaviorKind::Startled);
    creature.behavior = Behavior::Startled { remaining };
}

/// Whether the creature is heading out of the tank or is outside its band
fn needs_course_correction(
    creature: &Creature,
    species: &SpeciesConfig,
    env: &Surroundings<'_>,
) -> bool {
    let cruise = creature.heading * env.config.speed.cruising;
    env.tank.path_leaves(creature.position, cruise, env.config.lookahead_ticks)
        || !species
            .depth_band
            .contains_row(creature.position.y, env.tank.height())
}

/// Sample the state that follows the current one from the species' table
fn next_state(
    creature: &mut Creature,
    species: &SpeciesConfig,
    env: &Surroundings<'_>,
) -> BehaviorKind {
    let from = creature.kind();
    let mut weights = species.weights.row(from).as_array();

    if from == BehaviorKind::Startled {
        // A fright always settles into IDLE or CRUISING
        weights[BehaviorKind::Turning.index()] = 0;
        weights[BehaviorKind::Startled.index()] = 0;
    } else if needs_course_correction(creature, species, env) {
        let turning = &mut weights[BehaviorKind::Turning.index()];
        *turning = (*turning).max(1).saturating_mul(env.config.turning_boost.max(1));
    }

    match WeightedIndex::new(weights) {
        Ok(dist) => BehaviorKind::all()[dist.sample(&mut creature.rng)],
        Err(_) => BehaviorKind::Idle,
    }
}

fn enter(
    creature: &mut Creature,
    species: &SpeciesConfig,
    env: &Surroundings<'_>,
    kind: BehaviorKind,
) {
    let remaining = sample_duration(creature, env.config, kind);
    let behavior = match kind {
        BehaviorKind::Idle => Behavior::Idle { remaining },
        BehaviorKind::Cruising => Behavior::Cruising { remaining },
        BehaviorKind::Turning => Behavior::Turning {
            remaining,
            target: turn_target(creature, species, env),
        },
        BehaviorKind::Startled => {
            let angle = creature.rng.gen_range(0.0..TAU);
            creature.heading = Vec2::from_angle(angle, species.max_speed);
            Behavior::Startled { remaining }
        }
    };
    creature.behavior = behavior;
}

fn sample_duration(creature: &mut Creature, config: &BehaviorConfig, kind: BehaviorKind) -> u32 {
    let range = config.durations.get(kind);
    creature.rng.gen_range(range.min..=range.max)
}

/// Heading (radians) toward a fresh destination: near the shared point of
/// interest when schooling, otherwise anywhere in the species' band.
fn turn_target(creature: &mut Creature, species: &SpeciesConfig, env: &Surroundings<'_>) -> f64 {
    let destination = if creature.rng.gen_bool(env.config.school_chance) {
        let fuzz = Vec2::new(
            f64::from(creature.rng.gen_range(-5i32..=5)),
            f64::from(creature.rng.gen_range(-3i32..=3)),
        );
        env.tank.clamp(env.point_of_interest + fuzz)
    } else {
        destination_in_band(env.tank, &species.depth_band, &mut creature.rng)
    };

    let offset = destination - creature.position;
    if offset.length() > 1e-9 {
        offset.angle()
    } else {
        creature.heading.angle()
    }
}

/// Random legal position inside a depth band
pub fn destination_in_band(tank: &Tank, band: &DepthBand, rng: &mut ChaCha8Rng) -> Vec2 {
    let (top, bottom) = tank.band_rows(band);
    let x = rng.gen_range(0.0..=(tank.width() - 1) as f64);
    let y = rng.gen_range(top..=bottom);
    tank.clamp(Vec2::new(x, y))
}

/// Random legal position anywhere in the tank
pub fn random_point(tank: &Tank, rng: &mut ChaCha8Rng) -> Vec2 {
    destination_in_band(tank, &DepthBand::FULL, rng)
}
