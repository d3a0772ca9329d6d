//! Simulation engine: owns the tank contents and advances them tick by tick.

use crate::behavior::{self, FoodSighting, Neighbor, Surroundings};
use crate::compositor::Compositor;
use crate::creature::{Creature, CreatureSnapshot};
use crate::food::Food;
use crate::frame::Frame;
use crate::tank::Tank;
use fishtank_core::{
    BehaviorConfig, BehaviorKind, CreatureId, Error, FoodConfig, FoodId, Result, SimulationConfig,
    SpeciesCatalog, StyleRef, TankStats, TickReport, Vec2,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, trace, warn};

/// Request to put a creature into the tank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSpec {
    /// Assigned automatically when absent
    pub id: Option<CreatureId>,
    pub species: String,
    pub position: Vec2,
    /// Random direction at the species' max speed when absent
    pub heading: Option<Vec2>,
}

impl CreatureSpec {
    pub fn new(species: &str, position: Vec2) -> Self {
        Self {
            id: None,
            species: species.to_string(),
            position,
            heading: None,
        }
    }

    pub fn with_id(mut self, id: CreatureId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_heading(mut self, heading: Vec2) -> Self {
        self.heading = Some(heading);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    tank: Tank,
    catalog: SpeciesCatalog,
    behavior: BehaviorConfig,
    food_config: FoodConfig,
    compositor: Compositor,
    creatures: BTreeMap<CreatureId, Creature>,
    food: BTreeMap<FoodId, Food>,
    rng: ChaCha8Rng,
    seed: u64,
    tick: u64,
    next_creature_id: u64,
    next_food_id: u64,
    point_of_interest: Vec2,
    stats: TankStats,
}

impl Simulation {
    #[instrument(skip_all, fields(seed = config.seed))]
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let tank = Tank::new(config.tank.width, config.tank.height)?;
        config.validate()?;

        let catalog = SpeciesCatalog::new(config.species)?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let point_of_interest = behavior::random_point(&tank, &mut rng);

        let mut sim = Self {
            tank,
            catalog,
            compositor: Compositor::new(&config.tank.background, &config.food.glyph),
            behavior: config.behavior,
            food_config: config.food,
            creatures: BTreeMap::new(),
            food: BTreeMap::new(),
            rng,
            seed: config.seed,
            tick: 0,
            next_creature_id: 1,
            next_food_id: 1,
            point_of_interest,
            stats: TankStats::new(),
        };

        for entry in &config.population {
            for _ in 0..entry.count {
                sim.spawn(&entry.species)?;
            }
        }

        info!(
            event = "simulation_created",
            seed = sim.seed,
            width = sim.tank.width(),
            height = sim.tank.height(),
            species = sim.catalog.len(),
            population = sim.creatures.len(),
            "Tank ready"
        );

        Ok(sim)
    }

    /// Add a creature at a caller-chosen position
    pub fn add_creature(&mut self, spec: CreatureSpec) -> Result<CreatureId> {
        let species = self.catalog.get(&spec.species)?;
        if !self.tank.contains(spec.position) {
            return Err(Error::OutOfBounds {
                x: spec.position.x,
                y: spec.position.y,
            });
        }
        if let Some(heading) = spec.heading {
            if !(heading.x.is_finite() && heading.y.is_finite()) {
                return Err(Error::InvalidHeading {
                    x: heading.x,
                    y: heading.y,
                });
            }
        }

        let id = match spec.id {
            Some(id) if self.creatures.contains_key(&id) => {
                return Err(Error::DuplicateIdentifier(id));
            }
            Some(id) => id,
            None => self.issue_creature_id()?,
        };
        self.next_creature_id = self.next_creature_id.max(id.0.saturating_add(1));

        let creature = Creature::new(
            id,
            species,
            spec.position,
            spec.heading,
            self.seed,
            &self.behavior.durations,
        );
        debug!(
            event = "creature_added",
            creature_id = id.0,
            species = %creature.species,
            x = creature.position.x,
            y = creature.position.y
        );
        self.creatures.insert(id, creature);

        Ok(id)
    }

    /// Add a creature of `species` somewhere inside its depth band
    pub fn spawn(&mut self, species: &str) -> Result<CreatureId> {
        let config = self.catalog.get(species)?;
        let id = self.issue_creature_id()?;
        let creature = Creature::spawn(id, config, &self.tank, self.seed, &self.behavior.durations);
        self.next_creature_id = id.0.saturating_add(1);

        debug!(
            event = "creature_spawned",
            creature_id = id.0,
            species = %creature.species,
            x = creature.position.x,
            y = creature.position.y
        );
        self.creatures.insert(id, creature);

        Ok(id)
    }

    fn issue_creature_id(&self) -> Result<CreatureId> {
        let id = CreatureId(self.next_creature_id);
        if self.creatures.contains_key(&id) {
            return Err(Error::DuplicateIdentifier(id));
        }
        Ok(id)
    }

    pub fn remove_creature(&mut self, id: CreatureId) -> Result<Creature> {
        let creature = self
            .creatures
            .remove(&id)
            .ok_or(Error::UnknownCreature(id))?;
        debug!(event = "creature_removed", creature_id = id.0, species = %creature.species);
        Ok(creature)
    }

    pub fn creature(&self, id: CreatureId) -> Result<&Creature> {
        self.creatures.get(&id).ok_or(Error::UnknownCreature(id))
    }

    /// Creatures in id order
    pub fn creatures(&self) -> impl Iterator<Item = &Creature> + '_ {
        self.creatures.values()
    }

    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    pub fn snapshot(&self) -> Vec<CreatureSnapshot> {
        self.creatures.values().map(Creature::snapshot).collect()
    }

    pub fn population_by_species(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for creature in self.creatures.values() {
            *counts.entry(creature.species.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Drop a food particle at column `x` of the top row
    pub fn drop_food(&mut self, x: i32) -> Result<FoodId> {
        self.drop_food_at(Vec2::new(f64::from(x), 0.0))
    }

    pub fn drop_food_at(&mut self, position: Vec2) -> Result<FoodId> {
        if !self.tank.contains(position) {
            return Err(Error::OutOfBounds {
                x: position.x,
                y: position.y,
            });
        }

        let id = FoodId(self.next_food_id);
        self.next_food_id += 1;
        let style = self
            .food_config
            .pigments
            .choose(&mut self.rng)
            .copied()
            .map(StyleRef);
        self.food.insert(id, Food::new(id, position, style));

        debug!(event = "food_dropped", food_id = id.0, x = position.x, y = position.y);
        Ok(id)
    }

    /// Remove all food, returning how many particles were cleared
    pub fn clear_food(&mut self) -> usize {
        let cleared = self.food.len();
        self.food.clear();
        debug!(event = "food_cleared", cleared);
        cleared
    }

    pub fn food(&self) -> impl Iterator<Item = &Food> + '_ {
        self.food.values()
    }

    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    pub fn tank(&self) -> &Tank {
        &self.tank
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.tank.dimensions()
    }

    pub fn catalog(&self) -> &SpeciesCatalog {
        &self.catalog
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn point_of_interest(&self) -> Vec2 {
        self.point_of_interest
    }

    pub fn stats(&self) -> &TankStats {
        &self.stats
    }

    /// Render the current state without advancing
    pub fn frame(&self) -> Result<Frame> {
        self.compositor.compose(
            &self.tank,
            &self.catalog,
            self.creatures.values(),
            self.food.values(),
            self.tick,
        )
    }

    /// Advance every creature and food particle by one tick and render.
    ///
    /// Each creature decides from the state as of the previous tick. Results
    /// are staged and only published once the whole tick has succeeded; on
    /// error the simulation is left exactly as it was.
    pub fn advance(&mut self) -> Result<Frame> {
        let tick = self.tick + 1;
        let mut rng = self.rng.clone();

        let mut point_of_interest = self.point_of_interest;
        if self.behavior.poi_interval > 0 && tick % self.behavior.poi_interval == 0 {
            point_of_interest = behavior::random_point(&self.tank, &mut rng);
            trace!(
                event = "point_of_interest_moved",
                tick,
                x = point_of_interest.x,
                y = point_of_interest.y
            );
        }

        let neighbors: Vec<Neighbor> = self
            .creatures
            .values()
            .map(|c| Neighbor {
                id: c.id,
                position: c.position,
            })
            .collect();
        let sightings: Vec<FoodSighting> = self
            .food
            .values()
            .map(|f| FoodSighting {
                id: f.id,
                position: f.position,
            })
            .collect();
        let env = Surroundings {
            tank: &self.tank,
            config: &self.behavior,
            food_config: &self.food_config,
            neighbors: &neighbors,
            food: &sightings,
            point_of_interest,
        };

        let mut report = TickReport {
            tick,
            ..Default::default()
        };
        let mut creatures = BTreeMap::new();
        let mut eaten = BTreeSet::new();

        for (id, current) in &self.creatures {
            let species = match self.catalog.get(&current.species) {
                Ok(species) => species,
                Err(_) => {
                    return Err(self.abort(format!(
                        "creature {} has unknown species '{}'",
                        id, current.species
                    )))
                }
            };

            let mut next = current.clone();
            let outcome = behavior::step(&mut next, species, &env);

            if !self.tank.contains(next.position) {
                return Err(self.abort(format!(
                    "creature {} left the tank at ({}, {})",
                    id, next.position.x, next.position.y
                )));
            }

            if let Some((from, to)) = outcome.transition {
                report.transitions += 1;
                trace!(event = "behavior_transition", tick, creature_id = id.0, %from, %to);
            }
            if outcome.bounced {
                report.bounces += 1;
                trace!(
                    event = "wall_bounce",
                    tick,
                    creature_id = id.0,
                    x = next.position.x,
                    y = next.position.y
                );
            }
            if outcome.startled {
                report.startles += 1;
            }
            if let Some(food_id) = outcome.ate {
                if eaten.insert(food_id) {
                    report.food_eaten += 1;
                    trace!(event = "food_eaten", tick, creature_id = id.0, food_id = food_id.0);
                }
            }

            report.census.record(next.kind());
            creatures.insert(*id, next);
        }

        let mut food: BTreeMap<FoodId, Food> = self
            .food
            .iter()
            .filter(|(id, _)| !eaten.contains(*id))
            .map(|(id, particle)| (*id, particle.clone()))
            .collect();
        let mut settled: BTreeSet<(usize, usize)> = food
            .values()
            .filter(|f| f.settled)
            .map(|f| self.tank.cell_of(f.position))
            .collect();
        for particle in food.values_mut() {
            if particle.settled {
                continue;
            }
            particle.drift(&self.tank, &settled, &mut rng);
            if particle.settled {
                settled.insert(self.tank.cell_of(particle.position));
            }
        }

        let frame = self.compositor.compose(
            &self.tank,
            &self.catalog,
            creatures.values(),
            food.values(),
            tick,
        )?;

        // Commit
        self.creatures = creatures;
        self.food = food;
        self.rng = rng;
        self.point_of_interest = point_of_interest;
        self.tick = tick;
        self.stats.absorb(&report);

        if tick % 1000 == 0 {
            let census = &self.stats.census;
            info!(
                event = "tick_summary",
                tick,
                population = self.creatures.len(),
                food = self.food.len(),
                bounces = self.stats.bounces,
                food_eaten = self.stats.food_eaten,
                idle = census.get(BehaviorKind::Idle),
                cruising = census.get(BehaviorKind::Cruising),
                turning = census.get(BehaviorKind::Turning),
                startled = census.get(BehaviorKind::Startled),
                "Tick {}: {} creatures",
                tick,
                self.creatures.len()
            );
        }

        Ok(frame)
    }

    fn abort(&self, reason: String) -> Error {
        warn!(event = "tick_aborted", tick = self.tick + 1, reason = %reason);
        Error::InvalidState(reason)
    }
}
