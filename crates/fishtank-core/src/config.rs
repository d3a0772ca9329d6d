//! Configuration types for the simulation.
//!
//! Everything here is plain data handed to the simulation at construction
//! time. Reading files, flags or the environment is left to the shell.

use crate::error::{Error, Result};
use crate::types::BehaviorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tank configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    /// Width of the tank in cells
    pub width: i32,
    /// Height of the tank in cells
    pub height: i32,
    /// Glyph drawn in cells with nothing in them
    pub background: String,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            width: 65,
            height: 30,
            background: " ".to_string(),
        }
    }
}

/// Vertical band a species prefers, as fractions of the tank height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthBand {
    pub top: f64,
    pub bottom: f64,
}

impl DepthBand {
    pub const FULL: DepthBand = DepthBand { top: 0.0, bottom: 1.0 };

    pub const fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    /// Row range `(top, bottom)` covered by the band in a tank of `height` rows
    pub fn rows(&self, height: usize) -> (f64, f64) {
        let last = height.saturating_sub(1) as f64;
        (self.top * last, self.bottom * last)
    }

    pub fn contains_row(&self, y: f64, height: usize) -> bool {
        let (top, bottom) = self.rows(height);
        y >= top && y <= bottom
    }
}

impl Default for DepthBand {
    fn default() -> Self {
        Self::FULL
    }
}

/// Relative weights of the next behavior state, for one current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateWeights {
    pub idle: u32,
    pub cruising: u32,
    pub turning: u32,
    pub startled: u32,
}

impl StateWeights {
    pub const fn new(idle: u32, cruising: u32, turning: u32, startled: u32) -> Self {
        Self {
            idle,
            cruising,
            turning,
            startled,
        }
    }

    pub fn get(&self, kind: BehaviorKind) -> u32 {
        match kind {
            BehaviorKind::Idle => self.idle,
            BehaviorKind::Cruising => self.cruising,
            BehaviorKind::Turning => self.turning,
            BehaviorKind::Startled => self.startled,
        }
    }

    /// Weights in `BehaviorKind::all()` order
    pub fn as_array(&self) -> [u32; 4] {
        [self.idle, self.cruising, self.turning, self.startled]
    }
}

/// Transition table: one weight row per current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionWeights {
    pub idle: StateWeights,
    pub cruising: StateWeights,
    pub turning: StateWeights,
    pub startled: StateWeights,
}

impl TransitionWeights {
    pub fn row(&self, from: BehaviorKind) -> &StateWeights {
        match from {
            BehaviorKind::Idle => &self.idle,
            BehaviorKind::Cruising => &self.cruising,
            BehaviorKind::Turning => &self.turning,
            BehaviorKind::Startled => &self.startled,
        }
    }
}

impl Default for TransitionWeights {
    fn default() -> Self {
        Self {
            idle: StateWeights::new(2, 5, 3, 0),
            cruising: StateWeights::new(3, 2, 4, 0),
            turning: StateWeights::new(2, 6, 1, 0),
            startled: StateWeights::new(1, 2, 0, 0),
        }
    }
}

/// A named kind of creature
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesConfig {
    pub name: String,
    /// Glyph drawn when facing right; mirrored when facing left
    pub glyph: String,
    /// Maximum heading magnitude, in cells per tick
    pub max_speed: f64,
    /// Maximum heading change per tick, in radians
    pub turn_rate: f64,
    pub depth_band: DepthBand,
    /// Palette indices a new creature picks its style from
    pub pigments: Vec<u8>,
    pub weights: TransitionWeights,
}

impl SpeciesConfig {
    pub fn new(name: &str, glyph: &str, max_speed: f64) -> Self {
        Self {
            name: name.to_string(),
            glyph: glyph.to_string(),
            max_speed,
            ..Default::default()
        }
    }

    pub fn with_depth_band(mut self, top: f64, bottom: f64) -> Self {
        self.depth_band = DepthBand::new(top, bottom);
        self
    }

    pub fn with_pigments(mut self, pigments: &[u8]) -> Self {
        self.pigments = pigments.to_vec();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidConfig("species name is empty".into()));
        }
        if self.glyph.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "species '{}' has an empty glyph",
                self.name
            )));
        }
        if !(self.max_speed > 0.0 && self.max_speed.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "species '{}' max_speed must be positive",
                self.name
            )));
        }
        if !(self.turn_rate > 0.0 && self.turn_rate.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "species '{}' turn_rate must be positive",
                self.name
            )));
        }
        let band = self.depth_band;
        if !(0.0..=1.0).contains(&band.top)
            || !(0.0..=1.0).contains(&band.bottom)
            || band.top > band.bottom
        {
            return Err(Error::InvalidConfig(format!(
                "species '{}' depth band {}..{} is not within 0..1",
                self.name, band.top, band.bottom
            )));
        }
        Ok(())
    }
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self {
            name: "fish".to_string(),
            glyph: "><'>".to_string(),
            max_speed: 1.0,
            turn_rate: 0.35,
            depth_band: DepthBand::FULL,
            pigments: vec![243, 226, 220, 255],
            weights: TransitionWeights::default(),
        }
    }
}

/// The three dwellers stocked by default
pub fn default_species() -> Vec<SpeciesConfig> {
    vec![
        SpeciesConfig::new("minnow", ">", 1.2)
            .with_depth_band(0.0, 0.35)
            .with_pigments(&[210, 174, 138]),
        SpeciesConfig::new("goldfish", "o", 1.0)
            .with_depth_band(0.3, 0.75)
            .with_pigments(&[34, 70, 106]),
        SpeciesConfig {
            turn_rate: 0.2,
            ..SpeciesConfig::new("loach", "=", 0.6)
                .with_depth_band(0.7, 1.0)
                .with_pigments(&[33, 79, 105])
        },
    ]
}

/// Species indexed by name
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    species: BTreeMap<String, SpeciesConfig>,
}

impl SpeciesCatalog {
    pub fn new(species: Vec<SpeciesConfig>) -> Result<Self> {
        let mut catalog = BTreeMap::new();
        for entry in species {
            entry.validate()?;
            if catalog.contains_key(&entry.name) {
                return Err(Error::InvalidConfig(format!(
                    "species '{}' defined twice",
                    entry.name
                )));
            }
            catalog.insert(entry.name.clone(), entry);
        }
        Ok(Self { species: catalog })
    }

    pub fn get(&self, name: &str) -> Result<&SpeciesConfig> {
        self.species
            .get(name)
            .ok_or_else(|| Error::UnknownSpecies(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.species.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

/// Inclusive range of ticks a behavior state lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min: u32,
    pub max: u32,
}

impl DurationRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn validate(&self, what: &str) -> Result<()> {
        if self.min == 0 || self.min > self.max {
            return Err(Error::InvalidConfig(format!(
                "{} duration {}..={} must be non-empty and start at 1 or more",
                what, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Speed scale applied to the heading while in each state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedMultipliers {
    pub idle: f64,
    pub cruising: f64,
    pub turning: f64,
    pub startled: f64,
}

impl SpeedMultipliers {
    pub fn get(&self, kind: BehaviorKind) -> f64 {
        match kind {
            BehaviorKind::Idle => self.idle,
            BehaviorKind::Cruising => self.cruising,
            BehaviorKind::Turning => self.turning,
            BehaviorKind::Startled => self.startled,
        }
    }
}

impl Default for SpeedMultipliers {
    fn default() -> Self {
        Self {
            idle: 0.5,
            cruising: 1.0,
            turning: 0.75,
            startled: 2.0,
        }
    }
}

/// How long each state lasts once entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorDurations {
    /// Duration of the IDLE state every new creature starts in
    pub initial_idle: DurationRange,
    pub idle: DurationRange,
    pub cruising: DurationRange,
    pub turning: DurationRange,
    pub startled: DurationRange,
}

impl BehaviorDurations {
    pub fn get(&self, kind: BehaviorKind) -> DurationRange {
        match kind {
            BehaviorKind::Idle => self.idle,
            BehaviorKind::Cruising => self.cruising,
            BehaviorKind::Turning => self.turning,
            BehaviorKind::Startled => self.startled,
        }
    }
}

impl Default for BehaviorDurations {
    fn default() -> Self {
        Self {
            initial_idle: DurationRange::new(3, 8),
            idle: DurationRange::new(4, 12),
            cruising: DurationRange::new(6, 20),
            turning: DurationRange::new(3, 8),
            startled: DurationRange::new(2, 4),
        }
    }
}

/// Tuning shared by every creature's behavior policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub speed: SpeedMultipliers,
    pub durations: BehaviorDurations,
    /// Neighbours closer than this may startle a creature
    pub startle_radius: f64,
    /// Chance per tick of startling while a neighbour is close
    pub startle_chance: f64,
    /// Ticks ahead the policy projects the heading when choosing a new state
    pub lookahead_ticks: u32,
    /// TURNING weight multiplier when the projection leaves the tank or band
    pub turning_boost: u32,
    /// Chance a new TURNING target heads for the shared point of interest
    pub school_chance: f64,
    /// Ticks between point-of-interest refreshes
    pub poi_interval: u64,
}

impl BehaviorConfig {
    pub fn validate(&self) -> Result<()> {
        let speed = self.speed;
        if !(speed.startled > 1.0) {
            return Err(Error::InvalidConfig(
                "startled speed multiplier must be greater than 1".into(),
            ));
        }
        if !(speed.idle > 0.0 && speed.idle <= 1.0)
            || !(speed.turning > 0.0 && speed.turning <= 1.0)
        {
            return Err(Error::InvalidConfig(
                "idle and turning speed multipliers must be within (0, 1]".into(),
            ));
        }
        if !(speed.cruising > 0.0) {
            return Err(Error::InvalidConfig(
                "cruising speed multiplier must be positive".into(),
            ));
        }

        self.durations.initial_idle.validate("initial idle")?;
        for kind in BehaviorKind::all() {
            self.durations.get(kind).validate(&kind.to_string())?;
        }

        if !(self.startle_radius >= 0.0) {
            return Err(Error::InvalidConfig("startle_radius must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.startle_chance)
            || !(0.0..=1.0).contains(&self.school_chance)
        {
            return Err(Error::InvalidConfig(
                "startle_chance and school_chance must be within 0..=1".into(),
            ));
        }
        if self.lookahead_ticks == 0 {
            return Err(Error::InvalidConfig("lookahead_ticks must be at least 1".into()));
        }
        if self.poi_interval == 0 {
            return Err(Error::InvalidConfig("poi_interval must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            speed: SpeedMultipliers::default(),
            durations: BehaviorDurations::default(),
            startle_radius: 1.5,
            startle_chance: 0.35,
            lookahead_ticks: 4,
            turning_boost: 4,
            school_chance: 0.3,
            poi_interval: 200,
        }
    }
}

/// Food particle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    pub glyph: String,
    pub pigments: Vec<u8>,
    /// How far a creature notices food
    pub sight_radius: f64,
    /// How close a creature must get to eat
    pub eat_radius: f64,
}

impl FoodConfig {
    pub fn validate(&self) -> Result<()> {
        if self.glyph.is_empty() {
            return Err(Error::InvalidConfig("food glyph is empty".into()));
        }
        if !(self.sight_radius >= 0.0) || !(self.eat_radius >= 0.0) {
            return Err(Error::InvalidConfig("food radii must not be negative".into()));
        }
        Ok(())
    }
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            glyph: "#".to_string(),
            pigments: vec![255, 250, 241],
            sight_radius: 5.0,
            eat_radius: 1.0,
        }
    }
}

/// Creatures stocked when the simulation starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub species: String,
    pub count: usize,
}

/// Creatures of each species stocked when a config leaves out `population`
pub const DEFAULT_STOCK_PER_SPECIES: usize = 5;

/// A fixed number of creatures of every species in `species`
pub fn stock_each(species: &[SpeciesConfig], count: usize) -> Vec<PopulationConfig> {
    species
        .iter()
        .map(|s| PopulationConfig {
            species: s.name.clone(),
            count,
        })
        .collect()
}

/// Full simulation configuration.
///
/// A missing `population` stocks [`DEFAULT_STOCK_PER_SPECIES`] of every
/// species in the config's own catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SimulationConfigFile")]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    pub tank: TankConfig,
    pub species: Vec<SpeciesConfig>,
    pub behavior: BehaviorConfig,
    pub food: FoodConfig,
    pub population: Vec<PopulationConfig>,
}

/// On-disk shape of [`SimulationConfig`]
#[derive(Deserialize)]
#[serde(default)]
struct SimulationConfigFile {
    seed: u64,
    tank: TankConfig,
    species: Vec<SpeciesConfig>,
    behavior: BehaviorConfig,
    food: FoodConfig,
    population: Option<Vec<PopulationConfig>>,
}

impl Default for SimulationConfigFile {
    fn default() -> Self {
        Self {
            seed: 0,
            tank: TankConfig::default(),
            species: default_species(),
            behavior: BehaviorConfig::default(),
            food: FoodConfig::default(),
            population: None,
        }
    }
}

impl From<SimulationConfigFile> for SimulationConfig {
    fn from(file: SimulationConfigFile) -> Self {
        let population = file
            .population
            .unwrap_or_else(|| stock_each(&file.species, DEFAULT_STOCK_PER_SPECIES));
        Self {
            seed: file.seed,
            tank: file.tank,
            species: file.species,
            behavior: file.behavior,
            food: file.food,
            population,
        }
    }
}

impl SimulationConfig {
    /// An empty tank of the given size stocked with nothing
    pub fn empty(width: i32, height: i32) -> Self {
        Self {
            tank: TankConfig {
                width,
                height,
                ..Default::default()
            },
            population: Vec::new(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check everything except the tank dimensions, which the tank itself
    /// rejects on construction.
    pub fn validate(&self) -> Result<()> {
        if self.tank.background.chars().count() != 1 {
            return Err(Error::InvalidConfig(format!(
                "background glyph '{}' must be a single character",
                self.tank.background
            )));
        }
        self.behavior.validate()?;
        self.food.validate()?;

        let catalog = SpeciesCatalog::new(self.species.clone())?;
        for entry in &self.population {
            catalog.get(&entry.species)?;
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfigFile::default().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = SimulationConfig::default();
        assert_eq!(config.tank.width, 65);
        assert_eq!(config.tank.height, 30);
        assert_eq!(config.species.len(), 3);
        assert_eq!(config.population.iter().map(|p| p.count).sum::<usize>(), 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "seed": 42,
            "tank": { "width": 10, "height": 5 },
            "species": [ { "name": "goldfish", "glyph": "o", "max_speed": 1.0 } ],
            "population": [ { "species": "goldfish", "count": 2 } ]
        }"#;

        let config = SimulationConfig::from_json(json).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.tank.width, 10);
        assert_eq!(config.tank.background, " ");
        assert_eq!(config.species[0].turn_rate, 0.35);
        assert_eq!(config.behavior.speed.startled, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_species_only_json_stocks_its_own_species() {
        let json = r#"{
            "species": [ { "name": "shark", "glyph": "S", "max_speed": 1.5 } ]
        }"#;

        let config = SimulationConfig::from_json(json).unwrap();
        assert_eq!(config.population.len(), 1);
        assert_eq!(config.population[0].species, "shark");
        assert_eq!(config.population[0].count, DEFAULT_STOCK_PER_SPECIES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_empty_population_is_kept() {
        let config = SimulationConfig::from_json(r#"{ "population": [] }"#).unwrap();
        assert!(config.population.is_empty());

        let config = SimulationConfig::from_json("{}").unwrap();
        assert_eq!(config.population.iter().map(|p| p.count).sum::<usize>(), 15);
    }

    #[test]
    fn test_json_round_trip_keeps_weights() {
        let config = SimulationConfig::default();
        let json = config.to_json_pretty().unwrap();
        let parsed = SimulationConfig::from_json(&json).unwrap();
        assert_eq!(parsed.species[0].weights, config.species[0].weights);
        assert_eq!(parsed.behavior.durations, config.behavior.durations);
    }

    #[test]
    fn test_population_must_reference_catalog() {
        let mut config = SimulationConfig::default();
        config.population.push(PopulationConfig {
            species: "shark".into(),
            count: 1,
        });
        assert_eq!(
            config.validate().unwrap_err(),
            Error::UnknownSpecies("shark".into())
        );
    }

    #[test]
    fn test_catalog_rejects_duplicates_and_bad_species() {
        let dup = vec![
            SpeciesConfig::new("goldfish", "o", 1.0),
            SpeciesConfig::new("goldfish", "O", 1.0),
        ];
        assert!(matches!(SpeciesCatalog::new(dup), Err(Error::InvalidConfig(_))));

        let slow = vec![SpeciesConfig::new("rock", "@", 0.0)];
        assert!(matches!(SpeciesCatalog::new(slow), Err(Error::InvalidConfig(_))));

        let inverted = vec![SpeciesConfig::new("eel", "~", 1.0).with_depth_band(0.8, 0.2)];
        assert!(matches!(SpeciesCatalog::new(inverted), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = SpeciesCatalog::new(default_species()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("goldfish").unwrap().glyph, "o");
        assert_eq!(
            catalog.get("shark").unwrap_err(),
            Error::UnknownSpecies("shark".into())
        );
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["goldfish", "loach", "minnow"]);
    }

    #[test]
    fn test_behavior_validation() {
        let mut behavior = BehaviorConfig::default();
        behavior.speed.startled = 1.0;
        assert!(behavior.validate().is_err());

        let mut behavior = BehaviorConfig::default();
        behavior.durations.startled = DurationRange::new(0, 3);
        assert!(behavior.validate().is_err());

        let mut behavior = BehaviorConfig::default();
        behavior.speed.idle = 1.5;
        assert!(behavior.validate().is_err());
    }

    #[test]
    fn test_background_is_one_character() {
        let mut config = SimulationConfig::empty(10, 5);
        config.tank.background = "~~".into();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        config.tank.background = "~".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_depth_band_rows() {
        let band = DepthBand::new(0.5, 1.0);
        assert_eq!(band.rows(11), (5.0, 10.0));
        assert!(band.contains_row(7.0, 11));
        assert!(!band.contains_row(4.0, 11));
    }
}
