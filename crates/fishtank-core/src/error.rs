//! Error types for the simulation.

use crate::types::CreatureId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid tank dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    #[error("Duplicate creature identifier: {0}")]
    DuplicateIdentifier(CreatureId),

    #[error("Unknown creature: {0}")]
    UnknownCreature(CreatureId),

    #[error("Position ({x}, {y}) is outside the tank")]
    OutOfBounds { x: f64, y: f64 },

    #[error("Heading ({x}, {y}) is not a finite vector")]
    InvalidHeading { x: f64, y: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
