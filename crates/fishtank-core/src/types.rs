//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Unique identifier for a creature in a tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CreatureId(pub u64);

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for a food particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FoodId(pub u64);

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "food#{}", self.0)
    }
}

/// 2D vector in cell units. Used for both positions and per-tick headings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector of the given length pointing along `angle` (radians)
    pub fn from_angle(angle: f64, length: f64) -> Self {
        Self::new(angle.cos() * length, angle.sin() * length)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= 1e-9 {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    pub fn clamp_length(self, max_len: f64) -> Self {
        let len = self.length();
        if len > max_len {
            self.normalized() * max_len
        } else {
            self
        }
    }

    /// Rotate toward `target` (radians), turning at most `max_step` radians.
    /// Length is preserved.
    pub fn rotate_toward(self, target: f64, max_step: f64) -> Self {
        let current = self.angle();
        let step = wrap_angle(target - current).clamp(-max_step, max_step);
        Self::from_angle(current + step, self.length())
    }
}

/// Wrap an angle into `(-PI, PI]`
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// The four behavior states a creature can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    Idle,
    Cruising,
    Turning,
    Startled,
}

impl BehaviorKind {
    pub fn all() -> [BehaviorKind; 4] {
        [
            BehaviorKind::Idle,
            BehaviorKind::Cruising,
            BehaviorKind::Turning,
            BehaviorKind::Startled,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            BehaviorKind::Idle => 0,
            BehaviorKind::Cruising => 1,
            BehaviorKind::Turning => 2,
            BehaviorKind::Startled => 3,
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BehaviorKind::Idle => "IDLE",
            BehaviorKind::Cruising => "CRUISING",
            BehaviorKind::Turning => "TURNING",
            BehaviorKind::Startled => "STARTLED",
        };
        f.write_str(name)
    }
}

/// Opaque style reference handed to the renderer (a pigment/palette index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRef(pub u8);

/// One renderable cell of a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub glyph: String,
    pub style: Option<StyleRef>,
}

impl Cell {
    pub fn background(glyph: &str) -> Self {
        Self {
            glyph: glyph.to_string(),
            style: None,
        }
    }

    pub fn styled(glyph: &str, style: Option<StyleRef>) -> Self {
        Self {
            glyph: glyph.to_string(),
            style,
        }
    }
}
