//! The bounded 2D space creatures swim in.

use fishtank_core::{DepthBand, Error, Result, Vec2};
use serde::{Deserialize, Serialize};

/// Fixed-size tank. Sole authority on whether a position is legal.
///
/// Positions are in cell units and the legal region is the hull of the cell
/// centres, `0..=width-1` by `0..=height-1`, so every legal position rounds
/// to a real cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tank {
    width: usize,
    height: usize,
}

impl Tank {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            width: width as usize,
            height: height as usize,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    fn max_x(&self) -> f64 {
        (self.width - 1) as f64
    }

    fn max_y(&self) -> f64 {
        (self.height - 1) as f64
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= 0.0
            && position.x <= self.max_x()
            && position.y >= 0.0
            && position.y <= self.max_y()
    }

    /// Bring a proposed position back inside the tank. Each violated axis is
    /// clamped to the nearest legal coordinate and that axis of the heading is
    /// negated, so the creature bounces off the wall.
    pub fn clamp_or_reflect(&self, position: Vec2, heading: Vec2) -> (Vec2, Vec2) {
        let mut position = position;
        let mut heading = heading;

        if position.x < 0.0 || position.x > self.max_x() {
            position.x = position.x.clamp(0.0, self.max_x());
            heading.x = -heading.x;
        }
        if position.y < 0.0 || position.y > self.max_y() {
            position.y = position.y.clamp(0.0, self.max_y());
            heading.y = -heading.y;
        }

        (position, heading)
    }

    /// Clamp without touching any heading
    pub fn clamp(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x.clamp(0.0, self.max_x()),
            position.y.clamp(0.0, self.max_y()),
        )
    }

    /// Nearest cell `(column, row)` to a position
    pub fn cell_of(&self, position: Vec2) -> (usize, usize) {
        let clamped = self.clamp(position);
        (clamped.x.round() as usize, clamped.y.round() as usize)
    }

    /// Whether moving `ticks` steps along `displacement` leaves the tank
    pub fn path_leaves(&self, position: Vec2, displacement: Vec2, ticks: u32) -> bool {
        !self.contains(position + displacement * f64::from(ticks))
    }

    /// Row range `(top, bottom)` of a depth band in this tank
    pub fn band_rows(&self, band: &DepthBand) -> (f64, f64) {
        band.rows(self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.max_x() / 2.0, self.max_y() / 2.0)
    }
}
