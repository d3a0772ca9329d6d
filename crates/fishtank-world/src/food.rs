//! Food particles that sink through the tank and settle on the bottom.

use crate::tank::Tank;
use fishtank_core::{FoodId, StyleRef, Vec2};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: FoodId,
    pub position: Vec2,
    pub style: Option<StyleRef>,
    /// Settled food never moves again
    pub settled: bool,
    previous_dx: i32,
}

impl Food {
    pub fn new(id: FoodId, position: Vec2, style: Option<StyleRef>) -> Self {
        Self {
            id,
            position,
            style,
            settled: false,
            previous_dx: 0,
        }
    }

    /// Sink one step. A sideways wobble only follows a tick without one.
    /// The particle settles on the bottom row or on top of settled food.
    pub fn drift(
        &mut self,
        tank: &Tank,
        settled_cells: &BTreeSet<(usize, usize)>,
        rng: &mut ChaCha8Rng,
    ) {
        if self.settled {
            return;
        }
        if tank.cell_of(self.position).1 + 1 >= tank.height() {
            self.settled = true;
            return;
        }

        let dx = if self.previous_dx == 0 {
            rng.gen_range(-1i32..=1)
        } else {
            0
        };
        // Sinks on roughly one tick in three
        let dy = if rng.gen_range(0..3) == 2 { 1.0 } else { 0.0 };

        let next = tank.clamp(self.position + Vec2::new(f64::from(dx), dy));
        if settled_cells.contains(&tank.cell_of(next)) {
            self.settled = true;
            return;
        }

        self.position = next;
        self.previous_dx = dx;
    }
}
