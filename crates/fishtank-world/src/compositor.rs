//! Projects the tank contents onto a frame of cells.
//!
//! A glyph is laid out left to right starting at the creature's nearest
//! cell, one character per cell, and clipped at the right wall. Where two
//! glyphs claim the same cell the lowest creature id wins; any creature
//! beats food, and among food the lowest food id wins.

use crate::creature::Creature;
use crate::food::Food;
use crate::frame::Frame;
use crate::tank::Tank;
use fishtank_core::{Cell, Result, SpeciesCatalog, StyleRef, Vec2};

/// Builds frames. Holds only the glyphs it draws with.
#[derive(Debug, Clone)]
pub struct Compositor {
    background: Cell,
    food_glyph: String,
}

impl Compositor {
    pub fn new(background: &str, food_glyph: &str) -> Self {
        Self {
            background: Cell::background(background),
            food_glyph: food_glyph.to_string(),
        }
    }

    /// Render one frame. Fails only if a creature's species is missing
    /// from the catalog.
    pub fn compose<'a>(
        &self,
        tank: &Tank,
        catalog: &SpeciesCatalog,
        creatures: impl IntoIterator<Item = &'a Creature>,
        food: impl IntoIterator<Item = &'a Food>,
        tick: u64,
    ) -> Result<Frame> {
        let mut frame = Frame::filled(tank.width(), tank.height(), &self.background, tick);

        // Highest id first so the lowest id is painted last
        let mut food: Vec<&Food> = food.into_iter().collect();
        food.sort_by(|a, b| b.id.cmp(&a.id));
        for particle in food {
            paint(&mut frame, tank, particle.position, &self.food_glyph, particle.style);
        }

        let mut creatures: Vec<&Creature> = creatures.into_iter().collect();
        creatures.sort_by(|a, b| b.id.cmp(&a.id));
        for creature in creatures {
            let species = catalog.get(&creature.species)?;
            let glyph = if creature.facing_left() {
                mirror_glyph(&species.glyph)
            } else {
                species.glyph.clone()
            };
            paint(&mut frame, tank, creature.position, &glyph, creature.style);
        }

        Ok(frame)
    }
}

fn paint(frame: &mut Frame, tank: &Tank, position: Vec2, glyph: &str, style: Option<StyleRef>) {
    let (x, y) = tank.cell_of(position);
    for (offset, ch) in glyph.chars().enumerate() {
        frame.set(x + offset, y, Cell::styled(ch.encode_utf8(&mut [0; 4]), style));
    }
}

/// Reverse a glyph so it faces the other way, swapping directional pairs
pub fn mirror_glyph(glyph: &str) -> String {
    glyph
        .chars()
        .rev()
        .map(|ch| match ch {
            '<' => '>',
            '>' => '<',
            '[' => ']',
            ']' => '[',
            '{' => '}',
            '}' => '{',
            '(' => ')',
            ')' => '(',
            '/' => '\\',
            '\\' => '/',
            'd' => 'b',
            'b' => 'd',
            'q' => 'p',
            'p' => 'q',
            other => other,
        })
        .collect()
}
