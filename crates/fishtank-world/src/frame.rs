//! Rendered frames.

use fishtank_core::{Cell, Error};
use serde::{Deserialize, Serialize};

/// Immutable grid of cells produced at the end of a tick. Always at least
/// one cell wide and tall, with exactly `width * height` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FrameData")]
pub struct Frame {
    tick: u64,
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

#[derive(Deserialize)]
struct FrameData {
    tick: u64,
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl TryFrom<FrameData> for Frame {
    type Error = Error;

    fn try_from(data: FrameData) -> Result<Self, Error> {
        if data.width == 0 || data.height == 0 {
            return Err(Error::Serialization(format!(
                "frame must not be empty, got {}x{}",
                data.width, data.height
            )));
        }
        if data.width.checked_mul(data.height) != Some(data.cells.len()) {
            return Err(Error::Serialization(format!(
                "{}x{} frame has {} cells",
                data.width,
                data.height,
                data.cells.len()
            )));
        }
        Ok(Self {
            tick: data.tick,
            width: data.width,
            height: data.height,
            cells: data.cells,
        })
    }
}

impl Frame {
    /// Every cell starts as the background glyph
    pub(crate) fn filled(width: usize, height: usize, background: &Cell, tick: u64) -> Self {
        Self {
            tick,
            width,
            height,
            cells: vec![background.clone(); width * height],
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(self.pos_to_index(x, y))
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            let index = self.pos_to_index(x, y);
            self.cells[index] = cell;
        }
    }

    fn pos_to_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Get `(column, row)` from index
    pub fn index_to_pos(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.width)
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell))
    }

    /// Glyphs only, one string per row
    pub fn lines(&self) -> Vec<String> {
        self.rows()
            .map(|row| row.iter().map(|cell| cell.glyph.as_str()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishtank_core::StyleRef;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::filled(10, 5, &Cell::background("."), 3);
        assert_eq!(frame.width(), 10);
        assert_eq!(frame.height(), 5);
        assert_eq!(frame.tick(), 3);
        assert_eq!(frame.cells().len(), 50);
        assert!(frame.cells().iter().all(|cell| cell.glyph == "."));
    }

    #[test]
    fn test_get_and_set() {
        let mut frame = Frame::filled(4, 3, &Cell::background(" "), 0);
        frame.set(3, 2, Cell::styled("o", Some(StyleRef(34))));

        assert_eq!(frame.get(3, 2).unwrap().glyph, "o");
        assert_eq!(frame.get(3, 2).unwrap().style, Some(StyleRef(34)));
        assert!(frame.get(4, 0).is_none());
        assert!(frame.get(0, 3).is_none());

        // Out of range writes are ignored
        frame.set(9, 9, Cell::background("x"));
        assert_eq!(frame.cells().len(), 12);
    }

    #[test]
    fn test_rows_and_lines() {
        let mut frame = Frame::filled(3, 2, &Cell::background("."), 0);
        frame.set(1, 0, Cell::background(">"));
        frame.set(2, 1, Cell::background("o"));

        assert_eq!(frame.rows().count(), 2);
        assert_eq!(frame.lines(), vec![".>.".to_string(), "..o".to_string()]);
    }

    #[test]
    fn test_frame_serializes() {
        let mut frame = Frame::filled(2, 1, &Cell::background(" "), 12);
        frame.set(0, 0, Cell::styled("o", Some(StyleRef(70))));

        let json = serde_json::to_string(&frame).unwrap();
        let parsed: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_malformed_frame_is_rejected() {
        let empty = r#"{ "tick": 0, "width": 0, "height": 3, "cells": [] }"#;
        assert!(serde_json::from_str::<Frame>(empty).is_err());

        let short = r#"{ "tick": 0, "width": 2, "height": 2,
            "cells": [ { "glyph": " ", "style": null } ] }"#;
        assert!(serde_json::from_str::<Frame>(short).is_err());

        let ok = r#"{ "tick": 4, "width": 1, "height": 1,
            "cells": [ { "glyph": "o", "style": 34 } ] }"#;
        let frame: Frame = serde_json::from_str(ok).unwrap();
        assert_eq!(frame.lines(), vec!["o".to_string()]);
    }

    #[test]
    fn test_index_round_trip() {
        let frame = Frame::filled(7, 3, &Cell::background(" "), 0);
        for ((x, y), _) in frame.iter() {
            assert_eq!(frame.pos_to_index(x, y), y * 7 + x);
        }
        assert_eq!(frame.index_to_pos(15), (1, 2));
    }
}
