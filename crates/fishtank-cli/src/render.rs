//! Terminal painting with crossterm.

use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use fishtank_core::StyleRef;
use fishtank_world::Frame;
use std::io::{self, Stdout, Write};

/// Owns the alternate screen for as long as it lives
pub struct Painter {
    out: Stdout,
    run: String,
    rows_drawn: usize,
}

impl Painter {
    pub fn enter() -> io::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )?;
        Ok(Self {
            out,
            run: String::new(),
            rows_drawn: 0,
        })
    }

    /// Draw a frame at the top left with the status line beneath it
    pub fn paint(&mut self, frame: &Frame, status: &str) -> io::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if frame.height() != self.rows_drawn {
            queue!(self.out, Clear(ClearType::All))?;
            self.rows_drawn = frame.height();
        }

        for (y, row) in frame.rows().enumerate() {
            queue!(self.out, cursor::MoveTo(0, y as u16), ResetColor)?;
            let mut current: Option<StyleRef> = None;
            self.run.clear();

            for cell in row {
                if cell.style != current {
                    if !self.run.is_empty() {
                        queue!(self.out, Print(&self.run))?;
                        self.run.clear();
                    }
                    queue!(self.out, SetForegroundColor(color_for(cell.style)))?;
                    current = cell.style;
                }
                self.run.push_str(&cell.glyph);
            }
            if !self.run.is_empty() {
                queue!(self.out, Print(&self.run))?;
            }
        }

        queue!(
            self.out,
            ResetColor,
            cursor::MoveTo(0, frame.height() as u16),
            Clear(ClearType::CurrentLine),
            Print(status),
            EndSynchronizedUpdate
        )?;
        self.out.flush()
    }
}

impl Drop for Painter {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
    }
}

/// Pigments are 256-colour palette indices
pub fn color_for(style: Option<StyleRef>) -> Color {
    match style {
        Some(StyleRef(index)) => Color::AnsiValue(index),
        None => Color::Reset,
    }
}

pub fn status_line(tick: u64, creatures: usize, food: usize, seed: u64) -> String {
    format!(
        "tick {}  fish {}  food {}  seed {}  (Ctrl-C quits)",
        tick, creatures, food, seed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_for_pigment() {
        assert_eq!(color_for(Some(StyleRef(34))), Color::AnsiValue(34));
        assert_eq!(color_for(None), Color::Reset);
    }

    #[test]
    fn test_status_line() {
        let status = status_line(120, 15, 2, 7);
        assert!(status.starts_with("tick 120  fish 15  food 2  seed 7"));
    }
}
