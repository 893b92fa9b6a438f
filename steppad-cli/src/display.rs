//! Terminal rendering of the pad state.

use std::io::{Stdout, Write};

use anyhow::Result;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::{cursor, execute, queue, terminal};

use steppad_proto::{Tile, TileVector};

/// Renders the current tile state somewhere visible.
///
/// Called once per distinct validated vector, always before any key
/// command for that vector is issued.
pub trait DisplayAdapter {
    fn render(&mut self, vector: TileVector) -> Result<()>;
    /// Blank the display; issued on shutdown.
    fn clear(&mut self) -> Result<()>;
}

/// Indicator box geometry, in terminal cells.
const BOX_W: u16 = 7;
const BOX_H: u16 = 3;
/// Gap between boxes.
const GAP: u16 = 2;

/// Top-left corner of a tile's box, laid out as a diamond:
/// Up top-center, Left/Right on the middle row, Down bottom-center.
fn box_origin(tile: Tile) -> (u16, u16) {
    let step_x = BOX_W + GAP;
    let step_y = BOX_H + 1;
    match tile {
        Tile::Up => (step_x, 0),
        Tile::Left => (0, step_y),
        Tile::Right => (2 * step_x, step_y),
        Tile::Down => (step_x, 2 * step_y),
    }
}

/// Draws the four labeled indicator boxes onto the alternate screen,
/// pressed tiles in reverse video.
pub struct TerminalDisplay {
    out: Stdout,
}

impl TerminalDisplay {
    /// Switches the terminal to raw mode on the alternate screen and hides
    /// the cursor. `Drop` restores everything, whatever the exit path.
    pub fn new() -> Result<Self> {
        let mut out = std::io::stdout();
        terminal::enable_raw_mode()?;
        execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self { out })
    }

    fn draw_tile(&mut self, tile: Tile, pressed: bool) -> Result<()> {
        let (x, y) = box_origin(tile);
        let inner = (BOX_W - 2) as usize;

        for dy in 0..BOX_H {
            let line = if dy == 0 || dy == BOX_H - 1 {
                format!("+{}+", "-".repeat(inner))
            } else {
                format!("|{:^w$}|", tile.label(), w = inner)
            };

            queue!(self.out, cursor::MoveTo(x, y + dy))?;
            if pressed {
                queue!(
                    self.out,
                    SetAttribute(Attribute::Reverse),
                    Print(line),
                    SetAttribute(Attribute::Reset)
                )?;
            } else {
                queue!(self.out, Print(line))?;
            }
        }
        Ok(())
    }
}

impl DisplayAdapter for TerminalDisplay {
    fn render(&mut self, vector: TileVector) -> Result<()> {
        for tile in Tile::ALL {
            self.draw_tile(tile, vector.get(tile))?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        execute!(self.out, terminal::Clear(terminal::ClearType::All))?;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
