//! Edge-triggered key state tracking.
//!
//! Each tile is a two-state machine (Released ⇄ Pressed) driven only by
//! changed booleans in validated vectors. The tracker also remembers the
//! last applied vector so the display is refreshed exactly once per
//! distinct state.

use anyhow::Result;

use steppad_proto::{Tile, TileVector, TILE_COUNT};

use crate::display::DisplayAdapter;
use crate::inject::InputInjector;

/// A discrete command for the input injector.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum KeyCommand {
    Press(Tile),
    Release(Tile),
}

/// What one validated vector requires of the collaborators.
pub struct Update {
    /// The vector differs from the last applied one; redraw the display.
    pub refresh_display: bool,
    /// Press/release commands, at most one per tile.
    pub commands: Vec<KeyCommand>,
}

/// Owns the per-tile key hold state and the last applied vector. Nothing
/// else reads or writes either.
pub struct EdgeTracker {
    held: [bool; TILE_COUNT],
    last_applied: Option<TileVector>,
}

impl EdgeTracker {
    /// All tiles start Released, with no vector applied yet.
    pub fn new() -> Self {
        Self {
            held: [false; TILE_COUNT],
            last_applied: None,
        }
    }

    /// Apply one validated vector.
    ///
    /// Display phase first: refresh iff the vector differs from the last
    /// applied one. Then the independent per-tile edge phase: a rising
    /// edge yields a press, a falling edge a release, a steady tile
    /// nothing. A duplicate vector therefore produces neither a refresh
    /// nor any command.
    pub fn apply(&mut self, vector: TileVector) -> Update {
        let refresh_display = self.last_applied != Some(vector);
        if refresh_display {
            self.last_applied = Some(vector);
        }

        let mut commands = Vec::new();
        for tile in Tile::ALL {
            let now = vector.get(tile);
            let was = self.held[tile.index()];
            if now && !was {
                commands.push(KeyCommand::Press(tile));
                self.held[tile.index()] = true;
            } else if !now && was {
                commands.push(KeyCommand::Release(tile));
                self.held[tile.index()] = false;
            }
        }

        Update {
            refresh_display,
            commands,
        }
    }

    /// Tiles whose key is currently held down; used to release everything
    /// on shutdown.
    pub fn held_tiles(&self) -> Vec<Tile> {
        Tile::ALL
            .iter()
            .copied()
            .filter(|tile| self.held[tile.index()])
            .collect()
    }
}

/// Drive both collaborators for one validated vector.
///
/// The display refresh is issued before any key command for the same
/// vector; that ordering is observable and tested.
pub fn apply_vector(
    tracker: &mut EdgeTracker,
    vector: TileVector,
    display: &mut impl DisplayAdapter,
    injector: &mut impl InputInjector,
) -> Result<()> {
    let update = tracker.apply(vector);

    if update.refresh_display {
        display.render(vector)?;
    }
    for command in update.commands {
        match command {
            KeyCommand::Press(tile) => injector.press(tile)?,
            KeyCommand::Release(tile) => injector.release(tile)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::FrameDecoder;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Call log shared by both mock collaborators, so tests can assert
    /// ordering across them.
    type Log = Rc<RefCell<Vec<String>>>;

    struct LogDisplay(Log);

    impl DisplayAdapter for LogDisplay {
        fn render(&mut self, vector: TileVector) -> Result<()> {
            let bits: String = vector
                .as_array()
                .iter()
                .map(|&b| if b { '1' } else { '0' })
                .collect();
            self.0.borrow_mut().push(format!("display:{bits}"));
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.0.borrow_mut().push("clear".to_string());
            Ok(())
        }
    }

    struct LogInjector(Log);

    impl InputInjector for LogInjector {
        fn press(&mut self, tile: Tile) -> Result<()> {
            self.0.borrow_mut().push(format!("press:{}", tile.label()));
            Ok(())
        }

        fn release(&mut self, tile: Tile) -> Result<()> {
            self.0.borrow_mut().push(format!("release:{}", tile.label()));
            Ok(())
        }
    }

    fn v(bits: [u8; 4]) -> TileVector {
        TileVector::from_array(bits.map(|b| b == 1))
    }

    #[test]
    fn test_single_press_and_release_edge() {
        let mut tracker = EdgeTracker::new();
        tracker.apply(v([0, 0, 0, 0]));

        let up = tracker.apply(v([1, 0, 0, 0]));
        assert_eq!(up.commands, vec![KeyCommand::Press(Tile::Up)]);

        let down = tracker.apply(v([0, 0, 0, 0]));
        assert_eq!(down.commands, vec![KeyCommand::Release(Tile::Up)]);
    }

    #[test]
    fn test_no_double_press_without_release() {
        let mut tracker = EdgeTracker::new();
        assert_eq!(
            tracker.apply(v([1, 0, 0, 0])).commands,
            vec![KeyCommand::Press(Tile::Up)]
        );
        // Same tile still pressed in later distinct vectors: no new press
        assert_eq!(
            tracker.apply(v([1, 1, 0, 0])).commands,
            vec![KeyCommand::Press(Tile::Right)]
        );
        assert_eq!(
            tracker.apply(v([1, 0, 0, 0])).commands,
            vec![KeyCommand::Release(Tile::Right)]
        );
    }

    #[test]
    fn test_duplicate_vector_is_inert() {
        let mut tracker = EdgeTracker::new();
        let first = tracker.apply(v([0, 1, 0, 0]));
        assert!(first.refresh_display);
        assert_eq!(first.commands, vec![KeyCommand::Press(Tile::Right)]);

        // Retransmitted line: no refresh, no commands
        let dup = tracker.apply(v([0, 1, 0, 0]));
        assert!(!dup.refresh_display);
        assert!(dup.commands.is_empty());
    }

    #[test]
    fn test_first_vector_refreshes_even_when_all_released() {
        let mut tracker = EdgeTracker::new();
        let update = tracker.apply(v([0, 0, 0, 0]));
        assert!(update.refresh_display);
        assert!(update.commands.is_empty());
    }

    #[test]
    fn test_display_precedes_key_commands() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut display = LogDisplay(log.clone());
        let mut injector = LogInjector(log.clone());
        let mut tracker = EdgeTracker::new();

        apply_vector(&mut tracker, v([1, 0, 0, 1]), &mut display, &mut injector).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["display:1001", "press:U", "press:L"]
        );
    }

    #[test]
    fn test_held_tiles_reports_outstanding_keys() {
        let mut tracker = EdgeTracker::new();
        tracker.apply(v([1, 0, 0, 1]));
        tracker.apply(v([0, 0, 0, 1]));
        assert_eq!(tracker.held_tiles(), vec![Tile::Left]);
    }

    #[test]
    fn test_end_to_end_wire_sequence() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut display = LogDisplay(log.clone());
        let mut injector = LogInjector(log.clone());
        let mut tracker = EdgeTracker::new();
        let mut decoder = FrameDecoder::new();

        decoder.push(
            b"STATE:0,0,0,0\nSTATE:1,0,0,0\nSTATE:1,1,0,0\nSTATE:0,1,0,0\nSTATE:0,0,0,0\n",
        );
        while let Some(vector) = decoder.next_vector() {
            apply_vector(&mut tracker, vector, &mut display, &mut injector).unwrap();
        }

        // Every message is distinct from its predecessor, so all five
        // refresh the display; key commands follow their message's refresh.
        assert_eq!(
            *log.borrow(),
            vec![
                "display:0000",
                "display:1000",
                "press:U",
                "display:1100",
                "press:R",
                "display:0100",
                "release:U",
                "display:0000",
                "release:R",
            ]
        );
    }
}
