//! Shared tile definitions, wire protocol and scan logic for the steppad
//! dance pad.
//!
//! This crate is `no_std`-compatible so it can be used by both the RP2040
//! firmware and the native host CLI. It owns the two contracts the halves
//! must agree on — the column-to-tile mapping and the `STATE:` line format —
//! plus the hardware-agnostic matrix scan in [`scan`].

#![no_std]

pub mod scan;

/// Number of strobe rows in the pad matrix.
pub const ROWS: usize = 3;
/// Number of sense columns (3 per tile).
pub const COLS: usize = 12;
/// Number of logical tiles.
pub const TILE_COUNT: usize = 4;

/// One of the four directional tiles a player can step on.
///
/// The discriminant is the tile's index in a [`TileVector`] and in the
/// wire message field order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Tile {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Tile {
    /// All tiles in vector/wire order.
    pub const ALL: [Tile; TILE_COUNT] = [Tile::Up, Tile::Right, Tile::Down, Tile::Left];

    /// Index into a [`TileVector`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-letter label for display surfaces.
    pub const fn label(self) -> &'static str {
        match self {
            Tile::Up => "U",
            Tile::Right => "R",
            Tile::Down => "D",
            Tile::Left => "L",
        }
    }
}

/// Maps each raw column index to the tile it belongs to.
///
/// Every column maps to exactly one tile and every tile owns three
/// consecutive columns, matching the pad wiring (columns on GP3-GP14).
pub const COL_TO_TILE: [Tile; COLS] = [
    Tile::Up, Tile::Up, Tile::Up,
    Tile::Right, Tile::Right, Tile::Right,
    Tile::Down, Tile::Down, Tile::Down,
    Tile::Left, Tile::Left, Tile::Left,
];

/// Pressed/released state of all four tiles, in Up,Right,Down,Left order.
///
/// This is the unit of transport and of change detection on both sides of
/// the link.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TileVector {
    tiles: [bool; TILE_COUNT],
}

impl TileVector {
    /// All tiles released.
    pub const fn released() -> Self {
        Self {
            tiles: [false; TILE_COUNT],
        }
    }

    pub const fn from_array(tiles: [bool; TILE_COUNT]) -> Self {
        Self { tiles }
    }

    /// Reduce a full cycle's per-column samples into tile states.
    ///
    /// A tile is pressed iff at least one of its mapped columns sampled
    /// pressed during the cycle (OR semantics).
    pub fn from_columns(pressed: &[bool; COLS]) -> Self {
        let mut tiles = [false; TILE_COUNT];
        for (col, &hit) in pressed.iter().enumerate() {
            if hit {
                tiles[COL_TO_TILE[col].index()] = true;
            }
        }
        Self { tiles }
    }

    pub fn get(self, tile: Tile) -> bool {
        self.tiles[tile.index()]
    }

    pub fn as_array(self) -> [bool; TILE_COUNT] {
        self.tiles
    }
}

/// Message prefix every state line starts with.
pub const PREFIX: &str = "STATE:";

/// Encoded length of a state line: `STATE:b,b,b,b\n`.
pub const MSG_LEN: usize = PREFIX.len() + 2 * TILE_COUNT;

/// Encode a tile vector as a complete wire line, terminator included.
///
/// The encoding is canonical and fixed-length, so the firmware can emit it
/// without a heap or a formatter.
pub fn encode(vector: TileVector) -> [u8; MSG_LEN] {
    let mut msg = [0u8; MSG_LEN];
    msg[..PREFIX.len()].copy_from_slice(PREFIX.as_bytes());

    let mut at = PREFIX.len();
    for tile in Tile::ALL {
        msg[at] = if vector.get(tile) { b'1' } else { b'0' };
        at += 1;
        msg[at] = b',';
        at += 1;
    }
    // Last separator slot becomes the line terminator
    msg[MSG_LEN - 1] = b'\n';
    msg
}

/// Decode one text line into a tile vector.
///
/// Returns `None` for anything that is not a well-formed state line: wrong
/// prefix, wrong field count. Field values are lenient — `1` means pressed,
/// any other token (including garbage) means released. Malformed input is
/// never an error, just ignored.
pub fn decode_line(line: &str) -> Option<TileVector> {
    let line = line.trim();
    let payload = line.strip_prefix(PREFIX)?;

    let mut tiles = [false; TILE_COUNT];
    let mut fields = 0usize;
    for (i, field) in payload.split(',').enumerate() {
        if i >= TILE_COUNT {
            return None;
        }
        tiles[i] = field == "1";
        fields = i + 1;
    }
    if fields != TILE_COUNT {
        return None;
    }

    Some(TileVector::from_array(tiles))
}

/// Device-side change-only transmit gate.
///
/// Remembers the last vector put on the wire and encodes a new line only
/// when the state actually changed. This is the sole throttle on the
/// serial channel; steady state costs nothing.
pub struct ChangeEncoder {
    last_sent: Option<TileVector>,
}

impl ChangeEncoder {
    /// Nothing sent yet — the first vector always goes out.
    pub const fn new() -> Self {
        Self { last_sent: None }
    }

    /// Encode `vector` as a complete wire line iff it differs from the
    /// last sent vector, updating the single-slot memory on emission.
    pub fn encode_if_changed(&mut self, vector: TileVector) -> Option<[u8; MSG_LEN]> {
        if self.last_sent == Some(vector) {
            return None;
        }
        self.last_sent = Some(vector);
        Some(encode(vector))
    }
}

/// Framing guard for a transport that can accept fewer bytes than offered.
///
/// A USB CDC endpoint (or any bounded TX buffer) may take only a prefix of
/// a line and then block. Left alone, the tail of that line is lost and the
/// receiver fuses the prefix with the next message into one malformed line,
/// dropping a valid state. `LineTx` remembers the truncation and emits a
/// lone terminator before the next line, so the fragment parses as a single
/// discardable line and framing recovers.
pub struct LineTx {
    truncated: bool,
}

impl LineTx {
    pub const fn new() -> Self {
        Self { truncated: false }
    }

    /// Push one complete line through `write`, which returns how many bytes
    /// the transport accepted, or `Err(())` when it can take none.
    ///
    /// From the receiver's point of view this is all-or-nothing: either the
    /// line arrives whole and terminated, or whatever did reach the wire
    /// decodes as one malformed, silently discarded line.
    pub fn send(&mut self, msg: &[u8], mut write: impl FnMut(&[u8]) -> Result<usize, ()>) {
        if self.truncated {
            match write(b"\n") {
                Ok(1) => self.truncated = false,
                // Still blocked: drop this message too, resync later
                _ => return,
            }
        }

        let mut rest = msg;
        while !rest.is_empty() {
            match write(rest) {
                Ok(0) | Err(()) => break,
                Ok(n) => rest = &rest[n.min(rest.len())..],
            }
        }

        // A fully refused line leaves nothing on the wire; only a partial
        // one needs the terminator treatment.
        if !rest.is_empty() && rest.len() < msg.len() {
            self.truncated = true;
        }
    }
}
