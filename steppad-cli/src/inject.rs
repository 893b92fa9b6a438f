//! Synthesized keyboard events via a uinput virtual device.

use anyhow::{Context, Result};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};

use steppad_proto::Tile;

/// Consumes discrete press/release commands.
///
/// The edge tracker guarantees strict press/release alternation per tile,
/// so an injector never sees a double press or a stray release.
pub trait InputInjector {
    fn press(&mut self, tile: Tile) -> Result<()>;
    fn release(&mut self, tile: Tile) -> Result<()>;
}

/// Arrow key carried by each tile.
fn tile_key(tile: Tile) -> Key {
    match tile {
        Tile::Up => Key::KEY_UP,
        Tile::Right => Key::KEY_RIGHT,
        Tile::Down => Key::KEY_DOWN,
        Tile::Left => Key::KEY_LEFT,
    }
}

/// Injects arrow key events system-wide through `/dev/uinput`.
pub struct UinputInjector {
    device: VirtualDevice,
}

impl UinputInjector {
    pub fn new() -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for tile in Tile::ALL {
            keys.insert(tile_key(tile));
        }

        let device = VirtualDeviceBuilder::new()
            .context("opening /dev/uinput (missing permissions?)")?
            .name("steppad virtual keyboard")
            .with_keys(&keys)
            .context("registering arrow keys")?
            .build()
            .context("creating uinput device")?;

        Ok(Self { device })
    }

    fn emit(&mut self, tile: Tile, value: i32) -> Result<()> {
        let event = InputEvent::new(EventType::KEY, tile_key(tile).code(), value);
        self.device
            .emit(&[event])
            .with_context(|| format!("injecting key event for tile {}", tile.label()))?;
        Ok(())
    }
}

impl InputInjector for UinputInjector {
    fn press(&mut self, tile: Tile) -> Result<()> {
        self.emit(tile, 1)
    }

    fn release(&mut self, tile: Tile) -> Result<()> {
        self.emit(tile, 0)
    }
}
