//! Dance pad firmware for the Raspberry Pi Pico (RP2040).
//!
//! Scans the 3×12 pad matrix, OR-reduces the columns into the four
//! directional tiles and reports tile state changes as `STATE:` lines
//! over USB serial. One strictly sequential loop, no interrupts beyond
//! what the HAL needs; the loop runs until power-off.

#![no_std]
#![no_main]

mod link;

use embedded_hal::delay::DelayNs;
use rp2040_hal as hal;

use hal::gpio::{DynPinId, FunctionSio, InOutPin, Pin, PullUp, SioInput};
use hal::pac;
use usb_device::class_prelude::UsbBusAllocator;

use link::UsbSerialLink;
use steppad_proto::scan::MatrixScanner;
use steppad_proto::{ChangeEncoder, TileVector};

/// Second-stage bootloader, checksummed and run by the RP2040 boot ROM.
#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

/// External crystal frequency on the Pico board.
const XTAL_FREQ_HZ: u32 = 12_000_000;

/// Pause between scan cycles.
const SCAN_PERIOD_MS: u32 = 1;

/// Settle time after driving a strobe row low, in microseconds. Covers
/// line capacitance and pull-up transients on this pad's wiring.
const SETTLE_DELAY_US: u32 = 30;

/// Panic handler — just hang; there is nowhere to report to.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

/// Sense column pin: input with pull-up, read active-low.
type ColPin = Pin<DynPinId, FunctionSio<SioInput>, PullUp>;

#[hal::entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(pac.IO_BANK0, pac.PADS_BANK0, sio.gpio_bank0, &mut pac.RESETS);
    let mut timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Strobe rows on GP0-GP2. Open-drain so an idle row floats against the
    // column pull-ups instead of fighting the strobed one.
    let rows = [
        InOutPin::new(pins.gpio0),
        InOutPin::new(pins.gpio1),
        InOutPin::new(pins.gpio2),
    ];

    // Sense columns on GP3-GP14, three per tile in UP,RIGHT,DOWN,LEFT order.
    let cols: [ColPin; steppad_proto::COLS] = [
        pins.gpio3.into_pull_up_input().into_dyn_pin(),
        pins.gpio4.into_pull_up_input().into_dyn_pin(),
        pins.gpio5.into_pull_up_input().into_dyn_pin(),
        pins.gpio6.into_pull_up_input().into_dyn_pin(),
        pins.gpio7.into_pull_up_input().into_dyn_pin(),
        pins.gpio8.into_pull_up_input().into_dyn_pin(),
        pins.gpio9.into_pull_up_input().into_dyn_pin(),
        pins.gpio10.into_pull_up_input().into_dyn_pin(),
        pins.gpio11.into_pull_up_input().into_dyn_pin(),
        pins.gpio12.into_pull_up_input().into_dyn_pin(),
        pins.gpio13.into_pull_up_input().into_dyn_pin(),
        pins.gpio14.into_pull_up_input().into_dyn_pin(),
    ];

    let usb_bus = UsbBusAllocator::new(hal::usb::UsbBus::new(
        pac.USBCTRL_REGS,
        pac.USBCTRL_DPRAM,
        clocks.usb_clock,
        true,
        &mut pac.RESETS,
    ));
    let mut usb = UsbSerialLink::new(&usb_bus);

    let mut scanner = MatrixScanner::new(rows, cols, SETTLE_DELAY_US);
    let mut encoder = ChangeEncoder::new();

    loop {
        // Keep enumeration and host traffic serviced
        usb.poll();

        let columns = scanner.scan(&mut timer);
        let vector = TileVector::from_columns(&columns);

        if let Some(msg) = encoder.encode_if_changed(vector) {
            usb.send(&msg);
        }

        timer.delay_ms(SCAN_PERIOD_MS);
    }
}
