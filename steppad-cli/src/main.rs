mod decoder;
mod display;
mod edge;
mod inject;

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use decoder::FrameDecoder;
use display::{DisplayAdapter, TerminalDisplay};
use edge::EdgeTracker;
use inject::{InputInjector, UinputInjector};
use steppad_proto::TileVector;

#[derive(Parser)]
#[command(name = "steppad-cli")]
#[command(about = "Host-side visualizer and key injector for the steppad dance pad")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mirror pad state onto the terminal and synthesized arrow keys
    Run {
        /// Serial device the pad is connected to
        #[arg(long, default_value = "/dev/ttyACM0")]
        port: String,
        /// Baud rate of the link
        #[arg(long, default_value_t = 115_200)]
        baud: u32,
    },
    /// List serial ports where a pad might be connected
    Detect,
}

/// Idle sleep per tick, bounding CPU use while the link is quiet.
const IDLE_SLEEP: Duration = Duration::from_millis(5);
/// Upper bound on a single link read.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { port, baud } => run(&port, baud),
        Command::Detect => detect(),
    }
}

fn run(port: &str, baud: u32) -> Result<()> {
    println!("Connecting to pad on {} @ {} baud...", port, baud);
    let mut link = serialport::new(port, baud)
        .timeout(READ_TIMEOUT)
        .open()
        .with_context(|| format!("opening {} (check the cable and port)", port))?;
    link.clear(serialport::ClearBuffer::Input)
        .context("flushing stale link input")?;

    let mut injector = UinputInjector::new()?;
    let mut tracker = EdgeTracker::new();
    println!("Connected. Waiting for steps... (q to quit)");

    // Raw mode starts here; everything after must funnel through the
    // cleanup below, errors included.
    let mut display = TerminalDisplay::new()?;

    let result = event_loop(link.as_mut(), &mut tracker, &mut display, &mut injector);

    // Best-effort cleanup on every exit path: no key stays held, the
    // display goes dark, the terminal is restored before anything is
    // printed. The link closes when it drops.
    for tile in tracker.held_tiles() {
        let _ = injector.release(tile);
    }
    let _ = display.clear();
    drop(display);
    println!("Exiting.");

    result
}

/// Single-threaded poll loop: drain whatever the link has, apply every
/// validated vector (display first, then key commands), check for a quit
/// key, sleep a tick. Runs until the operator quits or an I/O error
/// propagates up for the cleanup in `run`.
fn event_loop(
    link: &mut dyn serialport::SerialPort,
    tracker: &mut EdgeTracker,
    display: &mut impl DisplayAdapter,
    injector: &mut impl InputInjector,
) -> Result<()> {
    let mut frames = FrameDecoder::new();
    let mut buf = [0u8; 256];

    // Show the all-released pad before the first message arrives
    display.render(TileVector::released())?;

    loop {
        let available = link.bytes_to_read().context("querying link state")?;
        if available > 0 {
            let n = match link.read(&mut buf) {
                Ok(n) => n,
                // The bounded wait elapsing is not an error, just an empty tick
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
                Err(e) => return Err(e).context("reading from link"),
            };
            frames.push(&buf[..n]);

            while let Some(vector) = frames.next_vector() {
                edge::apply_vector(tracker, vector, display, injector)?;
            }
        }

        if quit_requested()? {
            return Ok(());
        }
        std::thread::sleep(IDLE_SLEEP);
    }
}

/// `q`, `Esc` or Ctrl-C in the raw-mode terminal.
fn quit_requested() -> Result<bool> {
    use crossterm::event::{self, Event, KeyCode, KeyModifiers};

    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            let ctrl_c =
                key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
            if ctrl_c || key.code == KeyCode::Char('q') || key.code == KeyCode::Esc {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn detect() -> Result<()> {
    let ports = serialport::available_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    for info in ports {
        match info.port_type {
            serialport::SerialPortType::UsbPort(usb) => println!(
                "{}  USB {:04x}:{:04x} {}",
                info.port_name,
                usb.vid,
                usb.pid,
                usb.product.unwrap_or_default()
            ),
            _ => println!("{}", info.port_name),
        }
    }
    Ok(())
}
