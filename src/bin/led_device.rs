//! Runs the LED controller firmware against a serial port on this machine, with
//! an in-memory pin bank standing in for the LEDs.
//!
//! Pair it with the host through a virtual null-modem, e.g.
//! `socat -d -d pty,raw,echo=0 pty,raw,echo=0`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use finger_link_lib::config::{self, DeviceConfig};
use finger_link_lib::firmware::sim::{PinBank, SerialConsole, SystemClock};
use finger_link_lib::firmware::LedController;
use finger_link_lib::link::{self, BAUD_RATE};

#[derive(Parser, Debug)]
#[command(author, version, about = "Emulate the 5-LED controller on a serial port")]
struct Args {
    /// Serial port to listen on
    port: String,

    /// Baud rate
    #[arg(short, long, default_value_t = BAUD_RATE)]
    baud: u32,

    /// JSON device settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pins that never go HIGH, to exercise the self-test
    #[arg(long, value_delimiter = ',')]
    stuck: Vec<u8>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    finger_link_lib::init_logging(args.verbose);

    let settings = match &args.config {
        Some(path) => config::load_json::<DeviceConfig>(path)?,
        None => DeviceConfig::default(),
    };

    let port = serialport::new(&args.port, args.baud)
        .timeout(Duration::from_millis(10))
        .open()
        .with_context(|| format!("Cannot open {}", args.port))?;
    log::info!("Emulating LED controller on {} at {} baud", args.port, args.baud);

    let mut controller = LedController::new(
        PinBank::with_stuck_low(&args.stuck),
        SystemClock::new(),
        SerialConsole::new(port),
        settings,
    )
    .context("Invalid device settings")?;
    controller.boot();

    let mut shown = controller.pin_states();
    loop {
        controller.tick();
        let current = controller.pin_states();
        if current != shown {
            log::info!("LEDs [{}]", link::encode(&current));
            shown = current;
        }
        // The real board spins without pausing; keep the emulator off 100% CPU.
        std::thread::sleep(Duration::from_millis(1));
    }
}
