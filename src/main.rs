use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use finger_link_lib::config::{self, HostConfig, SendPolicy};
use finger_link_lib::hand::{HandDetector, JsonLineDetector, SubprocessDetector};
use finger_link_lib::host::HostApp;
use finger_link_lib::serial::{parse_device_line, SerialError, SerialInterface};

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive a 5-LED controller from hand landmarks over serial")]
struct Cli {
    /// JSON settings file; flags below override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial port of the LED controller (e.g. COM8, /dev/ttyUSB0)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the tracking loop
    Run {
        /// Command that prints landmark frames as JSON lines; frames are read from stdin when omitted
        #[arg(short, long)]
        detector: Option<String>,

        /// Number of connection attempts
        #[arg(short, long)]
        retry: Option<u32>,

        /// When to write finger states to the link
        #[arg(long, value_enum)]
        send_policy: Option<SendPolicy>,

        /// Minimum hand detection confidence
        #[arg(long)]
        min_confidence: Option<f32>,
    },
    /// List serial ports and whether they can be opened
    Ports {
        /// Skip the open test
        #[arg(long)]
        no_probe: bool,
    },
    /// Send one finger state (e.g. 10110) and print the device's replies
    Send {
        state: String,

        /// How long to collect replies
        #[arg(long, default_value = "1000")]
        wait_ms: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    finger_link_lib::init_logging(cli.verbose);

    let mut settings = match &cli.config {
        Some(path) => config::load_json::<HostConfig>(path)?,
        None => HostConfig::default(),
    };
    if let Some(port) = &cli.port {
        settings.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        settings.baud_rate = baud;
    }

    match cli.command {
        Command::Run { detector, retry, send_policy, min_confidence } => {
            if let Some(detector) = detector {
                settings.detector = Some(detector);
            }
            if let Some(retry) = retry {
                settings.retry_count = retry;
            }
            if let Some(policy) = send_policy {
                settings.send_policy = policy;
            }
            if let Some(threshold) = min_confidence {
                settings.min_confidence = threshold;
            }
            settings.validate()?;
            run(settings)
        }
        Command::Ports { no_probe } => list_ports(&settings, !no_probe),
        Command::Send { state, wait_ms } => {
            settings.validate()?;
            send_once(&settings, &state, wait_ms)
        }
    }
}

fn run(settings: HostConfig) -> Result<()> {
    log::info!("Starting hand tracking application");
    let frames = match settings.detector.clone() {
        Some(command) => {
            let detector = SubprocessDetector::spawn(&command, settings.min_confidence)
                .context("Failed to start hand detector")?;
            run_with(detector, settings)?
        }
        None => {
            log::info!("Reading landmark frames from stdin");
            let stdin = BufReader::new(std::io::stdin());
            let detector = JsonLineDetector::read_only(stdin).with_min_confidence(settings.min_confidence);
            run_with(detector, settings)?
        }
    };
    log::info!("Application terminated after {} frames", frames);
    Ok(())
}

fn run_with<D: HandDetector>(detector: D, settings: HostConfig) -> Result<u64> {
    let mut app = HostApp::new(detector, SerialInterface::new(), settings);
    app.connect();
    let frames = app.run().context("Hand detector failed")?;
    app.link_mut().disconnect();
    Ok(frames)
}

fn list_ports(settings: &HostConfig, probe: bool) -> Result<()> {
    let ports = SerialInterface::list_ports().context("Cannot enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found!");
        return Ok(());
    }

    println!("Available ports:");
    println!("---------------");
    for port in ports {
        println!();
        println!("Port: {}", port.port_name);
        println!("Description: {}", port.description);
        println!("Hardware ID: {}", port.hardware_id());
        if probe {
            match SerialInterface::probe(&port.port_name, settings.baud_rate) {
                Ok(()) => println!("Status: Available"),
                Err(e) => println!("Status: In use or unavailable ({})", e),
            }
        }
    }

    if cfg!(windows) {
        println!();
        println!("Note: an open serial monitor (e.g. Arduino IDE) blocks the COM port for other programs.");
    }
    Ok(())
}

fn send_once(settings: &HostConfig, state: &str, wait_ms: u64) -> Result<()> {
    let mut link = SerialInterface::new();
    let options = settings.connect_options();
    if let Some(reply) = link.connect(&options).context("Cannot open LED controller port")? {
        println!("< {}", reply);
    }

    link.send_raw(state)?;
    println!("> {}", state.trim());

    loop {
        match link.read_line(Duration::from_millis(wait_ms)) {
            Ok(line) => {
                parse_device_line(&line).log();
                println!("< {}", line);
            }
            Err(SerialError::Timeout) => break,
            Err(e) => return Err(e.into()),
        }
    }
    link.disconnect();
    Ok(())
}
