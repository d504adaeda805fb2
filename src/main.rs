// src/main.rs
//! GPS Geofence - reports position and waypoint arrivals over a serial link

use anyhow::{bail, Context, Result};
use clap::Parser;
use gps_geofence::{config::GeofenceConfig, serial, FixSampler, Notifier, Session};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::io::AsyncWrite;

/// Read a GPS receiver, average fixes and announce arrivals at waypoints
#[derive(Parser, Debug)]
#[command(name = "gps-geofence")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file (default: ~/.config/gps-geofence/config.json)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial port of the GPS receiver
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate of the GPS receiver
    #[arg(short, long)]
    baud: Option<u32>,

    /// Serial port for notifications (default: stdout)
    #[arg(long)]
    notify_port: Option<String>,

    /// Baud rate of the notification port
    #[arg(long)]
    notify_baud: Option<u32>,

    /// Fixes averaged per cycle; 1 forwards every fix unfiltered
    #[arg(short, long)]
    samples: Option<usize>,

    /// Delay between cycles in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Write the defaults, with any command line overrides, to the config path and exit
    #[arg(long)]
    write_default_config: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if args.list_ports {
        serial::list_serial_ports()?;
        return Ok(());
    }

    let config = load_config(&args)?;

    if args.write_default_config {
        let path = match &args.config {
            Some(path) => {
                config.save_to(path)?;
                path.clone()
            }
            None => config.save()?,
        };
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let Some(gps_port) = config.gps_port.as_deref() else {
        bail!("No GPS serial port configured (use --port or set gps_port in the config file)");
    };

    let gps = serial::open_port(gps_port, config.gps_baudrate)
        .with_context(|| format!("Cannot open GPS receiver on {}", gps_port))?;

    let sink: Box<dyn AsyncWrite + Unpin + Send> = match config.notify_port.as_deref() {
        Some(port) => Box::new(
            serial::open_port(port, config.notify_baudrate)
                .with_context(|| format!("Cannot open notification port {}", port))?,
        ),
        None => {
            log::info!("No notification port configured, writing to stdout");
            Box::new(tokio::io::stdout())
        }
    };

    log::info!("Starting GPS geofence, move near a window for a first fix");

    let mut session = Session::new(
        FixSampler::new(gps, config.sampler_settings()),
        Notifier::new(sink),
        config.waypoints.clone(),
        config.cycle_interval(),
    );

    // Ctrl+C stops the loop once the current cycle finishes
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Cannot listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Shutting down...");
        running_clone.store(false, Ordering::Relaxed);
    });

    session.run(running).await;

    Ok(())
}

/// Load the config file and apply command line overrides
fn load_config(args: &Args) -> Result<GeofenceConfig> {
    let mut config = match &args.config {
        // A config being written for the first time does not exist yet
        Some(path) if args.write_default_config => GeofenceConfig::load_or_default(path)?,
        Some(path) => GeofenceConfig::load_from(path)?,
        None => GeofenceConfig::load()?,
    };

    if let Some(port) = &args.port {
        config.update_gps_serial(port.clone(), args.baud);
    } else if let Some(baud) = args.baud {
        config.gps_baudrate = baud;
    }

    if let Some(port) = &args.notify_port {
        config.update_notify_serial(port.clone(), args.notify_baud);
    } else if let Some(baud) = args.notify_baud {
        config.notify_baudrate = baud;
    }

    if let Some(samples) = args.samples {
        config.sample_count = samples;
    }

    if let Some(interval) = args.interval_ms {
        config.cycle_interval_ms = interval;
    }

    config.validate()?;
    Ok(config)
}

/// Initialize logging based on verbosity level; RUST_LOG takes precedence
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args()))
        .init();
}
