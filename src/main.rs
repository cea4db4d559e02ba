//! PedalSim command line
//!
//! Inspect routes, decode sensor frames and ride a GPX route on a virtual
//! power meter.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use pedalsim::recording::export_gpx_to_file;
use pedalsim::route::{parse_gpx, ElevationService, Route, RouteBuilder};
use pedalsim::sensors::{
    decode_csc, decode_cycling_power, BleHeartRateMeter, BlePowerCadenceMeter, FrameMeter, Meter,
    TelemetryBus, VirtualPowerMeter,
};
use pedalsim::simulation::{RideSession, TickOutcome};
use pedalsim::storage::{self, AppConfig, ProgressStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "pedalsim", version, about = "Indoor cycling ride simulator")]
struct Cli {
    /// Config file (defaults to the user data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a GPX file and print the prepared route
    Route {
        gpx: PathBuf,

        /// Sample elevation online when the track lacks it
        #[arg(long)]
        fetch_elevation: bool,
    },

    /// Decode hex-encoded sensor notifications in order
    Decode {
        #[arg(required = true)]
        frames: Vec<String>,

        #[arg(long, value_enum, default_value_t = FrameKind::Power)]
        kind: FrameKind,
    },

    /// Ride a route on a virtual power meter
    Ride {
        /// GPX route (not needed with --resume)
        gpx: Option<PathBuf>,

        /// Virtual power in watts
        #[arg(long, default_value_t = 200.0)]
        watts: f64,

        /// Resume a saved ride by key
        #[arg(long)]
        resume: Option<String>,

        /// Run ticks back to back on a simulated clock
        #[arg(long)]
        simulate: bool,

        /// Write the ride as GPX when finished
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// List saved rides, most recent first
    Saved,
}

#[derive(Clone, Copy, ValueEnum)]
enum FrameKind {
    Power,
    Csc,
    HeartRate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => storage::load_config_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => storage::load_config().context("loading config")?,
    };

    match cli.command {
        Command::Route {
            gpx,
            fetch_elevation,
        } => {
            let route = load_route(&gpx, &config, fetch_elevation).await?;
            print_route(&route, &config);
        }
        Command::Decode { frames, kind } => {
            let mut meter: Box<dyn FrameMeter> = match kind {
                FrameKind::Power => Box::new(BlePowerCadenceMeter::new("cli", "Power")),
                FrameKind::Csc => {
                    Box::new(config.rider.speed_cadence_meter("cli", "Speed/Cadence"))
                }
                FrameKind::HeartRate => Box::new(BleHeartRateMeter::new("cli", "Heart Rate")),
            };
            println!("{} ({})", meter.protocol(), meter.endpoint().characteristic);

            let at = Instant::now();
            for hex in &frames {
                let bytes = parse_hex(hex)?;
                let fields = match kind {
                    FrameKind::Power => Some(decode_cycling_power(&bytes)),
                    FrameKind::Csc => Some(decode_csc(&bytes)),
                    FrameKind::HeartRate => None,
                };
                if let Some(frame) = fields.transpose().context("decoding frame")? {
                    for (name, value) in frame.iter() {
                        println!("{:<32} {}", name, value);
                    }
                }
                for sample in meter.ingest(&bytes, at).context("decoding frame")? {
                    println!("  {:<30} {:.1}", sample.kind.to_string(), sample.value);
                }
            }
        }
        Command::Ride {
            gpx,
            watts,
            resume,
            simulate,
            export,
        } => {
            let store = ProgressStore::open(
                progress_dir(&config),
                config.recording.max_saved_rides,
            )
            .context("opening progress store")?;

            let session = match (resume, gpx) {
                (Some(key), _) => {
                    let snapshot = store
                        .load(&key)
                        .with_context(|| format!("loading saved ride {}", key))?;
                    store.touch(&key)?;
                    RideSession::from_snapshot(snapshot, &config, Utc::now())?
                }
                (None, Some(gpx)) => {
                    let route = load_route(&gpx, &config, false).await?;
                    RideSession::new(Arc::new(route), &config, Utc::now())
                }
                (None, None) => bail!("a GPX file or --resume key is required"),
            };
            let mut session = session.with_store(store);

            if simulate {
                simulate_ride(&mut session, watts, &config);
            } else {
                let bus = TelemetryBus::new();
                session.subscribe(&bus);
                let meter = VirtualPowerMeter::new(watts)
                    .with_interval(config.sensors.virtual_power_interval());
                let task = meter.spawn(bus);
                session.run(config.simulation.tick_interval()).await?;
                task.abort();
            }

            print_summary(&session, &config);
            if !session.is_complete() {
                session.save_progress()?;
                println!("Saved as {}", session.id());
            }

            if let Some(path) = export {
                export_gpx_to_file(session.simulator().route().name(), session.history(), &path)
                    .with_context(|| format!("exporting {}", path.display()))?;
                println!("Exported {}", path.display());
            }
        }
        Command::Saved => {
            let store = ProgressStore::open(
                progress_dir(&config),
                config.recording.max_saved_rides,
            )?;
            for key in store.list()? {
                match store.load(&key) {
                    Ok(snapshot) => println!(
                        "{}  {}  {:.0} m  saved {}",
                        key,
                        snapshot.route_name,
                        snapshot.state.distance,
                        snapshot.saved_at.format("%Y-%m-%d %H:%M")
                    ),
                    Err(e) => tracing::warn!("Skipping saved ride {}: {}", key, e),
                }
            }
        }
    }

    Ok(())
}

fn progress_dir(config: &AppConfig) -> PathBuf {
    if config.data_dir.as_os_str().is_empty() {
        storage::config::get_data_dir().join("progress")
    } else {
        config.data_dir.join("progress")
    }
}

async fn load_route(path: &Path, config: &AppConfig, fetch_elevation: bool) -> Result<Route> {
    let content = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let track = parse_gpx(&content)?;

    let name = track.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Route".to_string())
    });

    let points = if fetch_elevation && track.missing_elevation() > 0 {
        let path: Vec<_> = track.points.iter().map(|p| p.location).collect();
        let sampled = ElevationService::new()
            .sample_track(&path)
            .await
            .context("looking up elevation")?;
        tracing::info!("Sampled elevation at {} points", sampled.len());
        sampled
    } else {
        track.into_track_points()
    };

    let settings = &config.simulation;
    let route = RouteBuilder::new(&name)
        .resample_spacing(settings.resample_spacing_m)
        .grade_bandwidth(settings.grade_bandwidth)
        .climb_grade_threshold(settings.climb_grade_threshold)
        .build(&points)?;
    Ok(route)
}

/// Consecutive ticks without forward progress before a simulated ride gives up.
const STALL_TICKS: u32 = 3600;

/// Ride with the clock advanced one tick interval per step.
fn simulate_ride(session: &mut RideSession, watts: f64, config: &AppConfig) {
    let step = chrono::Duration::milliseconds(config.simulation.tick_interval_ms as i64);
    let mut now = session.state().last_sample_time;
    let mut stalled = 0;
    loop {
        now += step;
        let before = session.state().distance;
        session.simulator_mut().push_power(watts);
        match session.tick_at(now, Instant::now()) {
            TickOutcome::Completed | TickOutcome::AlreadyComplete => break,
            TickOutcome::Idle | TickOutcome::Advanced => {}
        }

        if session.state().distance > before {
            stalled = 0;
        } else {
            stalled += 1;
            if stalled >= STALL_TICKS {
                tracing::warn!("No progress at {:.0} W, stopping", watts);
                break;
            }
        }
    }
}

fn print_route(route: &Route, config: &AppConfig) {
    let (distance, distance_unit) = config.units.convert_distance(route.total_distance());
    let (climb, climb_unit) = config.units.convert_elevation(route.total_climb());
    println!("{}", route.name());
    println!("  points   {}", route.len());
    println!("  distance {:.2} {}", distance, distance_unit);
    println!("  climb    {:.0} {}", climb, climb_unit);
}

fn print_summary(session: &RideSession, config: &AppConfig) {
    let state = session.state();
    let (distance, distance_unit) = config.units.convert_distance(state.distance);
    let (climb, climb_unit) = config.units.convert_elevation(state.climb);
    let average = if state.elapsed > 0.0 {
        state.distance / state.elapsed
    } else {
        0.0
    };
    let (speed, speed_unit) = config.units.convert_speed(average);
    println!(
        "{}: {:.2} {} in {:.0} s, {:.0} {} climbed, average {:.1} {}",
        if session.is_complete() { "Finished" } else { "Stopped" },
        distance,
        distance_unit,
        state.elapsed,
        climb,
        climb_unit,
        speed,
        speed_unit
    );
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if !digits.is_ascii() {
        bail!("hex input contains non-ASCII characters");
    }
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("invalid hex byte '{}'", &digits[i..i + 2]))
        })
        .collect()
}
