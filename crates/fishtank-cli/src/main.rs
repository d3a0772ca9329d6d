//! Terminal aquarium: drives the simulation on a timer and paints each frame.

mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use fishtank_core::SimulationConfig;
use fishtank_world::{Frame, Simulation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tokio::signal;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fishtank", version, about = "A small aquarium in your terminal")]
struct Args {
    /// JSON simulation config; built-in defaults when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed (overrides the config file; random when neither sets one)
    #[arg(long)]
    seed: Option<u64>,

    /// Tank width in columns
    #[arg(long)]
    width: Option<i32>,

    /// Tank height in rows
    #[arg(long)]
    height: Option<i32>,

    /// ms per tick
    #[arg(long, default_value_t = 50)]
    ms: u64,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Drop food at a random column every N ticks
    #[arg(long)]
    feed_every: Option<u64>,

    /// Run without painting; print the last frame on exit
    #[arg(long)]
    headless: bool,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_telemetry(args.log_json, args.headless)?;

    let config = load_config(&args)?;
    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    info!(
        seed = config.seed,
        width = config.tank.width,
        height = config.tank.height,
        "Starting fishtank"
    );
    let sim = Simulation::new(config)?;

    let last = run(sim, &args).await?;
    if args.headless {
        for line in last.lines() {
            println!("{}", line);
        }
    }

    info!("Fishtank closed");
    Ok(())
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimulationConfig::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimulationConfig {
            seed: rand::random(),
            ..Default::default()
        },
    };
    apply_overrides(&mut config, args);
    Ok(config)
}

fn apply_overrides(config: &mut SimulationConfig, args: &Args) {
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(width) = args.width {
        config.tank.width = width;
    }
    if let Some(height) = args.height {
        config.tank.height = height;
    }
}

/// Tick until the tick limit or a shutdown signal. Returns the last frame.
async fn run(mut sim: Simulation, args: &Args) -> Result<Frame> {
    let mut painter = if args.headless {
        None
    } else {
        Some(render::Painter::enter()?)
    };
    let mut feeder = StdRng::seed_from_u64(sim.seed());
    let width = sim.dimensions().0 as i32;

    let mut ticker = interval(Duration::from_millis(args.ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut last = sim.frame()?;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        if let Some(every) = args.feed_every.filter(|n| *n > 0) {
            if sim.tick() % every == 0 {
                sim.drop_food(feeder.gen_range(0..width))?;
            }
        }

        last = match sim.advance() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Tick {} failed: {}", sim.tick() + 1, e);
                return Err(e.into());
            }
        };

        if let Some(painter) = painter.as_mut() {
            let status =
                render::status_line(sim.tick(), sim.creature_count(), sim.food_count(), sim.seed());
            painter.paint(&last, &status)?;
        }

        if args.ticks.is_some_and(|limit| sim.tick() >= limit) {
            break;
        }
    }

    let stats = sim.stats();
    info!(
        event = "run_finished",
        ticks = stats.ticks,
        bounces = stats.bounces,
        startles = stats.startles,
        transitions = stats.transitions,
        food_eaten = stats.food_eaten,
        "Run finished"
    );
    Ok(last)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["fishtank"]).unwrap();
        assert_eq!(args.ms, 50);
        assert!(args.config.is_none());
        assert!(args.ticks.is_none());
        assert!(!args.headless);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "fishtank", "--seed", "9", "--width", "40", "--height", "12", "--feed-every", "30",
        ])
        .unwrap();
        let mut config = SimulationConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.seed, 9);
        assert_eq!(config.tank.width, 40);
        assert_eq!(config.tank.height, 12);
        assert_eq!(args.feed_every, Some(30));
    }

    #[test]
    fn test_config_file_is_read() {
        let path = std::env::temp_dir().join(format!("fishtank-test-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "seed": 77, "tank": { "width": 12, "height": 6 } }"#).unwrap();

        let args = Args::try_parse_from(["fishtank", "--config", path.to_str().unwrap()]).unwrap();
        let config = load_config(&args).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.seed, 77);
        assert_eq!(config.tank.width, 12);
        assert_eq!(config.tank.height, 6);
    }

    #[test]
    fn test_missing_config_file_fails() {
        let args =
            Args::try_parse_from(["fishtank", "--config", "/nonexistent/tank.json"]).unwrap();
        assert!(load_config(&args).is_err());
    }

    #[tokio::test]
    async fn test_headless_run_stops_at_tick_limit() {
        let args = Args::try_parse_from([
            "fishtank",
            "--headless",
            "--ms",
            "1",
            "--ticks",
            "25",
            "--feed-every",
            "10",
            "--seed",
            "3",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        let sim = Simulation::new(config).unwrap();

        let frame = run(sim, &args).await.unwrap();
        assert_eq!(frame.tick(), 25);
        assert_eq!(frame.cells().len(), 65 * 30);
    }
}
