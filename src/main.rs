//! # Butterfly-trip CLI
//!
//! Command-line interface for the butterfly-trip library.
//! Solves the best round trip through a set of waypoints and stitches the
//! legs into a single GeoJSON route.

use anyhow::{Context, Result};
use butterfly_common::profile::PROFILE_ALIASES;
use butterfly_trip::{
    parse_profile, AssembleOptions, CostMatrixProvider, HaversineMatrix, PrecomputedLegs,
    DEFAULT_PROFILE, KNOWN_PROFILES,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

/// Command-line interface for butterfly-trip
#[derive(Parser)]
#[command(name = "butterfly-trip")]
#[command(about = "Optimal round trips over OpenStreetMap routing data")]
#[command(long_about = "Finds the shortest closed tour through a set of waypoints and merges its legs:
  butterfly-trip solve --matrix costs.json             # Best visiting order for a cost matrix
  butterfly-trip solve --waypoints stops.json          # Same, using great-circle distances
  butterfly-trip route --waypoints stops.json --legs legs.json -o trip.geojson

Waypoints are a JSON array of [lon, lat] pairs. Leg files hold
{\"from\": [lon, lat], \"to\": [lon, lat], \"coordinates\": [[lon, lat], ...]} records.")]
#[command(version = env!("BUTTERFLY_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Travel profile: driving, driving-traffic, walking or cycling
    #[arg(short, long, global = true, default_value = DEFAULT_PROFILE)]
    profile: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the optimal visiting order
    Solve {
        /// Cost matrix file (JSON array of rows)
        #[arg(long, conflicts_with = "waypoints", required_unless_present = "waypoints")]
        matrix: Option<PathBuf>,

        /// Waypoint file; costs are great-circle distances
        #[arg(long)]
        waypoints: Option<PathBuf>,
    },
    /// Solve and assemble the full route as GeoJSON
    Route {
        /// Waypoint file (JSON array of [lon, lat])
        #[arg(long)]
        waypoints: PathBuf,

        /// Precomputed leg geometry file
        #[arg(long)]
        legs: PathBuf,

        /// Cost matrix file; defaults to great-circle distances
        #[arg(long)]
        matrix: Option<PathBuf>,

        /// Maximum leg requests in flight
        #[arg(long, default_value_t = 1)]
        max_in_flight: usize,

        /// Output file path, or "-" for stdout
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// List known travel profiles
    Profiles,
}

/// Output destination types
#[derive(Debug)]
enum OutputDestination {
    File(PathBuf),
    Stdout,
}

fn resolve_output(output: &str) -> OutputDestination {
    if output == "-" || output.is_empty() {
        OutputDestination::Stdout
    } else {
        OutputDestination::File(PathBuf::from(output))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if cli.verbose {
        eprintln!("🦋 Butterfly-trip v{} starting...", env!("BUTTERFLY_VERSION"));
    }

    let profile = parse_profile(&cli.profile)?;

    match cli.command {
        Commands::Solve { matrix, waypoints } => {
            solve(matrix.as_deref(), waypoints.as_deref(), profile).await
        }
        Commands::Route {
            waypoints,
            legs,
            matrix,
            max_in_flight,
            output,
        } => {
            route(
                &waypoints,
                &legs,
                matrix.as_deref(),
                max_in_flight,
                resolve_output(&output),
                profile,
            )
            .await
        }
        Commands::Profiles => {
            for profile in KNOWN_PROFILES {
                println!("{profile}");
            }
            for (alias, canonical) in PROFILE_ALIASES {
                println!("{alias} -> {canonical}");
            }
            Ok(())
        }
    }
}

/// Logs go to stderr; RUST_LOG overrides the default level unless --verbose is set
fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Solve a matrix file, or great-circle costs for a waypoint file
async fn solve(matrix: Option<&Path>, waypoints: Option<&Path>, profile: &str) -> Result<()> {
    let matrix = match (matrix, waypoints) {
        (Some(path), _) => cli::input::load_matrix(path)?,
        (None, Some(path)) => {
            let waypoints = cli::input::load_waypoints(path)?;
            HaversineMatrix.fetch_matrix(&waypoints, profile).await?
        }
        (None, None) => anyhow::bail!("either --matrix or --waypoints is required"),
    };

    let result = butterfly_trip::solve(&matrix).context("Failed to solve round trip")?;
    info!(cost = result.cost, tour = ?result.tour, "round trip solved");

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Solve, assemble and write the GeoJSON route. Nothing is written unless
/// assembly completes.
async fn route(
    waypoints: &Path,
    legs: &Path,
    matrix: Option<&Path>,
    max_in_flight: usize,
    output: OutputDestination,
    profile: &str,
) -> Result<()> {
    let waypoints = cli::input::load_waypoints(waypoints)?;
    let legs = PrecomputedLegs::load(legs)
        .with_context(|| format!("Failed to load legs from {}", legs.display()))?;
    let matrix_provider: Box<dyn CostMatrixProvider> = match matrix {
        Some(path) => Box::new(cli::input::load_matrix(path)?),
        None => Box::new(HaversineMatrix),
    };

    let progress_manager = cli::ProgressManager::new(
        0,
        &format!("🧭 Routing {} waypoints ({profile})", waypoints.len()),
    );
    let cancel = CancellationToken::new();
    let options = AssembleOptions {
        max_in_flight,
        progress: Some(progress_manager.callback()),
        cancel: Some(cancel.clone()),
    };

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling route assembly");
            cancel.cancel();
        }
    });
    let result =
        butterfly_trip::plan_trip(&waypoints, profile, &*matrix_provider, &legs, &options).await;
    interrupt.abort();

    let plan = result.context("Failed to build route")?;
    progress_manager.pb.finish_and_clear();

    for skipped in &plan.route.skipped_legs {
        eprintln!(
            "⚠️  Leg {} ({} -> {}) has no geometry and was left out",
            skipped.leg, skipped.from, skipped.to
        );
    }

    let geojson = serde_json::to_string_pretty(&plan.route.to_geojson())?;
    match output {
        OutputDestination::Stdout => println!("{geojson}"),
        OutputDestination::File(path) => {
            std::fs::write(&path, geojson)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("📁 Saved route to: {}", path.display());
        }
    }

    info!(summary = ?plan.summary(), "route complete");
    Ok(())
}
