use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    HttpPathfinderApi, ObstacleRecompute, PathfinderApi, PathfinderSession, PathsOutcome, Slot,
    ViewportConfig,
};
use shared::domain::{AlgorithmId, Coordinate};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

#[derive(Parser, Debug)]
#[command(name = "pathfinder", about = "Compare routing algorithms against a pathfinding backend")]
struct Args {
    /// Settings file; missing files fall back to defaults.
    #[arg(long, global = true, default_value = "pathfinder.toml")]
    config: PathBuf,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Computes paths between two places and prints the comparison.
    Route {
        /// Place name or `lat,lng`.
        start: String,
        /// Place name or `lat,lng`.
        end: String,
        #[arg(long = "obstacle", value_name = "LAT,LNG")]
        obstacles: Vec<Coordinate>,
        #[arg(long)]
        select: Option<AlgorithmId>,
    },
    Geocode {
        query: String,
    },
    ClearObstacles,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(&args.config);
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.clone())),
        )
        .init();

    let api = Arc::new(HttpPathfinderApi::new(settings.http_config())?);
    info!(api_url = %api.base_url(), "pathfinder: backend configured");

    match args.command {
        Command::Route {
            start,
            end,
            obstacles,
            select,
        } => {
            let session = PathfinderSession::new_with_config(
                api,
                settings.session_policy(),
                ViewportConfig::default(),
            );
            run_route(&session, &start, &end, &obstacles, select).await
        }
        Command::Geocode { query } => {
            let coordinate = api
                .geocode(&query)
                .await
                .with_context(|| format!("failed to geocode `{query}`"))?;
            println!("{coordinate}");
            Ok(())
        }
        Command::ClearObstacles => {
            let response = api.clear_obstacles().await?;
            if !response.success {
                bail!("backend did not clear obstacles");
            }
            println!("obstacles cleared");
            Ok(())
        }
    }
}

async fn run_route(
    session: &Arc<PathfinderSession>,
    start: &str,
    end: &str,
    obstacles: &[Coordinate],
    select: Option<AlgorithmId>,
) -> Result<()> {
    place(session, Slot::Start, start).await?;
    place(session, Slot::End, end).await?;

    let outcome = session.submit_path_request().await?;
    if outcome == PathsOutcome::Discarded {
        bail!("path response no longer matches the requested locations");
    }

    for &point in obstacles {
        let placed = session.add_obstacle(point).await?;
        match placed.recompute {
            ObstacleRecompute::Paths(_) | ObstacleRecompute::NotIncluded => {
                println!("obstacle placed at {point}");
            }
            ObstacleRecompute::Failed(message) => {
                println!("obstacle placed at {point}; recomputation failed: {message}");
            }
        }
    }

    // Selecting the current selection toggles it off.
    if let Some(id) = select {
        if session.snapshot().await.selection.selected != Some(id) {
            session.select_algorithm(Some(id)).await;
        }
    }

    let snapshot = session.snapshot().await;
    print!("{}", render::metrics_panel(&snapshot));
    if let Some(card) = render::travel_card(&snapshot) {
        println!();
        print!("{card}");
    }
    Ok(())
}

/// Accepts a literal `lat,lng` pair or resolves the text through the geocoder.
async fn place(session: &PathfinderSession, slot: Slot, raw: &str) -> Result<()> {
    match raw.parse::<Coordinate>() {
        Ok(coordinate) => session.set_location(slot, coordinate, None).await?,
        Err(_) => {
            session.geocode_location(slot, raw).await?;
        }
    }
    Ok(())
}
