// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! herd CLI
//!
//! Runs scene files through the relationship registry, previews edits to a
//! relationship, samples the curve library and inspects persisted stores.

mod output;
mod scene;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use herd_config_fs::FsConfigStore;
use herd_core::{CurveLibrary, PreviewOverrides, Relation, RelationshipId, RelationshipStore};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::scene::Scene;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "HERD_LOG";

#[derive(Parser, Debug)]
#[command(author, version, about = "Herd relationship metrics CLI")]
struct Args {
    /// Log at debug level (overridden by HERD_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tick a scene and print every relationship's snapshot
    Run {
        /// Scene file (JSON)
        #[arg(long)]
        scene: PathBuf,
        /// Number of ticks to run
        #[arg(long, default_value_t = 1)]
        ticks: u32,
        /// Seconds of entity motion integrated before each tick
        #[arg(long, default_value_t = 0.0)]
        dt: f32,
        /// Print the final snapshots as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Evaluate one relationship with optional overrides, without caching
    Preview {
        /// Scene file (JSON)
        #[arg(long)]
        scene: PathBuf,
        /// Relationship id
        #[arg(long)]
        id: u32,
        /// Override the lower bound
        #[arg(long, allow_hyphen_values = true)]
        min: Option<f32>,
        /// Override the upper bound
        #[arg(long, allow_hyphen_values = true)]
        max: Option<f32>,
        /// Override the relation, e.g. `Couple.Difference`
        #[arg(long)]
        metric: Option<Relation>,
    },
    /// Sample every library curve
    Curves {
        /// Number of evenly spaced samples in [0, 1]
        #[arg(long, default_value_t = 5)]
        samples: usize,
    },
    /// List (or import into) a persisted relationship store
    Store {
        /// Store directory; defaults to the platform config directory
        #[arg(long)]
        root: Option<PathBuf>,
        /// Persist this scene's entities and relationships before listing
        #[arg(long)]
        import: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.cmd {
        Command::Run {
            scene,
            ticks,
            dt,
            json,
        } => run(&scene, ticks, dt, json),
        Command::Preview {
            scene,
            id,
            min,
            max,
            metric,
        } => preview(&scene, id, min, max, metric),
        Command::Curves { samples } => {
            println!("{}", output::curves(CurveLibrary::shared(), samples));
            Ok(())
        }
        Command::Store { root, import } => store(root, import),
    }
}

fn run(path: &Path, ticks: u32, dt: f32, json: bool) -> Result<()> {
    let scene = Scene::load(path)?;
    let mut registry = scene.registry()?;
    info!(
        entities = scene.entities.len(),
        relationships = scene.relationships.len(),
        "scene loaded"
    );
    for _ in 0..ticks {
        if dt != 0.0 {
            registry.source_mut().integrate(dt);
        }
        let report = registry.tick();
        debug!(tick = report.tick, refreshed = report.refreshed, "tick complete");
        for line in output::changes(&report) {
            println!("{line}");
        }
    }
    if json {
        let snapshots: Vec<_> = registry
            .infos()
            .map(|info| {
                serde_json::json!({
                    "id": info.id(),
                    "relation": info.config().relation,
                    "dynamic": info.dynamic(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    } else {
        println!("{}", output::relationships(registry.infos()));
    }
    Ok(())
}

fn preview(
    path: &Path,
    id: u32,
    min: Option<f32>,
    max: Option<f32>,
    metric: Option<Relation>,
) -> Result<()> {
    let scene = Scene::load(path)?;
    let mut registry = scene.registry()?;
    let id = RelationshipId(id);
    let config = registry
        .edit(id)
        .with_context(|| format!("relationship {id} not in scene"))?;
    let bounds = match (min, max) {
        (None, None) => None,
        (min, max) => Some((min.unwrap_or(config.min), max.unwrap_or(config.max))),
    };
    let overrides = PreviewOverrides {
        relation: metric,
        bounds,
        settings: None,
    };
    let result = registry.preview(id, &overrides)?;
    println!("{}", output::preview(&config, &result));
    Ok(())
}

fn store(root: Option<PathBuf>, import: Option<PathBuf>) -> Result<()> {
    let fs = match root {
        Some(root) => FsConfigStore::at(&root)
            .with_context(|| format!("failed to open store at {}", root.display()))?,
        None => FsConfigStore::new().context("failed to open the default store")?,
    };
    let store = RelationshipStore::new(fs);
    if let Some(path) = import {
        let scene = Scene::load(&path)?;
        if scene.relationships.is_empty() && scene.entities.is_empty() {
            bail!("scene {} is empty", path.display());
        }
        store.save_herd(&scene.herd()?.snapshot())?;
        for config in scene.relationships {
            store.upsert(config)?;
        }
        info!(root = %store.store().root().display(), "scene imported");
    }
    println!("{}", output::stored(&store.load_all()?));
    Ok(())
}
