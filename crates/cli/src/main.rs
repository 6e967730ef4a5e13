use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use shadowcast::prelude::*;
use shadowcast::rand::{draw_layout, LayoutCfg};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

/// Route used by the one-shot `run` command.
const INITIAL_ROUTE: &str = "initial";

#[derive(Parser)]
#[command(name = "shadowcast-cli")]
#[command(about = "Lit area of a point light among convex obstacles")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Recompute a scene from a configuration file and print or write it as JSON
    Run {
        #[arg(long)]
        config: PathBuf,
        /// Write the scene here (plus a provenance sidecar) instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        workers: usize,
        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Parse and validate a configuration file without scanning
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// Write a random, valid configuration file
    Random {
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 500.0)]
        height: f64,
        #[arg(long, default_value_t = 6)]
        count: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Run {
            config,
            out,
            workers,
            timeout_ms,
        } => {
            let scene = run(&config, out.as_deref(), workers, timeout_ms)?;
            if out.is_none() {
                println!("{}", serde_json::to_string_pretty(&scene)?);
            }
            Ok(())
        }
        Action::Validate { config } => {
            let c = validate_file(&config)?;
            println!("ok: {} polygons", c.polygons.len());
            Ok(())
        }
        Action::Random {
            width,
            height,
            count,
            seed,
            out,
        } => random(width, height, count, seed, &out),
    }
}

fn read_config(path: &Path) -> Result<Configuration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Configuration::from_text(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse, store the configuration, and recompute once through the pipeline.
fn run(config: &Path, out: Option<&Path>, workers: usize, timeout_ms: Option<u64>) -> Result<Scene> {
    tracing::info!(config = %config.display(), workers, "run");
    let parsed = read_config(config)?;

    let ctx = match timeout_ms {
        Some(ms) => Ctx::background().with_timeout(Duration::from_millis(ms)),
        None => Ctx::background(),
    };
    let configs: InMemoryRepository<Configuration> = InMemoryRepository::new();
    let stored = configs.upsert(&ctx, parsed)?;

    let scenes: Arc<SceneRepository> = Arc::new(InMemoryRepository::<Scene>::new());
    let pipeline = Pipeline::start(scenes, RouteTable::new([INITIAL_ROUTE]), workers);
    let result = pipeline.reload(ctx, stored, INITIAL_ROUTE);
    pipeline.shutdown();
    let scene = result.with_context(|| format!("recomputing {}", config.display()))?;
    tracing::info!(lit_area = scene.lit_area, triangles = scene.triangles.len(), "scene ready");

    if let Some(out) = out {
        if let Some(parent) = out.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(out, serde_json::to_vec_pretty(&scene)?)
            .with_context(|| format!("writing {}", out.display()))?;
        provenance::write_sidecar(
            out,
            provenance::Payload::new(
                "run",
                json!({
                    "config": config.to_string_lossy(),
                    "workers": workers,
                    "lit_area": scene.lit_area,
                }),
            ),
        )?;
    }
    Ok(scene)
}

fn validate_file(path: &Path) -> Result<Configuration> {
    let c = read_config(path)?;
    shadowcast::polygon::validate(&c.polygons, c.width(), c.height())
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(c)
}

fn random(width: f64, height: f64, count: usize, seed: u64, out: &Path) -> Result<()> {
    let cfg = LayoutCfg {
        width,
        height,
        count,
        ..LayoutCfg::default()
    };
    let layout = draw_layout(cfg, seed);
    layout.check()?;
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out, layout.to_text()).with_context(|| format!("writing {}", out.display()))?;
    provenance::write_sidecar(
        out,
        provenance::Payload::new(
            "random",
            json!({"width": width, "height": height, "count": count, "seed": seed}),
        ),
    )?;
    tracing::info!(out = %out.display(), count, seed, "layout written");
    Ok(())
}
