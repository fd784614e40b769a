use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use unfortunate_core::{
    to_percent, Animator, SeededRng, SpinPhase, Store, WheelConfig, WheelRenderer,
};

mod storage;
mod svg;

use storage::FileStorage;
use svg::SvgCanvas;

#[derive(Parser)]
#[command(name = "unfortunate-cli", about = "Weighted wheel of unfortunate events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Directory holding items.json and history.json
    #[arg(long, env = "UNFORTUNATE_DATA_DIR", default_value = ".unfortunate")]
    data_dir: PathBuf,
    /// JSON file overriding spin and render tuning
    #[arg(long, env = "UNFORTUNATE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the items on the wheel
    List,
    /// Add an item; probability as a fraction (0.25) or percent (25%)
    Add { title: String, probability: String },
    /// Change the title and/or probability of the item at a 1-based position
    Edit {
        position: usize,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        probability: Option<String>,
    },
    /// Remove the item at a 1-based position
    Remove { position: usize },
    /// Spin the wheel and record the result
    Spin {
        /// Seed for the reproducible random stream, defaults to the clock
        #[arg(long, env = "UNFORTUNATE_SEED")]
        seed: Option<String>,
        /// Write the resting wheel as SVG
        #[arg(long)]
        svg: Option<PathBuf>,
        /// Simulated frames per second
        #[arg(long, default_value_t = 60)]
        fps: u32,
    },
    /// Draw the wheel at a given rotation as SVG
    Render {
        path: PathBuf,
        #[arg(long, default_value_t = 0.0)]
        angle: f64,
    },
    /// View last N spins
    History {
        #[arg(default_value_t = 20)]
        n: usize,
    },
    /// Export items and history as JSON
    Export { path: PathBuf },
    /// Export history to CSV path
    ExportCsv { path: PathBuf },
    /// Replace items and history from a JSON file or http(s) URL
    Import { source: String },
    /// Erase all items and history
    Erase {
        #[arg(long)]
        yes: bool,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WheelConfig> {
    let Some(path) = path else {
        return Ok(WheelConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

/// Accepts `0.25` or `25%`.
fn parse_probability(raw: &str) -> anyhow::Result<f64> {
    let raw = raw.trim();
    let value = match raw.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>()? / 100.0,
        None => raw.parse::<f64>()?,
    };
    Ok(value)
}

fn item_index(position: usize) -> anyhow::Result<usize> {
    if position == 0 {
        bail!("positions start at 1");
    }
    Ok(position - 1)
}

async fn fetch_import(source: &str) -> anyhow::Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let body = reqwest::get(source)
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}

fn write_svg(
    path: &Path,
    renderer: &WheelRenderer,
    angle: f64,
    store: &Store<FileStorage>,
) -> anyhow::Result<()> {
    let size = renderer.config().size;
    let mut canvas = SvgCanvas::new(size, size);
    renderer.draw(&mut canvas, angle, store.items());
    std::fs::write(path, canvas.to_svg())?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let mut store = Store::load(FileStorage::new(&cli.data_dir)).with_epsilon(config.spin.epsilon);
    let renderer =
        WheelRenderer::new(config.render.clone()).with_pointer_angle(config.spin.pointer_angle);

    match cli.command {
        Commands::List => {
            if store.items().is_empty() {
                println!("Nothing's on the list yet");
            }
            for (idx, item) in store.items().iter().enumerate() {
                println!("{:>3}) {} ({}%)", idx + 1, item.title, to_percent(item.weight));
            }
            println!("unassigned: {}%", to_percent(store.unassigned_probability()));
        }
        Commands::Add { title, probability } => {
            let weight = parse_probability(&probability)?;
            let item = store.add_item(&title, weight)?;
            println!("Added {} ({}%)", item.title, to_percent(item.weight));
            println!("unassigned: {}%", to_percent(store.unassigned_probability()));
        }
        Commands::Edit {
            position,
            title,
            probability,
        } => {
            let index = item_index(position)?;
            let current = store
                .items()
                .get(index)
                .cloned()
                .with_context(|| format!("no item at position {position}"))?;
            let title = title.unwrap_or(current.title);
            let weight = match probability {
                Some(raw) => parse_probability(&raw)?,
                None => current.weight,
            };
            let item = store.edit_item(index, &title, weight)?;
            println!("Updated {}) {} ({}%)", position, item.title, to_percent(item.weight));
        }
        Commands::Remove { position } => {
            let removed = store.remove_item(item_index(position)?)?;
            println!("Removed {}", removed.title);
        }
        Commands::Spin { seed, svg, fps } => {
            let seed = seed.unwrap_or_else(|| {
                Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string()
            });
            let nonce = store.history().len() as u64;
            let mut rng = SeededRng::new(seed, nonce);
            let mut animator = Animator::new(config.spin.clone());
            let items = store.items().to_vec();
            let plan = animator.plan_spin(&items, &mut rng, Utc::now())?;
            info!(
                seed = rng.seed(),
                nonce,
                seed_hash = %rng.seed_hash_hex(),
                "spinning"
            );
            debug!(target_angle = plan.target_angle(), "trajectory solved");

            let frame_time = 1.0 / fps.max(1) as f64;
            let mut frame_no = 0u64;
            let mut phase = SpinPhase::Accelerating;
            let outcome = loop {
                frame_no += 1;
                let elapsed = Duration::from_secs_f64(frame_no as f64 * frame_time);
                let frame = animator.advance_and_record(elapsed, &mut store)?;
                if frame.phase != phase {
                    debug!(phase = ?frame.phase, frame_no, angle = frame.angle, "phase change");
                    phase = frame.phase;
                }
                if let Some(outcome) = frame.outcome {
                    break outcome;
                }
            };
            println!("{} ({}%)", outcome.title, to_percent(outcome.weight));
            println!(
                "seed={} nonce={} frames={}",
                rng.seed(),
                nonce,
                frame_no
            );
            if let Some(path) = svg {
                write_svg(&path, &renderer, outcome.resting_angle, &store)?;
                println!("Wrote {}", path.display());
            }
        }
        Commands::Render { path, angle } => {
            write_svg(&path, &renderer, angle, &store)?;
            println!("Wrote {}", path.display());
        }
        Commands::History { n } => {
            if store.history().is_empty() {
                println!("Empty");
            }
            for entry in store.history().iter().take(n) {
                println!(
                    "{}: {} ({}%)",
                    entry.ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                    entry.title,
                    to_percent(entry.weight)
                );
            }
        }
        Commands::Export { path } => {
            std::fs::write(&path, store.export_json()?)?;
            println!("Exported to {}", path.display());
        }
        Commands::ExportCsv { path } => {
            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record(["ts", "title", "weight", "percent"])?;
            for entry in store.history() {
                wtr.write_record(&[
                    entry.ts.to_rfc3339(),
                    entry.title.clone(),
                    entry.weight.to_string(),
                    to_percent(entry.weight),
                ])?;
            }
            wtr.flush()?;
            println!("Exported {} rows to {}", store.history().len(), path.display());
        }
        Commands::Import { source } => {
            let payload = fetch_import(&source)
                .await
                .context("Failed to fetch specified source")?;
            store
                .import_json(&payload)
                .context("Failed to parse its contents as JSON")?;
            println!(
                "Imported {} items and {} history entries",
                store.items().len(),
                store.history().len()
            );
        }
        Commands::Erase { yes } => {
            if !yes {
                bail!("refusing to erase without --yes");
            }
            store.erase()?;
            println!("Erased items and history");
        }
    }

    Ok(())
}
