use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use bag_runtime::report::RuntimeReport;
use bag_runtime::{BagRuntime, Hosts};

/// Headless driver: load world scripts, run frames and turns, report.
#[derive(Parser, Debug)]
#[command(
    about = "Loads scene world scripts and reports object/variable state",
    version
)]
struct Args {
    /// World script file(s); the first one becomes the current scene
    #[arg(long = "world", required = true)]
    worlds: Vec<PathBuf>,

    /// Rendered frames to run after loading
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Game turns to advance after the frames
    #[arg(long, default_value_t = 0)]
    turns: u32,

    /// Seed for the random variable stream (omit for entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Path to write the session report JSON
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Path to write the object snapshot records JSON
    #[arg(long)]
    save_json: Option<PathBuf>,

    /// Print parse reports for every loaded world
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut runtime = match args.seed {
        Some(seed) => BagRuntime::with_seed(Hosts::default(), seed),
        None => BagRuntime::new(Hosts::default()),
    };

    for (i, path) in args.worlds.iter().enumerate() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading world script {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_uppercase())
            .unwrap_or_else(|| format!("WORLD{i}"));
        let report = runtime
            .load_world(&name, &text, i == 0)
            .with_context(|| format!("loading world {name}"))?;
        if args.verbose || !report.is_clean() {
            println!(
                "{name}: {} objects, {} expressions, {} warnings, {} errors",
                report.objects,
                report.expressions,
                report.warnings.len(),
                report.errors.len()
            );
            for warning in &report.warnings {
                println!("  line {}: {}", warning.line, warning.message);
            }
            for error in &report.errors {
                println!("  line {}: {} (error)", error.line, error.message);
            }
        }
    }

    for _ in 0..args.frames {
        runtime.render_frame().context("rendering frame")?;
    }
    for _ in 0..args.turns {
        runtime.advance_turn();
    }

    let report = RuntimeReport::capture(&runtime);
    match &args.json_report {
        Some(path) => {
            let json = serde_json::to_string_pretty(&report)?;
            fs::write(path, json)
                .with_context(|| format!("writing report to {}", path.display()))?;
            println!("report written to {}", path.display());
        }
        None => {
            println!(
                "{} device(s), {} variable(s), turn {}",
                report.devices.len(),
                report.variables.len(),
                report.turn_count
            );
        }
    }

    if let Some(path) = &args.save_json {
        let records = runtime.save_state();
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(path, json)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        println!("snapshot written to {}", path.display());
    }

    Ok(())
}
