use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use pf_engine::{DataCollector, Engine, EngineError, EngineOptions, ModelFactory, VolumeGuard};
use pf_project::ProjectError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pf-cli")]
#[command(about = "PhysioFlow CLI - fixed-step physiological circulation simulator", long_about = None)]
struct Cli {
    /// Print build and run timing (same as setting PF_TIMING)
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    /// Aligned columns
    #[default]
    Table,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model file and check that it builds
    Validate {
        /// Path to the model YAML or JSON file
        model_path: PathBuf,
    },
    /// Run a model for a fixed duration
    Run {
        /// Path to the model YAML or JSON file
        model_path: PathBuf,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
        /// Property to sample, e.g. LV.pres (repeatable)
        #[arg(long = "watch")]
        watch: Vec<String>,
        /// Sample interval in seconds
        #[arg(long, default_value_t = 0.01)]
        interval: f64,
        /// Clamp negative volumes to zero instead of aborting
        #[arg(long)]
        clamp_volume: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
        /// Write samples here instead of stdout
        #[arg(short = 'o', long)]
        out_file: Option<PathBuf>,
        /// Write the final state as a model file
        #[arg(long)]
        save_state: Option<PathBuf>,
    },
    /// List components in build order
    Inspect {
        /// Path to the model YAML or JSON file
        model_path: PathBuf,
        /// Also list every attribute value
        #[arg(long)]
        attributes: bool,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.timing {
        pf_core::timing::enable_timing();
    }

    match cli.command {
        Commands::Validate { model_path } => cmd_validate(&model_path),
        Commands::Run {
            model_path,
            duration,
            watch,
            interval,
            clamp_volume,
            output,
            out_file,
            save_state,
        } => cmd_run(
            &model_path,
            RunArgs {
                duration,
                watch,
                interval,
                clamp_volume,
                output,
                out_file,
                save_state,
            },
        ),
        Commands::Inspect {
            model_path,
            attributes,
        } => cmd_inspect(&model_path, attributes),
    }
}

struct RunArgs {
    duration: f64,
    watch: Vec<String>,
    interval: f64,
    clamp_volume: bool,
    output: OutputFormat,
    out_file: Option<PathBuf>,
    save_state: Option<PathBuf>,
}

fn cmd_validate(model_path: &Path) -> CliResult<()> {
    println!("Validating model: {}", model_path.display());
    let model = pf_project::load(model_path)?;
    let engine = Engine::build(&model)?;
    println!("✓ Model is valid ({} components)", engine.len());
    Ok(())
}

fn cmd_run(model_path: &Path, args: RunArgs) -> CliResult<()> {
    let model = pf_project::load(model_path)?;
    let options = EngineOptions {
        volume_guard: if args.clamp_volume {
            VolumeGuard::Clamp
        } else {
            VolumeGuard::Abort
        },
    };
    let mut engine = Engine::build_with(&model, &ModelFactory::default(), options)?;

    let mut collector = DataCollector::new(args.watch, args.interval)?;
    collector.check(&engine)?;
    collector.sample(&engine)?;

    println!(
        "Running '{}' for {:.3} s (dt = {} s)",
        engine.name(),
        args.duration,
        engine.time_step()
    );
    let warned = engine.run(args.duration, &mut collector)?;
    info!(ticks = engine.ticks(), warned, "finished");

    let text = match args.output {
        OutputFormat::Csv => collector.to_csv(),
        OutputFormat::Table => render_table(&collector),
    };
    match &args.out_file {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("✓ Wrote {} samples to {}", collector.rows().len(), path.display());
        }
        None if !collector.paths().is_empty() => print!("{text}"),
        None => {}
    }

    if !engine.diagnostics().is_empty() {
        println!("Numeric warnings:");
        for (component, count) in engine.diagnostics() {
            println!("  {component}: {count}");
        }
    }
    for line in engine.stats().summary_lines() {
        println!("{line}");
    }

    if let Some(path) = &args.save_state {
        let state = engine.export_state();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => pf_project::save_json(path, &state)?,
            _ => pf_project::save_yaml(path, &state)?,
        }
        println!("✓ State saved to {}", path.display());
    }
    Ok(())
}

fn render_table(collector: &DataCollector) -> String {
    let width = collector
        .paths()
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(12);
    let mut out = format!("{:>10}", "time");
    for path in collector.paths() {
        out.push_str(&format!("  {path:>width$}"));
    }
    out.push('\n');
    for row in collector.rows() {
        out.push_str(&format!("{:>10.4}", row.time));
        for v in &row.values {
            out.push_str(&format!("  {v:>width$.4}"));
        }
        out.push('\n');
    }
    out
}

fn cmd_inspect(model_path: &Path, attributes: bool) -> CliResult<()> {
    let model = pf_project::load(model_path)?;
    let engine = Engine::build(&model)?;

    println!("Model: {}", engine.name());
    if !model.description.is_empty() {
        println!("  {}", model.description);
    }
    println!("  Time step: {} s", engine.time_step());
    println!("Components (build order):");
    for (i, c) in engine.components().enumerate() {
        let state = if c.meta().enabled { "" } else { " [disabled]" };
        println!("  {:>3}  {:<20} {}{}", i, c.name(), c.model_type(), state);
        if attributes {
            for key in c.attribute_keys() {
                if let Some(value) = c.attribute(key) {
                    println!("         {key} = {value}");
                }
            }
        }
    }
    Ok(())
}
