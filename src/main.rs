use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fuelgraph::{render_dashboard, Dataset, FuelError, RenderOptions, Selection};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const EXIT_INVALID_SELECTION: i32 = 2;
const EXIT_NO_DATA: i32 = 3;

#[derive(Parser, Debug)]
#[command(name = "fuelgraph")]
#[command(about = "Render petrol consumption charts for an area and year", long_about = None)]
struct Args {
    /// Consumption CSV with Area, Year, Month and Petrol Consumption (Liters) columns
    #[arg(long, short = 'd')]
    data: PathBuf,

    /// JSON render options (width, height, type, bins, output_dir)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the distinct areas, years and months in the dataset
    Options,

    /// Render all six charts for one area and year
    Dashboard {
        #[arg(long)]
        area: String,

        #[arg(long)]
        year: String,

        /// Echoed in the report; does not narrow the selection
        #[arg(long)]
        month: Option<String>,

        /// Output root; overrides output_dir from the config file
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!("Arguments: {:?}", args);

    // A malformed dataset stops the process before any request is served
    let dataset = Dataset::from_path(&args.data).context("Failed to load dataset")?;

    match args.command {
        Command::Options => write_json(&dataset.options()),
        Command::Dashboard {
            area,
            year,
            month,
            out,
        } => {
            let mut options = match &args.config {
                Some(path) => RenderOptions::load_from(path)
                    .context(format!("Failed to load config '{}'", path.display()))?,
                None => RenderOptions::default(),
            };
            if let Some(out) = out {
                options.output_dir = out;
            }

            let selection = match Selection::parse(Some(&area), Some(&year), month.as_deref()) {
                Ok(selection) => selection,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(EXIT_INVALID_SELECTION);
                }
            };

            match render_dashboard(&dataset, &selection, &options) {
                Ok(report) => {
                    for failure in &report.failures {
                        warn!("{} chart was not rendered: {}", failure.chart, failure.error);
                    }
                    write_json(&report)
                }
                Err(e @ FuelError::NoData { .. }) => {
                    println!("{}", e);
                    std::process::exit(EXIT_NO_DATA);
                }
                Err(e) => Err(e).context("Failed to render dashboard"),
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).context("Failed to serialize output")?;
    writeln!(handle).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
