use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use wsi::config::Config;
use wsi::observability::{init_logging, metrics};
use wsi::pipeline::Pipeline;
use wsi::registry::{build_adapters, load_sources, ReferenceData};
use wsi::types::SourceTag;

#[derive(Parser)]
#[command(name = "wsi")]
#[command(about = "Women's Safety Index panel pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to ./wsi.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the indicator source files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Directory for the output tables
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Source registry (relative to the data directory unless absolute)
    #[arg(long, global = true)]
    sources: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the panel, fill gaps, apply overrides and score
    Run,
    /// Ingest and assemble only; report schema violations and missingness
    Validate,
    /// Print the indicator table
    Indicators,
    /// Print countries the reference tables cannot fully resolve
    Reference,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = dir.clone();
        }
        if let Some(file) = &self.sources {
            config.sources_file = file.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);
    let reference = ReferenceData::builtin();

    match cli.command {
        Commands::Run => {
            let _guard = init_logging(&config.log_dir);
            metrics::init();
            let sources = load_sources(&config.sources_path(), reference)?;
            let adapters = build_adapters(&sources, &config.data_dir)?;

            match Pipeline::run(&config, reference, adapters).await {
                Ok(result) => {
                    println!("\n📊 Index run {}", result.diagnostics.run_id);
                    println!("   Countries with fully missing indicators: {}", result.missingness.len());
                    println!("   Temporal fills: {}", result.temporal_cells);
                    println!("   Region average fills: {}", result.fill_report.region_avg_cells);
                    println!("   Income average fills: {}", result.fill_report.income_avg_cells);
                    println!("   Skipped group fills: {}", result.fill_report.skipped);
                    for (rule, count) in &result.override_counts {
                        println!("   Override {}: {}", rule, count);
                    }
                    println!("   Cells left absent: {}", result.cell_count(SourceTag::None));
                    println!("   Output file: {}", result.paths.scored_table.display());
                }
                Err(e) => {
                    error!("Index run failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Validate => {
            let _guard = init_logging(&config.log_dir);
            let sources = load_sources(&config.sources_path(), reference)?;
            let adapters = build_adapters(&sources, &config.data_dir)?;
            let report = Pipeline::validate(reference, adapters).await?;

            info!("Validation passed");
            println!("✅ {} values joined", report.assembly.rows_joined);
            println!(
                "   Rows outside {}..={}: {}",
                reference.first_year(),
                reference.last_year(),
                report.assembly.rows_out_of_range
            );
            for input in &report.diagnostics.inputs {
                println!("   {:<30} {:>6} rows", input.indicator, input.rows);
            }
            for entry in &report.missingness {
                println!(
                    "   {} ({}): {} missing: {}",
                    entry.iso_code, entry.country, entry.missing_count, entry.indicators
                );
            }
        }
        Commands::Indicators => {
            println!("{:<30} {:<12} {:<7} FILL", "INDICATOR", "DIMENSION", "INVERT");
            for def in reference.indicators() {
                let fill = serde_json::to_value(&def.fill)?;
                println!(
                    "{:<30} {:<12} {:<7} {}",
                    def.name,
                    def.dimension.as_str(),
                    def.invert,
                    fill.as_str().unwrap_or_default()
                );
            }
        }
        Commands::Reference => {
            let misses = reference.lookup_misses();
            println!(
                "{} countries, {} excluded, years {}..={}",
                reference.countries().len(),
                reference.countries().iter().filter(|c| reference.is_excluded(c)).count(),
                reference.first_year(),
                reference.last_year()
            );
            if misses.is_empty() {
                println!("All countries resolve in every lookup table");
            }
            for miss in misses {
                println!("   {} has no {} mapping", miss.iso_code, miss.table);
            }
        }
    }

    Ok(())
}
