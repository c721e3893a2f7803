use clap::Parser;
use colored::Colorize;
use flights_processor::cli::Args;
use flights_processor::models::PipelineStats;
use flights_processor::pipeline::FlightPipeline;
use flights_processor::storage::ParquetStorage;
use flights_processor::{ingest, metadata};
use std::process;
use tracing::info;

fn main() {
    let args = Args::parse();

    if let Err(error) = run(args) {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    setup_logging(args.verbose);
    let config = args.pipeline_config()?;

    let metadata = metadata::read_metadata(&args.metadata_path)?;
    let raw = ingest::read_csv(&args.input_path)?;

    let pipeline = FlightPipeline::new(metadata, config.clone());
    let mut result = pipeline.run(raw)?;

    let storage = ParquetStorage::new(args.output_dir(), config.compression);
    let output_path = storage.write(&mut result.table, pipeline.table_name())?;
    result.stats.output_path = output_path;

    let preview = storage.preview(pipeline.table_name(), config.preview_rows)?;
    info!("Stored table preview:\n{}", preview);

    print_summary(pipeline.table_name(), &result.stats);
    Ok(())
}

fn print_summary(table_name: &str, stats: &PipelineStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!("  {} {}", "Table:".bright_cyan(), table_name.bright_white());
    println!(
        "  {} {}",
        "Rows read:".bright_cyan(),
        stats.rows_read.to_string().bright_white()
    );
    if stats.rows_removed_by_keys > 0 {
        println!(
            "  {} {}",
            "Rows removed by key checks:".bright_cyan(),
            stats.rows_removed_by_keys.to_string().bright_red()
        );
    }
    println!(
        "  {} {} rows x {} columns",
        "Written:".bright_cyan(),
        stats.rows_written.to_string().bright_white().bold(),
        stats.columns_written.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        stats.output_path.display()
    );
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
}

/// Set up structured logging, switched by the verbose flag
fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flights_processor={default_level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
