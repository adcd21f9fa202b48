use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use kb_extract::{Pipeline, PipelineConfig};

/// Extract knowledge-base relations from encyclopedia dump summaries.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the raw dump the upstream extraction consumed.
    dump: PathBuf,
    /// JSON file mapping language codes to per-language settings.
    language_file: PathBuf,
    /// Language code to extract (must appear in the language file).
    language_code: String,
    /// Sentence-detection model used by the upstream extraction.
    sentence_model: PathBuf,
    /// Directory for per-stage outputs and checkpoints.
    working_dir: PathBuf,
    /// Directory the finished relations are published into.
    final_dir: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = PipelineConfig {
        dump_path: args.dump,
        language_file: args.language_file,
        language_code: args.language_code,
        sentence_model: args.sentence_model,
        working_dir: args.working_dir,
        final_dir: args.final_dir,
    };

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match pipeline.run() {
        Ok(report) => {
            println!(
                "extracted {} pages and {} labels in {} depth supersteps ({} pages dropped)",
                report.pages_written,
                report.labels_written,
                report.depth_supersteps,
                report.pages_dropped
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "pipeline failed");
            ExitCode::FAILURE
        }
    }
}
