use std::path::Path;

use actlog_core::ActlogConfig;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Activity-log CSV export job", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "actlog.toml")]
    config: String,

    /// Override the configured output directory
    #[arg(long)]
    out_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match ActlogConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.service.log_level.clone())),
        )
        .init();

    let pool = match actlog_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    let out_dir = args.out_dir.unwrap_or(config.export.output_dir);
    let run_ts = actlog_export::run_timestamp();

    match actlog_export::run_export(&pool, Path::new(&out_dir), &run_ts).await {
        Ok(written) => {
            tracing::info!("Export run {} complete: {} files written", run_ts, written.len());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Export run {} aborted: {}", run_ts, e);
            std::process::exit(1);
        }
    }
}
