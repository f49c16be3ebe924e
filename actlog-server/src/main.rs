use clap::Parser;
use actlog_core::ActlogConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Activity-log ingestion service", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "actlog.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config first: its log_level seeds the default filter.
    let config = match ActlogConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.service.log_level.clone())),
        )
        .init();

    // Connect to the store
    let pool = match actlog_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    if args.health {
        match actlog_core::db::health_check(&pool).await {
            Ok(v) => println!("SQLite connected: {}", v),
            Err(e) => {
                println!("SQLite connection failed: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Idempotent create-if-absent before accepting requests
    actlog_core::db::init_schema(&pool).await?;
    tracing::info!("Database initialized at {}", config.database.path);

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let addr = format!("{}:{}", config.http.host, config.http.port);
    actlog_server::http::start_http_server(pool, &addr, tx.subscribe()).await?;

    Ok(())
}
