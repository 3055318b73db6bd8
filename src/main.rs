// src/main.rs

use std::time::Duration;

use cbt_exam::config::{Config, DB_CONNECT_RETRIES};
use cbt_exam::models::exam::Exam;
use cbt_exam::store::SqliteStore;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "cbt.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Open the store with retry
    let mut retry_count = 0;
    let store = loop {
        match SqliteStore::connect(&config.database_url).await {
            Ok(store) => break store,
            Err(e) => {
                retry_count += 1;
                if retry_count > DB_CONNECT_RETRIES {
                    tracing::error!(
                        "Failed to open database after {} retries: {}",
                        DB_CONNECT_RETRIES,
                        e
                    );
                    return Err(e.into());
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    store.migrate().await?;
    tracing::info!("Migrations applied successfully.");

    // Seed Exams
    if let Err(e) = seed_exams(&store, &config).await {
        tracing::error!("Failed to seed exams: {}", e);
        return Err(e);
    }

    tracing::info!(
        "Exam store ready at {} (scoring: {}, tick: {:?})",
        config.database_url,
        config.scoring_policy.as_str(),
        config.tick_interval
    );
    Ok(())
}

/// Loads exam definitions from `SEED_EXAMS_PATH` (a JSON array) into the store.
async fn seed_exams(store: &SqliteStore, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &config.seed_exams_path {
        let raw = tokio::fs::read_to_string(path).await?;
        let exams: Vec<Exam> = serde_json::from_str(&raw)?;

        tracing::info!("Seeding {} exams from {}", exams.len(), path.display());
        for exam in &exams {
            store.insert_exam(exam).await?;
        }
        tracing::info!("Exams seeded successfully.");
    }
    Ok(())
}
