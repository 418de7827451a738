//! Cardiorisk: Heart disease risk prediction form
//!
//! Main entry point for the terminal application.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::config::LogMode;
use cardiorisk::tui::App;
use cardiorisk::{AppConfig, PredictorGateway};

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize logging.
    //
    // Writing logs to the terminal would corrupt the TUI (alternate screen):
    // an interactive TTY logs to a file, anything else to stdout.
    let use_file = match config.log_mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => std::io::stdout().is_terminal(),
    };

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    tracing::info!("Starting Cardiorisk...");

    // Refuse to start without a usable model.
    let gateway = PredictorGateway::new(config.artifact_loader())
        .with_missing_value_policy(config.missing_values);
    gateway.initialize().with_context(|| {
        format!(
            "Failed to load model from {}. Set CARDIORISK_MODEL_PATH to the heart_model.json artifact.",
            config.model_path.display()
        )
    })?;

    let mut app = App::new(Arc::new(gateway));
    app.run()?;

    tracing::info!("Cardiorisk shutdown complete.");
    Ok(())
}
