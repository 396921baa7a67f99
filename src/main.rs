use std::process::ExitCode;

use log::{error, info};

/// Used when `RUST_LOG` is unset; sqlx logs every statement at info.
const DEFAULT_LOG_FILTER: &str = "ollabot=info,serenity=warn,sqlx=warn";

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .format_timestamp_millis()
        .init();
    info!("ollabot {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = ollabot::run().await {
        error!("ollabot stopped with an error: {e}");
        return ExitCode::FAILURE;
    }

    info!("ollabot stopped");
    ExitCode::SUCCESS
}
