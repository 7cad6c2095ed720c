//! `canhunt` - run a kick-the-can game server.

use std::process::ExitCode;
use std::time::Duration;

use canhunt::{load_game_config, Args, CanhuntError, CanhuntServer};
use canhunt_core::GameConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CanhuntError> {
    let game_config = match &args.config {
        Some(path) => load_game_config(path)?,
        None => GameConfig::default(),
    };

    let server = CanhuntServer::builder()
        .bind(&args.bind)
        .game_config(game_config)
        .frame_rate(args.frame_rate)
        .max_spectators(args.max_spectators)
        .idle_timeout(Duration::from_secs(args.idle_timeout))
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, frame_rate = args.frame_rate, "listening");

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
