use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use voxel_session_server::app;
use voxel_session_server::config::ServerConfig;
use voxel_session_server::platform::LocalPlatform;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::parse();
    app::init_tracing(&config.log_level);

    tracing::info!("Voxel session server starting (game port {})", config.port);

    match app::run(config, Arc::new(LocalPlatform::new())).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
