//! ftplet FTP server - Entry Point

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};

use ftplet_server::config::ServerConfig;
use ftplet_server::error::{ServerError, handle_error};
use ftplet_server::ftplets::AuditFtplet;
use ftplet_server::{FtpletContainer, Server};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching FTP server...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handle_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let container = Arc::new(FtpletContainer::new());
    if config.audit_enabled {
        container
            .add_ftplet("audit", Arc::new(AuditFtplet::new()))
            .await?;
    }

    let server = Server::bind(config, container).await?;
    server.start().await
}
