//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.

use std::io;

use thiserror::Error;

use crate::ftplet::FtpletEvent;

/// Failure raised by an ftplet from one of its hooks.
#[derive(Debug, Error)]
pub enum FtpletError {
    #[error("{0}")]
    Failed(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FtpletError {
    pub fn failed(msg: impl Into<String>) -> Self {
        FtpletError::Failed(msg.into())
    }
}

/// One ftplet that failed to clean up during a chain-wide destroy.
#[derive(Debug)]
pub struct DestroyFailure {
    pub name: String,
    pub source: FtpletError,
}

/// Ftplet container errors
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("an ftplet named '{0}' is already registered")]
    DuplicateName(String),

    #[error("ftplet '{name}' failed to initialize: {source}")]
    Init {
        name: String,
        #[source]
        source: FtpletError,
    },

    #[error("ftplet '{name}' failed in {event}: {source}")]
    Hook {
        name: String,
        event: FtpletEvent,
        #[source]
        source: FtpletError,
    },

    #[error("{} ftplet(s) failed to destroy: {}", .0.len(), destroy_names(.0))]
    Destroy(Vec<DestroyFailure>),
}

fn destroy_names(failures: &[DestroyFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.name, f.source))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Authentication module errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),
    #[error("Invalid password for user: {0}")]
    InvalidPassword(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

/// General FTP server error used by bootstrap and shutdown
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Ftplet chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}
