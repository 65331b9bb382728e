//! Error handlers
//!
//! Provides error logging and reply-code mapping.

use crate::error::types::{AuthError, ChainError, ServerError};
use crate::protocol::responses;
use log::error;

/// Log a server error
pub fn handle_error(err: &ServerError) {
    error!("FTP Server Error: {}", err);
}

/// Convert error to FTP reply code
pub fn error_to_reply_code(err: &ServerError) -> u16 {
    match err {
        ServerError::Auth(AuthError::MalformedInput(_)) => responses::SYNTAX_ERROR_ARGS,
        ServerError::Auth(_) => responses::NOT_LOGGED_IN,
        ServerError::Chain(ChainError::Hook { .. }) => responses::LOCAL_ERROR,
        ServerError::Chain(_) => responses::SERVICE_NOT_AVAILABLE,
        ServerError::Io(_) => responses::LOCAL_ERROR,
        ServerError::Config(_) => responses::SERVICE_NOT_AVAILABLE,
    }
}
