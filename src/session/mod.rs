//! FTP sessions
//!
//! Per-connection state, the base command handlers and the command loop
//! that runs every command through the ftplet chain.

pub mod commands;
pub mod handler;
pub mod state;

pub use commands::{CommandResult, CommandStatus};
pub use handler::{SessionServices, handle_session};
pub use state::FtpSession;
