//! Extensible command-processing core of an FTP server.
//!
//! Incoming commands are turned into session lifecycle events and fanned
//! out across an ordered chain of ftplets; logins are gated by a
//! concurrent-login admission rule.

pub mod auth;
pub mod config;
pub mod error;
pub mod ftplet;
pub mod ftplets;
pub mod protocol;
pub mod server;
pub mod session;
pub mod stats;

pub use ftplet::{Ftplet, FtpletContainer, FtpletContext, FtpletEvent, FtpletResult};
pub use protocol::{FtpReply, FtpRequest};
pub use server::Server;
pub use session::FtpSession;
