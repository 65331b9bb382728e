//! Built-in ftplets
//!
//! Extensions shipped with the server and enabled from configuration.

pub mod audit;

pub use audit::AuditFtplet;
