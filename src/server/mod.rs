//! Server core functionality
//!
//! Accept loop, ftplet chain bootstrap and shutdown.

pub mod core;

pub use core::Server;
