//! Ftplet extension system
//!
//! Ftplets are pluggable handlers that receive session lifecycle and
//! command events. The container keeps them in registration order and fans
//! every event out across the chain.

pub mod container;
pub mod context;
pub mod event;
pub mod traits;

pub use container::FtpletContainer;
pub use context::FtpletContext;
pub use event::{FtpletEvent, after_command_event, before_command_event};
pub use traits::{Ftplet, FtpletResult};
