//! Authentication and login admission
//!
//! Handles user credential validation and the concurrent-login rule that
//! gates session establishment.

pub mod permission;
pub mod users;

pub use permission::{ConcurrentLoginPermission, ConcurrentLoginRequest, LoginPermit, evaluate};
pub use users::{InMemoryUserManager, User, UserManager};
