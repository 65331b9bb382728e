//! FTP Protocol implementation
//!
//! Handles request parsing and reply encoding.

pub mod reply;
pub mod request;
pub mod responses;

pub use reply::{FtpReply, ReplyMessage, encode_reply};
pub use request::FtpRequest;
