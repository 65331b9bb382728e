//! Session state
//!
//! `FtpSession` is what ftplet hooks see: who is connected, whether they
//! have logged in, free-form attributes, and an outbox for replies.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::protocol::FtpReply;

pub struct FtpSession {
    id: u64,
    peer_addr: SocketAddr,
    username: Option<String>,
    logged_in: bool,
    attributes: HashMap<String, String>,
    outbox: Vec<FtpReply>,
}

impl FtpSession {
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            username: None,
            logged_in: false,
            attributes: HashMap::new(),
            outbox: Vec::new(),
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// User name given with USER, whether or not the login has completed.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    // --------------------
    // Setter methods
    // --------------------

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    pub(crate) fn set_username(&mut self, username: Option<String>) {
        self.username = username;
    }

    /// A logged-in session always holds one concurrent-login slot.
    pub(crate) fn set_logged_in(&mut self, logged_in: bool) {
        self.logged_in = logged_in;
    }

    /// Clears the login. Returns true if the session was logged in, meaning
    /// its login slot must be released.
    pub(crate) fn logout(&mut self) -> bool {
        let was_logged_in = self.logged_in;
        self.username = None;
        self.logged_in = false;
        was_logged_in
    }

    // --------------------
    // Replies
    // --------------------

    /// Queues a reply; the command loop sends it once the current dispatch
    /// finishes.
    pub fn write(&mut self, reply: FtpReply) {
        self.outbox.push(reply);
    }

    pub fn has_pending_replies(&self) -> bool {
        !self.outbox.is_empty()
    }

    pub(crate) fn take_replies(&mut self) -> Vec<FtpReply> {
        std::mem::take(&mut self.outbox)
    }
}
