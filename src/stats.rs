//! Server statistics
//!
//! Connection and login counters shared by every session. The login counts
//! feed the concurrent-login admission check: a login attempt reserves a
//! slot first and evaluates the snapshot it got back, so two concurrent
//! attempts can never both see the last free slot.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::auth::ConcurrentLoginRequest;

#[derive(Default)]
struct LoginCounts {
    total: usize,
    per_ip: HashMap<IpAddr, usize>,
}

pub struct ServerStatistics {
    started: Instant,
    current_connections: AtomicUsize,
    total_connections: AtomicUsize,
    total_logins: AtomicUsize,
    failed_logins: AtomicUsize,
    logins: Mutex<LoginCounts>,
}

impl Default for ServerStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerStatistics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            current_connections: AtomicUsize::new(0),
            total_connections: AtomicUsize::new(0),
            total_logins: AtomicUsize::new(0),
            failed_logins: AtomicUsize::new(0),
            logins: Mutex::new(LoginCounts::default()),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn connection_opened(&self) {
        self.current_connections.fetch_add(1, Ordering::SeqCst);
        self.total_connections.fetch_add(1, Ordering::SeqCst);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .current_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Counts a login attempt from `ip` and returns the counts including it.
    ///
    /// Every reservation must be paired with [`release_login`](Self::release_login),
    /// whether the login is admitted or not.
    pub fn reserve_login(&self, ip: IpAddr) -> ConcurrentLoginRequest {
        let mut logins = self.logins.lock();
        logins.total += 1;
        let from_ip = logins.per_ip.entry(ip).or_insert(0);
        *from_ip += 1;
        let from_ip = *from_ip;
        ConcurrentLoginRequest::new(logins.total, from_ip)
    }

    pub fn release_login(&self, ip: IpAddr) {
        let mut logins = self.logins.lock();
        logins.total = logins.total.saturating_sub(1);
        if let Some(count) = logins.per_ip.get_mut(&ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                logins.per_ip.remove(&ip);
            }
        }
    }

    pub fn login_succeeded(&self) {
        self.total_logins.fetch_add(1, Ordering::SeqCst);
    }

    pub fn login_failed(&self) {
        self.failed_logins.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current_connections(&self) -> usize {
        self.current_connections.load(Ordering::SeqCst)
    }

    pub fn total_connections(&self) -> usize {
        self.total_connections.load(Ordering::SeqCst)
    }

    pub fn current_logins(&self) -> usize {
        self.logins.lock().total
    }

    pub fn current_logins_from(&self, ip: IpAddr) -> usize {
        self.logins.lock().per_ip.get(&ip).copied().unwrap_or(0)
    }

    pub fn total_logins(&self) -> usize {
        self.total_logins.load(Ordering::SeqCst)
    }

    pub fn failed_logins(&self) -> usize {
        self.failed_logins.load(Ordering::SeqCst)
    }
}
