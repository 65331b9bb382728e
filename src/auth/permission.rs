//! Concurrent login admission
//!
//! A pure decision: given a snapshot of login counts that already includes
//! the candidate session, decide whether the login may proceed. Keeping the
//! counters consistent is the caller's job (see `ServerStatistics`).

/// Login ceilings. Zero on either field means no limit for that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConcurrentLoginPermission {
    max_logins: usize,
    max_logins_per_ip: usize,
}

/// Login counts including the candidate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrentLoginRequest {
    concurrent_logins: usize,
    concurrent_logins_from_ip: usize,
}

/// Proof that a login was admitted.
#[derive(Debug)]
#[must_use]
pub struct LoginPermit {
    _private: (),
}

impl ConcurrentLoginPermission {
    pub fn new(max_logins: usize, max_logins_per_ip: usize) -> Self {
        Self {
            max_logins,
            max_logins_per_ip,
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn max_logins(&self) -> usize {
        self.max_logins
    }

    pub fn max_logins_per_ip(&self) -> usize {
        self.max_logins_per_ip
    }

    /// Both ceilings are inclusive.
    pub fn can_authorize(&self, request: &ConcurrentLoginRequest) -> bool {
        within(self.max_logins, request.concurrent_logins)
            && within(self.max_logins_per_ip, request.concurrent_logins_from_ip)
    }

    pub fn authorize(&self, request: &ConcurrentLoginRequest) -> Option<LoginPermit> {
        self.can_authorize(request)
            .then_some(LoginPermit { _private: () })
    }
}

fn within(ceiling: usize, count: usize) -> bool {
    ceiling == 0 || count <= ceiling
}

impl ConcurrentLoginRequest {
    pub fn new(concurrent_logins: usize, concurrent_logins_from_ip: usize) -> Self {
        Self {
            concurrent_logins,
            concurrent_logins_from_ip,
        }
    }

    pub fn concurrent_logins(&self) -> usize {
        self.concurrent_logins
    }

    pub fn concurrent_logins_from_ip(&self) -> usize {
        self.concurrent_logins_from_ip
    }
}

/// Evaluates `request` against `rule`; `None` means the login is denied.
pub fn evaluate(
    rule: &ConcurrentLoginPermission,
    request: &ConcurrentLoginRequest,
) -> Option<LoginPermit> {
    rule.authorize(request)
}
