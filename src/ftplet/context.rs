//! Ftplet initialization context
//!
//! Server-wide services handed to every ftplet's `init`, including a way to
//! reach other ftplets registered in the same chain by name.

use std::sync::{Arc, Weak};

use crate::auth::UserManager;
use crate::ftplet::{Ftplet, FtpletContainer};
use crate::stats::ServerStatistics;

#[derive(Clone)]
pub struct FtpletContext {
    user_manager: Arc<dyn UserManager>,
    statistics: Arc<ServerStatistics>,
    container: Weak<FtpletContainer>,
}

impl FtpletContext {
    pub fn new(user_manager: Arc<dyn UserManager>, statistics: Arc<ServerStatistics>) -> Self {
        Self {
            user_manager,
            statistics,
            container: Weak::new(),
        }
    }

    /// Attaches the chain that `ftplet` lookups resolve against.
    ///
    /// Held weakly: a context stored by an ftplet must not keep its own
    /// container alive.
    pub fn with_container(mut self, container: &Arc<FtpletContainer>) -> Self {
        self.container = Arc::downgrade(container);
        self
    }

    pub fn user_manager(&self) -> &Arc<dyn UserManager> {
        &self.user_manager
    }

    pub fn statistics(&self) -> &Arc<ServerStatistics> {
        &self.statistics
    }

    /// Looks up a registered ftplet by name.
    ///
    /// Returns `None` for unknown names, after the container is dropped, or
    /// when no container was attached.
    pub fn ftplet(&self, name: &str) -> Option<Arc<dyn Ftplet>> {
        self.container.upgrade()?.find_ftplet(name)
    }
}
