//! The `Ftplet` capability
//!
//! One hook per lifecycle event. Every hook has a default implementation
//! returning [`FtpletResult::Continue`], so an ftplet only overrides the events
//! it cares about.

use async_trait::async_trait;

use crate::error::FtpletError;
use crate::ftplet::FtpletContext;
use crate::protocol::FtpRequest;
use crate::session::FtpSession;

/// Outcome of a single hook invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtpletResult {
    /// Proceed with the next ftplet and with default command processing.
    #[default]
    Continue,
    /// Suppress default command processing; the session stays open.
    Skip,
    /// Terminate the session.
    Disconnect,
}

impl FtpletResult {
    pub fn is_continue(self) -> bool {
        self == FtpletResult::Continue
    }
}

/// Hook result type shared by every event method.
pub type HookResult = Result<FtpletResult, FtpletError>;

#[async_trait]
pub trait Ftplet: Send + Sync {
    /// Called exactly once, either at container init or at registration
    /// when the container is already initialized. The context may be kept
    /// and used later to reach other ftplets with [`FtpletContext::ftplet`].
    async fn init(&self, _context: &FtpletContext) -> Result<(), FtpletError> {
        Ok(())
    }

    /// Called once when the container is destroyed, also after a failed
    /// server startup, even if this ftplet's own `init` never ran.
    async fn destroy(&self) -> Result<(), FtpletError> {
        Ok(())
    }

    /// `Skip` only stops later ftplets and the greeting still goes out;
    /// `Disconnect` closes the connection without one.
    async fn on_connect(&self, _session: &mut FtpSession) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_disconnect(&self, _session: &mut FtpSession) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    /// Runs after every PASS command, successful or not.
    async fn on_login(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_delete_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_delete_end(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_upload_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_upload_end(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_download_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_download_end(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_rmdir_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_rmdir_end(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_mkdir_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_mkdir_end(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_append_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_append_end(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_upload_unique_start(
        &self,
        _session: &mut FtpSession,
        _request: &FtpRequest,
    ) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_upload_unique_end(
        &self,
        _session: &mut FtpSession,
        _request: &FtpRequest,
    ) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_rename_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_rename_end(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }

    async fn on_site(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Ok(FtpletResult::Continue)
    }
}
