//! Audit ftplet
//!
//! Logs logins and every completed file-system change under the
//! `ftplet::audit` log target. Never vetoes anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use log::info;
use parking_lot::Mutex;

use crate::error::FtpletError;
use crate::ftplet::traits::HookResult;
use crate::ftplet::{Ftplet, FtpletContext, FtpletResult};
use crate::protocol::FtpRequest;
use crate::session::FtpSession;
use crate::stats::ServerStatistics;

const TARGET: &str = "ftplet::audit";

#[derive(Default)]
pub struct AuditFtplet {
    statistics: Mutex<Option<Arc<ServerStatistics>>>,
    entries: AtomicUsize,
}

impl AuditFtplet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of audit records written so far.
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }

    fn record(&self, session: &FtpSession, action: &str, request: &FtpRequest) -> HookResult {
        self.entries.fetch_add(1, Ordering::SeqCst);
        info!(
            target: TARGET,
            "{} user={} peer={} path={}",
            action,
            session.username().unwrap_or("-"),
            session.peer_addr(),
            request.argument().unwrap_or("-")
        );
        Ok(FtpletResult::Continue)
    }
}

#[async_trait]
impl Ftplet for AuditFtplet {
    async fn init(&self, context: &FtpletContext) -> Result<(), FtpletError> {
        *self.statistics.lock() = Some(Arc::clone(context.statistics()));
        info!(target: TARGET, "audit started");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), FtpletError> {
        self.statistics.lock().take();
        info!(target: TARGET, "audit stopped after {} entries", self.entries());
        Ok(())
    }

    async fn on_connect(&self, session: &mut FtpSession) -> HookResult {
        self.entries.fetch_add(1, Ordering::SeqCst);
        info!(target: TARGET, "CONNECT session={} peer={}", session.id(), session.peer_addr());
        Ok(FtpletResult::Continue)
    }

    async fn on_disconnect(&self, session: &mut FtpSession) -> HookResult {
        self.entries.fetch_add(1, Ordering::SeqCst);
        info!(target: TARGET, "DISCONNECT session={} peer={}", session.id(), session.peer_addr());
        Ok(FtpletResult::Continue)
    }

    async fn on_login(&self, session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        self.entries.fetch_add(1, Ordering::SeqCst);
        let logins = self
            .statistics
            .lock()
            .as_ref()
            .map(|stats| stats.current_logins())
            .unwrap_or(0);
        info!(
            target: TARGET,
            "LOGIN user={} peer={} success={} current_logins={}",
            session.username().unwrap_or("-"),
            session.peer_addr(),
            session.is_logged_in(),
            logins
        );
        Ok(FtpletResult::Continue)
    }

    async fn on_upload_end(&self, session: &mut FtpSession, request: &FtpRequest) -> HookResult {
        self.record(session, "STOR", request)
    }

    async fn on_append_end(&self, session: &mut FtpSession, request: &FtpRequest) -> HookResult {
        self.record(session, "APPE", request)
    }

    async fn on_upload_unique_end(
        &self,
        session: &mut FtpSession,
        request: &FtpRequest,
    ) -> HookResult {
        self.record(session, "STOU", request)
    }

    async fn on_download_end(&self, session: &mut FtpSession, request: &FtpRequest) -> HookResult {
        self.record(session, "RETR", request)
    }

    async fn on_delete_end(&self, session: &mut FtpSession, request: &FtpRequest) -> HookResult {
        self.record(session, "DELE", request)
    }

    async fn on_rename_end(&self, session: &mut FtpSession, request: &FtpRequest) -> HookResult {
        self.record(session, "RNTO", request)
    }

    async fn on_mkdir_end(&self, session: &mut FtpSession, request: &FtpRequest) -> HookResult {
        self.record(session, "MKD", request)
    }

    async fn on_rmdir_end(&self, session: &mut FtpSession, request: &FtpRequest) -> HookResult {
        self.record(session, "RMD", request)
    }

    async fn on_site(&self, session: &mut FtpSession, request: &FtpRequest) -> HookResult {
        self.record(session, "SITE", request)
    }
}
