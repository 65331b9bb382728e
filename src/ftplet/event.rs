//! Ftplet events and the command-to-event table
//!
//! Maps wire verbs to the hook that runs before the command executes (so an
//! ftplet can veto it) and the hook that runs after it (audit/notification).

use std::fmt;

use crate::error::FtpletError;
use crate::ftplet::{Ftplet, FtpletResult};
use crate::protocol::FtpRequest;
use crate::session::FtpSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FtpletEvent {
    Connect,
    Disconnect,
    Login,
    DeleteStart,
    DeleteEnd,
    UploadStart,
    UploadEnd,
    DownloadStart,
    DownloadEnd,
    RmdirStart,
    RmdirEnd,
    MkdirStart,
    MkdirEnd,
    AppendStart,
    AppendEnd,
    UploadUniqueStart,
    UploadUniqueEnd,
    RenameStart,
    RenameEnd,
    Site,
}

/// Verb, before-hook, after-hook. Matched case-sensitively.
const COMMAND_EVENTS: &[(&str, Option<FtpletEvent>, Option<FtpletEvent>)] = &[
    ("DELE", Some(FtpletEvent::DeleteStart), Some(FtpletEvent::DeleteEnd)),
    ("STOR", Some(FtpletEvent::UploadStart), Some(FtpletEvent::UploadEnd)),
    ("RETR", Some(FtpletEvent::DownloadStart), Some(FtpletEvent::DownloadEnd)),
    ("RMD", Some(FtpletEvent::RmdirStart), Some(FtpletEvent::RmdirEnd)),
    ("MKD", Some(FtpletEvent::MkdirStart), Some(FtpletEvent::MkdirEnd)),
    ("APPE", Some(FtpletEvent::AppendStart), Some(FtpletEvent::AppendEnd)),
    ("STOU", Some(FtpletEvent::UploadUniqueStart), Some(FtpletEvent::UploadUniqueEnd)),
    ("RNTO", Some(FtpletEvent::RenameStart), Some(FtpletEvent::RenameEnd)),
    ("PASS", None, Some(FtpletEvent::Login)),
    ("SITE", None, Some(FtpletEvent::Site)),
];

fn lookup(verb: &str) -> Option<&'static (&'static str, Option<FtpletEvent>, Option<FtpletEvent>)> {
    COMMAND_EVENTS.iter().find(|(v, _, _)| *v == verb)
}

/// Event dispatched before `verb` executes, if any.
pub fn before_command_event(verb: &str) -> Option<FtpletEvent> {
    lookup(verb).and_then(|(_, before, _)| *before)
}

/// Event dispatched after `verb` executes, if any.
pub fn after_command_event(verb: &str) -> Option<FtpletEvent> {
    lookup(verb).and_then(|(_, _, after)| *after)
}

impl FtpletEvent {
    /// Hook name as exposed to ftplet authors.
    pub fn name(self) -> &'static str {
        match self {
            FtpletEvent::Connect => "onConnect",
            FtpletEvent::Disconnect => "onDisconnect",
            FtpletEvent::Login => "onLogin",
            FtpletEvent::DeleteStart => "onDeleteStart",
            FtpletEvent::DeleteEnd => "onDeleteEnd",
            FtpletEvent::UploadStart => "onUploadStart",
            FtpletEvent::UploadEnd => "onUploadEnd",
            FtpletEvent::DownloadStart => "onDownloadStart",
            FtpletEvent::DownloadEnd => "onDownloadEnd",
            FtpletEvent::RmdirStart => "onRmdirStart",
            FtpletEvent::RmdirEnd => "onRmdirEnd",
            FtpletEvent::MkdirStart => "onMkdirStart",
            FtpletEvent::MkdirEnd => "onMkdirEnd",
            FtpletEvent::AppendStart => "onAppendStart",
            FtpletEvent::AppendEnd => "onAppendEnd",
            FtpletEvent::UploadUniqueStart => "onUploadUniqueStart",
            FtpletEvent::UploadUniqueEnd => "onUploadUniqueEnd",
            FtpletEvent::RenameStart => "onRenameStart",
            FtpletEvent::RenameEnd => "onRenameEnd",
            FtpletEvent::Site => "onSite",
        }
    }

    /// Calls the hook for this event on one ftplet.
    ///
    /// Command events without a request never reach an ftplet; the
    /// container only passes `None` for connect and disconnect.
    pub(crate) async fn invoke(
        self,
        ftplet: &dyn Ftplet,
        session: &mut FtpSession,
        request: Option<&FtpRequest>,
    ) -> Result<FtpletResult, FtpletError> {
        let request = match (self, request) {
            (FtpletEvent::Connect, _) => return ftplet.on_connect(session).await,
            (FtpletEvent::Disconnect, _) => return ftplet.on_disconnect(session).await,
            (_, Some(request)) => request,
            (_, None) => return Ok(FtpletResult::Continue),
        };

        match self {
            FtpletEvent::Connect | FtpletEvent::Disconnect => Ok(FtpletResult::Continue),
            FtpletEvent::Login => ftplet.on_login(session, request).await,
            FtpletEvent::DeleteStart => ftplet.on_delete_start(session, request).await,
            FtpletEvent::DeleteEnd => ftplet.on_delete_end(session, request).await,
            FtpletEvent::UploadStart => ftplet.on_upload_start(session, request).await,
            FtpletEvent::UploadEnd => ftplet.on_upload_end(session, request).await,
            FtpletEvent::DownloadStart => ftplet.on_download_start(session, request).await,
            FtpletEvent::DownloadEnd => ftplet.on_download_end(session, request).await,
            FtpletEvent::RmdirStart => ftplet.on_rmdir_start(session, request).await,
            FtpletEvent::RmdirEnd => ftplet.on_rmdir_end(session, request).await,
            FtpletEvent::MkdirStart => ftplet.on_mkdir_start(session, request).await,
            FtpletEvent::MkdirEnd => ftplet.on_mkdir_end(session, request).await,
            FtpletEvent::AppendStart => ftplet.on_append_start(session, request).await,
            FtpletEvent::AppendEnd => ftplet.on_append_end(session, request).await,
            FtpletEvent::UploadUniqueStart => ftplet.on_upload_unique_start(session, request).await,
            FtpletEvent::UploadUniqueEnd => ftplet.on_upload_unique_end(session, request).await,
            FtpletEvent::RenameStart => ftplet.on_rename_start(session, request).await,
            FtpletEvent::RenameEnd => ftplet.on_rename_end(session, request).await,
            FtpletEvent::Site => ftplet.on_site(session, request).await,
        }
    }
}

impl fmt::Display for FtpletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
