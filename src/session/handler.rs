//! Session command loop
//!
//! Drives one control connection: connect and disconnect events, and for
//! every command the before phase, the base handler and the after phase.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::sync::watch;

use crate::auth::{ConcurrentLoginPermission, UserManager};
use crate::error::{ChainError, ServerError, error_to_reply_code};
use crate::ftplet::{FtpletContainer, FtpletContext, FtpletResult};
use crate::protocol::{FtpReply, FtpRequest, responses};
use crate::session::commands::{self, CommandStatus};
use crate::session::FtpSession;
use crate::stats::ServerStatistics;

const DEFAULT_MAX_COMMAND_LENGTH: usize = 512;

/// Server-wide services every session loop needs.
pub struct SessionServices {
    container: Arc<FtpletContainer>,
    user_manager: Arc<dyn UserManager>,
    statistics: Arc<ServerStatistics>,
    login_permission: ConcurrentLoginPermission,
    greeting: String,
    max_command_length: usize,
    shutdown: watch::Sender<bool>,
}

impl SessionServices {
    pub fn new(
        container: Arc<FtpletContainer>,
        user_manager: Arc<dyn UserManager>,
        statistics: Arc<ServerStatistics>,
        login_permission: ConcurrentLoginPermission,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            container,
            user_manager,
            statistics,
            login_permission,
            greeting: greeting.into(),
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
            shutdown: watch::Sender::new(false),
        }
    }

    pub fn with_max_command_length(mut self, max_command_length: usize) -> Self {
        self.max_command_length = max_command_length;
        self
    }

    pub fn container(&self) -> &Arc<FtpletContainer> {
        &self.container
    }

    pub fn user_manager(&self) -> &Arc<dyn UserManager> {
        &self.user_manager
    }

    pub fn statistics(&self) -> &Arc<ServerStatistics> {
        &self.statistics
    }

    pub fn login_permission(&self) -> &ConcurrentLoginPermission {
        &self.login_permission
    }

    /// Context handed to ftplets at container init.
    pub fn ftplet_context(&self) -> FtpletContext {
        FtpletContext::new(Arc::clone(&self.user_manager), Arc::clone(&self.statistics))
            .with_container(&self.container)
    }

    /// Tells every session to stop reading commands and close. Sessions still
    /// run their disconnect event on the way out.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// One control line read under the length limit.
#[derive(Debug, PartialEq, Eq)]
enum CommandLine {
    Line(String),
    TooLong,
    Eof,
}

/// What the loop does after a chain dispatch.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Proceed,
    Skip,
    Close,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Connect,
    Before,
    After,
}

/// Runs a session to completion over any byte stream.
pub async fn handle_session<S>(
    stream: S,
    peer_addr: SocketAddr,
    session_id: u64,
    services: Arc<SessionServices>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    services.statistics.connection_opened();
    info!("Client connected: {} (session {})", peer_addr, session_id);

    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut session = FtpSession::new(session_id, peer_addr);

    if let Err(e) = serve(&mut reader, &mut writer, &mut session, &services).await {
        warn!("Session {} with {} ended with I/O error: {}", session_id, peer_addr, e);
    }

    match services.container.on_disconnect(&mut session).await {
        Ok(_) => {
            // the peer may already be gone
            let _ = flush_outbox(&mut writer, &mut session).await;
        }
        Err(e) => error!("Disconnect event failed for session {}: {}", session_id, e),
    }

    if session.logout() {
        services.statistics.release_login(peer_addr.ip());
    }
    services.statistics.connection_closed();
    info!("Client {} disconnected (session {})", peer_addr, session_id);
}

async fn serve<R, W>(
    reader: &mut BufReader<R>,
    writer: &mut W,
    session: &mut FtpSession,
    services: &SessionServices,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut shutdown = services.shutdown.subscribe();

    let connected = services.container.on_connect(session).await;
    // Skip only stops later ftplets; the client still gets its greeting.
    if settle(connected, Phase::Connect, writer, session).await? == Flow::Close {
        return Ok(());
    }
    send(writer, &FtpReply::new(responses::READY, services.greeting.as_str())).await?;

    loop {
        let read = tokio::select! {
            read = read_command(reader, services.max_command_length) => read?,
            _ = shutdown_requested(&mut shutdown) => {
                info!("Closing session {} for server shutdown", session.id());
                send(
                    writer,
                    &FtpReply::new(responses::SERVICE_NOT_AVAILABLE, "Server shutting down."),
                )
                .await?;
                return Ok(());
            }
        };

        let line = match read {
            CommandLine::Line(line) => line,
            CommandLine::TooLong => {
                send(writer, &FtpReply::new(responses::SYNTAX_ERROR, "Command too long.")).await?;
                continue;
            }
            CommandLine::Eof => {
                info!("Connection closed by client {}", session.peer_addr());
                return Ok(());
            }
        };

        let Some(request) = FtpRequest::parse(&line) else {
            send(
                writer,
                &FtpReply::new(responses::SYNTAX_ERROR, "Syntax error, command unrecognized."),
            )
            .await?;
            continue;
        };
        debug!("Received from {}: {}", session.peer_addr(), request);

        let before = services.container.before_command(session, &request).await;
        match settle(before, Phase::Before, writer, session).await? {
            Flow::Proceed => {}
            Flow::Skip => continue,
            Flow::Close => return Ok(()),
        }

        let result = commands::execute(session, &request, services);
        send(writer, &result.reply).await?;

        let after = services.container.after_command(session, &request).await;
        if settle(after, Phase::After, writer, session).await? == Flow::Close {
            return Ok(());
        }

        if result.status == CommandStatus::CloseConnection {
            info!("Client {} requested to quit", session.peer_addr());
            return Ok(());
        }
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // a dropped sender means the services are gone; treat it as shutdown
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}

/// Reads one line of at most `max_len` bytes, terminator included.
///
/// Never buffers more than `max_len + 1` bytes of a line: the rest of an
/// oversized line is consumed straight out of the reader's buffer.
async fn read_command<R>(reader: &mut BufReader<R>, max_len: usize) -> std::io::Result<CommandLine>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(CommandLine::Eof);
    }

    if buf.len() > max_len {
        if buf.last() != Some(&b'\n') {
            discard_line(reader).await?;
        }
        return Ok(CommandLine::TooLong);
    }

    Ok(CommandLine::Line(String::from_utf8_lossy(&buf).into_owned()))
}

/// Skips input up to and including the next newline, or to end of stream.
async fn discard_line<R>(reader: &mut BufReader<R>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Flushes replies queued by ftplets and turns a dispatch outcome into a
/// loop decision. A failed hook aborts the current command.
async fn settle<W>(
    outcome: Result<FtpletResult, ChainError>,
    phase: Phase,
    writer: &mut W,
    session: &mut FtpSession,
) -> std::io::Result<Flow>
where
    W: AsyncWrite + Unpin,
{
    flush_outbox(writer, session).await?;

    match outcome {
        Ok(FtpletResult::Continue) => Ok(Flow::Proceed),
        Ok(FtpletResult::Skip) => Ok(Flow::Skip),
        Ok(FtpletResult::Disconnect) => {
            info!("Ftplet closed session {} ({:?})", session.id(), phase);
            Ok(Flow::Close)
        }
        Err(e) => {
            let err = ServerError::from(e);
            error!("Session {} {:?} dispatch failed: {}", session.id(), phase, err);
            match phase {
                Phase::Connect => {
                    send(
                        writer,
                        &FtpReply::new(
                            responses::SERVICE_NOT_AVAILABLE,
                            "Service not available, closing control connection.",
                        ),
                    )
                    .await?;
                    Ok(Flow::Close)
                }
                Phase::Before => {
                    send(
                        writer,
                        &FtpReply::new(
                            error_to_reply_code(&err),
                            "Requested action aborted: local error in processing.",
                        ),
                    )
                    .await?;
                    Ok(Flow::Skip)
                }
                // the command's own reply has already gone out
                Phase::After => Ok(Flow::Proceed),
            }
        }
    }
}

async fn flush_outbox<W>(writer: &mut W, session: &mut FtpSession) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for reply in session.take_replies() {
        send(writer, &reply).await?;
    }
    Ok(())
}

async fn send<W>(writer: &mut W, reply: &FtpReply) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(reply.to_string().as_bytes()).await?;
    writer.flush().await
}
