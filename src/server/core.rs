use log::{error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::auth::InMemoryUserManager;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::ftplet::FtpletContainer;
use crate::session::{SessionServices, handle_session};
use crate::stats::ServerStatistics;

/// How long open sessions get to say goodbye before they are aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct Server {
    listener: TcpListener,
    services: Arc<SessionServices>,
    next_session_id: AtomicU64,
}

impl Server {
    /// Binds the control socket and wires the session services together.
    pub async fn bind(
        config: ServerConfig,
        container: Arc<FtpletContainer>,
    ) -> Result<Self, ServerError> {
        let socket = config.control_socket();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            e
        })?;
        info!("Server bound to {}", socket);

        let services = SessionServices::new(
            container,
            Arc::new(InMemoryUserManager::from_config(&config.users)),
            Arc::new(ServerStatistics::new()),
            config.login_permission(),
            config.greeting.clone(),
        )
        .with_max_command_length(config.max_command_length);

        Ok(Self {
            listener,
            services: Arc::new(services),
            next_session_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn statistics(&self) -> &Arc<ServerStatistics> {
        self.services.statistics()
    }

    /// Serves until Ctrl-C.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Initializes the ftplet chain, accepts connections until `shutdown`
    /// completes, then destroys the chain.
    ///
    /// Every session has finished (or been aborted) before the chain is
    /// destroyed, so no hook runs on a destroyed ftplet.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let permission = self.services.login_permission();
        let container = self.services.container();
        if let Err(e) = container.init(self.services.ftplet_context()).await {
            // ftplets initialized before the failing one still need cleanup
            if let Err(destroy_err) = container.destroy().await {
                error!("Cleanup after failed init also failed: {}", destroy_err);
            }
            return Err(e.into());
        }

        info!(
            "Starting FTP server on {} (max logins {}, per address {})",
            self.local_addr()?,
            permission.max_logins(),
            permission.max_logins_per_ip()
        );

        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let services = Arc::clone(&self.services);
                        let session_id = self.next_session_id.fetch_add(1, Ordering::SeqCst);

                        // Spawn a task for each client so accept loop doesn't block
                        sessions.spawn(async move {
                            handle_session(stream, addr, session_id, services).await;
                        });
                    }
                    Err(e) => {
                        warn!("Error accepting connection: {}", e);
                    }
                },
                Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = finished {
                        error!("Session task failed: {}", e);
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.drain_sessions(&mut sessions).await;
        container.destroy().await?;
        let stats = self.services.statistics();
        info!(
            "Server stopped after {:?} ({} connections, {} logins, {} failed)",
            stats.uptime(),
            stats.total_connections(),
            stats.total_logins(),
            stats.failed_logins()
        );
        Ok(())
    }

    /// Asks open sessions to close, waits up to the grace period, then
    /// aborts the rest.
    async fn drain_sessions(&self, sessions: &mut JoinSet<()>) {
        if sessions.is_empty() {
            return;
        }
        info!("Closing {} open sessions", sessions.len());
        self.services.begin_shutdown();

        let graceful = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while let Some(finished) = sessions.join_next().await {
                if let Err(e) = finished {
                    error!("Session task failed: {}", e);
                }
            }
        })
        .await;

        if graceful.is_err() {
            warn!("Aborting {} sessions after shutdown grace period", sessions.len());
            sessions.abort_all();
            while sessions.join_next().await.is_some() {}
        }
    }
}
