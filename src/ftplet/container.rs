//! Ftplet container
//!
//! Owns the ordered ftplet registry, drives the ftplet lifecycle and
//! dispatches events across the chain. Registration order is dispatch order.
//! A dispatch holds the read lock for one event's fan-out; registration,
//! removal, init and destroy take the write lock.
//!
//! A name index mirrors the registry behind its own short-lived lock so that
//! ftplets can resolve each other through their context, even from `init`
//! while the registry lock is held.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::RwLock;

use crate::error::{ChainError, DestroyFailure};
use crate::ftplet::event::{after_command_event, before_command_event};
use crate::ftplet::{Ftplet, FtpletContext, FtpletEvent, FtpletResult};
use crate::protocol::FtpRequest;
use crate::session::FtpSession;

struct FtpletEntry {
    name: String,
    ftplet: Arc<dyn Ftplet>,
}

#[derive(Default)]
struct ContainerInner {
    ftplets: Vec<FtpletEntry>,
    context: Option<FtpletContext>,
}

impl ContainerInner {
    fn position(&self, name: &str) -> Option<usize> {
        self.ftplets.iter().position(|entry| entry.name == name)
    }
}

#[derive(Default)]
pub struct FtpletContainer {
    inner: RwLock<ContainerInner>,
    index: parking_lot::RwLock<HashMap<String, Arc<dyn Ftplet>>>,
}

impl FtpletContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ftplet to the chain.
    ///
    /// If the container is already initialized, the ftplet's `init` runs
    /// before it becomes visible to dispatch; an `init` failure leaves the
    /// registry untouched.
    pub async fn add_ftplet(
        &self,
        name: impl Into<String>,
        ftplet: Arc<dyn Ftplet>,
    ) -> Result<(), ChainError> {
        let name = name.into();
        let mut inner = self.inner.write().await;

        if inner.position(&name).is_some() {
            warn!("Rejected duplicate ftplet registration: {}", name);
            return Err(ChainError::DuplicateName(name));
        }

        if let Some(context) = &inner.context {
            ftplet
                .init(context)
                .await
                .map_err(|source| ChainError::Init {
                    name: name.clone(),
                    source,
                })?;
        }

        info!("Registered ftplet '{}'", name);
        self.index.write().insert(name.clone(), Arc::clone(&ftplet));
        inner.ftplets.push(FtpletEntry { name, ftplet });
        Ok(())
    }

    pub async fn get_ftplet(&self, name: &str) -> Option<Arc<dyn Ftplet>> {
        self.find_ftplet(name)
    }

    /// Lock-free with respect to the registry; safe to call from hooks and
    /// from `init`.
    pub(crate) fn find_ftplet(&self, name: &str) -> Option<Arc<dyn Ftplet>> {
        self.index.read().get(name).cloned()
    }

    /// Removes an ftplet without destroying it.
    pub async fn remove_ftplet(&self, name: &str) -> Option<Arc<dyn Ftplet>> {
        let mut inner = self.inner.write().await;
        let index = inner.position(name)?;
        info!("Removed ftplet '{}'", name);
        self.index.write().remove(name);
        Some(inner.ftplets.remove(index).ftplet)
    }

    /// Registered names in dispatch order.
    pub async fn ftplet_names(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.ftplets.iter().map(|entry| entry.name.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.ftplets.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.ftplets.is_empty()
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.read().await.context.is_some()
    }

    /// Stores the context and initializes every registered ftplet in order.
    ///
    /// Stops at the first failing ftplet; the ones after it are not
    /// initialized. Calling `init` twice initializes every ftplet again.
    pub async fn init(&self, context: FtpletContext) -> Result<(), ChainError> {
        let mut inner = self.inner.write().await;
        inner.context = Some(context.clone());

        for entry in &inner.ftplets {
            debug!("Initializing ftplet '{}'", entry.name);
            if let Err(source) = entry.ftplet.init(&context).await {
                error!("Ftplet '{}' failed to initialize: {}", entry.name, source);
                return Err(ChainError::Init {
                    name: entry.name.clone(),
                    source,
                });
            }
        }

        info!("Ftplet container initialized ({} ftplets)", inner.ftplets.len());
        Ok(())
    }

    /// Destroys every registered ftplet in order and empties the chain.
    ///
    /// A failing ftplet does not stop the others; all failures are reported
    /// together once every ftplet has been given the chance to clean up.
    /// Destroyed ftplets leave the registry, so a second call is a no-op.
    pub async fn destroy(&self) -> Result<(), ChainError> {
        let mut inner = self.inner.write().await;
        let mut failures = Vec::new();
        let entries = std::mem::take(&mut inner.ftplets);
        self.index.write().clear();

        for entry in &entries {
            if let Err(source) = entry.ftplet.destroy().await {
                error!("Ftplet '{}' failed to destroy: {}", entry.name, source);
                failures.push(DestroyFailure {
                    name: entry.name.clone(),
                    source,
                });
            }
        }
        inner.context = None;

        if failures.is_empty() {
            info!("Ftplet container destroyed");
            Ok(())
        } else {
            Err(ChainError::Destroy(failures))
        }
    }

    pub async fn on_connect(&self, session: &mut FtpSession) -> Result<FtpletResult, ChainError> {
        self.fan_out(FtpletEvent::Connect, session, None).await
    }

    pub async fn on_disconnect(
        &self,
        session: &mut FtpSession,
    ) -> Result<FtpletResult, ChainError> {
        self.fan_out(FtpletEvent::Disconnect, session, None).await
    }

    /// Dispatches the pre-execution event for `request`, if its verb has one.
    pub async fn before_command(
        &self,
        session: &mut FtpSession,
        request: &FtpRequest,
    ) -> Result<FtpletResult, ChainError> {
        match before_command_event(request.verb()) {
            Some(event) => self.fan_out(event, session, Some(request)).await,
            None => Ok(FtpletResult::Continue),
        }
    }

    /// Dispatches the post-execution event for `request`, if its verb has one.
    pub async fn after_command(
        &self,
        session: &mut FtpSession,
        request: &FtpRequest,
    ) -> Result<FtpletResult, ChainError> {
        match after_command_event(request.verb()) {
            Some(event) => self.fan_out(event, session, Some(request)).await,
            None => Ok(FtpletResult::Continue),
        }
    }

    /// Runs `event` on each ftplet in order, stopping at the first result
    /// other than `Continue` or at the first failure.
    async fn fan_out(
        &self,
        event: FtpletEvent,
        session: &mut FtpSession,
        request: Option<&FtpRequest>,
    ) -> Result<FtpletResult, ChainError> {
        let inner = self.inner.read().await;

        for entry in &inner.ftplets {
            let result = event
                .invoke(entry.ftplet.as_ref(), session, request)
                .await
                .map_err(|source| {
                    error!(
                        "Ftplet '{}' failed in {} for session {}: {}",
                        entry.name,
                        event,
                        session.id(),
                        source
                    );
                    ChainError::Hook {
                        name: entry.name.clone(),
                        event,
                        source,
                    }
                })?;

            if !result.is_continue() {
                debug!(
                    "Ftplet '{}' returned {:?} for {}, stopping chain",
                    entry.name, result, event
                );
                return Ok(result);
            }
        }

        Ok(FtpletResult::Continue)
    }
}
