//! Drives the infra manager from a stream of resolved infra IR

use std::sync::Arc;

use futures::{Stream, StreamExt};
use gatehouse_common::Result;
use gatehouse_translator::ir::Infra;
use tracing::{debug, error, info};

use crate::manager::InfraManager;

/// Change to one proxy fleet
#[derive(Clone, Debug)]
pub enum InfraEvent {
    /// The fleet exists and should match this IR
    Upsert(Infra),
    /// The fleet's gateway is gone
    Delete(Infra),
}

impl InfraEvent {
    fn infra(&self) -> &Infra {
        match self {
            Self::Upsert(infra) | Self::Delete(infra) => infra,
        }
    }
}

/// Applies infra events through an [`InfraManager`]
pub struct InfraRunner {
    manager: Arc<dyn InfraManager>,
    rate_limit_enabled: bool,
}

impl InfraRunner {
    /// Create a runner over `manager`. `rate_limit_enabled` decides whether
    /// `start` creates or deletes the shared rate limit service.
    pub fn new(manager: Arc<dyn InfraManager>, rate_limit_enabled: bool) -> Self {
        Self {
            manager,
            rate_limit_enabled,
        }
    }

    /// Converge the shared rate limit service with the configured setting
    pub async fn start(&self) -> Result<()> {
        if self.rate_limit_enabled {
            info!("creating rate limit infrastructure");
            self.manager.create_or_update_rate_limit_infra().await
        } else {
            debug!("rate limiting disabled, removing any rate limit infrastructure");
            self.manager.delete_rate_limit_infra().await
        }
    }

    /// Apply one event
    pub async fn handle(&self, event: &InfraEvent) -> Result<()> {
        let proxy = &event.infra().proxy;
        match event {
            InfraEvent::Upsert(infra) => {
                debug!(namespace = %proxy.namespace, name = %proxy.name, "applying proxy infra");
                self.manager.create_or_update_proxy_infra(infra).await
            }
            InfraEvent::Delete(infra) => {
                info!(namespace = %proxy.namespace, name = %proxy.name, "deleting proxy infra");
                self.manager.delete_proxy_infra(infra).await
            }
        }
    }

    /// Consume events until the stream ends. A failed event is logged and the
    /// next one is processed; the next event for the same fleet retries it.
    pub async fn run<S>(&self, events: S)
    where
        S: Stream<Item = InfraEvent>,
    {
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            if let Err(e) = self.handle(&event).await {
                let proxy = &event.infra().proxy;
                error!(
                    namespace = %proxy.namespace,
                    name = %proxy.name,
                    error = %e,
                    retryable = e.is_retryable(),
                    "infra event failed"
                );
            }
        }
    }
}
