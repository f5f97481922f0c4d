//! # Service Host
//!
//! Wires the server together and owns its running tasks.
//!
//! Startup order: storage (opened and provisioned), store actor, notification listener, RPC
//! listener. A bind failure aborts startup. Shutdown runs the other way: both listeners stop
//! and close their connections, then the last store client is dropped and the store actor
//! drains.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, instrument};

use super::config::Settings;
use crate::credentials::{CredentialError, SqliteCredentialStore};
use crate::notifier::{NotificationListener, Notifier, NotifierError};
use crate::rpc::{RpcServer, ServerError};
use crate::service::InventoryService;
use crate::store::{self, open_pool, MemoryRepository, Repository, SqliteRepository, StoreError};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("storage: {0}")]
    Storage(#[from] StoreError),

    #[error("credentials: {0}")]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Notifier(#[from] NotifierError),

    #[error(transparent)]
    Rpc(#[from] ServerError),

    #[error("failed to read listener address: {0}")]
    Address(#[source] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
}

/// A running server.
pub struct ServiceHost {
    rpc_addr: SocketAddr,
    notify_addr: SocketAddr,
    service: InventoryService,
    notifier: Notifier,
    shutdown: watch::Sender<bool>,
    store_task: JoinHandle<()>,
    notify_task: JoinHandle<Result<(), NotifierError>>,
    rpc_task: JoinHandle<Result<(), ServerError>>,
}

impl ServiceHost {
    #[instrument(skip_all)]
    pub async fn start(settings: &Settings) -> Result<Self, HostError> {
        let storage = &settings.storage;
        let buffer_size = settings.store.buffer_size;

        let (store_task, store, credentials_pool) = if storage.is_memory() {
            let pool = open_pool("sqlite::memory:", 1).await.map_err(StoreError::from)?;
            let (actor, client) = store::new(buffer_size, MemoryRepository::new());
            (tokio::spawn(actor.run()), client, pool)
        } else {
            let pool = open_pool(&storage.url, storage.max_connections)
                .await
                .map_err(StoreError::from)?;
            let mut repository = SqliteRepository::new(pool.clone());
            repository.provision().await?;
            let (actor, client) = store::new(buffer_size, repository);
            (tokio::spawn(actor.run()), client, pool)
        };
        info!(url = %storage.url, "Storage ready");

        let credentials = SqliteCredentialStore::new(credentials_pool);
        credentials.provision().await?;

        let notifier = Notifier::new(settings.notifier.queue_capacity);
        let service = InventoryService::new(store, Arc::new(notifier.clone()));
        let (shutdown, signal) = watch::channel(false);

        let listener = NotificationListener::bind(
            &settings.server.notify_addr(),
            notifier.clone(),
            settings.notifier.write_timeout(),
        )
        .await?;
        let notify_addr = listener.local_addr().map_err(HostError::Address)?;

        let server = RpcServer::bind(
            &settings.server.rpc_addr(),
            service.clone(),
            Arc::new(credentials),
        )
        .await?;
        let rpc_addr = server.local_addr().map_err(HostError::Address)?;

        let notify_task = tokio::spawn(listener.run(signal.clone()));
        let rpc_task = tokio::spawn(server.run(signal));

        info!(rpc = %rpc_addr, notify = %notify_addr, "Inventory server ready");

        Ok(Self {
            rpc_addr,
            notify_addr,
            service,
            notifier,
            shutdown,
            store_task,
            notify_task,
            rpc_task,
        })
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr
    }

    pub fn notify_addr(&self) -> SocketAddr {
        self.notify_addr
    }

    /// In-process access to the published operations.
    pub fn service(&self) -> &InventoryService {
        &self.service
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Stops both listeners and waits for the store actor to finish.
    ///
    /// The actor finishes once every [`InventoryService`] and store client is gone, so this
    /// does not return while a clone taken from [`service`](Self::service) is still alive.
    pub async fn shutdown(self) -> Result<(), HostError> {
        info!("Shutting down");
        let _ = self.shutdown.send(true);

        let rpc = self.rpc_task.await?;
        let notify = self.notify_task.await?;

        drop(self.service);
        debug!("Waiting for store clients to drop");
        self.store_task.await?;

        rpc?;
        notify?;
        info!("Shutdown complete");
        Ok(())
    }
}
