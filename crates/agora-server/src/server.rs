//! Module lifecycle.
//!
//! Boot order matters: load the store, generate the module's own DKey,
//! synchronise with the notification module (fatal on failure), run the
//! consistency audit (fatal on corruption), then spawn the scheduler, the
//! store-error listener, and the RPC endpoint. Corruption found at boot
//! blocks go-live; the same audit failing later, from the scheduler, is
//! logged and the module keeps running.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use agora_board::AuditError;
use agora_core::{DKey, DKeyError};
use agora_relay::{EventRelay, HttpTransport, RelayError};
use agora_scheduler::{JobError, Scheduler};
use agora_store::{BoardStore, StoreError};

use crate::access::RemoteAccessControl;
use crate::config::{ConfigError, Settings};
use crate::rpc;
use crate::service::BoardService;

/// Startup failures. Every one of them aborts the boot.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Settings are unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// DKey generation failed.
    #[error(transparent)]
    DKey(#[from] DKeyError),

    /// Module synchronisation with the notification module failed.
    #[error(transparent)]
    Synchronisation(#[from] RelayError),

    /// The boot-time consistency audit found corruption.
    #[error("consistency audit failed: {0}")]
    Consistency(#[from] AuditError),

    /// The RPC listener could not be bound.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A running board module.
pub struct Server {
    service: Arc<BoardService>,
    stop: Arc<AtomicBool>,
    listener_stop: Option<oneshot::Sender<()>>,
    http_stop: Option<oneshot::Sender<()>>,
    tasks: Vec<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl Server {
    /// Boots the module.
    pub async fn start(settings: Settings) -> Result<Self, ServerError> {
        settings.check()?;

        let store = BoardStore::open(&settings.store_path)?;

        let access = Arc::new(RemoteAccessControl::new(Arc::new(HttpTransport::new(
            settings.access_endpoint.clone(),
        ))));
        let dkey = DKey::generate(settings.dkey_size)?;

        info!("synchronising with the notification module");
        let relay =
            EventRelay::connect(Arc::new(HttpTransport::new(settings.notification_endpoint.clone())))
                .await?;

        let (store_errors_tx, store_errors_rx) = mpsc::unbounded_channel();
        let service = Arc::new(BoardService::new(
            store,
            settings.clone(),
            dkey,
            relay,
            access,
            store_errors_tx,
        ));

        // Corruption discovered at boot blocks go-live.
        service.check_consistency()?;

        let stop = Arc::new(AtomicBool::new(false));
        let mut tasks = Vec::new();

        let scheduler = {
            let flush_service = Arc::clone(&service);
            let audit_service = Arc::clone(&service);
            Scheduler::new(Arc::clone(&stop))
                .every_minute("flush dirty snapshot", move || {
                    flush_service.flush_dirty().map_err(JobError::new)
                })
                .every_hour("database consistency check", move || {
                    audit_service.check_consistency().map_err(JobError::new)
                })
        };
        tasks.push(tokio::spawn(scheduler.run()));

        let (listener_stop_tx, listener_stop_rx) = oneshot::channel();
        tasks.push(tokio::spawn(store_error_listener(
            Arc::clone(&service),
            store_errors_rx,
            Duration::from_secs(settings.store_retry_cooldown_secs),
            listener_stop_rx,
        )));

        let listener = TcpListener::bind(&settings.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        let app = rpc::router(Arc::clone(&service));
        let (http_stop_tx, http_stop_rx) = oneshot::channel();
        tasks.push(tokio::spawn(async move {
            let shutdown = async {
                let _ = http_stop_rx.await;
            };
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(%err, "rpc server error");
            }
        }));

        info!(%local_addr, "board module is serving");
        Ok(Self {
            service,
            stop,
            listener_stop: Some(listener_stop_tx),
            http_stop: Some(http_stop_tx),
            tasks,
            local_addr,
        })
    }

    /// The bound RPC address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The shared service, for tooling.
    pub fn service(&self) -> &Arc<BoardService> {
        &self.service
    }

    /// Stops the module: flags the scheduler, stops the listener, drains the
    /// RPC server, then waits for every task to finish.
    pub async fn stop(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(tx) = self.listener_stop.take() {
            let _ = tx.send(());
        }
        if let Some(tx) = self.http_stop.take() {
            let _ = tx.send(());
        }
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                error!(%err, "task ended abnormally");
            }
        }
        info!("board module has stopped");
    }
}

/// Waits for store I/O errors and retries the pending flush until the
/// backing file is reachable again. One failed commit may be followed by a
/// burst of further errors, so the listener first probes whether the problem
/// still exists before entering the retry loop.
async fn store_error_listener(
    service: Arc<BoardService>,
    mut errors: mpsc::UnboundedReceiver<StoreError>,
    cooldown: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        let err = tokio::select! {
            _ = &mut stop => break,
            received = errors.recv() => match received {
                Some(err) => err,
                None => break,
            },
        };

        // The problem may already be gone by the time we get the report.
        if service.flush_dirty().is_ok() {
            continue;
        }

        error!(%err, "store is unreachable, starting reconnection attempts");
        loop {
            info!("retrying store flush");
            match service.flush_dirty() {
                Ok(()) => {
                    info!("store connection was restored");
                    break;
                }
                Err(retry_err) => {
                    warn!(%retry_err, "store flush retry failed");
                }
            }
            tokio::select! {
                _ = &mut stop => return,
                () = tokio::time::sleep(cooldown) => {}
            }
        }
    }

    info!("store error listener has stopped");
}
