//! Process life cycle: cooperative shutdown for the listener and the
//! per-datagram handlers.
//!
//! See <https://tokio.rs/tokio/topics/shutdown> for the general approach.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tokio::signal::unix::SignalKind;
use tokio::sync::mpsc::{Receiver as MPSCReceiver, Sender as MPSCSender};
use tokio::sync::watch::{Receiver as WatchReceiver, Sender as WatchSender};
use uuid::Uuid;

static ACTIVE: OnceLock<Mutex<Option<Activity>>> = OnceLock::new();
static STOPPING: OnceLock<ShutdownState> = OnceLock::new();

static ACTIVE_LABELS: LazyLock<Mutex<HashMap<Uuid, String>>> = LazyLock::new(Mutex::default);

/// How long to wait for in-flight handlers after a shutdown request.
/// Handlers are never aborted mid-write; past the deadline we stop waiting
/// and let the process exit.
const DRAIN_DEADLINE: Duration = Duration::from_secs(30);

/// A handler that must not be interrupted mid-response. While any Activity
/// is alive, [`LifeCycle::wait_for_shutdown`] keeps waiting (up to the
/// drain deadline).
pub struct Activity {
    tx: MPSCSender<()>,
    uuid: Uuid,
}

impl std::fmt::Debug for Activity {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("Activity").finish()
    }
}

impl Drop for Activity {
    fn drop(&mut self) {
        ACTIVE_LABELS.lock().unwrap().remove(&self.uuid);
    }
}

impl Activity {
    /// Returns Err if the process is shutting down and no new work may
    /// start.
    pub fn get(label: String) -> anyhow::Result<Self> {
        let uuid = Uuid::new_v4();
        let active = ACTIVE
            .get()
            .ok_or_else(|| anyhow::anyhow!("life cycle is not initialized"))?
            .lock()
            .unwrap();
        let activity = active
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("shutting down"))?;
        ACTIVE_LABELS.lock().unwrap().insert(uuid, label);
        Ok(Activity {
            tx: activity.tx.clone(),
            uuid,
        })
    }
}

struct ShutdownState {
    tx: WatchSender<()>,
    rx: WatchReceiver<()>,
    request_shutdown_tx: MPSCSender<()>,
    stop_requested: AtomicBool,
}

/// Select on [`ShutdownSubscription::shutting_down`] to wake up when the
/// process begins to stop.
pub struct ShutdownSubscription {
    rx: WatchReceiver<()>,
}

impl ShutdownSubscription {
    pub fn get() -> Self {
        Self {
            rx: STOPPING.get().expect("life cycle initialized").rx.clone(),
        }
    }

    pub async fn shutting_down(&mut self) {
        self.rx.changed().await.ok();
    }
}

/// Owns the global shutdown state. Create once at startup; other code then
/// uses [`Activity`] and [`ShutdownSubscription`].
pub struct LifeCycle {
    activity_rx: MPSCReceiver<()>,
    request_shutdown_rx: MPSCReceiver<()>,
}

impl LifeCycle {
    /// May be called only once; panics on a second call.
    pub fn new() -> Self {
        let (activity_tx, activity_rx) = tokio::sync::mpsc::channel(1);
        let uuid = Uuid::new_v4();
        ACTIVE_LABELS
            .lock()
            .unwrap()
            .insert(uuid, "Root LifeCycle".to_string());
        ACTIVE
            .set(Mutex::new(Some(Activity {
                tx: activity_tx,
                uuid,
            })))
            .map_err(|_| ())
            .expect("LifeCycle::new called twice");

        let (request_shutdown_tx, request_shutdown_rx) = tokio::sync::mpsc::channel(1);
        let (tx, rx) = tokio::sync::watch::channel(());
        STOPPING
            .set(ShutdownState {
                tx,
                rx,
                request_shutdown_tx,
                stop_requested: AtomicBool::new(false),
            })
            .map_err(|_| ())
            .expect("LifeCycle::new called twice");

        Self {
            activity_rx,
            request_shutdown_rx,
        }
    }

    /// Ask the process to stop, as if a termination signal had arrived.
    pub async fn request_shutdown() {
        tracing::debug!("shutdown has been requested");
        if let Some(state) = STOPPING.get() {
            if state.stop_requested.compare_exchange(
                false,
                true,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) == Ok(false)
            {
                state.request_shutdown_tx.send(()).await.ok();
            }
        } else {
            tracing::error!("request_shutdown: life cycle is not initialized");
        }
    }

    /// Wait for a termination signal (or an explicit request), stop
    /// accepting new work, then wait for in-flight handlers to finish
    /// their writes.
    pub async fn wait_for_shutdown(&mut self) {
        let mut sig_term =
            tokio::signal::unix::signal(SignalKind::terminate()).expect("listen for SIGTERM");
        let mut sig_hup =
            tokio::signal::unix::signal(SignalKind::hangup()).expect("listen for SIGHUP");

        tokio::select! {
            _ = sig_term.recv() => {}
            _ = sig_hup.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
            _ = self.request_shutdown_rx.recv() => {}
        };
        tracing::info!("shutdown requested, draining in-flight queries");

        if let Some(active) = ACTIVE.get() {
            active.lock().unwrap().take();
        }
        if let Some(state) = STOPPING.get() {
            state.tx.send(()).ok();
        }

        let deadline = Instant::now() + DRAIN_DEADLINE;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(5)) => {
                    let labels = ACTIVE_LABELS.lock().unwrap();
                    let n = labels.len();
                    if Instant::now() >= deadline {
                        tracing::warn!("drain deadline reached with {n} handlers still pending");
                        return;
                    }
                    let summary: Vec<&str> = labels.values().map(|s| s.as_str()).take(10).collect();
                    tracing::info!("still waiting for {n} pending handlers... {}", summary.join(", "));
                }
                _ = self.activity_rx.recv() => {
                    return;
                }
            }
        }
    }
}
