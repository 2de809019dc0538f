//! The rollcall node: owns storage, the verification engine and the HTTP state.

use std::sync::Arc;
use std::time::Duration;

use rollcall_crypto::OsRandom;
use rollcall_rpc::{AppState, AttendanceMetrics, LoginSessions, RpcServer};
use rollcall_store::{AttendanceLedger, CredentialStore};
use rollcall_store_lmdb::{check_integrity, LmdbEnvironment};
use rollcall_types::{Clock, RandomSource, SystemClock};
use rollcall_utils::format_duration;
use rollcall_verification::VerificationEngine;
use tokio::task::JoinHandle;

use crate::{NodeConfig, NodeError, ShutdownController};

/// How long [`AttendanceNode::stop`] waits for background tasks.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Open the LMDB environment named by `config` and verify it before use.
pub fn open_store(config: &NodeConfig) -> Result<LmdbEnvironment, NodeError> {
    let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())?;
    let report = check_integrity(env.env())?;
    if !report.is_healthy() {
        return Err(NodeError::Integrity(report.errors.join("; ")));
    }
    tracing::info!(
        databases = report.databases_checked,
        entries = report.total_entries,
        "LMDB integrity check passed"
    );
    Ok(env)
}

/// A running (or ready to run) attendance server.
pub struct AttendanceNode {
    pub config: NodeConfig,
    store: LmdbEnvironment,
    state: Arc<AppState>,
    shutdown: Arc<ShutdownController>,
    task_handles: Vec<JoinHandle<()>>,
}

impl AttendanceNode {
    /// Build a node on the wall clock and operating-system randomness.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_sources(config, Arc::new(SystemClock), Arc::new(OsRandom))
    }

    /// Build a node with injected time and randomness.
    pub fn with_sources(
        config: NodeConfig,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let store = open_store(&config)?;

        let ledger: Arc<dyn AttendanceLedger> = Arc::new(store.attendance_ledger());
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(store.credential_store(Arc::clone(&rng)));
        tracing::info!(
            records = ledger.record_count()?,
            students = credentials.student_count()?,
            "ledger loaded"
        );

        let engine = VerificationEngine::new(
            config.verification.clone(),
            ledger,
            credentials,
            Arc::clone(&rng),
        )?;
        let metrics = AttendanceMetrics::new().map_err(|e| NodeError::Metrics(e.to_string()))?;
        let state = Arc::new(AppState {
            engine: Arc::new(engine),
            logins: LoginSessions::new(config.login_ttl_secs, rng),
            metrics,
            clock,
        });

        Ok(Self {
            config,
            store,
            state,
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        })
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn store(&self) -> &LmdbEnvironment {
        &self.store
    }

    /// Handle for triggering shutdown from outside the node.
    pub fn shutdown_handle(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the periodic purge of superseded token payloads and lapsed logins.
    pub fn start_purge_task(&mut self) {
        let state = Arc::clone(&self.state);
        let stopped = self.shutdown.signalled();
        let every = Duration::from_secs(self.config.purge_interval_secs);
        tracing::info!(interval = %format_duration(every.as_secs()), "purge task started");

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            tokio::pin!(stopped);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stopped => {
                        tracing::info!("purge task shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        purge_expired(&state);
                    }
                }
            }
        });
        self.task_handles.push(handle);
    }

    /// Serve HTTP until SIGINT/SIGTERM or [`ShutdownController::shutdown`],
    /// then stop background tasks and flush storage.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        self.start_purge_task();

        let signals = Arc::clone(&self.shutdown);
        let signal_task = tokio::spawn(async move { signals.wait_for_signal().await });

        let server = RpcServer::new(self.config.listen_addr.clone(), Arc::clone(&self.state));
        let served = server.serve(self.shutdown.signalled()).await;
        signal_task.abort();

        self.stop().await;
        served.map_err(NodeError::from)
    }

    /// Broadcast shutdown, wait for background tasks and flush LMDB.
    pub async fn stop(&mut self) {
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all).await.is_err() {
            tracing::warn!(
                timeout = %format_duration(SHUTDOWN_TIMEOUT.as_secs()),
                "background tasks did not stop in time"
            );
        }

        if let Err(e) = self.store.force_sync() {
            tracing::warn!("LMDB force_sync failed: {e}");
        } else {
            tracing::info!("LMDB flushed to disk");
        }
        tracing::info!("rollcall node stopped");
    }
}

fn purge_expired(state: &AppState) {
    let now = state.clock.now();
    let payloads = state.engine.purge(now);
    let logins = state.logins.purge(now);
    if payloads + logins > 0 {
        tracing::debug!(payloads, logins, "purged stale entries");
    }
}
