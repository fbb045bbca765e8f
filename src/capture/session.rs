use log::{info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::capture::engine;
use crate::capture::source::CaptureBackend;
use crate::models::config::CaptureConfig;
use crate::models::snapshot::TrafficSnapshot;
use crate::utils::error::{CaptureError, CaptureResult};

/// Capacity of the pushed-snapshot channel; laggards drop old events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle state of the capture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
    Error,
}

/// The process-wide capture slot.
///
/// There is exactly one of these, shared behind `Arc<tokio::sync::RwLock<_>>`;
/// overlapping start/stop calls serialize FIFO on the write guard, so the
/// session is observed in exactly one state at any point and a stop issued
/// during an in-flight start runs as soon as the start settles.
pub struct CaptureSession {
    backend: Arc<dyn CaptureBackend>,
    config: CaptureConfig,
    state: SessionState,
    interface: Option<String>,
    last_error: Option<String>,
    session_id: Uuid,
    counters: Arc<RwLock<TrafficSnapshot>>,
    events: broadcast::Sender<TrafficSnapshot>,
    stop_flag: Arc<AtomicBool>,
    engine_task: Option<JoinHandle<()>>,
}

impl CaptureSession {
    pub fn new(backend: Arc<dyn CaptureBackend>, config: CaptureConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            config,
            state: SessionState::Idle,
            interface: None,
            last_error: None,
            session_id: Uuid::nil(),
            counters: Arc::new(RwLock::new(TrafficSnapshot::default())),
            events,
            stop_flag: Arc::new(AtomicBool::new(false)),
            engine_task: None,
        }
    }

    /// Start capturing on `interface`.
    ///
    /// Any session already running is stopped first; the slot never represents
    /// two interfaces. On success the counters have been reset to zero under a
    /// fresh session id and the engine task is running.
    pub async fn start(&mut self, interface: &str) -> CaptureResult<()> {
        if interface.is_empty() {
            return Err(CaptureError::InvalidArgument(
                "no interface specified".to_string(),
            ));
        }

        // Unknown names are rejected before the device is touched. When
        // enumeration itself fails we let the open attempt decide.
        match self.backend.interface_names() {
            Ok(known) if !known.iter().any(|n| n == interface) => {
                return Err(CaptureError::InvalidArgument(format!(
                    "unknown interface: {interface}"
                )));
            }
            Ok(_) => {}
            Err(e) => warn!("Interface validation skipped, enumeration failed: {e}"),
        }

        if matches!(
            self.state,
            SessionState::Active | SessionState::Starting | SessionState::Stopping
        ) {
            info!("Capture already running, stopping it before restart");
            self.stop().await?;
        }

        info!("Starting capture on {interface}");
        self.state = SessionState::Starting;
        self.interface = Some(interface.to_string());

        let backend = Arc::clone(&self.backend);
        let config = self.config.clone();
        let iface = interface.to_string();
        let open = tokio::task::spawn_blocking(move || backend.open(&iface, &config));

        let source = match tokio::time::timeout(self.config.start_timeout, open).await {
            Ok(Ok(Ok(source))) => source,
            Ok(Ok(Err(e))) => {
                self.fail(e.to_string());
                return Err(e);
            }
            Ok(Err(join_err)) => {
                let e = CaptureError::Device(format!("capture open task failed: {join_err}"));
                self.fail(e.to_string());
                return Err(e);
            }
            Err(_) => {
                let e = CaptureError::Timeout(format!(
                    "opening {interface} exceeded {:?}",
                    self.config.start_timeout
                ));
                self.fail(e.to_string());
                return Err(e);
            }
        };

        // Counters must read as zero before the first packet of the new
        // session can be counted.
        self.session_id = Uuid::new_v4();
        *self.counters.write() = TrafficSnapshot::for_session(self.session_id, interface);
        self.stop_flag = Arc::new(AtomicBool::new(false));
        self.last_error = None;
        self.state = SessionState::Active;

        self.engine_task = Some(tokio::spawn(engine::run(
            source,
            Arc::clone(&self.counters),
            self.events.clone(),
            Arc::clone(&self.stop_flag),
            self.config.event_interval,
            interface.to_string(),
        )));

        info!("Capture active on {interface} (session {})", self.session_id);
        Ok(())
    }

    /// Stop the current capture. Idempotent: stopping an idle session is a
    /// no-op success, and an errored session resets to idle.
    pub async fn stop(&mut self) -> CaptureResult<()> {
        match self.state {
            SessionState::Idle | SessionState::Stopping => return Ok(()),
            SessionState::Error => {
                self.state = SessionState::Idle;
                self.interface = None;
                return Ok(());
            }
            SessionState::Active | SessionState::Starting => {}
        }

        info!("Stopping capture");
        self.state = SessionState::Stopping;
        self.stop_flag.store(true, Ordering::SeqCst);

        if let Some(mut task) = self.engine_task.take() {
            if tokio::time::timeout(self.config.stop_timeout, &mut task)
                .await
                .is_err()
            {
                warn!("Engine did not exit within {:?}, aborting", self.config.stop_timeout);
                task.abort();
            }
        }

        // Final counters stay readable until the next start resets them.
        self.state = SessionState::Idle;
        self.interface = None;
        Ok(())
    }

    /// Point-in-time copy of the traffic counters. All-zero (nil session id)
    /// before the first capture has ever started.
    pub fn snapshot(&self) -> TrafficSnapshot {
        self.counters.read().clone()
    }

    /// Subscribe to pushed snapshot events for the push delivery channel.
    pub fn subscribe(&self) -> broadcast::Receiver<TrafficSnapshot> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail(&mut self, cause: String) {
        warn!("Capture start failed: {cause}");
        self.state = SessionState::Error;
        self.last_error = Some(cause);
    }
}

/// Shared handle the API layer holds.
pub type SharedSession = Arc<tokio::sync::RwLock<CaptureSession>>;
