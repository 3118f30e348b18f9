//! Backend module for fetching telemetry off the UI thread
//!
//! All network I/O happens in a worker thread so the UI stays responsive.
//! The worker is a single actor: it owns the telemetry source, the refresh
//! schedule and the connection state, and it reads every input (UI commands
//! and pushed snapshots alike) from one inbound channel.
//!
//! # Architecture
//!
//! - [`BackendCommand`] - Messages sent from UI to backend (refresh, pause, history length, ...)
//! - [`WorkerEvent`] - Everything the worker receives: commands plus push stream events
//! - [`BackendMessage`] - Messages sent from backend to UI (snapshots, status, errors)
//! - [`FrontendReceiver`] - UI-side handle for sending commands and receiving messages
//! - [`TelemetryBackend`] - Main backend entry point that owns the worker
//!
//! # Sources
//!
//! - [`HttpPollSource`] - Polls `GET /api/data`
//! - [`PushStreamSource`] - Reads snapshots pushed over a TCP stream
//! - [`SimulatedSource`] - Generated data for running without a server
//!
//! # Example
//!
//! ```ignore
//! use starlink_dash::backend::{BackendMessage, TelemetryBackend};
//! use starlink_dash::config::AppConfig;
//!
//! let (backend, frontend) = TelemetryBackend::new(AppConfig::default());
//! std::thread::spawn(move || backend.run());
//!
//! frontend.set_history_secs(3_600)?;
//! for msg in frontend.drain() {
//!     if let BackendMessage::Snapshot(snapshot) = msg {
//!         // Rebuild the charts
//!     }
//! }
//! ```

pub mod http;
pub mod mock_source;
pub mod push;
pub mod source;
pub mod worker;

pub use http::{HttpPollSource, SpeedtestTrigger};
pub use mock_source::SimulatedSource;
pub use push::PushStreamSource;
pub use source::{PushSink, TelemetrySource};
pub use worker::BackendWorker;

use crate::config::{AppConfig, SourceMode};
use crate::error::{DashError, Result};
use crate::telemetry::TelemetrySnapshot;
use crate::types::{ConnectionStatus, RefreshStats};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Message sent from the UI to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// Refresh immediately (push mode reopens the stream)
    RefreshNow,
    /// Change how many seconds of history to request
    SetHistorySecs(u64),
    /// Ask the server to run a speed test
    TriggerSpeedtest,
    /// Stop refreshing until resumed
    Pause,
    /// Restart refreshing
    Resume,
    /// Shutdown the backend
    Shutdown,
}

/// Input of the worker's single inbound channel
#[derive(Debug)]
pub enum WorkerEvent {
    /// Command from the UI
    Command(BackendCommand),
    /// Snapshot read from the push stream
    Pushed {
        generation: u64,
        snapshot: Box<TelemetrySnapshot>,
    },
    /// The push stream sent something that is not a valid snapshot
    PushError { generation: u64, message: String },
    /// The push stream ended
    StreamClosed { generation: u64, reason: String },
}

/// Message sent from the backend to the UI
#[derive(Debug, Clone)]
pub enum BackendMessage {
    /// A complete snapshot to render
    Snapshot(Box<TelemetrySnapshot>),
    /// Connection status changed
    ConnectionStatus(ConnectionStatus),
    /// A fetch or pushed payload failed
    FetchError(String),
    /// The speed-test request was sent
    SpeedtestTriggered,
    /// Statistics update
    Stats(RefreshStats),
    /// Backend is shutting down
    Shutdown,
}

/// Frontend receiver for backend messages
pub struct FrontendReceiver {
    /// Receiver for backend messages
    pub receiver: Receiver<BackendMessage>,
    /// Sender into the worker's inbound channel
    pub command_sender: Sender<WorkerEvent>,
}

impl FrontendReceiver {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<BackendMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<BackendMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Send a command to the backend
    ///
    /// Fails with [`DashError::Channel`] once the worker has stopped.
    pub fn send_command(&self, cmd: BackendCommand) -> Result<()> {
        self.command_sender
            .send(WorkerEvent::Command(cmd))
            .map_err(|_| DashError::Channel("backend worker has stopped".to_string()))
    }

    /// Request an immediate refresh
    pub fn refresh_now(&self) -> Result<()> {
        self.send_command(BackendCommand::RefreshNow)
    }

    /// Change the requested history length
    pub fn set_history_secs(&self, secs: u64) -> Result<()> {
        self.send_command(BackendCommand::SetHistorySecs(secs))
    }

    /// Ask the server to run a speed test
    pub fn trigger_speedtest(&self) -> Result<()> {
        self.send_command(BackendCommand::TriggerSpeedtest)
    }

    /// Pause refreshing
    pub fn pause(&self) -> Result<()> {
        self.send_command(BackendCommand::Pause)
    }

    /// Resume refreshing
    pub fn resume(&self) -> Result<()> {
        self.send_command(BackendCommand::Resume)
    }

    /// Request shutdown
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(BackendCommand::Shutdown)
    }
}

/// Build the source selected by `server.mode`
pub fn source_for(config: &AppConfig) -> Box<dyn TelemetrySource> {
    let timeout = config.timeout();
    match config.server.mode {
        SourceMode::Poll => Box::new(HttpPollSource::new(&config.server, timeout)),
        SourceMode::Push => Box::new(PushStreamSource::new(&config.server, timeout)),
        SourceMode::Mock => Box::new(SimulatedSource::new()),
    }
}

/// The telemetry backend that runs in a separate thread
pub struct TelemetryBackend {
    /// Configuration
    config: AppConfig,
    /// Telemetry source driven by the worker
    source: Box<dyn TelemetrySource>,
    /// Worker inbound channel
    event_rx: Receiver<WorkerEvent>,
    /// Kept so push sinks can feed the same channel
    event_tx: Sender<WorkerEvent>,
    /// Sender for messages to the UI
    message_sender: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl TelemetryBackend {
    /// Create a backend for the configured source with communication channels
    pub fn new(config: AppConfig) -> (Self, FrontendReceiver) {
        let source = source_for(&config);
        Self::with_source(config, source)
    }

    /// Create a backend driving a specific source
    pub fn with_source(
        config: AppConfig,
        source: Box<dyn TelemetrySource>,
    ) -> (Self, FrontendReceiver) {
        let (event_tx, event_rx) = bounded(config.collection.channel_buffer_size.max(8));
        // A snapshot is a whole dashboard; the UI only ever needs the newest few
        let (msg_tx, msg_rx) = bounded(256);

        let backend = Self {
            config,
            source,
            event_rx,
            event_tx: event_tx.clone(),
            message_sender: msg_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let frontend = FrontendReceiver {
            receiver: msg_rx,
            command_sender: event_tx,
        };

        (backend, frontend)
    }

    /// Run the backend loop
    pub fn run(self) {
        let mut worker = BackendWorker::new(
            self.config,
            self.source,
            self.event_rx,
            self.event_tx,
            self.message_sender,
            self.running,
        );
        worker.run();
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_backend_creation() {
        let config = AppConfig::default();
        let (backend, frontend) = TelemetryBackend::new(config);

        // Backend should be running
        assert!(backend.running.load(Ordering::SeqCst));

        // Should be able to send commands
        assert!(frontend.send_command(BackendCommand::Shutdown).is_ok());
    }

    #[test]
    fn test_frontend_commands_reach_worker_channel() {
        let (backend, frontend) =
            TelemetryBackend::with_source(AppConfig::default(), Box::new(SimulatedSource::new()));

        frontend.set_history_secs(3_600).unwrap();
        frontend.pause().unwrap();
        frontend.resume().unwrap();
        frontend.shutdown().unwrap();

        let commands: Vec<BackendCommand> = backend
            .event_rx
            .try_iter()
            .filter_map(|event| match event {
                WorkerEvent::Command(cmd) => Some(cmd),
                _ => None,
            })
            .collect();
        assert_eq!(
            commands,
            vec![
                BackendCommand::SetHistorySecs(3_600),
                BackendCommand::Pause,
                BackendCommand::Resume,
                BackendCommand::Shutdown,
            ]
        );
    }

    #[test]
    fn test_command_after_worker_gone() {
        let (backend, frontend) =
            TelemetryBackend::with_source(AppConfig::default(), Box::new(SimulatedSource::new()));
        drop(backend);

        let err = frontend.refresh_now().unwrap_err();
        assert!(matches!(err, DashError::Channel(_)));
    }

    #[test]
    fn test_source_for_mode() {
        let mut config = AppConfig::default();
        config.server.mode = SourceMode::Mock;
        assert_eq!(source_for(&config).describe(), "mock data");

        config.server.mode = SourceMode::Poll;
        let poll = source_for(&config);
        assert!(!poll.is_push());
        assert!(poll.describe().ends_with("/api/data"));

        config.server.mode = SourceMode::Push;
        assert!(source_for(&config).is_push());
    }
}
