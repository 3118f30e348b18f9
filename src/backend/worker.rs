//! Backend Worker Thread Implementation
//!
//! This module contains the worker loop that runs in a separate thread and
//! owns the refresh schedule. It communicates with the UI thread through
//! crossbeam channels.
//!
//! # Responsibilities
//!
//! - **Command processing**: Responds to UI commands (refresh, pause, history length, ...)
//! - **Timed refresh**: Polls the source every refresh interval
//! - **Push relay**: Forwards pushed snapshots in arrival order, ignoring stale streams
//! - **Reconnect**: Reopens a dropped push stream on the next scheduled tick
//! - **Statistics tracking**: Counts fetches, failures, latency and dropped messages
//!
//! # Scheduling
//!
//! The next refresh is scheduled only after the current one has finished,
//! so a slow fetch delays the schedule instead of overlapping with the next
//! one. Between refreshes the worker blocks on its inbound channel, so
//! commands are handled as soon as they arrive.

use crate::backend::source::{PushSink, TelemetrySource};
use crate::backend::{BackendCommand, BackendMessage, WorkerEvent};
use crate::config::AppConfig;
use crate::telemetry::TelemetrySnapshot;
use crate::types::{ConnectionStatus, RefreshStats};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest the loop blocks before re-checking the running flag
const IDLE_WAIT: Duration = Duration::from_millis(250);

/// The backend worker that runs the refresh loop
pub struct BackendWorker {
    /// Telemetry source (poll, push or mock)
    source: Box<dyn TelemetrySource>,
    /// Whether the source delivers snapshots over a stream
    push: bool,
    /// Inbound channel: UI commands and push stream events
    event_rx: Receiver<WorkerEvent>,
    /// Handed to push sinks
    event_tx: Sender<WorkerEvent>,
    /// Message sender to the UI
    message_tx: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Current connection status
    connection_status: ConnectionStatus,
    /// Whether refreshing is paused
    paused: bool,
    /// Seconds of history requested from the source
    history_secs: u64,
    /// Time between the end of one refresh and the start of the next
    refresh_interval: Duration,
    /// When the next refresh is due; `None` while paused
    next_refresh: Option<Instant>,
    /// Generation of the current push subscription
    generation: u64,
    /// Whether a push subscription is open
    stream_open: bool,
    /// Statistics
    stats: RefreshStats,
}

impl BackendWorker {
    /// Create a new backend worker
    pub fn new(
        config: AppConfig,
        source: Box<dyn TelemetrySource>,
        event_rx: Receiver<WorkerEvent>,
        event_tx: Sender<WorkerEvent>,
        message_tx: Sender<BackendMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let push = source.is_push();
        Self {
            source,
            push,
            event_rx,
            event_tx,
            message_tx,
            running,
            connection_status: ConnectionStatus::Disconnected,
            paused: false,
            history_secs: config.collection.history_secs.max(1),
            refresh_interval: config.refresh_interval(),
            next_refresh: Some(Instant::now()),
            generation: 0,
            stream_open: false,
            stats: RefreshStats::default(),
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!("Backend worker started ({})", self.source.describe());

        while self.running.load(Ordering::SeqCst) {
            match self.event_rx.recv_timeout(self.wait_time()) {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }

            if self.refresh_due() {
                self.refresh();
            }
        }

        // Cleanup
        self.source.close();
        self.stream_open = false;

        let _ = self.message_tx.try_send(BackendMessage::Shutdown);
        tracing::info!("Backend worker stopped");
    }

    /// How long to block on the inbound channel
    fn wait_time(&self) -> Duration {
        match self.next_refresh {
            Some(at) => at.saturating_duration_since(Instant::now()).min(IDLE_WAIT),
            None => IDLE_WAIT,
        }
    }

    fn refresh_due(&self) -> bool {
        !self.paused && self.next_refresh.is_some_and(|at| Instant::now() >= at)
    }

    /// Schedule the next refresh one interval from now
    fn schedule_next(&mut self) {
        self.next_refresh = Some(Instant::now() + self.refresh_interval);
    }

    fn schedule_now(&mut self) {
        if !self.paused {
            self.next_refresh = Some(Instant::now());
        }
    }

    /// Handle one inbound event
    fn handle_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Command(cmd) => self.handle_command(cmd),
            WorkerEvent::Pushed {
                generation,
                snapshot,
            } => {
                if self.is_current(generation) {
                    self.stats.pushed_snapshots += 1;
                    self.deliver(snapshot);
                } else {
                    tracing::trace!("Ignoring snapshot from stale stream {}", generation);
                }
            }
            WorkerEvent::PushError {
                generation,
                message,
            } => {
                if self.is_current(generation) {
                    self.stats.record_failure();
                    self.try_send_message(BackendMessage::FetchError(message));
                    self.send_stats();
                }
            }
            WorkerEvent::StreamClosed { generation, reason } => {
                if self.is_current(generation) {
                    tracing::warn!("Push stream closed: {}", reason);
                    self.stream_open = false;
                    self.update_connection_status(ConnectionStatus::Error);
                    self.try_send_message(BackendMessage::FetchError(reason));
                }
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.paused && self.stream_open && generation == self.generation
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::RefreshNow => {
                if self.push {
                    self.close_stream();
                }
                self.schedule_now();
            }
            BackendCommand::SetHistorySecs(secs) => {
                let secs = secs.max(1);
                if secs != self.history_secs {
                    tracing::info!("History length set to {} s", secs);
                    self.history_secs = secs;
                    if self.push {
                        self.close_stream();
                    }
                    self.schedule_now();
                }
            }
            BackendCommand::TriggerSpeedtest => self.trigger_speedtest(),
            BackendCommand::Pause => self.pause(),
            BackendCommand::Resume => self.resume(),
            BackendCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.next_refresh = None;
        self.close_stream();
        self.update_connection_status(ConnectionStatus::Paused);
        tracing::info!("Refreshing paused");
    }

    fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.update_connection_status(ConnectionStatus::Connecting);
        self.schedule_now();
        tracing::info!("Refreshing resumed");
    }

    fn close_stream(&mut self) {
        self.source.close();
        self.stream_open = false;
    }

    fn trigger_speedtest(&mut self) {
        match self.source.trigger_speedtest() {
            Ok(()) => {
                self.try_send_message(BackendMessage::SpeedtestTriggered);
                // Poll sources pick the new result up on the next fetch
                if !self.push {
                    self.schedule_now();
                }
            }
            Err(e) => {
                tracing::warn!("Failed to trigger speed test: {}", e);
                self.try_send_message(BackendMessage::FetchError(format!(
                    "Speed test trigger failed: {}",
                    e
                )));
            }
        }
    }

    /// Run one refresh cycle and schedule the next
    fn refresh(&mut self) {
        if self.push {
            // The close notice can be lost if the queue stayed full
            if self.stream_open && !self.source.is_connected() {
                tracing::warn!("Push stream ended without notice, resubscribing");
                self.stream_open = false;
            }
            if !self.stream_open {
                self.subscribe();
            }
        } else {
            self.poll();
        }
        self.schedule_next();
    }

    fn poll(&mut self) {
        if self.connection_status == ConnectionStatus::Disconnected {
            self.update_connection_status(ConnectionStatus::Connecting);
        }

        let start = Instant::now();
        match self.source.fetch(self.history_secs) {
            Ok(snapshot) => {
                self.stats.record_success(start.elapsed());
                self.deliver(Box::new(snapshot));
            }
            Err(e) => {
                self.stats.record_failure();
                tracing::warn!("Fetch from {} failed: {}", self.source.describe(), e);
                self.update_connection_status(ConnectionStatus::Error);
                self.try_send_message(BackendMessage::FetchError(e.to_string()));
                self.send_stats();
            }
        }
    }

    fn subscribe(&mut self) {
        self.generation += 1;
        let sink = PushSink::new(self.event_tx.clone(), self.generation);
        self.update_connection_status(ConnectionStatus::Connecting);

        match self.source.subscribe(self.history_secs, sink) {
            Ok(()) => {
                self.stream_open = true;
            }
            Err(e) => {
                self.stats.record_failure();
                tracing::warn!("Subscribe to {} failed: {}", self.source.describe(), e);
                self.update_connection_status(ConnectionStatus::Error);
                self.try_send_message(BackendMessage::FetchError(e.to_string()));
                self.send_stats();
            }
        }
    }

    /// Hand a snapshot to the UI
    fn deliver(&mut self, snapshot: Box<TelemetrySnapshot>) {
        self.update_connection_status(ConnectionStatus::Connected);
        self.try_send_message(BackendMessage::Snapshot(snapshot));
        self.send_stats();
    }

    /// Update connection status and notify UI when it changes
    fn update_connection_status(&mut self, status: ConnectionStatus) {
        if self.connection_status == status {
            return;
        }
        self.connection_status = status;
        self.try_send_message(BackendMessage::ConnectionStatus(status));
    }

    /// Send statistics to UI (using try_send for backpressure)
    fn send_stats(&mut self) {
        let stats = self.stats.clone();
        self.try_send_message(BackendMessage::Stats(stats));
    }

    /// Try to send a message, tracking dropped messages if queue is full
    ///
    /// Uses try_send() to avoid blocking. If the queue is full, the message
    /// is dropped and the dropped_messages counter is incremented. If the UI
    /// is gone the worker stops.
    fn try_send_message(&mut self, msg: BackendMessage) {
        match self.message_tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.stats.dropped_messages += 1,
            Err(TrySendError::Disconnected(_)) => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }
}
