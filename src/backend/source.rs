//! TelemetrySource trait for interchangeable snapshot providers
//!
//! The worker talks to every provider through this trait, so the HTTP poller,
//! the push stream and the generated mock data are swapped without the
//! worker knowing which one it drives.
//!
//! Poll sources answer [`TelemetrySource::fetch`]. Push sources instead start
//! a reader thread in [`TelemetrySource::subscribe`] that delivers snapshots
//! through a [`PushSink`] into the worker's inbound channel.

use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};

use super::WorkerEvent;
use crate::error::Result;
use crate::telemetry::TelemetrySnapshot;

const CLOSE_NOTICE_TIMEOUT: Duration = Duration::from_secs(1);

/// Provider of telemetry snapshots
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySource: Send {
    /// Human-readable description for logs and the status bar
    fn describe(&self) -> String;

    /// Whether snapshots arrive through [`subscribe`](Self::subscribe)
    fn is_push(&self) -> bool {
        false
    }

    /// Fetch one snapshot covering `history_secs` of history
    fn fetch(&mut self, history_secs: u64) -> Result<TelemetrySnapshot>;

    /// Open the push stream and start delivering snapshots to `sink`
    ///
    /// Any previous stream is closed first.
    fn subscribe(&mut self, history_secs: u64, sink: PushSink) -> Result<()>;

    /// Whether the push stream opened by the last `subscribe` is still being read
    ///
    /// Poll sources have no stream and always report true.
    fn is_connected(&self) -> bool {
        true
    }

    /// Ask the server to start a speed test; does not wait for the result
    fn trigger_speedtest(&mut self) -> Result<()>;

    /// Close any open stream
    fn close(&mut self) {}
}

/// Handle a push reader thread uses to feed the worker
///
/// Each subscription gets a new generation number; the worker discards
/// events from older subscriptions.
#[derive(Debug, Clone)]
pub struct PushSink {
    tx: Sender<WorkerEvent>,
    generation: u64,
}

impl PushSink {
    pub fn new(tx: Sender<WorkerEvent>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver a snapshot; returns false once the worker is gone
    ///
    /// A full queue drops the snapshot; a newer one follows on the stream.
    pub fn snapshot(&self, snapshot: TelemetrySnapshot) -> bool {
        self.offer(WorkerEvent::Pushed {
            generation: self.generation,
            snapshot: Box::new(snapshot),
        })
    }

    /// Report a line that could not be used; returns false once the worker is gone
    pub fn error(&self, message: impl Into<String>) -> bool {
        self.offer(WorkerEvent::PushError {
            generation: self.generation,
            message: message.into(),
        })
    }

    /// Report that the stream ended
    pub fn closed(&self, reason: impl Into<String>) {
        let event = WorkerEvent::StreamClosed {
            generation: self.generation,
            reason: reason.into(),
        };
        // Bounded wait: the worker may be joining this reader while its queue is full
        if self.tx.send_timeout(event, CLOSE_NOTICE_TIMEOUT).is_err() {
            tracing::debug!("Stream close notice for generation {} not delivered", self.generation);
        }
    }

    fn offer(&self, event: WorkerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!("Worker queue full, dropping pushed event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
