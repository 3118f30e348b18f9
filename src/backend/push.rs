//! Push stream source
//!
//! Connects to the server's broadcast socket, asks for history with one
//! request line and then reads newline-delimited JSON snapshots:
//!
//! ```text
//! -> {"event":"start_broadcast","secs_history":600}
//! <- {"starlink": {...}, "status": {...}, "speedtest": {...}}
//! <- {"starlink": {...}, ...}
//! ```
//!
//! A reader thread owns the read half of the socket and forwards every
//! snapshot through a [`PushSink`]. Closing the source shuts the socket down,
//! which ends the reader.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Serialize;

use super::http::SpeedtestTrigger;
use super::source::{PushSink, TelemetrySource};
use crate::config::ServerConfig;
use crate::error::{DashError, Result};
use crate::telemetry::TelemetrySnapshot;

/// Request line that starts (or restarts) the broadcast
#[derive(Debug, Serialize)]
struct StartBroadcast {
    event: &'static str,
    secs_history: u64,
}

/// Encode the start request, newline terminated
pub fn start_broadcast_line(secs_history: u64) -> Result<String> {
    let request = StartBroadcast {
        event: "start_broadcast",
        secs_history,
    };
    let mut line = serde_json::to_string(&request)
        .map_err(|e| DashError::Serialization(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

struct Connection {
    stream: TcpStream,
    reader: JoinHandle<()>,
}

/// Receives snapshots over a long-lived TCP stream
pub struct PushStreamSource {
    addr: String,
    timeout: Duration,
    trigger: SpeedtestTrigger,
    connection: Option<Connection>,
}

impl PushStreamSource {
    pub fn new(server: &ServerConfig, timeout: Duration) -> Self {
        Self {
            addr: server.push_addr.clone(),
            timeout,
            trigger: SpeedtestTrigger::new(server.trigger_speedtest_url(), timeout),
            connection: None,
        }
    }

    fn connect(&self) -> Result<TcpStream> {
        let addrs = self
            .addr
            .to_socket_addrs()
            .map_err(|e| DashError::NotConnected(format!("cannot resolve {}: {}", self.addr, e)))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(match last_error {
            Some(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                DashError::Timeout(format!("connecting to {}", self.addr))
            }
            Some(e) => DashError::NotConnected(format!("{}: {}", self.addr, e)),
            None => DashError::NotConnected(format!("{} resolved to no address", self.addr)),
        })
    }
}

impl TelemetrySource for PushStreamSource {
    fn describe(&self) -> String {
        format!("push {}", self.addr)
    }

    fn is_push(&self) -> bool {
        true
    }

    fn fetch(&mut self, _history_secs: u64) -> Result<TelemetrySnapshot> {
        Err(DashError::NotConnected(
            "the push source delivers snapshots over its stream".to_string(),
        ))
    }

    fn subscribe(&mut self, history_secs: u64, sink: PushSink) -> Result<()> {
        self.close();

        let mut stream = self.connect()?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.write_all(start_broadcast_line(history_secs)?.as_bytes())?;
        stream.flush()?;

        let read_half = stream.try_clone()?;
        let addr = self.addr.clone();
        let reader = std::thread::Builder::new()
            .name("push-reader".to_string())
            .spawn(move || read_stream(read_half, &addr, sink))?;

        tracing::info!("Subscribed to {} with {} s of history", self.addr, history_secs);
        self.connection = Some(Connection { stream, reader });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| !c.reader.is_finished())
    }

    fn trigger_speedtest(&mut self) -> Result<()> {
        self.trigger.fire()
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            let _ = connection.stream.shutdown(Shutdown::Both);
            if connection.reader.join().is_err() {
                tracing::error!("Push reader thread panicked");
            }
            tracing::debug!("Closed push stream to {}", self.addr);
        }
    }
}

impl Drop for PushStreamSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reader loop: one snapshot per line until EOF, an error or the worker leaves
fn read_stream(stream: TcpStream, addr: &str, sink: PushSink) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                sink.closed(format!("read from {} failed: {}", addr, e));
                return;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let delivered = match TelemetrySnapshot::from_json(line) {
            Ok(snapshot) => sink.snapshot(snapshot),
            Err(e) => {
                tracing::warn!("Discarding pushed snapshot: {}", e);
                sink.error(e.to_string())
            }
        };
        if !delivered {
            return;
        }
    }
    sink.closed(format!("{} closed the stream", addr));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::WorkerEvent;
    use crossbeam_channel::unbounded;
    use std::net::TcpListener;

    #[test]
    fn test_start_broadcast_line() {
        let line = start_broadcast_line(600).unwrap();
        assert_eq!(line, "{\"event\":\"start_broadcast\",\"secs_history\":600}\n");
    }

    #[test]
    fn test_stream_delivers_snapshots() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            reader.read_line(&mut request).unwrap();

            let mut writer = stream;
            writer
                .write_all(b"{\"starlink\": {\"timestamp\": [1.0], \"snr\": [9.0]}}\n\nnot json\n")
                .unwrap();
            request
        });

        let server_config = ServerConfig {
            push_addr: addr.to_string(),
            ..Default::default()
        };
        let mut source = PushStreamSource::new(&server_config, Duration::from_secs(2));
        let (tx, rx) = unbounded();
        source.subscribe(3_600, PushSink::new(tx, 7)).unwrap();

        let request = server.join().unwrap();
        assert_eq!(request.trim(), "{\"event\":\"start_broadcast\",\"secs_history\":3600}");

        let timeout = Duration::from_secs(2);
        match rx.recv_timeout(timeout).unwrap() {
            WorkerEvent::Pushed { generation, snapshot } => {
                assert_eq!(generation, 7);
                assert_eq!(snapshot.starlink.map(|b| b.len()), Some(1));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(
            rx.recv_timeout(timeout).unwrap(),
            WorkerEvent::PushError { generation: 7, .. }
        ));
        assert!(matches!(
            rx.recv_timeout(timeout).unwrap(),
            WorkerEvent::StreamClosed { generation: 7, .. }
        ));

        // The reader exits after the server hangs up, even without the worker noticing
        let deadline = std::time::Instant::now() + timeout;
        while source.is_connected() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!source.is_connected());
        source.close();
    }

    #[test]
    fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let server_config = ServerConfig {
            push_addr: addr.to_string(),
            ..Default::default()
        };
        let mut source = PushStreamSource::new(&server_config, Duration::from_millis(500));
        let (tx, _rx) = unbounded();
        let err = source.subscribe(600, PushSink::new(tx, 1)).unwrap_err();
        assert!(matches!(err, DashError::NotConnected(_) | DashError::Timeout(_)));
        assert!(!source.is_connected());
    }
}
