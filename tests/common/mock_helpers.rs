//! Mock construction helpers

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use starlink_dash::backend::{BackendMessage, FrontendReceiver};

/// Serve `count` HTTP requests with a fixed JSON body
///
/// Returns the listening address and a handle yielding the request lines.
pub fn serve_json(body: String, count: usize) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("local addr");

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for _ in 0..count {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

            // Request line, then headers up to the blank line
            let mut line = String::new();
            reader.read_line(&mut line).expect("read request line");
            requests.push(line.trim().to_string());
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap_or(0) == 0 || header.trim().is_empty() {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
        requests
    });

    (addr, handle)
}

/// Drain backend messages until `pred` matches one or the timeout passes
pub fn wait_for_message(
    frontend: &FrontendReceiver,
    timeout: Duration,
    pred: impl Fn(&BackendMessage) -> bool,
) -> Option<BackendMessage> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(msg) = frontend.receiver.recv_timeout(Duration::from_millis(50)) {
            if pred(&msg) {
                return Some(msg);
            }
        }
    }
    None
}
