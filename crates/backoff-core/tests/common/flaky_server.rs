//! Minimal HTTP/1.1 server that fails a fixed number of times before succeeding.
//!
//! Each failing request gets the configured status (e.g. 503 or 429) and an
//! optional `Retry-After` header; later requests get 200 with the body.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct FlakyServerOptions {
    /// Number of requests answered with `failure_status` before succeeding.
    pub failures: usize,
    pub failure_status: u16,
    /// `Retry-After` value sent with failures, if any.
    pub retry_after: Option<String>,
    pub body: Vec<u8>,
}

impl Default for FlakyServerOptions {
    fn default() -> Self {
        Self {
            failures: 2,
            failure_status: 503,
            retry_after: None,
            body: b"hello".to_vec(),
        }
    }
}

/// Handle to a running server: its URL and the number of requests seen.
pub struct FlakyServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl FlakyServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(opts: FlakyServerOptions) -> FlakyServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let opts = Arc::new(opts);
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, n, &opts));
        }
    });
    FlakyServer {
        url: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, n: usize, opts: &FlakyServerOptions) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }

    let response = if n < opts.failures {
        let retry_after = opts
            .retry_after
            .as_deref()
            .map(|v| format!("Retry-After: {}\r\n", v))
            .unwrap_or_default();
        format!(
            "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n{}\r\n",
            opts.failure_status,
            reason(opts.failure_status),
            retry_after
        )
        .into_bytes()
    } else {
        let mut r = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            opts.body.len()
        )
        .into_bytes();
        r.extend_from_slice(&opts.body);
        r
    };
    let _ = stream.write_all(&response);
}

fn reason(status: u16) -> &'static str {
    match status {
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    }
}
