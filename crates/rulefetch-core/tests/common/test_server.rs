//! Minimal HTTP/1.1 server for integration tests.
//!
//! Every connection is answered by a handler closure that sees the request
//! method, the path and how many requests the server has handled before this
//! one. The handler returns the full raw response. `start_stalling` instead
//! sends part of a body and then goes quiet.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct TestServer {
    /// Base URL, e.g. "http://127.0.0.1:12345".
    pub base: String,
    pub port: u16,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start<F>(handler: F) -> TestServer
where
    F: Fn(&str, &str, usize) -> String + Send + Sync + 'static,
{
    serve(move |stream: &mut TcpStream, method: &str, path: &str, hit: usize| {
        let reply = handler(method, path, hit);
        let _ = stream.write_all(reply.as_bytes());
        let _ = stream.flush();
    })
}

/// Sends the head and `first_chunk` of a `total_len` byte body, then holds the
/// connection open for `hold` without sending more.
pub fn start_stalling(total_len: usize, first_chunk: &'static str, hold: Duration) -> TestServer {
    serve(move |stream: &mut TcpStream, _: &str, _: &str, _: usize| {
        let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", total_len);
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(first_chunk.as_bytes());
        let _ = stream.flush();
        thread::sleep(hold);
    })
}

fn serve<R>(respond: R) -> TestServer
where
    R: Fn(&mut TcpStream, &str, &str, usize) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let respond = Arc::new(respond);
    {
        let hits = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let hits = Arc::clone(&hits);
                let respond = Arc::clone(&respond);
                thread::spawn(move || handle(stream, &*respond, &hits));
            }
        });
    }
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        port,
        hits,
    }
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap().port()
}

pub fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str("\r\n");
    out.push_str(body);
    out
}

fn handle<R>(mut stream: TcpStream, respond: &R, hits: &AtomicUsize)
where
    R: Fn(&mut TcpStream, &str, &str, usize),
{
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let raw = match read_request(&mut stream) {
        Some(raw) => raw,
        None => return,
    };
    let request = String::from_utf8_lossy(&raw);
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    let hit = hits.fetch_add(1, Ordering::SeqCst);
    respond(&mut stream, method, path, hit);
}

/// Reads the head and, when `Content-Length` is present, the body, so the
/// socket is drained before the reply closes it.
fn read_request(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return if raw.is_empty() { None } else { Some(raw) };
        }
        raw.extend_from_slice(&buf[..n]);
        if let Some(end) = find_head_end(&raw) {
            let head = String::from_utf8_lossy(&raw[..end]).to_string();
            let body_len = head
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while raw.len() < end + body_len {
                let n = stream.read(&mut buf).ok()?;
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            return Some(raw);
        }
    }
}

fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}
