//! Minimal HTTP/1.1 server speaking enough of the lookup, search and
//! download protocols for integration tests.
//!
//! Reads one request per connection (query string plus form-encoded body),
//! answers with `Connection: close`. Requests without the expected API key
//! get 403.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const API_KEY: &str = "test-key";

#[derive(Debug, Clone, Default)]
pub struct Fixture {
    /// Bodies served by the download endpoint, keyed by lowercase hash.
    pub samples: HashMap<String, Vec<u8>>,
    /// Full result list of every search query.
    pub search_hashes: Vec<String>,
    /// Hashes per search page.
    pub page_size: usize,
    /// Download hashes that answer 503 on their first request.
    pub flaky: Vec<String>,
}

pub struct VtServer {
    pub base: String,
    requests: Arc<AtomicUsize>,
}

impl VtServer {
    /// Requests handled so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

struct State {
    fixture: Fixture,
    seen_flaky: Mutex<Vec<String>>,
    requests: Arc<AtomicUsize>,
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start(fixture: Fixture) -> VtServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(AtomicUsize::new(0));
    let state = Arc::new(State {
        fixture,
        seen_flaky: Mutex::new(Vec::new()),
        requests: Arc::clone(&requests),
    });
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&state);
            thread::spawn(move || handle(stream, &state));
        }
    });
    VtServer {
        base: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some((method, target, body)) = read_request(&mut stream) else {
        return;
    };
    state.requests.fetch_add(1, Ordering::SeqCst);

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let mut params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    if method.eq_ignore_ascii_case("POST") {
        params.extend(url::form_urlencoded::parse(&body).into_owned());
    }

    let (status, body) = if params.get("apikey").map(String::as_str) != Some(API_KEY) {
        (403, Vec::new())
    } else {
        route(path, &params, state)
    };
    write_response(&mut stream, status, &body);
}

fn route(path: &str, params: &HashMap<String, String>, state: &State) -> (u32, Vec<u8>) {
    let param = |k: &str| params.get(k).map(String::as_str).unwrap_or("");
    match path {
        "/vtapi/v2/file/report" => report(param("resource")),
        "/vtapi/v2/file/search" => search(state, param("offset"), "offset"),
        "/intelligence/search/programmatic/" => search(state, param("page"), "next_page"),
        "/intelligence/download/" => download(state, param("hash")),
        _ => (404, Vec::new()),
    }
}

/// Resources containing "boom" fail with 500.
fn report(resource: &str) -> (u32, Vec<u8>) {
    if resource.contains("boom") {
        return (500, Vec::new());
    }
    let record = |id: &str| {
        serde_json::json!({
            "sha256": id,
            "resource": id,
            "response_code": 1,
            "positives": id.len(),
        })
    };
    let ids: Vec<&str> = resource.split(',').collect();
    let body = if ids.len() > 1 {
        serde_json::Value::Array(ids.into_iter().map(record).collect())
    } else {
        record(resource)
    };
    (200, body.to_string().into_bytes())
}

fn search(state: &State, cursor: &str, cursor_field: &str) -> (u32, Vec<u8>) {
    let all = &state.fixture.search_hashes;
    let size = state.fixture.page_size.max(1);
    let start = cursor.parse::<usize>().unwrap_or(0).min(all.len());
    let end = (start + size).min(all.len());
    let mut body = serde_json::json!({ "hashes": &all[start..end] });
    if end < all.len() {
        body[cursor_field] = serde_json::json!(end.to_string());
    }
    (200, body.to_string().into_bytes())
}

fn download(state: &State, hash: &str) -> (u32, Vec<u8>) {
    let hash = hash.to_ascii_lowercase();
    let hash = hash.as_str();
    if state.fixture.flaky.iter().any(|h| h == hash) {
        let mut seen = state.seen_flaky.lock().unwrap();
        if !seen.iter().any(|h| h == hash) {
            seen.push(hash.to_string());
            return (503, Vec::new());
        }
    }
    match state.fixture.samples.get(hash) {
        Some(data) => (200, data.clone()),
        None => (404, Vec::new()),
    }
}

/// Returns (method, request target, body).
fn read_request(stream: &mut TcpStream) -> Option<(String, String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);
    Some((method, target, body))
}

fn write_response(stream: &mut TcpStream, status: u32, body: &[u8]) {
    let reason = match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}
