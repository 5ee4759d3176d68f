//! Minimal HTTP/1.1 server standing in for the archive site in integration tests.
//!
//! Serves `/archive.php` (with or without a selected archive option), a
//! search page, and recordings under `/<airport>/<file>.mp3`. Recordings whose
//! time token is listed in `missing` get 404; those listed in `broken` get 500.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone, Default)]
pub struct ArchiveServerOptions {
    /// Value of the selected `<option>` on the archive page; None omits it.
    pub archive_identifier: Option<String>,
    /// Time tokens (e.g. "0100Z") answered with 404.
    pub missing: Vec<String>,
    /// Time tokens answered with 500.
    pub broken: Vec<String>,
    /// Body of `/search/`.
    pub search_page: String,
}

/// Running server: base URL plus every request path it has seen.
#[derive(Debug, Clone)]
pub struct ArchiveServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ArchiveServer {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path contains `needle`.
    pub fn hits(&self, needle: &str) -> usize {
        self.requests().iter().filter(|p| p.contains(needle)).count()
    }
}

/// Starts a server in a background thread serving `recording` for every
/// archive file. Runs until the process exits.
pub fn start(recording: Vec<u8>, opts: ArchiveServerOptions) -> ArchiveServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let recording = Arc::new(recording);
    let opts = Arc::new(opts);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let recording = Arc::clone(&recording);
            let opts = Arc::clone(&opts);
            let seen = Arc::clone(&seen);
            thread::spawn(move || handle(stream, &recording, &opts, &seen));
        }
    });
    ArchiveServer {
        base_url: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    recording: &[u8],
    opts: &ArchiveServerOptions,
    seen: &Mutex<Vec<String>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/").to_string();
    seen.lock().unwrap().push(path.clone());

    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "text/plain", b"");
        return;
    }
    if path.starts_with("/archive.php") {
        let option = match &opts.archive_identifier {
            Some(id) => format!(r#"<option value="{}" selected>{}</option>"#, id, id),
            None => String::new(),
        };
        let page = format!(
            "<html><body><select name=\"m\"><option value=\"OTHER\">Other</option>{}</select></body></html>",
            option
        );
        respond(&mut stream, "200 OK", "text/html", page.as_bytes());
        return;
    }
    if path.starts_with("/search/") {
        respond(&mut stream, "200 OK", "text/html", opts.search_page.as_bytes());
        return;
    }
    if path.ends_with(".mp3") {
        if opts.missing.iter().any(|t| path.contains(t.as_str())) {
            respond(&mut stream, "404 Not Found", "text/plain", b"not found");
        } else if opts.broken.iter().any(|t| path.contains(t.as_str())) {
            respond(&mut stream, "500 Internal Server Error", "text/plain", b"oops");
        } else {
            respond(&mut stream, "200 OK", "audio/mpeg", recording);
        }
        return;
    }
    respond(&mut stream, "404 Not Found", "text/plain", b"");
}

fn respond(stream: &mut std::net::TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}
