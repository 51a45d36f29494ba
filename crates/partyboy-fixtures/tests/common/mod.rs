#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{Read as _, Write as _};
use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use partyboy_fixtures::{ProcessCommand, ProcessRunner, Result};
use zip::write::SimpleFileOptions;

#[derive(Clone)]
pub struct Route {
    pub path: String,
    pub status_line: &'static str,
    pub body: Vec<u8>,
    /// Advertise the full length but close after half of the body.
    pub truncate: bool,
    pub location: Option<String>,
}

impl Route {
    pub fn ok(path: &str, body: &[u8]) -> Self {
        Route {
            path: path.to_string(),
            status_line: "200 OK",
            body: body.to_vec(),
            truncate: false,
            location: None,
        }
    }

    pub fn status(path: &str, status_line: &'static str) -> Self {
        Route {
            path: path.to_string(),
            status_line,
            body: b"nope".to_vec(),
            truncate: false,
            location: None,
        }
    }

    pub fn redirect(path: &str, to: &str) -> Self {
        Route {
            location: Some(to.to_string()),
            ..Route::status(path, "302 Found")
        }
    }

    pub fn truncated(path: &str, body: &[u8]) -> Self {
        Route {
            truncate: true,
            ..Route::ok(path, body)
        }
    }
}

pub struct TestServer {
    base: String,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serves `routes` on an ephemeral localhost port until the test process exits.
pub fn start_http_server(routes: Vec<Route>) -> TestServer {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else {
                continue;
            };
            let _ = stream.set_read_timeout(Some(Duration::from_secs(1)));

            let mut buf = Vec::new();
            let mut tmp = [0u8; 4096];
            for _ in 0..64 {
                match stream.read(&mut tmp) {
                    Ok(0) => break,
                    Ok(n) => {
                        buf.extend_from_slice(&tmp[..n]);
                        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            counter.fetch_add(1, Ordering::SeqCst);

            let request = String::from_utf8_lossy(&buf);
            let path = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/")
                .to_string();
            let route = routes
                .iter()
                .find(|r| r.path == path)
                .cloned()
                .unwrap_or_else(|| Route::status(&path, "404 Not Found"));

            let location = route
                .location
                .as_deref()
                .map(|to| format!("Location: {to}\r\n"))
                .unwrap_or_default();
            let head = format!(
                "HTTP/1.1 {}\r\n\
Content-Type: application/octet-stream\r\n\
Content-Length: {}\r\n\
{location}\
Connection: close\r\n\
\r\n",
                route.status_line,
                route.body.len()
            );
            let body = if route.truncate {
                &route.body[..route.body.len() / 2]
            } else {
                &route.body[..]
            };
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
            let _ = stream.flush();
        }
    });

    TestServer {
        base: format!("http://{addr}/"),
        hits,
    }
}

/// Builds a zip in memory. Names ending in `/` become directory entries.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut w = zip::ZipWriter::new(&mut cursor);
        let opts = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            if name.ends_with('/') {
                w.add_directory(*name, opts).expect("add dir");
            } else {
                w.start_file(*name, opts).expect("start file");
                w.write_all(contents.as_bytes()).expect("write entry");
            }
        }
        w.finish().expect("finish zip");
    }
    cursor.into_inner()
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    std::fs::write(path, zip_bytes(entries)).expect("write zip");
}

pub fn sha256(path: &Path) -> Vec<u8> {
    use sha2::{Digest as _, Sha256};
    let bytes = std::fs::read(path).expect("read file");
    Sha256::digest(&bytes).to_vec()
}

/// Records every command and answers with a fixed exit code.
pub struct FakeRunner {
    pub code: i32,
    pub commands: RefCell<Vec<ProcessCommand>>,
}

impl FakeRunner {
    pub fn exiting_with(code: i32) -> Self {
        FakeRunner {
            code,
            commands: RefCell::new(Vec::new()),
        }
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, cmd: &ProcessCommand) -> Result<i32> {
        self.commands.borrow_mut().push(cmd.clone());
        Ok(self.code)
    }
}
