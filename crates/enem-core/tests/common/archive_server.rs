//! Minimal HTTP/1.1 server for integration tests: HEAD and GET over a fixed
//! set of paths. Unknown paths answer 404 to both methods.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Route {
    /// 200 with the body and its exact Content-Length.
    Body(Vec<u8>),
    /// 200 with `Content-Length: 0`.
    Empty,
    /// Declares `declared` bytes but sends only the body, then closes.
    Truncated { body: Vec<u8>, declared: u64 },
}

/// Handle to a running server.
pub struct ArchiveServer {
    pub base_url: String,
    heads: Arc<Mutex<HashMap<String, usize>>>,
}

impl ArchiveServer {
    /// Number of HEAD requests seen for `path` (e.g. "/microdados/microdados_enem_2021.zip").
    pub fn head_count(&self, path: &str) -> usize {
        self.heads.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

/// Starts a server in a background thread; it runs until the process exits.
pub fn start(routes: HashMap<String, Route>) -> ArchiveServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let heads = Arc::new(Mutex::new(HashMap::new()));
    let seen = Arc::clone(&heads);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let seen = Arc::clone(&seen);
            thread::spawn(move || handle(stream, &routes, &seen));
        }
    });
    ArchiveServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        heads,
    }
}

/// Route key for a year's archive.
pub fn year_path(year: u16) -> String {
    format!("/microdados/microdados_enem_{year}.zip")
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    heads: &Mutex<HashMap<String, usize>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("").to_string();
    let is_head = method.eq_ignore_ascii_case("HEAD");
    if is_head {
        *heads.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
    }

    let (declared, body): (u64, &[u8]) = match routes.get(&path) {
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
        Some(Route::Body(b)) => (b.len() as u64, b.as_slice()),
        Some(Route::Empty) => (0, &[][..]),
        Some(Route::Truncated { body, declared }) => (*declared, body.as_slice()),
    };
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        declared
    );
    let _ = stream.write_all(header.as_bytes());
    if !is_head {
        let _ = stream.write_all(body);
    }
    let _ = stream.flush();
}
