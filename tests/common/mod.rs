//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Document that passes validation
pub const VALID_DOCUMENT: &str = r#"
version: "1"
variables:
  api: http://localhost:8080
  user:
    name: Ada
transactions:
  - id: users
    variables:
      page: 2
    steps:
      - id: list
        request:
          endpoint: "{{ var.api }}/users?page={{ var.page }}"
        expect:
          code: 200
          body:
            - is: [{ ok: true }]
"#;

/// Temporary directory holding test documents
pub struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

fn read_request_head<S: Read>(stream: &mut S) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }
    Ok(head)
}

fn respond<S: Read + Write>(stream: &mut S, delay: Duration, body: &str) -> std::io::Result<()> {
    read_request_head(stream)?;
    thread::sleep(delay);
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )?;
    stream.flush()
}

/// Plain HTTP server answering every request with `body` after `delay`
pub fn spawn_http_server(delay: Duration, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("test server address");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            thread::spawn(move || {
                let _ = respond(&mut stream, delay, body);
            });
        }
    });
    addr
}

/// HTTPS server using a freshly generated self-signed certificate for
/// `localhost`
pub fn spawn_tls_server(body: &'static str) -> SocketAddr {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .expect("generate certificate");
    let identity = native_tls::Identity::from_pkcs8(
        certified.cert.pem().as_bytes(),
        certified.key_pair.serialize_pem().as_bytes(),
    )
    .expect("load identity");
    let acceptor = std::sync::Arc::new(native_tls::TlsAcceptor::new(identity).expect("acceptor"));

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind tls server");
    let addr = listener.local_addr().expect("tls server address");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let acceptor = acceptor.clone();
            thread::spawn(move || {
                // Handshakes rejected by the client end here
                if let Ok(mut tls) = acceptor.accept(stream) {
                    let _ = respond(&mut tls, Duration::ZERO, body);
                }
            });
        }
    });
    addr
}

/// Address with nothing listening on it
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    addr
}
