//! Minimal HTTP/1.1 server on a loopback port for exercising the real
//! reqwest paths in tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub(crate) enum Reply {
    /// Written as-is, then the connection is closed.
    Raw(Vec<u8>),
    /// `Transfer-Encoding: chunked` body sent as `count` chunks of `size` bytes.
    Chunked { content_type: String, size: usize, count: usize },
    /// Accepts the request and never answers within `Duration`.
    Stall(Duration),
}

impl Reply {
    pub fn status(status: u16, content_type: &str, body: &[u8]) -> Self {
        Self::with_headers(status, &[("Content-Type", content_type)], body)
    }

    pub fn with_headers(status: u16, headers: &[(&str, &str)], body: &[u8]) -> Self {
        let mut raw = format!("HTTP/1.1 {} Test\r\n", status);
        for (name, value) in headers {
            raw.push_str(&format!("{}: {}\r\n", name, value));
        }
        raw.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        ));
        let mut bytes = raw.into_bytes();
        bytes.extend_from_slice(body);
        Reply::Raw(bytes)
    }

    pub fn redirect(location: &str) -> Self {
        Self::with_headers(302, &[("Location", location)], b"")
    }
}

pub(crate) struct TestServer {
    pub addr: SocketAddr,
}

impl TestServer {
    /// Binds first so `route` can build URLs pointing back at this server.
    pub async fn bind() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    pub fn serve<F>(listener: TcpListener, route: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let addr = listener.local_addr().unwrap();
        let route = Arc::new(route);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let route = route.clone();
                tokio::spawn(async move {
                    handle(stream, route.as_ref()).await;
                });
            }
        });
        Self { addr }
    }

    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let (listener, _) = Self::bind().await;
        Self::serve(listener, route)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn handle<F: Fn(&str) -> Reply>(mut stream: TcpStream, route: &F) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
        if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&request[..header_end]).to_string();
    let body_len = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    // Drain the body so closing the socket does not reset the connection.
    while request.len() < header_end + body_len {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    match route(&path) {
        Reply::Raw(bytes) => {
            let _ = stream.write_all(&bytes).await;
        }
        Reply::Chunked { content_type, size, count } => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                content_type
            );
            if stream.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let chunk = vec![b'x'; size];
            for _ in 0..count {
                let mut framed = format!("{:x}\r\n", size).into_bytes();
                framed.extend_from_slice(&chunk);
                framed.extend_from_slice(b"\r\n");
                if stream.write_all(&framed).await.is_err() {
                    return;
                }
            }
            let _ = stream.write_all(b"0\r\n\r\n").await;
        }
        Reply::Stall(wait) => {
            tokio::time::sleep(wait).await;
        }
    }
    let _ = stream.shutdown().await;
}
