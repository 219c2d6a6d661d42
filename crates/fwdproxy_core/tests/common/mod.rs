//! Shared utilities for the end-to-end proxy tests: a scripted origin
//! server and helpers to boot the proxy on an ephemeral port.

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use fwdproxy_config::ProxyConfig;
use fwdproxy_proxy::Proxy;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// Origin server that answers every GET with `body_for(path)` and closes.
pub struct MockOrigin {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockOrigin {
    pub async fn start<F>(body_for: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::start_with_delay(Duration::ZERO, body_for).await
    }

    /// Waits `delay` after reading each request before answering.
    pub async fn start_with_delay<F>(delay: Duration, body_for: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let body_for = Arc::new(body_for);

        let conn_count = connections.clone();
        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                conn_count.fetch_add(1, Ordering::SeqCst);
                let seen = seen.clone();
                let body_for = body_for.clone();

                tokio::spawn(async move {
                    let head = read_head(&mut socket).await;
                    let path = head
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    seen.lock().unwrap().push(head);

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }

                    let body = body_for(&path);
                    let response = format!(
                        "HTTP/1.0 200 OK\r\nContent-length: {}\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            addr,
            connections,
            requests,
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Request heads received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Boot the proxy on an ephemeral loopback port.
pub async fn start_proxy(cfg: ProxyConfig) -> (SocketAddr, Arc<Proxy>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let proxy = Arc::new(Proxy::new(&cfg));

    tokio::spawn(fwdproxy_core::serve(listener, proxy.clone(), Arc::new(cfg)));

    (addr, proxy)
}

/// Send raw bytes to the proxy and read until it closes the connection.
pub async fn send_raw(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

pub async fn get(proxy: SocketAddr, url: &str) -> Vec<u8> {
    let request = format!("GET {url} HTTP/1.0\r\n\r\n");
    send_raw(proxy, request.as_bytes()).await
}

#[allow(dead_code)]
pub fn body_of(response: &[u8]) -> &[u8] {
    response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| &response[i + 4..])
        .unwrap_or(&[])
}
