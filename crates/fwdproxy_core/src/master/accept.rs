use std::{net::SocketAddr, sync::Arc, time::Duration};

use fwdproxy_config::ProxyConfig;
use fwdproxy_proxy::Proxy;
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, debug, error, info, instrument};

use crate::worker::handle_connection;

/// Pause after a failed `accept()` (e.g. out of file descriptors) so the
/// loop does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub(crate) async fn bind_listener(listen_addr: &str) -> anyhow::Result<TcpListener> {
    info!(
        target: "fwdproxy::master",
        listen = %listen_addr,
        "Binding listener"
    );

    match TcpListener::bind(listen_addr).await {
        Ok(listener) => {
            info!(
                target: "fwdproxy::master",
                listen = %listen_addr,
                "Bind() successful"
            );
            Ok(listener)
        }
        Err(e) => {
            error!(
                target: "fwdproxy::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to bind listener"
            );
            Err(e.into())
        }
    }
}

/// Accept loop. Every connection gets its own task and is never awaited
/// here; there is no cap on concurrent connections.
#[instrument(skip(listener, proxy, cfg), fields(listen = ?listener.local_addr().ok()))]
pub async fn serve(
    listener: TcpListener,
    proxy: Arc<Proxy>,
    cfg: Arc<ProxyConfig>,
) -> anyhow::Result<()> {
    let listen_addr = listener.local_addr()?;
    info!(
        target: "fwdproxy::master",
        listen = %listen_addr,
        "accept_loop started for listening socket"
    );

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(
                    target: "fwdproxy::master",
                    listen = %listen_addr,
                    error = ?e,
                    "Failed to accept connection"
                );
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };

        info!(
            target: "fwdproxy::master",
            client_addr = %addr,
            "Accepted connection from ({}, {})",
            addr.ip(),
            addr.port()
        );

        spawn_worker(stream, addr, listen_addr, proxy.clone(), cfg.clone());
    }
}

fn spawn_worker(
    stream: TcpStream,
    addr: SocketAddr,
    listen_addr: SocketAddr,
    proxy: Arc<Proxy>,
    cfg: Arc<ProxyConfig>,
) {
    let span = tracing::info_span!(
        "worker_connection",
        client_addr = %addr,
        listen = %listen_addr,
    );

    let worker = tokio::spawn(
        async move {
            debug!(
                target: "fwdproxy::worker",
                "Worker spawned for incoming connection"
            );

            if let Err(e) = handle_connection(Box::new(stream), addr, proxy, cfg).await {
                error!(
                    target: "fwdproxy::worker",
                    client_addr = %addr,
                    error = ?e,
                    "Error while handling connection"
                );
            } else {
                debug!(
                    target: "fwdproxy::worker",
                    client_addr = %addr,
                    "Connection handled successfully"
                );
            }
        }
        .instrument(span),
    );

    // Detached watcher: a panicking worker is logged and forgotten.
    tokio::spawn(async move {
        if let Err(e) = worker.await
            && e.is_panic()
        {
            error!(
                target: "fwdproxy::worker",
                client_addr = %addr,
                error = %e,
                "Worker task panicked"
            );
        }
    });
}
