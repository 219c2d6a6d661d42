use std::{net::SocketAddr, sync::Arc};

use fwdproxy_config::ProxyConfig;
use fwdproxy_http::responses::send_501;
use fwdproxy_proxy::{Proxy, ServeOutcome};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

mod request;

use request::{ReadOutcome, read_request};

/// Anything a client connection can be served over. `TcpStream` in
/// production, in-memory duplex pipes in tests.
pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// =======================================================
/// CONNECTION HANDLER
/// =======================================================
///
/// One request per connection: read the head, dispatch, close.
#[instrument(skip(stream, proxy, cfg), fields(client = %client_addr))]
pub async fn handle_connection(
    mut stream: Box<dyn ClientStream>,
    client_addr: SocketAddr,
    proxy: Arc<Proxy>,
    cfg: Arc<ProxyConfig>,
) -> anyhow::Result<()> {
    let result = serve_request(stream.as_mut(), &proxy, &cfg).await;

    // The peer may already be gone; nothing left to report either way.
    if let Err(e) = stream.shutdown().await {
        debug!(target: "fwdproxy::worker", error = %e, "Shutdown after response failed");
    }

    result
}

async fn serve_request(
    stream: &mut dyn ClientStream,
    proxy: &Proxy,
    cfg: &ProxyConfig,
) -> anyhow::Result<()> {
    let req = match read_request(stream, cfg.http()).await? {
        ReadOutcome::Request(req) => req,
        ReadOutcome::Closed | ReadOutcome::Rejected => return Ok(()),
    };

    info!(
        target: "fwdproxy::http",
        method = %req.method,
        uri = %req.target,
        version = %req.version,
        "Incoming request"
    );

    if !req.is_get() {
        warn!(target: "fwdproxy::http", method = %req.method, "Method not implemented");
        send_501(stream, &req.method).await?;
        return Ok(());
    }

    match proxy.serve(stream, &req).await? {
        ServeOutcome::CacheHit { bytes } => {
            debug!(target: "fwdproxy::worker", bytes, "Response served from cache");
        }
        ServeOutcome::Fetched { bytes, cached } => {
            debug!(target: "fwdproxy::worker", bytes, cached, "Response relayed from origin");
        }
        ServeOutcome::BadTarget => {
            debug!(target: "fwdproxy::worker", "Request target rejected");
        }
        ServeOutcome::UpstreamUnavailable => {
            debug!(target: "fwdproxy::worker", "Origin unavailable, closing without response");
        }
    }

    Ok(())
}
