use tokio::{io::AsyncWriteExt, net::TcpStream};
use tracing::{debug, instrument};

use super::uri::UpstreamTarget;

/// Opens a fresh connection to the origin and writes the request header.
/// One connection per request; nothing is pooled.
#[instrument(skip(upstream, request), fields(host = %upstream.host, port = upstream.port))]
pub(super) async fn open_upstream(
    upstream: &UpstreamTarget,
    request: &[u8],
) -> std::io::Result<TcpStream> {
    let mut stream = TcpStream::connect((upstream.host.as_str(), upstream.port)).await?;
    debug!(
        target: "fwdproxy::proxy",
        peer = ?stream.peer_addr().ok(),
        "Connected to origin"
    );

    stream.write_all(request).await?;
    stream.flush().await?;
    debug!(
        target: "fwdproxy::proxy",
        bytes = request.len(),
        "Sent upstream request header"
    );

    Ok(stream)
}
