use bytes::BytesMut;
use fwdproxy_config::HttpConfig;
use fwdproxy_http::{
    RequestError, RequestHead,
    request::{find_head_end, first_line_len, parse_request_head},
    responses::{send_400, send_414, send_431},
};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument, warn};

use super::ClientStream;

pub(crate) enum ReadOutcome {
    Request(RequestHead),
    /// Peer closed before sending anything.
    Closed,
    /// An error response was already written.
    Rejected,
}

/// Reads one request head (request line + headers up to the blank line).
///
/// Oversized input is rejected, never truncated: a request line above
/// `max_request_line_bytes` gets a 414, a head above `max_request_head_bytes`
/// a 431, anything unparseable a 400.
#[instrument(skip(stream, http))]
pub(crate) async fn read_request(
    stream: &mut dyn ClientStream,
    http: &HttpConfig,
) -> anyhow::Result<ReadOutcome> {
    let max_line = http.max_request_line_bytes;
    let max_head = http.max_request_head_bytes;
    let mut buf = BytesMut::with_capacity(1024);

    let head_end = loop {
        if let Some(end) = find_head_end(&buf) {
            break end;
        }

        let line_len = first_line_len(&buf).unwrap_or(buf.len());
        if line_len > max_line {
            let err = RequestError::RequestLineTooLong {
                len: line_len,
                max: max_line,
            };
            return reject(stream, &err).await;
        }
        if buf.len() > max_head {
            return reject(stream, &RequestError::HeadTooLarge { max: max_head }).await;
        }

        if read_more(stream, &mut buf).await? == 0 {
            if buf.is_empty() {
                debug!(target: "fwdproxy::http", "Client closed without sending a request");
                return Ok(ReadOutcome::Closed);
            }
            return reject(stream, &RequestError::Truncated).await;
        }
    };

    if head_end > max_head {
        return reject(stream, &RequestError::HeadTooLarge { max: max_head }).await;
    }

    debug!(
        target: "fwdproxy::http",
        head_len = head_end,
        "Received request head"
    );

    match parse_request_head(&buf[..head_end], max_line) {
        Ok(req) => Ok(ReadOutcome::Request(req)),
        Err(err) => reject(stream, &err).await,
    }
}

async fn read_more(stream: &mut dyn ClientStream, buf: &mut BytesMut) -> anyhow::Result<usize> {
    let mut tmp = [0u8; 4096];
    let n = stream.read(&mut tmp).await?;
    buf.extend_from_slice(&tmp[..n]);
    Ok(n)
}

async fn reject(stream: &mut dyn ClientStream, err: &RequestError) -> anyhow::Result<ReadOutcome> {
    warn!(target: "fwdproxy::http", error = %err, "Rejecting client request");

    match err {
        RequestError::Empty => return Ok(ReadOutcome::Closed),
        RequestError::RequestLineTooLong { .. } => send_414(stream, &err.to_string()).await?,
        RequestError::HeadTooLarge { .. } => send_431(stream).await?,
        RequestError::MalformedRequestLine(cause) | RequestError::MalformedHeader(cause) => {
            send_400(stream, cause).await?
        }
        RequestError::Truncated => send_400(stream, &err.to_string()).await?,
    }

    Ok(ReadOutcome::Rejected)
}
