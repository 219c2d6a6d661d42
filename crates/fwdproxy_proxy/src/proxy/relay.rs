use std::io;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Bytes of the response head inspected for the status line log.
const STATUS_PROBE_LIMIT: usize = 8192;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("reading from origin failed after {relayed} bytes")]
    Origin {
        relayed: u64,
        #[source]
        source: io::Error,
    },
    #[error("writing to client failed after {relayed} bytes")]
    Client {
        relayed: u64,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct RelaySummary {
    /// Bytes written to the client.
    pub relayed: u64,
    /// Full response copy, present only if it stayed below the capture limit.
    pub captured: Option<Bytes>,
}

/// =======================================================
/// RESPONSE RELAY
/// =======================================================
///
/// Copies the origin response to the client until the origin closes,
/// chunk by chunk, without touching a byte (status line, headers and body
/// all pass through as received).
///
/// In parallel a copy is accumulated while its size stays strictly below
/// `capture_limit`; once a chunk would reach the limit the copy is dropped
/// and relaying continues. `capture_limit == 0` disables the copy.
pub async fn relay_response<R, W>(
    origin: &mut R,
    client: &mut W,
    chunk_size: usize,
    capture_limit: usize,
) -> Result<RelaySummary, RelayError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut capture = (capture_limit > 0).then(BytesMut::new);
    let mut probe = StatusProbe::default();
    let mut relayed = 0u64;

    loop {
        let n = origin
            .read(&mut chunk)
            .await
            .map_err(|source| RelayError::Origin { relayed, source })?;
        if n == 0 {
            break;
        }
        let data = &chunk[..n];

        client
            .write_all(data)
            .await
            .map_err(|source| RelayError::Client { relayed, source })?;
        relayed += n as u64;

        probe.feed(data);

        if let Some(buf) = capture.as_mut() {
            if buf.len() + n < capture_limit {
                buf.extend_from_slice(data);
            } else {
                debug!(
                    target: "fwdproxy::proxy",
                    limit = capture_limit,
                    "Response reached the cache object limit; relaying without caching"
                );
                capture = None;
            }
        }
    }

    client
        .flush()
        .await
        .map_err(|source| RelayError::Client { relayed, source })?;

    debug!(target: "fwdproxy::proxy", relayed, "Origin closed; response relayed");

    Ok(RelaySummary {
        relayed,
        captured: capture.map(BytesMut::freeze),
    })
}

/// Parses the origin status line once enough of the head has been seen,
/// for logging only.
#[derive(Default)]
struct StatusProbe {
    buf: Vec<u8>,
    done: bool,
}

impl StatusProbe {
    fn feed(&mut self, data: &[u8]) {
        if self.done {
            return;
        }
        let room = STATUS_PROBE_LIMIT - self.buf.len();
        self.buf.extend_from_slice(&data[..data.len().min(room)]);

        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut resp = httparse::Response::new(&mut headers);
        let done = match resp.parse(&self.buf) {
            Ok(httparse::Status::Complete(head_len)) => {
                let content_length = resp
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case("content-length"))
                    .and_then(|h| std::str::from_utf8(h.value).ok())
                    .map(str::trim);
                debug!(
                    target: "fwdproxy::proxy",
                    status = resp.code,
                    reason = resp.reason,
                    head_len,
                    content_length,
                    "Origin response head"
                );
                true
            }
            Ok(httparse::Status::Partial) => self.buf.len() >= STATUS_PROBE_LIMIT,
            Err(e) => {
                debug!(
                    target: "fwdproxy::proxy",
                    error = %e,
                    "Origin response head not parseable; relaying as-is"
                );
                true
            }
        };

        if done {
            self.done = true;
            self.buf = Vec::new();
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn response(body_len: usize) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.0 200 OK\r\nServer: Tiny Web Server\r\nContent-length: {body_len}\r\nContent-type: text/plain\r\n\r\n"
        )
        .into_bytes();
        out.extend((0..body_len).map(|i| (i % 251) as u8));
        out
    }

    #[tokio::test]
    async fn relays_bytes_exactly_and_captures_small_responses() {
        let origin_bytes = response(1000);
        let mut origin: &[u8] = &origin_bytes;
        let mut client = Vec::<u8>::new();

        let summary = relay_response(&mut origin, &mut client, 7, 4096)
            .await
            .expect("relay");

        assert_eq!(client, origin_bytes);
        assert_eq!(summary.relayed, origin_bytes.len() as u64);
        assert_eq!(summary.captured.as_deref(), Some(&origin_bytes[..]));
    }

    #[tokio::test]
    async fn oversized_response_is_relayed_but_not_captured() {
        let origin_bytes = response(5000);
        let mut origin: &[u8] = &origin_bytes;
        let mut client = Vec::<u8>::new();

        let summary = relay_response(&mut origin, &mut client, 512, 1024)
            .await
            .expect("relay");

        assert_eq!(client, origin_bytes);
        assert!(summary.captured.is_none());
    }

    #[tokio::test]
    async fn response_exactly_at_limit_is_not_captured() {
        let origin_bytes = vec![b'x'; 100];
        let mut origin: &[u8] = &origin_bytes;
        let mut client = Vec::<u8>::new();

        let summary = relay_response(&mut origin, &mut client, 10, 100)
            .await
            .expect("relay");
        assert!(summary.captured.is_none());

        let mut origin: &[u8] = &origin_bytes[..99];
        let summary = relay_response(&mut origin, &mut Vec::<u8>::new(), 10, 100)
            .await
            .expect("relay");
        assert_eq!(summary.captured.map(|b| b.len()), Some(99));
    }

    #[tokio::test]
    async fn zero_limit_disables_capture() {
        let origin_bytes = response(10);
        let mut origin: &[u8] = &origin_bytes;
        let summary = relay_response(&mut origin, &mut Vec::<u8>::new(), 64, 0)
            .await
            .expect("relay");
        assert!(summary.captured.is_none());
    }

    #[tokio::test]
    async fn closed_client_surfaces_client_error() {
        let (mut client_side, peer) = tokio::io::duplex(64);
        drop(peer);

        let origin_bytes = response(200);
        let mut origin: &[u8] = &origin_bytes;
        let err = relay_response(&mut origin, &mut client_side, 32, 4096)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Client { relayed: 0, .. }));
    }

    #[tokio::test]
    async fn streams_through_a_socket_pair() {
        let (mut origin_w, mut origin_r) = tokio::io::duplex(16);
        let (mut client_w, mut client_r) = tokio::io::duplex(16);

        let origin_bytes = response(300);
        let to_send = origin_bytes.clone();
        let writer = tokio::spawn(async move {
            origin_w.write_all(&to_send).await.expect("origin write");
        });
        let reader = tokio::spawn(async move {
            let mut got = Vec::new();
            client_r.read_to_end(&mut got).await.expect("client read");
            got
        });

        let summary = relay_response(&mut origin_r, &mut client_w, 8, 1 << 20)
            .await
            .expect("relay");
        drop(client_w);
        writer.await.expect("writer task");

        assert_eq!(reader.await.expect("reader task"), origin_bytes);
        assert_eq!(summary.captured.as_deref(), Some(&origin_bytes[..]));
    }
}
