use fwdproxy_cache::{CachePolicy, CacheTable, InsertOutcome};
use fwdproxy_config::ProxyConfig;
use fwdproxy_http::{RequestHead, responses::send_400};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

mod headers;
pub(crate) mod relay;
mod upstream;
pub(crate) mod uri;

use headers::build_upstream_request;
use relay::relay_response;
use upstream::open_upstream;
use uri::parse_uri;

/// =======================================================
/// PROXY STATE
/// =======================================================
///
/// The only state shared between connections is the cache table; the rest
/// is read-only settings. Built once at startup and shared as `Arc<Proxy>`.
pub struct Proxy {
    cache: CacheTable,
    cache_enabled: bool,
    user_agent: String,
    relay_buffer_bytes: usize,
}

/// What happened to one forwarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    CacheHit { bytes: usize },
    Fetched { bytes: u64, cached: bool },
    /// The request target could not be split into host/port/path; a 400 was sent.
    BadTarget,
    /// Origin connect or request write failed; the client gets no bytes.
    UpstreamUnavailable,
}

impl Proxy {
    pub fn new(cfg: &ProxyConfig) -> Self {
        let cache_cfg = cfg.cache();
        let policy = CachePolicy::new(cache_cfg.max_object_bytes, cache_cfg.max_key_bytes);

        Self {
            cache: CacheTable::new(cache_cfg.slots, policy),
            cache_enabled: cache_cfg.enabled,
            user_agent: cfg.http().user_agent.clone(),
            relay_buffer_bytes: cfg.http().relay_buffer_bytes,
        }
    }

    pub fn cache(&self) -> &CacheTable {
        &self.cache
    }

    /// Serve one GET request: answer from the cache, or fetch from the
    /// origin, relay the response and store it when small enough.
    ///
    /// Client write failures are returned as errors; origin failures are
    /// reported through [`ServeOutcome`].
    #[instrument(skip(self, client, req), fields(uri = %req.target))]
    pub async fn serve<S>(&self, client: &mut S, req: &RequestHead) -> anyhow::Result<ServeOutcome>
    where
        S: AsyncWrite + Unpin + ?Sized,
    {
        // The raw request target is the cache key, no normalization.
        let key = req.target.as_str();

        if self.cache_enabled
            && let Some(payload) = self.cache.lookup(key)
        {
            client.write_all(&payload).await?;
            client.flush().await?;
            info!(target: "fwdproxy::proxy", bytes = payload.len(), "Served from cache");
            return Ok(ServeOutcome::CacheHit {
                bytes: payload.len(),
            });
        }

        let upstream = match parse_uri(key) {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "fwdproxy::proxy", error = %e, "Cannot decompose request target");
                send_400(client, key).await?;
                return Ok(ServeOutcome::BadTarget);
            }
        };
        debug!(
            target: "fwdproxy::proxy",
            host = %upstream.host,
            port = upstream.port,
            path = %upstream.path,
            "Decomposed request target"
        );

        let request = build_upstream_request(&upstream, req, &self.user_agent);

        let mut origin = match open_upstream(&upstream, &request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(
                    target: "fwdproxy::proxy",
                    upstream = %upstream,
                    error = %e,
                    "Origin unreachable; closing client connection"
                );
                return Ok(ServeOutcome::UpstreamUnavailable);
            }
        };

        let capture_limit = if self.cache_enabled {
            self.cache.policy().max_object_bytes()
        } else {
            0
        };

        let summary =
            relay_response(&mut origin, client, self.relay_buffer_bytes, capture_limit).await?;

        let cached = match summary.captured {
            Some(payload) if !payload.is_empty() => {
                matches!(self.cache.insert(key, payload), InsertOutcome::Stored { .. })
            }
            _ => false,
        };

        info!(
            target: "fwdproxy::proxy",
            bytes = summary.relayed,
            cached,
            "Fetched from origin"
        );

        Ok(ServeOutcome::Fetched {
            bytes: summary.relayed,
            cached,
        })
    }
}
