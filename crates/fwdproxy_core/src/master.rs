use std::sync::Arc;

use fwdproxy_config::ProxyConfig;
use fwdproxy_proxy::Proxy;
use tracing::{info, instrument};

mod accept;
mod startup;

pub use accept::serve;
use accept::bind_listener;

/// Owns the process-wide state: the configuration and the shared proxy
/// (cache table included). Created once at startup, never torn down.
pub struct Master {
    cfg: Arc<ProxyConfig>,
    proxy: Arc<Proxy>,
}

impl Master {
    pub fn new(cfg: ProxyConfig) -> Self {
        let proxy = Arc::new(Proxy::new(&cfg));
        Self {
            cfg: Arc::new(cfg),
            proxy,
        }
    }

    pub fn proxy(&self) -> Arc<Proxy> {
        self.proxy.clone()
    }

    /// Binds the configured address and accepts connections forever.
    #[instrument(skip(self), fields(listen = %self.cfg.global.listen_addr()))]
    pub async fn run(self) -> anyhow::Result<()> {
        self.log_startup();

        let listener = bind_listener(&self.cfg.global.listen_addr()).await?;

        info!(
            target: "fwdproxy::master",
            "Master initialized. Waiting for incoming connections (Ctrl+C to stop)..."
        );

        serve(listener, self.proxy, self.cfg).await
    }
}
