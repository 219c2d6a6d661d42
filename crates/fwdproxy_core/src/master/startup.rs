use tracing::info;

use super::Master;

impl Master {
    pub(super) fn log_startup(&self) {
        info!(target: "fwdproxy::master", "Starting fwdproxy master");
        info!(
            target: "fwdproxy::master",
            listen = %self.cfg.global.listen_addr(),
            max_request_line_bytes = self.cfg.http.max_request_line_bytes,
            max_request_head_bytes = self.cfg.http.max_request_head_bytes,
            relay_buffer_bytes = self.cfg.http.relay_buffer_bytes,
            "HTTP configuration loaded"
        );
        info!(
            target: "fwdproxy::master",
            enabled = self.cfg.cache.enabled,
            slots = self.proxy.cache().capacity(),
            max_object_bytes = self.cfg.cache.max_object_bytes,
            max_cache_bytes = self.cfg.cache.max_cache_bytes,
            "Cache table allocated"
        );
    }
}
