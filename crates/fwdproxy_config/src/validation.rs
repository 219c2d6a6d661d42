use std::net::IpAddr;

use crate::ProxyConfig;

/// Validation output for a loaded proxy configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

pub fn validate(cfg: &ProxyConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_global(cfg, &mut report);
    validate_http(cfg, &mut report);
    validate_cache(cfg, &mut report);

    report
}

fn validate_global(cfg: &ProxyConfig, report: &mut ConfigReport) {
    let host = cfg.global.listen_host.trim();
    if host.is_empty() {
        report.error("global.listen_host is empty");
    } else if host.parse::<IpAddr>().is_err() {
        report.warn(format!(
            "global.listen_host '{host}' is not an IP literal; it will be resolved at bind time"
        ));
    }
}

fn validate_http(cfg: &ProxyConfig, report: &mut ConfigReport) {
    let http = &cfg.http;
    if http.max_request_line_bytes > http.max_request_head_bytes {
        report.warn(format!(
            "http.max_request_line_bytes ({}) exceeds http.max_request_head_bytes ({}); the head limit applies first",
            http.max_request_line_bytes, http.max_request_head_bytes
        ));
    }
    if http.user_agent.trim().is_empty() {
        report.warn("http.user_agent is empty; upstream requests will carry a blank User-Agent");
    }
}

fn validate_cache(cfg: &ProxyConfig, report: &mut ConfigReport) {
    let cache = &cfg.cache;
    if !cache.enabled {
        report.warn("cache.enabled = false; every request goes to the origin");
        return;
    }

    if cache.slots == 0 {
        report.error("cache.slots is 0; the cache table needs at least one slot");
    }

    if cache.max_object_bytes > cache.max_cache_bytes {
        report.error(format!(
            "cache.max_object_bytes ({}) exceeds cache.max_cache_bytes ({})",
            cache.max_object_bytes, cache.max_cache_bytes
        ));
    } else if cache.slots.saturating_mul(cache.max_object_bytes) > cache.max_cache_bytes {
        report.warn(format!(
            "cache.slots * cache.max_object_bytes ({}) exceeds cache.max_cache_bytes ({})",
            cache.slots.saturating_mul(cache.max_object_bytes),
            cache.max_cache_bytes
        ));
    }

    if cache.max_key_bytes < cfg.http.max_request_line_bytes {
        report.warn(format!(
            "cache.max_key_bytes ({}) is below http.max_request_line_bytes ({}); longer URIs are never cached",
            cache.max_key_bytes, cfg.http.max_request_line_bytes
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::ProxyConfig;

    #[test]
    fn oversized_object_limit_is_an_error() {
        let mut cfg = ProxyConfig::default();
        cfg.cache.max_object_bytes = cfg.cache.max_cache_bytes + 1;
        let report = cfg.validate();
        assert!(report.has_errors());
        assert!(report.format().contains("max_object_bytes"));
    }

    #[test]
    fn aggregate_budget_overflow_is_a_warning() {
        let mut cfg = ProxyConfig::default();
        cfg.cache.slots = 20;
        let report = cfg.validate();
        assert!(report.is_ok());
        assert_eq!(report.warnings().len(), 1);
    }

    #[test]
    fn hostname_listen_host_warns() {
        let mut cfg = ProxyConfig::default();
        cfg.global.listen_host = "localhost".into();
        let report = cfg.validate();
        assert!(report.is_ok());
        assert!(report.warnings()[0].contains("localhost"));
    }

    #[test]
    fn disabled_cache_skips_cache_checks() {
        let mut cfg = ProxyConfig::default();
        cfg.cache.enabled = false;
        cfg.cache.slots = 0;
        let report = cfg.validate();
        assert!(report.is_ok());
    }
}
