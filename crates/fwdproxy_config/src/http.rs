use serde::Deserialize;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

// =======================================================
// HTTP CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    // Limits (bytes)
    /// Longest accepted request line; longer ones get a 414.
    pub max_request_line_bytes: usize,
    /// Request line plus headers; a head that grows past this gets a 431.
    pub max_request_head_bytes: usize,
    /// Size of each read from the origin while relaying.
    pub relay_buffer_bytes: usize,

    /// Value injected as `User-Agent` on every upstream request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_request_line_bytes: 8192,
            max_request_head_bytes: 64 * 1024,
            relay_buffer_bytes: 8192,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl HttpConfig {
    pub fn max_request_line_bytes(&self) -> usize {
        self.max_request_line_bytes
    }

    pub fn max_request_head_bytes(&self) -> usize {
        self.max_request_head_bytes
    }

    pub fn relay_buffer_bytes(&self) -> usize {
        self.relay_buffer_bytes
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &HttpConfig) {
        if self.max_request_line_bytes == 0 {
            self.max_request_line_bytes = defaults.max_request_line_bytes;
        }
        if self.max_request_head_bytes == 0 {
            self.max_request_head_bytes = defaults.max_request_head_bytes;
        }
        if self.relay_buffer_bytes == 0 {
            self.relay_buffer_bytes = defaults.relay_buffer_bytes;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = defaults.user_agent.clone();
        }
    }
}
