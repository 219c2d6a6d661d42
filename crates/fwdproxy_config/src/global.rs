use serde::Deserialize;

// =======================================================
// GLOBAL CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub listen_host: String,
    /// Overridden by the `<port>` command line argument.
    pub port: u16,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".into(),
            port: 0,
        }
    }
}

impl GlobalConfig {
    pub fn listen_host(&self) -> &str {
        &self.listen_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// "host:port" string handed to `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.port)
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &GlobalConfig) {
        if self.listen_host.trim().is_empty() {
            self.listen_host = defaults.listen_host.clone();
        }
    }
}
