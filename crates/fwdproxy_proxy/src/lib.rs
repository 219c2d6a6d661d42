mod proxy;

pub use proxy::relay::{RelayError, RelaySummary, relay_response};
pub use proxy::uri::{DEFAULT_PORT, UpstreamTarget, UriError, parse_uri};
pub use proxy::{Proxy, ServeOutcome};
