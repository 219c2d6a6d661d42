mod cache;
mod global;
mod http;
mod proxy;
mod validation;

pub use cache::CacheConfig;
pub use global::GlobalConfig;
pub use http::HttpConfig;
pub use proxy::ProxyConfig;
pub use validation::{ConfigReport, validate};
