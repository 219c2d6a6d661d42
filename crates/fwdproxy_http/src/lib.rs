//! Low-level HTTP/1.0 pieces shared by the worker and the proxy:
//! request-head framing and parsing, and synthesized error responses.

pub mod request;
pub mod responses;

pub use request::{HeaderLine, RequestError, RequestHead};
