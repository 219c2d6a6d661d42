use std::fmt;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 80;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("request target {0:?} names no host")]
    MissingHost(String),
    #[error("invalid port {port:?} in request target {target:?}")]
    InvalidPort { target: String, port: String },
}

/// Where a forward-proxy request goes: origin host, port and the path
/// (query included) to put on the upstream request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl UpstreamTarget {
    /// Host as it appears in a `Host` header (IPv6 literals bracketed).
    pub fn host_header(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.host_header(), self.port, self.path)
    }
}

/// =======================================================
/// URI DECOMPOSER
/// =======================================================
///
/// - Drops a leading `scheme://` or bare `//`
/// - host runs up to the first `:` or `/`
/// - `:port` runs up to the next `/` (empty port => 80)
/// - the rest, leading `/` included, is the path (missing => "/")
///
/// Only the authority part is searched for `:`, so a colon inside the path
/// is never taken as a port separator.
pub fn parse_uri(target: &str) -> Result<UpstreamTarget, UriError> {
    let rest = strip_scheme(target);

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    let (host, port) = split_authority(authority);
    if host.is_empty() {
        return Err(UriError::MissingHost(target.to_string()));
    }

    let port = match port {
        None | Some("") => DEFAULT_PORT,
        Some(raw) => match raw.parse::<u16>() {
            Ok(p) if p != 0 => p,
            _ => {
                return Err(UriError::InvalidPort {
                    target: target.to_string(),
                    port: raw.to_string(),
                });
            }
        },
    };

    Ok(UpstreamTarget {
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

fn strip_scheme(target: &str) -> &str {
    if let Some((scheme, rest)) = target.split_once("://")
        && is_scheme(scheme)
    {
        return rest;
    }
    target.strip_prefix("//").unwrap_or(target)
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn split_authority(authority: &str) -> (&str, Option<&str>) {
    // [v6-literal]:port
    if let Some(inner) = authority.strip_prefix('[')
        && let Some((host, after)) = inner.split_once(']')
    {
        return (host, after.strip_prefix(':'));
    }

    match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    }
}
