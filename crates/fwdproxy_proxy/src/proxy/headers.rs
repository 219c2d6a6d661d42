use fwdproxy_http::RequestHead;

use super::uri::UpstreamTarget;

/// Client headers that are always replaced by the proxy's own values.
/// Matched by exact name, case-insensitively.
const REPLACED_HEADERS: [&str; 4] = ["host", "connection", "proxy-connection", "user-agent"];

/// =======================================================
/// UPSTREAM REQUEST HEADER
/// =======================================================
///
/// ```text
/// GET <path> HTTP/1.0
/// Host: <client Host header, else target host>
/// Connection: close
/// Proxy-Connection: close
/// User-Agent: <user_agent>
/// <remaining client headers, verbatim and in order>
/// <blank line>
/// ```
pub(super) fn build_upstream_request(
    target: &UpstreamTarget,
    req: &RequestHead,
    user_agent: &str,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);

    out.extend_from_slice(b"GET ");
    out.extend_from_slice(target.path.as_bytes());
    out.extend_from_slice(b" HTTP/1.0\r\n");

    out.extend_from_slice(b"Host: ");
    match req.host_header() {
        Some(host) => out.extend_from_slice(host),
        None => out.extend_from_slice(target.host_header().as_bytes()),
    }
    out.extend_from_slice(b"\r\n");

    out.extend_from_slice(b"Connection: close\r\n");
    out.extend_from_slice(b"Proxy-Connection: close\r\n");

    out.extend_from_slice(b"User-Agent: ");
    out.extend_from_slice(user_agent.as_bytes());
    out.extend_from_slice(b"\r\n");

    for header in &req.headers {
        if REPLACED_HEADERS.iter().any(|name| header.is(name)) {
            continue;
        }
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(b"\r\n");
    out
}

#[cfg(test)]
mod tests {
    use fwdproxy_http::request::parse_request_head;

    use super::build_upstream_request;
    use crate::proxy::uri::parse_uri;

    fn build(head: &str) -> String {
        let req = parse_request_head(head.as_bytes(), 8192).expect("valid head");
        let target = parse_uri(&req.target).expect("valid target");
        String::from_utf8(build_upstream_request(&target, &req, "test-agent/1.0")).expect("utf8")
    }

    #[test]
    fn injects_fixed_headers_and_falls_back_to_target_host() {
        let out = build("GET http://origin.test:8000/home.html HTTP/1.1\r\n\r\n");
        assert_eq!(
            out,
            "GET /home.html HTTP/1.0\r\n\
             Host: origin.test\r\n\
             Connection: close\r\n\
             Proxy-Connection: close\r\n\
             User-Agent: test-agent/1.0\r\n\
             \r\n"
        );
    }

    #[test]
    fn replaces_denylisted_headers_and_keeps_the_rest_in_order() {
        let out = build(
            "GET http://origin.test/ HTTP/1.0\r\n\
             Accept: */*\r\n\
             HOST: client.example:8000\r\n\
             user-agent: curl/8\r\n\
             Connection: keep-alive\r\n\
             Proxy-Connection: keep-alive\r\n\
             X-Trace:  a b \r\n\
             Cookie: k=v\r\n\
             \r\n",
        );
        assert_eq!(
            out,
            "GET / HTTP/1.0\r\n\
             Host: client.example:8000\r\n\
             Connection: close\r\n\
             Proxy-Connection: close\r\n\
             User-Agent: test-agent/1.0\r\n\
             Accept: */*\r\n\
             X-Trace:  a b \r\n\
             Cookie: k=v\r\n\
             \r\n"
        );
    }

    #[test]
    fn prefix_lookalikes_pass_through() {
        let out = build(
            "GET http://origin.test/ HTTP/1.0\r\n\
             Hostname: h\r\n\
             Connection-Id: 7\r\n\
             User-Agent-Extra: x\r\n\
             \r\n",
        );
        assert!(out.contains("\r\nHostname: h\r\n"));
        assert!(out.contains("\r\nConnection-Id: 7\r\n"));
        assert!(out.contains("\r\nUser-Agent-Extra: x\r\n"));
        assert!(out.contains("\r\nHost: origin.test\r\n"));
    }
}
