use http::Method;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("client closed the connection before sending a request")]
    Empty,
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),
    #[error("request line is {len} bytes (limit {max})")]
    RequestLineTooLong { len: usize, max: usize },
    #[error("request head exceeds {max} bytes")]
    HeadTooLarge { max: usize },
    #[error("connection closed in the middle of the request head")]
    Truncated,
}

/// One client header line, kept byte-for-byte (without its line terminator)
/// so it can be forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    raw: Vec<u8>,
    colon: usize,
}

impl HeaderLine {
    fn parse(raw: &[u8]) -> Result<Self, RequestError> {
        let colon = raw
            .iter()
            .position(|b| *b == b':')
            .ok_or_else(|| RequestError::MalformedHeader(String::from_utf8_lossy(raw).into_owned()))?;
        if raw[..colon].iter().all(u8::is_ascii_whitespace) {
            return Err(RequestError::MalformedHeader(
                String::from_utf8_lossy(raw).into_owned(),
            ));
        }
        Ok(Self {
            raw: raw.to_vec(),
            colon,
        })
    }

    pub fn name(&self) -> &[u8] {
        self.raw[..self.colon].trim_ascii()
    }

    pub fn value(&self) -> &[u8] {
        self.raw[self.colon + 1..].trim_ascii()
    }

    /// Exact, case-insensitive comparison of the header name.
    pub fn is(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Parsed client request head: `<method> <target> <version>` plus headers.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: Vec<HeaderLine>,
}

impl RequestHead {
    pub fn is_get(&self) -> bool {
        self.method == Method::GET.as_str()
    }

    /// First `Host` header value, if the client sent a non-empty one.
    pub fn host_header(&self) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.is("host"))
            .map(HeaderLine::value)
            .filter(|v| !v.is_empty())
    }
}

/// Returns the number of bytes up to and including the blank line that ends
/// the head. Accepts both `\r\n` and bare `\n` terminators.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    let mut line_start = 0;
    for (i, b) in buf.iter().enumerate() {
        if *b != b'\n' {
            continue;
        }
        let line = &buf[line_start..i];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() && line_start > 0 {
            return Some(i + 1);
        }
        line_start = i + 1;
    }
    None
}

/// Length of the first line (terminator excluded) if it has been received.
pub fn first_line_len(buf: &[u8]) -> Option<usize> {
    let end = buf.iter().position(|b| *b == b'\n')?;
    Some(if end > 0 && buf[end - 1] == b'\r' { end - 1 } else { end })
}

/// Parse a complete head as delimited by [`find_head_end`].
pub fn parse_request_head(head: &[u8], max_line: usize) -> Result<RequestHead, RequestError> {
    let mut lines = head
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line));

    let request_line = lines.next().ok_or(RequestError::Empty)?;
    if request_line.len() > max_line {
        return Err(RequestError::RequestLineTooLong {
            len: request_line.len(),
            max: max_line,
        });
    }

    let request_line = std::str::from_utf8(request_line).map_err(|_| {
        RequestError::MalformedRequestLine(String::from_utf8_lossy(request_line).into_owned())
    })?;
    let mut parts = request_line.split_ascii_whitespace();
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(RequestError::MalformedRequestLine(request_line.to_string()));
    };
    if !version.starts_with("HTTP/") {
        return Err(RequestError::MalformedRequestLine(request_line.to_string()));
    }

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        headers.push(HeaderLine::parse(line)?);
    }

    Ok(RequestHead {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
        headers,
    })
}
