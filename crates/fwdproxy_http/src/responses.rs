use http::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Generic helper that writes a complete HTTP/1.0 response and flushes it.
pub async fn send_response<W>(
    stream: &mut W,
    status: StatusCode,
    content_type: &str,
    body: &[u8],
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let head = format!(
        "HTTP/1.0 {} {}\r\n\
         Server: fwdproxy/0.1.0\r\n\
         Content-type: {content_type}\r\n\
         Content-length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        status.as_str(),
        status.canonical_reason().unwrap_or(""),
        body.len()
    );

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}

/// Small HTML error page naming the status, a longer explanation and the
/// offending input.
pub fn error_page(status: StatusCode, long_msg: &str, cause: &str) -> String {
    format!(
        "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {}: {}\r\n\
         <p>{}: {}\r\n\
         <hr><em>fwdproxy</em>\r\n\
         </body></html>\r\n",
        status.as_str(),
        status.canonical_reason().unwrap_or(""),
        long_msg,
        escape_html(cause)
    )
}

pub async fn send_client_error<W>(
    stream: &mut W,
    status: StatusCode,
    long_msg: &str,
    cause: &str,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let body = error_page(status, long_msg, cause);
    send_response(stream, status, "text/html", body.as_bytes()).await
}

pub async fn send_400<W>(stream: &mut W, cause: &str) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    send_client_error(
        stream,
        StatusCode::BAD_REQUEST,
        "Proxy could not understand this request",
        cause,
    )
    .await
}

pub async fn send_414<W>(stream: &mut W, cause: &str) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    send_client_error(
        stream,
        StatusCode::URI_TOO_LONG,
        "Request line exceeds the proxy limit",
        cause,
    )
    .await
}

pub async fn send_431<W>(stream: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    send_client_error(
        stream,
        StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
        "Request headers exceed the proxy limit",
        "headers",
    )
    .await
}

pub async fn send_501<W>(stream: &mut W, method: &str) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    send_client_error(
        stream,
        StatusCode::NOT_IMPLEMENTED,
        "Proxy does not implement this method",
        method,
    )
    .await
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
