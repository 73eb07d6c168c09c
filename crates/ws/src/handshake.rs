//! WebSocket opening handshake (RFC 6455 section 4).
//!
//! [`connect`] resolves a `ws://` or `wss://` URL, opens TCP (plus
//! rustls for `wss`), sends the HTTP/1.1 upgrade request and validates
//! the `101 Switching Protocols` answer before handing the stream to a
//! [`Session`].

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;

use crate::error::WsError;
use crate::session::{Session, Transport};

/// Fixed GUID appended to the client key when computing the accept value.
const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Upper bound on response header lines before giving up.
const MAX_HEADER_LINES: usize = 100;

/// Upper bound on one status or header line, terminator included.
const MAX_LINE_LEN: u64 = 8 * 1024;

/// A parsed WebSocket endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `true` for `wss://`.
    pub secure: bool,
    /// Host name or address without brackets or port.
    pub host: String,
    pub port: u16,
    /// Authority exactly as written in the URL, used for the `Host` header.
    pub authority: String,
    /// Path plus query, at least `/`.
    pub resource: String,
}

impl Endpoint {
    /// Parse a `ws://` or `wss://` URL. Ports default to 80 / 443.
    pub fn parse(url: &str) -> Result<Self, WsError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| WsError::InvalidUrl(url.to_string()))?;

        let secure = match scheme.to_ascii_lowercase().as_str() {
            "ws" => false,
            "wss" => true,
            other => return Err(WsError::UnsupportedScheme(other.to_string())),
        };

        let split_at = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, resource) = rest.split_at(split_at);
        if authority.is_empty() {
            return Err(WsError::InvalidUrl(url.to_string()));
        }

        let resource = match resource {
            "" => "/".to_string(),
            r if r.starts_with('?') => format!("/{r}"),
            r => r.to_string(),
        };

        let default_port = if secure { 443 } else { 80 };
        let (host, port) = split_host_port(authority, default_port)
            .ok_or_else(|| WsError::InvalidUrl(url.to_string()))?;

        Ok(Self {
            secure,
            host,
            port,
            authority: authority.to_string(),
            resource,
        })
    }
}

/// Split `host[:port]` (including `[v6]:port`) into host and port.
fn split_host_port(authority: &str, default_port: u16) -> Option<(String, u16)> {
    if let Some(v6) = authority.strip_prefix('[') {
        let (host, tail) = v6.split_once(']')?;
        let port = match tail.strip_prefix(':') {
            Some(p) => p.parse().ok()?,
            None if tail.is_empty() => default_port,
            None => return None,
        };
        return Some((host.to_string(), port));
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Some((host.to_string(), port.parse().ok()?)),
        Some(_) => None,
        None => Some((authority.to_string(), default_port)),
    }
}

/// Generate a random base64-encoded 16-byte `Sec-WebSocket-Key`.
pub fn generate_key() -> String {
    let raw: [u8; 16] = rand::random();
    BASE64.encode(raw)
}

/// The `Sec-WebSocket-Accept` value a conforming server returns for `key`.
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Connect to `url` and complete the upgrade handshake.
///
/// Cancelling `cancel` aborts the TCP connect, the TLS handshake or the
/// wait for the upgrade response and yields [`WsError::Cancelled`]. The
/// partially opened connection is dropped (and therefore closed) on
/// every failure path.
pub async fn connect(url: &str, cancel: &CancellationToken) -> Result<Session, WsError> {
    let endpoint = Endpoint::parse(url)?;

    tokio::select! {
        _ = cancel.cancelled() => Err(WsError::Cancelled),
        result = connect_endpoint(&endpoint) => result,
    }
}

async fn connect_endpoint(endpoint: &Endpoint) -> Result<Session, WsError> {
    let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
        .await
        .map_err(WsError::Connect)?;
    tcp.set_nodelay(true).ok();

    tracing::debug!(
        host = %endpoint.host,
        port = endpoint.port,
        secure = endpoint.secure,
        "TCP connected",
    );

    if endpoint.secure {
        let server_name = ServerName::try_from(endpoint.host.clone())
            .map_err(|e| WsError::Tls(format!("invalid server name {}: {e}", endpoint.host)))?;
        let tls = tls_connector()?
            .connect(server_name, tcp)
            .await
            .map_err(|e| WsError::Tls(e.to_string()))?;
        handshake(Box::new(tls), endpoint).await
    } else {
        handshake(Box::new(tcp), endpoint).await
    }
}

fn tls_connector() -> Result<TlsConnector, WsError> {
    let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
    let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| WsError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Run the upgrade handshake over an already connected stream.
pub async fn handshake(stream: Box<dyn Transport>, endpoint: &Endpoint) -> Result<Session, WsError> {
    let key = generate_key();
    let request = format!(
        "GET {} HTTP/1.1\r\n\
         Host: {}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         \r\n",
        endpoint.resource, endpoint.authority, key,
    );

    let mut reader = BufReader::new(stream);
    reader.get_mut().write_all(request.as_bytes()).await?;
    reader.get_mut().flush().await?;

    let status_line = read_line(&mut reader).await?;
    if !status_is_switching_protocols(&status_line) {
        return Err(WsError::HandshakeFailed(status_line));
    }

    let mut server_accept = None;
    let mut lines = 0usize;
    loop {
        let line = read_line(&mut reader).await?;
        if line.is_empty() {
            break;
        }
        lines += 1;
        if lines > MAX_HEADER_LINES {
            return Err(WsError::HandshakeFailed(
                "too many response header lines".to_string(),
            ));
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("sec-websocket-accept") {
                server_accept = Some(value.trim().to_string());
            }
        }
    }

    // A missing accept header is tolerated; a wrong one is not.
    if let Some(got) = server_accept.filter(|v| !v.is_empty()) {
        if got != accept_key(&key) {
            return Err(WsError::AcceptMismatch);
        }
    }

    tracing::debug!(resource = %endpoint.resource, "WebSocket handshake complete");
    Ok(Session::from_reader(reader))
}

/// Read one CRLF-terminated line, trimmed. EOF is an error, and so is a
/// line longer than [`MAX_LINE_LEN`].
async fn read_line<R>(reader: &mut R) -> Result<String, WsError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = (&mut *reader).take(MAX_LINE_LEN).read_line(&mut line).await?;
    if n == 0 {
        return Err(WsError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed during WebSocket handshake",
        )));
    }
    if !line.ends_with('\n') && n as u64 >= MAX_LINE_LEN {
        return Err(WsError::HandshakeFailed(format!(
            "response line exceeds {MAX_LINE_LEN} bytes"
        )));
    }
    Ok(line.trim().to_string())
}

/// `HTTP/1.1 101 Switching Protocols` -> true.
fn status_is_switching_protocols(line: &str) -> bool {
    line.split_whitespace().nth(1) == Some("101")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accept_key_matches_rfc_example() {
        // RFC 6455 section 1.3.
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn generated_key_is_16_bytes_base64() {
        let key = generate_key();
        let raw = BASE64.decode(&key).unwrap();
        assert_eq!(raw.len(), 16);
        assert_ne!(generate_key(), key);
    }

    #[test]
    fn parse_wss_defaults_to_443() {
        let ep = Endpoint::parse("wss://socket.wiro.ai/v1").unwrap();
        assert!(ep.secure);
        assert_eq!(ep.host, "socket.wiro.ai");
        assert_eq!(ep.port, 443);
        assert_eq!(ep.authority, "socket.wiro.ai");
        assert_eq!(ep.resource, "/v1");
    }

    #[test]
    fn parse_ws_with_port_and_query() {
        let ep = Endpoint::parse("ws://127.0.0.1:9001?client=1").unwrap();
        assert!(!ep.secure);
        assert_eq!(ep.host, "127.0.0.1");
        assert_eq!(ep.port, 9001);
        assert_eq!(ep.authority, "127.0.0.1:9001");
        assert_eq!(ep.resource, "/?client=1");
    }

    #[test]
    fn parse_ws_defaults_to_80_and_root() {
        let ep = Endpoint::parse("ws://localhost").unwrap();
        assert_eq!(ep.port, 80);
        assert_eq!(ep.resource, "/");
    }

    #[test]
    fn parse_ipv6_authority() {
        let ep = Endpoint::parse("ws://[::1]:8080/socket").unwrap();
        assert_eq!(ep.host, "::1");
        assert_eq!(ep.port, 8080);
        assert_eq!(ep.authority, "[::1]:8080");
    }

    #[test]
    fn parse_rejects_bad_urls() {
        assert_matches!(
            Endpoint::parse("https://example.com"),
            Err(WsError::UnsupportedScheme(s)) if s == "https"
        );
        assert_matches!(Endpoint::parse("socket.wiro.ai"), Err(WsError::InvalidUrl(_)));
        assert_matches!(Endpoint::parse("ws:///path"), Err(WsError::InvalidUrl(_)));
        assert_matches!(Endpoint::parse("ws://host:notaport"), Err(WsError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn read_line_trims_crlf() {
        let mut input: &[u8] = b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n";
        assert_eq!(read_line(&mut input).await.unwrap(), "HTTP/1.1 101 Switching Protocols");
        assert_eq!(read_line(&mut input).await.unwrap(), "Upgrade: websocket");
        assert_matches!(read_line(&mut input).await, Err(WsError::Io(_)));
    }

    #[tokio::test]
    async fn read_line_rejects_unterminated_flood() {
        let flood = vec![b'a'; MAX_LINE_LEN as usize * 4];
        let mut input: &[u8] = &flood;
        assert_matches!(
            read_line(&mut input).await,
            Err(WsError::HandshakeFailed(msg)) if msg.contains("exceeds")
        );
        // Only the capped prefix was consumed.
        assert_eq!(input.len(), flood.len() - MAX_LINE_LEN as usize);
    }

    #[tokio::test]
    async fn read_line_accepts_line_at_the_limit() {
        let mut line = vec![b'x'; MAX_LINE_LEN as usize - 2];
        line.extend_from_slice(b"\r\n");
        let mut input: &[u8] = &line;
        assert_eq!(read_line(&mut input).await.unwrap().len(), MAX_LINE_LEN as usize - 2);
    }

    #[test]
    fn status_line_detection() {
        assert!(status_is_switching_protocols("HTTP/1.1 101 Switching Protocols"));
        assert!(!status_is_switching_protocols("HTTP/1.1 400 Bad Request"));
        assert!(!status_is_switching_protocols("HTTP/1.1 200 OK 101"));
        assert!(!status_is_switching_protocols(""));
    }
}
