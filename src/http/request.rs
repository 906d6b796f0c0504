//! HTTP/1.1 request parsing using the [`httparse`] crate.

use bytes::Bytes;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid Content-Length header: {value:?}")]
    InvalidContentLength { value: String },

    #[error("unsupported Transfer-Encoding: {value}")]
    UnsupportedTransferEncoding { value: String },

    #[error("header {name} is not valid UTF-8")]
    InvalidHeaderValue { name: String },

    #[error("request exceeds maximum allowed size of {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
}

/// A fully parsed HTTP/1.1 request, body included.
///
/// Created by [`Request::parse`] once the whole message (headers and
/// `Content-Length` bytes of body) has been buffered.
///
/// # Examples
///
/// ```
/// use product_lookup::http::request::Request;
///
/// let raw = b"GET /?item_id=B000X HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, consumed) = Request::parse(raw, 1024).unwrap();
///
/// assert_eq!(request.method().as_str(), "GET");
/// assert_eq!(request.path(), "/");
/// assert_eq!(request.query_string(), Some("item_id=B000X"));
/// assert_eq!(consumed, raw.len());
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    query: Option<String>,
    body: Bytes,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Parse one complete HTTP/1.1 request from the front of `buf`.
    ///
    /// Returns the request and the number of bytes of `buf` it occupies
    /// (headers plus body), so the caller can drop exactly that much from its
    /// read buffer and keep any pipelined bytes that follow.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`]: headers or body not fully buffered yet.
    /// - [`RequestError::TooLarge`]: headers plus declared body exceed `max_size`.
    /// - [`RequestError::Parse`], [`RequestError::MissingField`],
    ///   [`RequestError::InvalidHeaderValue`], [`RequestError::InvalidContentLength`],
    ///   [`RequestError::UnsupportedTransferEncoding`]: malformed request.
    pub fn parse(buf: &[u8], max_size: usize) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method: Method = match raw_req.method {
            Some(m) => m.parse().unwrap_or_else(|never| match never {}),
            None => return Err(RequestError::MissingField { field: "method" }),
        };

        let raw_path = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;

        let (path, query) = match raw_path.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (raw_path.to_owned(), None),
        };

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            let value = std::str::from_utf8(header.value).map_err(|_| {
                RequestError::InvalidHeaderValue {
                    name: header.name.to_owned(),
                }
            })?;
            header_map.insert(header.name, value);
        }

        if let Some(te) = header_map.get("transfer-encoding") {
            if !te.trim().eq_ignore_ascii_case("identity") {
                return Err(RequestError::UnsupportedTransferEncoding {
                    value: te.to_owned(),
                });
            }
        }

        let content_length = match header_map.get("content-length") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| RequestError::InvalidContentLength {
                    value: raw.to_owned(),
                })?,
            None => 0,
        };

        let total = match body_offset.checked_add(content_length) {
            Some(total) if total <= max_size => total,
            _ => {
                return Err(RequestError::TooLarge {
                    max_bytes: max_size,
                });
            }
        };
        if buf.len() < total {
            return Err(RequestError::Incomplete);
        }
        let body = Bytes::copy_from_slice(&buf[body_offset..total]);

        Ok((
            Self {
                method,
                path,
                version,
                headers: header_map,
                query,
                body,
            },
            total,
        ))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP minor version number (0 = HTTP/1.0, 1 = HTTP/1.1).
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw query string (without the leading `?`), if any.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if the connection should be kept alive after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive. HTTP/1.0 defaults to close unless
    /// `Connection: keep-alive` is explicitly set.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 1024;

    #[test]
    fn parse_simple_get() {
        let raw = b"GET /hc HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, consumed) = Request::parse(raw, MAX).unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/hc");
        assert_eq!(req.version(), 1);
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert!(req.query_string().is_none());
        assert!(req.body().is_empty());
        assert_eq!(consumed, raw.len());
    }

    #[test]
    fn splits_query_string() {
        let raw = b"GET /?item_id=B000X&x=1 HTTP/1.1\r\n\r\n";
        let (req, _) = Request::parse(raw, MAX).unwrap();
        assert_eq!(req.path(), "/");
        assert_eq!(req.query_string(), Some("item_id=B000X&x=1"));
    }

    #[test]
    fn incomplete_headers() {
        let raw = b"GET / HTTP/1.1\r\nHost:";
        assert!(matches!(
            Request::parse(raw, MAX),
            Err(RequestError::Incomplete)
        ));
    }

    #[test]
    fn incomplete_body_waits_for_content_length() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nitem_";
        assert!(matches!(
            Request::parse(raw, MAX),
            Err(RequestError::Incomplete)
        ));
    }

    #[test]
    fn body_is_limited_to_content_length() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET /hc HTTP/1.1\r\n\r\n";
        let (req, consumed) = Request::parse(raw, MAX).unwrap();
        assert_eq!(&req.body()[..], b"hello");
        assert_eq!(&raw[consumed..], b"GET /hc HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn rejects_oversized_body() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 4096\r\n\r\n";
        assert!(matches!(
            Request::parse(raw, MAX),
            Err(RequestError::TooLarge { max_bytes: MAX })
        ));
    }

    #[test]
    fn size_limit_counts_headers_and_body() {
        let head = "POST / HTTP/1.1\r\nContent-Length: 1000\r\n\r\n";
        let raw = format!("{head}{}", "x".repeat(1000));
        assert!(head.len() + 1000 > MAX);
        assert!(matches!(
            Request::parse(raw.as_bytes(), MAX),
            Err(RequestError::TooLarge { max_bytes: MAX })
        ));

        let head = "POST / HTTP/1.1\r\nContent-Length: 984\r\n\r\n";
        let raw = format!("{head}{}", "x".repeat(984));
        assert_eq!(raw.len(), MAX);
        let (req, consumed) = Request::parse(raw.as_bytes(), MAX).unwrap();
        assert_eq!(req.body().len(), 984);
        assert_eq!(consumed, MAX);
    }

    #[test]
    fn rejects_non_utf8_header_values() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 5\r\nX-Label: caf\xe9\r\n\r\nhello";
        assert!(matches!(
            Request::parse(raw, MAX),
            Err(RequestError::InvalidHeaderValue { name }) if name == "X-Label"
        ));
    }

    #[test]
    fn rejects_bad_content_length() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n";
        assert!(matches!(
            Request::parse(raw, MAX),
            Err(RequestError::InvalidContentLength { .. })
        ));
    }

    #[test]
    fn rejects_chunked_bodies() {
        let raw = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";
        assert!(matches!(
            Request::parse(raw, MAX),
            Err(RequestError::UnsupportedTransferEncoding { .. })
        ));
    }

    #[test]
    fn keep_alive_defaults() {
        let (req, _) = Request::parse(b"GET / HTTP/1.1\r\n\r\n", MAX).unwrap();
        assert!(req.is_keep_alive());
        let (req, _) = Request::parse(b"GET / HTTP/1.0\r\n\r\n", MAX).unwrap();
        assert!(!req.is_keep_alive());
        let (req, _) =
            Request::parse(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n", MAX).unwrap();
        assert!(!req.is_keep_alive());
    }
}
