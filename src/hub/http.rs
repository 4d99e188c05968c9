//! Minimal HTTP/1.1 request parsing and response writing.
//!
//! The hub serves a handful of fixed routes to trusted LAN clients, so
//! this is a deliberately small subset: one request per connection,
//! `Content-Length` bodies only, no chunked encoding, no keep-alive.

use std::io::{Read, Write};

/// Read buffer cap; a signed update body is well under 1 KiB.
const MAX_REQUEST_LEN: usize = 8192;

#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    headers: Vec<(String, String)>,
    pub body: String,
}

impl Request {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Read and parse one request from the stream. `None` on anything
    /// that is not a well-formed request within the size cap.
    pub fn read_from<S: Read>(stream: &mut S) -> Option<Request> {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                // Peer closed before the header terminator.
                break find_header_end(&raw)?;
            }
            raw.extend_from_slice(&chunk[..n]);
            if raw.len() > MAX_REQUEST_LEN {
                return None;
            }
            if let Some(end) = find_header_end(&raw) {
                break end;
            }
        };

        let head = core::str::from_utf8(&raw[..header_end]).ok()?;
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next()?.split(' ');
        let method = request_line.next()?.to_string();
        let path = request_line.next()?.to_string();

        let headers: Vec<(String, String)> = lines
            .filter_map(|l| {
                let (k, v) = l.split_once(':')?;
                Some((k.trim().to_string(), v.trim().to_string()))
            })
            .collect();

        let content_length: usize = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        if content_length > MAX_REQUEST_LEN {
            return None;
        }

        let mut body_bytes = raw[header_end + 4..].to_vec();
        while body_bytes.len() < content_length {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                break;
            }
            body_bytes.extend_from_slice(&chunk[..n]);
        }
        body_bytes.truncate(content_length);

        Some(Request {
            method,
            path,
            headers,
            body: String::from_utf8(body_bytes).ok()?,
        })
    }
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn ok_json(body: String) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body,
        }
    }

    pub fn ok_text(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            content_type: "application/json",
            body: r#"{"error":"unauthorized"}"#.to_string(),
        }
    }

    pub fn bad_request() -> Self {
        Self {
            status: 400,
            content_type: "application/json",
            body: r#"{"error":"bad request"}"#.to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain",
            body: "not found".to_string(),
        }
    }

    pub fn write_to<S: Write>(&self, stream: &mut S) -> std::io::Result<()> {
        let reason = match self.status {
            200 => "OK",
            400 => "Bad Request",
            401 => "Unauthorized",
            404 => "Not Found",
            _ => "Error",
        };
        write!(
            stream,
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {}",
            self.status,
            reason,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_get_without_body() {
        let raw = b"GET /status HTTP/1.1\r\nHost: hub\r\n\r\n";
        let req = Request::read_from(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/status");
        assert_eq!(req.header("host"), Some("hub"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn parses_post_with_content_length_body() {
        let raw =
            b"POST /update HTTP/1.1\r\nAuthorization: tok\r\nContent-Length: 13\r\n\r\n{\"motion\":true}";
        let req = Request::read_from(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.header("Authorization"), Some("tok"));
        // Body truncated to the declared length.
        assert_eq!(req.body, "{\"motion\":tru");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let raw = b"GET / HTTP/1.1\r\nX-Signature: abc123\r\n\r\n";
        let req = Request::read_from(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(req.header("x-signature"), Some("abc123"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Request::read_from(&mut Cursor::new(&b"not http"[..])).is_none());
        assert!(Request::read_from(&mut Cursor::new(&b""[..])).is_none());
    }

    #[test]
    fn response_writes_status_line_and_length() {
        let mut out = Vec::new();
        Response::ok_text("OK").write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("OK"));
    }

    #[test]
    fn error_responses_carry_json_bodies() {
        let mut out = Vec::new();
        Response::unauthorized().write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
        assert!(text.contains(r#"{"error":"unauthorized"}"#));
    }
}
