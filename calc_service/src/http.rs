//! Minimal HTTP/1.1 framing: one request per connection, bodies sized by
//! `Content-Length` only.

use serde::Serialize;
use std::io::{self, Read, Write};
use thiserror::Error;

pub const MAX_HEAD_BYTES: usize = 8 * 1024;
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const READ_CHUNK: usize = 1024;
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    UnprocessableEntity,
    InternalServerError,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::UnprocessableEntity => 422,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::UnprocessableEntity => "Unprocessable Entity",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.code())
    }

    pub fn is_server_error(self) -> bool {
        self.code() >= 500
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connection closed before the request was complete")]
    Incomplete,
    #[error("malformed request: {0}")]
    Malformed(&'static str),
    #[error("request body exceeds {} bytes", MAX_BODY_BYTES)]
    BodyTooLarge,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl HttpError {
    /// Status to answer with, or `None` when the peer is gone or timed out.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Malformed(_) => Some(StatusCode::BadRequest),
            HttpError::BodyTooLarge => Some(StatusCode::PayloadTooLarge),
            HttpError::Incomplete | HttpError::Io(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}

fn read_some<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<usize, HttpError> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn parse_head(head: &str) -> Result<(String, String, Vec<(String, String)>), HttpError> {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().ok_or(HttpError::Malformed("missing request line"))?;

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::Malformed("bad request line"));
    };
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::Malformed("unsupported HTTP version"));
    }

    let mut headers = Vec::new();
    for line in lines.filter(|l| !l.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or(HttpError::Malformed("bad header line"))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    Ok((method.to_string(), path.to_string(), headers))
}

/// Reads one request: the head up to the blank line, then exactly
/// `Content-Length` body bytes.
pub fn read_request<R: Read>(stream: &mut R) -> Result<Request, HttpError> {
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let head_end = loop {
        if let Some(pos) = find_terminator(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(HttpError::Malformed("request head too large"));
        }
        let n = read_some(stream, &mut chunk)?;
        if n == 0 {
            return Err(HttpError::Incomplete);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..head_end])
        .map_err(|_| HttpError::Malformed("request head is not UTF-8"))?;
    let (method, path, headers) = parse_head(head)?;

    let mut request = Request {
        method,
        path,
        headers,
        body: Vec::new(),
    };

    if request.header("Transfer-Encoding").is_some() {
        return Err(HttpError::Malformed("transfer encodings are not supported"));
    }
    let content_length = match request.header("Content-Length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| HttpError::Malformed("invalid Content-Length"))?,
        None => 0,
    };
    if content_length > MAX_BODY_BYTES {
        return Err(HttpError::BodyTooLarge);
    }

    let mut body = buf.split_off(head_end + HEAD_TERMINATOR.len());
    body.truncate(content_length);
    while body.len() < content_length {
        let want = (content_length - body.len()).min(READ_CHUNK);
        let n = read_some(stream, &mut chunk[..want])?;
        if n == 0 {
            return Err(HttpError::Incomplete);
        }
        body.extend_from_slice(&chunk[..n]);
    }

    request.body = body;
    Ok(request)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        // Plain data structs with string fields cannot fail to serialize.
        let body = serde_json::to_vec(value).unwrap_or_default();
        Response {
            status,
            headers: vec![("Content-Type", "application/json".to_string())],
            body,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason()
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");

        out.write_all(head.as_bytes())?;
        out.write_all(&self.body)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most `step` bytes per read, like a slow socket.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn post(body: &str) -> String {
        format!(
            "POST /api/v1/calculate HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[test]
    fn test_read_post_request() {
        let raw = post(r#"{"expression":"1+1"}"#);
        let request = read_request(&mut Cursor::new(raw.into_bytes())).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/api/v1/calculate");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body, br#"{"expression":"1+1"}"#.to_vec());
    }

    #[test]
    fn test_read_request_in_small_pieces() {
        let raw = post(r#"{"expression":"2*3"}"#);
        let mut stream = Trickle {
            data: raw.into_bytes(),
            pos: 0,
            step: 3,
        };
        let request = read_request(&mut stream).unwrap();
        assert_eq!(request.body, br#"{"expression":"2*3"}"#.to_vec());
    }

    #[test]
    fn test_read_request_without_body() {
        let raw = "GET /api/v1/calculate HTTP/1.1\r\nHost: x\r\n\r\n";
        let request = read_request(&mut Cursor::new(raw.as_bytes().to_vec())).unwrap();
        assert_eq!(request.method, "GET");
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_truncated_body() {
        let raw = "POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        let err = read_request(&mut Cursor::new(raw.as_bytes().to_vec())).unwrap_err();
        assert!(matches!(err, HttpError::Incomplete));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_bad_request_line() {
        let raw = "NONSENSE\r\n\r\n";
        let err = read_request(&mut Cursor::new(raw.as_bytes().to_vec())).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BadRequest));
    }

    #[test]
    fn test_invalid_content_length() {
        let raw = "POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n";
        let err = read_request(&mut Cursor::new(raw.as_bytes().to_vec())).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BadRequest));
    }

    #[test]
    fn test_body_too_large() {
        let raw = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_BODY_BYTES + 1);
        let err = read_request(&mut Cursor::new(raw.into_bytes())).unwrap_err();
        assert!(matches!(err, HttpError::BodyTooLarge));
        assert_eq!(err.status(), Some(StatusCode::PayloadTooLarge));
    }

    #[test]
    fn test_head_too_large() {
        let raw = format!("GET / HTTP/1.1\r\nX-Filler: {}\r\n\r\n", "a".repeat(MAX_HEAD_BYTES * 2));
        let err = read_request(&mut Cursor::new(raw.into_bytes())).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BadRequest));
    }

    #[test]
    fn test_write_response() {
        #[derive(Serialize)]
        struct Body {
            result: &'static str,
        }

        let mut out = Vec::new();
        Response::json(StatusCode::Ok, &Body { result: "2.000000" })
            .write_to(&mut out)
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains("Content-Length: 21\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"result\":\"2.000000\"}"));
    }

    #[test]
    fn test_status_classes() {
        assert!(StatusCode::UnprocessableEntity.is_client_error());
        assert!(!StatusCode::Ok.is_client_error());
        assert!(StatusCode::InternalServerError.is_server_error());
        assert!(!StatusCode::NotFound.is_server_error());
    }
}
