// Response assembly and serialization. Serialization order is fixed:
// status line, Server header, Content-Length, custom headers, blank line,
// body. Built fresh per request; discarded on reset or close.

use crate::buffer::Buffer;

pub const SERVER_NAME: &str = "proton";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "Unknown",
    }
}

pub struct Response {
    pub status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    pub fn not_found() -> Self {
        let mut r = Self::new();
        r.set_status(404).write(b"404 Not Found\n");
        r
    }

    pub fn bad_request() -> Self {
        let mut r = Self::new();
        r.set_status(400).write(b"400 Bad Request\n");
        r
    }

    pub fn internal_error() -> Self {
        let mut r = Self::new();
        r.set_status(500).write(b"500 Internal Server Error\n");
        r
    }

    /// Serialize status line, Server, Content-Length, custom headers,
    /// blank line, and body into `out`, in that fixed order.
    pub fn serialize_into(&self, out: &mut Buffer) {
        let reason = reason_phrase(self.status);
        out.append(format!("HTTP/1.1 {} {}\r\n", self.status, reason).as_bytes());
        out.append(format!("Server: {}/{}\r\n", SERVER_NAME, SERVER_VERSION).as_bytes());
        out.append(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        for (name, value) in &self.headers {
            out.append(format!("{}: {}\r\n", name, value).as_bytes());
        }
        out.append(b"\r\n");
        if !self.body.is_empty() {
            out.append(&self.body);
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_fixed_order_with_correct_content_length() {
        let mut r = Response::new();
        r.set_status(200).add_header("X-Custom", "yes").write(b"hello\n");
        let mut out = Buffer::new();
        r.serialize_into(&mut out);
        let text = String::from_utf8(out.as_slice().to_vec()).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        let server_pos = text.find("Server: proton/").unwrap();
        let len_pos = text.find("Content-Length: 6\r\n").unwrap();
        let custom_pos = text.find("X-Custom: yes\r\n").unwrap();
        let blank_pos = text.find("\r\n\r\n").unwrap();
        assert!(server_pos < len_pos);
        assert!(len_pos < custom_pos);
        assert!(custom_pos < blank_pos);
        assert!(text.ends_with("hello\n"));
    }

    #[test]
    fn unknown_status_code_uses_unknown_reason() {
        let mut r = Response::new();
        r.set_status(418);
        let mut out = Buffer::new();
        r.serialize_into(&mut out);
        let text = String::from_utf8(out.as_slice().to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 418 Unknown\r\n"));
    }

    #[test]
    fn not_found_has_exact_body_and_length() {
        let r = Response::not_found();
        let mut out = Buffer::new();
        r.serialize_into(&mut out);
        let text = String::from_utf8(out.as_slice().to_vec()).unwrap();
        assert!(text.contains("Content-Length: 14\r\n"));
        assert!(text.ends_with("404 Not Found\n"));
    }
}
