// Incremental HTTP/1.x request-line + header parser. Restartable: callers
// re-invoke parse_request over a growing buffer until it stops returning
// Incomplete. All owned string data is copied into the caller's arena so
// the returned Request outlives the raw read buffer.

use crate::arena::Arena;
use crate::http::{Method, Request, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    Incomplete,
    InvalidFormat,
    TooLarge,
}

const MAX_HEADERS: usize = 64;

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn trim_ows(bytes: &[u8]) -> &[u8] {
    let is_ows = |b: &u8| *b == b' ' || *b == b'\t';
    let start = bytes.iter().position(|b| !is_ows(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_ows(b)).map(|p| p + 1).unwrap_or(start);
    &bytes[start..end]
}

/// Parse one HTTP request out of `buf`, arena-copying all owned fields.
/// Returns the request and the number of bytes of `buf` it consumed
/// (header block only; trailing bytes remain the caller's to interpret
/// as body).
pub fn parse_request<'a>(
    buf: &[u8],
    arena: &'a mut Arena,
) -> Result<(Request<'a>, usize), ParseError> {
    let headers_end = match find(buf, b"\r\n\r\n", 0) {
        Some(pos) => pos,
        None => return Err(ParseError::Incomplete),
    };
    let header_block_end = headers_end + 4;

    let request_line_end =
        find(&buf[..headers_end], b"\r\n", 0).unwrap_or(headers_end);

    let line = &buf[..request_line_end];
    let sp1 = line.iter().position(|b| *b == b' ').ok_or(ParseError::InvalidFormat)?;
    let method = Method::from_bytes(&line[..sp1]).ok_or(ParseError::InvalidFormat)?;

    let rest = &line[sp1 + 1..];
    let sp2 = rest.iter().position(|b| *b == b' ').ok_or(ParseError::InvalidFormat)?;
    let uri_bytes = &rest[..sp2];
    let version_bytes = &rest[sp2 + 1..];
    let version = Version::from_bytes(version_bytes).ok_or(ParseError::InvalidFormat)?;

    let uri_str = std::str::from_utf8(uri_bytes).map_err(|_| ParseError::InvalidFormat)?;
    let (path_raw, query_raw) = match uri_str.find('?') {
        Some(idx) => (&uri_str[..idx], Some(&uri_str[idx + 1..])),
        None => (uri_str, None),
    };
    let path = arena.alloc_str(path_raw).ok_or(ParseError::InvalidFormat)?;
    let query = match query_raw {
        Some(q) => Some(arena.alloc_str(q).ok_or(ParseError::InvalidFormat)?),
        None => None,
    };

    let mut headers: Vec<(&'a str, &'a str)> = Vec::new();
    let mut cursor = request_line_end + 2;
    while cursor < headers_end {
        let line_end = find(&buf[..headers_end], b"\r\n", cursor).unwrap_or(headers_end);
        let line = &buf[cursor..line_end];

        if line.is_empty() {
            cursor = line_end + 2;
            continue;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(ParseError::TooLarge);
        }

        let colon = line.iter().position(|b| *b == b':').ok_or(ParseError::InvalidFormat)?;
        let name_raw = trim_ows(&line[..colon]);
        let value_raw = trim_ows(&line[colon + 1..]);

        let name = arena
            .alloc_str(std::str::from_utf8(name_raw).map_err(|_| ParseError::InvalidFormat)?)
            .ok_or(ParseError::InvalidFormat)?;
        let value = arena
            .alloc_str(std::str::from_utf8(value_raw).map_err(|_| ParseError::InvalidFormat)?)
            .ok_or(ParseError::InvalidFormat)?;

        // Prepend, matching the original implementation's push-front list.
        headers.insert(0, (name, value));
        cursor = line_end + 2;
    }

    let body_bytes = &buf[header_block_end..];
    let body = if body_bytes.is_empty() {
        &[][..]
    } else {
        arena.alloc_bytes(body_bytes).ok_or(ParseError::InvalidFormat)?
    };

    Ok((
        Request {
            method,
            version,
            path,
            query,
            headers,
            body,
        },
        header_block_end,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_request() {
        let mut arena = Arena::new();
        let req_bytes =
            b"GET /some/path?foo=bar HTTP/1.1\r\nHost: localhost\r\nConnection: keep-alive\r\n\r\n";
        let (req, consumed) = parse_request(req_bytes, &mut arena).unwrap();

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.version, Version::Http11);
        assert_eq!(req.path, "/some/path");
        assert_eq!(req.query, Some("foo=bar"));
        assert_eq!(req.header("Host"), Some("localhost"));
        assert_eq!(req.header("connection"), Some("keep-alive"));
        assert!(req.body.is_empty());
        assert_eq!(consumed, req_bytes.len());
    }

    #[test]
    fn incomplete_without_header_terminator() {
        let mut arena = Arena::new();
        let req = b"GET /some/path HTTP/1.1\r\nHost: x\r\n";
        assert_eq!(parse_request(req, &mut arena), Err(ParseError::Incomplete));
    }

    #[test]
    fn unknown_method_is_invalid_format() {
        let mut arena = Arena::new();
        let req = b"WRONG / HTTP/1.1\r\n\r\n";
        assert_eq!(parse_request(req, &mut arena), Err(ParseError::InvalidFormat));
    }

    #[test]
    fn trims_leading_and_trailing_horizontal_whitespace_from_values() {
        let mut arena = Arena::new();
        let req = b"GET / HTTP/1.1\r\nX-Test: \t  value with spaces  \t\r\n\r\n";
        let (parsed, _) = parse_request(req, &mut arena).unwrap();
        assert_eq!(parsed.header("X-Test"), Some("value with spaces"));
    }

    #[test]
    fn retains_trailing_bytes_as_body_without_consuming_them() {
        let mut arena = Arena::new();
        let req = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let (parsed, consumed) = parse_request(req, &mut arena).unwrap();
        assert_eq!(parsed.body, b"hello");
        assert_eq!(consumed, req.len() - 5);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut arena = Arena::new();
        let req = b"GET / HTTP/2.0\r\n\r\n";
        assert_eq!(parse_request(req, &mut arena), Err(ParseError::InvalidFormat));
    }

    #[test]
    fn query_absent_yields_none_not_empty_string() {
        let mut arena = Arena::new();
        let req = b"GET /no-query HTTP/1.1\r\n\r\n";
        let (parsed, _) = parse_request(req, &mut arena).unwrap();
        assert_eq!(parsed.query, None);
    }
}
