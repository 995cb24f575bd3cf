// HTTP/1.x request data model. All string fields borrow from the
// connection's arena; a Request is immutable once parse_request returns it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Delete,
}

impl Method {
    pub fn from_bytes(b: &[u8]) -> Option<Method> {
        match b {
            b"GET" => Some(Method::Get),
            b"POST" => Some(Method::Post),
            b"HEAD" => Some(Method::Head),
            b"PUT" => Some(Method::Put),
            b"DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    pub fn from_bytes(b: &[u8]) -> Option<Version> {
        match b {
            b"HTTP/1.0" => Some(Version::Http10),
            b"HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }
}

/// A parsed HTTP request. Every `&str`/`&[u8]` field borrows from the
/// connection's arena and stays valid for the lifetime of the request.
#[derive(Debug)]
pub struct Request<'a> {
    pub method: Method,
    pub version: Version,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub headers: Vec<(&'a str, &'a str)>,
    pub body: &'a [u8],
}

impl<'a> Request<'a> {
    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    /// Whether the request asked to keep the connection alive. HTTP/1.1
    /// defaults to keep-alive unless `Connection: close` is present;
    /// HTTP/1.0 defaults to close unless `Connection: keep-alive` is
    /// present.
    pub fn wants_keep_alive(&self) -> bool {
        let connection = self.header("Connection");
        match self.version {
            Version::Http11 => !matches!(connection, Some(v) if v.eq_ignore_ascii_case("close")),
            Version::Http10 => matches!(connection, Some(v) if v.eq_ignore_ascii_case("keep-alive")),
        }
    }
}
