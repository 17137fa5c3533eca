//! HTTP method enumeration optimized for routing dispatch

use std::fmt;
use std::str::FromStr;

use crate::error::RouterError;

/// HTTP method enumeration covering the nine routable methods.
///
/// Each method owns its own matching tree inside the router, so the set is
/// closed: requests carrying any other method fall through to the
/// not-found handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Method {
    GET = 0,
    POST = 1,
    PUT = 2,
    DELETE = 3,
    PATCH = 4,
    HEAD = 5,
    OPTIONS = 6,
    CONNECT = 7,
    TRACE = 8,
}

/// All routable methods, in tree order.
pub(crate) const METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

impl Method {
    /// Parse a method from raw request-line bytes.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"GET" => Some(Method::GET),
            b"POST" => Some(Method::POST),
            b"PUT" => Some(Method::PUT),
            b"DELETE" => Some(Method::DELETE),
            b"PATCH" => Some(Method::PATCH),
            b"HEAD" => Some(Method::HEAD),
            b"OPTIONS" => Some(Method::OPTIONS),
            b"CONNECT" => Some(Method::CONNECT),
            b"TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    /// Map an `http::Method` onto the routable set.
    ///
    /// Returns `None` for extension methods; the router treats those as
    /// unroutable rather than guessing.
    #[inline]
    pub fn from_http(method: &http::Method) -> Option<Self> {
        Self::from_bytes(method.as_str().as_bytes())
    }

    /// Get method as a static string slice (zero allocation).
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
        }
    }

    /// Index of this method's tree inside the router.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes()).ok_or_else(|| RouterError::UnknownMethod(s.to_string()))
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
            Method::PATCH => http::Method::PATCH,
            Method::HEAD => http::Method::HEAD,
            Method::OPTIONS => http::Method::OPTIONS,
            Method::CONNECT => http::Method::CONNECT,
            Method::TRACE => http::Method::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(Method::from_bytes(b"GET"), Some(Method::GET));
        assert_eq!(Method::from_bytes(b"PATCH"), Some(Method::PATCH));
        assert_eq!(Method::from_bytes(b"BREW"), None);

        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::DELETE);
        assert!("PROPFIND".parse::<Method>().is_err());
    }

    #[test]
    fn test_http_conversion() {
        assert_eq!(Method::from_http(&http::Method::OPTIONS), Some(Method::OPTIONS));
        let ext = http::Method::from_bytes(b"PROPFIND").unwrap();
        assert_eq!(Method::from_http(&ext), None);
        assert_eq!(http::Method::from(Method::TRACE), http::Method::TRACE);
    }

    #[test]
    fn test_method_string() {
        assert_eq!(Method::GET.as_str(), "GET");
        assert_eq!(Method::CONNECT.to_string(), "CONNECT");
    }

    #[test]
    fn test_tree_indices_are_dense() {
        for (i, m) in METHODS.iter().enumerate() {
            assert_eq!(m.index(), i);
        }
    }
}
