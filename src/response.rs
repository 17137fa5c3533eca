//! Response accumulator handed to handlers
//!
//! The router does no response I/O itself; handlers write status, headers
//! and body into a [`ResponseWriter`] and the hosting server turns the
//! finished [`Response`] into wire bytes.

/// Accumulates the response a handler produces.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseWriter {
    /// Create a writer with a 200 OK status and empty body.
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Set the status code.
    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    /// Append a header.
    pub fn header<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Append raw bytes to the body.
    pub fn write<B: AsRef<[u8]>>(&mut self, chunk: B) -> &mut Self {
        self.body.extend_from_slice(chunk.as_ref());
        self
    }

    /// Set a text body.
    pub fn text<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.body = text.into().into_bytes();
        self.header("Content-Type", "text/plain; charset=utf-8")
    }

    /// Finalize into an immutable response.
    pub fn finish(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with the given name, if any.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_defaults() {
        let response = ResponseWriter::new().finish();
        assert_eq!(response.status(), 200);
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_writer_accumulates() {
        let mut w = ResponseWriter::new();
        w.status(201)
            .header("X-Request-Id", "42")
            .write(b"hello, ")
            .write(b"world");
        let response = w.finish();

        assert_eq!(response.status(), 201);
        assert_eq!(response.header("x-request-id"), Some("42"));
        assert_eq!(response.body(), b"hello, world");
    }

    #[test]
    fn test_text_sets_content_type() {
        let mut w = ResponseWriter::new();
        w.text("404 page not found\n");
        let response = w.finish();
        assert_eq!(response.header("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(response.body(), b"404 page not found\n");
    }
}
