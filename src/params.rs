//! Path parameter capture without per-request allocation
//!
//! The matcher records parameter values as `(begin, end)` offsets into the
//! request path while it walks the trie; names come from the matched
//! route's shared name list. Nothing is copied out of the path.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::router::Request;

/// Maximum number of parameters a single route may capture.
pub const MAX_PARAMS: usize = 20;

/// Longest request path the capture offsets can address.
pub(crate) const MAX_PATH_LEN: usize = i16::MAX as usize;

const NO_NAMES: &[String] = &[];

/// Path parameters extracted from a matched request.
///
/// Holds borrowed views of the request path and the route's parameter
/// names; it is only valid for the duration of the handler invocation.
#[derive(Clone)]
pub struct Params<'a> {
    path: &'a str,
    indices: [u16; MAX_PARAMS * 2],
    names: &'a [String],
}

impl<'a> Params<'a> {
    /// Create an empty parameter buffer.
    #[inline]
    pub fn new() -> Self {
        Self {
            path: "",
            indices: [0; MAX_PARAMS * 2],
            names: NO_NAMES,
        }
    }

    /// Number of captured parameters.
    #[inline]
    pub fn count(&self) -> usize {
        self.names.len()
    }

    /// Whether no parameters were captured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the `i`-th parameter.
    ///
    /// Anonymous parameters have the empty name.
    #[inline]
    pub fn name(&self, i: usize) -> &'a str {
        &self.names[i]
    }

    /// Value of the `i`-th parameter.
    #[inline]
    pub fn value(&self, i: usize) -> &'a str {
        let begin = self.indices[i << 1] as usize;
        let end = self.indices[(i << 1) + 1] as usize;
        &self.path[begin..end]
    }

    /// Value of the first parameter with the given name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.value(i))
    }

    /// Value of the first parameter with the given name, or `""` if no
    /// such parameter was captured.
    #[inline]
    pub fn by_name(&self, name: &str) -> &'a str {
        self.get(name).unwrap_or("")
    }

    /// Iterate over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        (0..self.count()).map(|i| (self.name(i), self.value(i)))
    }

    /// Parse a parameter as a specific type.
    pub fn parse<T>(&self, name: &str) -> Result<T, ParamError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self
            .get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))?;
        value.parse::<T>().map_err(|e| ParamError::Parse {
            name: name.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    /// Record the span of the capture in slot `i`. Offsets fit in `u16`
    /// because the matcher rejects longer paths up front.
    #[inline]
    pub(crate) fn set_span(&mut self, i: usize, begin: usize, end: usize) {
        self.indices[i << 1] = begin as u16;
        self.indices[(i << 1) + 1] = end as u16;
    }

    /// Bind the buffer to the matched path and route names. Called once,
    /// after a successful match.
    #[inline]
    pub(crate) fn bind(&mut self, path: &'a str, names: &'a [String]) {
        self.path = path;
        self.names = names;
    }
}

impl<'a> Default for Params<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Params<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Parameter access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// No parameter with the requested name was captured.
    #[error("parameter {0:?} not found")]
    Missing(String),

    /// The captured value did not parse as the requested type.
    #[error("parameter {name:?} with value {value:?} failed to parse: {reason}")]
    Parse {
        name: String,
        value: String,
        reason: String,
    },
}

/// Request view handed to handlers registered without an explicit params
/// argument.
///
/// The router attaches the parameter buffer here for the duration of the
/// call; `path_params` resolves it, and returns `None` for routes that
/// captured nothing. The wrapper lives on the serving call stack, so it is
/// released on every exit path.
pub struct Context<'a> {
    request: &'a Request,
    params: Option<&'a Params<'a>>,
}

impl<'a> Context<'a> {
    #[inline]
    pub(crate) fn new(request: &'a Request, params: Option<&'a Params<'a>>) -> Self {
        Self { request, params }
    }

    /// The underlying request.
    #[inline]
    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// The path parameters attached to this call, if any were captured.
    #[inline]
    pub fn path_params(&self) -> Option<&'a Params<'a>> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured<'a>(path: &'a str, names: &'a [String], spans: &[(usize, usize)]) -> Params<'a> {
        let mut params = Params::new();
        for (i, &(begin, end)) in spans.iter().enumerate() {
            params.set_span(i, begin, end);
        }
        params.bind(path, names);
        params
    }

    #[test]
    fn test_basic_access() {
        let names = vec!["category".to_string(), "post".to_string()];
        let params = captured("/blog/go/routers", &names, &[(6, 8), (9, 16)]);

        assert_eq!(params.count(), 2);
        assert_eq!(params.name(0), "category");
        assert_eq!(params.value(0), "go");
        assert_eq!(params.get("post"), Some("routers"));
        assert_eq!(params.by_name("post"), "routers");
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.by_name("missing"), "");
    }

    #[test]
    fn test_empty_buffer() {
        let params = Params::new();
        assert_eq!(params.count(), 0);
        assert!(params.is_empty());
        assert_eq!(params.by_name("anything"), "");
    }

    #[test]
    fn test_iteration_order() {
        let names = vec!["a".to_string(), "b".to_string()];
        let params = captured("/1/2", &names, &[(1, 2), (3, 4)]);
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_typed_parse() {
        let names = vec!["id".to_string(), "slug".to_string()];
        let params = captured("/users/123/abc", &names, &[(7, 10), (11, 14)]);

        assert_eq!(params.parse::<u64>("id").unwrap(), 123);
        assert!(matches!(
            params.parse::<u64>("slug"),
            Err(ParamError::Parse { .. })
        ));
        assert!(matches!(
            params.parse::<u64>("nope"),
            Err(ParamError::Missing(_))
        ));
    }

    #[test]
    fn test_duplicate_names_return_first() {
        let names = vec!["x".to_string(), "x".to_string()];
        let params = captured("/a/b", &names, &[(1, 2), (3, 4)]);
        assert_eq!(params.by_name("x"), "a");
    }
}
