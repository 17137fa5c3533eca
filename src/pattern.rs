//! Pattern compilation
//!
//! Both pattern styles compile to the same internal key alphabet the trie
//! is built over:
//! - literal bytes are copied through verbatim (including `/`),
//! - `:` marks a named parameter; `:` `=` `<index>` a regex-constrained one,
//! - `*` marks a trailing wildcard,
//! - a brace-style verb is appended verbatim, leading `:` included.
//!
//! Parameter names are collected separately, in key order; anonymous
//! parameters carry empty names.

use memchr::memchr;

use crate::error::RouterError;
use crate::params::MAX_PARAMS;
use crate::regexes::RegexTable;

/// The two supported pattern syntaxes.
///
/// Colon style is the default: `/users/:id`, `/users/:id=^\d+$`,
/// `/files/*filepath`. Brace style follows the gRPC HTTP binding shape:
/// `/v1/users/{id}`, `/v1/{name=*}`, `/v1/files/**`, with an optional
/// trailing `:verb`. A router uses one style for all of its routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternStyle {
    #[default]
    Colon,
    Brace,
}

impl PatternStyle {
    /// Split a request path into its segment part and verb part.
    ///
    /// Only brace style has verbs; the verb keeps its leading `:`.
    #[inline]
    pub(crate) fn split_path<'p>(self, path: &'p str) -> (&'p str, &'p str) {
        match self {
            PatternStyle::Colon => (path, ""),
            PatternStyle::Brace => split_verb(path),
        }
    }
}

/// A compiled route pattern: the trie key, the ordered parameter names,
/// and the optional verb.
#[derive(Debug, Clone)]
pub struct Pattern {
    key: Vec<u8>,
    params: Vec<String>,
    verb: String,
    source: String,
}

impl Pattern {
    /// Parse and validate a pattern on its own.
    ///
    /// Regex constraints are compiled into a throwaway table, so the
    /// resulting key is for inspection only; the router interns
    /// constraints per method tree when routes are registered.
    pub fn parse(pattern: &str, style: PatternStyle) -> Result<Self, RouterError> {
        let mut regexes = RegexTable::default();
        Self::compile(pattern, style, &mut regexes)
    }

    pub(crate) fn compile(
        pattern: &str,
        style: PatternStyle,
        regexes: &mut RegexTable,
    ) -> Result<Self, RouterError> {
        if !pattern.starts_with('/') {
            return Err(RouterError::pattern(pattern, "missing leading '/'"));
        }
        let compiled = match style {
            PatternStyle::Colon => compile_colon(pattern, regexes)?,
            PatternStyle::Brace => compile_brace(pattern, regexes)?,
        };
        if compiled.params.len() > MAX_PARAMS {
            return Err(RouterError::PatternOverflow {
                pattern: pattern.to_string(),
                count: compiled.params.len(),
                max: MAX_PARAMS,
            });
        }
        Ok(compiled)
    }

    /// The key the trie is built over (internal alphabet).
    #[inline]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Parameter names in key order; anonymous parameters are `""`.
    #[inline]
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// The trailing verb including its leading `:`, or `""`.
    #[inline]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// The original pattern text.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn into_parts(self) -> (Vec<u8>, Vec<String>) {
        (self.key, self.params)
    }
}

fn compile_colon(pattern: &str, regexes: &mut RegexTable) -> Result<Pattern, RouterError> {
    let bytes = pattern.as_bytes();
    let mut key = Vec::with_capacity(bytes.len());
    let mut params = Vec::new();

    let mut prev = 0u8;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        key.push(c);

        if prev == b'/' {
            if c == b'/' {
                return Err(RouterError::pattern(pattern, "empty segment"));
            }
            if c == b':' {
                // named parameter, optionally "name=regex"
                let seg_end = match memchr(b'/', &bytes[i..]) {
                    Some(m) => i + m,
                    None => bytes.len(),
                };
                let name_and_re = &pattern[i + 1..seg_end];
                match name_and_re.find('=') {
                    Some(sep) => {
                        params.push(name_and_re[..sep].to_string());
                        let expr = &name_and_re[sep + 1..];
                        if expr.is_empty() {
                            return Err(RouterError::pattern(pattern, "empty regular expression"));
                        }
                        let index = regexes.intern(expr, pattern)?;
                        key.push(b'=');
                        key.push(index as u8);
                    }
                    None => params.push(name_and_re.to_string()),
                }
                i = seg_end - 1;
            } else if c == b'*' {
                if memchr(b'/', &bytes[i..]).is_some() {
                    return Err(RouterError::pattern(pattern, "'*' must be the last segment"));
                }
                params.push(pattern[i + 1..].to_string());
                i = bytes.len() - 1;
            }
        }

        prev = c;
        i += 1;
    }

    Ok(Pattern {
        key,
        params,
        verb: String::new(),
        source: pattern.to_string(),
    })
}

fn compile_brace(pattern: &str, regexes: &mut RegexTable) -> Result<Pattern, RouterError> {
    let (segments, verb) = split_verb(pattern);
    let bytes = segments.as_bytes();
    let mut key = Vec::with_capacity(pattern.len() + 1);
    let mut params = Vec::new();

    let mut prev = 0u8;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];

        if prev != b'/' {
            key.push(c);
            prev = c;
            i += 1;
            continue;
        }
        if c == b'/' {
            return Err(RouterError::pattern(pattern, "empty segment"));
        }
        if c != b'{' && c != b'*' {
            key.push(c);
            prev = c;
            i += 1;
            continue;
        }

        let begin = i;
        let slash = memchr(b'/', &bytes[begin..]);
        let seg_end = match slash {
            Some(m) => begin + m,
            None => bytes.len(),
        };
        let segment = &segments[begin..seg_end];
        i = seg_end - 1;

        if segment == "*" {
            // anonymous single-segment parameter
            key.push(b':');
            params.push(String::new());
        } else if segment == "**" {
            if slash.is_some() {
                return Err(RouterError::pattern(pattern, "'**' must be the last segment"));
            }
            key.push(b'*');
            params.push(String::new());
        } else if let Some(inner) = segment.strip_prefix('{') {
            let inner = inner
                .strip_suffix('}')
                .ok_or_else(|| RouterError::pattern(pattern, "missing '}'"))?;
            let (name, expr) = match inner.find('=') {
                Some(sep) => (&inner[..sep], &inner[sep + 1..]),
                None => (inner, "*"),
            };
            params.push(name.to_string());
            match expr {
                "*" => key.push(b':'),
                "**" => {
                    if slash.is_some() {
                        return Err(RouterError::pattern(pattern, "'**' must be the last segment"));
                    }
                    key.push(b'*');
                }
                "" => return Err(RouterError::pattern(pattern, "empty regular expression")),
                _ => {
                    let index = regexes.intern(expr, pattern)?;
                    key.push(b':');
                    key.push(b'=');
                    key.push(index as u8);
                }
            }
        } else {
            return Err(RouterError::pattern(
                pattern,
                "'*' segment must be exactly '*' or '**'",
            ));
        }

        prev = c;
        i += 1;
    }

    key.extend_from_slice(verb.as_bytes());

    Ok(Pattern {
        key,
        params,
        verb: verb.to_string(),
        source: pattern.to_string(),
    })
}

/// Split off the trailing verb: the last `:` after the final `/`.
fn split_verb(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    for i in (0..bytes.len()).rev() {
        match bytes[i] {
            b'/' => break,
            b':' => return (&path[..i], &path[i..]),
            _ => {}
        }
    }
    (path, "")
}
