//! Interned regex constraints, addressed by one-byte index

use regex::Regex;

use crate::error::RouterError;

/// Hard cap on distinct constraints per method tree: the compiled key
/// encodes the index as a single byte.
pub(crate) const MAX_REGEXES: usize = 254;

/// Append-only list of compiled parameter constraints.
///
/// Compilers refer to constraints by small integer index; two patterns
/// with byte-equal constraint sources share one entry. Each method tree
/// owns an independent table.
#[derive(Default)]
pub(crate) struct RegexTable {
    res: Vec<Regex>,
}

impl RegexTable {
    /// Return the index of `source`, compiling and appending it if it is
    /// not interned yet.
    pub(crate) fn intern(&mut self, source: &str, pattern: &str) -> Result<usize, RouterError> {
        if let Some(i) = self.res.iter().position(|re| re.as_str() == source) {
            return Ok(i);
        }
        if self.res.len() >= MAX_REGEXES {
            return Err(RouterError::TooManyRegexes { max: MAX_REGEXES });
        }
        let re = Regex::new(source).map_err(|source| RouterError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        self.res.push(re);
        Ok(self.res.len() - 1)
    }

    /// Whether the constraint at `index` accepts the whole segment.
    #[inline]
    pub(crate) fn is_match(&self, index: usize, segment: &str) -> bool {
        self.res[index].is_match(segment)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.res.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.res.is_empty()
    }
}
