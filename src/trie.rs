//! Double-array trie route matching
//!
//! One tree per HTTP method. All non-static patterns for the method are
//! encoded into a pair of integer arrays (`base`/`check`); a match walks
//! the arrays byte-by-byte over the request path, so lookup cost is
//! proportional to the path length and captures are recorded as offsets
//! without allocating. Static patterns are kept out of the trie entirely
//! and resolved through an exact-match table fronted by a length bitmap.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashMap;
use memchr::memchr;
use tracing::debug;

use crate::error::RouterError;
use crate::params::{Params, MAX_PATH_LEN};
use crate::pattern::{Pattern, PatternStyle};
use crate::regexes::RegexTable;

// State 0 can never be a parent, so the root lives at 1.
const ROOT_STATE: usize = 1;
const MIN_BASE: usize = ROOT_STATE + 1;
// Input code 0 marks the end of a key; byte codes are shifted past it.
const END_CODE: usize = 0;
const CODE_OFFSET: usize = 1;
const GROW_MULTIPLE: f64 = 1.5;
const PERCENTAGE_OF_NONEMPTY: f64 = 0.95;
// Width of the static-path length bitmap; longer parameterless patterns
// are stored in the trie, whose keys they enter as pure literals.
const STATIC_LEN_LIMIT: usize = 2048;

#[inline]
fn code(c: u8) -> usize {
    c as usize + CODE_OFFSET
}

/// A registered route: the parameter names extracted from its pattern and
/// the handler. The name list is shared with the parameter buffer handed
/// to the handler.
struct Entry<T> {
    pnames: Arc<[String]>,
    handler: T,
    pattern: String,
}

/// Child span produced while grouping sorted keys during the build.
#[derive(Clone, Copy)]
struct Node {
    code: usize,
    depth: usize,
    begin: usize,
    end: usize,
}

struct NodeGroup {
    state: usize,
    children: Vec<Node>,
}

/// Per-method matching structure: the double-array trie for patterns with
/// parameters plus the exact-match table for static patterns.
pub(crate) struct Tree<T> {
    style: PatternStyle,

    // base[s]: 0 = free, >0 = offset base of s's children,
    // <0 = terminal carrying the encoded entry index.
    base: Vec<i32>,
    // check[t]: the parent state that owns slot t.
    check: Vec<i32>,

    // Buffered (key, entry) pairs; keys are dropped once the arrays are
    // built.
    keys: Vec<Vec<u8>>,
    entries: Vec<Entry<T>>,

    regexes: RegexTable,

    statics: AHashMap<String, T>,
    can_be_static: [bool; STATIC_LEN_LIMIT],
}

impl<T> Tree<T> {
    pub(crate) fn new(style: PatternStyle) -> Self {
        Self {
            style,
            base: Vec::new(),
            check: Vec::new(),
            keys: Vec::new(),
            entries: Vec::new(),
            regexes: RegexTable::default(),
            statics: AHashMap::new(),
            can_be_static: [false; STATIC_LEN_LIMIT],
        }
    }

    /// Compile `pattern` and buffer the route. Patterns without parameters
    /// go to the static table instead of the trie.
    pub(crate) fn add(&mut self, pattern: &str, handler: T) -> Result<(), RouterError> {
        let compiled = Pattern::compile(pattern, self.style, &mut self.regexes)?;

        if compiled.param_names().is_empty() && pattern.len() < STATIC_LEN_LIMIT {
            if self.statics.insert(pattern.to_string(), handler).is_some() {
                return Err(RouterError::DuplicatePattern(pattern.to_string()));
            }
            self.can_be_static[pattern.len()] = true;
            return Ok(());
        }

        let (key, params) = compiled.into_parts();
        self.keys.push(key);
        self.entries.push(Entry {
            pnames: params.into(),
            handler,
            pattern: pattern.to_string(),
        });
        Ok(())
    }

    /// Build the double-array from the buffered routes. Must be called
    /// once, after the last `add`; the tree is immutable afterwards.
    pub(crate) fn init(&mut self) -> Result<(), RouterError> {
        self.rearrange()?;
        self.grow((self.entries.len() + 1) * 2);
        if self.entries.is_empty() {
            return Ok(());
        }

        let mut next_check_pos = MIN_BASE;
        let mut queue = VecDeque::new();
        queue.push_back(self.child_nodes(ROOT_STATE, 0, 0, self.entries.len()));

        while let Some(group) = queue.pop_front() {
            let (base, pos) = self.find_base(&group.children, next_check_pos);
            next_check_pos = pos;
            self.base[group.state] = base as i32;

            for child in &group.children {
                let state = base + child.code;
                self.check[state] = group.state as i32;

                if child.code == END_CODE {
                    self.base[state] = -(child.begin as i32 + 1);
                } else {
                    queue.push_back(self.child_nodes(state, child.depth, child.begin, child.end));
                }
            }
        }

        debug!(
            routes = self.entries.len(),
            statics = self.statics.len(),
            states = self.base.len(),
            "trie built"
        );
        self.keys = Vec::new();
        Ok(())
    }

    /// Match a path: static shortcut first, then the trie.
    pub(crate) fn find<'a>(&'a self, path: &'a str, params: &mut Params<'a>) -> Option<&'a T> {
        if let Some(h) = self.static_find(path) {
            return Some(h);
        }
        self.pattern_find(path, params)
    }

    /// Exact-match lookup for parameterless patterns. The length bitmap
    /// skips the map probe when no static pattern of this length exists.
    #[inline]
    pub(crate) fn static_find(&self, path: &str) -> Option<&T> {
        if path.len() < STATIC_LEN_LIMIT && self.can_be_static[path.len()] {
            return self.statics.get(path);
        }
        None
    }

    /// Walk the trie over `path`, recording parameter spans into `params`.
    pub(crate) fn pattern_find<'a>(
        &'a self,
        path: &'a str,
        params: &mut Params<'a>,
    ) -> Option<&'a T> {
        if self.entries.is_empty() || path.len() > MAX_PATH_LEN || !path.starts_with('/') {
            return None;
        }

        let bytes = path.as_bytes();
        let (segments, _) = self.style.split_path(path);
        let seg_end = segments.len();
        let sc = self.base.len();

        let mut state = ROOT_STATE;
        let mut pcount = 0usize;

        // Nearest wildcard fallback seen so far, with the capture count to
        // rewind to if it is taken.
        let mut star_state = None;
        let mut star_begin = 0usize;
        let mut star_pcount = 0usize;

        let mut failed = false;
        let mut i = 0;
        'outer: while i < seg_end {
            // every segment begins at a '/'
            let slash_state = match self.step(state, b'/', sc) {
                Some(s) => s,
                None => {
                    failed = true;
                    break;
                }
            };
            state = slash_state;
            i += 1;
            let begin = i;

            if let Some(s) = self.step(slash_state, b'*', sc) {
                star_state = Some(s);
                star_begin = begin;
                star_pcount = pcount;
            }

            // literal walk within the segment
            while i < seg_end && bytes[i] != b'/' {
                if let Some(next) = self.step_code(state, code(bytes[i]), sc) {
                    state = next;
                    i += 1;
                    continue;
                }

                // exact matching failed; fall back to this segment's
                // named-parameter edge
                let Some(param_state) = self.step(slash_state, b':', sc) else {
                    failed = true;
                    break 'outer;
                };
                state = param_state;

                i = match memchr(b'/', &bytes[i..seg_end]) {
                    Some(m) => i + m,
                    None => seg_end,
                };

                // regex-constrained branches sit below the ':' state and
                // win over it when one of them accepts the segment
                if !self.regexes.is_empty() {
                    state = self.regex_step(state, sc, &path[begin..i]);
                }

                params.set_span(pcount, begin, i);
                pcount += 1;
                continue 'outer;
            }
        }

        let mut entry_index = None;
        if !failed {
            entry_index = self.finish(state, &bytes[seg_end..], sc);
        }
        if entry_index.is_none() {
            // all other matching failed; use the recorded wildcard, which
            // captures the rest of the segment part. Captures recorded at
            // or after the wildcard's segment are discarded by writing its
            // span over the first of their slots.
            let star = star_state?;
            params.set_span(star_pcount, star_begin, seg_end);
            entry_index = self.finish(star, &bytes[seg_end..], sc);
        }

        let entry = &self.entries[entry_index?];
        params.bind(path, &entry.pnames);
        Some(&entry.handler)
    }

    /// Consume any verb bytes, then take the END-OF-KEY transition and
    /// decode the terminal's entry index.
    fn finish(&self, mut state: usize, verb: &[u8], sc: usize) -> Option<usize> {
        for &b in verb {
            state = self.step(state, b, sc)?;
        }
        let end_state = self.base[state] as usize + END_CODE;
        if end_state < sc && self.check[end_state] == state as i32 {
            let b = self.base[end_state];
            if b < 0 {
                return Some((-b - 1) as usize);
            }
        }
        None
    }

    /// Refine a ':' state through its regex branch: the '=' child leads to
    /// one state per interned regex index; the first whose regex accepts
    /// the segment wins. Without a winner the ':' state stands.
    fn regex_step(&self, state: usize, sc: usize, segment: &str) -> usize {
        if let Some(sep_state) = self.step(state, b'=', sc) {
            for j in 0..self.regexes.len() {
                let next = self.base[sep_state] as usize + j + CODE_OFFSET;
                if next >= sc {
                    break;
                }
                if self.check[next] == sep_state as i32 && self.regexes.is_match(j, segment) {
                    return next;
                }
            }
        }
        state
    }

    #[inline]
    fn step(&self, state: usize, c: u8, sc: usize) -> Option<usize> {
        self.step_code(state, code(c), sc)
    }

    #[inline]
    fn step_code(&self, state: usize, code: usize, sc: usize) -> Option<usize> {
        let next = self.base[state] as usize + code;
        if next < sc && self.check[next] == state as i32 {
            Some(next)
        } else {
            None
        }
    }

    /// Sort the buffered routes by key; equal keys are a registration
    /// error.
    fn rearrange(&mut self) -> Result<(), RouterError> {
        let keys = std::mem::take(&mut self.keys);
        let entries = std::mem::take(&mut self.entries);
        let mut routes: Vec<(Vec<u8>, Entry<T>)> = keys.into_iter().zip(entries).collect();
        routes.sort_by(|a, b| a.0.cmp(&b.0));

        for pair in routes.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(RouterError::DuplicatePattern(pair[1].1.pattern.clone()));
            }
        }

        for (key, entry) in routes {
            self.keys.push(key);
            self.entries.push(entry);
        }
        Ok(())
    }

    /// Group the sorted keys in `[begin, end)` by their byte at `depth`.
    /// A key that ends exactly at `depth` becomes a virtual END-OF-KEY
    /// child covering a single entry.
    fn child_nodes(&self, state: usize, depth: usize, begin: usize, end: usize) -> NodeGroup {
        let mut children = Vec::new();

        let mut i = begin;
        if i < end && self.keys[i].len() == depth {
            children.push(Node {
                code: END_CODE,
                depth: depth + 1,
                begin: i,
                end: i + 1,
            });
            i += 1;
        }

        let mut curr_code = usize::MAX;
        let mut curr_begin = i;
        for j in i..end {
            let c = code(self.keys[j][depth]);
            if c != curr_code {
                if curr_code != usize::MAX {
                    children.push(Node {
                        code: curr_code,
                        depth: depth + 1,
                        begin: curr_begin,
                        end: j,
                    });
                }
                curr_code = c;
                curr_begin = j;
            }
        }
        if curr_code != usize::MAX {
            children.push(Node {
                code: curr_code,
                depth: depth + 1,
                begin: curr_begin,
                end,
            });
        }

        NodeGroup { state, children }
    }

    /// Find a base offset where every child slot is free, starting at
    /// `next_check_pos`. When the scanned span was almost entirely
    /// occupied, the cursor advances past it so later searches skip the
    /// dense prefix.
    fn find_base(&mut self, children: &[Node], mut next_check_pos: usize) -> (usize, usize) {
        let min_code = children[0].code;
        let number = children[children.len() - 1].code - min_code + 1;

        let mut pos = (min_code + MIN_BASE).max(next_check_pos);
        let mut nonzero = 0usize;
        let mut first = true;

        let base = 'outer: loop {
            if pos + number > self.base.len() {
                self.grow(pos + number - self.base.len());
            }

            if self.check[pos] != 0 {
                nonzero += 1;
                pos += 1;
                continue;
            }
            if first {
                next_check_pos = pos;
                first = false;
            }

            let b = pos - min_code;
            for child in children {
                if self.check[b + child.code] != 0 {
                    pos += 1;
                    continue 'outer;
                }
            }
            break b;
        };

        if nonzero as f64 / (pos - next_check_pos + 1) as f64 >= PERCENTAGE_OF_NONEMPTY {
            next_check_pos = pos;
        }

        (base, next_check_pos)
    }

    fn grow(&mut self, needed: usize) {
        let size = (self.base.len() as f64 * GROW_MULTIPLE) as usize + needed;
        self.base.resize(size, 0);
        self.check.resize(size, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[&'static str]) -> Tree<&'static str> {
        tree_with(PatternStyle::Colon, routes)
    }

    fn tree_with(style: PatternStyle, routes: &[&'static str]) -> Tree<&'static str> {
        let mut t = Tree::new(style);
        for &pattern in routes {
            t.add(pattern, pattern).unwrap();
        }
        t.init().unwrap();
        t
    }

    fn find<'a>(t: &'a Tree<&'static str>, path: &'a str) -> Option<(&'static str, Vec<(String, String)>)> {
        let mut params = Params::new();
        let h = t.find(path, &mut params)?;
        let captured = params
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        Some((*h, captured))
    }

    /// base/check consistency: every occupied slot points back at a live
    /// parent, and every terminal encodes a valid entry.
    fn assert_arrays_consistent<T>(t: &Tree<T>) {
        for slot in 0..t.check.len() {
            let parent = t.check[slot];
            if parent == 0 {
                continue;
            }
            let parent = parent as usize;
            assert!(t.base[parent] > 0, "parent {parent} of slot {slot} has no base");
            assert!(slot >= t.base[parent] as usize, "slot {slot} below its base");
            if t.base[slot] < 0 {
                let index = (-t.base[slot] - 1) as usize;
                assert!(index < t.entries.len(), "terminal {slot} out of range");
            }
        }
    }

    #[test]
    fn test_named_parameters() {
        let t = tree(&["/blog/:category/:post"]);
        assert_arrays_consistent(&t);

        let (h, params) = find(&t, "/blog/go/request-routers").unwrap();
        assert_eq!(h, "/blog/:category/:post");
        assert_eq!(
            params,
            vec![
                ("category".to_string(), "go".to_string()),
                ("post".to_string(), "request-routers".to_string())
            ]
        );

        assert!(find(&t, "/blog/go/").is_none());
        assert!(find(&t, "/blog/go").is_none());
        assert!(find(&t, "/blog/go/x/y").is_none());
    }

    #[test]
    fn test_matching_priority() {
        let t = tree(&[
            "/users/:id",
            r"/users/:id=^\d+$",
            "/users/*page",
            "/users/list",
        ]);
        assert_arrays_consistent(&t);

        // static wins
        let (h, params) = find(&t, "/users/list").unwrap();
        assert_eq!(h, "/users/list");
        assert!(params.is_empty());

        // regex branch wins over the plain parameter
        let (h, params) = find(&t, "/users/123").unwrap();
        assert_eq!(h, r"/users/:id=^\d+$");
        assert_eq!(params, vec![("id".to_string(), "123".to_string())]);

        // plain parameter when the regex rejects
        let (h, params) = find(&t, "/users/admin").unwrap();
        assert_eq!(h, "/users/:id");
        assert_eq!(params, vec![("id".to_string(), "admin".to_string())]);

        // wildcard picks up what nothing else matches
        let (h, params) = find(&t, "/users/a/b").unwrap();
        assert_eq!(h, "/users/*page");
        assert_eq!(params, vec![("page".to_string(), "a/b".to_string())]);
    }

    #[test]
    fn test_wildcard_tail() {
        let t = tree(&["/files/*filepath"]);

        let (h, params) = find(&t, "/files/").unwrap();
        assert_eq!(h, "/files/*filepath");
        assert_eq!(params, vec![("filepath".to_string(), String::new())]);

        let (_, params) = find(&t, "/files/templates/article.html").unwrap();
        assert_eq!(
            params,
            vec![(
                "filepath".to_string(),
                "templates/article.html".to_string()
            )]
        );

        assert!(find(&t, "/files").is_none());
    }

    #[test]
    fn test_wildcard_fallback_rewinds_captures() {
        let t = tree(&["/api/:version/docs", "/api/*rest"]);

        let (h, params) = find(&t, "/api/v1/docs").unwrap();
        assert_eq!(h, "/api/:version/docs");
        assert_eq!(params, vec![("version".to_string(), "v1".to_string())]);

        // ':version' captures "v1" first, then the overall match fails and
        // the wildcard takes over from the start of its own segment
        let (h, params) = find(&t, "/api/v1/other").unwrap();
        assert_eq!(h, "/api/*rest");
        assert_eq!(params, vec![("rest".to_string(), "v1/other".to_string())]);
    }

    #[test]
    fn test_static_and_trie_are_disjoint() {
        let mut t: Tree<&str> = Tree::new(PatternStyle::Colon);
        t.add("/health", "health").unwrap();
        t.add("/health/:probe", "probe").unwrap();
        t.init().unwrap();

        assert!(t.statics.contains_key("/health"));
        assert_eq!(t.entries.len(), 1);
        assert_eq!(find(&t, "/health").unwrap().0, "health");
        assert_eq!(find(&t, "/health/live").unwrap().0, "probe");
    }

    #[test]
    fn test_duplicate_patterns_rejected() {
        let mut t: Tree<&str> = Tree::new(PatternStyle::Colon);
        t.add("/users/:id", "a").unwrap();
        t.add("/users/:name", "b").unwrap();
        let err = t.init().unwrap_err();
        assert!(matches!(err, RouterError::DuplicatePattern(_)));

        let mut t: Tree<&str> = Tree::new(PatternStyle::Colon);
        t.add("/users", "a").unwrap();
        let err = t.add("/users", "b").unwrap_err();
        assert!(matches!(err, RouterError::DuplicatePattern(_)));
    }

    #[test]
    fn test_registration_order_is_irrelevant() {
        let routes = ["/a/:x", "/a/b", "/a/*rest", "/:y/b", "/c"];
        let forward = tree(&routes);
        let mut reversed: Vec<&'static str> = routes.to_vec();
        reversed.reverse();
        let backward = tree(&reversed);

        for path in ["/a/b", "/a/z", "/a/z/w", "/q/b", "/c", "/nope", "/a/b/c"] {
            assert_eq!(find(&forward, path), find(&backward, path), "path {path}");
        }
    }

    #[test]
    fn test_brace_verb_routes() {
        let t = tree_with(
            PatternStyle::Brace,
            &["/v1/users/{id}:watch", "/v1/users/{id}", "/v1/files/{path=**}:upload"],
        );

        let (h, params) = find(&t, "/v1/users/42:watch").unwrap();
        assert_eq!(h, "/v1/users/{id}:watch");
        assert_eq!(params, vec![("id".to_string(), "42".to_string())]);

        let (h, params) = find(&t, "/v1/users/42").unwrap();
        assert_eq!(h, "/v1/users/{id}");
        assert_eq!(params, vec![("id".to_string(), "42".to_string())]);

        let (h, params) = find(&t, "/v1/files/a/b.txt:upload").unwrap();
        assert_eq!(h, "/v1/files/{path=**}:upload");
        assert_eq!(params, vec![("path".to_string(), "a/b.txt".to_string())]);

        assert!(find(&t, "/v1/users/42:delete").is_none());
    }

    #[test]
    fn test_rejects_pathological_paths() {
        let t = tree(&["/files/*filepath"]);
        assert!(find(&t, "files/x").is_none());

        let long = format!("/files/{}", "a".repeat(MAX_PATH_LEN + 1));
        assert!(find(&t, &long).is_none());
    }

    #[test]
    fn test_long_static_pattern_lives_in_trie() {
        let long = format!("/{}", "a".repeat(STATIC_LEN_LIMIT + 10));
        let mut t: Tree<&str> = Tree::new(PatternStyle::Colon);
        t.add(&long, "long").unwrap();
        t.add("/short", "short").unwrap();
        t.init().unwrap();

        assert!(t.statics.contains_key("/short"));
        assert!(!t.statics.contains_key(long.as_str()));
        assert_eq!(find(&t, &long).unwrap().0, "long");
    }

    #[test]
    fn test_dense_route_set() {
        let mut patterns = Vec::new();
        for a in ["alpha", "beta", "gamma", "delta"] {
            patterns.push(format!("/{a}"));
            patterns.push(format!("/{a}/:id"));
            patterns.push(format!("/{a}/:id/edit"));
            patterns.push(format!("/{a}/recent/*rest"));
        }
        let refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
        let mut t: Tree<usize> = Tree::new(PatternStyle::Colon);
        for (i, p) in refs.iter().enumerate() {
            t.add(p, i).unwrap();
        }
        assert_eq!(t.entries.len() + t.statics.len(), refs.len());
        t.init().unwrap();
        assert_arrays_consistent(&t);

        let mut params = Params::new();
        let h = t.find("/gamma/77/edit", &mut params).unwrap();
        assert_eq!(refs[*h], "/gamma/:id/edit");
        assert_eq!(params.by_name("id"), "77");

        let mut params = Params::new();
        let h = t.find("/delta/recent/a/b/c", &mut params).unwrap();
        assert_eq!(refs[*h], "/delta/recent/*rest");
        assert_eq!(params.by_name("rest"), "a/b/c");
    }
}
