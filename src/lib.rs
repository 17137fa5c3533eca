//! # Darter
//!
//! Lightning-fast HTTP request router built on a double-array trie.
//!
//! ## Features
//! - Per-method double-array tries: matching cost is proportional to the
//!   path length, with no allocation on the request path
//! - Exact-match shortcut for static routes, fronted by a length bitmap
//! - Named parameters (`:id`), regex-constrained parameters
//!   (`:id=^\d+$`) and trailing wildcards (`*filepath`)
//! - Brace-style patterns (`/v1/users/{id}:watch`) for gRPC-shaped APIs
//! - Fixed-capacity parameter buffer recording captures as path offsets
//! - Pre/post interceptor chains with symmetric short-circuiting
//!
//! ## Example
//! ```
//! use darter::{Params, ResponseWriter, Router};
//! use bytes::Bytes;
//!
//! let router = Router::builder()
//!     .get("/", |w: &mut ResponseWriter, _req, _ps: &Params| {
//!         w.text("Welcome!");
//!     })
//!     .get("/hello/:name", |w: &mut ResponseWriter, _req, ps: &Params| {
//!         w.text(format!("hello, {}!", ps.by_name("name")));
//!     })
//!     .build()
//!     .unwrap();
//!
//! let req = http::Request::builder()
//!     .method(http::Method::GET)
//!     .uri("/hello/world")
//!     .body(Bytes::new())
//!     .unwrap();
//!
//! let mut w = ResponseWriter::new();
//! router.serve(&mut w, &req);
//! assert_eq!(w.finish().body(), b"hello, world!");
//! ```

pub mod error;
pub mod interceptor;
pub mod method;
pub mod params;
pub mod pattern;
mod regexes;
pub mod response;
pub mod router;
mod trie;

pub use error::RouterError;
pub use interceptor::{wrap, wrap_context, Interceptor, PostFn, PreFn};
pub use method::Method;
pub use params::{Context, ParamError, Params, MAX_PARAMS};
pub use pattern::{Pattern, PatternStyle};
pub use response::{Response, ResponseWriter};
pub use router::{ContextHandler, Handler, Request, Router, RouterBuilder};
