//! Router façade: per-method trees, construction, dispatch

use bytes::Bytes;
use tracing::debug;

use crate::error::RouterError;
use crate::method::{Method, METHODS};
use crate::params::{Context, Params};
use crate::pattern::PatternStyle;
use crate::response::ResponseWriter;
use crate::trie::Tree;

/// The request model at the router's seam. The router never reads the
/// body; hosts with other body types can map them when embedding.
pub type Request = http::Request<Bytes>;

/// A request handler: writes its response into the writer and reads path
/// parameters from the buffer captured during matching.
pub type Handler = Box<dyn Fn(&mut ResponseWriter, &Request, &Params<'_>) + Send + Sync>;

/// A handler registered without an explicit params argument; path
/// parameters travel on the [`Context`] instead.
pub type ContextHandler = Box<dyn Fn(&mut ResponseWriter, &Context<'_>) + Send + Sync>;

/// Matches request paths against the routes registered at construction
/// and dispatches to their handlers.
///
/// Built through [`Router::builder`] (colon-style patterns) or
/// [`Router::brace_builder`] (brace/gRPC-style patterns); immutable and
/// shareable across threads once built.
pub struct Router {
    trees: [Tree<Handler>; 9],
    not_found: Handler,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

impl Router {
    /// Builder for a router with colon-style patterns (`/users/:id`).
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new(PatternStyle::Colon)
    }

    /// Builder for a router with brace-style patterns (`/v1/users/{id}`).
    pub fn brace_builder() -> RouterBuilder {
        RouterBuilder::new(PatternStyle::Brace)
    }

    /// Look up the handler and path parameters for a method and path.
    ///
    /// Returns `None` when nothing matches; the not-found handler is not
    /// consulted.
    pub fn at<'a>(&'a self, method: Method, path: &'a str) -> Option<(&'a Handler, Params<'a>)> {
        let tree = &self.trees[method.index()];
        let mut params = Params::new();
        let h = tree.find(path, &mut params)?;
        Some((h, params))
    }

    /// Dispatch a request: static table first, then the trie, then the
    /// not-found handler. Unknown methods go straight to not-found.
    pub fn serve(&self, w: &mut ResponseWriter, req: &Request) {
        if let Some(method) = Method::from_http(req.method()) {
            let tree = &self.trees[method.index()];
            let path = req.uri().path();

            if let Some(h) = tree.static_find(path) {
                h(w, req, &Params::new());
                return;
            }

            let mut params = Params::new();
            if let Some(h) = tree.pattern_find(path, &mut params) {
                h(w, req, &params);
                return;
            }
        }
        (self.not_found)(w, req, &Params::new());
    }
}

fn default_not_found() -> Handler {
    Box::new(|w, _, _| {
        w.status(404).text("404 page not found\n");
    })
}

/// Collects routes and builds a [`Router`].
///
/// Registration order does not affect matching. All patterns use the
/// style the builder was created with. Errors (syntactically invalid
/// patterns, invalid regexes, duplicates) surface from [`build`]: the
/// router is either fully built or not built at all.
///
/// [`build`]: RouterBuilder::build
pub struct RouterBuilder {
    style: PatternStyle,
    routes: Vec<(Method, String, Handler)>,
    not_found: Option<Handler>,
}

impl RouterBuilder {
    fn new(style: PatternStyle) -> Self {
        Self {
            style,
            routes: Vec::new(),
            not_found: None,
        }
    }

    /// Register a handler for a method and pattern.
    pub fn route<F>(mut self, method: Method, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut ResponseWriter, &Request, &Params<'_>) + Send + Sync + 'static,
    {
        self.routes.push((method, pattern.into(), Box::new(handler)));
        self
    }

    /// Register a context-style handler; captured path parameters are
    /// attached to the [`Context`] for the duration of the call.
    pub fn context_route<F>(self, method: Method, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut ResponseWriter, &Context<'_>) + Send + Sync + 'static,
    {
        self.route(method, pattern, move |w, r, ps| {
            let ctx = Context::new(r, (ps.count() > 0).then_some(ps));
            handler(w, &ctx);
        })
    }

    /// Replace the default not-found handler.
    pub fn not_found<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ResponseWriter, &Request, &Params<'_>) + Send + Sync + 'static,
    {
        self.not_found = Some(Box::new(handler));
        self
    }

    /// Build the router; compiles every pattern and constructs the
    /// per-method tries.
    pub fn build(self) -> Result<Router, RouterError> {
        let mut trees = METHODS.map(|_| Tree::new(self.style));
        let route_count = self.routes.len();

        for (method, pattern, handler) in self.routes {
            trees[method.index()].add(&pattern, handler)?;
        }
        for tree in &mut trees {
            tree.init()?;
        }

        debug!(routes = route_count, style = ?self.style, "router built");
        Ok(Router {
            trees,
            not_found: self.not_found.unwrap_or_else(default_not_found),
        })
    }
}

macro_rules! method_shortcuts {
    ($(($name:ident, $method:ident)),* $(,)?) => {
        impl RouterBuilder {
            $(
                #[doc = concat!("Shortcut for `route(Method::", stringify!($method), ", pattern, handler)`.")]
                pub fn $name<F>(self, pattern: impl Into<String>, handler: F) -> Self
                where
                    F: Fn(&mut ResponseWriter, &Request, &Params<'_>) + Send + Sync + 'static,
                {
                    self.route(Method::$method, pattern, handler)
                }
            )*
        }
    };
}

method_shortcuts!(
    (get, GET),
    (post, POST),
    (put, PUT),
    (delete, DELETE),
    (patch, PATCH),
    (head, HEAD),
    (options, OPTIONS),
    (connect, CONNECT),
    (trace, TRACE),
);
