//! Interceptors bracket handlers with pre/post hooks
//!
//! A `pre` hook runs before the handler and may stop the request by
//! returning `false`; a `post` hook runs after it. Chains compose
//! interceptors with left-to-right `pre` order and right-to-left `post`
//! order, and abort symmetrically: once a `pre` returns `false`, neither
//! the remaining `pre` hooks nor any `post` hook runs.

use crate::params::Params;
use crate::response::ResponseWriter;
use crate::router::{ContextHandler, Handler, Request};

/// Pre-handler hook; `false` stops the request (the hook is expected to
/// have written a response).
pub type PreFn = Box<dyn Fn(&mut ResponseWriter, &Request, &Params<'_>) -> bool + Send + Sync>;

/// Post-handler hook.
pub type PostFn = Box<dyn Fn(&Request, &Params<'_>) + Send + Sync>;

/// A pre/post hook pair, composable into chains.
pub enum Interceptor {
    /// Does nothing; the unit of composition.
    Nop,
    /// Pre-only; its post side is a no-op.
    Pre(PreFn),
    /// Post-only; its pre side always continues.
    Post(PostFn),
    /// Both sides present.
    Full(PreFn, PostFn),
    /// A flattened sequence of interceptors.
    Chain(Vec<Interceptor>),
}

impl Interceptor {
    /// Lift an optional pre and post hook into an interceptor: both absent
    /// yields [`Interceptor::Nop`], one side yields a one-sided value.
    pub fn new(pre: Option<PreFn>, post: Option<PostFn>) -> Self {
        match (pre, post) {
            (None, None) => Interceptor::Nop,
            (Some(pre), None) => Interceptor::Pre(pre),
            (None, Some(post)) => Interceptor::Post(post),
            (Some(pre), Some(post)) => Interceptor::Full(pre, post),
        }
    }

    /// Pre-only interceptor from a closure.
    pub fn pre<F>(f: F) -> Self
    where
        F: Fn(&mut ResponseWriter, &Request, &Params<'_>) -> bool + Send + Sync + 'static,
    {
        Interceptor::Pre(Box::new(f))
    }

    /// Post-only interceptor from a closure.
    pub fn post<F>(f: F) -> Self
    where
        F: Fn(&Request, &Params<'_>) + Send + Sync + 'static,
    {
        Interceptor::Post(Box::new(f))
    }

    /// Interceptor with both sides from closures.
    pub fn pair<F, G>(pre: F, post: G) -> Self
    where
        F: Fn(&mut ResponseWriter, &Request, &Params<'_>) -> bool + Send + Sync + 'static,
        G: Fn(&Request, &Params<'_>) + Send + Sync + 'static,
    {
        Interceptor::Full(Box::new(pre), Box::new(post))
    }

    /// Compose interceptors into one.
    ///
    /// Nested chains are spliced into their parent; an empty list yields
    /// [`Interceptor::Nop`] and a single element is returned as-is.
    pub fn chain(interceptors: Vec<Interceptor>) -> Self {
        let mut flat = Vec::with_capacity(interceptors.len());
        for it in interceptors {
            match it {
                Interceptor::Chain(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Interceptor::Nop,
            1 => flat.pop().expect("len checked"),
            _ => Interceptor::Chain(flat),
        }
    }

    /// Run the pre side. Chains stop at the first member returning
    /// `false`.
    pub fn pre_handle(&self, w: &mut ResponseWriter, r: &Request, ps: &Params<'_>) -> bool {
        match self {
            Interceptor::Nop | Interceptor::Post(_) => true,
            Interceptor::Pre(pre) => pre(w, r, ps),
            Interceptor::Full(pre, _) => pre(w, r, ps),
            Interceptor::Chain(its) => its.iter().all(|it| it.pre_handle(w, r, ps)),
        }
    }

    /// Run the post side. Chains run members right-to-left.
    pub fn post_handle(&self, r: &Request, ps: &Params<'_>) {
        match self {
            Interceptor::Nop | Interceptor::Pre(_) => {}
            Interceptor::Post(post) => post(r, ps),
            Interceptor::Full(_, post) => post(r, ps),
            Interceptor::Chain(its) => {
                for it in its.iter().rev() {
                    it.post_handle(r, ps);
                }
            }
        }
    }
}

/// Bracket a handler with interceptors.
///
/// With no interceptors the handler is returned unchanged. Otherwise the
/// returned handler runs the chain's pre side, the handler, then the
/// chain's post side; a pre returning `false` skips both the handler and
/// every post hook.
pub fn wrap(handler: Handler, interceptors: Vec<Interceptor>) -> Handler {
    if interceptors.is_empty() {
        return handler;
    }
    let it = Interceptor::chain(interceptors);
    Box::new(move |w, r, ps| {
        if it.pre_handle(w, r, ps) {
            handler(w, r, ps);
            it.post_handle(r, ps);
        }
    })
}

/// [`wrap`] for context-style handlers; the hooks read the parameter
/// buffer out of the context, or an empty buffer when none is attached.
pub fn wrap_context(handler: ContextHandler, interceptors: Vec<Interceptor>) -> ContextHandler {
    if interceptors.is_empty() {
        return handler;
    }
    let it = Interceptor::chain(interceptors);
    Box::new(move |w, ctx| {
        let empty = Params::new();
        let ps = ctx.path_params().unwrap_or(&empty);
        if it.pre_handle(w, ctx.request(), ps) {
            handler(w, ctx);
            it.post_handle(ctx.request(), ps);
        }
    })
}
