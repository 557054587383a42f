use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::value::Value;

/// Receives the packed arguments of a call and returns its packed results.
pub type Handler<'a> = Box<dyn Fn(Vec<Value>) -> Vec<Value> + 'a>;

/// Wraps the next handler of a chain for one method call.
///
/// An interceptor may change the arguments before forwarding, change the
/// results afterwards, not forward at all, or forward several times.
pub trait Interceptor: Send + Sync {
    fn intercept<'a>(&'a self, method: &'a str, next: Handler<'a>) -> Handler<'a>;
}

/// Interceptor backed by a closure, see [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

/// Turn a closure into an [`Interceptor`].
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(&'a str, Handler<'a>) -> Handler<'a> + Send + Sync,
{
    FromFn { f }
}

impl<F> Interceptor for FromFn<F>
where
    F: for<'a> Fn(&'a str, Handler<'a>) -> Handler<'a> + Send + Sync,
{
    fn intercept<'a>(&'a self, method: &'a str, next: Handler<'a>) -> Handler<'a> {
        (self.f)(method, next)
    }
}

impl<T: Interceptor + ?Sized> Interceptor for Arc<T> {
    fn intercept<'a>(&'a self, method: &'a str, next: Handler<'a>) -> Handler<'a> {
        (**self).intercept(method, next)
    }
}

/// Ordered interceptors. Position 0 is outermost: it sees the call first and
/// the results last.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.push(interceptor);
        self
    }

    pub fn push(&mut self, interceptor: impl Interceptor + 'static) {
        self.interceptors.push(Arc::new(interceptor));
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Compose the chain around `terminal` and invoke it once with `args`.
    pub fn apply<'a>(&'a self, args: Vec<Value>, method: &'a str, terminal: Handler<'a>) -> Vec<Value> {
        let handler = self
            .interceptors
            .iter()
            .rev()
            .fold(terminal, |next, interceptor| interceptor.intercept(method, next));
        handler(args)
    }
}

impl FromIterator<Arc<dyn Interceptor>> for InterceptorChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Interceptor>>>(iter: I) -> Self {
        Self {
            interceptors: iter.into_iter().collect(),
        }
    }
}

impl Debug for InterceptorChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}
