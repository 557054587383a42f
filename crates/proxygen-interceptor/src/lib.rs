//! Runtime side of generated proxies.
//!
//! A proxy packs the arguments of each call into [`Value`]s and hands them to
//! [`InterceptorChain::apply`] together with a terminal [`Handler`] that calls
//! the wrapped implementation. The chain folds its interceptors around the
//! terminal handler, last to first, and runs the result once.

pub mod chain;
pub mod interceptors;
pub mod value;

pub use chain::{from_fn, FromFn, Handler, Interceptor, InterceptorChain};
pub use interceptors::{retry, trace_calls, Retry, TraceCalls};
pub use value::{cast_at, cast_or_default, CastError, FromValue, Value};

#[cfg(test)]
mod tests;
