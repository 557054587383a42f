//! Ready-made interceptors.

use std::time::Instant;

use tracing::{debug, info_span, warn};

use crate::chain::{Handler, Interceptor};
use crate::value::Value;

/// Emits a `proxy_call` span and start/finish events for every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceCalls;

pub fn trace_calls() -> TraceCalls {
    TraceCalls
}

impl Interceptor for TraceCalls {
    fn intercept<'a>(&'a self, method: &'a str, next: Handler<'a>) -> Handler<'a> {
        Box::new(move |args: Vec<Value>| {
            let span = info_span!("proxy_call", method);
            let _enter = span.enter();
            debug!(args = args.len(), "call started");
            let started = Instant::now();
            let results = next(args);
            debug!(
                results = results.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "call finished"
            );
            results
        })
    }
}

/// Re-invokes the rest of the chain while `should_retry` accepts the results,
/// up to `max_attempts` calls in total.
pub struct Retry<P> {
    max_attempts: usize,
    should_retry: P,
}

pub fn retry<P>(max_attempts: usize, should_retry: P) -> Retry<P>
where
    P: Fn(&[Value]) -> bool + Send + Sync,
{
    Retry {
        max_attempts: max_attempts.max(1),
        should_retry,
    }
}

impl<P> Interceptor for Retry<P>
where
    P: Fn(&[Value]) -> bool + Send + Sync,
{
    fn intercept<'a>(&'a self, method: &'a str, next: Handler<'a>) -> Handler<'a> {
        Box::new(move |args: Vec<Value>| {
            let mut attempt = 1;
            loop {
                let results = next(args.clone());
                if attempt >= self.max_attempts || !(self.should_retry)(&results) {
                    return results;
                }
                warn!(method, attempt, max_attempts = self.max_attempts, "retrying call");
                attempt += 1;
            }
        })
    }
}
