use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use crate::{
    cast_at, cast_or_default, from_fn, retry, trace_calls, CastError, Handler, Interceptor,
    InterceptorChain, Value,
};

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }
}

impl Interceptor for Recorder {
    fn intercept<'a>(&'a self, method: &'a str, next: Handler<'a>) -> Handler<'a> {
        Box::new(move |args: Vec<Value>| {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}-before {}", self.name, method));
            let results = next(args);
            self.log.lock().unwrap().push(format!("{}-after", self.name));
            results
        })
    }
}

fn recording_terminal<'a>(log: &'a Log) -> Handler<'a> {
    Box::new(move |args: Vec<Value>| {
        log.lock().unwrap().push("terminal".to_string());
        args
    })
}

#[test]
fn interceptors_wrap_in_declaration_order() {
    let log = Log::default();
    let chain = InterceptorChain::new()
        .with(Recorder::new("A", &log))
        .with(Recorder::new("B", &log));

    let results = chain.apply(vec![Value::from(1)], "Call", recording_terminal(&log));

    assert_eq!(results, vec![Value::Int(1)]);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["A-before Call", "B-before Call", "terminal", "B-after", "A-after"]
    );
}

#[test]
fn short_circuit_skips_the_rest_of_the_chain() {
    let log = Log::default();
    let cache = from_fn(|_method, _next| Box::new(|_args: Vec<Value>| vec![Value::from("cached")]));
    let chain = InterceptorChain::new()
        .with(cache)
        .with(Recorder::new("B", &log));

    let results = chain.apply(vec![Value::from("key")], "Get", recording_terminal(&log));

    assert_eq!(results, vec![Value::from("cached")]);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn interceptors_can_rewrite_arguments_and_results() {
    let upper = from_fn(|_method, next| {
        Box::new(move |args: Vec<Value>| {
            let args = args
                .into_iter()
                .map(|arg| match arg {
                    Value::Str(s) => Value::Str(s.to_uppercase()),
                    other => other,
                })
                .collect();
            let mut results = next(args);
            results.push(Value::from(true));
            results
        })
    });
    let chain = InterceptorChain::new().with(upper);

    let results = chain.apply(
        vec![Value::from("alice")],
        "Echo",
        Box::new(|args: Vec<Value>| args),
    );
    assert_eq!(results, vec![Value::from("ALICE"), Value::Bool(true)]);
}

#[test]
fn empty_chain_runs_terminal_once() {
    let calls = AtomicUsize::new(0);
    let chain = InterceptorChain::new();
    let results = chain.apply(
        vec![Value::from(2), Value::from(3)],
        "Add",
        Box::new(|args: Vec<Value>| {
            calls.fetch_add(1, Ordering::SeqCst);
            let a: i64 = cast_at(&args, 0).unwrap();
            let b: i64 = cast_at(&args, 1).unwrap();
            vec![Value::from(a + b)]
        }),
    );
    assert_eq!(results, vec![Value::Int(5)]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn retry_forwards_until_success() {
    let calls = AtomicUsize::new(0);
    let chain = InterceptorChain::new()
        .with(trace_calls())
        .with(retry(5, |results: &[Value]| !results[1].is_nil()));

    let results = chain.apply(
        vec![Value::from("payload")],
        "Send",
        Box::new(|_args: Vec<Value>| {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                vec![Value::Nil, Value::from("unavailable")]
            } else {
                vec![Value::from("sent"), Value::Nil]
            }
        }),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(results, vec![Value::from("sent"), Value::Nil]);
}

#[test]
fn retry_gives_up_after_max_attempts() {
    let calls = AtomicUsize::new(0);
    let chain = InterceptorChain::new().with(retry(2, |_results: &[Value]| true));
    let results = chain.apply(
        Vec::new(),
        "Flaky",
        Box::new(|_args: Vec<Value>| {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![Value::from("failed")]
        }),
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(results, vec![Value::from("failed")]);
}

#[test]
fn casts() {
    assert_eq!(Value::from("x").cast::<String>(), Ok("x".to_string()));
    assert_eq!(Value::from(7u32).cast::<i32>(), Ok(7));
    assert_eq!(
        Value::from(-1).cast::<u32>(),
        Err(CastError::OutOfRange {
            expected: "u32",
            value: "-1".to_string()
        })
    );
    assert_eq!(
        Value::from(true).cast::<String>(),
        Err(CastError::Mismatch {
            expected: "string",
            found: "bool"
        })
    );
    assert_eq!(Value::Nil.cast::<Option<String>>(), Ok(None));
    assert_eq!(cast_or_default::<String>(Value::Nil), Ok(String::new()));
    assert_eq!(cast_or_default::<i64>(Value::from(4)), Ok(4));
    assert_eq!(
        Value::from(vec!["a", "b"]).cast::<Vec<String>>(),
        Ok(vec!["a".to_string(), "b".to_string()])
    );

    let mut scores = BTreeMap::new();
    scores.insert("alice".to_string(), 3i64);
    assert_eq!(Value::from(scores.clone()).cast::<BTreeMap<String, i64>>(), Ok(scores));

    assert_eq!(
        cast_at::<String>(&[Value::from("only")], 1),
        Err(CastError::Missing { index: 1, len: 1 })
    );
    assert_eq!(Value::bytes(b"go".to_vec()).into_bytes(), Ok(b"go".to_vec()));
}

#[test]
fn integer_widths_convert_both_ways() {
    assert_eq!(Value::from(200u8), Value::UInt(200));
    assert_eq!(Value::from(-3isize), Value::Int(-3));
    assert_eq!(Value::from(200u8).cast::<u8>(), Ok(200));
    assert_eq!(Value::from(-3isize).cast::<isize>(), Ok(-3));
    assert_eq!(Value::from(u64::MAX).cast::<u128>(), Ok(u64::MAX as u128));
    assert_eq!(Value::from(i64::MIN).cast::<i128>(), Ok(i64::MIN as i128));
    assert_eq!(Value::try_from(-5i128), Ok(Value::Int(-5)));
    assert_eq!(Value::try_from(7u128), Ok(Value::UInt(7)));
    assert_eq!(
        Value::try_from(i128::MAX),
        Err(CastError::OutOfRange {
            expected: "i64",
            value: i128::MAX.to_string()
        })
    );
    assert_eq!(
        Value::from(300u16).cast::<u8>(),
        Err(CastError::OutOfRange {
            expected: "u8",
            value: "300".to_string()
        })
    );
}

#[test]
fn opaque_values_keep_identity() {
    #[derive(Debug, PartialEq)]
    struct Session(u32);

    let session = Arc::new(Session(9));
    let value = Value::from(session.clone());
    assert_eq!(value, value.clone());
    assert_ne!(value, Value::opaque(Session(9)));
    assert_eq!(value.downcast_ref::<Session>(), Some(&Session(9)));

    let back: Arc<Session> = value.cast().unwrap();
    assert!(Arc::ptr_eq(&back, &session));
    assert!(Value::opaque(1u8).cast::<Arc<Session>>().is_err());
}

// A hand-written proxy in the shape the generator emits.

#[derive(Debug, Clone, PartialEq)]
struct GreetError(String);

trait Greeter {
    fn greet(&self, name: &str) -> Result<String, GreetError>;
}

trait Logger {
    fn log(&self, tags: &[&str]) -> usize;
}

struct Polite;

impl Greeter for Polite {
    fn greet(&self, name: &str) -> Result<String, GreetError> {
        if name.is_empty() {
            return Err(GreetError("empty name".to_string()));
        }
        Ok(format!("hello {}", name))
    }
}

impl Logger for Polite {
    fn log(&self, tags: &[&str]) -> usize {
        tags.len()
    }
}

struct PoliteProxy<T> {
    implementation: T,
    interceptors: InterceptorChain,
}

impl<T: Greeter> Greeter for PoliteProxy<T> {
    fn greet(&self, name: &str) -> Result<String, GreetError> {
        let rets = self.interceptors.apply(
            vec![Value::from(name)],
            "Greet",
            Box::new(|args: Vec<Value>| {
                let name: String = cast_at(&args, 0).unwrap();
                match self.implementation.greet(&name) {
                    Ok(greeting) => vec![Value::from(greeting), Value::Nil],
                    Err(err) => vec![Value::Nil, Value::opaque(err)],
                }
            }),
        );
        match cast_at::<Option<Arc<GreetError>>>(&rets, 1).unwrap() {
            Some(err) => Err((*err).clone()),
            None => Ok(cast_or_default(rets[0].clone()).unwrap()),
        }
    }
}

impl<T: Logger> Logger for PoliteProxy<T> {
    fn log(&self, tags: &[&str]) -> usize {
        let rets = self.interceptors.apply(
            vec![Value::list(tags.iter().copied())],
            "Log",
            Box::new(|args: Vec<Value>| {
                let tags: Vec<String> = cast_at(&args, 0).unwrap();
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                vec![Value::from(self.implementation.log(&tags))]
            }),
        );
        cast_at(&rets, 0).unwrap()
    }
}

#[test]
fn proxy_with_empty_chain_behaves_like_implementation() {
    let proxy = PoliteProxy {
        implementation: Polite,
        interceptors: InterceptorChain::new(),
    };
    assert_eq!(proxy.greet("alice"), Ok("hello alice".to_string()));
    assert_eq!(proxy.greet(""), Err(GreetError("empty name".to_string())));
    assert_eq!(proxy.log(&["a", "b"]), 2);
}

#[test]
fn variadic_arguments_are_packed_as_one_list() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let inspect = {
        let seen = seen.clone();
        from_fn(move |_method, next| {
            let seen = seen.clone();
            Box::new(move |args: Vec<Value>| {
                seen.lock().unwrap().push(args.clone());
                next(args)
            })
        })
    };
    let proxy = PoliteProxy {
        implementation: Polite,
        interceptors: InterceptorChain::new().with(inspect),
    };

    assert_eq!(proxy.log(&["db", "slow", "retry"]), 3);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].len(), 1);
    assert_eq!(
        seen[0][0].as_list().map(<[Value]>::len),
        Some(3),
        "tags should travel as a single list value"
    );
}

#[test]
fn chain_is_shared_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = {
        let calls = calls.clone();
        from_fn(move |_method, next| {
            calls.fetch_add(1, Ordering::SeqCst);
            next
        })
    };
    let proxy = PoliteProxy {
        implementation: Polite,
        interceptors: InterceptorChain::new().with(counter),
    };

    std::thread::scope(|scope| {
        for name in ["a", "b", "c", "d"] {
            let proxy = &proxy;
            scope.spawn(move || {
                assert_eq!(proxy.greet(name), Ok(format!("hello {}", name)));
            });
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}
