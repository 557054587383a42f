//! Boxed call values.
//!
//! A proxy packs every argument of a call into a [`Value`] so one interceptor
//! pipeline can carry differently typed signatures. The terminal handler and
//! the proxy method unpack them again with [`FromValue`], which fails with a
//! [`CastError`] instead of guessing.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    #[error("cannot cast {found} to {expected}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("value {value} is out of range for {expected}")]
    OutOfRange { expected: &'static str, value: String },
    #[error("no value at position {index} (call has {len})")]
    Missing { index: usize, len: usize },
}

impl CastError {
    fn mismatch(expected: &'static str, found: &Value) -> Self {
        CastError::Mismatch {
            expected,
            found: found.kind(),
        }
    }
}

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Any other Rust value, compared by identity.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(bytes.into())
    }
    pub fn list(values: impl IntoIterator<Item = impl Into<Value>>) -> Value {
        Value::List(values.into_iter().map(Into::into).collect())
    }
    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Map(entries.into_iter().collect())
    }
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Value {
        Value::Opaque(Arc::new(value))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Name of the variant, used in cast errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Opaque(_) => "opaque",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, CastError> {
        match self {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Str(s) => Ok(s.into_bytes()),
            other => Err(CastError::mismatch("bytes", &other)),
        }
    }

    /// Borrow an opaque value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn cast<T: FromValue>(self) -> Result<T, CastError> {
        T::from_value(self)
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{:?}", b),
            Value::Int(i) => write!(f, "{:?}", i),
            Value::UInt(u) => write!(f, "{:?}u", u),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(bytes) => write!(f, "b{:?}", bytes),
            Value::List(values) => f.debug_list().entries(values).finish(),
            Value::Map(entries) => f.debug_map().entries(entries).finish(),
            Value::Opaque(_) => f.write_str("<opaque>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

macro_rules! value_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

macro_rules! value_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::UInt(v as u64)
            }
        })*
    };
}

value_from_signed!(i8, i16, i32, i64, isize);
value_from_unsigned!(u8, u16, u32, u64, usize);

// 128-bit integers only fit when they are within the 64-bit payloads.
impl TryFrom<i128> for Value {
    type Error = CastError;

    fn try_from(v: i128) -> Result<Self, CastError> {
        i64::try_from(v).map(Value::Int).map_err(|_| CastError::OutOfRange {
            expected: "i64",
            value: v.to_string(),
        })
    }
}

impl TryFrom<u128> for Value {
    type Error = CastError;

    fn try_from(v: u128) -> Result<Self, CastError> {
        u64::try_from(v).map(Value::UInt).map_err(|_| CastError::OutOfRange {
            expected: "u64",
            value: v.to_string(),
        })
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Any + Send + Sync> From<Arc<T>> for Value {
    fn from(v: Arc<T>) -> Self {
        Value::Opaque(v)
    }
}

/// Type-safe unpacking of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, CastError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, CastError> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(CastError::mismatch("bool", &other)),
        }
    }
}

macro_rules! int_from_value {
    ($($ty:ident),*) => {
        $(impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, CastError> {
                let out_of_range = |value: String| CastError::OutOfRange {
                    expected: stringify!($ty),
                    value,
                };
                match value {
                    Value::Int(i) => $ty::try_from(i).map_err(|_| out_of_range(i.to_string())),
                    Value::UInt(u) => $ty::try_from(u).map_err(|_| out_of_range(u.to_string())),
                    other => Err(CastError::mismatch(stringify!($ty), &other)),
                }
            }
        })*
    };
}

int_from_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(CastError::mismatch("f64", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(CastError::mismatch("string", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::List(values) => values.into_iter().map(T::from_value).collect(),
            other => Err(CastError::mismatch("list", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(CastError::mismatch("map", &other)),
        }
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Opaque(any) => any.downcast::<T>().map_err(|_| CastError::Mismatch {
                expected: std::any::type_name::<T>(),
                found: "opaque",
            }),
            other => Err(CastError::mismatch(std::any::type_name::<T>(), &other)),
        }
    }
}

/// Unpack `value`, treating `Nil` as the default of `T`.
pub fn cast_or_default<T: FromValue + Default>(value: Value) -> Result<T, CastError> {
    match value {
        Value::Nil => Ok(T::default()),
        other => T::from_value(other),
    }
}

/// Unpack the value at `index` of a packed argument or result list.
pub fn cast_at<T: FromValue>(values: &[Value], index: usize) -> Result<T, CastError> {
    values
        .get(index)
        .cloned()
        .ok_or(CastError::Missing {
            index,
            len: values.len(),
        })
        .and_then(T::from_value)
}
