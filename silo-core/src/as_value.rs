use crate::{Error, Result, Value, truncate_long};
use atoi::FromRadix10SignedChecked;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::{
    any,
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    hash::Hash,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
    sync::Arc,
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Typed models use it to move their fields in and out of a [`crate::Record`]:
/// `as_value` must not lose information, `try_from_value` accepts the canonical
/// variant produced by the field codec and, where it is unambiguous, other
/// variants carrying the same information (any integer width for integers,
/// a `DateTime` for a `Date`, ...).
///
/// # Examples
/// ```rust
/// use silo_core::{AsValue, Value};
/// let v = 42u16.as_value();
/// assert_eq!(v, Value::UInt16(42));
/// let n: u64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {} to {}",
        truncate_long!(format!("{value:?}")),
        any::type_name::<T>(),
    ))
}

macro_rules! impl_as_value_integer {
    ($($source:ty => $destination:path),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_value(self) -> Value {
                    $destination(self)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    if let $destination(v) = value {
                        return Ok(v);
                    }
                    if let Value::String(ref v) = value {
                        let input = v.trim().as_bytes();
                        let (parsed, used) = <$source>::from_radix_10_signed_checked(input);
                        return match parsed {
                            Some(n) if used == input.len() && used > 0 => Ok(n),
                            _ => Err(mismatch::<Self>(&value)),
                        };
                    }
                    let Some(n) = value.as_i128() else {
                        return Err(mismatch::<Self>(&value));
                    };
                    <$source>::try_from(n).map_err(|_| {
                        Error::msg(format!(
                            "Value {n} is out of range for {}",
                            any::type_name::<Self>(),
                        ))
                    })
                }
            }
        )+
    };
}

impl_as_value_integer!(
    i8 => Value::Int8,
    i16 => Value::Int16,
    i32 => Value::Int32,
    i64 => Value::Int64,
    u8 => Value::UInt8,
    u16 => Value::UInt16,
    u32 => Value::UInt32,
    u64 => Value::UInt64,
);

macro_rules! impl_as_value_float {
    ($($source:ty => $destination:path),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_value(self) -> Value {
                    $destination(self)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    match value {
                        $destination(v) => Ok(v),
                        Value::String(ref v) => fast_float::parse::<$source, _>(v.trim())
                            .map_err(|_| mismatch::<Self>(&value)),
                        _ => value
                            .as_f64()
                            .map(|v| v as $source)
                            .ok_or_else(|| mismatch::<Self>(&value)),
                    }
                }
            }
        )+
    };
}

impl_as_value_float!(f32 => Value::Float32, f64 => Value::Float64);

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            ref v => match v.as_i128() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(mismatch::<Self>(&value)),
            },
        }
    }
}

impl AsValue for Decimal {
    fn as_value(self) -> Value {
        Value::Decimal(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::Float32(v) => Decimal::from_f32(v).ok_or_else(|| mismatch::<Self>(&value)),
            Value::Float64(v) => Decimal::from_f64(v).ok_or_else(|| mismatch::<Self>(&value)),
            Value::String(ref v) => {
                Decimal::from_str(v.trim()).map_err(|_| mismatch::<Self>(&value))
            }
            ref v => v
                .as_i128()
                .and_then(Decimal::from_i128)
                .ok_or_else(|| mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::String(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            Value::Enum { name, .. } => Ok(name),
            Value::Blob(v) => String::from_utf8(v.into()).map_err(Error::new),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Cow<'static, str> {
    fn as_value(self) -> Value {
        Value::String(self.into_owned())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Cow::Owned)
    }
}

impl AsValue for Box<[u8]> {
    fn as_value(self) -> Value {
        Value::Blob(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v),
            Value::String(v) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Date {
    fn as_value(self) -> Value {
        Value::Date(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(v) => Ok(v),
            Value::DateTime(v) => Ok(v.to_offset(UtcOffset::UTC).date()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for OffsetDateTime {
    fn as_value(self) -> Value {
        Value::DateTime(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(v) => Ok(v),
            Value::Date(v) => Ok(PrimitiveDateTime::new(v, Time::MIDNIGHT).assume_utc()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

/// Naive timestamps are read and written as UTC.
impl AsValue for PrimitiveDateTime {
    fn as_value(self) -> Value {
        Value::DateTime(self.assume_utc())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        let v = OffsetDateTime::try_from_value(value)?.to_offset(UtcOffset::UTC);
        Ok(PrimitiveDateTime::new(v.date(), v.time()))
    }
}

impl AsValue for Uuid {
    fn as_value(self) -> Value {
        Value::Uuid(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::String(ref v) => Uuid::parse_str(v.trim()).map_err(|_| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Ipv4Addr {
    fn as_value(self) -> Value {
        Value::Ipv4(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Ipv4(v) => Ok(v),
            Value::String(ref v) => v.trim().parse().map_err(|_| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Ipv6Addr {
    fn as_value(self) -> Value {
        Value::Ipv6(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Ipv6(v) => Ok(v),
            Value::Ipv4(v) => Ok(v.to_ipv6_mapped()),
            Value::String(ref v) => v.trim().parse().map_err(|_| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for IpAddr {
    fn as_value(self) -> Value {
        match self {
            IpAddr::V4(v) => Value::Ipv4(v),
            IpAddr::V6(v) => Value::Ipv6(v),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Ipv4(v) => Ok(IpAddr::V4(v)),
            Value::Ipv6(v) => Ok(IpAddr::V6(v)),
            Value::String(ref v) => v.trim().parse().map_err(|_| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from_value(v).map(Some),
        }
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_value(self) -> Value {
        Value::Array(self.into_iter().map(AsValue::as_value).collect())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(v) | Value::Tuple(v) => v.into_iter().map(T::try_from_value).collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<K: AsValue + Ord, V: AsValue> AsValue for BTreeMap<K, V> {
    fn as_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k.as_value(), v.as_value()))
                .collect(),
        )
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(v) => v
                .into_iter()
                .map(|(k, v)| Ok((K::try_from_value(k)?, V::try_from_value(v)?)))
                .collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<K: AsValue + Eq + Hash, V: AsValue> AsValue for HashMap<K, V> {
    fn as_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k.as_value(), v.as_value()))
                .collect(),
        )
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(v) => v
                .into_iter()
                .map(|(k, v)| Ok((K::try_from_value(k)?, V::try_from_value(v)?)))
                .collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

macro_rules! impl_as_value_tuple {
    ($($len:literal => ($($name:ident),+)),+ $(,)?) => {
        $(
            impl<$($name: AsValue),+> AsValue for ($($name,)+) {
                #[allow(non_snake_case)]
                fn as_value(self) -> Value {
                    let ($($name,)+) = self;
                    Value::Tuple(vec![$($name.as_value()),+])
                }
                #[allow(non_snake_case)]
                fn try_from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Tuple(v) | Value::Array(v) if v.len() == $len => {
                            let mut it = v.into_iter();
                            $(
                                let $name = $name::try_from_value(
                                    it.next().ok_or_else(|| Error::msg("Tuple is too short"))?,
                                )?;
                            )+
                            Ok(($($name,)+))
                        }
                        _ => Err(mismatch::<Self>(&value)),
                    }
                }
            }
        )+
    };
}

impl_as_value_tuple!(
    1 => (A),
    2 => (A, B),
    3 => (A, B, C),
    4 => (A, B, C, D),
);

impl<T: AsValue> AsValue for Box<T> {
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

impl<T: AsValue + Clone> AsValue for Arc<T> {
    fn as_value(self) -> Value {
        Arc::unwrap_or_clone(self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Arc::new)
    }
}
