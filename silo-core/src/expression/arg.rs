use crate::{Col, F, Value, escape, write_escaped};
use rust_decimal::Decimal;
use std::{borrow::Cow, fmt::Write, sync::Arc};
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Argument of an expression node. Every accepted argument kind is listed here,
/// rendering is a single exhaustive match.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    Date(Date),
    DateTime(OffsetDateTime),
    /// Duration in whole seconds.
    Interval(i64),
    TimeZone(String),
    Column(Cow<'static, str>),
    Func(Arc<F>),
    /// Already rendered query, emitted in parentheses.
    SubQuery(String),
    Tuple(Vec<Arg>),
    Array(Vec<Arg>),
    /// SQL text emitted verbatim.
    Raw(String),
}

impl Arg {
    pub fn raw(sql: impl Into<String>) -> Self {
        Arg::Raw(sql.into())
    }

    pub fn column(name: impl Into<Cow<'static, str>>) -> Self {
        Arg::Column(name.into())
    }

    pub fn tz(name: impl Into<String>) -> Self {
        Arg::TimeZone(name.into())
    }

    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub fn write_sql(&self, out: &mut String) {
        fn list(out: &mut String, items: &[Arg]) {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                item.write_sql(out);
            }
        }
        match self {
            Arg::Null => out.push_str("NULL"),
            Arg::Bool(v) => out.push(if *v { '1' } else { '0' }),
            Arg::Int(v) => {
                let mut buffer = itoa::Buffer::new();
                out.push_str(buffer.format(*v));
            }
            Arg::Float(v) => {
                if v.is_nan() {
                    out.push_str("nan");
                } else if v.is_infinite() {
                    out.push_str(if v.is_sign_negative() { "-inf" } else { "inf" });
                } else {
                    let mut buffer = ryu::Buffer::new();
                    out.push_str(buffer.format(*v));
                }
            }
            Arg::Decimal(v) => {
                let _ = write!(out, "{v}");
            }
            Arg::Str(v) => out.push_str(&escape(v, true)),
            Arg::Date(v) => {
                let _ = write!(out, "toDate('{v}')");
            }
            Arg::DateTime(v) => {
                let _ = write!(out, "toDateTime('{:010}')", v.unix_timestamp());
            }
            Arg::Interval(v) => {
                let _ = write!(out, "toIntervalSecond({v})");
            }
            Arg::TimeZone(v) => {
                out.push('\'');
                write_escaped(out, v);
                out.push('\'');
            }
            Arg::Column(v) => {
                out.push('`');
                out.push_str(v);
                out.push('`');
            }
            Arg::Func(v) => v.write_sql(out),
            Arg::SubQuery(v) => {
                out.push('(');
                out.push_str(v);
                out.push(')');
            }
            Arg::Tuple(items) => {
                out.push('(');
                list(out, items);
                out.push(')');
            }
            Arg::Array(items) => {
                out.push('[');
                list(out, items);
                out.push(']');
            }
            Arg::Raw(v) => out.push_str(v),
        }
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Int(value as i128)
                }
            }
        )+
    };
}
impl_from_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<f32> for Arg {
    fn from(value: f32) -> Self {
        Arg::Float(value as f64)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<Decimal> for Arg {
    fn from(value: Decimal) -> Self {
        Arg::Decimal(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.into())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<Date> for Arg {
    fn from(value: Date) -> Self {
        Arg::Date(value)
    }
}

impl From<OffsetDateTime> for Arg {
    fn from(value: OffsetDateTime) -> Self {
        Arg::DateTime(value)
    }
}

impl From<PrimitiveDateTime> for Arg {
    fn from(value: PrimitiveDateTime) -> Self {
        Arg::DateTime(value.assume_utc())
    }
}

impl From<time::Duration> for Arg {
    fn from(value: time::Duration) -> Self {
        Arg::Interval(value.whole_seconds())
    }
}

impl From<std::time::Duration> for Arg {
    fn from(value: std::time::Duration) -> Self {
        Arg::Interval(value.as_secs() as i64)
    }
}

impl From<F> for Arg {
    fn from(value: F) -> Self {
        Arg::Func(Arc::new(value))
    }
}

impl From<&F> for Arg {
    fn from(value: &F) -> Self {
        Arg::Func(Arc::new(value.clone()))
    }
}

impl From<Arc<F>> for Arg {
    fn from(value: Arc<F>) -> Self {
        Arg::Func(value)
    }
}

impl From<Col> for Arg {
    fn from(value: Col) -> Self {
        Arg::Column(value.into_name())
    }
}

impl From<&Col> for Arg {
    fn from(value: &Col) -> Self {
        Arg::Column(value.name_cow())
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(value: Vec<T>) -> Self {
        Arg::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for Arg {
    fn from(value: [T; N]) -> Self {
        Arg::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Arg>, B: Into<Arg>> From<(A, B)> for Arg {
    fn from((a, b): (A, B)) -> Self {
        Arg::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Arg>, B: Into<Arg>, C: Into<Arg>> From<(A, B, C)> for Arg {
    fn from((a, b, c): (A, B, C)) -> Self {
        Arg::Tuple(vec![a.into(), b.into(), c.into()])
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Arg::Null,
            Value::Boolean(v) => Arg::Bool(v),
            Value::Int8(v) => v.into(),
            Value::Int16(v) => v.into(),
            Value::Int32(v) => v.into(),
            Value::Int64(v) => v.into(),
            Value::UInt8(v) => v.into(),
            Value::UInt16(v) => v.into(),
            Value::UInt32(v) => v.into(),
            Value::UInt64(v) => v.into(),
            Value::Float32(v) => v.into(),
            Value::Float64(v) => v.into(),
            Value::Decimal(v) => v.into(),
            Value::String(v) => Arg::Str(v),
            Value::Blob(v) => Arg::Str(String::from_utf8_lossy(&v).into_owned()),
            Value::Date(v) => Arg::Date(v),
            Value::DateTime(v) => Arg::DateTime(v),
            Value::Uuid(v) => Arg::Str(v.hyphenated().to_string()),
            Value::Ipv4(v) => Arg::Str(v.to_string()),
            Value::Ipv6(v) => Arg::Str(v.to_string()),
            Value::Enum { name, .. } => Arg::Str(name),
            Value::Array(v) => Arg::Array(v.into_iter().map(Into::into).collect()),
            Value::Tuple(v) => Arg::Tuple(v.into_iter().map(Into::into).collect()),
            Value::Map(v) => Arg::Func(Arc::new(F::new(
                "map",
                v.into_iter()
                    .flat_map(|(k, v)| [Arg::from(k), Arg::from(v)])
                    .collect(),
            ))),
        }
    }
}
