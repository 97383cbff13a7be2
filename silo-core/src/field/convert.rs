use crate::{
    FieldType, OrmError, Result, Value,
    util::{Literal, parse_array, parse_map},
};
use atoi::FromRadix10SignedChecked;
use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use std::{
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
};
use time::{
    Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    macros::{date, format_description},
};
use uuid::Uuid;

pub(crate) const DATE_MIN: Date = date!(1970 - 01 - 01);
pub(crate) const DATE_MAX: Date = date!(2038 - 01 - 19);

fn parse_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn parse_offset(input: &str) -> Option<UtcOffset> {
    let (sign, digits) = match input.as_bytes().first()? {
        b'+' => (1, &input[1..]),
        b'-' => (-1, &input[1..]),
        _ => return None,
    };
    let digits = digits.replace(':', "");
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i8>().ok()?, 0),
        4 => (digits[..2].parse::<i8>().ok()?, digits[2..].parse::<i8>().ok()?),
        _ => return None,
    };
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

fn parse_time(input: &str) -> Option<Time> {
    let mut parts = input.split(':');
    let hour = parts.next()?.parse::<u8>().ok()?;
    let minute = parts.next()?.parse::<u8>().ok()?;
    let (second, nanos) = match parts.next() {
        Some(seconds) => match seconds.split_once('.') {
            Some((s, fraction)) => {
                if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let digits = &fraction[..fraction.len().min(9)];
                let nanos = digits.parse::<u32>().ok()? * 10u32.pow(9 - digits.len() as u32);
                (s.parse::<u8>().ok()?, nanos)
            }
            None => (seconds.parse::<u8>().ok()?, 0),
        },
        None => (0, 0),
    };
    if parts.next().is_some() {
        return None;
    }
    Time::from_hms_nano(hour, minute, second, nanos).ok()
}

/// Parse `YYYY-MM-DD[( |T)hh:mm[:ss[.f]]][Z|±hh[:mm]]`, naive inputs are read in `tz`.
pub(crate) fn parse_date_time(input: &str, tz: UtcOffset) -> Option<OffsetDateTime> {
    let input = input.trim();
    if input.len() < 10 || !input.is_char_boundary(10) {
        return None;
    }
    let date = parse_date(&input[..10])?;
    let rest = &input[10..];
    if rest.is_empty() {
        return Some(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(tz));
    }
    let rest = rest.strip_prefix(['T', ' '])?;
    let (time, offset) = if let Some(time) = rest.strip_suffix('Z') {
        (time, Some(UtcOffset::UTC))
    } else if let Some(position) = rest.rfind(['+', '-']) {
        (&rest[..position], Some(parse_offset(&rest[position..])?))
    } else {
        (rest, None)
    };
    let time = parse_time(time.trim())?;
    Some(PrimitiveDateTime::new(date, time).assume_offset(offset.unwrap_or(tz)))
}

fn epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

fn parse_integer(input: &str) -> Option<i128> {
    let input = input.trim().as_bytes();
    let (parsed, used) = i128::from_radix_10_signed_checked(input);
    if used == input.len() && used > 0 {
        parsed
    } else {
        None
    }
}

fn truncate_nanos(value: OffsetDateTime, precision: u8) -> OffsetDateTime {
    let step = 10u32.pow(9 - precision.min(9) as u32);
    let nanos = value.nanosecond();
    value
        .replace_nanosecond(nanos - nanos % step)
        .unwrap_or(value)
}

/// `1577836800.123` style timestamps, exact to the nanosecond.
fn parse_fractional_timestamp(input: &str) -> Option<OffsetDateTime> {
    let (seconds, fraction) = input.split_once('.')?;
    if fraction.is_empty()
        || !fraction.bytes().all(|b| b.is_ascii_digit())
        || !seconds.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let seconds = i64::try_from(parse_integer(seconds)?).ok()?;
    let digits = &fraction[..fraction.len().min(9)];
    let nanos = digits.parse::<i64>().ok()? * 10i64.pow(9 - digits.len() as u32);
    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()?
        .checked_add(Duration::nanoseconds(nanos))
}

fn from_fractional_seconds(seconds: f64) -> Option<OffsetDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as i64;
    OffsetDateTime::from_unix_timestamp(whole as i64)
        .ok()?
        .checked_add(Duration::nanoseconds(nanos))
}

impl FieldType {
    /// Coerce a raw value (native, textual or numeric encoding) to the canonical
    /// [`Value`] of this type, then check the type constraints.
    ///
    /// `tz` is the offset used to interpret timestamps without an explicit one.
    pub fn to_value(&self, raw: Value, tz: UtcOffset) -> Result<Value> {
        let label = self.db_type();
        let value = self.convert(&label, raw, tz)?;
        self.check_value(&label, &value)?;
        Ok(value)
    }

    pub(crate) fn convert(&self, field: &str, raw: Value, tz: UtcOffset) -> Result<Value> {
        let fail = |raw: &Value, reason: &str| -> anyhow::Error {
            OrmError::conversion(field, raw, reason).into()
        };
        macro_rules! integer {
            ($variant:path, $ty:ty) => {{
                let n = match &raw {
                    Value::String(v) => parse_integer(v),
                    v => v.as_i128(),
                }
                .ok_or_else(|| fail(&raw, "not an integer"))?;
                return match <$ty>::try_from(n) {
                    Ok(v) => Ok($variant(v)),
                    Err(..) => Err(OrmError::validation(
                        field,
                        n,
                        format!("must be between {} and {}", <$ty>::MIN, <$ty>::MAX),
                    )
                    .into()),
                };
            }};
        }
        match self {
            FieldType::String => match raw {
                Value::String(..) => Ok(raw),
                Value::Blob(ref v) => std::str::from_utf8(v)
                    .map(|v| Value::String(v.into()))
                    .map_err(|_| fail(&raw, "not valid UTF-8")),
                _ => Err(fail(&raw, "expected a string")),
            },
            FieldType::FixedString(..) => match FieldType::String.convert(field, raw, tz)? {
                Value::String(v) => Ok(Value::String(v.trim_end_matches('\0').into())),
                v => Ok(v),
            },
            FieldType::UInt8 => integer!(Value::UInt8, u8),
            FieldType::UInt16 => integer!(Value::UInt16, u16),
            FieldType::UInt32 => integer!(Value::UInt32, u32),
            FieldType::UInt64 => integer!(Value::UInt64, u64),
            FieldType::Int8 => integer!(Value::Int8, i8),
            FieldType::Int16 => integer!(Value::Int16, i16),
            FieldType::Int32 => integer!(Value::Int32, i32),
            FieldType::Int64 => integer!(Value::Int64, i64),
            FieldType::Float32 | FieldType::Float64 => {
                let v = match &raw {
                    Value::String(v) => fast_float::parse::<f64, _>(v.trim()).ok(),
                    v => v.as_f64(),
                }
                .ok_or_else(|| fail(&raw, "not a number"))?;
                Ok(if *self == FieldType::Float32 {
                    Value::Float32(v as f32)
                } else {
                    Value::Float64(v)
                })
            }
            FieldType::Decimal(..)
            | FieldType::Decimal32(..)
            | FieldType::Decimal64(..)
            | FieldType::Decimal128(..) => {
                let (_, scale) = self.decimal_params().unwrap_or_default();
                let v = match &raw {
                    Value::Decimal(v) => Some(*v),
                    Value::String(v) => {
                        let v = v.trim();
                        if matches!(v.to_ascii_lowercase().trim_start_matches(['+', '-']), "inf" | "infinity" | "nan") {
                            return Err(fail(&raw, "non-finite value"));
                        }
                        Decimal::from_str(v)
                            .or_else(|_| Decimal::from_scientific(v))
                            .ok()
                    }
                    Value::Float32(v) if !v.is_finite() => {
                        return Err(fail(&raw, "non-finite value"));
                    }
                    Value::Float64(v) if !v.is_finite() => {
                        return Err(fail(&raw, "non-finite value"));
                    }
                    Value::Float32(v) => Decimal::from_f32(*v),
                    Value::Float64(v) => Decimal::from_f64(*v),
                    v => v.as_i128().and_then(Decimal::from_i128),
                }
                .ok_or_else(|| fail(&raw, "not a decimal"))?;
                Ok(Value::Decimal(v.round_dp_with_strategy(
                    scale as u32,
                    RoundingStrategy::MidpointNearestEven,
                )))
            }
            FieldType::Boolean => match &raw {
                Value::Boolean(..) => Ok(raw),
                Value::String(v) => match v.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" => Ok(Value::Boolean(true)),
                    "0" | "false" => Ok(Value::Boolean(false)),
                    _ => Err(fail(&raw, "not a boolean")),
                },
                v => v
                    .as_i128()
                    .map(|v| Value::Boolean(v != 0))
                    .ok_or_else(|| fail(&raw, "not a boolean")),
            },
            FieldType::Date => match &raw {
                Value::Date(..) => Ok(raw),
                Value::Null => Ok(Value::Date(DATE_MIN)),
                Value::DateTime(v) => Ok(Value::Date(v.to_offset(UtcOffset::UTC).date())),
                Value::String(v) if v.trim() == "0000-00-00" => Ok(Value::Date(DATE_MIN)),
                Value::String(v) => parse_date(v)
                    .map(Value::Date)
                    .ok_or_else(|| fail(&raw, "expected YYYY-MM-DD")),
                v => v
                    .as_i128()
                    .and_then(|days| i64::try_from(days).ok())
                    .and_then(|days| DATE_MIN.checked_add(Duration::days(days)))
                    .map(Value::Date)
                    .ok_or_else(|| fail(&raw, "not a date")),
            },
            FieldType::DateTime(..) | FieldType::DateTime64 { .. } => {
                let precision = match self {
                    FieldType::DateTime64 { precision, .. } => Some(*precision),
                    _ => None,
                };
                let v = match &raw {
                    Value::DateTime(v) => *v,
                    Value::Null => epoch(),
                    Value::Date(v) => PrimitiveDateTime::new(*v, Time::MIDNIGHT).assume_utc(),
                    Value::String(v) => {
                        let v = v.trim();
                        if v == "0000-00-00 00:00:00" || v.starts_with("0000-00-00 00:00:00.") {
                            epoch()
                        } else if let Some(seconds) = parse_integer(v).filter(|_| v.len() == 10) {
                            OffsetDateTime::from_unix_timestamp(seconds as i64)
                                .map_err(|_| fail(&raw, "timestamp out of range"))?
                        } else if let Some(v) =
                            precision.and_then(|_| parse_fractional_timestamp(v))
                        {
                            v
                        } else {
                            parse_date_time(v, tz)
                                .ok_or_else(|| fail(&raw, "not a valid timestamp"))?
                        }
                    }
                    Value::Float32(..) | Value::Float64(..) if precision.is_some() => raw
                        .as_f64()
                        .and_then(from_fractional_seconds)
                        .ok_or_else(|| fail(&raw, "timestamp out of range"))?,
                    v => v
                        .as_i128()
                        .and_then(|v| OffsetDateTime::from_unix_timestamp(v as i64).ok())
                        .ok_or_else(|| fail(&raw, "not a timestamp"))?,
                };
                let v = v.to_offset(UtcOffset::UTC);
                Ok(Value::DateTime(truncate_nanos(v, precision.unwrap_or(0))))
            }
            FieldType::Enum8(members) | FieldType::Enum16(members) => {
                let found = match &raw {
                    Value::Enum { name, .. } => members.iter().find(|(n, _)| n == name),
                    Value::String(v) => members.iter().find(|(n, _)| n == v).or_else(|| {
                        parse_integer(v).and_then(|c| members.iter().find(|(_, code)| *code as i128 == c))
                    }),
                    v => v
                        .as_i128()
                        .and_then(|c| members.iter().find(|(_, code)| *code as i128 == c)),
                };
                found
                    .map(|(name, code)| Value::Enum {
                        name: name.clone(),
                        code: *code,
                    })
                    .ok_or_else(|| fail(&raw, "not a member of the enum"))
            }
            FieldType::Uuid => match &raw {
                Value::Uuid(..) => Ok(raw),
                Value::String(v) => Uuid::parse_str(v.trim())
                    .map(Value::Uuid)
                    .map_err(|_| fail(&raw, "not a UUID")),
                Value::Blob(v) => Uuid::from_slice(v)
                    .map(Value::Uuid)
                    .map_err(|_| fail(&raw, "expected 16 bytes")),
                v => v
                    .as_i128()
                    .and_then(|v| u128::try_from(v).ok())
                    .map(|v| Value::Uuid(Uuid::from_u128(v)))
                    .ok_or_else(|| fail(&raw, "not a UUID")),
            },
            FieldType::IPv4 => match &raw {
                Value::Ipv4(..) => Ok(raw),
                Value::String(v) => v
                    .trim()
                    .parse::<Ipv4Addr>()
                    .map(Value::Ipv4)
                    .map_err(|_| fail(&raw, "not an IPv4 address")),
                v => v
                    .as_i128()
                    .and_then(|v| u32::try_from(v).ok())
                    .map(|v| Value::Ipv4(Ipv4Addr::from(v)))
                    .ok_or_else(|| fail(&raw, "not an IPv4 address")),
            },
            FieldType::IPv6 => match &raw {
                Value::Ipv6(..) => Ok(raw),
                Value::Ipv4(v) => Ok(Value::Ipv6(v.to_ipv6_mapped())),
                Value::String(v) => v
                    .trim()
                    .parse::<Ipv6Addr>()
                    .map(Value::Ipv6)
                    .map_err(|_| fail(&raw, "not an IPv6 address")),
                v => v
                    .as_i128()
                    .and_then(|v| u128::try_from(v).ok())
                    .map(|v| Value::Ipv6(Ipv6Addr::from(v)))
                    .ok_or_else(|| fail(&raw, "not an IPv6 address")),
            },
            FieldType::Array(inner) => {
                let items = match raw {
                    Value::Array(v) | Value::Tuple(v) => v,
                    Value::String(ref v) => parse_array(v)
                        .map_err(|e| fail(&raw, &e.to_string()))?
                        .into_iter()
                        .map(Literal::into_value)
                        .collect(),
                    _ => return Err(fail(&raw, "expected an array")),
                };
                items
                    .into_iter()
                    .map(|v| inner.convert(field, v, tz))
                    .collect::<Result<_>>()
                    .map(Value::Array)
            }
            FieldType::Tuple(types) => {
                let items: Vec<Value> = match raw {
                    Value::Tuple(ref v) | Value::Array(ref v) => v.clone(),
                    Value::String(ref v) => parse_array(v)
                        .map_err(|e| fail(&raw, &e.to_string()))?
                        .into_iter()
                        .map(Literal::into_value)
                        .collect(),
                    _ => return Err(fail(&raw, "expected a tuple")),
                };
                if items.len() != types.len() {
                    return Err(fail(
                        &raw,
                        &format!("expected {} elements, found {}", types.len(), items.len()),
                    ));
                }
                types
                    .iter()
                    .zip(items)
                    .map(|(t, v)| t.convert(field, v, tz))
                    .collect::<Result<_>>()
                    .map(Value::Tuple)
            }
            FieldType::Map(key, value) => {
                let entries = match raw {
                    Value::Map(v) => v,
                    Value::String(ref v) => parse_map(v)
                        .map_err(|e| fail(&raw, &e.to_string()))?
                        .into_iter()
                        .map(|(k, v)| (k.into_value(), v.into_value()))
                        .collect(),
                    _ => return Err(fail(&raw, "expected a map")),
                };
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((key.convert(field, k, tz)?, value.convert(field, v, tz)?)))
                    .collect::<Result<_>>()
                    .map(Value::Map)
            }
            FieldType::Nullable(inner) => match raw {
                Value::Null => Ok(Value::Null),
                Value::String(ref v) if v == "\\N" => Ok(Value::Null),
                _ => inner.convert(field, raw, tz),
            },
            FieldType::LowCardinality(inner) => inner.convert(field, raw, tz),
        }
    }

    /// Check range, precision, length and membership constraints of an already converted value.
    pub fn validate(&self, value: &Value) -> Result<()> {
        self.check_value(&self.db_type(), value)
    }

    pub(crate) fn check_value(&self, field: &str, value: &Value) -> Result<()> {
        macro_rules! range {
            ($ty:ty) => {{
                if let Some(n) = value.as_i128() {
                    if <$ty>::try_from(n).is_err() {
                        return Err(OrmError::validation(
                            field,
                            n,
                            format!("must be between {} and {}", <$ty>::MIN, <$ty>::MAX),
                        )
                        .into());
                    }
                }
                Ok(())
            }};
        }
        match self {
            FieldType::UInt8 => range!(u8),
            FieldType::UInt16 => range!(u16),
            FieldType::UInt32 => range!(u32),
            FieldType::UInt64 => range!(u64),
            FieldType::Int8 => range!(i8),
            FieldType::Int16 => range!(i16),
            FieldType::Int32 => range!(i32),
            FieldType::Int64 => range!(i64),
            FieldType::Decimal(..)
            | FieldType::Decimal32(..)
            | FieldType::Decimal64(..)
            | FieldType::Decimal128(..) => {
                let Value::Decimal(v) = value else {
                    return Ok(());
                };
                let (precision, scale) = self.decimal_params().unwrap_or_default();
                let digits = precision.saturating_sub(scale) as u32;
                // Anything wider than 28 integral digits is already bounded by the representation
                if digits <= 28 {
                    let step = Decimal::new(1, scale as u32);
                    let max = Decimal::from_i128_with_scale(10i128.pow(digits), 0) - step;
                    if v.abs() > max {
                        return Err(OrmError::validation(
                            field,
                            v,
                            format!("must be between {} and {}", -max, max),
                        )
                        .into());
                    }
                }
                Ok(())
            }
            FieldType::Date => match value {
                Value::Date(v) if *v < DATE_MIN || *v > DATE_MAX => Err(OrmError::validation(
                    field,
                    v,
                    format!("must be between {} and {}", DATE_MIN, DATE_MAX),
                )
                .into()),
                _ => Ok(()),
            },
            FieldType::FixedString(length) => match value {
                Value::String(v) if v.len() > *length => Err(OrmError::validation(
                    field,
                    v.len(),
                    format!("bytes is too long for FixedString({length})"),
                )
                .into()),
                _ => Ok(()),
            },
            FieldType::Enum8(members) | FieldType::Enum16(members) => match value {
                Value::Enum { name, .. } if !members.iter().any(|(n, _)| n == name) => Err(
                    OrmError::validation(field, name, "is not a member of the enum").into(),
                ),
                _ => Ok(()),
            },
            FieldType::Array(inner) => match value {
                Value::Array(items) => items.iter().try_for_each(|v| inner.check_value(field, v)),
                _ => Ok(()),
            },
            FieldType::Tuple(types) => match value {
                Value::Tuple(items) => types
                    .iter()
                    .zip(items)
                    .try_for_each(|(t, v)| t.check_value(field, v)),
                _ => Ok(()),
            },
            FieldType::Map(key, val) => match value {
                Value::Map(entries) => entries.iter().try_for_each(|(k, v)| {
                    key.check_value(field, k)?;
                    val.check_value(field, v)
                }),
                _ => Ok(()),
            },
            FieldType::Nullable(inner) => match value {
                Value::Null => Ok(()),
                v => inner.check_value(field, v),
            },
            FieldType::LowCardinality(inner) => inner.check_value(field, value),
            _ => Ok(()),
        }
    }

    /// Value a new record gets when the field declares no default.
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::String | FieldType::FixedString(..) => Value::String(String::new()),
            FieldType::Date => Value::Date(DATE_MIN),
            FieldType::DateTime(..) | FieldType::DateTime64 { .. } => Value::DateTime(epoch()),
            FieldType::UInt8 => Value::UInt8(0),
            FieldType::UInt16 => Value::UInt16(0),
            FieldType::UInt32 => Value::UInt32(0),
            FieldType::UInt64 => Value::UInt64(0),
            FieldType::Int8 => Value::Int8(0),
            FieldType::Int16 => Value::Int16(0),
            FieldType::Int32 => Value::Int32(0),
            FieldType::Int64 => Value::Int64(0),
            FieldType::Float32 => Value::Float32(0.0),
            FieldType::Float64 => Value::Float64(0.0),
            FieldType::Decimal(..)
            | FieldType::Decimal32(..)
            | FieldType::Decimal64(..)
            | FieldType::Decimal128(..) => Value::Decimal(Decimal::ZERO),
            FieldType::Boolean => Value::Boolean(false),
            FieldType::Enum8(members) | FieldType::Enum16(members) => members
                .first()
                .map(|(name, code)| Value::Enum {
                    name: name.clone(),
                    code: *code,
                })
                .unwrap_or_default(),
            FieldType::Uuid => Value::Uuid(Uuid::nil()),
            FieldType::IPv4 => Value::Ipv4(Ipv4Addr::UNSPECIFIED),
            FieldType::IPv6 => Value::Ipv6(Ipv6Addr::UNSPECIFIED),
            FieldType::Array(..) => Value::Array(Vec::new()),
            FieldType::Tuple(types) => Value::Tuple(types.iter().map(Self::default_value).collect()),
            FieldType::Map(..) => Value::Map(Vec::new()),
            FieldType::Nullable(..) => Value::Null,
            FieldType::LowCardinality(inner) => inner.default_value(),
        }
    }
}
