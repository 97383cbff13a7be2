use crate::{FieldType, Result, Value, unescape, write_escaped};
use std::fmt::Write;
use time::UtcOffset;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        if $value.is_infinite() {
            $out.push_str(if $value.is_sign_negative() { "-inf" } else { "inf" });
        } else if $value.is_nan() {
            $out.push_str("nan");
        } else {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        }
    }};
}

fn write_text(out: &mut String, value: &str, quote: bool) {
    if quote {
        out.push('\'');
    }
    write_escaped(out, value);
    if quote {
        out.push('\'');
    }
}

impl FieldType {
    /// Literal form of the value as written in SQL text (defaults, conditions,
    /// composite literals). With `quote` strings and temporal values are single quoted.
    pub fn to_db_string(&self, value: &Value, quote: bool) -> String {
        let mut out = String::new();
        write_value(&mut out, Some(self), value, quote);
        out
    }

    /// Cell of the tab separated format for this value.
    ///
    /// Composites travel as their literal, the element escaping already covers
    /// tabs, newlines and quotes.
    pub fn to_wire(&self, value: &Value) -> String {
        match value {
            Value::Null => "\\N".into(),
            Value::Array(..) | Value::Tuple(..) | Value::Map(..) => self.to_db_string(value, true),
            _ => self.to_db_string(value, false),
        }
    }

    /// Decode a raw (still escaped) cell of the tab separated format. Values
    /// coming from the server are converted but not range checked.
    pub fn from_wire(&self, cell: &str, tz: UtcOffset) -> Result<Value> {
        let raw = match self.base() {
            _ if cell == "\\N" => Value::Null,
            // Elements are unescaped one by one while parsing the literal
            FieldType::Array(..) | FieldType::Tuple(..) | FieldType::Map(..) => {
                Value::String(cell.to_owned())
            }
            _ => Value::String(unescape(cell)),
        };
        self.convert(&self.db_type(), raw, tz)
    }
}

/// Element type of a composite at the given position, `None` when the value does not match the type.
fn element_type(field_type: Option<&FieldType>, index: usize, key: bool) -> Option<&FieldType> {
    match field_type?.base() {
        FieldType::Array(inner) => Some(inner),
        FieldType::Tuple(items) => items.get(index),
        FieldType::Map(k, v) => Some(if key { k } else { v }),
        _ => None,
    }
}

pub(crate) fn write_value(
    out: &mut String,
    field_type: Option<&FieldType>,
    value: &Value,
    quote: bool,
) {
    let base = field_type.map(FieldType::base);
    match value {
        Value::Null => out.push_str(if quote { "NULL" } else { "\\N" }),
        Value::Boolean(v) => out.push(if *v { '1' } else { '0' }),
        Value::Int8(v) => write_integer!(out, *v),
        Value::Int16(v) => write_integer!(out, *v),
        Value::Int32(v) => write_integer!(out, *v),
        Value::Int64(v) => write_integer!(out, *v),
        Value::UInt8(v) => write_integer!(out, *v),
        Value::UInt16(v) => write_integer!(out, *v),
        Value::UInt32(v) => write_integer!(out, *v),
        Value::UInt64(v) => write_integer!(out, *v),
        Value::Float32(v) => write_float!(out, *v),
        Value::Float64(v) => write_float!(out, *v),
        Value::Decimal(v) => {
            let _ = write!(out, "{v}");
        }
        Value::String(v) => write_text(out, v, quote),
        Value::Blob(v) => write_text(out, &String::from_utf8_lossy(v), quote),
        Value::Date(v) => write_text(out, &v.to_string(), quote),
        Value::DateTime(v) => {
            let seconds = v.unix_timestamp();
            let text = match base {
                Some(FieldType::DateTime64 { precision, .. }) if *precision > 0 => {
                    let precision = *precision.min(&9) as usize;
                    let fraction = v.nanosecond() / 10u32.pow(9 - precision as u32);
                    format!("{seconds:010}.{fraction:0precision$}")
                }
                _ => format!("{seconds:010}"),
            };
            write_text(out, &text, quote);
        }
        Value::Uuid(v) => write_text(out, &v.hyphenated().to_string(), quote),
        Value::Ipv4(v) => write_text(out, &v.to_string(), quote),
        Value::Ipv6(v) => write_text(out, &v.to_string(), quote),
        Value::Enum { name, .. } => write_text(out, name, quote),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, element_type(field_type, i, false), item, true);
            }
            out.push(']');
        }
        Value::Tuple(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, element_type(field_type, i, false), item, true);
            }
            out.push(')');
        }
        Value::Map(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, element_type(field_type, i, true), k, true);
                out.push(':');
                write_value(out, element_type(field_type, i, false), v, true);
            }
            out.push('}');
        }
    }
}
