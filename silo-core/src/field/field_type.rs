use crate::{
    Error, OrmError, Result, truncate_long,
    util::{Literal, read_quoted},
};
use std::fmt::{self, Display, Formatter, Write};

/// Members of an enum column, name and numeric code in declaration order.
pub type EnumMembers = Vec<(String, i16)>;

/// Server side column type, it drives conversion, validation and rendering of values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    FixedString(usize),
    Date,
    /// Optional named timezone, only used in the column declaration.
    DateTime(Option<String>),
    DateTime64 {
        precision: u8,
        timezone: Option<String>,
    },
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal(u8, u8),
    Decimal32(u8),
    Decimal64(u8),
    Decimal128(u8),
    /// Stored as `UInt8`.
    Boolean,
    Enum8(EnumMembers),
    Enum16(EnumMembers),
    Uuid,
    IPv4,
    IPv6,
    Array(Box<FieldType>),
    Tuple(Vec<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
    Nullable(Box<FieldType>),
    LowCardinality(Box<FieldType>),
}

impl FieldType {
    pub fn date_time_tz(timezone: impl Into<String>) -> Self {
        FieldType::DateTime(Some(timezone.into()))
    }

    pub fn date_time64(precision: u8, timezone: Option<&str>) -> Result<Self> {
        let result = FieldType::DateTime64 {
            precision,
            timezone: timezone.map(Into::into),
        };
        result.check()?;
        Ok(result)
    }

    pub fn decimal(precision: u8, scale: u8) -> Result<Self> {
        let result = FieldType::Decimal(precision, scale);
        result.check()?;
        Ok(result)
    }

    pub fn decimal32(scale: u8) -> Result<Self> {
        let result = FieldType::Decimal32(scale);
        result.check()?;
        Ok(result)
    }

    pub fn decimal64(scale: u8) -> Result<Self> {
        let result = FieldType::Decimal64(scale);
        result.check()?;
        Ok(result)
    }

    pub fn decimal128(scale: u8) -> Result<Self> {
        let result = FieldType::Decimal128(scale);
        result.check()?;
        Ok(result)
    }

    pub fn enum8<S: Into<String>>(members: impl IntoIterator<Item = (S, i16)>) -> Result<Self> {
        let result = FieldType::Enum8(members.into_iter().map(|(k, v)| (k.into(), v)).collect());
        result.check()?;
        Ok(result)
    }

    pub fn enum16<S: Into<String>>(members: impl IntoIterator<Item = (S, i16)>) -> Result<Self> {
        let result =
            FieldType::Enum16(members.into_iter().map(|(k, v)| (k.into(), v)).collect());
        result.check()?;
        Ok(result)
    }

    pub fn array(inner: FieldType) -> Result<Self> {
        let result = FieldType::Array(inner.into());
        result.check()?;
        Ok(result)
    }

    pub fn tuple(items: impl IntoIterator<Item = FieldType>) -> Result<Self> {
        let result = FieldType::Tuple(items.into_iter().collect());
        result.check()?;
        Ok(result)
    }

    pub fn map(key: FieldType, value: FieldType) -> Result<Self> {
        let result = FieldType::Map(key.into(), value.into());
        result.check()?;
        Ok(result)
    }

    pub fn nullable(inner: FieldType) -> Result<Self> {
        let result = FieldType::Nullable(inner.into());
        result.check()?;
        Ok(result)
    }

    pub fn low_cardinality(inner: FieldType) -> Result<Self> {
        let result = FieldType::LowCardinality(inner.into());
        result.check()?;
        Ok(result)
    }

    /// Verify the structural constraints of the type, recursively.
    pub fn check(&self) -> Result<()> {
        let fail = |message: String| -> Result<()> { Err(OrmError::schema(message).into()) };
        match self {
            FieldType::DateTime64 { precision, .. } if *precision > 9 => {
                return fail(format!("DateTime64 precision must be between 0 and 9, got {precision}"));
            }
            FieldType::Decimal(precision, scale) => {
                if !(1..=38).contains(precision) {
                    return fail(format!("Precision must be between 1 and 38, got {precision}"));
                }
                if scale > precision {
                    return fail(format!(
                        "Scale must be between 0 and the given precision, got {scale}"
                    ));
                }
                if *scale > 28 {
                    return fail(format!("Decimal scale {scale} is not representable"));
                }
            }
            FieldType::Decimal32(scale) | FieldType::Decimal64(scale) | FieldType::Decimal128(scale) => {
                let (precision, scale) = self.decimal_params().unwrap_or((0, *scale));
                if scale > precision || scale > 28 {
                    return fail(format!(
                        "Scale {scale} is not valid for `{}`",
                        self.base_name()
                    ));
                }
            }
            FieldType::Enum8(members) | FieldType::Enum16(members) => {
                if members.is_empty() {
                    return fail(format!("`{}` requires at least one member", self.base_name()));
                }
                for (i, (name, code)) in members.iter().enumerate() {
                    if matches!(self, FieldType::Enum8(..)) && i8::try_from(*code).is_err() {
                        return fail(format!("Enum8 code {code} of `{name}` is out of range"));
                    }
                    if members[..i].iter().any(|(n, c)| n == name || c == code) {
                        return fail(format!(
                            "Duplicate enum member `{name}` = {code} in `{}`",
                            self.base_name()
                        ));
                    }
                }
            }
            FieldType::Array(inner) => {
                if matches!(inner.as_ref(), FieldType::Array(..)) {
                    return fail("Multidimensional array fields are not supported".into());
                }
                inner.check()?;
            }
            FieldType::Tuple(items) => {
                if items.is_empty() {
                    return fail("Tuple requires at least one element".into());
                }
                for item in items {
                    item.check()?;
                }
            }
            FieldType::Map(key, value) => {
                if key.is_composite() || matches!(key.as_ref(), FieldType::Nullable(..)) {
                    return fail(format!("`{}` cannot be used as a map key", key.db_type()));
                }
                key.check()?;
                value.check()?;
            }
            FieldType::Nullable(inner) => {
                if matches!(
                    inner.as_ref(),
                    FieldType::Nullable(..)
                        | FieldType::Array(..)
                        | FieldType::Tuple(..)
                        | FieldType::Map(..)
                        | FieldType::LowCardinality(..)
                ) {
                    return fail(format!("`{}` cannot be nullable", inner.db_type()));
                }
                inner.check()?;
            }
            FieldType::LowCardinality(inner) => {
                match inner.as_ref() {
                    FieldType::LowCardinality(..) => {
                        return fail("LowCardinality cannot be nested".into());
                    }
                    FieldType::Array(..) => {
                        return fail(
                            "Array field inside LowCardinality are not supported, use Array(LowCardinality) instead"
                                .into(),
                        );
                    }
                    FieldType::Tuple(..) | FieldType::Map(..) => {
                        return fail(format!("`{}` cannot be low cardinality", inner.db_type()));
                    }
                    _ => {}
                }
                inner.check()?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Precision and scale of any decimal flavour.
    pub fn decimal_params(&self) -> Option<(u8, u8)> {
        match *self {
            FieldType::Decimal(p, s) => Some((p, s)),
            FieldType::Decimal32(s) => Some((9, s)),
            FieldType::Decimal64(s) => Some((18, s)),
            FieldType::Decimal128(s) => Some((38, s)),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            FieldType::Array(..) | FieldType::Tuple(..) | FieldType::Map(..)
        )
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::Nullable(..))
    }

    /// Type after removing the `Nullable` and `LowCardinality` wrappers.
    pub fn base(&self) -> &FieldType {
        match self {
            FieldType::Nullable(inner) | FieldType::LowCardinality(inner) => inner.base(),
            _ => self,
        }
    }

    fn base_name(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::FixedString(..) => "FixedString",
            FieldType::Date => "Date",
            FieldType::DateTime(..) => "DateTime",
            FieldType::DateTime64 { .. } => "DateTime64",
            FieldType::UInt8 | FieldType::Boolean => "UInt8",
            FieldType::UInt16 => "UInt16",
            FieldType::UInt32 => "UInt32",
            FieldType::UInt64 => "UInt64",
            FieldType::Int8 => "Int8",
            FieldType::Int16 => "Int16",
            FieldType::Int32 => "Int32",
            FieldType::Int64 => "Int64",
            FieldType::Float32 => "Float32",
            FieldType::Float64 => "Float64",
            FieldType::Decimal(..) => "Decimal",
            FieldType::Decimal32(..) => "Decimal32",
            FieldType::Decimal64(..) => "Decimal64",
            FieldType::Decimal128(..) => "Decimal128",
            FieldType::Enum8(..) => "Enum8",
            FieldType::Enum16(..) => "Enum16",
            FieldType::Uuid => "UUID",
            FieldType::IPv4 => "IPv4",
            FieldType::IPv6 => "IPv6",
            FieldType::Array(..) => "Array",
            FieldType::Tuple(..) => "Tuple",
            FieldType::Map(..) => "Map",
            FieldType::Nullable(..) => "Nullable",
            FieldType::LowCardinality(..) => "LowCardinality",
        }
    }

    /// The type as written in a column declaration, e.g. `Array(Nullable(String))`.
    pub fn db_type(&self) -> String {
        let mut out = String::new();
        self.write_db_type(&mut out, true);
        out
    }

    /// Same as [`FieldType::db_type`], `LowCardinality` wrappers are dropped when not supported.
    pub(crate) fn write_db_type(&self, out: &mut String, low_cardinality: bool) {
        let name = self.base_name();
        match self {
            FieldType::FixedString(n) => {
                let _ = write!(out, "{name}({n})");
            }
            FieldType::DateTime(Some(tz)) => {
                let _ = write!(out, "{name}(");
                write_quoted(out, tz);
                out.push(')');
            }
            FieldType::DateTime64 {
                precision,
                timezone,
            } => {
                let _ = write!(out, "{name}({precision}");
                if let Some(tz) = timezone {
                    out.push_str(", ");
                    write_quoted(out, tz);
                }
                out.push(')');
            }
            FieldType::Decimal(p, s) => {
                let _ = write!(out, "{name}({p}, {s})");
            }
            FieldType::Decimal32(s) | FieldType::Decimal64(s) | FieldType::Decimal128(s) => {
                let _ = write!(out, "{name}({s})");
            }
            FieldType::Enum8(members) | FieldType::Enum16(members) => {
                out.push_str(name);
                out.push('(');
                for (i, (member, code)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_quoted(out, member);
                    let _ = write!(out, " = {code}");
                }
                out.push(')');
            }
            FieldType::Array(inner)
            | FieldType::Nullable(inner) => {
                out.push_str(name);
                out.push('(');
                inner.write_db_type(out, low_cardinality);
                out.push(')');
            }
            FieldType::LowCardinality(inner) => {
                if low_cardinality {
                    out.push_str(name);
                    out.push('(');
                    inner.write_db_type(out, low_cardinality);
                    out.push(')');
                } else {
                    inner.write_db_type(out, low_cardinality);
                }
            }
            FieldType::Tuple(items) => {
                out.push_str(name);
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_db_type(out, low_cardinality);
                }
                out.push(')');
            }
            FieldType::Map(key, value) => {
                out.push_str(name);
                out.push('(');
                key.write_db_type(out, low_cardinality);
                out.push_str(", ");
                value.write_db_type(out, low_cardinality);
                out.push(')');
            }
            _ => out.push_str(name),
        }
    }

    /// Build a field type from the type name reported by the server (`DESCRIBE`,
    /// `TabSeparatedWithNamesAndTypes` headers).
    pub fn parse(db_type: &str) -> Result<Self> {
        let db_type = db_type.trim();
        let unsupported = || -> Error {
            OrmError::schema(format!(
                "No field type for `{}`",
                truncate_long!(db_type)
            ))
            .into()
        };
        let (name, args) = match db_type.find('(') {
            Some(open) => {
                let Some(inner) = db_type[open + 1..].strip_suffix(')') else {
                    return Err(unsupported());
                };
                (db_type[..open].trim(), Some(split_type_args(inner)?))
            }
            None => (db_type, None),
        };
        let args = args.unwrap_or_default();
        let single = |args: &[&str]| -> Result<FieldType> {
            match args {
                [inner] => FieldType::parse(inner),
                _ => Err(unsupported()),
            }
        };
        let integer = |arg: Option<&&str>| -> Result<u8> {
            arg.and_then(|v| v.trim().parse().ok())
                .ok_or_else(unsupported)
        };
        let quoted = |arg: &str| -> Result<String> {
            match read_quoted(arg.trim())? {
                (Literal::Quoted(v), rest) if rest.trim().is_empty() => Ok(v),
                _ => Err(unsupported()),
            }
        };
        Ok(match name {
            "String" => FieldType::String,
            "FixedString" => FieldType::FixedString(
                args.first()
                    .and_then(|v| v.trim().parse().ok())
                    .ok_or_else(unsupported)?,
            ),
            "Date" => FieldType::Date,
            "DateTime" => match args.first() {
                Some(tz) => FieldType::DateTime(Some(quoted(tz)?)),
                None => FieldType::DateTime(None),
            },
            "DateTime64" => FieldType::date_time64(
                integer(args.first())?,
                args.get(1).map(|v| quoted(v)).transpose()?.as_deref(),
            )?,
            "UInt8" => FieldType::UInt8,
            "UInt16" => FieldType::UInt16,
            "UInt32" => FieldType::UInt32,
            "UInt64" => FieldType::UInt64,
            "Int8" => FieldType::Int8,
            "Int16" => FieldType::Int16,
            "Int32" => FieldType::Int32,
            "Int64" => FieldType::Int64,
            "Float32" => FieldType::Float32,
            "Float64" => FieldType::Float64,
            "Bool" => FieldType::Boolean,
            "Decimal" => FieldType::decimal(integer(args.first())?, integer(args.get(1))?)?,
            "Decimal32" => FieldType::decimal32(integer(args.first())?)?,
            "Decimal64" => FieldType::decimal64(integer(args.first())?)?,
            "Decimal128" => FieldType::decimal128(integer(args.first())?)?,
            "Enum8" | "Enum16" => {
                let mut members = Vec::with_capacity(args.len());
                for arg in &args {
                    let (Literal::Quoted(member), rest) = read_quoted(arg.trim())? else {
                        return Err(unsupported());
                    };
                    let code = rest
                        .trim()
                        .strip_prefix('=')
                        .and_then(|v| v.trim().parse::<i16>().ok())
                        .ok_or_else(unsupported)?;
                    members.push((member, code));
                }
                if name == "Enum8" {
                    FieldType::enum8(members)?
                } else {
                    FieldType::enum16(members)?
                }
            }
            "UUID" => FieldType::Uuid,
            "IPv4" => FieldType::IPv4,
            "IPv6" => FieldType::IPv6,
            "Array" => FieldType::array(single(&args)?)?,
            "Tuple" => FieldType::tuple(
                args.iter()
                    .map(|v| FieldType::parse(v))
                    .collect::<Result<Vec<_>>>()?,
            )?,
            "Map" => match args.as_slice() {
                [key, value] => FieldType::map(FieldType::parse(key)?, FieldType::parse(value)?)?,
                _ => return Err(unsupported()),
            },
            "Nullable" => FieldType::nullable(single(&args)?)?,
            "LowCardinality" => FieldType::low_cardinality(single(&args)?)?,
            "SimpleAggregateFunction" => match args.as_slice() {
                [_, inner] => FieldType::parse(inner)?,
                _ => return Err(unsupported()),
            },
            _ => return Err(unsupported()),
        })
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.db_type())
    }
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('\'');
    crate::write_escaped(out, value);
    out.push('\'');
}

/// Split the arguments of a type declaration on the top level commas.
fn split_type_args(input: &str) -> Result<Vec<&str>> {
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        if quoted {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '\'') => quoted = false,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' => quoted = true,
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::msg(format!("Unbalanced type arguments: `{}`", truncate_long!(input)))
                })?
            }
            ',' if depth == 0 => {
                result.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quoted {
        return Err(Error::msg(format!(
            "Unbalanced type arguments: `{}`",
            truncate_long!(input)
        )));
    }
    let last = input[start..].trim();
    if !last.is_empty() || !result.is_empty() {
        result.push(last);
    }
    Ok(result)
}
