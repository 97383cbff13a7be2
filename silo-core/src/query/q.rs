use crate::{AsValue, F, Field, OrmError, Result, Schema, Value};
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops,
    sync::Arc,
};
use time::UtcOffset;

/// Query that can be embedded in another one, rendered when the outer query is.
pub trait SubQuery: Debug + Send + Sync {
    fn subquery_sql(&self) -> Result<String>;
}

/// Right hand side of a lookup.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Converted through the field before rendering.
    Value(Value),
    Expr(F),
    SubQuery(Arc<dyn SubQuery>),
    /// SQL text used as is, for `in` it is the content of the parentheses.
    Raw(String),
}

impl Operand {
    pub fn raw(sql: impl Into<String>) -> Self {
        Operand::Raw(sql.into())
    }
}

impl<T: AsValue> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Value(value.as_value())
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Value(Value::String(value.into()))
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<F> for Operand {
    fn from(value: F) -> Self {
        Operand::Expr(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    IContains,
    IStartsWith,
    IEndsWith,
    IExact,
    Between,
}

impl Lookup {
    /// Lookup named by the suffix of a keyword filter, `age__gt` uses `gt`.
    pub fn from_suffix(suffix: &str) -> Option<Lookup> {
        Some(match suffix {
            "eq" => Lookup::Eq,
            "ne" => Lookup::Ne,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "in" => Lookup::In,
            "not_in" => Lookup::NotIn,
            "contains" => Lookup::Contains,
            "startswith" => Lookup::StartsWith,
            "endswith" => Lookup::EndsWith,
            "icontains" => Lookup::IContains,
            "istartswith" => Lookup::IStartsWith,
            "iendswith" => Lookup::IEndsWith,
            "iexact" => Lookup::IExact,
            "between" => Lookup::Between,
            _ => return None,
        })
    }
}

/// Condition on a single field.
#[derive(Debug, Clone)]
pub struct FieldCond {
    pub field: String,
    pub lookup: Lookup,
    pub value: Operand,
}

impl FieldCond {
    pub fn new(field: impl Into<String>, lookup: Lookup, value: impl Into<Operand>) -> Self {
        Self {
            field: field.into(),
            lookup,
            value: value.into(),
        }
    }

    /// Split `name__lookup`. When the suffix is not a lookup the whole key is the
    /// field name, compared with equality.
    pub fn from_key(key: &str, value: impl Into<Operand>) -> Self {
        if let Some((field, suffix)) = key.rsplit_once("__")
            && let Some(lookup) = Lookup::from_suffix(suffix)
        {
            return Self::new(field, lookup, value);
        }
        Self::new(key, Lookup::Eq, value)
    }

    pub fn to_sql(&self, schema: &Schema) -> Result<String> {
        let field = schema.require_field(&self.field)?;
        let name = &self.field;
        Ok(match self.lookup {
            Lookup::Eq | Lookup::Ne | Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte => {
                comparison_sql(field, name, self.lookup, &self.value)?
            }
            Lookup::Contains
            | Lookup::StartsWith
            | Lookup::EndsWith
            | Lookup::IContains
            | Lookup::IStartsWith
            | Lookup::IEndsWith => like_sql(field, name, self.lookup, &self.value)?,
            Lookup::In => in_sql(field, name, &self.value)?,
            Lookup::NotIn => format!("NOT ({})", in_sql(field, name, &self.value)?),
            Lookup::IExact => format!(
                "lowerUTF8({name}) = lowerUTF8({})",
                operand_sql(field, &self.value)?
            ),
            Lookup::Between => between_sql(field, name, &self.value)?,
        })
    }
}

fn comparison_sql(field: &Field, name: &str, lookup: Lookup, operand: &Operand) -> Result<String> {
    let (op, null_op) = match lookup {
        Lookup::Eq => ("=", Some("IS NULL")),
        Lookup::Ne => ("!=", Some("IS NOT NULL")),
        Lookup::Gt => (">", None),
        Lookup::Gte => (">=", None),
        Lookup::Lt => ("<", None),
        _ => ("<=", None),
    };
    if let (Some(null_op), Operand::Value(Value::Null)) = (null_op, operand) {
        return Ok(format!("{name} {null_op}"));
    }
    Ok(format!("{name} {op} {}", operand_sql(field, operand)?))
}

/// Pattern lookups. Wildcards in the value are escaped so they match literally.
fn like_sql(field: &Field, name: &str, lookup: Lookup, operand: &Operand) -> Result<String> {
    let (prefix, suffix) = match lookup {
        Lookup::Contains | Lookup::IContains => ("%", "%"),
        Lookup::StartsWith | Lookup::IStartsWith => ("", "%"),
        _ => ("%", ""),
    };
    let value = match operand {
        Operand::Value(v) => {
            let v = field.field_type.convert(&field.name, v.clone(), UtcOffset::UTC)?;
            field.to_db_string(&v, false)
        }
        Operand::Raw(v) => v.clone(),
        v => {
            return Err(OrmError::query_state(format!(
                "Lookup on `{name}` requires a literal pattern, found {v:?}"
            ))
            .into());
        }
    };
    let value = value
        .replace('\\', "\\\\")
        .replace('%', "\\\\%")
        .replace('_', "\\\\_");
    Ok(match lookup {
        Lookup::Contains | Lookup::StartsWith | Lookup::EndsWith => {
            format!("{name} LIKE '{prefix}{value}{suffix}'")
        }
        _ => format!("lowerUTF8({name}) LIKE lowerUTF8('{prefix}{value}{suffix}')"),
    })
}

fn value_sql(field: &Field, value: &Value) -> Result<String> {
    let value = field
        .field_type
        .convert(&field.name, value.clone(), UtcOffset::UTC)?;
    Ok(field.to_db_string(&value, true))
}

fn operand_sql(field: &Field, operand: &Operand) -> Result<String> {
    Ok(match operand {
        Operand::Value(v) => value_sql(field, v)?,
        Operand::Expr(v) => v.to_sql(),
        Operand::SubQuery(v) => format!("({})", v.subquery_sql()?),
        Operand::Raw(v) => v.clone(),
    })
}

fn in_sql(field: &Field, name: &str, operand: &Operand) -> Result<String> {
    let list = match operand {
        Operand::Value(Value::Array(items) | Value::Tuple(items)) => {
            let mut out = String::new();
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&value_sql(field, item)?);
            }
            out
        }
        Operand::Value(v) => value_sql(field, v)?,
        Operand::Expr(v) => v.to_sql(),
        Operand::SubQuery(v) => v.subquery_sql()?,
        Operand::Raw(v) => v.clone(),
    };
    Ok(format!("{name} IN ({list})"))
}

fn between_sql(field: &Field, name: &str, operand: &Operand) -> Result<String> {
    let Operand::Value(Value::Tuple(bounds) | Value::Array(bounds)) = operand else {
        return Err(OrmError::query_state(format!(
            "Lookup `between` on `{name}` requires a pair of bounds"
        ))
        .into());
    };
    let [low, high] = bounds.as_slice() else {
        return Err(OrmError::query_state(format!(
            "Lookup `between` on `{name}` requires exactly two bounds, found {}",
            bounds.len()
        ))
        .into());
    };
    let bound = |v: &Value| -> Result<Option<String>> {
        match v {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            v => value_sql(field, v).map(Some),
        }
    };
    Ok(match (bound(low)?, bound(high)?) {
        (Some(low), Some(high)) => format!("{name} BETWEEN {low} AND {high}"),
        (Some(low), None) => format!("{name} >= {low}"),
        (None, Some(high)) => format!("{name} <= {high}"),
        (None, None) => {
            return Err(OrmError::query_state(format!(
                "Lookup `between` on `{name}` requires at least one bound"
            ))
            .into());
        }
    })
}

#[derive(Debug, Clone)]
pub enum Cond {
    Field(FieldCond),
    Expr(F),
}

impl Cond {
    pub fn to_sql(&self, schema: &Schema) -> Result<String> {
        match self {
            Cond::Field(v) => v.to_sql(schema),
            Cond::Expr(v) => Ok(v.to_sql()),
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    And,
    Or,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::And => "AND",
            Mode::Or => "OR",
        })
    }
}

/// Tree of conditions combined with `&`, `|` and `!`.
///
/// ```ignore
/// let q = Q::kw("first_name", "Ciccio") | (Q::kw("height__gt", 1.8) & !Q::kw("last_name__startswith", "B"));
/// ```
#[derive(Default, Debug, Clone)]
pub struct Q {
    conds: Vec<Cond>,
    children: Vec<Q>,
    mode: Mode,
    negate: bool,
}

impl Q {
    /// Empty condition, matches every row.
    pub fn new() -> Self {
        Default::default()
    }

    /// Keyword lookup, `key` is `field` or `field__lookup`.
    pub fn kw(key: &str, value: impl Into<Operand>) -> Self {
        Self::kws([(key, value.into())])
    }

    /// Several keyword lookups, all of them must hold.
    pub fn kws<'a>(lookups: impl IntoIterator<Item = (&'a str, Operand)>) -> Self {
        Self {
            conds: lookups
                .into_iter()
                .map(|(k, v)| Cond::Field(FieldCond::from_key(k, v)))
                .collect(),
            ..Default::default()
        }
    }

    pub fn field(field: impl Into<String>, lookup: Lookup, value: impl Into<Operand>) -> Self {
        Self {
            conds: vec![Cond::Field(FieldCond::new(field, lookup, value))],
            ..Default::default()
        }
    }

    pub fn expr(expression: F) -> Self {
        Self {
            conds: vec![Cond::Expr(expression)],
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conds.is_empty() && self.children.iter().all(Q::is_empty)
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn construct_from(lhs: Q, rhs: Q, mode: Mode) -> Q {
        if lhs.mode == mode && !lhs.negate {
            let mut q = lhs;
            q.children.push(rhs);
            q
        } else if rhs.mode == mode && !rhs.negate {
            let mut q = rhs;
            q.children.push(lhs);
            q
        } else {
            Q {
                children: vec![lhs, rhs],
                mode,
                ..Default::default()
            }
        }
    }

    pub fn to_sql(&self, schema: &Schema) -> Result<String> {
        let mut parts = Vec::with_capacity(self.conds.len() + self.children.len());
        for cond in &self.conds {
            parts.push(cond.to_sql(schema)?);
        }
        for child in &self.children {
            if !child.is_empty() {
                parts.push(child.to_sql(schema)?);
            }
        }
        let sql = match parts.len() {
            0 => "1".to_string(),
            1 => parts.pop().unwrap_or_default(),
            _ => format!("({})", parts.join(&format!(") {} (", self.mode))),
        };
        Ok(if self.negate {
            format!("NOT ({sql})")
        } else {
            sql
        })
    }
}

impl From<F> for Q {
    fn from(value: F) -> Self {
        Q::expr(value)
    }
}

impl From<&F> for Q {
    fn from(value: &F) -> Self {
        Q::expr(value.clone())
    }
}

impl From<FieldCond> for Q {
    fn from(value: FieldCond) -> Self {
        Self {
            conds: vec![Cond::Field(value)],
            ..Default::default()
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Q;
    fn bitand(self, rhs: Q) -> Q {
        Q::construct_from(self, rhs, Mode::And)
    }
}

impl ops::BitOr for Q {
    type Output = Q;
    fn bitor(self, rhs: Q) -> Q {
        Q::construct_from(self, rhs, Mode::Or)
    }
}

impl ops::Not for Q {
    type Output = Q;
    fn not(mut self) -> Q {
        self.negate = !self.negate;
        self
    }
}

/// Keyword lookups combined with AND: `q!(first_name = "Ciccio", height__gt = 1.8)`.
#[macro_export]
macro_rules! q {
    () => {
        $crate::Q::new()
    };
    ($($key:ident = $value:expr),+ $(,)?) => {
        $crate::Q::kws([$((stringify!($key), $crate::Operand::from($value))),+])
    };
}
