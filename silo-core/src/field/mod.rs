mod convert;
mod field_type;
mod render;

pub(crate) use convert::parse_date_time;
pub use field_type::*;
pub(crate) use render::write_value;

use crate::{Arg, DdlContext, F, OrmError, Result, Value};
use time::UtcOffset;

/// How the server fills a column that is not given explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// Literal value, also used for new records.
    Value(Value),
    /// Expression evaluated by the server, new records leave the column unset.
    Expression(Arg),
}

/// Descriptor of a single column: its name, type and modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub default: Option<ColumnDefault>,
    pub alias: Option<Arg>,
    pub materialized: Option<Arg>,
    pub codec: Option<String>,
    pub readonly: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
            alias: None,
            materialized: None,
            codec: None,
            readonly: false,
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(ColumnDefault::Value(value.into()));
        self
    }

    pub fn default_expr(mut self, expression: F) -> Self {
        self.default = Some(ColumnDefault::Expression(expression.into()));
        self
    }

    pub fn default_sql(mut self, sql: impl Into<String>) -> Self {
        self.default = Some(ColumnDefault::Expression(Arg::Raw(sql.into())));
        self
    }

    pub fn alias(mut self, expression: F) -> Self {
        self.alias = Some(expression.into());
        self
    }

    pub fn alias_sql(mut self, sql: impl Into<String>) -> Self {
        self.alias = Some(Arg::Raw(sql.into()));
        self
    }

    pub fn materialized(mut self, expression: F) -> Self {
        self.materialized = Some(expression.into());
        self
    }

    pub fn materialized_sql(mut self, sql: impl Into<String>) -> Self {
        self.materialized = Some(Arg::Raw(sql.into()));
        self
    }

    pub fn codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Computed by the server: never sent on insert.
    pub fn is_readonly(&self) -> bool {
        self.readonly || self.alias.is_some() || self.materialized.is_some()
    }

    pub fn has_expression_default(&self) -> bool {
        matches!(self.default, Some(ColumnDefault::Expression(..)))
    }

    /// Value given to a new record, `None` when the server computes it.
    pub fn initial_value(&self) -> Option<Value> {
        match &self.default {
            Some(ColumnDefault::Value(v)) => Some(v.clone()),
            Some(ColumnDefault::Expression(..)) => None,
            None => Some(self.field_type.default_value()),
        }
    }

    /// Verify the declaration and normalize the default value through the field type.
    pub(crate) fn check(&mut self) -> Result<()> {
        self.field_type.check()?;
        let modifiers = [
            self.default.is_some(),
            self.alias.is_some(),
            self.materialized.is_some(),
        ];
        if modifiers.iter().filter(|v| **v).count() > 1 {
            return Err(OrmError::schema(format!(
                "Field `{}`: only one of default, alias and materialized can be set",
                self.name
            ))
            .into());
        }
        if let Some(ColumnDefault::Value(v)) = &self.default {
            let v = self.to_value(v.clone(), UtcOffset::UTC)?;
            self.default = Some(ColumnDefault::Value(v));
        }
        Ok(())
    }

    /// Convert a raw value, errors mention this field.
    pub fn to_value(&self, raw: Value, tz: UtcOffset) -> Result<Value> {
        let value = self.field_type.convert(&self.name, raw, tz)?;
        self.validate(&value)?;
        Ok(value)
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        self.field_type.check_value(&self.name, value)
    }

    pub fn to_db_string(&self, value: &Value, quote: bool) -> String {
        self.field_type.to_db_string(value, quote)
    }

    /// Type and modifiers of the column declaration, `with_default` adds the
    /// DEFAULT/ALIAS/MATERIALIZED clause and the codec.
    pub fn column_sql(&self, context: &DdlContext, with_default: bool) -> String {
        let mut out = String::new();
        let low_cardinality = context.has_low_cardinality_support();
        if !low_cardinality && contains_low_cardinality(&self.field_type) {
            log::warn!(
                "LowCardinality is not supported by server version {}, column `{}` uses the inner type",
                context.server_version,
                self.name
            );
        }
        self.field_type.write_db_type(&mut out, low_cardinality);
        if !with_default {
            return out;
        }
        if let Some(alias) = &self.alias {
            out.push_str(" ALIAS ");
            alias.write_sql(&mut out);
        } else if let Some(materialized) = &self.materialized {
            out.push_str(" MATERIALIZED ");
            materialized.write_sql(&mut out);
        } else {
            match &self.default {
                Some(ColumnDefault::Expression(expression)) => {
                    out.push_str(" DEFAULT ");
                    expression.write_sql(&mut out);
                }
                Some(ColumnDefault::Value(Value::Null)) => {}
                Some(ColumnDefault::Value(v)) => {
                    out.push_str(" DEFAULT ");
                    out.push_str(&self.to_db_string(v, true));
                }
                None => match self.field_type.default_value() {
                    Value::Null => {}
                    v => {
                        out.push_str(" DEFAULT ");
                        out.push_str(&self.to_db_string(&v, true));
                    }
                },
            }
        }
        if let Some(codec) = &self.codec {
            if context.has_codec_support() {
                out.push_str(" CODEC(");
                out.push_str(codec);
                out.push(')');
            } else {
                log::warn!(
                    "CODEC is not supported by server version {}, ignored on column `{}`",
                    context.server_version,
                    self.name
                );
            }
        }
        out
    }
}

fn contains_low_cardinality(field_type: &FieldType) -> bool {
    match field_type {
        FieldType::LowCardinality(..) => true,
        FieldType::Array(inner) | FieldType::Nullable(inner) => contains_low_cardinality(inner),
        FieldType::Map(k, v) => contains_low_cardinality(k) || contains_low_cardinality(v),
        FieldType::Tuple(items) => items.iter().any(contains_low_cardinality),
        _ => false,
    }
}
