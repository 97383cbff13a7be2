use crate::{Field, OrmError, Result, Schema, Value};
use std::{collections::BTreeMap, fmt::Write, sync::Arc};
use time::UtcOffset;

static NULL: Value = Value::Null;

/// Dynamic model instance: one value per schema field, in field order.
///
/// A value is `None` when the server computes it (expression defaults of a
/// record not read back from the database).
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// New record with the default value of each field.
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = schema.initial_values();
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Current value of a field, `Null` when the server computes it.
    pub fn get(&self, name: &str) -> Result<&Value> {
        let index = self.index(name)?;
        Ok(self.values[index].as_ref().unwrap_or(&NULL))
    }

    pub fn is_set(&self, name: &str) -> Result<bool> {
        Ok(self.values[self.index(name)?].is_some())
    }

    /// Coerce `value` through the field and store it, the record is unchanged on error.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.set_with_timezone(name, value.into(), UtcOffset::UTC)
    }

    /// Same as [`Record::set`], naive date times are read in `tz`.
    pub fn set_with_timezone(&mut self, name: &str, value: Value, tz: UtcOffset) -> Result<()> {
        let index = self.index(name)?;
        let value = self.schema.fields()[index].to_value(value, tz)?;
        self.values[index] = Some(value);
        Ok(())
    }

    /// Builder flavor of [`Record::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.schema.field_index(name).ok_or_else(|| {
            OrmError::UnknownField {
                model: self.schema.name().into(),
                field: name.into(),
            }
            .into()
        })
    }

    /// Pairs of field name and value, in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.name.as_str(), v.as_ref().unwrap_or(&NULL)))
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.iter().map(|(k, v)| (k.to_owned(), v.clone())).collect()
    }

    /// Decode one line of `TabSeparated` output, `names` are the columns in the line.
    pub fn from_tsv(
        schema: Arc<Schema>,
        line: &str,
        names: &[impl AsRef<str>],
        tz: UtcOffset,
    ) -> Result<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut record = Record::new(schema);
        let mut cells = line.split('\t');
        for name in names {
            let name = name.as_ref();
            let Some(cell) = cells.next() else {
                return Err(OrmError::conversion(
                    name,
                    line,
                    format!("expected {} columns", names.len()),
                )
                .into());
            };
            let index = record.index(name)?;
            let field = &record.schema.fields()[index];
            let value = field
                .field_type
                .from_wire(cell, tz)
                .map_err(|e| e.context(format!("Column `{name}`")))?;
            record.values[index] = Some(value);
        }
        Ok(record)
    }

    /// Writable values in `TabSeparated` format.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for (i, (field, value)) in self.writable().enumerate() {
            if i > 0 {
                out.push('\t');
            }
            match value {
                Some(value) => out.push_str(&field.field_type.to_wire(value)),
                None => out.push_str(&field.field_type.to_wire(&field.field_type.default_value())),
            }
        }
        out
    }

    /// Writable values in `TSKV` format, values computed by the server are left out.
    pub fn to_tskv(&self) -> String {
        let mut out = String::new();
        for (field, value) in self.writable() {
            let Some(value) = value else {
                continue;
            };
            if !out.is_empty() {
                out.push('\t');
            }
            let _ = write!(out, "{}={}", field.name, field.field_type.to_wire(value));
        }
        out
    }

    fn writable(&self) -> impl Iterator<Item = (&Field, Option<&Value>)> {
        self.schema
            .fields()
            .iter()
            .zip(self.values.iter())
            .filter(|(f, _)| !f.is_readonly())
            .map(|(f, v)| (f, v.as_ref()))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema == other.schema)
            && self.values == other.values
    }
}
