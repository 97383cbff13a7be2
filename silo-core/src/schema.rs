use crate::{
    DdlContext, Engine, Field, FieldType, OrmError, Result, Value,
};
use std::{fmt::Write, sync::Arc};

/// Role of the table behind a model.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    #[default]
    Ordinary,
    Buffer,
    Distributed,
    Merge,
    /// Session table, lives as long as the session and is never qualified by database.
    Temporary,
    /// Table of the `system` database, read-only.
    System,
}

/// Name of the virtual column that Merge tables expose with the source table name.
pub const MERGE_TABLE_COLUMN: &str = "_table";

/// Description of a model: table, ordered fields and engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    table: String,
    fields: Vec<Field>,
    engine: Option<Engine>,
    kind: TableKind,
    readonly: bool,
    bases: Vec<Arc<Schema>>,
    ad_hoc: bool,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            table: None,
            fields: Vec::new(),
            engine: None,
            kind: None,
            readonly: false,
            bases: Vec::new(),
            ad_hoc: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn bases(&self) -> &[Arc<Schema>] {
        &self.bases
    }

    pub fn is_ad_hoc(&self) -> bool {
        self.ad_hoc
    }

    pub fn is_system(&self) -> bool {
        self.kind == TableKind::System
    }

    pub fn is_temporary(&self) -> bool {
        self.kind == TableKind::Temporary
    }

    /// Rows cannot be inserted into read-only and system models.
    pub fn is_readonly(&self) -> bool {
        self.readonly || self.is_system()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|v| v.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|v| v.name == name)
    }

    /// Like [`Schema::field`] but a missing name is an error.
    pub fn require_field(&self, name: &str) -> Result<&Field> {
        self.field(name).ok_or_else(|| {
            OrmError::UnknownField {
                model: self.name.clone(),
                field: name.into(),
            }
            .into()
        })
    }

    /// Fields sent on insert.
    pub fn writable_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|v| !v.is_readonly())
    }

    /// When some default is an expression the server must compute the missing
    /// columns, so inserts use a format that can omit them.
    pub fn has_expression_defaults(&self) -> bool {
        self.fields.iter().any(Field::has_expression_default)
    }

    /// Table name as it appears in queries.
    pub fn qualified_table(&self, context: &DdlContext) -> String {
        match self.kind {
            TableKind::System => format!("`system`.`{}`", self.table),
            TableKind::Temporary => format!("`{}`", self.table),
            _ => format!("`{}`.`{}`", context.db_name, self.table),
        }
    }

    pub fn create_table_sql(&self, context: &DdlContext) -> Result<String> {
        if self.is_system() {
            return Err(OrmError::Database(format!(
                "Cannot create system table `{}`",
                self.table
            ))
            .into());
        }
        let engine = self.engine.as_ref().ok_or_else(|| {
            OrmError::schema(format!("Model `{}` has no engine", self.name))
        })?;
        let mut out = String::with_capacity(256);
        let main = match engine {
            Engine::Buffer(buffer) => Some(buffer.main.table().to_owned()),
            Engine::Distributed(distributed) => Some(distributed.table.clone().ok_or_else(|| {
                OrmError::schema(format!(
                    "Model `{}`: Distributed engine without an underlying table",
                    self.name
                ))
            })?),
            _ => None,
        };
        match main {
            _ if self.is_temporary() => {
                let _ = write!(out, "CREATE TEMPORARY TABLE IF NOT EXISTS `{}` (\n", self.table);
                self.write_columns(&mut out, context);
                out.push_str("\n)\nENGINE = Memory");
                return Ok(out);
            }
            Some(main) => {
                let _ = write!(
                    out,
                    "CREATE TABLE IF NOT EXISTS `{db}`.`{}` AS `{db}`.`{main}`",
                    self.table,
                    db = context.db_name,
                );
            }
            None => {
                let _ = write!(
                    out,
                    "CREATE TABLE IF NOT EXISTS `{}`.`{}` (\n",
                    context.db_name, self.table
                );
                self.write_columns(&mut out, context);
                out.push_str("\n)");
            }
        }
        out.push_str("\nENGINE = ");
        out.push_str(&engine.create_table_sql(context)?);
        Ok(out)
    }

    fn write_columns(&self, out: &mut String, context: &DdlContext) {
        let mut first = true;
        for field in &self.fields {
            if self.kind == TableKind::Merge && field.name == MERGE_TABLE_COLUMN {
                continue;
            }
            if !first {
                out.push_str(",\n");
            }
            first = false;
            let _ = write!(out, "    `{}` {}", field.name, field.column_sql(context, true));
        }
    }

    pub fn drop_table_sql(&self, context: &DdlContext) -> Result<String> {
        if self.is_system() {
            return Err(OrmError::Database(format!(
                "Cannot drop system table `{}`",
                self.table
            ))
            .into());
        }
        Ok(format!("DROP TABLE IF EXISTS {}", self.qualified_table(context)))
    }
}

/// Collects the parts of a [`Schema`], validated by [`SchemaBuilder::build`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    table: Option<String>,
    fields: Vec<Field>,
    engine: Option<Engine>,
    kind: Option<TableKind>,
    readonly: bool,
    bases: Vec<Arc<Schema>>,
    ad_hoc: bool,
}

impl SchemaBuilder {
    /// Table name, the lower case model name when not set.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn engine(mut self, engine: impl Into<Engine>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn kind(mut self, kind: TableKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn temporary(self) -> Self {
        self.kind(TableKind::Temporary)
    }

    pub fn system(self) -> Self {
        self.kind(TableKind::System)
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Inherit the fields (and the engine, unless set) of `base`. Own fields
    /// with the same name replace the inherited ones.
    pub fn extends(mut self, base: Arc<Schema>) -> Self {
        self.bases.push(base);
        self
    }

    pub fn ad_hoc(mut self) -> Self {
        self.ad_hoc = true;
        self
    }

    pub fn build(self) -> Result<Arc<Schema>> {
        let SchemaBuilder {
            name,
            table,
            fields: own_fields,
            mut engine,
            kind,
            readonly,
            bases,
            ad_hoc,
        } = self;
        if let Some(duplicate) = own_fields
            .iter()
            .enumerate()
            .find(|(i, v)| own_fields[..*i].iter().any(|other| other.name == v.name))
        {
            return Err(OrmError::schema(format!(
                "Model `{name}` declares field `{}` twice",
                duplicate.1.name
            ))
            .into());
        }
        let mut fields: Vec<Field> = Vec::new();
        for field in bases
            .iter()
            .flat_map(|v| v.fields.iter())
            .filter(|v| !(v.name == MERGE_TABLE_COLUMN && v.is_readonly()))
            .chain(own_fields.iter())
        {
            match fields.iter_mut().find(|v| v.name == field.name) {
                Some(existing) => *existing = field.clone(),
                None => fields.push(field.clone()),
            }
        }
        if engine.is_none() {
            engine = bases.iter().rev().find_map(|v| v.engine.clone());
        }
        let engine_kind = engine.as_ref().map(Engine::table_kind);
        let kind = match (kind, engine_kind) {
            (Some(kind @ (TableKind::Temporary | TableKind::System)), _) => kind,
            (Some(kind), Some(implied)) if kind != implied => {
                return Err(OrmError::schema(format!(
                    "Model `{name}`: {kind:?} table cannot use the {implied:?} engine family"
                ))
                .into());
            }
            (Some(kind), _) => kind,
            (None, Some(implied)) => implied,
            (None, None) => TableKind::Ordinary,
        };
        for field in &mut fields {
            field.check().map_err(|e| e.context(format!("Model `{name}`")))?;
            if field.name.is_empty() {
                return Err(OrmError::schema(format!("Model `{name}` has a field without name")).into());
            }
        }
        match (&engine, kind, ad_hoc) {
            (None, TableKind::System, _) | (None, _, true) => {}
            (None, _, false) => {
                return Err(OrmError::schema(format!("Model `{name}` has no engine")).into());
            }
            (Some(Engine::Memory), TableKind::Temporary, _) => {}
            (Some(_), TableKind::Temporary, _) => {
                return Err(OrmError::schema(format!(
                    "Temporary model `{name}` requires the Memory engine"
                ))
                .into());
            }
            (Some(engine), ..) => engine.check().map_err(|e| e.context(format!("Model `{name}`")))?,
        }
        if kind == TableKind::Merge && !fields.iter().any(|v| v.name == MERGE_TABLE_COLUMN) {
            fields.push(Field::new(MERGE_TABLE_COLUMN, FieldType::String).readonly());
        }
        if let Some(Engine::Distributed(distributed)) = &mut engine
            && distributed.table.is_none()
        {
            let storage: Vec<_> = bases
                .iter()
                .filter(|v| v.kind != TableKind::Distributed)
                .collect();
            match storage.as_slice() {
                [base] => distributed.table = Some(base.table.clone()),
                [] => {
                    return Err(OrmError::schema(format!(
                        "Distributed model `{name}` without table requires a base model to take it from"
                    ))
                    .into());
                }
                _ => {
                    return Err(OrmError::schema(format!(
                        "Distributed model `{name}` without table must have exactly one non distributed base"
                    ))
                    .into());
                }
            }
        }
        let table = table.unwrap_or_else(|| name.to_lowercase());
        Ok(Arc::new(Schema {
            name,
            table,
            fields,
            engine,
            kind,
            readonly,
            bases,
            ad_hoc,
        }))
    }
}

/// Schema for query results that do not correspond to a declared model, built
/// from the column names and server types.
pub fn create_ad_hoc_schema<N: AsRef<str>, T: AsRef<str>>(
    name: &str,
    columns: impl IntoIterator<Item = (N, T)>,
) -> Result<Arc<Schema>> {
    let mut builder = Schema::builder(name).ad_hoc();
    for (column, db_type) in columns {
        let field_type = FieldType::parse(db_type.as_ref())?;
        let field = Field::new(column.as_ref(), field_type);
        builder = builder.field(field);
    }
    builder.build()
}

impl Schema {
    /// Values of a new record: literal defaults or the type default, `None`
    /// where the server computes the column.
    pub(crate) fn initial_values(&self) -> Vec<Option<Value>> {
        self.fields.iter().map(Field::initial_value).collect()
    }
}
