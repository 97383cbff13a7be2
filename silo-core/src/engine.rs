use crate::{DdlContext, OrmError, Result, Schema, TableKind, comma_join};
use std::{fmt::Write, sync::Arc};

/// Table engine of a model, rendered after `ENGINE = ` in the table definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Engine {
    TinyLog,
    Log,
    Memory,
    MergeTree(MergeTree),
    Buffer(Buffer),
    Merge(Merge),
    Distributed(Distributed),
}

impl Engine {
    /// Table kind implied by the engine.
    pub fn table_kind(&self) -> TableKind {
        match self {
            Engine::Buffer(..) => TableKind::Buffer,
            Engine::Merge(..) => TableKind::Merge,
            Engine::Distributed(..) => TableKind::Distributed,
            _ => TableKind::Ordinary,
        }
    }

    /// `FINAL` is meaningful only for engines that collapse or replace rows.
    pub fn supports_final(&self) -> bool {
        matches!(
            self,
            Engine::MergeTree(MergeTree {
                variant: MergeTreeVariant::Collapsing { .. } | MergeTreeVariant::Replacing { .. },
                ..
            })
        )
    }

    pub(crate) fn check(&self) -> Result<()> {
        match self {
            Engine::MergeTree(v) => v.check(),
            Engine::Merge(v) if v.table_regex.is_empty() => {
                Err(OrmError::schema("Merge engine requires a table regex").into())
            }
            Engine::Distributed(v) if v.cluster.is_empty() => {
                Err(OrmError::schema("Distributed engine requires a cluster name").into())
            }
            _ => Ok(()),
        }
    }

    pub fn create_table_sql(&self, context: &DdlContext) -> Result<String> {
        Ok(match self {
            Engine::TinyLog => "TinyLog".into(),
            Engine::Log => "Log".into(),
            Engine::Memory => "Memory".into(),
            Engine::MergeTree(v) => v.create_table_sql(context)?,
            Engine::Buffer(v) => v.create_table_sql(context),
            Engine::Merge(v) => format!("Merge(`{}`, '{}')", context.db_name, v.table_regex),
            Engine::Distributed(v) => v.create_table_sql(context)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeTreeVariant {
    Plain,
    Collapsing { sign_col: String },
    Summing { columns: Vec<String> },
    Replacing { version_col: Option<String> },
}

impl MergeTreeVariant {
    fn name(&self) -> &'static str {
        match self {
            MergeTreeVariant::Plain => "MergeTree",
            MergeTreeVariant::Collapsing { .. } => "CollapsingMergeTree",
            MergeTreeVariant::Summing { .. } => "SummingMergeTree",
            MergeTreeVariant::Replacing { .. } => "ReplacingMergeTree",
        }
    }
}

/// MergeTree family engine.
///
/// Key expressions are SQL text: column names or rendered expressions
/// (anything implementing `ToString`, `F` included).
#[derive(Debug, Clone, PartialEq)]
pub struct MergeTree {
    pub variant: MergeTreeVariant,
    pub date_col: Option<String>,
    pub partition_key: Vec<String>,
    pub order_by: Vec<String>,
    pub primary_key: Vec<String>,
    pub sampling_expr: Option<String>,
    pub index_granularity: u32,
    /// Zookeeper path and replica name.
    pub replication: Option<(String, String)>,
}

impl Default for MergeTree {
    fn default() -> Self {
        Self {
            variant: MergeTreeVariant::Plain,
            date_col: None,
            partition_key: Vec::new(),
            order_by: Vec::new(),
            primary_key: Vec::new(),
            sampling_expr: None,
            index_granularity: 8192,
            replication: None,
        }
    }
}

fn to_strings(items: impl IntoIterator<Item = impl ToString>) -> Vec<String> {
    items.into_iter().map(|v| v.to_string()).collect()
}

impl MergeTree {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn collapsing(sign_col: impl Into<String>) -> Self {
        Self {
            variant: MergeTreeVariant::Collapsing {
                sign_col: sign_col.into(),
            },
            ..Default::default()
        }
    }

    /// Columns to sum, empty sums every numeric column outside the sorting key.
    pub fn summing(columns: impl IntoIterator<Item = impl ToString>) -> Self {
        Self {
            variant: MergeTreeVariant::Summing {
                columns: to_strings(columns),
            },
            ..Default::default()
        }
    }

    pub fn replacing(version_col: Option<&str>) -> Self {
        Self {
            variant: MergeTreeVariant::Replacing {
                version_col: version_col.map(Into::into),
            },
            ..Default::default()
        }
    }

    pub fn date_col(mut self, date_col: impl Into<String>) -> Self {
        self.date_col = Some(date_col.into());
        self
    }

    pub fn partition_key(mut self, key: impl IntoIterator<Item = impl ToString>) -> Self {
        self.partition_key = to_strings(key);
        self
    }

    pub fn order_by(mut self, key: impl IntoIterator<Item = impl ToString>) -> Self {
        self.order_by = to_strings(key);
        self
    }

    pub fn primary_key(mut self, key: impl IntoIterator<Item = impl ToString>) -> Self {
        self.primary_key = to_strings(key);
        self
    }

    pub fn sampling_expr(mut self, expression: impl ToString) -> Self {
        self.sampling_expr = Some(expression.to_string());
        self
    }

    pub fn index_granularity(mut self, index_granularity: u32) -> Self {
        self.index_granularity = index_granularity;
        self
    }

    pub fn replicated(mut self, zookeeper_path: impl Into<String>, replica_name: impl Into<String>) -> Self {
        self.replication = Some((zookeeper_path.into(), replica_name.into()));
        self
    }

    fn check(&self) -> Result<()> {
        if self.date_col.is_none() && self.partition_key.is_empty() {
            return Err(OrmError::schema(format!(
                "{} engine requires either date_col or partition_key",
                self.variant.name()
            ))
            .into());
        }
        if let Some((path, name)) = &self.replication
            && (path.is_empty() || name.is_empty())
        {
            return Err(OrmError::schema(
                "Replicated engine requires both the zookeeper path and the replica name",
            )
            .into());
        }
        Ok(())
    }

    /// Partitioning key, by month of the date column when not given.
    pub fn effective_partition_key(&self) -> Vec<String> {
        match (&self.date_col, self.partition_key.is_empty()) {
            (Some(date_col), true) => vec![format!("toYYYYMM(`{date_col}`)")],
            _ => self.partition_key.clone(),
        }
    }

    fn create_table_sql(&self, context: &DdlContext) -> Result<String> {
        let mut out = String::new();
        if self.replication.is_some() {
            out.push_str("Replicated");
        }
        out.push_str(self.variant.name());
        out.push('(');
        let mut params = Vec::new();
        if let Some((path, name)) = &self.replication {
            params.push(format!("'{path}'"));
            params.push(format!("'{name}'"));
        }
        let legacy = !context.has_partition_key_support();
        if legacy {
            let Some(date_col) = &self.date_col else {
                return Err(OrmError::schema(format!(
                    "Server version {} does not support custom partitioning, {} requires date_col",
                    context.server_version,
                    self.variant.name()
                ))
                .into());
            };
            params.push(date_col.clone());
            if let Some(sampling_expr) = &self.sampling_expr {
                params.push(sampling_expr.clone());
            }
            params.push(format!("({})", comma_join(&self.order_by)));
            params.push(self.index_granularity.to_string());
        }
        match &self.variant {
            MergeTreeVariant::Plain => {}
            MergeTreeVariant::Collapsing { sign_col } => params.push(sign_col.clone()),
            MergeTreeVariant::Summing { columns } => {
                if !columns.is_empty() {
                    params.push(format!("({})", comma_join(columns)));
                }
            }
            MergeTreeVariant::Replacing { version_col } => params.extend(version_col.clone()),
        }
        out.push_str(&comma_join(&params));
        out.push(')');
        if legacy {
            return Ok(out);
        }
        let _ = write!(
            out,
            " PARTITION BY ({}) ORDER BY ({})",
            comma_join(&self.effective_partition_key()),
            comma_join(&self.order_by)
        );
        if !self.primary_key.is_empty() {
            let _ = write!(out, " PRIMARY KEY ({})", comma_join(&self.primary_key));
        }
        if let Some(sampling_expr) = &self.sampling_expr {
            let _ = write!(out, " SAMPLE BY {sampling_expr}");
        }
        let _ = write!(out, " SETTINGS index_granularity={}", self.index_granularity);
        Ok(out)
    }
}

impl From<MergeTree> for Engine {
    fn from(value: MergeTree) -> Self {
        Engine::MergeTree(value)
    }
}

/// Buffers writes in memory and flushes them to the main table.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub main: Arc<Schema>,
    pub num_layers: u32,
    pub min_time: u32,
    pub max_time: u32,
    pub min_rows: u64,
    pub max_rows: u64,
    pub min_bytes: u64,
    pub max_bytes: u64,
}

impl Buffer {
    pub fn new(main: Arc<Schema>) -> Self {
        Self {
            main,
            num_layers: 16,
            min_time: 10,
            max_time: 100,
            min_rows: 10_000,
            max_rows: 1_000_000,
            min_bytes: 10_000_000,
            max_bytes: 100_000_000,
        }
    }

    fn create_table_sql(&self, context: &DdlContext) -> String {
        format!(
            "Buffer(`{}`, `{}`, {}, {}, {}, {}, {}, {}, {})",
            context.db_name,
            self.main.table(),
            self.num_layers,
            self.min_time,
            self.max_time,
            self.min_rows,
            self.max_rows,
            self.min_bytes,
            self.max_bytes
        )
    }
}

impl From<Buffer> for Engine {
    fn from(value: Buffer) -> Self {
        Engine::Buffer(value)
    }
}

/// Read-only union of the tables whose name matches the regex.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub table_regex: String,
}

impl Merge {
    pub fn new(table_regex: impl Into<String>) -> Self {
        Self {
            table_regex: table_regex.into(),
        }
    }
}

impl From<Merge> for Engine {
    fn from(value: Merge) -> Self {
        Engine::Merge(value)
    }
}

/// Spreads a table over the shards of a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Distributed {
    pub cluster: String,
    /// Underlying local table, resolved from the model bases when missing.
    pub table: Option<String>,
    pub sharding_key: Option<String>,
}

impl Distributed {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            table: None,
            sharding_key: None,
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn sharding_key(mut self, sharding_key: impl ToString) -> Self {
        self.sharding_key = Some(sharding_key.to_string());
        self
    }

    fn create_table_sql(&self, context: &DdlContext) -> Result<String> {
        let Some(table) = &self.table else {
            return Err(OrmError::schema(
                "Cannot create Distributed engine: specify an underlying table",
            )
            .into());
        };
        let mut out = format!(
            "Distributed(`{}`, `{}`, `{}`",
            self.cluster, context.db_name, table
        );
        if let Some(sharding_key) = &self.sharding_key {
            out.push_str(", ");
            out.push_str(sharding_key);
        }
        out.push(')');
        Ok(out)
    }
}

impl From<Distributed> for Engine {
    fn from(value: Distributed) -> Self {
        Engine::Distributed(value)
    }
}
