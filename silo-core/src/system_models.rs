//! Models of the tables in the `system` database.
use crate::{
    AsValue, Database, Field, FieldType, Model, Record, Result, Schema, Transport, comma_join,
    escape,
};
use std::sync::{Arc, LazyLock};
use time::{Date, OffsetDateTime};

/// Statement applied to the partition of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionOperation {
    Attach,
    Detach,
    Drop,
    Freeze,
    /// Download the partition from another replica, given its zookeeper path.
    Fetch(String),
}

impl PartitionOperation {
    pub fn keyword(&self) -> &'static str {
        match self {
            PartitionOperation::Attach => "ATTACH",
            PartitionOperation::Detach => "DETACH",
            PartitionOperation::Drop => "DROP",
            PartitionOperation::Freeze => "FREEZE",
            PartitionOperation::Fetch(..) => "FETCH",
        }
    }
}

/// Data part of a MergeTree family table, a row of `system.parts`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemPart {
    /// Database of the table owning the part.
    pub database: String,
    pub table: String,
    /// Engine name, without parameters.
    pub engine: String,
    /// Partition expression, `201801` or `'2018-01-01'`.
    pub partition: String,
    pub name: String,
    /// Inactive parts remain after merging until they are removed.
    pub active: u8,
    /// Multiply by the index granularity for the approximate number of rows.
    pub marks: u64,
    pub rows: u64,
    /// Compressed size.
    pub bytes: u64,
    pub modification_time: OffsetDateTime,
    pub remove_time: OffsetDateTime,
    /// More than 2 means the part is used by queries or merges.
    pub refcount: u32,
    pub min_date: Date,
    pub max_date: Date,
    pub partition_id: String,
    pub min_block_number: u64,
    pub max_block_number: u64,
    /// Depth in the merge tree, zero for parts created by an insert.
    pub level: u32,
}

static SYSTEM_PART: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Schema::builder("SystemPart")
        .table("parts")
        .system()
        .fields([
            Field::new("database", FieldType::String),
            Field::new("table", FieldType::String),
            Field::new("engine", FieldType::String),
            Field::new("partition", FieldType::String),
            Field::new("name", FieldType::String),
            Field::new("active", FieldType::UInt8),
            Field::new("marks", FieldType::UInt64),
            Field::new("rows", FieldType::UInt64),
            Field::new("bytes", FieldType::UInt64),
            Field::new("modification_time", FieldType::DateTime(None)),
            Field::new("remove_time", FieldType::DateTime(None)),
            Field::new("refcount", FieldType::UInt32),
            Field::new("min_date", FieldType::Date),
            Field::new("max_date", FieldType::Date),
            Field::new("partition_id", FieldType::String),
            Field::new("min_block_number", FieldType::UInt64),
            Field::new("max_block_number", FieldType::UInt64),
            Field::new("level", FieldType::UInt32),
        ])
        .build()
        .expect("valid system part schema")
});

fn take<T: AsValue>(record: &Record, name: &str) -> Result<T> {
    T::try_from_value(record.get(name)?.clone())
}

impl Model for SystemPart {
    fn schema() -> Arc<Schema> {
        SYSTEM_PART.clone()
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            database: take(record, "database")?,
            table: take(record, "table")?,
            engine: take(record, "engine")?,
            partition: take(record, "partition")?,
            name: take(record, "name")?,
            active: take(record, "active")?,
            marks: take(record, "marks")?,
            rows: take(record, "rows")?,
            bytes: take(record, "bytes")?,
            modification_time: take(record, "modification_time")?,
            remove_time: take(record, "remove_time")?,
            refcount: take(record, "refcount")?,
            min_date: take(record, "min_date")?,
            max_date: take(record, "max_date")?,
            partition_id: take(record, "partition_id")?,
            min_block_number: take(record, "min_block_number")?,
            max_block_number: take(record, "max_block_number")?,
            level: take(record, "level")?,
        })
    }

    fn to_record(&self) -> Result<Record> {
        Record::new(Self::schema())
            .with("database", self.database.clone())?
            .with("table", self.table.clone())?
            .with("engine", self.engine.clone())?
            .with("partition", self.partition.clone())?
            .with("name", self.name.clone())?
            .with("active", self.active)?
            .with("marks", self.marks)?
            .with("rows", self.rows)?
            .with("bytes", self.bytes)?
            .with("modification_time", self.modification_time)?
            .with("remove_time", self.remove_time)?
            .with("refcount", self.refcount)?
            .with("min_date", self.min_date)?
            .with("max_date", self.max_date)?
            .with("partition_id", self.partition_id.clone())?
            .with("min_block_number", self.min_block_number)?
            .with("max_block_number", self.max_block_number)?
            .with("level", self.level)
    }
}

impl SystemPart {
    /// `ALTER TABLE` statement applying `operation` to the partition of this part.
    pub fn partition_operation_sql(&self, db_name: &str, operation: &PartitionOperation) -> String {
        let mut sql = format!(
            "ALTER TABLE `{db_name}`.`{}` {} PARTITION {}",
            self.table,
            operation.keyword(),
            self.partition
        );
        if let PartitionOperation::Fetch(zookeeper_path) = operation {
            sql.push_str(" FROM ");
            sql.push_str(&escape(zookeeper_path, true));
        }
        sql
    }

    async fn partition_operation<T: Transport>(
        &self,
        database: &Database<T>,
        operation: PartitionOperation,
    ) -> Result<()> {
        let sql = self.partition_operation_sql(database.db_name(), &operation);
        database.raw(&sql).await.map(|_| ())
    }

    pub async fn attach<T: Transport>(&self, database: &Database<T>) -> Result<()> {
        self.partition_operation(database, PartitionOperation::Attach).await
    }

    pub async fn detach<T: Transport>(&self, database: &Database<T>) -> Result<()> {
        self.partition_operation(database, PartitionOperation::Detach).await
    }

    pub async fn drop<T: Transport>(&self, database: &Database<T>) -> Result<()> {
        self.partition_operation(database, PartitionOperation::Drop).await
    }

    /// Local backup of the partition.
    pub async fn freeze<T: Transport>(&self, database: &Database<T>) -> Result<()> {
        self.partition_operation(database, PartitionOperation::Freeze).await
    }

    pub async fn fetch<T: Transport>(
        &self,
        database: &Database<T>,
        zookeeper_path: impl Into<String>,
    ) -> Result<()> {
        self.partition_operation(database, PartitionOperation::Fetch(zookeeper_path.into()))
            .await
    }

    /// Parts of the tables in `database`, `conditions` is an optional SQL filter.
    pub async fn get<T: Transport>(database: &Database<T>, conditions: &str) -> Result<Vec<Self>> {
        let schema = Self::schema();
        let mut sql = format!(
            "SELECT {} FROM `system`.`{}` WHERE ",
            comma_join(schema.fields().iter().map(|v| format!("`{}`", v.name))),
            schema.table(),
        );
        if !conditions.is_empty() {
            sql.push_str(conditions);
            sql.push_str(" AND ");
        }
        sql.push_str("database = ");
        sql.push_str(&escape(database.db_name(), true));
        database.select::<Self>(&sql).await
    }

    /// Active parts only.
    pub async fn get_active<T: Transport>(
        database: &Database<T>,
        conditions: &str,
    ) -> Result<Vec<Self>> {
        let mut conditions = conditions.to_string();
        if !conditions.is_empty() {
            conditions.push_str(" AND ");
        }
        conditions.push_str("active");
        Self::get(database, &conditions).await
    }
}
