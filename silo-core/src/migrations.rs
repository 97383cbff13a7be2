//! Schema migrations: ordered lists of operations applied once per database and
//! recorded in a history table.
use crate::{
    AsValue, Context, Database, Engine, Field, FieldType, MERGE_TABLE_COLUMN, MergeTree, Model,
    OrmError, Record, Result, Schema, TableKind, Transport, escape, parse_tsv,
};
use std::{
    collections::BTreeSet,
    sync::{Arc, LazyLock},
};
use time::{Date, OffsetDateTime};

/// Row of the migrations history, one for each applied migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationHistory {
    pub package_name: String,
    pub module_name: String,
    pub applied: Date,
}

static MIGRATION_HISTORY: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Schema::builder("MigrationHistory")
        .table("infi_clickhouse_orm_migrations")
        .field(Field::new("package_name", FieldType::String))
        .field(Field::new("module_name", FieldType::String))
        .field(Field::new("applied", FieldType::Date))
        .engine(
            MergeTree::new()
                .date_col("applied")
                .order_by(["package_name", "module_name"]),
        )
        .build()
        .expect("valid migration history schema")
});

impl Model for MigrationHistory {
    fn schema() -> Arc<Schema> {
        MIGRATION_HISTORY.clone()
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            package_name: AsValue::try_from_value(record.get("package_name")?.clone())?,
            module_name: AsValue::try_from_value(record.get("module_name")?.clone())?,
            applied: AsValue::try_from_value(record.get("applied")?.clone())?,
        })
    }

    fn to_record(&self) -> Result<Record> {
        Record::new(Self::schema())
            .with("package_name", self.package_name.clone())?
            .with("module_name", self.module_name.clone())?
            .with("applied", self.applied)
    }
}

/// Single step of a migration.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateTable(Arc<Schema>),
    DropTable(Arc<Schema>),
    /// Bring the columns of the table in line with the schema: drop the
    /// removed ones, add the new ones and change the types that differ.
    AlterTable(Arc<Schema>),
    /// Like `AlterTable`, a buffer model is dropped, its main table altered and
    /// the buffer created again.
    AlterTableWithBuffer(Arc<Schema>),
    /// Statements sent verbatim, after `$db` substitution.
    RunSql(Vec<String>),
}

impl Operation {
    pub fn run_sql(statements: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Operation::RunSql(statements.into_iter().map(Into::into).collect())
    }

    pub async fn apply<T: Transport>(&self, database: &Database<T>) -> Result<()> {
        match self {
            Operation::CreateTable(schema) => {
                log::info!("    Create table {}", schema.table());
                database.create_table(schema).await
            }
            Operation::DropTable(schema) => {
                log::info!("    Drop table {}", schema.table());
                database.drop_table(schema).await
            }
            Operation::AlterTable(schema) => alter_table(database, schema).await,
            Operation::AlterTableWithBuffer(schema) => match schema.engine() {
                Some(Engine::Buffer(buffer)) => {
                    log::info!("    Drop table {}", schema.table());
                    database.drop_table(schema).await?;
                    alter_table(database, &buffer.main).await?;
                    log::info!("    Create table {}", schema.table());
                    database.create_table(schema).await
                }
                _ => alter_table(database, schema).await,
            },
            Operation::RunSql(statements) => {
                for statement in statements {
                    log::info!("    Executing SQL {}", crate::truncate_long!(statement));
                    database.raw(statement).await?;
                }
                Ok(())
            }
        }
    }
}

/// Named list of operations, applied in order of name.
///
/// Names start with a four digits sequence number, `0001_initial`.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub name: String,
    pub operations: Vec<Operation>,
}

impl Migration {
    pub fn new(name: impl Into<String>, operations: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            name: name.into(),
            operations: operations.into_iter().collect(),
        }
    }

    /// Sequence number taken from the name.
    pub fn number(&self) -> Option<u32> {
        self.name
            .get(..4)
            .filter(|v| v.bytes().all(|b| b.is_ascii_digit()))?
            .parse()
            .ok()
    }
}

/// Columns of a table as `(name, type)`.
async fn table_columns<T: Transport>(database: &Database<T>, schema: &Schema) -> Result<Vec<(String, String)>> {
    let sql = format!("DESC `{}`.`{}` FORMAT TSV", database.db_name(), schema.table());
    Ok(database
        .raw(&sql)
        .await?
        .lines()
        .filter(|v| !v.is_empty())
        .map(|line| {
            let mut cells = parse_tsv(line).into_iter();
            (
                cells.next().unwrap_or_default(),
                cells.next().unwrap_or_default(),
            )
        })
        .collect())
}

async fn alter<T: Transport>(database: &Database<T>, schema: &Schema, command: String) -> Result<()> {
    let sql = database.substitute(&format!("ALTER TABLE $table {command}"), Some(schema));
    database.raw(&sql).await.map(|_| ())
}

async fn alter_table<T: Transport>(database: &Database<T>, schema: &Schema) -> Result<()> {
    log::info!("    Alter table {}", schema.table());
    let fields: Vec<&Field> = schema
        .fields()
        .iter()
        .filter(|v| !(schema.kind() == TableKind::Merge && v.name == MERGE_TABLE_COLUMN))
        .collect();
    let mut columns = table_columns(database, schema).await?;
    for (name, _) in columns.iter().filter(|(name, _)| !fields.iter().any(|f| &f.name == name)) {
        log::info!("        Drop column {}", name);
        alter(database, schema, format!("DROP COLUMN `{name}`")).await?;
    }
    columns.retain(|(name, _)| fields.iter().any(|f| &f.name == name));
    // Alias and materialized columns are listed last by DESC, they cannot be the target of AFTER
    let mut previous: Option<&str> = None;
    for field in &fields {
        let stored = field.alias.is_none() && field.materialized.is_none();
        if !columns.iter().any(|(name, _)| name == &field.name) {
            log::info!("        Add column {}", field.name);
            let Some(previous) = previous else {
                return Err(OrmError::Database(format!(
                    "Cannot add column `{}` to the beginning of table `{}`",
                    field.name,
                    schema.table()
                ))
                .into());
            };
            let mut command = format!(
                "ADD COLUMN `{}` {}",
                field.name,
                field.column_sql(database.context(), true)
            );
            if stored {
                command.push_str(&format!(" AFTER `{previous}`"));
            }
            alter(database, schema, command).await?;
        }
        if stored {
            previous = Some(&field.name);
        }
    }
    for (name, db_type) in table_columns(database, schema).await? {
        let Some(field) = fields.iter().find(|f| f.name == name) else {
            return Err(OrmError::Database(format!(
                "Columns of table `{}` and fields of model `{}` disagree on `{name}`",
                schema.table(),
                schema.name()
            ))
            .into());
        };
        let expected = field.column_sql(database.context(), false);
        if db_type != expected {
            log::info!(
                "        Change type of column {} from {} to {}",
                name,
                db_type,
                expected
            );
            alter(database, schema, format!("MODIFY COLUMN `{name}` {expected}")).await?;
        }
    }
    Ok(())
}

impl<T: Transport> Database<T> {
    /// Names of the migrations of `package` already applied.
    pub async fn applied_migrations(&self, package: &str) -> Result<BTreeSet<String>> {
        self.create_table(&MigrationHistory::schema()).await?;
        let sql = format!(
            "SELECT module_name FROM $table WHERE package_name = {}",
            escape(package, true)
        );
        Ok(self
            .select::<MigrationHistory>(&sql)
            .await?
            .into_iter()
            .map(|v| v.module_name)
            .collect())
    }

    /// Apply, in order of name, the migrations of `package` not yet applied,
    /// stopping after the one numbered `up_to`.
    pub async fn migrate(&self, package: &str, migrations: &[Migration], up_to: u32) -> Result<()> {
        let applied = self.applied_migrations(package).await?;
        let mut pending: Vec<&Migration> = migrations
            .iter()
            .filter(|v| !applied.contains(&v.name))
            .collect();
        pending.sort_by(|a, b| a.name.cmp(&b.name));
        for migration in pending {
            log::info!("Applying migration {}...", migration.name);
            for operation in &migration.operations {
                operation
                    .apply(self)
                    .await
                    .with_context(|| format!("While applying migration `{}`", migration.name))?;
            }
            let history = MigrationHistory {
                package_name: package.into(),
                module_name: migration.name.clone(),
                applied: OffsetDateTime::now_utc().date(),
            };
            self.insert([&history]).await?;
            if migration.number().is_some_and(|v| v >= up_to) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Migration;

    #[test]
    fn migration_number() {
        assert_eq!(Migration::new("0001_initial", []).number(), Some(1));
        assert_eq!(Migration::new("0120_add_index", []).number(), Some(120));
        assert_eq!(Migration::new("initial", []).number(), None);
        assert_eq!(Migration::new("01", []).number(), None);
    }
}
