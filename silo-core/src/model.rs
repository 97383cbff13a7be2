use crate::{DdlContext, QuerySet, Record, Result, Schema};
use std::sync::Arc;

/// Typed model bound to a table, usually implemented with `#[derive(Model)]`.
pub trait Model: Sized + Send + Sync + 'static {
    /// Shared schema, built once.
    fn schema() -> Arc<Schema>;

    fn from_record(record: &Record) -> Result<Self>;

    fn to_record(&self) -> Result<Record>;

    /// Query builder over all the rows of the model.
    fn objects() -> QuerySet<Self> {
        QuerySet::new()
    }

    fn create_table_sql(context: &DdlContext) -> Result<String> {
        Self::schema().create_table_sql(context)
    }

    fn drop_table_sql(context: &DdlContext) -> Result<String> {
        Self::schema().drop_table_sql(context)
    }
}
