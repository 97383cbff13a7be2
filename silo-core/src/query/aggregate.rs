use crate::{
    Database, Model, Operand, OrmError, Q, Record, Result, SubQuery, Transport, comma_join,
    query::queryset::Clauses, stream::Stream,
};
use std::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    ops::Range,
    sync::Arc,
};

/// Queryset computing aggregates over groups of rows of `M`.
///
/// Rows do not match the model so they come back as [`Record`] values with an
/// ad hoc schema.
pub struct AggregateQuerySet<M: Model> {
    clauses: Clauses,
    fields: Vec<String>,
    calculated: Vec<(String, String)>,
    grouping: Vec<String>,
    with_totals: bool,
    model: PhantomData<fn() -> M>,
}

impl<M: Model> AggregateQuerySet<M> {
    pub(crate) fn new(
        clauses: Clauses,
        fields: Vec<String>,
        calculated: Vec<(String, String)>,
    ) -> Result<Self> {
        if calculated.is_empty() {
            return Err(OrmError::query_state("No calculated fields specified for aggregation").into());
        }
        let schema = M::schema();
        for name in &fields {
            schema.require_field(name)?;
        }
        Ok(Self {
            clauses,
            grouping: fields.clone(),
            fields,
            calculated,
            with_totals: false,
            model: PhantomData,
        })
    }

    fn with(&self, f: impl FnOnce(&mut Self)) -> Self {
        let mut qs = self.clone();
        f(&mut qs);
        qs
    }

    pub fn filter(&self, condition: impl Into<Q>) -> Self {
        let condition = condition.into();
        self.with(|qs| qs.clauses.where_q = std::mem::take(&mut qs.clauses.where_q) & condition)
    }

    pub fn exclude(&self, condition: impl Into<Q>) -> Self {
        self.filter(!condition.into())
    }

    pub fn prewhere(&self, condition: impl Into<Q>) -> Self {
        let condition = condition.into();
        self.with(|qs| {
            qs.clauses.prewhere_q = std::mem::take(&mut qs.clauses.prewhere_q) & condition
        })
    }

    /// Sort keys, may refer to the calculated fields by their alias.
    pub fn order_by(&self, keys: impl IntoIterator<Item = impl ToString>) -> Self {
        let keys = keys.into_iter().map(|v| v.to_string()).collect();
        self.with(|qs| qs.clauses.order_by = keys)
    }

    pub fn distinct(&self) -> Self {
        self.with(|qs| qs.clauses.distinct = true)
    }

    pub fn slice(&self, range: Range<u64>) -> Result<Self> {
        if range.end < range.start {
            return Err(OrmError::query_state(format!(
                "Invalid slice {}..{}",
                range.start, range.end
            ))
            .into());
        }
        Ok(self.with(|qs| qs.clauses.limits = Some((range.start, range.end - range.start))))
    }

    /// Group by these names instead of the fields given to `aggregate`, each
    /// must be one of those fields or a calculated alias.
    pub fn group_by(&self, names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        for name in &names {
            let known = self.fields.contains(name) || self.calculated.iter().any(|(k, _)| k == name);
            if !known {
                return Err(OrmError::query_state(format!(
                    "Cannot group by `{name}` since it is not included in the query"
                ))
                .into());
            }
        }
        Ok(self.with(|qs| qs.grouping = names))
    }

    /// Add a summary row computed over all the rows.
    pub fn with_totals(&self) -> Self {
        self.with(|qs| qs.with_totals = true)
    }

    pub fn as_sql(&self) -> Result<String> {
        let columns = comma_join(
            self.fields
                .iter()
                .cloned()
                .chain(self.calculated.iter().map(|(k, v)| format!("{v} AS {k}"))),
        );
        self.clauses
            .to_sql(&M::schema(), &columns, &self.grouping, self.with_totals)
    }

    pub async fn all<T: Transport>(&self, database: &Database<T>) -> Result<Vec<Record>> {
        database.select_records(&self.as_sql()?, None).await
    }

    pub fn stream<'a, T: Transport>(
        &self,
        database: &'a Database<T>,
    ) -> impl Stream<Item = Result<Record>> + Send + 'a {
        let sql = self.as_sql();
        async_stream::try_stream! {
            for await row in database.select_records_stream(sql?, None) {
                yield row?;
            }
        }
    }

    /// Number of result rows, that is of groups.
    pub async fn count<T: Transport>(&self, database: &Database<T>) -> Result<u64> {
        let sql = format!("SELECT count() FROM ({})", self.as_sql()?);
        database.count_raw(&sql).await
    }
}

impl<M: Model> Clone for AggregateQuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            clauses: self.clauses.clone(),
            fields: self.fields.clone(),
            calculated: self.calculated.clone(),
            grouping: self.grouping.clone(),
            with_totals: self.with_totals,
            model: PhantomData,
        }
    }
}

impl<M: Model> Debug for AggregateQuerySet<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateQuerySet")
            .field("model", &M::schema().name())
            .field("clauses", &self.clauses)
            .field("fields", &self.fields)
            .field("calculated", &self.calculated)
            .field("grouping", &self.grouping)
            .field("with_totals", &self.with_totals)
            .finish()
    }
}

impl<M: Model> SubQuery for AggregateQuerySet<M> {
    fn subquery_sql(&self) -> Result<String> {
        self.as_sql()
    }
}

impl<M: Model> From<AggregateQuerySet<M>> for Operand {
    fn from(value: AggregateQuerySet<M>) -> Self {
        Operand::SubQuery(Arc::new(value))
    }
}
