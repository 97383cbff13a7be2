use crate::{
    AggregateQuerySet, Arg, Database, Engine, Model, Operand, OrmError, Page, Q, Result, Schema,
    SubQuery, Transport, comma_join, stream::Stream,
};
use std::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    ops::Range,
    sync::Arc,
};

/// Clauses shared by plain and aggregate querysets.
#[derive(Default, Debug, Clone)]
pub(crate) struct Clauses {
    pub(crate) where_q: Q,
    pub(crate) prewhere_q: Q,
    pub(crate) order_by: Vec<String>,
    /// Offset and count.
    pub(crate) limits: Option<(u64, u64)>,
    /// Offset, count and expressions.
    pub(crate) limit_by: Option<(u64, u64, Vec<String>)>,
    pub(crate) distinct: bool,
    pub(crate) final_: bool,
}

impl Clauses {
    /// `SELECT` statement with the given column list and grouping.
    pub(crate) fn to_sql(
        &self,
        schema: &Schema,
        columns: &str,
        group_by: &[String],
        with_totals: bool,
    ) -> Result<String> {
        let mut sql = String::with_capacity(128);
        sql.push_str("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(columns);
        sql.push_str("\nFROM ");
        if schema.is_system() {
            sql.push_str("`system`.");
        }
        sql.push('`');
        sql.push_str(schema.table());
        sql.push('`');
        if self.final_ {
            sql.push_str(" FINAL");
        }
        if !self.prewhere_q.is_empty() {
            sql.push_str("\nPREWHERE ");
            sql.push_str(&self.prewhere_q.to_sql(schema)?);
        }
        if !self.where_q.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&self.where_q.to_sql(schema)?);
        }
        if !group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&comma_join(group_by.iter().map(|v| format!("`{v}`"))));
        }
        if with_totals && !group_by.is_empty() {
            sql.push_str(" WITH TOTALS");
        }
        if !self.order_by.is_empty() {
            sql.push_str("\nORDER BY ");
            sql.push_str(&comma_join(self.order_by.iter().map(|v| match v.strip_prefix('-') {
                Some(v) => format!("{v} DESC"),
                None => v.clone(),
            })));
        }
        if let Some((offset, count, exprs)) = &self.limit_by {
            sql.push_str(&format!("\nLIMIT {offset}, {count} BY {}", comma_join(exprs)));
        }
        if let Some((offset, count)) = self.limits {
            sql.push_str(&format!("\nLIMIT {offset}, {count}"));
        }
        Ok(sql)
    }

    /// Conditions of both `WHERE` and `PREWHERE`.
    pub(crate) fn conditions(&self) -> Q {
        self.where_q.clone() & self.prewhere_q.clone()
    }

    fn add_condition(&mut self, condition: Q, prewhere: bool) {
        let target = if prewhere {
            &mut self.prewhere_q
        } else {
            &mut self.where_q
        };
        *target = std::mem::take(target) & condition;
    }
}

/// Lazy, immutable description of a `SELECT` over model `M`.
///
/// Every builder method returns a new queryset, the original is never modified.
/// Execution happens in the terminal methods taking a [`Database`].
pub struct QuerySet<M: Model> {
    pub(crate) clauses: Clauses,
    fields: Vec<String>,
    model: PhantomData<fn() -> M>,
}

impl<M: Model> QuerySet<M> {
    pub fn new() -> Self {
        Self {
            clauses: Default::default(),
            fields: Vec::new(),
            model: PhantomData,
        }
    }

    fn with(&self, f: impl FnOnce(&mut Self)) -> Self {
        let mut qs = self.clone();
        f(&mut qs);
        qs
    }

    /// Keep rows matching `condition`, combined with AND with the previous filters.
    pub fn filter(&self, condition: impl Into<Q>) -> Self {
        self.with(|qs| qs.clauses.add_condition(condition.into(), false))
    }

    /// Keep rows not matching `condition`.
    pub fn exclude(&self, condition: impl Into<Q>) -> Self {
        self.with(|qs| qs.clauses.add_condition(!condition.into(), false))
    }

    /// Condition evaluated in the `PREWHERE` clause, before reading the other columns.
    pub fn prewhere(&self, condition: impl Into<Q>) -> Self {
        self.with(|qs| qs.clauses.add_condition(condition.into(), true))
    }

    /// Sort keys: field names, `-name` for descending order, or expressions.
    pub fn order_by(&self, keys: impl IntoIterator<Item = impl ToString>) -> Self {
        let keys = keys.into_iter().map(|v| v.to_string()).collect();
        self.with(|qs| qs.clauses.order_by = keys)
    }

    /// Read only these fields, the others keep their default.
    pub fn only(&self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let fields = fields.into_iter().map(Into::into).collect();
        self.with(|qs| qs.fields = fields)
    }

    pub fn distinct(&self) -> Self {
        self.with(|qs| qs.clauses.distinct = true)
    }

    /// Merge rows at query time, available only for the collapsing and replacing engines.
    pub fn final_(&self) -> Result<Self> {
        let schema = M::schema();
        if !schema.engine().is_some_and(Engine::supports_final) {
            return Err(OrmError::query_state(format!(
                "final() can be used only with the CollapsingMergeTree and ReplacingMergeTree engines, not on model `{}`",
                schema.name(),
            ))
            .into());
        }
        Ok(self.with(|qs| qs.clauses.final_ = true))
    }

    /// Rows in `range` of the result, like slicing the sequence.
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

    /// At most `count` rows, after skipping `offset`, for each distinct value of `exprs`.
    pub fn limit_by(
        &self,
        offset: u64,
        count: u64,
        exprs: impl IntoIterator<Item = impl ToString>,
    ) -> Self {
        let exprs = exprs.into_iter().map(|v| v.to_string()).collect();
        self.with(|qs| qs.clauses.limit_by = Some((offset, count, exprs)))
    }

    /// Group the rows by `groups` and compute the `calculated` expressions, each
    /// given as `(alias, expression)`. Expressions are `F` nodes or SQL text.
    pub fn aggregate(
        &self,
        groups: impl IntoIterator<Item = impl Into<String>>,
        calculated: impl IntoIterator<Item = (impl Into<String>, impl ToString)>,
    ) -> Result<AggregateQuerySet<M>> {
        AggregateQuerySet::new(
            self.clauses.clone(),
            groups.into_iter().map(Into::into).collect(),
            calculated
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        )
    }

    pub fn as_sql(&self) -> Result<String> {
        let schema = M::schema();
        let columns = if self.fields.is_empty() {
            "*".to_string()
        } else {
            for field in &self.fields {
                schema.require_field(field)?;
            }
            comma_join(self.fields.iter().map(|v| format!("`{v}`")))
        };
        self.clauses.to_sql(&schema, &columns, &[], false)
    }

    /// Conditions of the `WHERE` and `PREWHERE` clauses combined.
    pub fn conditions_as_sql(&self) -> Result<String> {
        self.clauses.conditions().to_sql(&M::schema())
    }

    fn has_limits(&self) -> bool {
        self.clauses.distinct || self.clauses.limits.is_some() || self.clauses.limit_by.is_some()
    }

    pub async fn all<T: Transport>(&self, database: &Database<T>) -> Result<Vec<M>> {
        database.select::<M>(&self.as_sql()?).await
    }

    pub fn stream<'a, T: Transport>(
        &self,
        database: &'a Database<T>,
    ) -> impl Stream<Item = Result<M>> + Send + 'a {
        let sql = self.as_sql();
        async_stream::try_stream! {
            let sql = sql?;
            for await row in database.select_stream::<M>(sql) {
                yield row?;
            }
        }
    }

    pub async fn first<T: Transport>(&self, database: &Database<T>) -> Result<Option<M>> {
        self.get(database, 0).await
    }

    /// Row at `index` of the result.
    pub async fn get<T: Transport>(&self, database: &Database<T>, index: u64) -> Result<Option<M>> {
        let end = index
            .checked_add(1)
            .ok_or_else(|| OrmError::query_state(format!("Index {index} is out of range")))?;
        let qs = self.slice(index..end)?;
        Ok(qs.all(database).await?.into_iter().next())
    }

    pub async fn count<T: Transport>(&self, database: &Database<T>) -> Result<u64> {
        if self.has_limits() {
            let sql = format!("SELECT count() FROM ({})", self.as_sql()?);
            return database.count_raw(&sql).await;
        }
        database
            .count(&M::schema(), Some(&self.clauses.conditions()))
            .await
    }

    pub async fn exists<T: Transport>(&self, database: &Database<T>) -> Result<bool> {
        Ok(self.first(database).await?.is_some())
    }

    /// Page `page_num` (from 1, -1 for the last one) of `page_size` rows.
    pub async fn paginate<T: Transport>(
        &self,
        database: &Database<T>,
        page_num: i64,
        page_size: u64,
    ) -> Result<Page<M>> {
        let count = self.count(database).await?;
        let (number, pages_total) = Page::<M>::locate(count, page_num, page_size)?;
        let objects = if count > 0 {
            self.slice(Page::<M>::rows(number, page_size)?)?.all(database).await?
        } else {
            Vec::new()
        };
        Ok(Page {
            objects,
            number_of_objects: count,
            pages_total,
            number,
            page_size,
        })
    }

    fn verify_mutation_allowed(&self) -> Result<()> {
        let reason = if self.clauses.limits.is_some() {
            "slicing the queryset"
        } else if self.clauses.limit_by.is_some() {
            "calling limit_by()"
        } else if self.clauses.distinct {
            "calling distinct()"
        } else if self.clauses.final_ {
            "calling final_()"
        } else {
            return Ok(());
        };
        Err(OrmError::query_state(format!("Mutations are not allowed after {reason}")).into())
    }

    /// Delete the matching rows with an asynchronous mutation.
    pub async fn delete<T: Transport>(&self, database: &Database<T>) -> Result<()> {
        self.verify_mutation_allowed()?;
        let schema = M::schema();
        database.check_writable(&schema, "delete from")?;
        let sql = format!(
            "ALTER TABLE $db.`{}` DELETE WHERE {}",
            schema.table(),
            self.conditions_as_sql()?
        );
        database.raw(&sql).await.map(|_| ())
    }

    /// Assign the expressions to the fields of the matching rows.
    pub async fn update<T: Transport>(
        &self,
        database: &Database<T>,
        assignments: impl IntoIterator<Item = (&str, impl Into<Arg>)>,
    ) -> Result<()> {
        self.verify_mutation_allowed()?;
        let schema = M::schema();
        let mut parts = Vec::new();
        for (name, value) in assignments {
            schema.require_field(name)?;
            parts.push(format!("`{name}` = {}", value.into()));
        }
        if parts.is_empty() {
            return Err(OrmError::query_state("No fields specified for update").into());
        }
        database.check_writable(&schema, "update")?;
        let sql = format!(
            "ALTER TABLE $db.`{}` UPDATE {} WHERE {}",
            schema.table(),
            comma_join(parts),
            self.conditions_as_sql()?
        );
        database.raw(&sql).await.map(|_| ())
    }
}

impl<M: Model> Default for QuerySet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            clauses: self.clauses.clone(),
            fields: self.fields.clone(),
            model: PhantomData,
        }
    }
}

impl<M: Model> Debug for QuerySet<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("model", &M::schema().name())
            .field("clauses", &self.clauses)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<M: Model> SubQuery for QuerySet<M> {
    fn subquery_sql(&self) -> Result<String> {
        self.as_sql()
    }
}

impl<M: Model> From<QuerySet<M>> for Operand {
    fn from(value: QuerySet<M>) -> Self {
        Operand::SubQuery(Arc::new(value))
    }
}

impl<M: Model> From<&QuerySet<M>> for Operand {
    fn from(value: &QuerySet<M>) -> Self {
        Operand::SubQuery(Arc::new(value.clone()))
    }
}

impl<M: Model> TryFrom<&QuerySet<M>> for Arg {
    type Error = crate::Error;
    fn try_from(value: &QuerySet<M>) -> Result<Self> {
        Ok(Arg::SubQuery(value.as_sql()?))
    }
}
