use crate::{
    Body, Context, DatabaseConfig, DdlContext, Model, OrmError, Page, Q, Record, Request, Response,
    Result, Schema, ServerError, ServerVersion, Transport, comma_join, create_ad_hoc_schema, escape,
    parse_tsv, stream::Stream, substitute, truncate_long,
};
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use time::UtcOffset;

/// Entry point for talking to one database of the server through a [`Transport`].
pub struct Database<T: Transport> {
    config: DatabaseConfig,
    transport: T,
    context: DdlContext,
    server_timezone: UtcOffset,
    db_exists: AtomicBool,
    connection_readonly: bool,
    settings: BTreeMap<String, String>,
}

impl<T: Transport> Database<T> {
    /// Database handle that does not contact the server: it assumes the
    /// database exists on a recent server running in UTC.
    pub fn new(config: DatabaseConfig, transport: T) -> Self {
        let context = DdlContext::new(config.db_name.clone(), DdlContext::default().server_version);
        let settings = config.settings.clone();
        Self {
            config,
            transport,
            context,
            server_timezone: UtcOffset::UTC,
            db_exists: AtomicBool::new(true),
            connection_readonly: false,
            settings,
        }
    }

    /// Inspect the server: existence of the database, read-only state of the
    /// connection, version and timezone. Creates the database when missing and
    /// `autocreate` is enabled.
    pub async fn connect(config: DatabaseConfig, transport: T) -> Result<Self> {
        let db_name = config.db_name.clone();
        let context = || format!("While connecting to the database `{}`", db_name);
        let mut database = Self::new(config, transport);
        database.db_exists.store(false, Ordering::Relaxed);
        let exists = database.is_existing_database().await.with_context(context)?;
        database.db_exists.store(exists, Ordering::Relaxed);
        if database.config.readonly {
            if database.config.username.is_none() {
                let error = OrmError::Database("Database user is required for read-only mode".into());
                log::error!("{}", error);
                return Err(error.into());
            }
            database.connection_readonly =
                database.is_connection_readonly().await.with_context(context)?;
        } else if database.config.autocreate && !exists {
            database.create_database().await.with_context(context)?;
        }
        database.context.server_version = database.get_server_version().await;
        if database.context.has_timezone_support() {
            database.server_timezone = database.get_server_timezone().await.with_context(context)?;
        }
        log::debug!(
            "Connected to `{}`, server version {}, timezone offset {}",
            database.config.db_name,
            database.context.server_version,
            database.server_timezone,
        );
        Ok(database)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn db_name(&self) -> &str {
        &self.context.db_name
    }

    /// Details needed to render DDL statements for this server.
    pub fn context(&self) -> &DdlContext {
        &self.context
    }

    pub fn server_version(&self) -> &ServerVersion {
        &self.context.server_version
    }

    /// Offset used to read date times that the server sends without timezone.
    pub fn server_timezone(&self) -> UtcOffset {
        self.server_timezone
    }

    pub fn db_exists(&self) -> bool {
        self.db_exists.load(Ordering::Relaxed)
    }

    pub fn is_readonly(&self) -> bool {
        self.config.readonly
    }

    /// Set a server setting sent with every following request.
    pub fn add_setting(&mut self, name: impl Into<String>, value: impl ToString) {
        self.settings.insert(name.into(), value.to_string());
    }

    pub fn remove_setting(&mut self, name: &str) -> Option<String> {
        self.settings.remove(name)
    }

    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    /// Replace `$db` with the quoted database name and `$table` with the qualified
    /// table of `schema`.
    pub fn substitute(&self, query: &str, schema: Option<&Schema>) -> String {
        let db = format!("`{}`", self.context.db_name);
        let table = schema.map(|v| v.qualified_table(&self.context));
        let mut mapping = vec![("db", db.as_str())];
        if let Some(table) = &table {
            mapping.push(("table", table.as_str()));
        }
        substitute(query, &mapping)
    }

    async fn send(&self, body: impl Into<Body>) -> Result<Response> {
        let body = body.into();
        if self.config.log_statements {
            match &body {
                Body::Text(text) => log::info!("{}", text),
                Body::Chunks(chunks) => log::info!(
                    "{} ({} bytes)",
                    chunks.first().map(|v| v.trim_end()).unwrap_or_default(),
                    body.len()
                ),
            }
        } else if log::log_enabled!(log::Level::Debug) {
            let text = match &body {
                Body::Text(text) => text.as_str(),
                Body::Chunks(chunks) => chunks.first().map(String::as_str).unwrap_or_default(),
            };
            log::debug!("{}", truncate_long!(text));
        }
        let request = Request {
            database: self.db_exists().then(|| self.context.db_name.clone()),
            body,
            settings: self.settings.clone(),
            readonly: self.config.readonly && !self.connection_readonly,
            timeout: self.config.timeout,
        };
        let response = self.transport.send(request).await;
        if let Err(error) = &response
            && let Some(OrmError::Server(ServerError {
                code: ServerError::UNKNOWN_DATABASE,
                ..
            })) = OrmError::of(error)
        {
            log::warn!("Database `{}` does not exist", self.context.db_name);
            self.db_exists.store(false, Ordering::Relaxed);
        }
        response
    }

    /// Fail when the database is read-only or `schema` does not accept writes.
    pub fn check_writable(&self, schema: &Schema, action: &str) -> Result<()> {
        if self.config.readonly {
            return Err(OrmError::Database(format!(
                "Cannot {action} `{}`, the database is read-only",
                schema.table()
            ))
            .into());
        }
        if schema.is_readonly() {
            return Err(OrmError::Database(format!(
                "Cannot {action} `{}`, read-only and system tables do not accept writes",
                schema.table()
            ))
            .into());
        }
        Ok(())
    }

    fn check_not_readonly(&self, action: &str) -> Result<()> {
        if self.config.readonly {
            return Err(OrmError::Database(format!(
                "Cannot {action}, the database is read-only"
            ))
            .into());
        }
        Ok(())
    }

    /// Send a statement after `$db` substitution and return the response body.
    pub async fn raw(&self, query: &str) -> Result<String> {
        let query = self.substitute(query, None);
        Ok(self.send(query).await?.text)
    }

    pub async fn create_database(&self) -> Result<()> {
        self.check_not_readonly("create a database")?;
        self.send(format!(
            "CREATE DATABASE IF NOT EXISTS `{}`",
            self.context.db_name
        ))
        .await?;
        self.db_exists.store(true, Ordering::Relaxed);
        Ok(())
    }

    pub async fn drop_database(&self) -> Result<()> {
        self.check_not_readonly("drop a database")?;
        self.send(format!("DROP DATABASE `{}`", self.context.db_name))
            .await?;
        self.db_exists.store(false, Ordering::Relaxed);
        Ok(())
    }

    pub async fn create_table(&self, schema: &Schema) -> Result<()> {
        if schema.is_system() {
            return Err(OrmError::Database("You can't create system table".into()).into());
        }
        self.check_not_readonly("create a table")?;
        self.send(schema.create_table_sql(&self.context)?).await?;
        Ok(())
    }

    pub async fn drop_table(&self, schema: &Schema) -> Result<()> {
        if schema.is_system() {
            return Err(OrmError::Database("You can't drop system table".into()).into());
        }
        self.check_not_readonly("drop a table")?;
        self.send(schema.drop_table_sql(&self.context)?).await?;
        Ok(())
    }

    pub async fn does_table_exist(&self, schema: &Schema) -> Result<bool> {
        let database = if schema.is_system() {
            "system"
        } else {
            &self.context.db_name
        };
        let sql = format!(
            "SELECT count() FROM system.tables WHERE database = {} AND name = {}",
            escape(database, true),
            escape(schema.table(), true),
        );
        Ok(self.send(sql).await?.text.trim() == "1")
    }

    /// Ad hoc schema describing an existing table.
    pub async fn get_model_for_table(&self, table: &str, system: bool) -> Result<Arc<Schema>> {
        let database = if system { "system" } else { &self.context.db_name };
        let sql = format!("DESCRIBE `{database}`.`{table}` FORMAT TSV");
        let response = self.send(sql).await?;
        let columns: Vec<_> = response
            .lines()
            .filter(|v| !v.is_empty())
            .map(|line| {
                let mut cells = parse_tsv(line).into_iter();
                (
                    cells.next().unwrap_or_default(),
                    cells.next().unwrap_or_default(),
                )
            })
            .collect();
        let schema = create_ad_hoc_schema(table, columns)
            .with_context(|| format!("While describing the table `{database}`.`{table}`"))?;
        if !system {
            return Ok(schema);
        }
        Schema::builder(schema.name())
            .table(table)
            .fields(schema.fields().iter().cloned())
            .system()
            .ad_hoc()
            .build()
    }

    /// Insert the rows of a model, in chunks of the configured batch size.
    pub async fn insert<'a, M: Model>(&self, rows: impl IntoIterator<Item = &'a M>) -> Result<()> {
        let records = rows
            .into_iter()
            .map(Model::to_record)
            .collect::<Result<Vec<_>>>()?;
        self.insert_records(&records).await
    }

    /// Insert records sharing the same schema.
    pub async fn insert_records(&self, records: &[Record]) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let schema = first.schema().clone();
        self.check_writable(&schema, "insert into")?;
        if let Some(other) = records.iter().find(|v| v.schema() != &schema) {
            return Err(OrmError::Database(format!(
                "All the inserted records must belong to `{}`, found one of `{}`",
                schema.name(),
                other.schema().name()
            ))
            .into());
        }
        if schema.writable_fields().next().is_none() {
            return Err(OrmError::Database(format!(
                "Cannot insert into `{}`, it has no writable fields",
                schema.name()
            ))
            .into());
        }
        let tskv = schema.has_expression_defaults();
        let columns = comma_join(schema.writable_fields().map(|v| format!("`{}`", v.name)));
        let header = self.substitute(
            &format!(
                "INSERT INTO $table ({columns}) FORMAT {}\n",
                if tskv { "TSKV" } else { "TabSeparated" }
            ),
            Some(&*schema),
        );
        let mut chunks = Vec::with_capacity(records.len() / self.config.batch_size.max(1) + 2);
        chunks.push(header);
        for batch in records.chunks(self.config.batch_size.max(1)) {
            let mut chunk = String::new();
            for record in batch {
                chunk.push_str(&if tskv {
                    record.to_tskv()
                } else {
                    record.to_tsv()
                });
                chunk.push('\n');
            }
            chunks.push(chunk);
        }
        self.send(Body::Chunks(chunks))
            .await
            .with_context(|| format!("While inserting {} rows into `{}`", records.len(), schema.table()))?;
        Ok(())
    }

    /// Number of rows of `schema` matching `conditions`.
    pub async fn count(&self, schema: &Schema, conditions: Option<&Q>) -> Result<u64> {
        let mut sql = "SELECT count() FROM $table".to_string();
        if let Some(conditions) = conditions.filter(|v| !v.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.to_sql(schema)?);
        }
        let sql = self.substitute(&sql, Some(schema));
        self.read_count(&sql).await
    }

    /// Run a query returning a single count.
    pub async fn count_raw(&self, query: &str) -> Result<u64> {
        let query = self.substitute(query, None);
        self.read_count(&query).await
    }

    async fn read_count(&self, query: &str) -> Result<u64> {
        let text = self.send(query).await?.text;
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        text.parse()
            .with_context(|| format!("Unexpected count `{}`", truncate_long!(text)))
    }

    async fn select_response(&self, query: &str, schema: Option<&Schema>) -> Result<Response> {
        let query = self.substitute(
            &format!("{query} FORMAT TabSeparatedWithNamesAndTypes"),
            schema,
        );
        self.send(query).await
    }

    /// Decode a `TabSeparatedWithNamesAndTypes` body: names, types, then rows.
    /// Lazily decode the rows of a `TabSeparatedWithNamesAndTypes` response.
    fn decode_rows<'r>(
        &self,
        response: &'r Response,
        schema: Option<Arc<Schema>>,
    ) -> Result<impl Iterator<Item = Result<Record>> + Send + 'r> {
        let mut lines = response.lines();
        let rows = match (lines.next(), lines.next()) {
            (Some(names), Some(types)) => {
                let names = parse_tsv(names);
                let schema = match schema {
                    Some(schema) => schema,
                    None => create_ad_hoc_schema("AdHocModel", names.iter().zip(parse_tsv(types)))?,
                };
                let tz = self.server_timezone;
                Some(
                    lines
                        .filter(|v| !v.is_empty())
                        .map(move |line| Record::from_tsv(schema.clone(), line, &names, tz)),
                )
            }
            _ => None,
        };
        Ok(rows.into_iter().flatten())
    }

    /// Run a select and decode the rows as `M`.
    pub async fn select<M: Model>(&self, query: &str) -> Result<Vec<M>> {
        let schema = M::schema();
        let response = self.select_response(query, Some(&*schema)).await?;
        self.decode_rows(&response, Some(schema))?
            .map(|record| M::from_record(&record?))
            .collect()
    }

    /// Like [`Database::select`] yielding the rows one at a time.
    pub fn select_stream<M: Model>(
        &self,
        query: String,
    ) -> impl Stream<Item = Result<M>> + Send + '_ {
        async_stream::try_stream! {
            let schema = M::schema();
            let response = self.select_response(&query, Some(&*schema)).await?;
            for record in self.decode_rows(&response, Some(schema))? {
                yield M::from_record(&record?)?;
            }
        }
    }

    /// Run a select and decode the rows as records, of an ad hoc schema built
    /// from the response when `schema` is `None`.
    pub async fn select_records(
        &self,
        query: &str,
        schema: Option<Arc<Schema>>,
    ) -> Result<Vec<Record>> {
        let response = self.select_response(query, schema.as_deref()).await?;
        self.decode_rows(&response, schema)?.collect()
    }

    /// Like [`Database::select_records`] yielding the records one at a time.
    pub fn select_records_stream(
        &self,
        query: String,
        schema: Option<Arc<Schema>>,
    ) -> impl Stream<Item = Result<Record>> + Send + '_ {
        async_stream::try_stream! {
            let response = self.select_response(&query, schema.as_deref()).await?;
            for record in self.decode_rows(&response, schema)? {
                yield record?;
            }
        }
    }

    /// Page `page_num` (from 1, -1 for the last one) of the rows of `M` matching
    /// `conditions`, sorted by `order_by`.
    pub async fn paginate<M: Model>(
        &self,
        order_by: &str,
        page_num: i64,
        page_size: u64,
        conditions: Option<&Q>,
    ) -> Result<Page<M>> {
        let schema = M::schema();
        let count = self.count(&schema, conditions).await?;
        let (number, pages_total) = Page::<M>::locate(count, page_num, page_size)?;
        let objects = if count > 0 {
            let mut sql = "SELECT * FROM $table".to_string();
            if let Some(conditions) = conditions.filter(|v| !v.is_empty()) {
                sql.push_str(" WHERE ");
                sql.push_str(&conditions.to_sql(&schema)?);
            }
            let rows = Page::<M>::rows(number, page_size)?;
            sql.push_str(&format!(" ORDER BY {order_by} LIMIT {}, {page_size}", rows.start));
            self.select::<M>(&sql).await?
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

    async fn is_existing_database(&self) -> Result<bool> {
        let sql = format!(
            "SELECT count() FROM system.databases WHERE name = {}",
            escape(&self.context.db_name, true)
        );
        Ok(self.send(sql).await?.text.trim() == "1")
    }

    async fn is_connection_readonly(&self) -> Result<bool> {
        let response = self
            .send("SELECT value FROM system.settings WHERE name = 'readonly'")
            .await?;
        Ok(response.text.trim() != "0")
    }

    async fn get_server_version(&self) -> ServerVersion {
        match self.send("SELECT version();").await {
            Ok(response) => ServerVersion::parse(&response.text),
            Err(error) => {
                let version = ServerVersion::default();
                log::error!(
                    "Cannot determine server version ({:#}), assuming {}",
                    error,
                    version
                );
                version
            }
        }
    }

    /// The offset is the distance of the server midnight of 1970-01-02 from the UTC one.
    async fn get_server_timezone(&self) -> Result<UtcOffset> {
        let response = self
            .send("SELECT timezone(), toUInt32(toDateTime('1970-01-02 00:00:00'))")
            .await?;
        let cells = parse_tsv(response.text.trim_end());
        let [name, seconds] = cells.as_slice() else {
            return Err(OrmError::Database(format!(
                "Unexpected timezone response `{}`",
                truncate_long!(response.text)
            ))
            .into());
        };
        let seconds: i32 = seconds
            .parse()
            .with_context(|| format!("Unexpected timezone offset `{seconds}`"))?;
        let offset = UtcOffset::from_whole_seconds(86400 - seconds)
            .with_context(|| format!("Invalid offset of timezone `{name}`"))?;
        log::debug!("Server timezone `{}` is at offset {}", name, offset);
        Ok(offset)
    }
}
