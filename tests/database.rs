mod resource {
    pub mod mock;
    pub mod person;
}

#[cfg(test)]
mod tests {
    use crate::resource::{
        mock::MockTransport,
        person::{Person, init_logs},
    };
    use futures::{StreamExt, TryStreamExt};
    use indoc::indoc;
    use silo::{
        Arg, Body, Database, DatabaseConfig, Engine, Model, OrmError, Q, ServerError, ServerVersion, Value,
        migrations::{Migration, MigrationHistory, Operation},
        system_models::{PartitionOperation, SystemPart},
    };
    use std::{pin::pin, time::Duration};
    use time::{
        UtcOffset,
        macros::{date, offset},
    };

    const PEOPLE_HEADER: &str = "first_name\tlast_name\tbirthday\theight\tpassport\n\
                                 String\tString\tDate\tFloat32\tNullable(UInt32)\n";

    fn database() -> Database<MockTransport> {
        init_logs();
        Database::new(DatabaseConfig::new("test_db"), MockTransport::new())
    }

    fn ciccio() -> Person {
        Person {
            first_name: "Ciccio".into(),
            last_name: "Baciccio".into(),
            birthday: date!(1990 - 05 - 17),
            height: 1.8,
            passport: None,
        }
    }

    fn ali() -> Person {
        Person {
            first_name: "Alì".into(),
            last_name: "Babà".into(),
            birthday: date!(1985 - 01 - 01),
            height: 1.65,
            passport: Some(123),
        }
    }

    fn people_rows() -> String {
        format!(
            "{PEOPLE_HEADER}Ciccio\tBaciccio\t1990-05-17\t1.8\t\\N\nAlì\tBabà\t1985-01-01\t1.65\t123\n"
        )
    }

    #[tokio::test]
    async fn connect_to_existing_database() {
        init_logs();
        let mock = MockTransport::new();
        mock.respond("1\n")
            .respond("20.3.7.46\n")
            .respond("Europe/Rome\t82800\n");
        let config = DatabaseConfig::new("test_db").timeout(Duration::from_secs(5));
        let database = Database::connect(config, mock).await.unwrap();
        assert!(database.db_exists());
        assert_eq!(database.server_version(), &ServerVersion(vec![20, 3, 7, 46]));
        assert_eq!(database.server_timezone(), offset!(+1));
        let requests = database.transport().requests();
        assert_eq!(
            database.transport().sent(),
            [
                "SELECT count() FROM system.databases WHERE name = 'test_db'",
                "SELECT version();",
                "SELECT timezone(), toUInt32(toDateTime('1970-01-02 00:00:00'))",
            ]
        );
        assert_eq!(requests[0].database, None);
        assert_eq!(requests[1].database.as_deref(), Some("test_db"));
        assert!(requests.iter().all(|v| !v.readonly));
        assert!(requests.iter().all(|v| v.timeout == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn connect_creates_missing_database() {
        init_logs();
        let mock = MockTransport::new();
        mock.respond("0\n")
            .respond("")
            .respond("20.3.7.46\n")
            .respond("UTC\t86400\n");
        let database = Database::connect(DatabaseConfig::new("test_db"), mock)
            .await
            .unwrap();
        assert!(database.db_exists());
        assert_eq!(database.server_timezone(), UtcOffset::UTC);
        let requests = database.transport().requests();
        assert_eq!(requests[1].body, Body::from("CREATE DATABASE IF NOT EXISTS `test_db`"));
        assert_eq!(requests[1].database, None);
        assert_eq!(requests[2].database.as_deref(), Some("test_db"));

        let mock = MockTransport::new();
        mock.respond("0\n")
            .respond("20.3.7.46\n")
            .respond("UTC\t86400\n");
        let config = DatabaseConfig::new("test_db").autocreate(false);
        let database = Database::connect(config, mock).await.unwrap();
        assert!(!database.db_exists());
        assert_eq!(database.transport().sent()[1], "SELECT version();");
        assert_eq!(database.transport().requests()[2].database, None);
    }

    #[tokio::test]
    async fn connect_readonly() {
        init_logs();
        let error = Database::connect(
            DatabaseConfig::new("test_db").readonly(true),
            MockTransport::new(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Database(..))));

        let mock = MockTransport::new();
        mock.respond("1\n")
            .respond("1\n")
            .respond("20.3.7.46\n")
            .respond("UTC\t86400\n");
        let config = DatabaseConfig::new("test_db")
            .readonly(true)
            .credentials("reader", "secret");
        let database = Database::connect(config, mock).await.unwrap();
        assert!(database.is_readonly());
        let requests = database.transport().requests();
        assert_eq!(
            requests[1].body.to_text(),
            "SELECT value FROM system.settings WHERE name = 'readonly'"
        );
        assert!(requests[1].readonly);
        // The user is already read-only, the flag is not sent again
        assert!(!requests[2].readonly);

        let mock = MockTransport::new();
        mock.respond("1\n")
            .respond("0\n")
            .respond("20.3.7.46\n")
            .respond("UTC\t86400\n");
        let config = DatabaseConfig::new("test_db")
            .readonly(true)
            .credentials("reader", "secret");
        let database = Database::connect(config, mock).await.unwrap();
        assert!(database.transport().requests().iter().all(|v| v.readonly));
    }

    #[tokio::test]
    async fn connect_to_old_servers() {
        init_logs();
        let mock = MockTransport::new();
        mock.respond("1\n").respond("1.1.53981\n");
        let database = Database::connect(DatabaseConfig::new("test_db"), mock)
            .await
            .unwrap();
        assert_eq!(database.transport().sent().len(), 2);
        assert_eq!(database.server_timezone(), UtcOffset::UTC);
        assert!(!database.context().has_partition_key_support());

        let mock = MockTransport::new();
        mock.respond("1\n").fail(500, "Internal error");
        let database = Database::connect(DatabaseConfig::new("test_db"), mock)
            .await
            .unwrap();
        assert_eq!(database.server_version(), &ServerVersion::default());
        assert_eq!(database.transport().sent().len(), 2);

        let mock = MockTransport::new();
        mock.fail(516, "Authentication failed");
        let error = Database::connect(DatabaseConfig::new("test_db"), mock)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            OrmError::of(&error),
            Some(OrmError::Server(ServerError { code: 516, .. }))
        ));
        assert!(format!("{error:#}").contains("While connecting to the database `test_db`"));
    }

    #[tokio::test]
    async fn insert_in_chunks() {
        let mock = MockTransport::new();
        let database = Database::new(DatabaseConfig::new("test_db").batch_size(2), mock);
        let mut third = ciccio();
        third.first_name = "Tab\there".into();
        database
            .insert([&ciccio(), &ali(), &third])
            .await
            .unwrap();
        let requests = database.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].body,
            Body::Chunks(vec![
                "INSERT INTO `test_db`.`people` (`first_name`, `last_name`, `birthday`, `height`, `passport`) FORMAT TabSeparated\n".into(),
                "Ciccio\tBaciccio\t1990-05-17\t1.8\t\\N\nAlì\tBabà\t1985-01-01\t1.65\t123\n".into(),
                "Tab\\there\tBaciccio\t1990-05-17\t1.8\t\\N\n".into(),
            ])
        );

        database.insert(Vec::<&Person>::new()).await.unwrap();
        assert_eq!(database.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn select_rows() {
        let database = database();
        database.transport().respond(people_rows());
        let qs = Person::objects().filter(Q::kw("height__gt", 1.5));
        let people = qs.all(&database).await.unwrap();
        assert_eq!(people, [ciccio(), ali()]);
        assert_eq!(
            database.transport().sent(),
            ["SELECT *\nFROM `people`\nWHERE height > 1.5 FORMAT TabSeparatedWithNamesAndTypes"]
        );

        database.transport().respond(people_rows());
        let people: Vec<Person> = qs.stream(&database).try_collect().await.unwrap();
        assert_eq!(people.len(), 2);

        database.transport().respond("");
        assert_eq!(qs.first(&database).await.unwrap(), None);
        assert!(
            database
                .transport()
                .sent()
                .last()
                .unwrap()
                .ends_with("\nLIMIT 0, 1 FORMAT TabSeparatedWithNamesAndTypes")
        );

        database.transport().respond(format!("{PEOPLE_HEADER}Ciccio\tBaciccio\tnot a date\t1.8\t\\N\n"));
        let error = qs.all(&database).await.unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Conversion { .. })));

        database.transport().fail(62, "Syntax error");
        let error = qs.all(&database).await.unwrap_err();
        assert!(matches!(
            OrmError::of(&error),
            Some(OrmError::Server(ServerError { code: 62, .. }))
        ));
    }

    #[tokio::test]
    async fn select_ad_hoc_records() {
        let database = database();
        database.transport().respond("n\ts\nUInt8\tString\n1\ta\n2\tb\n");
        let records = database
            .select_records("SELECT number AS n, toString(n) AS s FROM $db.numbers", None)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].schema().is_ad_hoc());
        assert_eq!(records[1].get("n").unwrap(), &Value::UInt8(2));
        assert_eq!(records[1].get("s").unwrap(), &Value::String("b".into()));
        assert_eq!(
            database.transport().sent(),
            ["SELECT number AS n, toString(n) AS s FROM `test_db`.numbers FORMAT TabSeparatedWithNamesAndTypes"]
        );

        database.transport().clear();
        database
            .transport()
            .respond("first_name\tn\nString\tUInt64\nCiccio\t2\nAlì\t1\n")
            .respond("2\n");
        let qs = Person::objects()
            .aggregate(["first_name"], [("n", "count()")])
            .unwrap();
        let records = qs.all(&database).await.unwrap();
        assert_eq!(records[0].get("n").unwrap(), &Value::UInt64(2));
        assert_eq!(qs.count(&database).await.unwrap(), 2);
        assert_eq!(
            database.transport().sent()[1],
            "SELECT count() FROM (SELECT first_name, count() AS n\nFROM `people`\nGROUP BY `first_name`)"
        );

        database.transport().clear();
        database
            .transport()
            .respond("first_name\tn\nString\tUInt64\nCiccio\t2\nAlì\tmany\n");
        let mut rows = pin!(qs.stream(&database));
        let first = rows.next().await.unwrap().unwrap();
        assert_eq!(first.get("first_name").unwrap(), &Value::String("Ciccio".into()));
        assert!(rows.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn count_rows() {
        let database = database();
        database.transport().respond("2\n").respond("5\n").respond("");
        let qs = Person::objects().filter(Q::kw("first_name", "Ciccio"));
        assert_eq!(qs.count(&database).await.unwrap(), 2);
        assert_eq!(qs.distinct().count(&database).await.unwrap(), 5);
        assert_eq!(database.count(&Person::schema(), None).await.unwrap(), 0);
        assert_eq!(
            database.transport().sent(),
            [
                "SELECT count() FROM `test_db`.`people` WHERE first_name = 'Ciccio'",
                "SELECT count() FROM (SELECT DISTINCT *\nFROM `people`\nWHERE first_name = 'Ciccio')",
                "SELECT count() FROM `test_db`.`people`",
            ]
        );
        database.transport().respond("many\n");
        assert!(Person::objects().count(&database).await.is_err());
    }

    #[tokio::test]
    async fn paginate() {
        let database = database();
        database
            .transport()
            .respond("25\n")
            .respond(format!("{PEOPLE_HEADER}Ciccio\tBaciccio\t1990-05-17\t1.8\t\\N\n"));
        let page = Person::objects()
            .order_by(["first_name"])
            .paginate(&database, -1, 10)
            .await
            .unwrap();
        assert_eq!(page.number, 3);
        assert_eq!(page.pages_total, 3);
        assert_eq!(page.number_of_objects, 25);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.objects, [ciccio()]);
        assert_eq!(
            database.transport().sent()[1],
            "SELECT *\nFROM `people`\nORDER BY first_name\nLIMIT 20, 10 FORMAT TabSeparatedWithNamesAndTypes"
        );

        database.transport().clear();
        database.transport().respond("0\n");
        let page = Person::objects().paginate(&database, -1, 10).await.unwrap();
        assert_eq!((page.number, page.pages_total), (1, 0));
        assert!(page.is_empty());
        assert_eq!(database.transport().sent().len(), 1);

        database.transport().respond("10\n");
        let error = Person::objects().paginate(&database, 0, 10).await.unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Validation { .. })));

        database.transport().clear();
        database.transport().respond("5\n");
        let error = Person::objects()
            .paginate(&database, i64::MAX, 10)
            .await
            .unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Validation { .. })));
        assert_eq!(database.transport().sent().len(), 1);
        let error = Person::objects().get(&database, u64::MAX).await.unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::QueryState(..))));

        database.transport().clear();
        database.transport().respond("15\n").respond(people_rows());
        let conditions = Q::kw("height__gt", 1.5);
        let page = database
            .paginate::<Person>("height", 2, 10, Some(&conditions))
            .await
            .unwrap();
        assert_eq!(page.number, 2);
        assert_eq!(page.objects.len(), 2);
        assert_eq!(
            database.transport().sent(),
            [
                "SELECT count() FROM `test_db`.`people` WHERE height > 1.5",
                "SELECT * FROM `test_db`.`people` WHERE height > 1.5 ORDER BY height LIMIT 10, 10 FORMAT TabSeparatedWithNamesAndTypes",
            ]
        );
    }

    #[tokio::test]
    async fn mutations() {
        let database = database();
        let qs = Person::objects().filter(Q::kw("first_name", "Ciccio"));
        qs.delete(&database).await.unwrap();
        qs.update(&database, [("height", Arg::from(1.9)), ("last_name", Arg::from("Rossi"))])
            .await
            .unwrap();
        assert_eq!(
            database.transport().sent(),
            [
                "ALTER TABLE `test_db`.`people` DELETE WHERE first_name = 'Ciccio'",
                "ALTER TABLE `test_db`.`people` UPDATE `height` = 1.9, `last_name` = 'Rossi' WHERE first_name = 'Ciccio'",
            ]
        );

        let is_query_state =
            |error: &silo::Error| matches!(OrmError::of(error), Some(OrmError::QueryState(..)));
        let error = qs.update(&database, Vec::<(&str, Arg)>::new()).await.unwrap_err();
        assert!(is_query_state(&error));
        let error = qs.update(&database, [("nickname", "x")]).await.unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::UnknownField { .. })));
        let error = qs.slice(0..10).unwrap().delete(&database).await.unwrap_err();
        assert!(is_query_state(&error));
        let error = qs.distinct().delete(&database).await.unwrap_err();
        assert!(is_query_state(&error));
        let error = qs
            .limit_by(0, 1, ["last_name"])
            .update(&database, [("height", 2.0)])
            .await
            .unwrap_err();
        assert!(is_query_state(&error));
        assert_eq!(database.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn readonly_database() {
        init_logs();
        let config = DatabaseConfig::new("test_db").readonly(true);
        let database = Database::new(config, MockTransport::new());
        let is_database =
            |error: &silo::Error| matches!(OrmError::of(error), Some(OrmError::Database(..)));
        assert!(is_database(&database.insert([&ciccio()]).await.unwrap_err()));
        assert!(is_database(&database.create_table(&Person::schema()).await.unwrap_err()));
        assert!(is_database(&database.drop_table(&Person::schema()).await.unwrap_err()));
        assert!(is_database(&database.create_database().await.unwrap_err()));
        assert!(is_database(&database.drop_database().await.unwrap_err()));
        let error = Person::objects().delete(&database).await.unwrap_err();
        assert!(is_database(&error));
        assert!(database.transport().requests().is_empty());

        database.transport().respond("1\n");
        assert_eq!(database.raw("SELECT 1").await.unwrap(), "1\n");
        assert!(database.transport().requests()[0].readonly);
    }

    #[derive(Model, Debug, Clone, PartialEq)]
    #[silo(table = "computed", engine = Engine::Memory)]
    struct Computed {
        #[silo(alias_sql = "1", type = "UInt8")]
        one: u8,
        #[silo(readonly)]
        stamp: u32,
    }

    #[tokio::test]
    async fn insert_without_writable_fields() {
        let database = database();
        let row = Computed { one: 1, stamp: 2 };
        let error = database.insert([&row]).await.unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Database(..))));
        let record = silo::Record::new(Computed::schema());
        let error = database.insert_records(&[record]).await.unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Database(..))));
        assert!(database.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn tables() {
        let database = database();
        database
            .transport()
            .respond("")
            .respond("")
            .respond("1\n")
            .respond("0\n");
        database.create_table(&Person::schema()).await.unwrap();
        database.drop_table(&Person::schema()).await.unwrap();
        assert!(database.does_table_exist(&Person::schema()).await.unwrap());
        assert!(!database.does_table_exist(&SystemPart::schema()).await.unwrap());
        let sent = database.transport().sent();
        assert_eq!(sent[0], Person::create_table_sql(database.context()).unwrap());
        assert_eq!(sent[1], "DROP TABLE IF EXISTS `test_db`.`people`");
        assert_eq!(
            sent[2],
            "SELECT count() FROM system.tables WHERE database = 'test_db' AND name = 'people'"
        );
        assert_eq!(
            sent[3],
            "SELECT count() FROM system.tables WHERE database = 'system' AND name = 'parts'"
        );
        assert!(database.create_table(&SystemPart::schema()).await.is_err());
        assert!(database.drop_table(&SystemPart::schema()).await.is_err());
        assert_eq!(database.transport().sent().len(), 4);
    }

    #[tokio::test]
    async fn describe_tables() {
        let database = database();
        database
            .transport()
            .respond("first_name\tString\t\t\t\t\t\nheight\tFloat32\t\t\t\t\t\n")
            .respond("number\tUInt64\t\t\t\t\t\n");
        let schema = database.get_model_for_table("people", false).await.unwrap();
        assert_eq!(schema.table(), "people");
        assert!(schema.is_ad_hoc());
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(
            schema.field("height").unwrap().field_type,
            silo::FieldType::Float32
        );
        let schema = database.get_model_for_table("numbers", true).await.unwrap();
        assert!(schema.is_system());
        assert!(schema.is_readonly());
        assert_eq!(
            database.transport().sent(),
            [
                "DESCRIBE `test_db`.`people` FORMAT TSV",
                "DESCRIBE `system`.`numbers` FORMAT TSV",
            ]
        );
    }

    #[tokio::test]
    async fn raw_statements_and_settings() {
        let mut database = Database::new(
            DatabaseConfig::new("test_db").setting("max_threads", 4),
            MockTransport::new(),
        );
        assert_eq!(
            database.substitute(
                "SELECT * FROM $table WHERE x IN (SELECT y FROM $db.other)",
                Some(&Person::schema())
            ),
            "SELECT * FROM `test_db`.`people` WHERE x IN (SELECT y FROM `test_db`.other)"
        );
        assert_eq!(database.substitute("SELECT '$table'", None), "SELECT '$table'");

        database.add_setting("max_memory_usage", 10_000_000);
        database.transport().respond("people\n");
        assert_eq!(database.raw("SHOW TABLES FROM $db").await.unwrap(), "people\n");
        let requests = database.transport().requests();
        let request = &requests[0];
        assert_eq!(request.body.to_text(), "SHOW TABLES FROM `test_db`");
        assert_eq!(request.settings.get("max_threads").map(String::as_str), Some("4"));
        assert_eq!(
            request.settings.get("max_memory_usage").map(String::as_str),
            Some("10000000")
        );

        assert_eq!(database.remove_setting("max_threads").as_deref(), Some("4"));
        database.raw("SELECT 1").await.unwrap();
        assert!(!database.transport().requests()[1].settings.contains_key("max_threads"));
    }

    #[tokio::test]
    async fn missing_database() {
        let database = database();
        database
            .transport()
            .fail(ServerError::UNKNOWN_DATABASE, "Database test_db doesn't exist");
        let error = database.raw("SELECT 1").await.unwrap_err();
        assert!(matches!(
            OrmError::of(&error),
            Some(OrmError::Server(ServerError { code: 81, .. }))
        ));
        assert!(!database.db_exists());
        database.create_database().await.unwrap();
        assert!(database.db_exists());
        database.drop_database().await.unwrap();
        assert!(!database.db_exists());
        let requests = database.transport().requests();
        assert_eq!(requests[0].database.as_deref(), Some("test_db"));
        assert_eq!(requests[1].database, None);
        assert_eq!(requests[1].body.to_text(), "CREATE DATABASE IF NOT EXISTS `test_db`");
        assert_eq!(requests[2].database.as_deref(), Some("test_db"));
        assert_eq!(requests[2].body.to_text(), "DROP DATABASE `test_db`");
    }

    #[tokio::test]
    async fn system_parts() {
        let database = database();
        database.transport().respond(indoc! {"
            database\ttable\tpartition\tname\tactive\trows
            String\tString\tString\tString\tUInt8\tUInt64
            test_db\tpeople\t201801\t201801_1_1_0\t1\t42
        "});
        let parts = SystemPart::get_active(&database, "table = 'people'")
            .await
            .unwrap();
        assert_eq!(parts.len(), 1);
        let part = &parts[0];
        assert_eq!(part.partition, "201801");
        assert_eq!(part.rows, 42);
        assert_eq!(part.level, 0);
        let sent = database.transport().sent();
        assert!(sent[0].starts_with("SELECT `database`, `table`, `engine`, "));
        assert!(sent[0].ends_with(
            " FROM `system`.`parts` WHERE table = 'people' AND active AND database = 'test_db' FORMAT TabSeparatedWithNamesAndTypes"
        ));

        part.freeze(&database).await.unwrap();
        part.fetch(&database, "/clickhouse/tables/01/people")
            .await
            .unwrap();
        let sent = database.transport().sent();
        assert_eq!(sent[1], "ALTER TABLE `test_db`.`people` FREEZE PARTITION 201801");
        assert_eq!(
            sent[2],
            "ALTER TABLE `test_db`.`people` FETCH PARTITION 201801 FROM '/clickhouse/tables/01/people'"
        );
        assert_eq!(
            part.partition_operation_sql("test_db", &PartitionOperation::Detach),
            "ALTER TABLE `test_db`.`people` DETACH PARTITION 201801"
        );

        let error = database.insert([part]).await.unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Database(..))));
        let error = silo::QuerySet::<SystemPart>::new()
            .delete(&database)
            .await
            .unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Database(..))));
        assert_eq!(database.transport().sent().len(), 3);
    }

    fn migrations() -> Vec<Migration> {
        vec![
            Migration::new("0003_alter", [Operation::AlterTable(Person::schema())]),
            Migration::new("0001_initial", [Operation::CreateTable(Person::schema())]),
            Migration::new(
                "0002_optimize",
                [Operation::run_sql(["OPTIMIZE TABLE $db.`people` FINAL"])],
            ),
        ]
    }

    #[tokio::test]
    async fn migrate() {
        let database = database();
        database
            .transport()
            .respond("")
            .respond("module_name\nString\n0001_initial\n")
            .respond("")
            .respond("")
            .respond(indoc! {"
                first_name\tString\t\t\t\t\t
                nickname\tString\t\t\t\t\t
                birthday\tDate\t\t\t\t\t
                height\tFloat64\t\t\t\t\t
                passport\tNullable(UInt32)\t\t\t\t\t
            "})
            .respond("")
            .respond("")
            .respond(indoc! {"
                first_name\tString
                last_name\tString
                birthday\tDate
                height\tFloat64
                passport\tNullable(UInt32)
            "})
            .respond("")
            .respond("");
        database.migrate("app", &migrations(), 9999).await.unwrap();
        let sent = database.transport().sent();
        assert_eq!(sent.len(), 10);
        assert_eq!(
            sent[0],
            MigrationHistory::create_table_sql(database.context()).unwrap()
        );
        assert_eq!(
            sent[1],
            "SELECT module_name FROM `test_db`.`infi_clickhouse_orm_migrations` WHERE package_name = 'app' FORMAT TabSeparatedWithNamesAndTypes"
        );
        assert_eq!(sent[2], "OPTIMIZE TABLE `test_db`.`people` FINAL");
        assert!(sent[3].starts_with(
            "INSERT INTO `test_db`.`infi_clickhouse_orm_migrations` (`package_name`, `module_name`, `applied`) FORMAT TabSeparated\napp\t0002_optimize\t"
        ));
        assert_eq!(sent[4], "DESC `test_db`.`people` FORMAT TSV");
        assert_eq!(sent[5], "ALTER TABLE `test_db`.`people` DROP COLUMN `nickname`");
        assert_eq!(
            sent[6],
            "ALTER TABLE `test_db`.`people` ADD COLUMN `last_name` String DEFAULT '' AFTER `first_name`"
        );
        assert_eq!(sent[7], "DESC `test_db`.`people` FORMAT TSV");
        assert_eq!(
            sent[8],
            "ALTER TABLE `test_db`.`people` MODIFY COLUMN `height` Float32"
        );
        assert!(sent[9].contains("\napp\t0003_alter\t"));
    }

    #[tokio::test]
    async fn migrate_up_to() {
        let database = database();
        database
            .transport()
            .respond("")
            .respond("module_name\nString\n");
        database.migrate("app", &migrations(), 1).await.unwrap();
        let sent = database.transport().sent();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2], Person::create_table_sql(database.context()).unwrap());
        assert!(sent[3].contains("\napp\t0001_initial\t"));

        database.transport().clear();
        database
            .transport()
            .respond("")
            .respond("module_name\nString\n0001_initial\n")
            .fail(62, "Syntax error");
        let error = database.migrate("app", &migrations(), 9999).await.unwrap_err();
        assert!(format!("{error:#}").contains("While applying migration `0002_optimize`"));
        assert_eq!(database.transport().sent().len(), 3);
    }
}
