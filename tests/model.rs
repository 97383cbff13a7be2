mod resource {
    pub mod person;
}

#[cfg(test)]
mod tests {
    use crate::resource::person::{Person, init_logs};
    use indoc::indoc;
    use rust_decimal::Decimal;
    use silo::{
        Buffer, Col, DdlContext, Engine, F, FieldType, MergeTree, Model, Q, Record, ServerVersion,
        TableKind, Value,
    };
    use std::{collections::BTreeMap, net::Ipv4Addr, str::FromStr};
    use time::{
        OffsetDateTime, UtcOffset,
        macros::{date, datetime},
    };
    use uuid::Uuid;

    #[derive(Model, Debug, Clone, PartialEq)]
    #[silo(
        table = "events",
        engine = MergeTree::new().date_col("day").order_by(["id", "created"])
    )]
    struct Event {
        id: u64,
        created: OffsetDateTime,
        #[silo(materialized = F::to_date(Self::created))]
        day: time::Date,
        #[silo(name = "type", type = "Enum8('click' = 1, 'view' = 2)")]
        kind: String,
        #[silo(default = 5, codec = "Delta, ZSTD")]
        weight: u16,
        #[silo(default_expr = F::now())]
        received: OffsetDateTime,
        #[silo(alias_sql = "toHour(created)", type = "UInt8")]
        hour: u8,
        #[silo(skip)]
        note: String,
    }

    #[derive(Model, Debug, Clone, PartialEq)]
    #[silo(
        table = "people_buffer",
        extends = Person,
        engine = Buffer::new(Person::schema())
    )]
    struct PersonBuffer {
        first_name: String,
        last_name: String,
        birthday: time::Date,
        height: f32,
        #[silo(type = "Nullable(UInt32)")]
        passport: Option<u32>,
    }

    #[derive(Model, Debug, Clone, PartialEq)]
    #[silo(table = "numbers", system)]
    struct Number {
        number: u64,
    }

    #[derive(Model, Debug, Clone, PartialEq)]
    #[silo(name = "Scratch", temporary, engine = Engine::Memory)]
    struct ScratchRow {
        key: String,
        value: i64,
    }

    #[derive(Model, Debug, Clone, PartialEq)]
    #[silo(engine = Engine::Log)]
    struct Sample {
        enabled: bool,
        tags: Vec<String>,
        pair: (u8, String),
        counters: BTreeMap<String, u64>,
        id: Uuid,
        address: Ipv4Addr,
        #[silo(type = "Decimal(9, 2)")]
        price: Decimal,
        #[silo(type = "LowCardinality(String)")]
        country: String,
        comment: Option<String>,
    }

    #[derive(Model, Debug)]
    #[silo(engine = MergeTree::new().order_by(["id"]))]
    struct Broken {
        id: u64,
    }

    fn context() -> DdlContext {
        DdlContext::new("test_db", ServerVersion(vec![20, 3, 7, 46]))
    }

    #[test]
    fn declared_model() {
        init_logs();
        let schema = Event::schema();
        assert_eq!(schema.name(), "Event");
        assert_eq!(schema.table(), "events");
        assert!(schema.has_expression_defaults());
        assert!(schema.field("note").is_none());
        assert_eq!(
            schema.fields().iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["id", "created", "day", "type", "weight", "received", "hour"]
        );
        assert_eq!(
            Event::create_table_sql(&context()).unwrap(),
            indoc! {"
                CREATE TABLE IF NOT EXISTS `test_db`.`events` (
                    `id` UInt64 DEFAULT 0,
                    `created` DateTime DEFAULT '0000000000',
                    `day` Date MATERIALIZED toDate(`created`),
                    `type` Enum8('click' = 1, 'view' = 2) DEFAULT 'click',
                    `weight` UInt16 DEFAULT 5 CODEC(Delta, ZSTD),
                    `received` DateTime DEFAULT now(),
                    `hour` UInt8 ALIAS toHour(created)
                )
                ENGINE = MergeTree() PARTITION BY (toYYYYMM(`day`)) ORDER BY (id, created) SETTINGS index_granularity=8192"}
        );
        assert_eq!(
            Event::drop_table_sql(&context()).unwrap(),
            "DROP TABLE IF EXISTS `test_db`.`events`"
        );
    }

    #[test]
    fn column_constants() {
        assert_eq!(Event::kind.name(), "type");
        assert_eq!(Event::created, Col::new("created"));
        assert_eq!(
            F::to_start_of_month(Event::created).to_sql(),
            "toStartOfMonth(`created`)"
        );
        assert_eq!(
            Q::from(F::greater(Person::height, 1.8))
                .to_sql(&Person::schema())
                .unwrap(),
            "(`height` > 1.8)"
        );
    }

    #[test]
    fn server_computed_fields_are_not_written() {
        let event = Event {
            id: 1,
            created: datetime!(2020-01-01 00:00 UTC),
            day: date!(2000 - 01 - 01),
            kind: "view".into(),
            weight: 3,
            received: datetime!(2000-01-01 00:00 UTC),
            hour: 23,
            note: "ignored".into(),
        };
        let record = event.to_record().unwrap();
        assert!(!record.is_set("received").unwrap());
        assert_eq!(
            record.get("type").unwrap(),
            &Value::Enum {
                name: "view".into(),
                code: 2
            }
        );
        assert_eq!(
            record.to_tskv(),
            "id=1\tcreated=1577836800\ttype=view\tweight=3"
        );

        let invalid = Event {
            kind: "scroll".into(),
            ..event
        };
        assert!(invalid.to_record().is_err());
    }

    #[test]
    fn read_from_server_rows() {
        let schema = Event::schema();
        let record = Record::from_tsv(
            schema,
            "7\t1577836800\t2020-01-01\tclick\t5\t1577836801\t0",
            &["id", "created", "day", "type", "weight", "received", "hour"],
            UtcOffset::UTC,
        )
        .unwrap();
        let event = Event::from_record(&record).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.day, date!(2020 - 01 - 01));
        assert_eq!(event.kind, "click");
        assert_eq!(event.received, datetime!(2020-01-01 00:00:01 UTC));
        assert_eq!(event.note, "");
    }

    #[test]
    fn records_round_trip() {
        let person = Person {
            first_name: "Ciccio".into(),
            last_name: "Baciccio".into(),
            birthday: date!(1990 - 05 - 17),
            height: 1.8,
            passport: None,
        };
        let record = person.to_record().unwrap();
        assert_eq!(record.to_tsv(), "Ciccio\tBaciccio\t1990-05-17\t1.8\t\\N");
        assert_eq!(Person::from_record(&record).unwrap(), person);

        let sample = Sample {
            enabled: true,
            tags: vec!["a".into(), "b'c".into()],
            pair: (3, "three".into()),
            counters: BTreeMap::from([("x".into(), 1), ("y".into(), 2)]),
            id: Uuid::from_str("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap(),
            address: Ipv4Addr::new(10, 0, 0, 1),
            price: Decimal::from_str("12.50").unwrap(),
            country: "IT".into(),
            comment: Some("ok".into()),
        };
        let record = sample.to_record().unwrap();
        assert_eq!(Sample::from_record(&record).unwrap(), sample);
    }

    #[test]
    fn inferred_types() {
        let schema = Sample::schema();
        assert_eq!(schema.table(), "sample");
        let types: Vec<_> = schema
            .fields()
            .iter()
            .map(|v| v.field_type.db_type())
            .collect();
        assert_eq!(
            types,
            [
                "UInt8",
                "Array(String)",
                "Tuple(UInt8, String)",
                "Map(String, UInt64)",
                "UUID",
                "IPv4",
                "Decimal(9, 2)",
                "LowCardinality(String)",
                "Nullable(String)",
            ]
        );
        assert_eq!(schema.field("enabled").unwrap().field_type, FieldType::Boolean);
        assert_eq!(
            Sample::create_table_sql(&context())
                .unwrap()
                .lines()
                .last()
                .unwrap(),
            "ENGINE = Log"
        );
    }

    #[test]
    fn inherited_model() {
        let schema = PersonBuffer::schema();
        assert_eq!(schema.kind(), TableKind::Buffer);
        assert_eq!(schema.bases().len(), 1);
        assert_eq!(schema.fields(), Person::schema().fields());
        assert_eq!(
            PersonBuffer::create_table_sql(&context()).unwrap(),
            "CREATE TABLE IF NOT EXISTS `test_db`.`people_buffer` AS `test_db`.`people`\n\
             ENGINE = Buffer(`test_db`, `people`, 16, 10, 100, 10000, 1000000, 10000000, 100000000)"
        );
    }

    #[test]
    fn system_and_temporary_models() {
        let schema = Number::schema();
        assert!(schema.is_system());
        assert!(schema.is_readonly());
        assert!(Number::create_table_sql(&context()).is_err());
        assert!(Number::drop_table_sql(&context()).is_err());
        assert_eq!(
            Number::objects()
                .filter(Q::kw("number__lt", 10))
                .as_sql()
                .unwrap(),
            "SELECT *\nFROM `system`.`numbers`\nWHERE number < 10"
        );

        let schema = ScratchRow::schema();
        assert_eq!(schema.name(), "Scratch");
        assert_eq!(schema.table(), "scratch");
        assert!(schema.is_temporary());
        assert_eq!(
            ScratchRow::create_table_sql(&context()).unwrap(),
            indoc! {"
                CREATE TEMPORARY TABLE IF NOT EXISTS `scratch` (
                    `key` String DEFAULT '',
                    `value` Int64 DEFAULT 0
                )
                ENGINE = Memory"}
        );
        assert_eq!(
            ScratchRow::drop_table_sql(&context()).unwrap(),
            "DROP TABLE IF EXISTS `scratch`"
        );
    }

    #[test]
    #[should_panic(expected = "Invalid model `Broken`")]
    fn invalid_model() {
        Broken::schema();
    }
}
