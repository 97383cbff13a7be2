#[cfg(test)]
mod tests {
    use silo_core::{
        Col, F, Field, FieldType, Lookup, MergeTree, Operand, Operators, OrmError, Q, Result,
        Schema, SubQuery, Value, q,
    };
    use std::sync::{Arc, LazyLock};
    use time::macros::date;

    static PERSON: LazyLock<Arc<Schema>> = LazyLock::new(|| {
        Schema::builder("Person")
            .table("people")
            .fields([
                Field::new("first_name", FieldType::String),
                Field::new("last_name", FieldType::String),
                Field::new("birthday", FieldType::Date),
                Field::new("height", FieldType::Float32),
                Field::new("passport", FieldType::nullable(FieldType::UInt32).unwrap()),
            ])
            .engine(MergeTree::new().date_col("birthday").order_by(["first_name"]))
            .build()
            .unwrap()
    });

    fn sql(q: &Q) -> String {
        q.to_sql(&PERSON).unwrap()
    }

    #[derive(Debug)]
    struct Tallest;

    impl SubQuery for Tallest {
        fn subquery_sql(&self) -> Result<String> {
            Ok("SELECT max(height) FROM people".into())
        }
    }

    #[test]
    fn combinations() {
        assert_eq!(sql(&Q::kw("first_name", "Ciccio")), "first_name = 'Ciccio'");
        let q = Q::kw("first_name", "Ciccio")
            | (Q::kw("height__gt", 1.8) & !Q::kw("last_name__startswith", "B"));
        assert_eq!(
            sql(&q),
            "(first_name = 'Ciccio') OR ((height > 1.8) AND (NOT (last_name LIKE 'B%')))"
        );
        let q = !Q::kw("first_name", "Ciccio") & Q::kw("last_name", "Baciccio");
        assert_eq!(
            sql(&q),
            "(last_name = 'Baciccio') AND (NOT (first_name = 'Ciccio'))"
        );
        let q = Q::kw("first_name", "a") | Q::kw("first_name", "b") | Q::kw("first_name", "c");
        assert_eq!(
            sql(&q),
            "(first_name = 'a') OR (first_name = 'b') OR (first_name = 'c')"
        );
        assert_eq!(
            sql(&!(Q::kw("first_name", "a") | Q::kw("first_name", "b"))),
            "NOT ((first_name = 'a') OR (first_name = 'b'))"
        );
        assert_eq!(sql(&!!Q::kw("first_name", "a")), "first_name = 'a'");
    }

    #[test]
    fn empty() {
        assert!(Q::new().is_empty());
        assert_eq!(sql(&Q::new()), "1");
        assert_eq!(sql(&q!()), "1");
        assert_eq!(sql(&(Q::new() & Q::kw("first_name", "x"))), "first_name = 'x'");
        assert_eq!(sql(&(Q::new() | Q::new())), "1");
    }

    #[test]
    fn keywords() {
        assert_eq!(
            sql(&q!(first_name = "Ciccio", height__gt = 1.8)),
            "(first_name = 'Ciccio') AND (height > 1.8)"
        );
        let q = Q::kws([
            ("birthday__gte", Operand::from(date!(2000 - 01 - 01))),
            ("birthday__lt", Operand::from("2010-01-01")),
        ]);
        assert_eq!(
            sql(&q),
            "(birthday >= '2000-01-01') AND (birthday < '2010-01-01')"
        );
        assert_eq!(Lookup::from_suffix("istartswith"), Some(Lookup::IStartsWith));
        assert_eq!(Lookup::from_suffix("not_in"), Some(Lookup::NotIn));
        assert_eq!(Lookup::from_suffix("regex"), None);
    }

    #[test]
    fn comparisons() {
        assert_eq!(sql(&Q::kw("height__gte", 2)), "height >= 2.0");
        assert_eq!(sql(&Q::kw("height__lt", 1.5)), "height < 1.5");
        assert_eq!(sql(&Q::kw("height__lte", 1.5)), "height <= 1.5");
        assert_eq!(sql(&Q::kw("first_name__ne", "x")), "first_name != 'x'");
        assert_eq!(sql(&Q::kw("passport", Value::Null)), "passport IS NULL");
        assert_eq!(sql(&Q::kw("passport__ne", Value::Null)), "passport IS NOT NULL");
        assert_eq!(sql(&Q::kw("passport", Some(12u32))), "passport = 12");
        assert_eq!(
            sql(&Q::field("last_name", Lookup::Eq, "O'Hara")),
            "last_name = 'O\\'Hara'"
        );
    }

    #[test]
    fn patterns() {
        assert_eq!(
            sql(&Q::kw("first_name__contains", "ic")),
            "first_name LIKE '%ic%'"
        );
        assert_eq!(
            sql(&Q::kw("first_name__contains", "50%_off")),
            "first_name LIKE '%50\\\\%\\\\_off%'"
        );
        assert_eq!(
            sql(&Q::kw("first_name__endswith", "cio")),
            "first_name LIKE '%cio'"
        );
        assert_eq!(
            sql(&Q::kw("first_name__icontains", "CI")),
            "lowerUTF8(first_name) LIKE lowerUTF8('%CI%')"
        );
        assert_eq!(
            sql(&Q::kw("first_name__istartswith", "ci")),
            "lowerUTF8(first_name) LIKE lowerUTF8('ci%')"
        );
        assert_eq!(
            sql(&Q::kw("first_name__iendswith", "IO")),
            "lowerUTF8(first_name) LIKE lowerUTF8('%IO')"
        );
        assert_eq!(
            sql(&Q::kw("first_name__iexact", "Ciccio")),
            "lowerUTF8(first_name) = lowerUTF8('Ciccio')"
        );
        let error = Q::kw("first_name__contains", F::lower("x"))
            .to_sql(&PERSON)
            .unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::QueryState(..))));
    }

    #[test]
    fn membership() {
        assert_eq!(
            sql(&Q::kw("passport__in", vec![1u32, 2, 3])),
            "passport IN (1, 2, 3)"
        );
        assert_eq!(
            sql(&Q::kw("first_name__not_in", vec![String::from("a"), "b".into()])),
            "NOT (first_name IN ('a', 'b'))"
        );
        assert_eq!(
            sql(&Q::kw("passport__in", Operand::raw("SELECT id FROM passports"))),
            "passport IN (SELECT id FROM passports)"
        );
        assert_eq!(
            sql(&Q::kw("height__in", Operand::SubQuery(Arc::new(Tallest)))),
            "height IN (SELECT max(height) FROM people)"
        );
        assert_eq!(
            sql(&Q::kw("height", Operand::SubQuery(Arc::new(Tallest)))),
            "height = (SELECT max(height) FROM people)"
        );
    }

    #[test]
    fn ranges() {
        assert_eq!(
            sql(&Q::kw("height__between", (1.5, 2.5))),
            "height BETWEEN 1.5 AND 2.5"
        );
        assert_eq!(
            sql(&Q::kw(
                "birthday__between",
                Value::Tuple(vec![Value::Null, "2000-12-31".into()])
            )),
            "birthday <= '2000-12-31'"
        );
        assert_eq!(
            sql(&Q::kw(
                "birthday__between",
                Value::Tuple(vec!["2000-01-01".into(), "".into()])
            )),
            "birthday >= '2000-01-01'"
        );
        for operand in [
            Operand::from(Value::Tuple(vec![Value::Null, Value::Null])),
            Operand::from(1.5),
            Operand::from(vec![1.0, 2.0, 3.0]),
        ] {
            let error = Q::kw("height__between", operand).to_sql(&PERSON).unwrap_err();
            assert!(matches!(OrmError::of(&error), Some(OrmError::QueryState(..))));
        }
    }

    #[test]
    fn expressions() {
        let height = Col::new("height");
        assert_eq!(sql(&Q::from(height.greater(1.8))), "(`height` > 1.8)");
        assert_eq!(
            sql(&(Q::from(F::equals(F::to_year(Col::new("birthday")), 1990)) & Q::kw("height__gt", 1.7))),
            "(toYear(`birthday`) = 1990) AND (height > 1.7)"
        );
        assert_eq!(
            sql(&Q::kw("height__gt", F::avg(&height))),
            "height > avg(`height`)"
        );
    }

    #[test]
    fn errors() {
        let error = Q::kw("nickname", "Cicci").to_sql(&PERSON).unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::UnknownField { .. })));
        let error = Q::kw("first_name__like", "C%").to_sql(&PERSON).unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::UnknownField { .. })));
        let error = Q::kw("height__gt", "tall").to_sql(&PERSON).unwrap_err();
        assert!(matches!(OrmError::of(&error), Some(OrmError::Conversion { .. })));
    }
}
