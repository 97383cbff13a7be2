#[cfg(test)]
mod tests {
    use silo_core::{
        Literal, ServerError, ServerVersion, comma_join, escape, parse_array, parse_map,
        parse_tsv, substitute, truncate_long, unescape,
    };

    #[test]
    fn escaping() {
        assert_eq!(escape("plain", false), "plain");
        assert_eq!(escape("it's", true), "'it\\'s'");
        assert_eq!(escape("a\tb\nc\\d\0", false), "a\\tb\\nc\\\\d\\0");
        assert_eq!(unescape("a\\tb\\nc\\\\d\\0"), "a\tb\nc\\d\0");
        assert_eq!(unescape("\\x41\\N"), "A\\N");
        assert_eq!(unescape("trailing\\"), "trailing\\");
        let text = "naïve\r\u{8}\u{c}'\\";
        assert_eq!(unescape(&escape(text, false)), text);
    }

    #[test]
    fn tab_separated_lines() {
        assert_eq!(
            parse_tsv("1\tit\\'s\t\\N\n"),
            vec!["1".to_string(), "it's".into(), "\\N".into()]
        );
        assert_eq!(parse_tsv("only\r\n"), vec!["only".to_string()]);
        assert_eq!(comma_join(["a", "b", "c"]), "a, b, c");
        assert_eq!(comma_join(Vec::<String>::new()), "");
    }

    #[test]
    fn composite_literals() {
        assert_eq!(
            parse_array("['a', 'b\\'c', 'd,e']").unwrap(),
            vec![
                Literal::Quoted("a".into()),
                Literal::Quoted("b'c".into()),
                Literal::Quoted("d,e".into()),
            ]
        );
        assert_eq!(
            parse_array("[[1,2],[3]]").unwrap(),
            vec![Literal::Bare("[1,2]".into()), Literal::Bare("[3]".into())]
        );
        assert_eq!(
            parse_array("(1, NULL)").unwrap(),
            vec![Literal::Bare("1".into()), Literal::Bare("NULL".into())]
        );
        assert_eq!(parse_array(" [] ").unwrap(), vec![]);
        assert!(parse_array("1, 2").is_err());
        assert!(parse_array("['open]").is_err());
        assert!(parse_array("{'a':1}").is_err());
        assert_eq!(
            parse_map("{'a':1,'b':'x'}").unwrap(),
            vec![
                (Literal::Quoted("a".into()), Literal::Bare("1".into())),
                (Literal::Quoted("b".into()), Literal::Quoted("x".into())),
            ]
        );
        assert!(parse_map("{'a'}").is_err());
        assert!(parse_map("['a']").is_err());
    }

    #[test]
    fn placeholders() {
        let mapping = [("db", "`analytics`"), ("table", "`analytics`.`events`")];
        assert_eq!(
            substitute("SELECT * FROM $table WHERE 1", &mapping),
            "SELECT * FROM `analytics`.`events` WHERE 1"
        );
        assert_eq!(
            substitute("SHOW TABLES FROM ${db}_old", &mapping),
            "SHOW TABLES FROM `analytics`_old"
        );
        assert_eq!(substitute("SELECT '$$db'", &mapping), "SELECT '$db'");
        assert_eq!(substitute("SELECT $unknown, ${x}", &mapping), "SELECT $unknown, ${x}");
        assert_eq!(substitute("no placeholders", &mapping), "no placeholders");
        assert_eq!(substitute("price $", &mapping), "price $");
    }

    #[test]
    fn server_errors() {
        let error = ServerError::parse(
            "Code: 81, e.displayText() = DB::Exception: Database db_not_here doesn't exist, e.what() = DB::Exception\n",
        );
        assert_eq!(error.code, ServerError::UNKNOWN_DATABASE);
        assert_eq!(error.message, "Database db_not_here doesn't exist");

        let error = ServerError::parse(
            "Code: 62, e.displayText() = DB::Exception: Syntax error: failed at position 1 (version 20.3.7.46)",
        );
        assert_eq!(error.code, 62);
        assert_eq!(
            error.message,
            "Syntax error: failed at position 1 (version 20.3.7.46)"
        );
        assert_eq!(error.to_string(), format!("{} (62)", error.message));

        let error = ServerError::parse("  Bad gateway\n");
        assert_eq!(error, ServerError::new(0, "Bad gateway"));
    }

    #[test]
    fn server_versions() {
        let version = ServerVersion::parse("20.3.7.46\n");
        assert_eq!(version, ServerVersion(vec![20, 3, 7, 46]));
        assert!(version.at_least(&[19, 1, 16]));
        assert!(version.at_least(&[20, 3]));
        assert!(!version.at_least(&[20, 4]));
        assert!(ServerVersion::parse("1.1.54310") > ServerVersion(vec![1, 1, 53981]));
        assert_eq!(version.to_string(), "20.3.7.46");
        assert_eq!(ServerVersion::default().to_string(), "1.1.0");
    }

    #[test]
    fn truncation() {
        let short = "SELECT 1";
        assert_eq!(truncate_long!(short).to_string(), "SELECT 1");
        let long = "x".repeat(600);
        let truncated = truncate_long!(long).to_string();
        assert_eq!(truncated.len(), 500);
        assert!(truncated.ends_with("x..."));
    }
}
