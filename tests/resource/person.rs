use log::LevelFilter;
use silo::{MergeTree, Model};
use std::env;
use time::Date;

#[derive(Model, Debug, Clone, PartialEq)]
#[silo(
    table = "people",
    engine = MergeTree::new()
        .date_col("birthday")
        .order_by(["first_name", "last_name", "birthday"])
)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub birthday: Date,
    pub height: f32,
    #[silo(type = "Nullable(UInt32)")]
    pub passport: Option<u32>,
}

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}
