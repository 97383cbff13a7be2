mod as_value;
mod config;
mod context;
mod database;
mod engine;
mod error;
mod expression;
mod field;
pub mod migrations;
mod model;
mod query;
mod record;
mod schema;
pub mod system_models;
mod transport;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use config::*;
pub use context::*;
pub use database::*;
pub use engine::*;
pub use error::*;
pub use expression::*;
pub use field::*;
pub use model::*;
pub use query::*;
pub use record::*;
pub use schema::*;
pub use transport::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
