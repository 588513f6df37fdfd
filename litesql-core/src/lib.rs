mod args;
mod as_value;
mod builder;
mod client;
mod column;
mod compiler;
mod dialect;
mod driver;
mod entity;
mod error;
mod expression;
mod fragment;
mod pool;
mod query;
mod session;
mod template;
mod transaction;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use args::*;
pub use as_value::*;
pub use builder::*;
pub use client::*;
pub use column::*;
pub use compiler::*;
pub use dialect::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use expression::*;
pub use fragment::*;
pub use pool::*;
pub use query::*;
pub use session::*;
pub use template::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
