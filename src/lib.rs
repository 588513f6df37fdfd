//! Typed predicates compiled into parameterized SQL for SQLite, MySQL, PostgreSQL and
//! Oracle, executed through pooled sessions.
//!
//! Entities are mapped with `#[derive(Entity)]`, their field constants build
//! predicates, and a [`LiteSqlClient`] hands out [`Session`]s bound to a [`Driver`].
pub use litesql_core::*;
pub use litesql_macros::*;
