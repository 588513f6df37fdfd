mod mysql;
mod oracle;
mod postgres;
mod registry;
mod sqlite;

pub use mysql::*;
pub use oracle::*;
pub use postgres::*;
pub use registry::*;
pub use sqlite::*;

use crate::{ColumnRef, Error, LiteSqlError, Result, SqlValue, Token, Value, writer::Context};
use std::fmt::Write;
use time::{PrimitiveDateTime, macros::format_description};

/// Syntax rules of one database family.
///
/// Implementors supply the quoting, the parameter lexicon, pagination and the date
/// cast. Everything else has a default that fits most databases.
pub trait Dialect: Send + Sync {
    fn as_dyn(&self) -> &dyn Dialect;

    /// Identity used to select the dialect and to key the connection pool.
    fn name(&self) -> &'static str;

    fn open_quote(&self) -> char {
        '"'
    }

    fn close_quote(&self) -> char {
        '"'
    }

    /// Character opening a parameter marker.
    fn parameter_prefix(&self) -> char {
        ':'
    }

    /// Quote an identifier, doubling the closing quote inside it.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        let close = self.close_quote();
        out.push(self.open_quote());
        for c in value.chars() {
            if c == close {
                out.push(close);
            }
            out.push(c);
        }
        out.push(close);
    }

    fn write_table_ref(&self, out: &mut String, table: &str, alias: Option<&str>) {
        self.write_identifier_quoted(out, table);
        if let Some(alias) = alias.filter(|v| !v.is_empty()) {
            let _ = write!(out, " {}", alias);
        }
    }

    /// Column reference, qualified with the explicit alias or the one of the context.
    fn write_column_ref(
        &self,
        context: &Context,
        out: &mut String,
        alias: Option<&str>,
        column: &ColumnRef,
    ) {
        if context.qualify_columns {
            let alias = alias.unwrap_or(context.alias);
            if !alias.is_empty() {
                out.push_str(alias);
                out.push('.');
            }
        }
        self.write_identifier_quoted(out, column.name);
    }

    fn write_parameter_marker(&self, out: &mut String, name: &str, _value: &Value) {
        out.push(self.parameter_prefix());
        out.push_str(name);
    }

    /// Page `current_page` (starting at 1) of `sql` sorted by `order_by`, which may be
    /// empty. Rows `offset + 1 ..= offset + page_size` where
    /// `offset = page_size * (current_page - 1)`. Fails with [`LiteSqlError::PageSize`]
    /// when the bounds don't fit in a `u64`.
    fn page_sql(
        &self,
        sql: &str,
        order_by: &str,
        page_size: u64,
        current_page: u64,
    ) -> Result<String>;

    fn count_sql(&self, sql: &str) -> String {
        format!("SELECT COUNT(*) FROM ({}) T", sql)
    }

    fn max_id_sql(&self, table: &str, key: &str) -> String {
        let mut out = String::from("SELECT MAX(");
        self.write_identifier_quoted(&mut out, key);
        out.push_str(") FROM ");
        self.write_identifier_quoted(&mut out, table);
        out
    }

    /// Pattern for `LIKE`, the wildcards go into the bound value.
    fn for_contains(&self, value: &str) -> SqlValue {
        SqlValue::bound(format!("%{}%", value))
    }

    fn for_starts_with(&self, value: &str) -> SqlValue {
        SqlValue::bound(format!("{}%", value))
    }

    fn for_ends_with(&self, value: &str) -> SqlValue {
        SqlValue::bound(format!("%{}", value))
    }

    /// Dialect cast turning the bound `yyyy-mm-dd hh:mm:ss` text into a timestamp.
    fn for_date_time(&self, value: PrimitiveDateTime) -> Result<SqlValue>;

    /// `(p0,p1,...)` with one fresh marker per item.
    fn for_list(&self, values: Vec<Value>) -> SqlValue {
        let mut template = vec![Token::text("(")];
        for i in 0..values.len() {
            if i > 0 {
                template.push(Token::text(","));
            }
            template.push(Token::Param(format!("inParam{}", i)));
        }
        template.push(Token::text(")"));
        let item = values.first().map(Value::as_type).unwrap_or_default();
        SqlValue {
            template,
            value: Value::List(Some(values), Box::new(item)),
        }
    }
}

pub(crate) fn date_time_text(value: &PrimitiveDateTime) -> Result<String> {
    value
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(|e| Error::new(e).context(format!("Cannot format `{}` as text", value)))
}

/// First and one past the last row of a page, `(offset, offset + page_size)`.
pub(crate) fn page_bounds(page_size: u64, current_page: u64) -> Result<(u64, u64)> {
    page_size
        .checked_mul(current_page.saturating_sub(1))
        .and_then(|start| Some((start, start.checked_add(page_size)?)))
        .ok_or_else(|| {
            LiteSqlError::PageSize(format!(
                "page {} of size {} is out of range",
                current_page, page_size
            ))
            .into()
        })
}

/// `sql order_by` without a dangling space when there is no ordering.
pub(crate) fn with_order_by(sql: &str, order_by: &str) -> String {
    let mut out = String::with_capacity(sql.len() + order_by.len() + 1);
    out.push_str(sql.trim());
    let order_by = order_by.trim();
    if !order_by.is_empty() {
        out.push(' ');
        out.push_str(order_by);
    }
    out
}
