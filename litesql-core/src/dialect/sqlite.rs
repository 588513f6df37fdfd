use crate::{
    Dialect, Result, SqlValue,
    dialect::{date_time_text, page_bounds, with_order_by},
};
use std::fmt::Write;
use time::PrimitiveDateTime;

#[derive(Default, Debug, Clone, Copy)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn open_quote(&self) -> char {
        '`'
    }

    fn close_quote(&self) -> char {
        '`'
    }

    fn page_sql(
        &self,
        sql: &str,
        order_by: &str,
        page_size: u64,
        current_page: u64,
    ) -> Result<String> {
        let (offset, _) = page_bounds(page_size, current_page)?;
        let mut out = with_order_by(sql, order_by);
        let _ = write!(out, " LIMIT {} OFFSET {}", page_size, offset);
        Ok(out)
    }

    fn max_id_sql(&self, table: &str, key: &str) -> String {
        let mut out = String::from("SELECT MAX(CAST(");
        self.write_identifier_quoted(&mut out, key);
        out.push_str(" AS INTEGER)) FROM ");
        self.write_identifier_quoted(&mut out, table);
        out
    }

    fn for_date_time(&self, value: PrimitiveDateTime) -> Result<SqlValue> {
        Ok(SqlValue::wrapped(
            "strftime('%Y-%m-%d %H:%M:%S', {0})",
            date_time_text(&value)?,
        ))
    }
}
