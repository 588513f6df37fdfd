use crate::{
    Dialect, Result, SqlValue,
    dialect::{date_time_text, page_bounds, with_order_by},
};
use std::fmt::Write;
use time::PrimitiveDateTime;

#[derive(Default, Debug, Clone, Copy)]
pub struct MySql;

impl Dialect for MySql {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "mysql"
    }

    fn open_quote(&self) -> char {
        '`'
    }

    fn close_quote(&self) -> char {
        '`'
    }

    fn parameter_prefix(&self) -> char {
        '@'
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
        let _ = write!(out, " LIMIT {}, {}", offset, page_size);
        Ok(out)
    }

    fn for_date_time(&self, value: PrimitiveDateTime) -> Result<SqlValue> {
        Ok(SqlValue::wrapped(
            "STR_TO_DATE({0}, '%Y-%m-%d %H:%i:%s')",
            date_time_text(&value)?,
        ))
    }
}
