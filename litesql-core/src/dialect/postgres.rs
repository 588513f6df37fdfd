use crate::{
    Dialect, Result, SqlValue,
    dialect::{date_time_text, page_bounds, with_order_by},
};
use time::PrimitiveDateTime;

#[derive(Default, Debug, Clone, Copy)]
pub struct Postgres;

impl Dialect for Postgres {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "postgresql"
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
        Ok(format!(
            "SELECT * FROM ({}) row_limit LIMIT {} OFFSET {}",
            with_order_by(sql, order_by),
            page_size,
            offset,
        ))
    }

    fn for_date_time(&self, value: PrimitiveDateTime) -> Result<SqlValue> {
        Ok(SqlValue::wrapped(
            "TO_TIMESTAMP(CAST({0} AS TEXT), 'yyyy-MM-dd hh24:mi:ss')",
            date_time_text(&value)?,
        ))
    }
}
