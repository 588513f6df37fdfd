use crate::{
    Dialect, Result, SqlValue,
    dialect::{date_time_text, page_bounds, with_order_by},
};
use time::PrimitiveDateTime;

/// Oracle has no `LIMIT`, pages are cut with two nested `ROWNUM` filters.
#[derive(Default, Debug, Clone, Copy)]
pub struct Oracle;

impl Dialect for Oracle {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "oracle"
    }

    fn page_sql(
        &self,
        sql: &str,
        order_by: &str,
        page_size: u64,
        current_page: u64,
    ) -> Result<String> {
        let (start, end) = page_bounds(page_size, current_page)?;
        Ok(format!(
            "SELECT * FROM (SELECT row_limit.*, ROWNUM rownum_ FROM ({}) row_limit WHERE ROWNUM <= {}) WHERE rownum_ > {}",
            with_order_by(sql, order_by),
            end,
            start,
        ))
    }

    fn for_date_time(&self, value: PrimitiveDateTime) -> Result<SqlValue> {
        Ok(SqlValue::wrapped(
            "TO_DATE({0}, 'yyyy-mm-dd hh24:mi:ss')",
            date_time_text(&value)?,
        ))
    }
}
