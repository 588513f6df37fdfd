use crate::{Bag, ColumnDef, Error, Result, Row, RowLabeled, Value};

/// Mapping between a Rust struct and a table, usually produced by `#[derive(Entity)]`.
pub trait Entity {
    fn table_name() -> &'static str;
    /// Persisted columns in field declaration order.
    fn columns() -> &'static [ColumnDef];
    /// Entity wide override of the auto generated key setting.
    fn auto_increment() -> Option<bool> {
        None
    }
    /// Values of the persisted columns, in the order of [`Entity::columns`].
    fn row(&self) -> Row;
    fn from_row(row: RowLabeled) -> Result<Self>
    where
        Self: Sized;

    fn primary_key_def() -> Option<&'static ColumnDef> {
        Self::columns().iter().find(|c| c.primary_key)
    }

    fn primary_key(&self) -> Option<Value> {
        let index = Self::columns().iter().position(|c| c.primary_key)?;
        self.row().into_vec().into_iter().nth(index)
    }

    /// Field name to value map usable as named template arguments.
    fn as_bag(&self) -> Bag {
        let mut bag = Bag::new();
        for (column, value) in Self::columns().iter().zip(self.row().into_vec()) {
            bag.insert(column.field(), value);
        }
        bag
    }
}

/// Whether `column` of `E` is generated by the database on insert.
///
/// Only primary keys can be auto generated. The column setting wins over the entity
/// setting, which wins over `default`.
pub fn is_auto_increment<E: Entity>(column: &ColumnDef, default: bool) -> bool {
    column.primary_key
        && column
            .auto_increment
            .or(E::auto_increment())
            .unwrap_or(default)
}

pub(crate) fn require_primary_key<E: Entity>() -> Result<&'static ColumnDef> {
    E::primary_key_def().ok_or_else(|| {
        Error::msg(format!(
            "Entity `{}` does not declare a primary key",
            E::table_name()
        ))
    })
}
