use crate::{
    decode_column::{ColumnMetadata, decode_column},
    table_name::{table_auto_increment, table_name},
};
use syn::{Fields, ItemStruct};

pub(crate) struct TableMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    pub(crate) auto_increment: Option<bool>,
    /// Every field, ignored ones included.
    pub(crate) fields: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// Persisted columns in declaration order.
    pub(crate) fn columns(&self) -> impl Iterator<Item = &ColumnMetadata> + Clone {
        self.fields.iter().filter(|v| !v.ignore)
    }

    pub(crate) fn ignored(&self) -> impl Iterator<Item = &ColumnMetadata> + Clone {
        self.fields.iter().filter(|v| v.ignore)
    }
}

pub fn decode_table(item: ItemStruct) -> TableMetadata {
    let Fields::Named(..) = item.fields else {
        panic!("Entity can only be derived for structs with named fields");
    };
    if !item.generics.params.is_empty() {
        panic!("Entity cannot be derived for generic structs");
    }
    let fields = item.fields.iter().map(decode_column).collect::<Vec<_>>();
    let result = TableMetadata {
        name: table_name(&item),
        auto_increment: table_auto_increment(&item),
        item,
        fields,
    };
    let primary_keys = result.columns().filter(|c| c.primary_key).count();
    if primary_keys > 1 {
        panic!(
            "Entity `{}` declares {} primary keys, at most one column can be the primary key",
            result.item.ident, primary_keys
        );
    }
    if result.fields.iter().any(|c| c.ignore && c.primary_key) {
        panic!("The primary key of `{}` cannot be ignored", result.item.ident);
    }
    result
}
