use convert_case::{Case, Casing};
use syn::{ItemStruct, LitBool, LitStr, Meta};

pub(crate) fn table_name(item: &ItemStruct) -> String {
    let mut default_table_name = item.ident.to_string().to_case(Case::Snake);
    if default_table_name.starts_with('_') {
        default_table_name.remove(0);
    }
    item.attrs
        .iter()
        .find_map(|attr| {
            if attr.meta.path().is_ident("table_name") {
                let Ok(v) = attr
                    .meta
                    .require_list()
                    .and_then(|v| v.parse_args::<LitStr>())
                else {
                    panic!(
                        "Error while parsing `table_name`, use it like #[table_name(\"{}_table\")]",
                        &default_table_name
                    );
                };
                return Some(v.value());
            }
            None
        })
        .unwrap_or(default_table_name)
}

/// Entity level `#[auto_increment]` or `#[auto_increment(false)]`.
pub(crate) fn table_auto_increment(item: &ItemStruct) -> Option<bool> {
    item.attrs.iter().find_map(|attr| {
        if !attr.meta.path().is_ident("auto_increment") {
            return None;
        }
        Some(match &attr.meta {
            Meta::Path(..) => true,
            Meta::List(list) => {
                let Ok(v) = list.parse_args::<LitBool>() else {
                    panic!("Error while parsing `auto_increment`, use it like #[auto_increment(false)]");
                };
                v.value()
            }
            Meta::NameValue(..) => {
                panic!("Error while parsing `auto_increment`, use it like #[auto_increment] or #[auto_increment(false)]")
            }
        })
    })
}
