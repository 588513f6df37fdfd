use crate::decode_table::TableMetadata;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;

/// One `ColumnRef` associated constant per persisted field, named after the field.
pub(crate) fn column_consts(table: &TableMetadata) -> TokenStream {
    let struct_name = &table.item.ident;
    let vis = &table.item.vis;
    let table_name = &table.name;
    let definitions = table.columns().map(|c| {
        let ident = &c.ident;
        let name = &c.name;
        let field = ident.unraw().to_string();
        quote! {
            #[allow(non_upper_case_globals)]
            #vis const #ident: ::litesql::ColumnRef = ::litesql::ColumnRef {
                name: #name,
                field: #field,
                table: #table_name,
            };
        }
    });
    quote! {
        impl #struct_name {
            #(#definitions)*
        }
    }
}
