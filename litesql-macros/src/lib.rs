mod column_consts;
mod decode_column;
mod decode_table;
mod from_row_trait;
mod table_name;

use column_consts::column_consts;
use decode_table::decode_table;
use from_row_trait::from_row_trait;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

fn option_bool(value: Option<bool>) -> proc_macro2::TokenStream {
    match value {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    }
}

/// Mapping of a struct with named fields to a table.
///
/// Struct attributes: `#[table_name("orders")]` (defaults to the snake case struct
/// name) and `#[auto_increment]` / `#[auto_increment(false)]`. Field attribute:
/// `#[column(name = "...", primary_key, auto_increment [= false], ignore)]`.
#[proc_macro_derive(Entity, attributes(table_name, auto_increment, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let table = decode_table(parse_macro_input!(input as ItemStruct));
    let name = &table.item.ident;
    let table_name = &table.name;
    let auto_increment = option_bool(table.auto_increment);
    let consts = column_consts(&table);
    let from_row = from_row_trait(&table);
    let columns_defs = table.columns().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let nullable = c.nullable;
        let primary_key = c.primary_key;
        let auto_increment = option_bool(c.auto_increment);
        quote! {
            ::litesql::ColumnDef {
                column_ref: #name::#ident,
                value: <#ty as ::litesql::AsValue>::as_empty_value(),
                nullable: #nullable,
                primary_key: #primary_key,
                auto_increment: #auto_increment,
            }
        }
    });
    let values = table.columns().map(|c| {
        let ident = &c.ident;
        quote!(::litesql::AsValue::as_value(::std::clone::Clone::clone(&self.#ident)))
    });
    quote! {
        #consts
        impl ::litesql::Entity for #name {
            fn table_name() -> &'static str {
                #table_name
            }

            fn columns() -> &'static [::litesql::ColumnDef] {
                static RESULT: ::std::sync::LazyLock<Box<[::litesql::ColumnDef]>> =
                    ::std::sync::LazyLock::new(|| vec![#(#columns_defs),*].into_boxed_slice());
                &RESULT
            }

            fn auto_increment() -> Option<bool> {
                #auto_increment
            }

            fn row(&self) -> ::litesql::Row {
                vec![#(#values),*].into_boxed_slice()
            }

            fn from_row(__row__: ::litesql::RowLabeled) -> ::litesql::Result<Self> {
                #from_row
            }
        }
    }
    .into()
}
