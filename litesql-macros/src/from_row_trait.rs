use crate::decode_table::TableMetadata;
use proc_macro2::TokenStream;
use quote::quote;

/// Body of `Entity::from_row`: values are matched to fields by column label, ignored
/// fields take their default.
pub(crate) fn from_row_trait(table: &TableMetadata) -> TokenStream {
    let holders = table.columns().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote! {
            let mut #ident: ::std::option::Option<#ty> = None;
        }
    });
    let assignment = table
        .columns()
        .map(|c| {
            let ident = &c.ident;
            let ty = &c.ty;
            let name = &c.name;
            quote! {
                if __n__ == #name {
                    #ident = Some(
                        <#ty as ::litesql::AsValue>::try_from_value(__v__)
                            .map_err(|e| e.context(format!("While decoding column `{}`", #name)))?,
                    );
                }
            }
        })
        .reduce(|acc, cur| quote!(#acc else #cur))
        .unwrap_or_default();
    let create = table.columns().map(|c| {
        let ident = &c.ident;
        let name = &c.name;
        quote!(#ident: #ident.ok_or_else(|| __make_error__(#name))?)
    });
    let ignored = table.ignored().map(|c| {
        let ident = &c.ident;
        quote!(#ident: ::std::default::Default::default())
    });
    quote! {
        #(#holders)*
        for (__n__, __v__) in ::std::iter::zip(__row__.labels.iter(), __row__.values.into_vec()) {
            #assignment
        }
        let __make_error__ = |name: &str| ::litesql::Error::msg(format!(
            "Column `{}` does not exist in the row provided",
            name
        ));
        Ok(Self {
            #(#create,)*
            #(#ignored,)*
        })
    }
}
