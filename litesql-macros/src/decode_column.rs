use quote::ToTokens;
use syn::{Field, Ident, LitBool, LitStr, Token, Type, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Storage name.
    pub(crate) name: String,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    pub(crate) auto_increment: Option<bool>,
    pub(crate) ignore: bool,
}

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.qself.is_none()
        && path
            .path
            .segments
            .last()
            .is_some_and(|v| v.ident == "Option")
}

pub fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Entity can only be derived for structs with named fields");
    let mut metadata = ColumnMetadata {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        nullable: is_option(&field.ty),
        primary_key: false,
        auto_increment: None,
        ignore: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("column") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `column`, use it like: `#[column(attribute = value, ...)]`");
        };
        let result = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[column(name = \"my_column\")]`");
                };
                metadata.name = v.value();
            } else if arg.path.is_ident("primary_key") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `primary_key`, use it like: `#[column(primary_key)]`");
                };
                metadata.primary_key = true;
                metadata.nullable = false;
            } else if arg.path.is_ident("auto_increment") {
                let value = if arg.input.peek(Token![=]) {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitBool>) else {
                        panic!("Error while parsing `auto_increment`, use it like: `#[column(auto_increment = false)]`");
                    };
                    v.value()
                } else {
                    true
                };
                metadata.auto_increment = Some(value);
            } else if arg.path.is_ident("ignore") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `ignore`, use it like: `#[column(ignore)]`");
                };
                metadata.ignore = true;
            } else {
                panic!(
                    "Unknown attribute `{}` inside column, expected one of `name`, `primary_key`, `auto_increment`, `ignore`",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
        if let Err(e) = result {
            panic!("Error while parsing `column`: {}", e);
        }
    }
    if metadata.auto_increment.is_some() && !metadata.primary_key {
        panic!(
            "Field `{}` uses `auto_increment` but only the primary key can be generated by the database",
            metadata.ident
        );
    }
    metadata
}
