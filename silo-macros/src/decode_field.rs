use crate::decode_type::decode_type;
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Expr, Field, Ident, LitStr, parse::ParseBuffer};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    /// Column name.
    pub(crate) name: String,
    /// Expression building the field type.
    pub(crate) field_type: TokenStream,
    /// Builder calls applied to the `::silo::Field`.
    pub(crate) modifiers: Vec<TokenStream>,
    /// The value is computed by the server, it is never sent on insert.
    pub(crate) computed: bool,
    /// Not a column, filled with `Default::default()`.
    pub(crate) skip: bool,
}

fn parse_str(arg: &syn::meta::ParseNestedMeta, name: &str, example: &str) -> String {
    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
        panic!("Error while parsing `{name}`, use it like: `#[silo({name} = {example})]`");
    };
    value.value()
}

fn parse_expr(arg: &syn::meta::ParseNestedMeta, name: &str, example: &str) -> Expr {
    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
        panic!("Error while parsing `{name}`, use it like: `#[silo({name} = {example})]`");
    };
    value
}

pub(crate) fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Model fields are expected to have a name");
    let mut metadata = FieldMetadata {
        name: ident.to_string().trim_start_matches("r#").to_string(),
        ident,
        field_type: TokenStream::new(),
        modifiers: Vec::new(),
        computed: false,
        skip: false,
    };
    let mut declared_type = None;
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("silo") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `silo`, use it like: `#[silo(attribute = value, ...)]`");
        };
        let result = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                metadata.name = parse_str(&arg, "name", "\"my_column\"");
            } else if arg.path.is_ident("type") {
                let value = parse_str(&arg, "type", "\"Nullable(String)\"");
                if let Err(e) = silo_core::FieldType::parse(&value) {
                    panic!("Invalid type `{value}` of field `{}`: {e:#}", metadata.name);
                }
                declared_type = Some(value);
            } else if arg.path.is_ident("default") {
                let value = parse_expr(&arg, "default", "42");
                metadata.modifiers.push(quote!(.default(#value)));
            } else if arg.path.is_ident("default_expr") {
                let value = parse_expr(&arg, "default_expr", "F::now()");
                metadata.modifiers.push(quote!(.default_expr(#value)));
                metadata.computed = true;
            } else if arg.path.is_ident("default_sql") {
                let value = parse_str(&arg, "default_sql", "\"now()\"");
                metadata.modifiers.push(quote!(.default_sql(#value)));
                metadata.computed = true;
            } else if arg.path.is_ident("alias") {
                let value = parse_expr(&arg, "alias", "F::to_date(Self::created)");
                metadata.modifiers.push(quote!(.alias(#value)));
                metadata.computed = true;
            } else if arg.path.is_ident("alias_sql") {
                let value = parse_str(&arg, "alias_sql", "\"toDate(created)\"");
                metadata.modifiers.push(quote!(.alias_sql(#value)));
                metadata.computed = true;
            } else if arg.path.is_ident("materialized") {
                let value = parse_expr(&arg, "materialized", "F::to_date(Self::created)");
                metadata.modifiers.push(quote!(.materialized(#value)));
                metadata.computed = true;
            } else if arg.path.is_ident("materialized_sql") {
                let value = parse_str(&arg, "materialized_sql", "\"toDate(created)\"");
                metadata.modifiers.push(quote!(.materialized_sql(#value)));
                metadata.computed = true;
            } else if arg.path.is_ident("codec") {
                let value = parse_str(&arg, "codec", "\"Delta, ZSTD\"");
                metadata.modifiers.push(quote!(.codec(#value)));
            } else if arg.path.is_ident("readonly") {
                metadata.modifiers.push(quote!(.readonly()));
            } else if arg.path.is_ident("skip") {
                metadata.skip = true;
            } else {
                panic!(
                    "Unknown attribute `{}` inside silo macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
        if let Err(e) = result {
            panic!("Error while parsing `silo` on field `{}`: {e}", metadata.name);
        }
    }
    if !metadata.skip {
        metadata.field_type = match declared_type {
            Some(value) => quote!(::silo::FieldType::parse(#value)?),
            None => decode_type(&field.ty),
        };
    }
    metadata
}
