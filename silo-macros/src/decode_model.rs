use crate::decode_field::{FieldMetadata, decode_field};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Expr, ItemStruct, LitStr, Path, parse::ParseBuffer};

pub(crate) struct ModelMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    pub(crate) table: Option<String>,
    pub(crate) fields: Vec<FieldMetadata>,
    /// Builder calls applied to the `::silo::SchemaBuilder`.
    pub(crate) modifiers: Vec<TokenStream>,
}

pub(crate) fn decode_model(item: ItemStruct) -> ModelMetadata {
    let fields = item.fields.iter().map(decode_field).collect();
    let mut metadata = ModelMetadata {
        name: item.ident.to_string(),
        table: None,
        fields,
        modifiers: Vec::new(),
        item: item.clone(),
    };
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("silo") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `silo`, use it like: `#[silo(attribute = value, ...)]`");
        };
        let result = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `table`, use it like: `#[silo(table = \"my_table\")]`");
                };
                metadata.table = Some(value.value());
            } else if arg.path.is_ident("name") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[silo(name = \"MyModel\")]`");
                };
                metadata.name = value.value();
            } else if arg.path.is_ident("engine") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                    panic!(
                        "Error while parsing `engine`, use it like: `#[silo(engine = MergeTree::new().date_col(\"day\"))]`"
                    );
                };
                metadata.modifiers.push(quote!(.engine(#value)));
            } else if arg.path.is_ident("extends") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<Path>) else {
                    panic!("Error while parsing `extends`, use it like: `#[silo(extends = BaseModel)]`");
                };
                metadata
                    .modifiers
                    .push(quote!(.extends(<#value as ::silo::Model>::schema())));
            } else if arg.path.is_ident("temporary") {
                metadata.modifiers.push(quote!(.temporary()));
            } else if arg.path.is_ident("system") {
                metadata.modifiers.push(quote!(.system()));
            } else if arg.path.is_ident("readonly") {
                metadata.modifiers.push(quote!(.readonly()));
            } else {
                panic!(
                    "Unknown attribute `{}` inside silo macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
        if let Err(e) = result {
            panic!("Error while parsing `silo` on model `{}`: {e}", item.ident);
        }
    }
    metadata
}
