mod decode_field;
mod decode_model;
mod decode_type;

use decode_model::decode_model;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implement `silo::Model` for a struct with named fields.
///
/// Every field is a column, its type inferred from the Rust type or declared
/// with `#[silo(type = "...")]`. Each column also gets an associated
/// `silo::Col` constant named after the field, to be used in expressions.
#[proc_macro_derive(Model, attributes(silo))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let model = decode_model(item);
    let name = &model.item.ident;
    let model_name = &model.name;
    let table = model.table.as_ref().map(|v| quote!(.table(#v)));
    let columns: Vec<_> = model.fields.iter().filter(|f| !f.skip).collect();
    let columns_constants = columns.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.name;
        quote! {
            #[allow(non_upper_case_globals)]
            pub const #ident: ::silo::Col = ::silo::Col::new(#column);
        }
    });
    let fields_definitions = columns.iter().map(|f| {
        let column = &f.name;
        let field_type = &f.field_type;
        let modifiers = &f.modifiers;
        quote!(::silo::Field::new(#column, #field_type) #(#modifiers)*)
    });
    let schema_modifiers = &model.modifiers;
    let fields_from_record = model.fields.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.name;
        if f.skip {
            quote!(#ident: ::std::default::Default::default())
        } else {
            quote! {
                #ident: ::silo::Context::with_context(
                    ::silo::AsValue::try_from_value(record.get(#column)?.clone()),
                    || format!("While reading the field `{}` of `{}`", #column, #model_name),
                )?
            }
        }
    });
    let fields_to_record = columns.iter().filter(|f| !f.computed).map(|f| {
        let ident = &f.ident;
        let column = &f.name;
        quote! {
            record.set(
                #column,
                ::silo::AsValue::as_value(::std::clone::Clone::clone(&self.#ident)),
            )?;
        }
    });
    quote! {
        impl #name {
            #(#columns_constants)*

            #[doc(hidden)]
            fn build_schema() -> ::silo::Result<::std::sync::Arc<::silo::Schema>> {
                ::silo::Schema::builder(#model_name)
                    #table
                    #(.field(#fields_definitions))*
                    #(#schema_modifiers)*
                    .build()
            }
        }

        impl ::silo::Model for #name {
            fn schema() -> ::std::sync::Arc<::silo::Schema> {
                static SCHEMA: ::std::sync::LazyLock<::std::sync::Arc<::silo::Schema>> =
                    ::std::sync::LazyLock::new(|| {
                        #name::build_schema()
                            .unwrap_or_else(|e| panic!("Invalid model `{}`: {:#}", #model_name, e))
                    });
                SCHEMA.clone()
            }

            fn from_record(record: &::silo::Record) -> ::silo::Result<Self> {
                Ok(Self {
                    #(#fields_from_record),*
                })
            }

            fn to_record(&self) -> ::silo::Result<::silo::Record> {
                let mut record = ::silo::Record::new(<Self as ::silo::Model>::schema());
                #(#fields_to_record)*
                Ok(record)
            }
        }
    }
    .into()
}
