use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{GenericArgument, Path, PathArguments, Type, TypePath, TypeTuple};

/// True when the last segments of `path` are `expect`, so that `String`,
/// `string::String` and `std::string::String` all match.
pub(crate) fn matches_path(path: &Path, expect: &[&str]) -> bool {
    let len = path.segments.len().min(expect.len());
    path.segments
        .iter()
        .rev()
        .take(len)
        .map(|v| &v.ident)
        .eq(expect.iter().rev().take(len))
}

fn generic_types(path: &Path) -> Vec<&Type> {
    let Some(PathArguments::AngleBracketed(bracketed)) =
        path.segments.last().map(|v| &v.arguments)
    else {
        panic!("`{}` must have a generic argument", path.to_token_stream());
    };
    bracketed
        .args
        .iter()
        .filter_map(|v| match v {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
        .collect()
}

/// Expression building the `::silo::FieldType` of a Rust type, inside a
/// function returning `::silo::Result`.
pub(crate) fn decode_type(ty: &Type) -> TokenStream {
    match ty {
        Type::Path(TypePath { path, .. }) => {
            if let Some(ident) = path.get_ident() {
                let simple = match ident.to_string().as_str() {
                    "bool" => Some(quote!(Boolean)),
                    "i8" => Some(quote!(Int8)),
                    "i16" => Some(quote!(Int16)),
                    "i32" => Some(quote!(Int32)),
                    "i64" => Some(quote!(Int64)),
                    "u8" => Some(quote!(UInt8)),
                    "u16" => Some(quote!(UInt16)),
                    "u32" => Some(quote!(UInt32)),
                    "u64" => Some(quote!(UInt64)),
                    "f32" => Some(quote!(Float32)),
                    "f64" => Some(quote!(Float64)),
                    _ => None,
                };
                if let Some(simple) = simple {
                    return quote!(::silo::FieldType::#simple);
                }
            }
            if matches_path(path, &["std", "string", "String"])
                || matches_path(path, &["std", "borrow", "Cow"])
            {
                quote!(::silo::FieldType::String)
            } else if matches_path(path, &["time", "Date"]) {
                quote!(::silo::FieldType::Date)
            } else if matches_path(path, &["time", "OffsetDateTime"])
                || matches_path(path, &["time", "PrimitiveDateTime"])
            {
                quote!(::silo::FieldType::DateTime(None))
            } else if matches_path(path, &["uuid", "Uuid"]) {
                quote!(::silo::FieldType::Uuid)
            } else if matches_path(path, &["std", "net", "Ipv4Addr"]) {
                quote!(::silo::FieldType::IPv4)
            } else if matches_path(path, &["std", "net", "Ipv6Addr"]) {
                quote!(::silo::FieldType::IPv6)
            } else if matches_path(path, &["rust_decimal", "Decimal"]) {
                panic!(
                    "Decimal fields require the precision and scale, declare it like: `#[silo(type = \"Decimal(9, 2)\")]`"
                );
            } else if matches_path(path, &["std", "option", "Option"]) {
                let inner = decode_type(generic_types(path)[0]);
                quote!(::silo::FieldType::nullable(#inner)?)
            } else if matches_path(path, &["std", "vec", "Vec"])
                || matches_path(path, &["std", "collections", "VecDeque"])
            {
                let inner = decode_type(generic_types(path)[0]);
                quote!(::silo::FieldType::array(#inner)?)
            } else if matches_path(path, &["std", "collections", "BTreeMap"])
                || matches_path(path, &["std", "collections", "HashMap"])
            {
                let types = generic_types(path);
                let [key, value, ..] = types.as_slice() else {
                    panic!(
                        "Type `{}` must have two generic arguments",
                        path.to_token_stream()
                    );
                };
                let key = decode_type(key);
                let value = decode_type(value);
                quote!(::silo::FieldType::map(#key, #value)?)
            } else if matches_path(path, &["std", "boxed", "Box"])
                || matches_path(path, &["std", "sync", "Arc"])
            {
                match generic_types(path)[0] {
                    Type::Slice(slice) if slice.elem.to_token_stream().to_string() == "u8" => {
                        quote!(::silo::FieldType::String)
                    }
                    inner => decode_type(inner),
                }
            } else {
                panic!(
                    "Cannot infer the column type of `{}`, declare it like: `#[silo(type = \"String\")]`",
                    path.to_token_stream()
                );
            }
        }
        Type::Tuple(TypeTuple { elems, .. }) if !elems.is_empty() => {
            let items = elems.iter().map(decode_type);
            quote!(::silo::FieldType::tuple([#(#items),*])?)
        }
        Type::Reference(reference) => decode_type(&reference.elem),
        _ => panic!(
            "Cannot infer the column type of `{}`, declare it like: `#[silo(type = \"String\")]`",
            ty.to_token_stream()
        ),
    }
}
