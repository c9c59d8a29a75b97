//! Proc macros for Claude tool definitions.
//!
//! `#[derive(Tool)]` turns a struct whose fields are the tool's input into a
//! `claude::Tool` with a JSON schema, so the schema the model sees and the
//! type the response decodes into cannot drift apart.
//!
//! # Example
//!
//! ```ignore
//! /// Report the outcome of one turn
//! #[derive(Tool, Deserialize)]
//! #[tool(name = "report_turn", rename_all = "camelCase")]
//! struct ReportTurn {
//!     /// What happened, in prose
//!     narrative: String,
//!     /// The full game state after the turn
//!     #[tool(schema = "crate::state::game_state_schema")]
//!     game_state: GameState,
//!     /// Dice rolled this turn, if any
//!     dice_roll_details: Option<String>,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, DeriveInput, Expr, Field, Lit, LitStr, Meta, Type};

/// Derive macro for tool definitions.
///
/// # Attributes
///
/// On the struct:
/// - `name = "..."` overrides the tool name (defaults to the snake_case struct name)
/// - `rename_all = "camelCase"` renames every field in the schema
///
/// On fields:
/// - `rename = "..."` overrides one field's schema name
/// - `optional` leaves the field out of `required`
/// - `schema = "path::to::fn"` uses `fn() -> serde_json::Value` as the field schema
#[proc_macro_derive(Tool, attributes(tool))]
pub fn derive_tool(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_tool(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

#[derive(Default)]
struct StructOptions {
    name: Option<String>,
    camel_case: bool,
}

#[derive(Default)]
struct FieldOptions {
    rename: Option<String>,
    optional: bool,
    schema: Option<syn::Path>,
}

fn expand_tool(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let options = struct_options(&input.attrs)?;

    let tool_name = options
        .name
        .clone()
        .unwrap_or_else(|| to_snake_case(&struct_name.to_string()));
    let description = doc_comment(&input.attrs);

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Tool derive only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Tool derive only supports structs",
            ))
        }
    };

    let mut property_tokens = Vec::new();
    let mut required_fields = Vec::new();

    for field in fields {
        let field_options = field_options(field)?;
        let name = schema_name(field, &field_options, &options)?;
        let field_desc = doc_comment(&field.attrs);

        let type_schema = match &field_options.schema {
            Some(path) => quote! { #path() },
            None => type_to_schema(&field.ty),
        };

        let desc_token = if field_desc.is_empty() {
            quote! {}
        } else {
            quote! { property["description"] = serde_json::json!(#field_desc); }
        };

        property_tokens.push(quote! {
            {
                let mut property = #type_schema;
                #desc_token
                properties.insert(#name.to_string(), property);
            }
        });

        if !field_options.optional && !is_option_type(&field.ty) {
            required_fields.push(name);
        }
    }

    Ok(quote! {
        impl #struct_name {
            pub fn tool_name() -> &'static str {
                #tool_name
            }

            pub fn tool_description() -> &'static str {
                #description
            }

            /// JSON schema for this tool's input.
            pub fn input_schema() -> serde_json::Value {
                let mut properties = serde_json::Map::new();
                #(#property_tokens)*

                let required: Vec<&str> = vec![#(#required_fields),*];

                serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required
                })
            }

            pub fn as_tool() -> claude::Tool {
                claude::Tool {
                    name: Self::tool_name().to_string(),
                    description: Self::tool_description().to_string(),
                    input_schema: Self::input_schema(),
                }
            }
        }
    })
}

fn struct_options(attrs: &[Attribute]) -> syn::Result<StructOptions> {
    let mut options = StructOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("tool")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                options.name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else if meta.path.is_ident("rename_all") {
                let style = meta.value()?.parse::<LitStr>()?;
                match style.value().as_str() {
                    "camelCase" => options.camel_case = true,
                    "snake_case" => options.camel_case = false,
                    _ => return Err(syn::Error::new_spanned(style, "expected \"camelCase\" or \"snake_case\"")),
                }
                Ok(())
            } else {
                Err(meta.error("unsupported tool attribute"))
            }
        })?;
    }
    Ok(options)
}

fn field_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("tool")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                options.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else if meta.path.is_ident("optional") {
                options.optional = true;
                Ok(())
            } else if meta.path.is_ident("schema") {
                options.schema = Some(meta.value()?.parse::<LitStr>()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported tool field attribute"))
            }
        })?;
    }
    Ok(options)
}

fn schema_name(field: &Field, field_options: &FieldOptions, options: &StructOptions) -> syn::Result<String> {
    if let Some(rename) = &field_options.rename {
        return Ok(rename.clone());
    }
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    let name = ident.to_string();
    let name = name.strip_prefix("r#").unwrap_or(&name);
    Ok(if options.camel_case {
        to_camel_case(name)
    } else {
        name.to_string()
    })
}

fn doc_comment(attrs: &[Attribute]) -> String {
    let mut docs = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("doc")) {
        if let Meta::NameValue(nv) = &attr.meta {
            if let Expr::Lit(expr_lit) = &nv.value {
                if let Lit::Str(s) = &expr_lit.lit {
                    docs.push(s.value().trim().to_string());
                }
            }
        }
    }
    docs.join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "Option")
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last(),
        _ => None,
    }
}

fn first_type_argument(segment: &syn::PathSegment) -> Option<&Type> {
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}

fn type_to_schema(ty: &Type) -> TokenStream2 {
    let Some(segment) = last_segment(ty) else {
        return quote! { serde_json::json!({}) };
    };

    match segment.ident.to_string().as_str() {
        "String" | "str" => quote! { serde_json::json!({"type": "string"}) },
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
            quote! { serde_json::json!({"type": "integer"}) }
        }
        "f32" | "f64" => quote! { serde_json::json!({"type": "number"}) },
        "bool" => quote! { serde_json::json!({"type": "boolean"}) },
        "Option" | "Box" => match first_type_argument(segment) {
            Some(inner) => type_to_schema(inner),
            None => quote! { serde_json::json!({}) },
        },
        "Vec" => match first_type_argument(segment) {
            Some(inner) => {
                let inner_schema = type_to_schema(inner);
                quote! {
                    serde_json::json!({
                        "type": "array",
                        "items": #inner_schema
                    })
                }
            }
            None => quote! { serde_json::json!({"type": "array"}) },
        },
        _ => quote! { serde_json::json!({"type": "object"}) },
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut upper_next = false;
    for c in s.chars() {
        if c == '_' {
            upper_next = !result.is_empty();
        } else if upper_next {
            result.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
