//! fluent-check derive: member enumeration for user types
//!
//! `#[derive(Inspect)]` implements `fluent_check::Inspect` by listing the
//! members of a struct or of each enum variant, so the structural comparer
//! and the formatter can walk user types without runtime reflection.
//!
//! ```ignore
//! use fluent_check::Inspect;
//!
//! #[derive(Inspect)]
//! struct Account {
//!     #[inspect(rename = "owner")]
//!     name: String,
//!     #[inspect(skip)]
//!     cache: Vec<u8>,
//! }
//!
//! #[derive(Inspect)]
//! #[inspect(by_value)]
//! struct Money(i64);
//! ```
//!
//! # Attributes
//!
//! Container:
//! - `#[inspect(by_value)]` - value-like aggregate, named "struct" in messages
//! - `#[inspect(display)]` - render with the type's `Display` impl
//! - `#[inspect(name = "...")]` - type name shown in messages
//!
//! Field:
//! - `#[inspect(skip)]` - leave the field out of comparison and display
//! - `#[inspect(rename = "...")]` - member name used in paths and display

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Field, Fields, LitStr,
};

/// Derive `fluent_check::Inspect`.
///
/// Structs become records, enums become variants. Type parameters get an
/// `Inspect` bound. Types without generic parameters also expose themselves
/// through `as_any`, which lets registered equality operators apply.
#[proc_macro_derive(Inspect, attributes(inspect))]
pub fn derive_inspect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// ============================================================================
// Attribute parsing
// ============================================================================

#[derive(Debug, Default, PartialEq, Eq)]
struct ContainerOptions {
    by_value: bool,
    display: bool,
    name: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FieldOptions {
    skip: bool,
    rename: Option<String>,
}

/// Read `#[inspect(...)]` on the type
fn container_options(attrs: &[Attribute]) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("inspect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("by_value") {
                options.by_value = true;
            } else if meta.path.is_ident("display") {
                options.display = true;
            } else if meta.path.is_ident("name") {
                options.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("expected `by_value`, `display` or `name`"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

/// Read `#[inspect(...)]` on a field
fn field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("inspect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("rename") {
                options.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("expected `skip` or `rename`"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

/// Member name of a field: the rename, the identifier, or the position
fn member_label(field: &Field, index: usize, options: &FieldOptions) -> String {
    if let Some(rename) = &options.rename {
        return rename.clone();
    }
    field.ident.as_ref().map_or_else(
        || index.to_string(),
        |ident| ident.to_string().trim_start_matches("r#").to_string(),
    )
}

// ============================================================================
// Expansion
// ============================================================================

/// One member to record: its label and the expression of its value
struct MemberCall {
    label: String,
    value: TokenStream2,
}

fn member_calls(calls: &[MemberCall]) -> TokenStream2 {
    let calls = calls.iter().map(|MemberCall { label, value }| {
        quote! { .field(#label, #value) }
    });
    quote! { #(#calls)* }
}

fn layout(fields: &Fields) -> TokenStream2 {
    match fields {
        Fields::Unnamed(_) => quote! { .positional() },
        Fields::Named(_) | Fields::Unit => TokenStream2::new(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let options = container_options(&input.attrs)?;
    let name = &input.ident;

    let category = match (&input.data, options.by_value) {
        (Data::Enum(_), _) => format_ident!("Enum"),
        (_, true) => format_ident!("Struct"),
        (_, false) => format_ident!("Object"),
    };
    let info = match &options.name {
        Some(display_name) => quote! {
            ::fluent_check::TypeInfo::named(
                ::core::any::type_name::<Self>(),
                #display_name,
                <Self as ::fluent_check::Inspect>::category(),
            )
        },
        None => quote! {
            ::fluent_check::TypeInfo::of::<Self>(<Self as ::fluent_check::Inspect>::category())
        },
    };
    let display = if options.display {
        quote! { .display(::std::string::ToString::to_string(self)) }
    } else {
        TokenStream2::new()
    };

    let body = match &input.data {
        Data::Struct(data) => {
            let mut calls = Vec::new();
            for (index, field) in data.fields.iter().enumerate() {
                let field_opts = field_options(&field.attrs)?;
                if field_opts.skip {
                    continue;
                }
                let access = field.ident.as_ref().map_or_else(
                    || {
                        let index = syn::Index::from(index);
                        quote! { &self.#index }
                    },
                    |ident| quote! { &self.#ident },
                );
                calls.push(MemberCall {
                    label: member_label(field, index, &field_opts),
                    value: access,
                });
            }
            let calls = member_calls(&calls);
            let layout = layout(&data.fields);
            quote! {
                capture.record(#info) #calls #layout #display .finish()
            }
        }
        Data::Enum(data) => {
            let mut arms = Vec::new();
            for variant in &data.variants {
                let variant_ident = &variant.ident;
                let variant_name = variant_ident.to_string();
                let mut calls = Vec::new();
                let mut bindings = Vec::new();
                for (index, field) in variant.fields.iter().enumerate() {
                    let field_opts = field_options(&field.attrs)?;
                    let binding = format_ident!("__inspect_{}", index);
                    match (&field.ident, field_opts.skip) {
                        (Some(_), true) => {}
                        (Some(ident), false) => bindings.push(quote! { #ident: #binding }),
                        (None, true) => bindings.push(quote! { _ }),
                        (None, false) => bindings.push(quote! { #binding }),
                    }
                    if !field_opts.skip {
                        calls.push(MemberCall {
                            label: member_label(field, index, &field_opts),
                            value: quote! { #binding },
                        });
                    }
                }
                let pattern = match &variant.fields {
                    Fields::Named(_) => quote! { Self::#variant_ident { #(#bindings,)* .. } },
                    Fields::Unnamed(_) => quote! { Self::#variant_ident ( #(#bindings),* ) },
                    Fields::Unit => quote! { Self::#variant_ident },
                };
                let calls = member_calls(&calls);
                let layout = layout(&variant.fields);
                arms.push(quote! {
                    #pattern => capture
                        .variant(#info, #variant_name) #calls #layout #display
                        .finish(),
                });
            }
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Inspect cannot be derived for unions",
            ))
        }
    };

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::fluent_check::Inspect));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let as_any = if input.generics.params.is_empty() {
        quote! {
            fn as_any(&self) -> ::core::option::Option<&dyn ::core::any::Any> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        TokenStream2::new()
    };

    Ok(quote! {
        impl #impl_generics ::fluent_check::Inspect for #name #ty_generics #where_clause {
            fn category() -> ::fluent_check::Category {
                ::fluent_check::Category::#category
            }

            fn inspect(&self, capture: &mut ::fluent_check::Capture) -> ::fluent_check::NodeId {
                #body
            }

            #as_any
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn expand_str(input: DeriveInput) -> String {
        expand(&input).unwrap().to_string()
    }

    mod attributes {
        use super::*;

        #[test]
        fn test_container_options() {
            let input: DeriveInput = parse_quote! {
                #[inspect(by_value, display)]
                #[inspect(name = "Money")]
                struct Cents(i64);
            };
            let options = container_options(&input.attrs).unwrap();
            assert_eq!(
                options,
                ContainerOptions {
                    by_value: true,
                    display: true,
                    name: Some("Money".to_string()),
                }
            );
        }

        #[test]
        fn test_unknown_container_option_rejected() {
            let input: DeriveInput = parse_quote! {
                #[inspect(flatten)]
                struct S;
            };
            assert!(container_options(&input.attrs).is_err());
        }

        #[test]
        fn test_field_options_and_labels() {
            let input: DeriveInput = parse_quote! {
                struct S {
                    #[inspect(rename = "owner")]
                    name: String,
                    #[inspect(skip)]
                    cache: Vec<u8>,
                    r#type: u8,
                }
            };
            let Data::Struct(data) = &input.data else {
                panic!("struct expected");
            };
            let fields: Vec<_> = data.fields.iter().collect();
            let renamed = field_options(&fields[0].attrs).unwrap();
            assert_eq!(member_label(fields[0], 0, &renamed), "owner");
            assert!(field_options(&fields[1].attrs).unwrap().skip);
            let plain = field_options(&fields[2].attrs).unwrap();
            assert_eq!(member_label(fields[2], 2, &plain), "type");
        }

        #[test]
        fn test_other_attributes_ignored() {
            let input: DeriveInput = parse_quote! {
                #[derive(Debug)]
                #[allow(dead_code)]
                struct S;
            };
            assert_eq!(container_options(&input.attrs).unwrap(), ContainerOptions::default());
        }
    }

    mod expansion {
        use super::*;

        #[test]
        fn test_struct_records_members() {
            let out = expand_str(parse_quote! {
                struct Point { x: i32, y: i32 }
            });
            assert!(out.contains("record"));
            assert!(out.contains("\"x\""));
            assert!(out.contains("self . x"));
            assert!(out.contains("fn category () -> :: fluent_check :: Category"));
            assert!(out.contains("Category :: Object"));
            assert!(out.contains("as_any"));
        }

        #[test]
        fn test_tuple_struct_is_positional() {
            let out = expand_str(parse_quote! {
                #[inspect(by_value)]
                struct Money(i64);
            });
            assert!(out.contains("\"0\""));
            assert!(out.contains("self . 0"));
            assert!(out.contains("positional"));
            assert!(out.contains("Category :: Struct"));
        }

        #[test]
        fn test_enum_variants() {
            let out = expand_str(parse_quote! {
                enum Shape { Circle { radius: u32 }, Square(u32), Empty }
            });
            assert!(out.contains("Category :: Enum"));
            assert!(out.contains("variant"));
            assert!(out.contains("\"Circle\""));
            assert!(out.contains("Empty"));
        }

        #[test]
        fn test_generics_bounded_without_any() {
            let out = expand_str(parse_quote! {
                struct Wrapper<T> { inner: T }
            });
            assert!(out.contains(":: fluent_check :: Inspect"));
            assert!(!out.contains("as_any"));
        }

        #[test]
        fn test_display_option() {
            let out = expand_str(parse_quote! {
                #[inspect(display)]
                struct Celsius(f64);
            });
            assert!(out.contains("to_string"));
        }

        #[test]
        fn test_union_rejected() {
            let input: DeriveInput = parse_quote! {
                union U { a: u8, b: i8 }
            };
            assert!(expand(&input).is_err());
        }
    }
}
