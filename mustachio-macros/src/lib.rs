mod assets;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields as SynFields, Ident, LitStr, parse_macro_input};

/// Derives `mustachio::Fields` for a struct with named fields.
///
/// Every field is exposed under its own name through `mustachio::to_value`,
/// so each field type must implement `serde::Serialize`. Supported
/// attributes:
///
/// - `#[fields(skip)]` on a field hides it from templates;
/// - `#[fields(rename = "other")]` on a field exposes it as `other`;
/// - `#[fields(methods(a, b))]` on the struct exposes zero-argument methods
///   `a` and `b` under their names.
///
/// The type must implement `Debug` and `Display` itself.
#[proc_macro_derive(Fields, attributes(fields))]
pub fn derive_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_fields(&input) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Embeds partial files matching a glob (relative to the crate root) and
/// expands to a `mustachio::MemoryLoader` holding them, keyed by file stem.
#[proc_macro]
pub fn embed_partials(input: TokenStream) -> TokenStream {
    assets::embed_partials_impl(input)
}

fn expand_fields(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let named = match &input.data {
        Data::Struct(s) => match &s.fields {
            SynFields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Fields can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Fields can only be derived for structs",
            ));
        }
    };

    let mut arms = Vec::new();
    for field in named {
        let Some(ident) = &field.ident else {
            continue;
        };
        let mut key = ident.to_string();
        let mut skip = false;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("fields")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    key = lit.value();
                    Ok(())
                } else {
                    Err(meta.error("expected `skip` or `rename = \"...\"`"))
                }
            })?;
        }
        if skip {
            continue;
        }
        arms.push(quote! {
            #key => ::mustachio::to_value(&self.#ident).ok(),
        });
    }

    for method in struct_methods(input)? {
        let key = method.to_string();
        arms.push(quote! {
            #key => ::mustachio::to_value(&self.#method()).ok(),
        });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::mustachio::Fields for #name #ty_generics #where_clause {
            fn field(&self, name: &str) -> ::core::option::Option<::mustachio::Value> {
                match name {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

fn struct_methods(input: &DeriveInput) -> syn::Result<Vec<Ident>> {
    let mut methods = Vec::new();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("fields")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("methods") {
                meta.parse_nested_meta(|m| {
                    let ident = m
                        .path
                        .get_ident()
                        .cloned()
                        .ok_or_else(|| m.error("expected a method name"))?;
                    methods.push(ident);
                    Ok(())
                })
            } else {
                Err(meta.error("expected `methods(...)`"))
            }
        })?;
    }
    Ok(methods)
}
