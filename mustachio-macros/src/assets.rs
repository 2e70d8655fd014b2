use glob::glob;
use proc_macro::TokenStream;
use quote::quote;
use std::env;
use std::path::PathBuf;
use syn::{LitStr, parse_macro_input};

pub fn embed_partials_impl(input: TokenStream) -> TokenStream {
    let pattern = parse_macro_input!(input as LitStr);
    let pattern_str = pattern.value();

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return syn::Error::new(pattern.span(), "CARGO_MANIFEST_DIR is not set")
            .to_compile_error()
            .into();
    };
    let full_pattern = PathBuf::from(manifest_dir).join(&pattern_str);

    let mut files: Vec<PathBuf> = match glob(&full_pattern.to_string_lossy()) {
        Ok(paths) => paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            return syn::Error::new(pattern.span(), format!("invalid glob pattern: {}", e))
                .to_compile_error()
                .into();
        }
    };
    files.sort();

    let entries: Vec<_> = files
        .iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            let path = path.to_string_lossy().into_owned();
            // include_str! makes the build track the file
            Some(quote! { (#stem, include_str!(#path)) })
        })
        .collect();

    let output = quote! {
        {
            let entries: &[(&str, &str)] = &[
                #(#entries),*
            ];
            ::mustachio::MemoryLoader::from_entries(entries.iter().copied())
        }
    };
    output.into()
}
