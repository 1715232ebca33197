//! # Srx Derive Macros
//!
//! This crate provides the procedural macro behind `#[derive(Reflect)]`.
//! It turns a named-field struct into an implementation of `srx::Reflect`,
//! generating the type descriptor and the descriptor routine that registers
//! every field with the archive.
//!
//! ## Attributes
//!
//! - `#[srx(skip)]` on a field: the field takes no part in serialization.
//! - `#[srx(tag = "Name")]` on the struct: overrides the opaque type tag
//!   (by default the struct's bare identifier). Corresponding types on
//!   sender and receiver are matched by this tag.
//! - `#[srx(version = N, min_version = M)]` on the struct: stamps schema
//!   versions on every reflected instance.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitInt, LitStr};

/// Derives `srx::Reflect` for a named-field struct.
#[proc_macro_derive(Reflect, attributes(srx))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    // 1. Validation: only structs with named fields are supported.
    let fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(named) => named.named,
            _ => {
                return syn::Error::new(
                    name.span(),
                    "Reflect only supports structs with named fields",
                )
                .to_compile_error()
                .into()
            }
        },
        _ => {
            return syn::Error::new(name.span(), "Reflect only supports structs")
                .to_compile_error()
                .into()
        }
    };

    // 2. Struct level configuration.
    let config = match StructConfig::parse(&name, &input.attrs) {
        Ok(config) => config,
        Err(e) => return e.to_compile_error().into(),
    };

    // 3. Member registrations, in declaration order.
    let mut registrations = Vec::new();
    for field in fields {
        let skip = match field_is_skipped(&field.attrs) {
            Ok(skip) => skip,
            Err(e) => return e.to_compile_error().into(),
        };
        if skip {
            continue;
        }
        // Named fields always carry an identifier.
        if let Some(ident) = field.ident {
            let field_name = ident.to_string();
            registrations.push(quote! {
                archive.register_member(self, &self.#ident, #field_name);
            });
        }
    }

    let tag = config.tag;
    let version_stamp = config.version.map(|(version, min_version)| {
        quote! {
            archive.declare_version(self, #version, #min_version);
        }
    });

    let body = if registrations.is_empty() && version_stamp.is_none() {
        quote! { let _ = archive; }
    } else {
        quote! {
            #(#registrations)*
            #version_stamp
        }
    };

    // 4. Expansion.
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let expanded = quote! {
        impl #impl_generics ::srx::Reflect for #name #ty_generics #where_clause {
            fn data_type() -> ::srx::DataType {
                ::srx::DataType::of_class::<Self>(#tag)
            }

            fn describe(&self, archive: &mut ::srx::Archive) {
                #body
            }
        }
    };

    TokenStream::from(expanded)
}

// --- Parsing Logic (Syn 2.0) ---

struct StructConfig {
    tag: String,
    version: Option<(u32, u32)>,
}

impl StructConfig {
    /// Parses `#[srx(...)]` attributes at struct level.
    fn parse(name: &syn::Ident, attrs: &[Attribute]) -> syn::Result<Self> {
        let mut tag = name.to_string();
        let mut version: Option<u32> = None;
        let mut min_version: Option<u32> = None;

        for attr in attrs {
            if attr.path().is_ident("srx") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("tag") {
                        let value: LitStr = meta.value()?.parse()?;
                        tag = value.value();
                        return Ok(());
                    }
                    if meta.path.is_ident("version") {
                        let value: LitInt = meta.value()?.parse()?;
                        version = Some(value.base10_parse()?);
                        return Ok(());
                    }
                    if meta.path.is_ident("min_version") {
                        let value: LitInt = meta.value()?.parse()?;
                        min_version = Some(value.base10_parse()?);
                        return Ok(());
                    }
                    Err(meta.error("unknown srx attribute key"))
                })?;
            }
        }

        let version = match (version, min_version) {
            (None, None) => None,
            (v, m) => Some((v.unwrap_or(0), m.unwrap_or(0))),
        };
        Ok(Self { tag, version })
    }
}

/// Parses `#[srx(...)]` attributes at field level.
fn field_is_skipped(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut skip = false;
    for attr in attrs {
        if attr.path().is_ident("srx") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    return Ok(());
                }
                Err(meta.error("unknown srx attribute key"))
            })?;
        }
    }
    Ok(skip)
}
