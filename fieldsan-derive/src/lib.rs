//! `#[derive(Record)]` for fieldsan-core.
//!
//! Generates the `Record` and `Node` impls for a struct. Field directives are
//! attached with the `tag` attribute, one `key = "value"` pair per tag key:
//!
//! ```rust,ignore
//! #[derive(Record)]
//! struct Order {
//!     #[tag(san = "trim,max=32")]
//!     reference: String,
//!     #[tag(san = "min=1,max=99", audit = "qty")]
//!     quantity: u32,
//!     #[tag(skip)]
//!     handle: std::fs::File,
//! }
//! ```
//!
//! Skipped fields need not implement `Node`; every other field must. Records
//! must be `'static`, so types with lifetime parameters are rejected.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Field, Index, LitStr};

#[proc_macro_derive(Record, attributes(tag))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Parsed `#[tag(...)]` attributes of one field.
#[derive(Default)]
struct FieldTags {
    pairs: Vec<(String, String)>,
    skip: bool,
}

fn parse_field_tags(field: &Field) -> syn::Result<FieldTags> {
    let mut tags = FieldTags::default();
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("tag")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                tags.skip = true;
                return Ok(());
            }
            let key = meta
                .path
                .get_ident()
                .ok_or_else(|| meta.error("expected `key = \"directives\"` or `skip`"))?
                .unraw()
                .to_string();
            let value: LitStr = meta.value()?.parse()?;
            tags.pairs.push((key, value.value()));
            Ok(())
        })?;
    }
    Ok(tags)
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let record_name = ident.to_string();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "`Record` can only be derived for structs",
            ))
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "`Record` can only be derived for structs",
            ))
        }
    };

    if let Some(param) = input.generics.lifetimes().next() {
        return Err(syn::Error::new(
            param.lifetime.apostrophe,
            "`Record` can not be derived for types with lifetime parameters",
        ));
    }

    let mut accessors = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let tags = parse_field_tags(field)?;
        if tags.skip {
            continue;
        }
        let (member, field_name) = match &field.ident {
            Some(name) => (quote!(#name), name.unraw().to_string()),
            None => {
                let position = Index::from(index);
                (quote!(#position), index.to_string())
            }
        };
        let keys = tags.pairs.iter().map(|(key, _)| key);
        let values = tags.pairs.iter().map(|(_, value)| value);
        accessors.push(quote! {
            ::fieldsan_core::FieldMut::new(
                #field_name,
                ::fieldsan_core::Tags::new(&[#((#keys, #values)),*]),
                &mut self.#member,
            )
        });
    }

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::fieldsan_core::Node));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::fieldsan_core::Record for #ident #ty_generics #where_clause {
            fn record_name(&self) -> &'static str {
                #record_name
            }

            fn fields_mut(&mut self) -> ::std::vec::Vec<::fieldsan_core::FieldMut<'_>> {
                ::std::vec![#(#accessors),*]
            }
        }

        impl #impl_generics ::fieldsan_core::Node for #ident #ty_generics #where_clause {
            fn collect_records<'a>(
                &'a mut self,
                out: &mut ::std::vec::Vec<&'a mut dyn ::fieldsan_core::Record>,
            ) {
                out.push(self);
            }

            fn root(&mut self) -> ::fieldsan_core::Root<'_> {
                ::fieldsan_core::Root::Record(self)
            }
        }
    })
}
