use proc_macro2 as pm2;
use syn::ext::IdentExt;

use crate::attributes::{NestedMapping, NestedMeta};

pub fn derive_entity(input: syn::DeriveInput) -> pm2::TokenStream {
    let syn::DeriveInput {
        ident,
        data,
        generics,
        attrs,
        ..
    } = input;

    let mut class = syn::LitStr::new(&ident.unraw().to_string(), ident.span());
    for attr in attrs.iter() {
        if attr.path.is_ident("nested") {
            let parsed = match attr.parse_args::<NestedMeta>() {
                Ok(parsed) => parsed,
                Err(e) => {
                    return syn::Error::into_compile_error(e);
                }
            };
            if parsed.name.is_some() || !matches!(parsed.mapping, NestedMapping::Field) {
                return syn::Error::new_spanned(
                    attr,
                    "only `class` can be given on the struct itself",
                )
                .to_compile_error();
            }
            if let Some(c) = parsed.class {
                class = c;
            }
        }
    }

    let mut body = pm2::TokenStream::new();

    let (generics, ty_generics, wc) = generics.split_for_impl();

    if let syn::Data::Struct(s) = data {
        if let syn::Fields::Named(syn::FieldsNamed { named, .. }) = s.fields {
            for field in named.iter() {
                let fieldid = match field.ident.as_ref() {
                    Some(id) => id,
                    None => continue,
                };
                let mut fieldname =
                    syn::LitStr::new(&fieldid.unraw().to_string(), fieldid.span());
                let mut mapping = NestedMapping::Field;

                for attr in field.attrs.iter() {
                    if attr.path.is_ident("nested") {
                        let parsed = match attr.parse_args::<NestedMeta>() {
                            Ok(parsed) => parsed,
                            Err(e) => {
                                return syn::Error::into_compile_error(e);
                            }
                        };
                        if parsed.class.is_some() {
                            return syn::Error::new_spanned(
                                attr,
                                "`class` can only be given on the struct",
                            )
                            .to_compile_error();
                        }
                        if let Some(name) = parsed.name {
                            fieldname = name;
                        }
                        if !matches!(parsed.mapping, NestedMapping::Field) {
                            mapping = parsed.mapping;
                        }
                    }
                }

                match mapping {
                    NestedMapping::Field => body.extend(quote::quote! {
                        metadata.add_field(#fieldname);
                    }),
                    NestedMapping::Association { kind, target } => body.extend(quote::quote! {
                        metadata.add_association(
                            #fieldname,
                            ::nested_filter::metadata::AssociationKind::#kind,
                            #target,
                        );
                    }),
                    NestedMapping::Excluded => {}
                }
            }
        } else {
            return syn::Error::new(
                ident.span(),
                "Entity can only be derived for structs with named fields.",
            )
            .to_compile_error();
        }
    } else {
        return syn::Error::new(
            ident.span(),
            "Entity can only be derived for structs with named fields.",
        )
        .to_compile_error();
    }

    quote::quote! {
        #[automatically_derived]
        impl #generics ::nested_filter::metadata::Entity for #ident #ty_generics #wc {
            fn metadata() -> ::nested_filter::metadata::EntityMetadata {
                let mut metadata = ::nested_filter::metadata::EntityMetadata::new(#class);
                #body
                metadata
            }
        }
    }
}
