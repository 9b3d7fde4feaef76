use proc_macro::{self, TokenStream};

use proc_macro2 as pm2;

mod attributes;
mod entity;

/// Derive the `Entity` trait, describing the mapping of a struct.
///
/// This is only implemented for structs with named fields. Every field
/// is mapped as a scalar field unless annotated otherwise. The
/// annotations use the `nested` attribute, which has the following
/// options:
///
/// - `#[nested(class = "App\\Entity\\Book")]` On the struct, set the
///   class name the metadata is registered under. By default this is
///   the name of the struct.
///
/// - `#[nested(rename = "new_name")]` Map the annotated member as
///   `new_name` instead of using its name in the source code.
///
/// - `#[nested(exclude)]` Do not map this field at all.
///
/// - `#[nested(many_to_one = "Author")]` The field is an association
///   to the class `Author`. Likewise `one_to_one`, `one_to_many` and
///   `many_to_many`. Only the first two can be traversed by nested
///   filters.
#[proc_macro_derive(Entity, attributes(nested))]
pub fn entity(input: TokenStream) -> TokenStream {
    let derive: syn::DeriveInput = syn::parse_macro_input!(input);

    let res: pm2::TokenStream = entity::derive_entity(derive);

    res.into()
}
