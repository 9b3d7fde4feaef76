use syn::ext::IdentExt;

#[derive(Debug)]
pub enum NestedItem {
    Class(syn::LitStr),
    Rename(syn::LitStr),
    Association(syn::Ident, syn::LitStr),
    Ignored,
}

fn association_kind(attr: &syn::Ident) -> Option<&'static str> {
    match attr.to_string().as_str() {
        "many_to_one" => Some("ManyToOne"),
        "one_to_one" => Some("OneToOne"),
        "one_to_many" => Some("OneToMany"),
        "many_to_many" => Some("ManyToMany"),
        _ => None,
    }
}

impl syn::parse::Parse for NestedItem {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let attr = input.call(syn::Ident::parse_any)?;
        match attr.to_string().as_str() {
            "class" => {
                // class = "App\\Entity\\Book"
                let _: syn::Token![=] = input.parse()?;
                Ok(NestedItem::Class(input.parse()?))
            }
            "rename" => {
                let _: syn::Token![=] = input.parse()?;
                Ok(NestedItem::Rename(input.parse()?))
            }
            "exclude" => Ok(NestedItem::Ignored),
            _ => {
                if let Some(kind) = association_kind(&attr) {
                    // many_to_one = "Author"
                    let _: syn::Token![=] = input.parse()?;
                    let target: syn::LitStr = input.parse()?;
                    Ok(NestedItem::Association(
                        syn::Ident::new(kind, attr.span()),
                        target,
                    ))
                } else {
                    Err(syn::Error::new_spanned(
                        attr,
                        "unsupported nested attribute",
                    ))
                }
            }
        }
    }
}

#[derive(Debug)]
pub enum NestedMapping {
    Field,
    Association {
        kind: syn::Ident,
        target: syn::LitStr,
    },
    Excluded,
}

#[derive(Debug)]
pub struct NestedMeta {
    pub class: Option<syn::LitStr>,
    pub name: Option<syn::LitStr>,
    pub mapping: NestedMapping,
}

impl syn::parse::Parse for NestedMeta {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let mut class = None;
        let mut name = None;
        let mut association = None;
        let mut excluded = false;

        let punc =
            syn::punctuated::Punctuated::<NestedItem, syn::Token![,]>::parse_terminated(input)?;

        for item in punc {
            match item {
                NestedItem::Class(c) => class = Some(c),
                NestedItem::Rename(n) => name = Some(n),
                NestedItem::Association(kind, target) => {
                    if association.is_some() {
                        return Err(syn::Error::new_spanned(
                            kind,
                            "a field can only declare one association",
                        ));
                    }
                    association = Some((kind, target));
                }
                NestedItem::Ignored => excluded = true,
            }
        }

        let mapping = if excluded {
            NestedMapping::Excluded
        } else if let Some((kind, target)) = association {
            NestedMapping::Association { kind, target }
        } else {
            NestedMapping::Field
        };

        Ok(Self {
            class,
            name,
            mapping,
        })
    }
}
