//! Procedural derive for `yamlfig`.
//!
//! `#[derive(Yamlfig)]` implements two traits for a named-field struct:
//!
//! - `yamlfig::Fields` — the shape walk producing one `FieldInfo` per
//!   reachable field, with flag aliases, doc-comment descriptions, and
//!   declared defaults (computed by diffing a defaulted instance against a
//!   zero one, which is why the struct must implement `Default` and
//!   `Serialize`).
//! - `yamlfig::ApplyDefaults` — the recursive defaults walk over the actual
//!   value graph.
//!
//! Recognized attributes:
//!
//! - `#[yamlfig(defaults)]` on the struct: the type implements
//!   `yamlfig::DefaultSetter` and wants it invoked during both walks.
//! - `#[yamlfig(flag = "n")]` on a field: a whole-token alias for the field.
//! - `#[yamlfig(rename = "other")]` on a field: the path segment to use
//!   instead of the field name.
//! - `#[yamlfig(skip)]` on a field: excluded from collection and from the
//!   defaults walk.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Expr, ExprLit, Fields, Ident, Lit, LitStr, Meta, Type,
    parse_macro_input};

#[proc_macro_derive(Yamlfig, attributes(yamlfig))]
pub fn derive_yamlfig(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

struct FieldSpec {
    ident: Ident,
    ty: Type,
    name: String,
    flag: Option<String>,
    description: Option<String>,
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Yamlfig does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Yamlfig requires named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Yamlfig can only be derived for structs",
            ));
        }
    };

    let has_defaults = struct_opts(&input.attrs)?;
    let specs = field_specs(fields)?;

    let type_name = ident.to_string();

    let own_setter_collect = has_defaults.then(|| {
        quote! {
            ::yamlfig::DefaultSetter::set_defaults(&mut _defaulted);
            _applied = true;
        }
    });

    let collect_fields = specs.iter().enumerate().map(|(order, spec)| {
        let field_ident = &spec.ident;
        let ty = &spec.ty;
        let name = &spec.name;
        let flag = option_string(spec.flag.as_deref());
        let description = option_string(spec.description.as_deref());
        quote! {
            ctx.enter(#name, ::yamlfig::FieldMeta {
                flag: #flag,
                description: #description,
                default: _declared.as_ref().and_then(|(defaulted, zero)| {
                    ::yamlfig::declared_default(&defaulted.#field_ident, &zero.#field_ident)
                }),
                order: #order,
            });
            <#ty as ::yamlfig::Fields>::collect(ctx);
            ctx.exit();
        }
    });

    let own_setter_walk = has_defaults.then(|| {
        quote! { ::yamlfig::DefaultSetter::set_defaults(self); }
    });

    let walk_fields = specs.iter().map(|spec| {
        let field_ident = &spec.ident;
        quote! {
            ::yamlfig::ApplyDefaults::apply_defaults(&mut self.#field_ident, registry);
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl ::yamlfig::Fields for #ident {
            fn collect(ctx: &mut ::yamlfig::Collector<'_>) {
                if !ctx.enter_type(::core::any::TypeId::of::<Self>(), #type_name) {
                    return;
                }
                ctx.emit(::yamlfig::FieldKind::Struct);
                let _declared: ::core::option::Option<(Self, Self)> = {
                    let mut _defaulted = <Self as ::core::default::Default>::default();
                    let _zero = <Self as ::core::default::Default>::default();
                    let mut _applied = false;
                    #own_setter_collect
                    if ctx.apply_registered(&mut _defaulted) {
                        _applied = true;
                    }
                    if _applied {
                        ::core::option::Option::Some((_defaulted, _zero))
                    } else {
                        ::core::option::Option::None
                    }
                };
                #( #collect_fields )*
                ctx.exit_type();
            }
        }

        #[automatically_derived]
        impl ::yamlfig::ApplyDefaults for #ident {
            fn apply_defaults(&mut self, registry: &::yamlfig::SetterRegistry) {
                #own_setter_walk
                registry.invoke(self);
                #( #walk_fields )*
            }
        }
    })
}

/// Parse struct-level `#[yamlfig(..)]` attributes. Returns whether the
/// struct is marked `defaults`.
fn struct_opts(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut has_defaults = false;
    for attr in attrs {
        if !attr.path().is_ident("yamlfig") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("defaults") {
                has_defaults = true;
                Ok(())
            } else {
                Err(meta.error("unrecognized yamlfig struct attribute"))
            }
        })?;
    }
    Ok(has_defaults)
}

fn field_specs(
    fields: &syn::punctuated::Punctuated<syn::Field, syn::Token![,]>,
) -> syn::Result<Vec<FieldSpec>> {
    let mut specs = Vec::new();
    for field in fields {
        let ident = field.ident.clone().ok_or_else(|| {
            syn::Error::new_spanned(field, "Yamlfig requires named fields")
        })?;

        let mut flag = None;
        let mut rename = None;
        let mut skip = false;
        for attr in &field.attrs {
            if !attr.path().is_ident("yamlfig") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("flag") {
                    let value: LitStr = meta.value()?.parse()?;
                    flag = Some(value.value());
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unrecognized yamlfig field attribute"))
                }
            })?;
        }
        if skip {
            continue;
        }

        specs.push(FieldSpec {
            name: rename.unwrap_or_else(|| ident.to_string()),
            description: doc_string(&field.attrs),
            ty: field.ty.clone(),
            ident,
            flag,
        });
    }
    Ok(specs)
}

/// Join a field's `///` doc comment lines into one description.
fn doc_string(attrs: &[syn::Attribute]) -> Option<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(name_value) = &attr.meta
            && let Expr::Lit(ExprLit {
                lit: Lit::Str(text),
                ..
            }) = &name_value.value
        {
            lines.push(text.value().trim().to_string());
        }
    }
    (!lines.is_empty()).then(|| lines.join(" "))
}

fn option_string(value: Option<&str>) -> proc_macro2::TokenStream {
    match value {
        Some(value) => quote! {
            ::core::option::Option::Some(::std::string::String::from(#value))
        },
        None => quote! { ::core::option::Option::None },
    }
}
