//! `#[derive(Reflect)]` for named-field structs.
//!
//! The derive implements `Typed`, `Reflect`, and `Struct`, building the
//! static `TypeInfo` tree the engine's factories match on.
//!
//! Container attributes:
//!
//! * `#[reflect(default)]` — the type's `Default` impl becomes its
//!   construction hook, letting the reflective mapper build instances.
//! * `#[reflect(from_str)]` — the type's `FromStr` impl becomes its
//!   text-parsing hook, so a bare JSON string reads as the type.
//! * `#[reflect(rename = "Name")]` — overrides the final path segment
//!   used in class tags.
//! * `#[reflect(auto_register)]` — the type registers itself into every
//!   new engine's directory (requires the `auto_register` feature and a
//!   non-generic type).
//!
//! Field attributes: `#[reflect(skip)]`, `#[reflect(rename = "...")]`,
//! `#[reflect(since = 2.0)]`, `#[reflect(until = 3.0)]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, LitFloat, LitStr, parse_macro_input, parse_quote};

#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

// -----------------------------------------------------------------------------
// Attribute models

#[derive(Default)]
struct ContainerAttrs {
    default: bool,
    from_str: bool,
    auto_register: bool,
    rename: Option<LitStr>,
}

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    rename: Option<LitStr>,
    since: Option<LitFloat>,
    until: Option<LitFloat>,
}

fn container_attrs(input: &DeriveInput) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("reflect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                out.default = true;
            } else if meta.path.is_ident("from_str") {
                out.from_str = true;
            } else if meta.path.is_ident("auto_register") {
                out.auto_register = true;
            } else if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unknown reflect attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("reflect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("since") {
                out.since = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("until") {
                out.until = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unknown reflect field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

// -----------------------------------------------------------------------------
// Expansion

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "#[derive(Reflect)] only supports structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &input.ident,
            "#[derive(Reflect)] only supports named fields",
        ));
    };

    let attrs = container_attrs(&input)?;
    let ident = &input.ident;
    let is_generic = input.generics.params.iter().any(|p| {
        matches!(
            p,
            syn::GenericParam::Type(_) | syn::GenericParam::Const(_)
        )
    });

    // Every field type flows through the info tree and the cast quartet.
    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param
            .bounds
            .push(parse_quote!(::refson::reflection::Reflect));
        param.bounds.push(parse_quote!(::refson::info::Typed));
        if attrs.default {
            param.bounds.push(parse_quote!(::core::default::Default));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut idents = Vec::new();
    let mut types = Vec::new();
    let mut name_lits = Vec::new();
    let mut field_infos = Vec::new();
    for field in &named.named {
        let fa = field_attrs(field)?;
        let f_ident = field.ident.as_ref().ok_or_else(|| {
            Error::new_spanned(field, "unnamed field in named-field struct")
        })?;
        let f_ty = &field.ty;
        let name = f_ident.to_string();

        let mut info = quote!(::refson::info::NamedField::new::<#f_ty>(#name));
        if let Some(rename) = &fa.rename {
            info = quote!(#info.with_rename(#rename));
        }
        if fa.skip {
            info = quote!(#info.with_skip());
        }
        if let Some(since) = &fa.since {
            info = quote!(#info.with_since(#since));
        }
        if let Some(until) = &fa.until {
            info = quote!(#info.with_until(#until));
        }

        idents.push(f_ident.clone());
        types.push(f_ty.clone());
        name_lits.push(name);
        field_infos.push(info);
    }
    let indices = (0..idents.len()).collect::<Vec<_>>();
    let field_len = idents.len();

    // -- Typed ----------------------------------------------------------------

    let descriptor = match &attrs.rename {
        Some(rename) => quote! {
            ::refson::info::TypeDescriptor::new(
                ::core::any::TypeId::of::<Self>(),
                ::core::concat!(::core::module_path!(), "::", #rename),
            )
        },
        None => quote!(::refson::info::TypeDescriptor::of::<Self>()),
    };
    let with_default = attrs.default.then(|| {
        quote! {
            info = info.with_default(|| {
                ::std::boxed::Box::new(<Self as ::core::default::Default>::default())
            });
        }
    });
    let with_from_text = attrs.from_str.then(|| {
        quote! {
            info = info.with_from_text(|text| {
                <Self as ::core::str::FromStr>::from_str(text)
                    .ok()
                    .map(|v| ::std::boxed::Box::new(v) as ::std::boxed::Box<dyn ::refson::reflection::Reflect>)
            });
        }
    });
    let build_info = quote! {
        #[allow(unused_mut)]
        let mut info = ::refson::info::StructInfo::new(
            #descriptor,
            ::std::vec![#(#field_infos),*],
        );
        #with_default
        #with_from_text
        ::refson::info::TypeInfo::Struct(info)
    };
    let typed_body = if is_generic {
        quote! {
            static CELL: ::refson::info::GenericTypeInfoCell =
                ::refson::info::GenericTypeInfoCell::new();
            CELL.get_or_insert::<Self>(|| { #build_info })
        }
    } else {
        quote! {
            static CELL: ::refson::info::NonGenericTypeInfoCell =
                ::refson::info::NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| { #build_info })
        }
    };

    // -- auto registration ----------------------------------------------------

    let registration = if attrs.auto_register && cfg!(feature = "auto_register") {
        if is_generic {
            return Err(Error::new_spanned(
                ident,
                "#[reflect(auto_register)] requires a non-generic type",
            ));
        }
        quote! {
            const _: () = {
                ::refson::__macro_exports::inventory::submit! {
                    ::refson::registry::AutoRegistration {
                        register: |directory: &mut ::refson::registry::TypeDirectory| {
                            directory.register::<#ident>();
                        },
                    }
                }
            };
        }
    } else {
        TokenStream2::new()
    };

    // -- Reflect + Struct -----------------------------------------------------

    let ident_str = ident.to_string();
    Ok(quote! {
        impl #impl_generics ::refson::info::Typed for #ident #ty_generics #where_clause {
            fn type_info() -> &'static ::refson::info::TypeInfo {
                #typed_body
            }
        }

        impl #impl_generics ::refson::reflection::Reflect for #ident #ty_generics #where_clause {
            #[inline]
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            #[inline]
            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            #[inline]
            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }

            #[inline]
            fn reflect_type_info(&self) -> &'static ::refson::info::TypeInfo {
                <Self as ::refson::info::Typed>::type_info()
            }

            fn set(
                &mut self,
                value: ::std::boxed::Box<dyn ::refson::reflection::Reflect>,
            ) -> ::core::result::Result<(), ::std::boxed::Box<dyn ::refson::reflection::Reflect>> {
                *self = value.take::<Self>()?;
                ::core::result::Result::Ok(())
            }

            #[inline]
            fn reflect_kind(&self) -> ::refson::reflection::ReflectKind {
                ::refson::reflection::ReflectKind::Struct
            }

            #[inline]
            fn reflect_ref(&self) -> ::refson::ops::ReflectRef<'_> {
                ::refson::ops::ReflectRef::Struct(self)
            }

            #[inline]
            fn reflect_mut(&mut self) -> ::refson::ops::ReflectMut<'_> {
                ::refson::ops::ReflectMut::Struct(self)
            }

            #[inline]
            fn reflect_owned(self: ::std::boxed::Box<Self>) -> ::refson::ops::ReflectOwned {
                ::refson::ops::ReflectOwned::Struct(self)
            }

            fn reflect_clone(&self) -> ::std::boxed::Box<dyn ::refson::reflection::Reflect> {
                ::std::boxed::Box::new(Self {
                    #(#idents: match ::refson::reflection::Reflect::reflect_clone(&self.#idents)
                        .take::<#types>()
                    {
                        ::core::result::Result::Ok(v) => v,
                        ::core::result::Result::Err(_) => ::core::unreachable!(),
                    },)*
                })
            }

            fn reflect_partial_eq(
                &self,
                other: &dyn ::refson::reflection::Reflect,
            ) -> ::core::option::Option<bool> {
                let ::refson::ops::ReflectRef::Struct(other) = other.reflect_ref() else {
                    return ::core::option::Option::Some(false);
                };
                #(match ::refson::ops::Struct::field(other, #name_lits) {
                    ::core::option::Option::Some(field) => {
                        match ::refson::reflection::Reflect::reflect_partial_eq(
                            &self.#idents,
                            field,
                        ) {
                            ::core::option::Option::Some(true) => {}
                            result => return result,
                        }
                    }
                    ::core::option::Option::None => return ::core::option::Option::Some(false),
                })*
                ::core::option::Option::Some(true)
            }

            fn reflect_debug(
                &self,
                f: &mut ::core::fmt::Formatter,
            ) -> ::core::fmt::Result {
                let mut debug = f.debug_struct(#ident_str);
                #(debug.field(
                    #name_lits,
                    &::refson::reflection::Reflect::as_reflect(&self.#idents),
                );)*
                debug.finish()
            }
        }

        impl #impl_generics ::refson::ops::Struct for #ident #ty_generics #where_clause {
            fn field(&self, name: &str) -> ::core::option::Option<&dyn ::refson::reflection::Reflect> {
                match name {
                    #(#name_lits => ::core::option::Option::Some(&self.#idents),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn ::refson::reflection::Reflect> {
                match name {
                    #(#name_lits => ::core::option::Option::Some(&mut self.#idents),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_at(
                &self,
                index: usize,
            ) -> ::core::option::Option<&dyn ::refson::reflection::Reflect> {
                match index {
                    #(#indices => ::core::option::Option::Some(&self.#idents),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_at_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::refson::reflection::Reflect> {
                match index {
                    #(#indices => ::core::option::Option::Some(&mut self.#idents),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn name_at(&self, index: usize) -> ::core::option::Option<&str> {
                match index {
                    #(#indices => ::core::option::Option::Some(#name_lits),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_len(&self) -> usize {
                #field_len
            }
        }

        #registration
    })
}
