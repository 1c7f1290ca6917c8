// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This crate provides procedural macros for the Ember runtime.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields};

/// A derive macro that implements `ember_core::reflect::Reflect`.
///
/// Named fields are reflected in declaration order under their identifier.
/// A field marked `#[reflect(skip)]` is left out of the field walk, and
/// therefore out of save, load, compare and duplicate. Every reflected field
/// must itself implement `Reflect`.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields: Vec<&Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return syn::Error::new_spanned(name, "Reflect needs named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "Reflect can only be derived for structs")
                .to_compile_error()
                .into()
        }
    };

    let mut reflected = Vec::new();
    for field in fields {
        match is_skipped(field) {
            Ok(true) => {}
            Ok(false) => reflected.extend(field.ident.clone()),
            Err(err) => return err.to_compile_error().into(),
        }
    }
    let names: Vec<String> = reflected.iter().map(|ident| ident.to_string()).collect();

    let expanded = quote! {
        impl #impl_generics ::ember_core::reflect::Reflect for #name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn fields(&self) -> ::std::vec::Vec<(&'static str, &dyn ::ember_core::reflect::Reflect)> {
                ::std::vec![#((#names, &self.#reflected as &dyn ::ember_core::reflect::Reflect)),*]
            }

            fn fields_mut(
                &mut self,
            ) -> ::std::vec::Vec<(&'static str, &mut dyn ::ember_core::reflect::Reflect)> {
                ::std::vec![#((#names, &mut self.#reflected as &mut dyn ::ember_core::reflect::Reflect)),*]
            }
        }
    };

    TokenStream::from(expanded)
}

/// Reads `#[reflect(skip)]`, rejecting any other `reflect` option.
fn is_skipped(field: &Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported reflect option, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}

/// A derive macro that implements `ember_data::ecs::Component`.
///
/// The component's registered name is the struct's identifier. The struct
/// must also implement `Reflect` and `Default`.
#[proc_macro_derive(Component)]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::ember_data::ecs::Component for #name #ty_generics #where_clause {
            const NAME: &'static str = #type_name;
        }
    };

    TokenStream::from(expanded)
}
