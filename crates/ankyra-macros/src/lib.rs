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

//! This crate provides procedural macros for the Ankyra handle library.

use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use syn::{parse_macro_input, Data, DeriveInput, GenericArgument, PathArguments, Type};

/// A derive macro that wires a struct's embedded `SelfRef` cell into the
/// `Shareable` and `ShareFromSelf` traits.
///
/// The struct must contain exactly one field whose type is `SelfRef<Self>`
/// (or `SelfRef<Self, Mode>` for an explicit counter mode). The generated
/// `Shareable` impl binds that cell when the first owning handle is created,
/// and the generated `ShareFromSelf` impl exposes it to `as_shared()`.
#[proc_macro_derive(ShareFromSelf)]
pub fn derive_share_from_self(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree.
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Struct(data) = &input.data else {
        return syn::Error::new_spanned(name, "`ShareFromSelf` can only be derived for structs")
            .to_compile_error()
            .into();
    };

    // Locate the embedded SelfRef field and its counter mode.
    let mut cell_field: Option<(proc_macro2::TokenStream, proc_macro2::TokenStream)> = None;
    for (index, field) in data.fields.iter().enumerate() {
        let Some(mode) = self_ref_mode(&field.ty) else {
            continue;
        };
        if cell_field.is_some() {
            return syn::Error::new_spanned(
                field,
                "`ShareFromSelf` found more than one `SelfRef` field",
            )
            .to_compile_error()
            .into();
        }
        let accessor = match &field.ident {
            Some(ident) => ident.to_token_stream(),
            None => syn::Index::from(index).to_token_stream(),
        };
        cell_field = Some((accessor, mode));
    }
    let Some((accessor, mode)) = cell_field else {
        return syn::Error::new_spanned(
            name,
            "`ShareFromSelf` requires a field of type `SelfRef<Self>`",
        )
        .to_compile_error()
        .into();
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::ankyra_core::Shareable<#mode> for #name #ty_generics #where_clause {
            fn on_first_owner(&self, owner: &::ankyra_core::SharedRef<Self, #mode>) {
                self.#accessor.bind(owner);
            }
        }

        impl #impl_generics ::ankyra_core::ShareFromSelf<#mode> for #name #ty_generics #where_clause {
            fn self_ref(&self) -> &::ankyra_core::SelfRef<Self, #mode> {
                &self.#accessor
            }
        }
    };

    TokenStream::from(expanded)
}

/// Returns the counter-mode tokens if `ty` is a `SelfRef<..>` path,
/// defaulting to `Atomic` when the mode parameter is omitted.
fn self_ref_mode(ty: &Type) -> Option<proc_macro2::TokenStream> {
    let Type::Path(path) = ty else { return None };
    let segment = path.path.segments.last()?;
    if segment.ident != "SelfRef" {
        return None;
    }
    if let PathArguments::AngleBracketed(arguments) = &segment.arguments {
        let mut types = arguments.args.iter().filter_map(|argument| match argument {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        });
        let _pointee = types.next();
        if let Some(mode) = types.next() {
            return Some(mode.to_token_stream());
        }
    }
    Some(quote!(::ankyra_core::Atomic))
}
