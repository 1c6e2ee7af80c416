//! Derive macro for fault enums.
//!
//! # Usage
//!
//! ```ignore
//! use lah_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum Fault {
//!     #[error("memory address {index} is out of range")]
//!     #[exit_code(10)]
//!     AddressOutOfRange { index: i64 },
//!
//!     #[error("output error: {0}")]
//!     #[exit_code(1)]
//!     Io(String),
//! }
//! ```
//!
//! Every variant needs an `#[error("...")]` message. Tuple fields are referenced as
//! `{0}`, `{1}`; struct fields by name. Fields the message does not mention are not
//! bound. `#[exit_code(n)]` is all-or-nothing: once one variant declares it, every
//! variant must.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DataEnum, DeriveInput, Fields, LitInt, LitStr, Variant, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let data = match &input.data {
        Data::Enum(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Error derive only supports enums",
            ));
        }
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let display_arms = data
        .variants
        .iter()
        .map(display_arm)
        .collect::<syn::Result<Vec<_>>>()?;

    let exit_code = expand_exit_code(data)?;

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#display_arms)*
                }
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}

        impl #impl_generics #name #ty_generics #where_clause {
            #exit_code
        }
    })
}

/// Builds the `Display` match arm for one variant.
fn display_arm(variant: &Variant) -> syn::Result<TokenStream2> {
    let ident = &variant.ident;
    let message = error_message(variant)?;

    let arm = match &variant.fields {
        Fields::Unit => quote! {
            Self::#ident => write!(f, #message),
        },
        Fields::Unnamed(fields) => {
            let count = fields.unnamed.len();
            let mut format = message.clone();
            let mut bindings = Vec::with_capacity(count);
            let mut used = Vec::new();
            // Rewrite `{0}` as `{f0}` so positional fields become named format args.
            // Highest index first, so `{1}` never clobbers `{10}`.
            for i in (0..count).rev() {
                let positional = format!("{{{i}");
                if mentions(&format, &positional) {
                    let field = format_ident!("f{}", i);
                    format = format.replace(&positional, &format!("{{{field}"));
                    bindings.push(quote! { #field });
                    used.push(field);
                } else {
                    bindings.push(quote! { _ });
                }
            }
            bindings.reverse();
            let format = LitStr::new(&format, ident.span());
            quote! {
                Self::#ident(#(#bindings),*) => write!(f, #format, #(#used = #used),*),
            }
        }
        Fields::Named(fields) => {
            let used: Vec<_> = fields
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .filter(|field| mentions(&message, &format!("{{{field}")))
                .collect();
            quote! {
                Self::#ident { #(#used,)* .. } => write!(f, #message, #(#used = #used),*),
            }
        }
    };

    Ok(arm)
}

/// True when `needle` (an opening `{name` placeholder) occurs as a complete placeholder.
fn mentions(message: &str, needle: &str) -> bool {
    message.match_indices(needle).any(|(at, _)| {
        matches!(message[at + needle.len()..].chars().next(), Some('}') | Some(':'))
    })
}

/// Generates `exit_code()` when the enum declares `#[exit_code(n)]` attributes.
fn expand_exit_code(data: &DataEnum) -> syn::Result<TokenStream2> {
    let codes = data
        .variants
        .iter()
        .map(|variant| Ok((variant, exit_code(&variant.attrs)?)))
        .collect::<syn::Result<Vec<_>>>()?;

    if codes.iter().all(|(_, code)| code.is_none()) {
        return Ok(TokenStream2::new());
    }

    let arms = codes
        .iter()
        .map(|(variant, code)| {
            let ident = &variant.ident;
            let code = code.as_ref().ok_or_else(|| {
                syn::Error::new_spanned(
                    ident,
                    format!(
                        "missing #[exit_code(n)] on variant `{ident}`; other variants declare one"
                    ),
                )
            })?;
            let pattern = match &variant.fields {
                Fields::Unit => quote! { Self::#ident },
                Fields::Unnamed(_) => quote! { Self::#ident(..) },
                Fields::Named(_) => quote! { Self::#ident { .. } },
            };
            Ok(quote! { #pattern => #code, })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        /// Process exit code reported when this error ends a run.
        pub const fn exit_code(&self) -> i32 {
            match self {
                #(#arms)*
            }
        }
    })
}

/// Extracts the `#[error("...")]` message of a variant.
fn error_message(variant: &Variant) -> syn::Result<String> {
    let attr = variant
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("error"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &variant.ident,
                format!(
                    "missing #[error(\"...\")] on variant `{}`; every variant must declare a message",
                    variant.ident
                ),
            )
        })?;

    attr.parse_args::<LitStr>()
        .map(|lit| lit.value())
        .map_err(|_| {
            syn::Error::new_spanned(
                &attr.meta,
                "expected a string literal, e.g. #[error(\"division by zero\")]",
            )
        })
}

/// Extracts the `#[exit_code(n)]` value of a variant, if present.
fn exit_code(attrs: &[Attribute]) -> syn::Result<Option<LitInt>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("exit_code")) else {
        return Ok(None);
    };

    let lit = attr.parse_args::<LitInt>().map_err(|_| {
        syn::Error::new_spanned(&attr.meta, "expected an integer, e.g. #[exit_code(10)]")
    })?;
    lit.base10_parse::<i32>()?;
    Ok(Some(lit))
}

#[cfg(test)]
mod tests {
    use super::mentions;

    #[test]
    fn mentions_matches_whole_placeholders() {
        assert!(mentions("value {value} too large", "{value"));
        assert!(mentions("value {value:>4}", "{value"));
        assert!(!mentions("value {values}", "{value"));
        assert!(!mentions("no placeholders", "{value"));
    }

    #[test]
    fn mentions_positional() {
        assert!(mentions("io: {0}", "{0"));
        assert!(!mentions("io: {10}", "{1"));
    }
}
