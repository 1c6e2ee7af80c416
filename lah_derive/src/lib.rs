//! Derive macros for the lah9000 crate.
//!
//! Provides `#[derive(Error)]`, which implements `Display` and `std::error::Error`
//! for fault enums and, when variants carry `#[exit_code(n)]`, a matching
//! `exit_code()` accessor used by the command-line front end.

mod error;

use proc_macro::TokenStream;

/// Implements `Display`, `Error` and optionally `exit_code()` for an error enum.
#[proc_macro_derive(Error, attributes(error, exit_code))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
