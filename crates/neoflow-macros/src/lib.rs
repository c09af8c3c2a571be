extern crate proc_macro;

mod macros;

use syn::DeriveInput;

/// Derives an array-index mapping for a fieldless enum.
///
/// Generates implementations of:
/// - `Into<usize>`
/// - `crate::param::Indexed`, giving the enum a `COUNT` constant equal to its
///   variant count.
///
/// Used for enums that select a fixed-size array slot (gas species, blood
/// solutes) without a name lookup in the per-tick hot path.
#[proc_macro_derive(ParamIndex)]
pub fn param_index(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);
    let toks =
        macros::param_index::param_index_inner(&ast).unwrap_or_else(|err| err.to_compile_error());
    toks.into()
}
