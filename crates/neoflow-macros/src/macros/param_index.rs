use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput};

pub(crate) fn param_index_inner(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let n = match &ast.data {
        Data::Enum(v) => v
            .variants
            .iter()
            .try_fold(0usize, |acc, _v| Ok::<usize, syn::Error>(acc + 1usize))?,
        _ => {
            return Err(syn::Error::new(
                Span::call_site(),
                "ParamIndex only supports fieldless enums.",
            ))
        }
    };

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics Into<usize> for #name #ty_generics #where_clause {
            fn into(self) -> usize {
                self as usize
            }
        }
        impl #impl_generics crate::param::Indexed for #name #ty_generics #where_clause {
            const COUNT: usize = #n;
        }
    })
}
