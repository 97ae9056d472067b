extern crate darling;
extern crate syn;

use darling::FromDeriveInput;
use proc_macro2::{Span, TokenStream, TokenTree};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Ident};

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(kind))]
struct KindArgs {
  #[darling(default)]
  internal: bool,
  #[darling(default)]
  name: Option<String>,
}

/// Implements `datastore_purge::Kind`; the kind name defaults to the type name
#[proc_macro_derive(Kind, attributes(kind))]
pub fn kind(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
  let input = parse_macro_input!(input as DeriveInput);

  let KindArgs { internal, name } = match FromDeriveInput::from_derive_input(&input) {
    Ok(args) => args,
    Err(err) => return err.write_errors().into(),
  };

  let crate_name = get_crate_name(internal);
  let ident = input.ident;
  let name = name.unwrap_or_else(|| ident.to_string());

  let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

  let expanded = quote! {
    impl #impl_generics #crate_name::Kind for #ident #ty_generics #where_clause {
      const NAME: &'static str = #name;
    }
  };

  proc_macro::TokenStream::from(expanded)
}

fn get_crate_name(internal: bool) -> TokenStream {
  if internal {
    quote! { crate }
  } else {
    let name = match crate_name("datastore-purge") {
      Ok(FoundCrate::Name(name)) => name,
      Ok(FoundCrate::Itself) | Err(_) => "datastore_purge".to_string(),
    };
    TokenTree::from(Ident::new(&name, Span::call_site())).into()
  }
}
