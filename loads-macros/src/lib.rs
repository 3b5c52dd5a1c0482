use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Ident, ItemFn};

/// Proc macro to denote a Scenario
///
/// Registers an `async fn(TestContext) -> Result<(), TestError>` in the scenario registry under
/// `<module path>::<function name>`, which is the identifier to pass as `fqn`. The function
/// itself is left untouched.
///
/// # Example
/// ```ignore
/// use loads::prelude::*;
///
/// #[scenario]
/// async fn my_scenario(ctx: TestContext) -> Result<(), TestError> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn scenario(attr: TokenStream, item: TokenStream) -> TokenStream {
    scenario_internal(attr.into(), item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn scenario_internal(attr: TokenStream2, item: TokenStream) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(
            attr,
            "#[scenario] does not take arguments",
        ));
    }

    let input = syn::parse::<ItemFn>(item)?;
    if input.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            input.sig.fn_token,
            "#[scenario] only works on async functions",
        ));
    }

    let name = &input.sig.ident;
    let upper = name.to_string().to_uppercase();
    let entry = Ident::new(&format!("__LOADS_SCENARIO_{upper}"), Span::call_site());
    let factory = Ident::new(&format!("__loads_factory_{name}"), Span::call_site());

    Ok(quote! {
        #input

        #[doc(hidden)]
        fn #factory(
            ctx: ::loads::registry::ScenarioContext,
        ) -> ::std::boxed::Box<dyn ::loads::Scenario> {
            ::std::boxed::Box::new(::loads::TestCase::new(ctx, #name))
        }

        #[doc(hidden)]
        #[::loads::registry::distributed_slice(::loads::registry::SCENARIOS)]
        #[linkme(crate = ::loads::registry::linkme)]
        static #entry: ::loads::registry::ScenarioEntry = ::loads::registry::ScenarioEntry {
            name: ::std::concat!(::std::module_path!(), "::", ::std::stringify!(#name)),
            factory: #factory,
        };
    })
}
