use proc_macro2::{Delimiter, TokenStream, TokenTree};
use quote::quote;

/// Test attribute that installs the tracing subscriber before running the test.
///
/// ```ignore
/// #[autoinit_testhelpers::test]
/// fn builds_a_record() {
///     // tracing output from autoinit is visible here
/// }
/// ```
///
/// A different test attribute can be passed through, e.g.
/// `#[autoinit_testhelpers::test(some_runtime::test)]`.
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let mut tokens: Vec<TokenTree> = TokenStream::from(item).into_iter().collect();

    // the last token tree of a function item is its body
    let body = match tokens.pop() {
        Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Brace => group.stream(),
        _ => {
            return quote! {
                ::core::compile_error!("#[autoinit_testhelpers::test] expects a function with a body");
            }
            .into();
        }
    };
    let signature: TokenStream = tokens.into_iter().collect();

    let attr = TokenStream::from(attr);
    let test_attr = if attr.is_empty() {
        quote! { #[::core::prelude::rust_2024::test] }
    } else {
        quote! { #[#attr] }
    };

    quote! {
        #test_attr
        #signature {
            ::autoinit_testhelpers::setup();

            #body
        }
    }
    .into()
}
