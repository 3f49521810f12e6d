use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{parse_macro_input, parse_quote, punctuated::Punctuated, Ident, ImplItemFn, Token};

/// This macro is added before a method of `Trainer` struct in the impl block.
/// Use this macro to first check if current game phase is one of the phases
/// listed in the attribute.
///
/// For example, `#[allowed_phase(RoundComplete, ShoeDepleted)]` will make a
/// method first check if `self.phase` is `GamePhase::RoundComplete` or
/// `GamePhase::ShoeDepleted`. If not, the method returns
/// `Err(TrainerError::WrongPhase { .. })` without touching any state.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    let phases = parse_macro_input!(attr with Punctuated::<Ident, Token![,]>::parse_terminated);
    let mut method = parse_macro_input!(item as ImplItemFn);

    if phases.is_empty() {
        return compile_error("allowed_phase needs at least one phase").into();
    }

    let operation = method.sig.ident.to_string();
    let allowed = phases
        .iter()
        .map(|phase| phase.to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    let patterns = phases.iter();

    let early_return: syn::Stmt = parse_quote! {
        if !matches!(self.phase, #(GamePhase::#patterns)|*) {
            return Err(crate::TrainerError::WrongPhase {
                operation: #operation,
                allowed: #allowed,
            });
        }
    };
    method.block.stmts.insert(0, early_return);
    method.into_token_stream().into()
}

fn compile_error(message: &str) -> TokenStream2 {
    quote! {
        compile_error!(#message);
    }
}
