//! Shared utilities for lrumemo procedural macros
//!
//! Attribute parsing and signature inspection used by `lrumemo-async-macros`.
//! Every parser reports problems as a `compile_error!` token stream so the
//! macro can hand it straight back to the compiler.

use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    punctuated::Punctuated, Expr, FnArg, GenericArgument, Ident, MetaNameValue, Pat, PathArguments,
    ReturnType, Signature, Token, Type,
};

/// Parsed `#[lru_cache(...)]` attributes
pub struct LruCacheAttributes {
    /// Expression of type `lrumemo_async::MaxSize`
    pub max_size: TokenStream2,
    pub typed: bool,
    pub custom_name: Option<String>,
}

impl Default for LruCacheAttributes {
    fn default() -> Self {
        Self {
            max_size: quote! { ::lrumemo_async::MaxSize::default() },
            typed: false,
            custom_name: None,
        }
    }
}

fn error_tokens(msg: &str) -> TokenStream2 {
    quote! { compile_error!(#msg) }
}

/// Parse the `max_size` attribute
///
/// Accepts a non-negative integer (`0` disables storage), `None`, or the
/// string `"unbounded"`.
pub fn parse_max_size_attribute(nv: &MetaNameValue) -> Result<TokenStream2, TokenStream2> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            // syn folds a leading `-` into the literal itself
            syn::Lit::Int(lit_int) if lit_int.base10_digits().starts_with('-') => Err(
                error_tokens("Invalid value for `max_size`: must not be negative"),
            ),
            syn::Lit::Int(lit_int) => {
                let val = lit_int.base10_parse::<usize>().map_err(|_| {
                    error_tokens("Invalid value for `max_size`: expected a non-negative integer")
                })?;
                Ok(quote! { ::lrumemo_async::MaxSize::from(#val) })
            }
            syn::Lit::Str(s) if s.value() == "unbounded" => {
                Ok(quote! { ::lrumemo_async::MaxSize::Unbounded })
            }
            _ => Err(error_tokens(
                "Invalid literal for `max_size`: expected integer, `None` or \"unbounded\"",
            )),
        },
        Expr::Path(expr_path) if expr_path.path.is_ident("None") => {
            Ok(quote! { ::lrumemo_async::MaxSize::Unbounded })
        }
        _ => Err(error_tokens(
            "Invalid syntax for `max_size`: expected `max_size = <integer>`",
        )),
    }
}

/// Parse the `typed` attribute
pub fn parse_typed_attribute(nv: &MetaNameValue) -> Result<bool, TokenStream2> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            syn::Lit::Bool(b) => Ok(b.value),
            _ => Err(error_tokens("Invalid literal for `typed`: expected `true` or `false`")),
        },
        _ => Err(error_tokens(
            "Invalid syntax for `typed`: expected `typed = true|false`",
        )),
    }
}

/// Parse the `name` attribute
pub fn parse_name_attribute(nv: &MetaNameValue) -> Result<String, TokenStream2> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            syn::Lit::Str(s) if !s.value().trim().is_empty() => Ok(s.value()),
            syn::Lit::Str(_) => Err(error_tokens("`name` must not be empty")),
            _ => Err(error_tokens("Invalid literal for `name`: expected string")),
        },
        _ => Err(error_tokens(
            "Invalid syntax for `name`: expected `name = \"...\"`",
        )),
    }
}

/// Parse `#[lru_cache(...)]` attributes from a token stream
pub fn parse_lru_cache_attributes(attr: TokenStream2) -> Result<LruCacheAttributes, TokenStream2> {
    use syn::parse::Parser;

    let parser = Punctuated::<MetaNameValue, Token![,]>::parse_terminated;
    let parsed_args = parser.parse2(attr).map_err(|e| {
        let msg = format!("Failed to parse attributes: {}", e);
        quote! { compile_error!(#msg) }
    })?;

    let mut attrs = LruCacheAttributes::default();

    for nv in parsed_args {
        if nv.path.is_ident("max_size") {
            attrs.max_size = parse_max_size_attribute(&nv)?;
        } else if nv.path.is_ident("typed") {
            attrs.typed = parse_typed_attribute(&nv)?;
        } else if nv.path.is_ident("name") {
            attrs.custom_name = Some(parse_name_attribute(&nv)?);
        } else {
            let path = &nv.path;
            let msg = format!(
                "Unknown attribute `{}`: expected `max_size`, `typed` or `name`",
                quote!(#path)
            );
            return Err(error_tokens(&msg));
        }
    }

    Ok(attrs)
}

/// Splits `Result<T, E>` into `(T, E)`.
///
/// Only the two-argument form is recognized; aliases such as `io::Result<T>`
/// are treated as plain values.
pub fn split_result_type(ty: &Type) -> Option<(Type, Type)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(generics) = &segment.arguments else {
        return None;
    };
    let mut types = generics.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    });
    match (types.next(), types.next(), types.next()) {
        (Some(ok), Some(err), None) => Some((ok, err)),
        _ => None,
    }
}

/// The declared output type, `()` when omitted.
pub fn output_type(sig: &Signature) -> Type {
    match &sig.output {
        ReturnType::Default => syn::parse_quote! { () },
        ReturnType::Type(_, ty) => (**ty).clone(),
    }
}

/// One typed function argument, renamed for forwarding.
pub struct ForwardedArg {
    pub ident: Ident,
    pub pat: Pat,
    pub ty: Type,
}

/// Whether the function is a method taking `&self`.
///
/// The instance is cloned into the cache key, so `&mut self`, `self` and
/// typed receivers are rejected.
pub fn shared_receiver(sig: &Signature) -> Result<bool, TokenStream2> {
    match sig.receiver() {
        None => Ok(false),
        Some(receiver)
            if receiver.reference.is_some()
                && receiver.mutability.is_none()
                && receiver.colon_token.is_none() =>
        {
            Ok(true)
        }
        Some(receiver) => Err(syn::Error::new_spanned(
            receiver,
            "`#[lru_cache]` methods must take `&self`; the instance becomes part of the cache key",
        )
        .to_compile_error()),
    }
}

/// Collects the typed arguments, skipping any receiver.
///
/// Borrowed argument types are rejected: cached arguments are moved into a
/// `'static` key and computation.
pub fn forwarded_args(sig: &Signature) -> Result<Vec<ForwardedArg>, TokenStream2> {
    let mut args = Vec::with_capacity(sig.inputs.len());
    for (index, input) in sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        if let Type::Reference(reference) = &*pat_type.ty {
            return Err(syn::Error::new_spanned(
                reference,
                "`#[lru_cache]` arguments must be owned; borrowed arguments cannot outlive the call",
            )
            .to_compile_error());
        }
        args.push(ForwardedArg {
            ident: format_ident!("__lrumemo_arg{}", index),
            pat: (*pat_type.pat).clone(),
            ty: (*pat_type.ty).clone(),
        });
    }
    Ok(args)
}

/// Builds `(a, b, ...)` with a trailing comma so one element stays a tuple.
pub fn tuple_expr(idents: &[&Ident]) -> TokenStream2 {
    quote! { ( #( #idents, )* ) }
}

/// Builds `(A, B, ...)` with a trailing comma so one element stays a tuple.
pub fn tuple_type(types: &[&Type]) -> TokenStream2 {
    quote! { ( #( #types, )* ) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn render(tokens: &TokenStream2) -> String {
        tokens.to_string().replace(' ', "")
    }

    #[test]
    fn test_defaults() {
        let attrs = parse_lru_cache_attributes(TokenStream2::new()).unwrap();
        assert!(!attrs.typed);
        assert!(attrs.custom_name.is_none());
        assert_eq!(render(&attrs.max_size), "::lrumemo_async::MaxSize::default()");
    }

    #[test]
    fn test_all_attributes() {
        let attrs =
            parse_lru_cache_attributes(quote! { max_size = 32, typed = true, name = "users" })
                .unwrap();
        assert!(attrs.typed);
        assert_eq!(attrs.custom_name.as_deref(), Some("users"));
        assert_eq!(
            render(&attrs.max_size),
            "::lrumemo_async::MaxSize::from(32usize)"
        );
    }

    #[test]
    fn test_unbounded_forms() {
        for attr in [quote! { max_size = None }, quote! { max_size = "unbounded" }] {
            let attrs = parse_lru_cache_attributes(attr).unwrap();
            assert_eq!(render(&attrs.max_size), "::lrumemo_async::MaxSize::Unbounded");
        }
    }

    #[test]
    fn test_negative_max_size_rejected() {
        let err = parse_lru_cache_attributes(quote! { max_size = -1 })
            .err()
            .unwrap();
        assert!(err.to_string().contains("must not be negative"));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let err = parse_lru_cache_attributes(quote! { ttl = 60 }).err().unwrap();
        assert!(err.to_string().contains("Unknown attribute"));
    }

    #[test]
    fn test_split_result_type() {
        let ty: Type = parse_quote! { Result<Vec<u8>, std::io::Error> };
        let (ok, err) = split_result_type(&ty).unwrap();
        assert_eq!(render(&quote!(#ok)), "Vec<u8>");
        assert_eq!(render(&quote!(#err)), "std::io::Error");

        let alias: Type = parse_quote! { std::io::Result<u8> };
        assert!(split_result_type(&alias).is_none());
        let plain: Type = parse_quote! { u64 };
        assert!(split_result_type(&plain).is_none());
    }

    #[test]
    fn test_forwarded_args_rejects_borrows() {
        let borrowed: Signature = parse_quote! { async fn f(name: &str) -> u8 };
        assert!(forwarded_args(&borrowed).is_err());

        let owned: Signature = parse_quote! { async fn f(mut x: u8, (a, b): (u8, u8)) -> u8 };
        let args = forwarded_args(&owned).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].ident.to_string(), "__lrumemo_arg1");
    }

    #[test]
    fn test_methods_take_shared_self() {
        let method: Signature = parse_quote! { async fn f(&self, x: u8) -> u8 };
        assert_eq!(shared_receiver(&method).ok(), Some(true));
        let args = forwarded_args(&method).unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].ident.to_string(), "__lrumemo_arg1");

        let free: Signature = parse_quote! { async fn f(x: u8) -> u8 };
        assert_eq!(shared_receiver(&free).ok(), Some(false));

        let rejected: [Signature; 3] = [
            parse_quote! { async fn f(&mut self) -> u8 },
            parse_quote! { async fn f(self) -> u8 },
            parse_quote! { async fn f(self: Arc<Self>) -> u8 },
        ];
        for sig in rejected {
            let err = shared_receiver(&sig).err().unwrap();
            assert!(err.to_string().contains("must take `&self`"));
        }
    }
}
