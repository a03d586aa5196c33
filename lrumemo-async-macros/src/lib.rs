use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, ItemFn};

use lrumemo_macro_utils::{
    forwarded_args, output_type, parse_lru_cache_attributes, shared_receiver, split_result_type,
    tuple_expr, tuple_type,
};

/// Memoizes an async function behind a least-recently-used cache.
///
/// The function keeps its name and arguments, but its output becomes
/// `Result<T, CacheError<E>>` (or `Result<T, CacheError<Infallible>>` when the
/// body does not return a `Result`). Concurrent calls with equal arguments
/// share one execution of the body.
///
/// A companion accessor `<name>_cache()` returns the backing
/// `&'static AsyncLruCache`, which exposes `cache_info()`, `cache_clear()`,
/// `cache_parameters()` and `wrapped()` (the uncached body).
///
/// # Requirements
///
/// - **Function must be async** and not generic
/// - **Arguments**: owned, and implementing `CacheableKey`
/// - **Methods**: only `&self` receivers in inherent impls. `Self` becomes the
///   first key argument and must be `CacheableKey + Clone + Send + Sync +
///   'static`; the accessor is `Self::<name>_cache()`
/// - **Return type**: `Clone + Send + Sync + 'static`; for `Result<T, E>` both
///   `T` and `E`
/// - **Body**: its future must be `Send`
///
/// # Macro Parameters
///
/// - `max_size` (optional): Maximum number of stored results. `0` stores
///   nothing, `None` or `"unbounded"` never evicts. Default: 128.
/// - `typed` (optional): When `true`, arguments of different types never share
///   an entry (`3u8` and `3u64`). Default: `false`.
/// - `name` (optional): Label for log events. Default: the function name.
///
/// # Cache Behavior
///
/// - **Global scope**: one cache per function, shared by all tasks and threads;
///   for methods, one cache per type shared by all its instances
/// - **Result-returning functions**: only `Ok` values are stored; an `Err`
///   reaches every caller waiting on that execution
/// - **Eviction**: when full, the least recently used result is dropped
///
/// # Examples
///
/// ```ignore
/// use lrumemo_async::lru_cache;
///
/// #[lru_cache(max_size = 256)]
/// async fn fetch_user(id: u64) -> Result<User, ApiError> {
///     api::get_user(id).await
/// }
///
/// let user = fetch_user(7).await?;
/// println!("{:?}", fetch_user_cache().cache_info());
/// ```
#[proc_macro_attribute]
pub fn lru_cache(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    match expand(attr.into(), input) {
        Ok(expanded) | Err(expanded) => TokenStream::from(expanded),
    }
}

fn expand(attr: TokenStream2, input: ItemFn) -> Result<TokenStream2, TokenStream2> {
    let attrs = parse_lru_cache_attributes(attr)?;

    let fn_attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name = &sig.ident;

    if sig.asyncness.is_none() {
        return Err(
            syn::Error::new_spanned(sig.fn_token, "`#[lru_cache]` requires an `async fn`")
                .to_compile_error(),
        );
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "`#[lru_cache]` does not support generic functions",
        )
        .to_compile_error());
    }

    let method = shared_receiver(sig)?;
    let args = forwarded_args(sig)?;
    let idents: Vec<_> = args.iter().map(|arg| &arg.ident).collect();
    let pats: Vec<_> = args.iter().map(|arg| &arg.pat).collect();
    let types: Vec<_> = args.iter().map(|arg| &arg.ty).collect();

    let declared_output = output_type(sig);
    let (value_type, error_type, constructor) = match split_result_type(&declared_output) {
        Some((ok, err)) => (quote! { #ok }, quote! { #err }, quote! { new }),
        None => (
            quote! { #declared_output },
            quote! { ::std::convert::Infallible },
            quote! { from_infallible },
        ),
    };

    let fn_name_string = fn_name.to_string();
    let cache_name = attrs.custom_name.as_ref().unwrap_or(&fn_name_string);
    let max_size = &attrs.max_size;
    let typed = attrs.typed;
    let config = quote! {
        ::lrumemo_async::CacheConfig::new()
            .max_size(#max_size)
            .typed(#typed)
            .name(#cache_name)
    };
    let output = quote! {
        ::std::result::Result<#value_type, ::lrumemo_async::CacheError<#error_type>>
    };

    let accessor_ident = format_ident!("{}_cache", fn_name);

    if method {
        let uncached_ident = format_ident!("__lrumemo_{}_uncached", fn_name);
        let accessor_doc = format!("The cache backing [`Self::{}`].", fn_name);
        let cache_type = quote! {
            ::lrumemo_async::AsyncLruCache<(Self, #( #types, )*), #value_type, #error_type>
        };

        return Ok(quote! {
            #(#fn_attrs)*
            #vis async fn #fn_name(&self, #( #idents: #types ),* ) -> #output {
                Self::#accessor_ident()
                    .call((::std::clone::Clone::clone(self), #( #idents, )*))
                    .await
            }

            #[doc = #accessor_doc]
            #vis fn #accessor_ident() -> &'static #cache_type {
                static CACHES: ::lrumemo_async::MethodCaches = ::lrumemo_async::MethodCaches::new();
                CACHES.get_or_init(|| {
                    ::lrumemo_async::AsyncLruCache::#constructor(
                        #config,
                        |(__lrumemo_self, #( #idents, )*): (Self, #( #types, )*)| async move {
                            __lrumemo_self.#uncached_ident( #( #idents ),* ).await
                        },
                    )
                })
            }

            #[doc(hidden)]
            async fn #uncached_ident(&self, #( #pats: #types ),* ) -> #declared_output #block
        });
    }

    let args_tuple = tuple_expr(&idents);
    let args_type = tuple_type(&types);
    let accessor_doc = format!("The cache backing [`{}`].", fn_name);
    let cache_type = quote! {
        ::lrumemo_async::AsyncLruCache<#args_type, #value_type, #error_type>
    };

    Ok(quote! {
        #(#fn_attrs)*
        #vis async fn #fn_name( #( #idents: #types ),* ) -> #output {
            #accessor_ident().call(#args_tuple).await
        }

        #[doc = #accessor_doc]
        #vis fn #accessor_ident() -> &'static #cache_type {
            async fn __lrumemo_compute( #( #pats: #types ),* ) -> #declared_output #block

            static CACHE: ::lrumemo_async::once_cell::sync::Lazy<#cache_type> =
                ::lrumemo_async::once_cell::sync::Lazy::new(|| {
                    ::lrumemo_async::AsyncLruCache::#constructor(
                        #config,
                        |#args_tuple: #args_type| __lrumemo_compute( #( #idents ),* ),
                    )
                });
            &CACHE
        }
    })
}
