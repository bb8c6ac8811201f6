use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, parse_macro_input};

/// Parameters that carry kernel context rather than syscall arguments.
const CONTEXT_ARGS: &[&str] = &["kernel", "tf"];

/// Log a syscall's arguments on entry and its result on return, at debug level.
///
/// The function must return a `Result`. Arguments are printed with `{:?}`;
/// the kernel context parameter is skipped.
#[proc_macro_attribute]
pub fn syscall_trace(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut function = parse_macro_input!(item as ItemFn);
    let signature = &function.sig;
    let fn_name = &signature.ident;
    let arg_names: Vec<_> = signature
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            // only plain named parameters like `pid: i32`
            syn::FnArg::Typed(pat_type) => match &*pat_type.pat {
                syn::Pat::Ident(pat_ident) => Some(pat_ident.ident.clone()),
                _ => None,
            },
            _ => None,
        })
        .filter(|ident| !CONTEXT_ARGS.iter().any(|ctx| ident == ctx))
        .collect();

    let arg_list_pattern = arg_names
        .iter()
        .map(|name| format!("{} = {{:?}}", name))
        .collect::<Vec<_>>()
        .join(", ");
    let format_pattern_in = format!("[syscall] <= {}({})", fn_name, arg_list_pattern);
    let format_pattern_out = format!("[syscall] => {}({}) = {{}}", fn_name, arg_list_pattern);

    let fn_body = &function.block;
    function.block = match syn::parse2(quote! {{
        debug!(#format_pattern_in #(, #arg_names)*);

        let __result = (|| {
            #fn_body
        })();

        use alloc::format;

        let __linux_result = match __result {
            Ok(ref value) => {
                format!("{:?}", value)
            }
            Err(ref error) => {
                format!("{:?}", error)
            }
        };
        debug!(#format_pattern_out #(, #arg_names)*, __linux_result);
        __result
    }}) {
        Ok(block) => block,
        Err(err) => return err.to_compile_error().into(),
    };
    quote! {
        #function
    }
    .into()
}
