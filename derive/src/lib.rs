use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Field-by-field codec for command structs.
///
/// Every field is written in declaration order with its own `Codec` impl, so
/// the generated impl only compiles inside `pylon-common`.
#[proc_macro_derive(Codec)]
pub fn codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_ident = input.ident;

    let Data::Struct(struct_data) = input.data else {
        panic!("must derive on a struct")
    };
    let Fields::Named(fields) = struct_data.fields else {
        panic!("must derive on named fields")
    };
    let field_idents = fields
        .named
        .iter()
        .map(|field| {
            let field_ident = &field.ident;
            quote! {
                #field_ident
            }
        })
        .collect::<Vec<_>>();
    let field_read_methods = fields.named.iter().map(|field| {
        let field_ident = &field.ident;
        let field_type = &field.ty;
        quote! {
            let #field_ident = <#field_type as crate::codec::Codec>::decode(buf)?;
        }
    });
    let field_put_methods = fields.named.iter().map(|field| {
        let field_ident = &field.ident;
        quote! {
            crate::codec::Codec::encode(&self.#field_ident, buf);
        }
    });
    let field_sizes = fields.named.iter().map(|field| {
        let field_ident = &field.ident;
        quote! {
            crate::codec::Codec::size(&self.#field_ident)
        }
    });
    quote! {
        impl crate::codec::Codec for #struct_ident {
            fn decode(buf: &mut bytes::Bytes) -> crate::codec::Result<Self> {
                #(#field_read_methods)*
                Ok(Self {
                    #(#field_idents),*
                })
            }

            fn encode(&self, buf: &mut bytes::BytesMut) {
                #(#field_put_methods)*
            }

            fn size(&self) -> usize {
                0 #(+ #field_sizes)*
            }
        }
    }
    .into()
}
