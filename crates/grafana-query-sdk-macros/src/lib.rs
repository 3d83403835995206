//! Derive macros for `grafana-query-sdk`.
use proc_macro::TokenStream;

use darling::{ast, util::PathList, FromDeriveInput, FromMeta, FromVariant};
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;

#[derive(Debug, Default, Clone, Copy, FromMeta)]
enum DataType {
    #[default]
    #[darling(rename = "string")]
    Text,
    Number,
    #[darling(rename = "datetime")]
    DateTime,
    Object,
}

impl DataType {
    fn variant(self) -> proc_macro2::TokenStream {
        match self {
            Self::Text => quote!(String),
            Self::Number => quote!(Number),
            Self::DateTime => quote!(DateTime),
            Self::Object => quote!(Object),
        }
    }
}

#[derive(Debug, FromVariant)]
#[darling(attributes(query_field))]
struct FieldVariant {
    ident: syn::Ident,
    name: Option<String>,
    label: Option<String>,
    data_type: Option<DataType>,
    #[darling(default)]
    operations: PathList,
    #[darling(default)]
    lookup: bool,
    #[darling(default)]
    readonly: bool,
}

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(query_field), supports(enum_unit))]
struct QueryFieldsOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: ast::Data<FieldVariant, ()>,
}

impl FieldVariant {
    fn data_field(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.ident.to_string())
    }

    fn descriptor(&self) -> proc_macro2::TokenStream {
        let name = self.data_field();
        let label = self.label.clone().unwrap_or_else(|| self.ident.to_string());
        let data_type = self.data_type.unwrap_or_default().variant();
        let operations = self.operations.iter().map(|op| {
            quote_spanned! { op.span() => ::grafana_query_sdk::filter::OperationName::#op }
        });
        let lookup = (self.lookup || self.readonly).then(|| {
            let readonly = self.readonly;
            quote! {
                .with_lookup(::grafana_query_sdk::filter::Lookup::new(::std::vec::Vec::new(), #readonly))
            }
        });
        quote! {
            ::grafana_query_sdk::filter::FieldDescriptor::new(
                #name,
                #label,
                ::grafana_query_sdk::filter::DataType::#data_type,
            )
            .with_operations([#(#operations),*])
            #lookup
        }
    }
}

/// Derive `QueryFields` for a unit-only enum, one variant per filterable field.
///
/// Each variant accepts a `#[query_field(...)]` attribute with these options:
///
/// - `name = "..."`: the backend field name. Defaults to the variant name.
/// - `label = "..."`: the label shown to users. Defaults to the variant name.
/// - `data_type = "..."`: one of `string` (the default), `number`, `datetime` or `object`.
/// - `operations(...)`: the supported `OperationName` variants, in display order.
/// - `lookup`: the field has selectable values, merged in at runtime.
/// - `readonly`: only the selectable values may be used. Implies `lookup`.
///
/// # Example
///
/// ```rust
/// use grafana_query_sdk::filter::{DataType, QueryFields};
/// use grafana_query_sdk_macros::QueryFields;
///
/// #[derive(QueryFields)]
/// enum ResultField {
///     #[query_field(name = "workspace", label = "Workspace", operations(Equals, DoesNotEqual), readonly)]
///     Workspace,
///     #[query_field(name = "updatedAt", data_type = "datetime", operations(DateTimeIsAfter, DateTimeIsBefore))]
///     UpdatedAt,
/// }
///
/// let fields = ResultField::descriptors();
/// assert_eq!(fields[1].data_type, DataType::DateTime);
/// assert_eq!(fields[1].label, "UpdatedAt");
/// assert!(fields[0].lookup.as_ref().unwrap().readonly);
/// assert_eq!(ResultField::Workspace.data_field(), "workspace");
/// ```
#[proc_macro_derive(QueryFields, attributes(query_field))]
pub fn derive_query_fields(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);
    let QueryFieldsOpts { ident, generics, data } = match QueryFieldsOpts::from_derive_input(&ast) {
        Ok(x) => x,
        Err(e) => return e.flatten().write_errors().into(),
    };
    let variants = data.take_enum().unwrap_or_default();
    let descriptors = variants.iter().map(FieldVariant::descriptor);
    let arms = variants.iter().map(|v| {
        let variant = &v.ident;
        let name = v.data_field();
        quote! { Self::#variant => #name }
    });
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    quote! {
        impl #impl_generics ::grafana_query_sdk::filter::QueryFields for #ident #ty_generics #where_clause {
            fn descriptors() -> ::std::vec::Vec<::grafana_query_sdk::filter::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            fn data_field(&self) -> &'static str {
                match *self {
                    #(#arms,)*
                }
            }
        }
    }
    .into()
}
