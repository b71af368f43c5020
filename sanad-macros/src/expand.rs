use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Ident, Index, Member, Type};

use crate::attrs::{FieldRole, InjectableField, InjectableInput, option_inner};

struct FieldPlan<'a> {
    access: Member,
    label: String,
    ty: &'a Type,
    qualifier: TokenStream2,
    role: FieldRole,
    optional: bool,
}

pub fn expand_injectable(input: InjectableInput) -> darling::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(darling::Error::custom(
            "`#[derive(Injectable)]` does not support generic types; \
             implement `Injectable` by hand for each concrete type",
        )
        .with_span(&input.generics));
    }

    let ident = &input.ident;
    let fields = input
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?;
    let style = fields.style;

    let mut errors = darling::Error::accumulator();
    let plans: Vec<FieldPlan<'_>> = fields
        .fields
        .iter()
        .enumerate()
        .filter_map(|(index, field)| errors.handle(plan_field(index, field)))
        .collect();
    errors.finish()?;

    let constructor = if input.members_only {
        quote! { ::core::option::Option::None }
    } else {
        expand_constructor(&plans, style)
    };
    let members = expand_members(&plans)?;

    Ok(quote! {
        impl ::sanad::Injectable for #ident {
            fn constructor() -> ::core::option::Option<::sanad::InjectableConstructor> {
                #constructor
            }

            fn members() -> ::std::vec::Vec<::sanad::InjectableMember> {
                ::std::vec![#(#members),*]
            }
        }

        ::sanad::__private::inventory::submit! {
            ::sanad::member::InjectableRegistration::of::<#ident>()
        }
    })
}

fn plan_field(index: usize, field: &InjectableField) -> darling::Result<FieldPlan<'_>> {
    let role = field.role().map_err(|err| err.with_span(&field.ty))?;

    let (access, label) = match &field.ident {
        Some(name) => (Member::Named(name.clone()), name.to_string()),
        None => (Member::Unnamed(Index::from(index)), index.to_string()),
    };

    let qualifier = match &field.named {
        Some(name) => quote! { ::core::option::Option::Some(#name) },
        None => quote! { ::core::option::Option::None },
    };

    Ok(FieldPlan {
        access,
        label,
        ty: &field.ty,
        qualifier,
        role,
        optional: field.optional,
    })
}

fn local(plan: &FieldPlan<'_>) -> Ident {
    format_ident!("__sanad_{}", plan.label)
}

fn expand_constructor(plans: &[FieldPlan<'_>], style: darling::ast::Style) -> TokenStream2 {
    let params = plans.iter().filter(|p| p.role == FieldRole::Param);
    let extras = plans.iter().filter(|p| p.role == FieldRole::Extra);

    let keys = params.clone().map(|p| {
        let ty = p.ty;
        let qualifier = &p.qualifier;
        quote! { ::sanad::ResolvableKey::of::<#ty>(#qualifier) }
    });

    // Declared parameters are read before extras, whatever the field order.
    let reads = params.chain(extras).map(|p| {
        let ty = p.ty;
        let var = local(p);
        quote! { let #var: #ty = __sanad_args.next()?; }
    });

    let values: Vec<TokenStream2> = plans
        .iter()
        .map(|p| match p.role {
            FieldRole::Param | FieldRole::Extra => {
                let var = local(p);
                quote! { #var }
            }
            FieldRole::Member | FieldRole::Skip => {
                quote! { ::core::default::Default::default() }
            }
        })
        .collect();

    let construct = match style {
        darling::ast::Style::Struct => {
            let names = plans.iter().map(|p| &p.access);
            quote! { Self { #(#names: #values),* } }
        }
        darling::ast::Style::Tuple => quote! { Self(#(#values),*) },
        darling::ast::Style::Unit => quote! { Self },
    };

    quote! {
        ::core::option::Option::Some(::sanad::InjectableConstructor::of::<Self, _>(
            ::std::vec![#(#keys),*],
            |__sanad_args: &mut ::sanad::member::Arguments| {
                #(#reads)*
                ::core::result::Result::Ok(#construct)
            },
        ))
    }
}

fn expand_members(plans: &[FieldPlan<'_>]) -> darling::Result<Vec<TokenStream2>> {
    let mut errors = darling::Error::accumulator();

    let members = plans
        .iter()
        .filter(|p| p.role == FieldRole::Member)
        .filter_map(|p| {
            let Some(inner) = option_inner(p.ty) else {
                errors.push(
                    darling::Error::custom("an injected member must be declared as `Option<_>`")
                        .with_span(p.ty),
                );
                return None;
            };

            let access = &p.access;
            let label = &p.label;
            let qualifier = &p.qualifier;
            let optional = p.optional;
            Some(quote! {
                ::sanad::InjectableMember::of::<Self, #inner>(
                    #label,
                    #qualifier,
                    #optional,
                    |__sanad_target: &mut Self, __sanad_value: #inner| {
                        __sanad_target.#access = ::core::option::Option::Some(__sanad_value);
                    },
                )
            })
        })
        .collect();

    errors.finish_with(members)
}
