use darling::util::Ignored;
use darling::{FromDeriveInput, FromField, ast};
use syn::{GenericArgument, Ident, PathArguments, Type};

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(inject), supports(struct_any))]
pub struct InjectableInput {
    pub ident: Ident,
    pub generics: syn::Generics,
    pub data: ast::Data<Ignored, InjectableField>,
    /// Declare members only, no constructor.
    #[darling(default)]
    pub members_only: bool,
}

#[derive(Debug, FromField)]
#[darling(attributes(inject))]
pub struct InjectableField {
    pub ident: Option<Ident>,
    pub ty: Type,
    #[darling(default)]
    pub named: Option<String>,
    #[darling(default)]
    pub member: bool,
    #[darling(default)]
    pub optional: bool,
    #[darling(default)]
    pub extra: bool,
    #[darling(default)]
    pub skip: bool,
}

/// How a field receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Param,
    Extra,
    Member,
    Skip,
}

impl InjectableField {
    pub fn role(&self) -> darling::Result<FieldRole> {
        let role = match (self.member, self.extra, self.skip) {
            (false, false, false) => FieldRole::Param,
            (true, false, false) => FieldRole::Member,
            (false, true, false) => FieldRole::Extra,
            (false, false, true) => FieldRole::Skip,
            _ => {
                return Err(darling::Error::custom(
                    "`member`, `extra` and `skip` cannot be combined",
                ));
            }
        };

        if self.optional && role != FieldRole::Member {
            return Err(darling::Error::custom(
                "`optional` applies to members; declare an `Option<_>` parameter instead",
            ));
        }
        if self.named.is_some() && matches!(role, FieldRole::Extra | FieldRole::Skip) {
            return Err(darling::Error::custom(
                "`named` has no effect on `extra` or `skip` fields",
            ));
        }

        Ok(role)
    }
}

/// Returns `T` for a field declared as `Option<T>`.
pub fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }

    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn field(member: bool, extra: bool, skip: bool) -> InjectableField {
        InjectableField {
            ident: None,
            ty: parse_quote!(u32),
            named: None,
            member,
            optional: false,
            extra,
            skip,
        }
    }

    #[test]
    fn roles_are_exclusive() {
        assert_eq!(field(false, false, false).role().unwrap(), FieldRole::Param);
        assert_eq!(field(true, false, false).role().unwrap(), FieldRole::Member);
        assert!(field(true, true, false).role().is_err());
    }

    #[test]
    fn optional_requires_member() {
        let mut param = field(false, false, false);
        param.optional = true;
        assert!(param.role().is_err());

        let mut member = field(true, false, false);
        member.optional = true;
        assert_eq!(member.role().unwrap(), FieldRole::Member);
    }

    #[test]
    fn finds_option_inner_type() {
        let ty: Type = parse_quote!(Option<Arc<Clock>>);
        let inner: Type = parse_quote!(Arc<Clock>);
        assert_eq!(option_inner(&ty), Some(&inner));

        let ty: Type = parse_quote!(core::option::Option<u8>);
        assert!(option_inner(&ty).is_some());

        let ty: Type = parse_quote!(Arc<Clock>);
        assert!(option_inner(&ty).is_none());
    }
}
