//! Procedural macros for Sanad DI.
//!
//! `#[derive(Injectable)]` describes a struct's injectable constructor and
//! members, and registers the struct with every injector at link time.

mod attrs;
mod expand;

use darling::FromDeriveInput;
use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `sanad::Injectable` for a struct.
///
/// Every field is a constructor parameter unless marked otherwise.
///
/// | Field attribute              | Meaning                                              |
/// |------------------------------|------------------------------------------------------|
/// | `#[inject(named = "q")]`     | resolve the qualified key                            |
/// | `#[inject(member)]`          | `Option<D>` field injected after construction        |
/// | `#[inject(member, optional)]`| as above, left `None` when nothing resolves          |
/// | `#[inject(extra)]`           | read from caller-supplied extras, after parameters   |
/// | `#[inject(skip)]`            | initialized with `Default::default()`                |
///
/// `#[inject(members_only)]` on the struct itself declares no constructor,
/// for types created outside the injector and passed to `inject_members`.
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sanad::prelude::*;
///
/// #[derive(Injectable)]
/// struct UserService {
///     repo: Arc<dyn UserRepository>,
///     #[inject(named = "admin_email")]
///     admin: Arc<String>,
///     cache: Option<Arc<Cache>>,
///     #[inject(member, optional)]
///     audit: Option<Arc<AuditLog>>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let parsed = match attrs::InjectableInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(err) => return err.write_errors().into(),
    };

    match expand::expand_injectable(parsed) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}
