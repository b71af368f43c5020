//! Core container implementation for Sanad DI.

pub mod binder;
pub mod binding;
pub mod constructor;
pub mod error;
pub mod factory;
pub mod injector;
pub mod instance;
pub mod key;
pub mod member;
pub mod members;
pub mod module;
mod path;
pub mod provider;
pub mod scope;
pub mod store;

pub use binder::{Binder, BindingBuilder};
pub use binding::{Binding, BindingInfo, ProviderInjection};
pub use error::{Result, SanadError};
pub use injector::{Injector, InjectorBuilder, InjectorSettings};
pub use instance::{Dependency, Instance};
pub use key::{Key, ResolvableKey};
pub use member::{Injectable, InjectableConstructor, InjectableMember};
pub use module::{FnModule, Module, from_fn};
pub use provider::{Provider, ProviderRef};
pub use scope::Scope;

pub mod prelude {
    pub use crate::binder::{Binder, BindingBuilder};
    pub use crate::binding::{Binding, BindingInfo, ProviderInjection};
    pub use crate::error::{Result, SanadError};
    pub use crate::injector::{Injector, InjectorBuilder, InjectorSettings};
    pub use crate::instance::{Dependency, Instance};
    pub use crate::key::{Key, ResolvableKey};
    pub use crate::member::{
        Arguments, Injectable, InjectableConstructor, InjectableMember, MemberResolver, TypeTable,
    };
    pub use crate::module::{FnModule, Module, from_fn};
    pub use crate::provider::{Provider, ProviderHandle, ProviderRef};
    pub use crate::scope::Scope;
}
