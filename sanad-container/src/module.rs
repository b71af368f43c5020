//! Modules: units of binding configuration.
//!
//! A module groups related bindings, so an application can compose its
//! injector from parts instead of one long registration block.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use sanad_container::prelude::*;
//!
//! struct StorageModule;
//!
//! impl Module for StorageModule {
//!     fn configure(&self, binder: &mut Binder) {
//!         binder
//!             .bind::<String>()
//!             .named("database_url")
//!             .to_instance(Arc::new("postgres://localhost".into()));
//!     }
//! }
//!
//! let injector = Injector::create(&[&StorageModule]).unwrap();
//! let url = injector.get_named::<String>("database_url").unwrap();
//! assert_eq!(url.as_deref().map(String::as_str), Some("postgres://localhost"));
//! ```

use std::sync::Arc;

use crate::binder::Binder;

/// A set of bindings applied to a [`Binder`].
///
/// `configure` runs once per module, when the injector or child injector
/// that installs it is created.
pub trait Module: Send + Sync {
    fn configure(&self, binder: &mut Binder);

    /// Human-readable name for logs and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<M: Module + ?Sized> Module for &M {
    fn configure(&self, binder: &mut Binder) {
        (**self).configure(binder);
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<M: Module + ?Sized> Module for Box<M> {
    fn configure(&self, binder: &mut Binder) {
        (**self).configure(binder);
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<M: Module + ?Sized> Module for Arc<M> {
    fn configure(&self, binder: &mut Binder) {
        (**self).configure(binder);
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A module backed by a closure. Created by [`from_fn`].
pub struct FnModule<F> {
    configure: F,
}

impl<F> Module for FnModule<F>
where
    F: Fn(&mut Binder) + Send + Sync,
{
    fn configure(&self, binder: &mut Binder) {
        (self.configure)(binder);
    }

    fn name(&self) -> &str {
        "closure module"
    }
}

/// Turns a closure into a [`Module`].
pub fn from_fn<F>(configure: F) -> FnModule<F>
where
    F: Fn(&mut Binder) + Send + Sync,
{
    FnModule { configure }
}
