//! # Sanad: a runtime dependency injection container for Rust
//!
//! Bind abstractions to implementations in modules, then let an
//! [`Injector`] build object graphs on demand: constructor and member
//! injection, singleton and unscoped bindings, providers, and child
//! injectors that override their parent without touching it.
//!
//! ```
//! use std::sync::Arc;
//! use sanad::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str) -> String;
//! }
//!
//! #[derive(Injectable)]
//! struct ConsoleLogger;
//!
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) -> String {
//!         format!("[LOG] {msg}")
//!     }
//! }
//!
//! #[derive(Injectable)]
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let injector = Injector::create(&[&from_fn(|binder| {
//!     binder.bind::<dyn Logger>().singleton().to::<ConsoleLogger>(|l| l);
//! })])
//! .unwrap();
//!
//! let service = injector.resolve::<UserService>().unwrap();
//! assert_eq!(service.logger.log("ready"), "[LOG] ready");
//! ```

pub use sanad_container::*;
pub use sanad_macros::Injectable;
pub use sanad_support as support;

pub mod prelude {
    pub use sanad_container::prelude::*;
    pub use sanad_macros::Injectable;
}

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
