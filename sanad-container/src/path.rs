//! Per-thread resolution path, used to report cycles.
//!
//! Every provider invocation and every direct construction pushes a frame
//! for its key. A provider frame also names the binding being invoked, so
//! a child binding that delegates to the parent's binding for the same key
//! is not a loop. Meeting the same frame again on the same thread means the
//! graph loops back on itself. Without this check such a loop would either
//! recurse until the stack overflows or block forever inside a singleton
//! that is still being initialized.

use std::cell::RefCell;
use std::marker::PhantomData;

use tracing::warn;

use crate::binding::Binding;
use crate::error::{CircularDependencyError, Result, SanadError};
use crate::key::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    /// Invoking the provider of the binding at this address.
    Provide(usize),
    /// Building a type through its injectable constructor.
    Construct,
}

impl Stage {
    pub(crate) fn provide(binding: &Binding) -> Self {
        Stage::Provide(std::ptr::from_ref(binding) as usize)
    }
}

#[derive(Clone, Copy)]
struct Frame {
    key: Key,
    stage: Stage,
}

thread_local! {
    static PATH: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a frame on the current thread's path until dropped.
pub(crate) struct PathGuard {
    // Frames belong to the thread that pushed them.
    _not_send: PhantomData<*const ()>,
}

impl PathGuard {
    pub(crate) fn enter(key: Key, stage: Stage) -> Result<Self> {
        PATH.with_borrow_mut(|path| {
            let repeated = path
                .iter()
                .position(|frame| frame.key == key && frame.stage == stage);

            if let Some(start) = repeated {
                let mut chain: Vec<Key> = path[start..].iter().map(|frame| frame.key).collect();
                chain.push(key);
                chain.dedup();
                if chain.len() == 1 {
                    chain.push(key);
                }

                warn!(key = %key, depth = path.len(), "Circular dependency detected");
                return Err(SanadError::CircularDependency(CircularDependencyError {
                    chain,
                }));
            }

            path.push(Frame { key, stage });
            Ok(PathGuard {
                _not_send: PhantomData,
            })
        })
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        PATH.with_borrow_mut(|path| {
            path.pop();
        });
    }
}

/// Depth of the current thread's path.
#[cfg(test)]
pub(crate) fn depth() -> usize {
    PATH.with_borrow(|path| path.len())
}
