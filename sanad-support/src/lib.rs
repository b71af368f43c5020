//! # Sanad Support
//!
//! Shared utilities for the Sanad DI crates.
//!
//! This crate provides:
//! - Text rendering for resolution paths and error hints
//! - [`AsAny`](any::AsAny), used to reach a trait object's concrete type

pub mod any;
pub mod rendering;
