//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! reconciliation logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Settings and topology loading and validation

pub mod bootstrap;
pub mod config;
