//! Core types shared across the crate.
//!
//! The error enum here is the strongly-typed backbone of the failure model:
//! every command either completes or aborts with one of these kinds, surfaced
//! to the user as a single colored line and a non-zero exit code. Code paths
//! that need extra context wrap the typed error in [`anyhow::Error`] with
//! `.context()` rather than inventing new variants.

pub mod error;

pub use error::O3deError;
