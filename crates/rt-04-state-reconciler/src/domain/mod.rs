//! # Domain Layer
//!
//! One `EntityStore` per entity family and the merge results it returns.

pub mod errors;
pub mod result;
pub mod store;

pub use errors::ReconcileError;
pub use result::{AppliedResult, RejectReason};
pub use store::EntityStore;
