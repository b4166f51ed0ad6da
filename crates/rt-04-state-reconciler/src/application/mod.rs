//! # Application Layer

pub mod reconciler;

pub use reconciler::{Reconcilable, StateReconciler};
