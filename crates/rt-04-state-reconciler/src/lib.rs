//! # State Reconciler
//!
//! Merges inbound deltas into the local entity stores (repair progress,
//! notifications, photos).
//!
//! ## Merge Rule
//!
//! | Stored | Incoming | Result |
//! |--------|----------|--------|
//! | none | any | inserted |
//! | `updated_at = T` | `updated_at <= T` | rejected (`RejectReason::Stale`), no effect |
//! | `updated_at = T` | `updated_at > T` | present fields merged, `updated_at` adopted |
//!
//! Ordering is decided by timestamp only, never by arrival order, so
//! duplicated or reordered transport delivery is harmless. Stale rejections
//! are routine and counted, not logged as errors.
//!
//! List fields (repair steps, photo annotations) are patched: items are
//! appended or replaced in place by sub-id, unless the patch carries
//! `replace: true`.
//!
//! ## Optimistic Updates
//!
//! ```text
//! apply_optimistic(d) ──► pre-image saved, d applied locally
//!        │
//!        ├── authoritative delta ──► restore pre-image, apply under the merge rule
//!        └── rollback(id)        ──► restore pre-image
//! ```
//!
//! Both paths go through the same timestamp comparison, so a local guess can
//! never outlive the server's answer.

pub mod application;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use application::{Reconcilable, StateReconciler};
pub use domain::{AppliedResult, EntityStore, ReconcileError, RejectReason};
pub use metrics::{ReconcilerDiagnostics, ReconcilerDiagnosticsSnapshot};
pub use ports::ReconcilerApi;

/// Component name used in logs and metric labels.
pub const COMPONENT: &str = "reconciler";
