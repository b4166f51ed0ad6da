//! # Shared Types Crate
//!
//! This crate contains the domain entities, deltas, channel names and wire
//! messages used by every component of the sync client.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-component types are defined here.
//! - **Timestamp Authority**: Every entity and delta carries `updated_at`; it is
//!   the only ordering signal the reconciler trusts.
//! - **Forward Compatibility**: Unknown message types and categories parse
//!   instead of failing, so server-side additions never break a client.

pub mod change;
pub mod connection;
pub mod delta;
pub mod entities;
pub mod errors;
pub mod protocol;

pub use change::{ChangeOp, EntityChange};
pub use connection::*;
pub use delta::{merge_list, ListItem, ListPatch};
pub use entities::*;
pub use errors::*;
pub use protocol::*;

/// Wall-clock timestamp used on the wire and in entity stores.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
