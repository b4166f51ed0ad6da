//! # Domain Layer
//!
//! Pure reference counting over channels.

pub mod errors;
pub mod registry;

pub use errors::SubscriptionError;
pub use registry::{ChannelRegistry, RegistryAction, SubscriptionHandle};
