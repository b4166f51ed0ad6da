//! # Domain Layer
//!
//! Channel patterns, dispatch outcomes and routing errors.

pub mod errors;
pub mod outcome;
pub mod pattern;

pub use errors::RouteError;
pub use outcome::{DispatchOutcome, HandlerId};
pub use pattern::ChannelPattern;
