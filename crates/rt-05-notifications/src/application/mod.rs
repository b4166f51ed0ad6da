//! # Application Layer

pub mod dispatcher;

pub use dispatcher::NotificationDispatcher;
