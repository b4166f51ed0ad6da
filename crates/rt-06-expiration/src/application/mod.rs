//! # Application Layer

pub mod sweeper;

pub use sweeper::ExpirationSweeper;
