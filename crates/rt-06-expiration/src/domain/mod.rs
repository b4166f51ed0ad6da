//! # Domain Layer

pub mod report;

pub use report::SweepReport;
