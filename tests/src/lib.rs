//! # Repair-Sync Test Suite
//!
//! Cross-component flows that need more than one crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs        # SyncClient end to end over the mock transport
//!     └── convergence.rs  # Router + reconciler ordering guarantees
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sync-tests
//! cargo test -p sync-tests integration::flows
//! ```

pub mod integration;
