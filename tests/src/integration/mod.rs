//! Integration flows.

mod convergence;
mod flows;
