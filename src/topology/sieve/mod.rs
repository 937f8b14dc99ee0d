//! Sieve storage: chart-indexed cone/support tables and their strata.

pub mod chart;
pub mod strata;

pub use chart::ChartSieve;
pub use strata::{StrataCache, compute_strata};
