//! Analysis modules.
//!
//! Turns communication records into the derived dashboard views.

pub mod aggregator;

pub use aggregator::*;
