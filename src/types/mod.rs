//! Core data types for the ticker index
//!
//! ## Types
//!
//! - [`Record`]: One instrument's latest snapshot (the indexed value)
//! - [`ChartHorizon`]: Short / medium / long chart link selector

mod record;

pub use record::{ChartHorizon, Record};
