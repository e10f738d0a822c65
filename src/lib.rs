//! # Ticker Index
//!
//! In-memory AVL index of instrument snapshots keyed by ticker.
//!
//! ## Architecture
//!
//! - **Types**: Core data structures (Record, ChartHorizon)
//! - **Index**: Self-balancing tree with slab-based node storage
//! - **Ingest**: Positional CSV listing loader
//! - **Forecast**: Least-squares next-day price estimate
//! - **Resolver**: Chart link lookup and OS handoff
//! - **Shell**: Numbered-menu command surface
//!
//! ## Design Principles
//!
//! 1. **Single key**: Records are ordered and unique by exact ticker text
//! 2. **Price scans are full walks**: The tree is not ordered by price
//! 3. **Pre-allocated Memory**: Slab allocation, one slot per live record
//! 4. **Verifiable state**: `validate` plus SHA-256 shape and state roots

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Record, ChartHorizon
pub mod types;

/// Ordered index: AVL tree with slab-based storage
pub mod index;

/// Error types for every module
pub mod error;

/// Listing loader
pub mod ingest;

/// Trend forecaster
pub mod forecast;

/// Chart link resolution
pub mod resolver;

/// Command-line configuration
pub mod cli;

/// Interactive menu
pub mod shell;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use error::{ForecastError, IndexError, IngestError, ResolveError, RowError};
pub use index::{Extremum, IndexNode, OrderedIndex};
pub use types::{ChartHorizon, Record};
