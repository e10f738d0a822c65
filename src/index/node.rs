//! Index node for slab-based storage.
//!
//! ## Design
//!
//! `IndexNode` wraps a `Record` with two child slots and a cached subtree
//! height. Child slots are slab keys (`usize`), not references, so the whole
//! tree lives in a single `Slab<IndexNode>` owned by the index.
//!
//! ## Slab Integration
//!
//! Per official slab docs (https://docs.rs/slab/0.4.11):
//! - Keys are `usize` values returned by `slab.insert()`
//! - Keys may be reused after `slab.remove()`
//! - O(1) insert, remove, and lookup
//!
//! ## Ownership
//!
//! Every live node is referenced by exactly one slot: its parent's `left` or
//! `right`, or the index root. Removing a node from the slab therefore never
//! leaves another node pointing at it.

use crate::types::Record;

/// Tree node stored in the slab.
///
/// ```text
/// IndexNode {
///     record: Record
///     left:   Option<usize>   (keys < record.ticker)
///     right:  Option<usize>   (keys > record.ticker)
///     height: u32             (leaf = 1)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct IndexNode {
    /// The stored snapshot
    pub record: Record,

    /// Left child (slab key), None if absent
    pub left: Option<usize>,

    /// Right child (slab key), None if absent
    pub right: Option<usize>,

    /// Height of the subtree rooted here
    pub height: u32,
}

impl IndexNode {
    /// Create a new leaf node
    ///
    /// # Example
    ///
    /// ```
    /// use ticker_index::index::IndexNode;
    /// use ticker_index::types::Record;
    ///
    /// let node = IndexNode::new(Record::new("AAPL", 1.0, 1.0, 1.0, 1.0));
    ///
    /// assert!(node.left.is_none() && node.right.is_none());
    /// assert_eq!(node.height, 1);
    /// ```
    #[inline]
    pub fn new(record: Record) -> Self {
        Self {
            record,
            left: None,
            right: None,
            height: 1,
        }
    }

    /// Get the node key
    #[inline]
    pub fn ticker(&self) -> &str {
        &self.record.ticker
    }

    /// Get the last traded price
    #[inline]
    pub fn last_price(&self) -> f64 {
        self.record.last_price
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
