//! Ordered index module: an AVL tree keyed by ticker.
//!
//! ## Architecture
//!
//! - **Slab-based storage**: all nodes live in one arena, children are slab keys
//! - **AVL balancing**: single and double rotations after insert and delete
//! - **Price scans**: range and extremal scans walk the ticker-ordered tree
//!
//! ## Components
//!
//! - [`IndexNode`]: A `Record` plus child slots and cached height
//! - [`OrderedIndex`]: The tree and its mutation/query operations
//! - [`Iter`]: Lazy in-order iterator
//! - [`Extremum`]: Max/min selector for extremal scans
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Insert | O(log n) |
//! | Update | O(log n) |
//! | Delete | O(log n) |
//! | Lookup | O(log n) |
//! | In-order traversal | O(n) |
//! | Range scan | O(n) |
//! | Extremal scan | O(n) |
//!
//! ## Example
//!
//! ```
//! use ticker_index::index::{Extremum, OrderedIndex};
//! use ticker_index::types::Record;
//!
//! let mut index = OrderedIndex::new();
//! index.insert(Record::new("AAA", 9.0, 11.0, 8.0, 10.0)).unwrap();
//! index.insert(Record::new("CCC", 19.0, 21.0, 18.0, 20.0)).unwrap();
//!
//! let seed = index.lookup("AAA").unwrap();
//! assert_eq!(index.find_extremal(Extremum::Max, seed).ticker, "CCC");
//! ```

pub mod node;
pub mod scan;
pub mod tree;

pub use node::IndexNode;
pub use scan::{Extremum, Iter};
pub use tree::OrderedIndex;
