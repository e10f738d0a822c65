//! Read-only walks over the index: in-order iteration, price-range scans and
//! extremal (min/max) scans.
//!
//! None of these are cached aggregates. Every range or extremal scan visits
//! all n nodes, since the tree is ordered by ticker and not by price.

use std::iter::FusedIterator;

use slab::Slab;

use crate::index::{IndexNode, OrderedIndex};
use crate::types::Record;

// ============================================================================
// In-order iterator
// ============================================================================

/// Lazy ascending-ticker iterator over an [`OrderedIndex`].
///
/// Holds the left spine of the unvisited part of the tree on an explicit
/// stack, so memory use is O(height).
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    nodes: &'a Slab<IndexNode>,
    stack: Vec<usize>,
    remaining: usize,
}

impl<'a> Iter<'a> {
    fn new(index: &'a OrderedIndex) -> Self {
        let mut iter = Self {
            nodes: &index.nodes,
            stack: Vec::with_capacity(index.height() as usize),
            remaining: index.len(),
        };
        iter.push_left_spine(index.root);
        iter
    }

    fn push_left_spine(&mut self, mut slot: Option<usize>) {
        while let Some(key) = slot {
            self.stack.push(key);
            slot = self.nodes[key].left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.stack.pop()?;
        let nodes = self.nodes;
        let node = &nodes[key];
        self.push_left_spine(node.right);
        self.remaining -= 1;
        Some(&node.record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a OrderedIndex {
    type Item = &'a Record;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Extremum
// ============================================================================

/// Direction of an extremal scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extremum {
    /// Highest `last_price`
    Max,
    /// Lowest `last_price`
    Min,
}

impl Extremum {
    /// Strict comparison: ties keep the current best.
    #[inline]
    fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Extremum::Max => candidate > best,
            Extremum::Min => candidate < best,
        }
    }
}

// ============================================================================
// Scans
// ============================================================================

impl OrderedIndex {
    /// Iterate records in ascending ticker order
    ///
    /// # Example
    ///
    /// ```
    /// use ticker_index::index::OrderedIndex;
    /// use ticker_index::types::Record;
    ///
    /// let mut index = OrderedIndex::new();
    /// for ticker in ["MSFT", "AAPL", "GOOG"] {
    ///     index.insert(Record::new(ticker, 1.0, 1.0, 1.0, 1.0)).unwrap();
    /// }
    ///
    /// let tickers: Vec<&str> = index.iter().map(|r| r.ticker.as_str()).collect();
    /// assert_eq!(tickers, ["AAPL", "GOOG", "MSFT"]);
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// Copy every record out in ascending ticker order
    pub fn records(&self) -> Vec<Record> {
        self.iter().cloned().collect()
    }

    /// Records with `min_price <= last_price <= max_price`, in ticker order.
    ///
    /// Every node is visited: a subtree ordered by ticker can hold any mix
    /// of prices, so no branch can be skipped on price alone. An inverted
    /// range or a NaN bound yields nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use ticker_index::index::OrderedIndex;
    /// use ticker_index::types::Record;
    ///
    /// let mut index = OrderedIndex::new();
    /// for (ticker, price) in [("AAA", 10.0), ("BBB", 5.0), ("CCC", 20.0)] {
    ///     index.insert(Record::new(ticker, price, price, price, price)).unwrap();
    /// }
    ///
    /// let hits: Vec<&str> = index.range_scan(5.0, 15.0).into_iter().map(|r| r.ticker.as_str()).collect();
    /// assert_eq!(hits, ["AAA", "BBB"]);
    /// ```
    pub fn range_scan(&self, min_price: f64, max_price: f64) -> Vec<&Record> {
        self.iter()
            .filter(|record| record.last_price >= min_price && record.last_price <= max_price)
            .collect()
    }

    /// Walk every node and return the record with the extreme `last_price`.
    ///
    /// The running best starts at `seed`, which the caller supplies (the
    /// shell passes the first loaded record). Only a strictly better price
    /// replaces it, so the seed wins ties and an empty index returns the
    /// seed unchanged. Nodes are visited in pre-order (node, left, right).
    pub fn find_extremal<'a>(&'a self, extremum: Extremum, seed: &'a Record) -> &'a Record {
        let mut best = seed;
        let mut stack: Vec<usize> = self.root.into_iter().collect();

        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if extremum.improves(node.last_price(), best.last_price) {
                best = &node.record;
            }
            stack.extend(node.right);
            stack.extend(node.left);
        }

        best
    }

    /// Highest-priced record, seeded with the root; None when empty
    pub fn max_by_price(&self) -> Option<&Record> {
        let root = self.root?;
        Some(self.find_extremal(Extremum::Max, &self.nodes[root].record))
    }

    /// Lowest-priced record, seeded with the root; None when empty
    pub fn min_by_price(&self) -> Option<&Record> {
        let root = self.root?;
        Some(self.find_extremal(Extremum::Min, &self.nodes[root].record))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
