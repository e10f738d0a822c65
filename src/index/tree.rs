//! AVL-balanced ordered index keyed by ticker.
//!
//! ## Architecture
//!
//! - **Slab**: every node lives in one pre-allocatable arena
//! - **Root slot**: `Option<usize>` pointing at the top node
//! - **Cached heights**: each node stores the height of its subtree
//!
//! Recursive helpers take a subtree slot and return the key of the subtree's
//! (possibly rotated) new root, which the caller writes back into its own
//! child slot.
//!
//! ## Invariants
//!
//! After every mutating call:
//! 1. Left subtree keys < node key < right subtree keys
//! 2. |height(left) - height(right)| <= 1 at every node
//! 3. height(node) = 1 + max(height(left), height(right))
//! 4. Live slab entries == nodes reachable from the root
//!
//! [`OrderedIndex::validate`] checks all four.
//!
//! ## Example
//!
//! ```
//! use ticker_index::index::OrderedIndex;
//! use ticker_index::types::Record;
//!
//! let mut index = OrderedIndex::with_capacity(16);
//! index.insert(Record::new("MSFT", 410.0, 415.0, 405.0, 412.0)).unwrap();
//! index.insert(Record::new("AAPL", 189.0, 191.0, 188.0, 190.0)).unwrap();
//!
//! assert_eq!(index.len(), 2);
//! assert_eq!(index.lookup("AAPL").map(|r| r.last_price), Some(190.0));
//! assert!(index.validate().is_ok());
//! ```

use std::cmp::Ordering;

use sha2::{Digest, Sha256};
use slab::Slab;

use crate::error::IndexError;
use crate::index::IndexNode;
use crate::types::Record;

/// Self-balancing binary search tree of [`Record`]s keyed by ticker.
#[derive(Debug, Clone)]
pub struct OrderedIndex {
    /// Node arena
    pub(super) nodes: Slab<IndexNode>,

    /// Slab key of the root node, None when empty
    pub(super) root: Option<usize>,
}

impl Default for OrderedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self {
            nodes: Slab::new(),
            root: None,
        }
    }

    /// Create an index with room for `capacity` records before reallocating
    ///
    /// # Example
    ///
    /// ```
    /// use ticker_index::index::OrderedIndex;
    ///
    /// let index = OrderedIndex::with_capacity(1_000);
    /// assert!(index.capacity() >= 1_000);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(capacity),
            root: None,
        }
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    /// Get the current capacity (pre-allocated slots)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Get the number of stored records
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the index is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the whole tree (0 when empty)
    #[inline]
    pub fn height(&self) -> u32 {
        self.height_of(self.root)
    }

    /// Remove every record
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    // ========================================================================
    // Balancing Primitives
    // ========================================================================

    #[inline]
    fn height_of(&self, slot: Option<usize>) -> u32 {
        slot.map_or(0, |key| self.nodes[key].height)
    }

    /// height(left) - height(right)
    #[inline]
    fn balance_factor(&self, key: usize) -> i64 {
        let node = &self.nodes[key];
        i64::from(self.height_of(node.left)) - i64::from(self.height_of(node.right))
    }

    #[inline]
    fn refresh_height(&mut self, key: usize) {
        let node = &self.nodes[key];
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.nodes[key].height = height;
    }

    /// ```text
    ///       y            x
    ///      / \          / \
    ///     x   C  ==>   A   y
    ///    / \              / \
    ///   A   B            B   C
    /// ```
    fn rotate_right(&mut self, y: usize) -> usize {
        let Some(x) = self.nodes[y].left else {
            return y;
        };
        let b = self.nodes[x].right;

        self.nodes[x].right = Some(y);
        self.nodes[y].left = b;

        self.refresh_height(y);
        self.refresh_height(x);
        x
    }

    /// Mirror of [`rotate_right`](Self::rotate_right).
    fn rotate_left(&mut self, x: usize) -> usize {
        let Some(y) = self.nodes[x].right else {
            return x;
        };
        let b = self.nodes[y].left;

        self.nodes[y].left = Some(x);
        self.nodes[x].right = b;

        self.refresh_height(x);
        self.refresh_height(y);
        y
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert a record if its ticker is not already present.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A new node was created
    /// * `Ok(false)` - The ticker already exists; the stored record is kept
    /// * `Err(IndexError::EmptyTicker)` - The record has no key
    ///
    /// # Example
    ///
    /// ```
    /// use ticker_index::index::OrderedIndex;
    /// use ticker_index::types::Record;
    ///
    /// let mut index = OrderedIndex::new();
    /// assert_eq!(index.insert(Record::new("AAA", 1.0, 1.0, 1.0, 10.0)), Ok(true));
    /// assert_eq!(index.insert(Record::new("AAA", 9.0, 9.0, 9.0, 99.0)), Ok(false));
    /// assert_eq!(index.lookup("AAA").unwrap().last_price, 10.0);
    /// ```
    pub fn insert(&mut self, record: Record) -> Result<bool, IndexError> {
        if record.ticker.is_empty() {
            return Err(IndexError::EmptyTicker);
        }

        let key = record.ticker.clone();
        let mut inserted = false;
        let root = self.insert_at(self.root, record, &key, &mut inserted);
        self.root = Some(root);
        Ok(inserted)
    }

    fn insert_at(
        &mut self,
        slot: Option<usize>,
        record: Record,
        key: &str,
        inserted: &mut bool,
    ) -> usize {
        let Some(node) = slot else {
            *inserted = true;
            return self.nodes.insert(IndexNode::new(record));
        };

        match key.cmp(self.nodes[node].ticker()) {
            Ordering::Less => {
                let child = self.insert_at(self.nodes[node].left, record, key, inserted);
                self.nodes[node].left = Some(child);
            }
            Ordering::Greater => {
                let child = self.insert_at(self.nodes[node].right, record, key, inserted);
                self.nodes[node].right = Some(child);
            }
            Ordering::Equal => return node,
        }

        if !*inserted {
            return node;
        }

        self.refresh_height(node);
        self.rebalance_after_insert(node, key)
    }

    /// Rotation choice follows the direction of the inserted key.
    fn rebalance_after_insert(&mut self, node: usize, key: &str) -> usize {
        let balance = self.balance_factor(node);

        if balance > 1 {
            if let Some(left) = self.nodes[node].left {
                match key.cmp(self.nodes[left].ticker()) {
                    // left-left
                    Ordering::Less => return self.rotate_right(node),
                    // left-right
                    Ordering::Greater => {
                        let left = self.rotate_left(left);
                        self.nodes[node].left = Some(left);
                        return self.rotate_right(node);
                    }
                    Ordering::Equal => {}
                }
            }
        }

        if balance < -1 {
            if let Some(right) = self.nodes[node].right {
                match key.cmp(self.nodes[right].ticker()) {
                    // right-right
                    Ordering::Greater => return self.rotate_left(node),
                    // right-left
                    Ordering::Less => {
                        let right = self.rotate_right(right);
                        self.nodes[node].right = Some(right);
                        return self.rotate_left(node);
                    }
                    Ordering::Equal => {}
                }
            }
        }

        node
    }

    // ========================================================================
    // Update / Lookup
    // ========================================================================

    /// Replace the stored record with the same ticker.
    ///
    /// Tree shape and heights are untouched. An absent ticker is a no-op
    /// (`Ok(false)`); callers wanting upsert semantics insert first.
    pub fn update(&mut self, record: Record) -> Result<bool, IndexError> {
        if record.ticker.is_empty() {
            return Err(IndexError::EmptyTicker);
        }

        match self.find(&record.ticker) {
            Some(key) => {
                self.nodes[key].record = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Find a record by ticker
    pub fn lookup(&self, ticker: &str) -> Option<&Record> {
        self.find(ticker).map(|key| &self.nodes[key].record)
    }

    /// Check if a ticker is present
    #[inline]
    pub fn contains(&self, ticker: &str) -> bool {
        self.find(ticker).is_some()
    }

    fn find(&self, ticker: &str) -> Option<usize> {
        let mut current = self.root;
        while let Some(key) = current {
            let node = &self.nodes[key];
            current = match ticker.cmp(node.ticker()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(key),
            };
        }
        None
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove a record by ticker.
    ///
    /// # Returns
    ///
    /// The removed record, or None if the ticker was absent (no-op)
    ///
    /// # Example
    ///
    /// ```
    /// use ticker_index::index::OrderedIndex;
    /// use ticker_index::types::Record;
    ///
    /// let mut index = OrderedIndex::new();
    /// index.insert(Record::new("AAA", 1.0, 1.0, 1.0, 10.0)).unwrap();
    ///
    /// assert!(index.delete("ZZZ").is_none());
    /// assert_eq!(index.delete("AAA").map(|r| r.ticker), Some("AAA".to_string()));
    /// assert!(index.is_empty());
    /// ```
    pub fn delete(&mut self, ticker: &str) -> Option<Record> {
        let (root, removed) = self.remove_at(self.root, ticker);
        self.root = root;
        removed
    }

    fn remove_at(&mut self, slot: Option<usize>, ticker: &str) -> (Option<usize>, Option<Record>) {
        let Some(node) = slot else {
            return (None, None);
        };

        let removed = match ticker.cmp(self.nodes[node].ticker()) {
            Ordering::Less => {
                let (child, removed) = self.remove_at(self.nodes[node].left, ticker);
                self.nodes[node].left = child;
                removed
            }
            Ordering::Greater => {
                let (child, removed) = self.remove_at(self.nodes[node].right, ticker);
                self.nodes[node].right = child;
                removed
            }
            Ordering::Equal => {
                let (left, right) = (self.nodes[node].left, self.nodes[node].right);
                match (left, right) {
                    (None, _) => return (right, Some(self.nodes.remove(node).record)),
                    (_, None) => return (left, Some(self.nodes.remove(node).record)),
                    (Some(_), Some(right)) => {
                        // Pull the successor's record out of the right subtree,
                        // releasing its slot, and move it into this node.
                        let successor = self.leftmost(right);
                        let successor_key = self.nodes[successor].ticker().to_owned();
                        let (child, donor) = self.remove_at(Some(right), &successor_key);
                        self.nodes[node].right = child;
                        donor.map(|record| std::mem::replace(&mut self.nodes[node].record, record))
                    }
                }
            }
        };

        if removed.is_none() {
            return (Some(node), None);
        }

        self.refresh_height(node);
        (Some(self.rebalance(node)), removed)
    }

    fn leftmost(&self, mut key: usize) -> usize {
        while let Some(left) = self.nodes[key].left {
            key = left;
        }
        key
    }

    /// Rotation choice follows the children's balance factors.
    fn rebalance(&mut self, node: usize) -> usize {
        let balance = self.balance_factor(node);

        if balance > 1 {
            if let Some(left) = self.nodes[node].left {
                if self.balance_factor(left) < 0 {
                    let left = self.rotate_left(left);
                    self.nodes[node].left = Some(left);
                }
                return self.rotate_right(node);
            }
        }

        if balance < -1 {
            if let Some(right) = self.nodes[node].right {
                if self.balance_factor(right) > 0 {
                    let right = self.rotate_right(right);
                    self.nodes[node].right = Some(right);
                }
                return self.rotate_left(node);
            }
        }

        node
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Check ordering, balance, cached heights and arena accounting.
    ///
    /// # Returns
    ///
    /// `Err(IndexError::Corrupted)` describing the first violation found
    pub fn validate(&self) -> Result<(), IndexError> {
        let (_, reachable) = self.check_subtree(self.root, None, None)?;
        if reachable != self.nodes.len() {
            return Err(corrupted(format!(
                "{} live slots but {} reachable nodes",
                self.nodes.len(),
                reachable
            )));
        }
        Ok(())
    }

    /// Returns (height, node count) of a verified subtree.
    fn check_subtree<'a>(
        &'a self,
        slot: Option<usize>,
        lower: Option<&'a str>,
        upper: Option<&'a str>,
    ) -> Result<(u32, usize), IndexError> {
        let Some(key) = slot else {
            return Ok((0, 0));
        };
        let node = self
            .nodes
            .get(key)
            .ok_or_else(|| corrupted(format!("dangling slot {key}")))?;
        let ticker = node.ticker();

        if ticker.is_empty() {
            return Err(corrupted(format!("empty ticker at slot {key}")));
        }
        if lower.is_some_and(|lo| ticker <= lo) || upper.is_some_and(|hi| ticker >= hi) {
            return Err(corrupted(format!("{ticker} is out of key order")));
        }

        let (left_height, left_count) = self.check_subtree(node.left, lower, Some(ticker))?;
        let (right_height, right_count) = self.check_subtree(node.right, Some(ticker), upper)?;

        let height = 1 + left_height.max(right_height);
        if node.height != height {
            return Err(corrupted(format!(
                "{ticker} caches height {} but has height {height}",
                node.height
            )));
        }
        if left_height.abs_diff(right_height) > 1 {
            return Err(corrupted(format!(
                "{ticker} is unbalanced ({left_height} vs {right_height})"
            )));
        }

        Ok((height, left_count + right_count + 1))
    }

    // ========================================================================
    // Digests
    // ========================================================================

    /// SHA-256 over the tree structure (keys, heights, child layout).
    ///
    /// Independent of non-key fields, so [`update`](Self::update) never
    /// changes it while any insert or delete that reshapes the tree does.
    pub fn shape_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        self.hash_shape(self.root, &mut hasher);
        finish(hasher)
    }

    fn hash_shape(&self, slot: Option<usize>, hasher: &mut Sha256) {
        match slot {
            None => hasher.update([0u8]),
            Some(key) => {
                let node = &self.nodes[key];
                hasher.update([1u8]);
                hash_str(hasher, node.ticker());
                hasher.update(node.height.to_le_bytes());
                self.hash_shape(node.left, hasher);
                self.hash_shape(node.right, hasher);
            }
        }
    }

    /// SHA-256 over every record's contents in ascending key order.
    ///
    /// Two indices holding equal records produce the same root regardless of
    /// insertion order.
    pub fn compute_state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for record in self.iter() {
            hash_str(&mut hasher, &record.ticker);
            for price in [record.open, record.day_high, record.day_low, record.last_price] {
                hasher.update(price.to_bits().to_le_bytes());
            }
            hash_str(&mut hasher, &record.chart_today);
            hash_str(&mut hasher, &record.chart_30_days);
            hash_str(&mut hasher, &record.chart_365_days);
        }
        finish(hasher)
    }

    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.compute_state_root())
    }
}

fn corrupted(reason: String) -> IndexError {
    IndexError::Corrupted { reason }
}

fn finish(hasher: Sha256) -> [u8; 32] {
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Length-prefixed so adjacent strings cannot alias.
fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

// ============================================================================
// Unit Tests
// ============================================================================
