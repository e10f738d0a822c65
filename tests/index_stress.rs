//! Stress tests for the ticker index.
//!
//! These tests verify:
//! 1. Structural invariants hold after every mutation of a random workload
//! 2. Traversal and scans agree with a brute-force model
//! 3. Determinism is preserved across runs
//! 4. Slab slots are released by deletes
//!
//! ## Running Stress Tests
//!
//! ```bash
//! cargo test --release --test index_stress -- --nocapture
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use ticker_index::{Extremum, OrderedIndex, Record};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

/// Operations in the randomized model test
const MODEL_OPS: usize = 5_000;

/// Distinct tickers the workload draws from
const TICKER_SPACE: u32 = 600;

/// Records in the bulk load test
const BULK_COUNT: usize = 200_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn ticker(n: u32) -> String {
    format!("T{n:05}")
}

fn priced(ticker: &str, last: f64) -> Record {
    Record::new(ticker, last - 0.5, last + 1.0, last - 1.0, last)
}

/// Random price on a coarse grid so scan bounds hit exact values
fn random_price(rng: &mut ChaCha8Rng) -> f64 {
    rng.gen_range(0..2_000) as f64 / 4.0
}

/// Run a deterministic insert/update/delete sequence and return the index.
fn run_deterministic_sequence(seed: u64, count: usize) -> OrderedIndex {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut index = OrderedIndex::with_capacity(count);

    for _ in 0..count {
        let key = ticker(rng.gen_range(0..TICKER_SPACE));
        match rng.gen_range(0..10) {
            0..=5 => {
                index.insert(priced(&key, random_price(&mut rng))).unwrap();
            }
            6..=7 => {
                index.update(priced(&key, random_price(&mut rng))).unwrap();
            }
            _ => {
                index.delete(&key);
            }
        }
    }

    index
}

// ============================================================================
// STRESS TESTS
// ============================================================================

/// Random workload checked against a `BTreeMap` model after every step.
#[test]
fn stress_random_ops_match_model() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut index = OrderedIndex::new();
    let mut model: BTreeMap<String, f64> = BTreeMap::new();

    for step in 0..MODEL_OPS {
        let key = ticker(rng.gen_range(0..TICKER_SPACE));
        match rng.gen_range(0..10) {
            0..=5 => {
                let price = random_price(&mut rng);
                let inserted = index.insert(priced(&key, price)).unwrap();
                assert_eq!(inserted, !model.contains_key(&key), "step {step}: insert {key}");
                model.entry(key).or_insert(price);
            }
            6..=7 => {
                let price = random_price(&mut rng);
                let updated = index.update(priced(&key, price)).unwrap();
                assert_eq!(updated, model.contains_key(&key), "step {step}: update {key}");
                if let Some(slot) = model.get_mut(&key) {
                    *slot = price;
                }
            }
            _ => {
                let removed = index.delete(&key);
                assert_eq!(
                    removed.map(|r| r.last_price),
                    model.remove(&key),
                    "step {step}: delete {key}"
                );
            }
        }

        if let Err(error) = index.validate() {
            panic!("step {step}: {error}");
        }
        assert_eq!(index.len(), model.len());
    }

    let traversed: Vec<(String, f64)> = index
        .iter()
        .map(|r| (r.ticker.clone(), r.last_price))
        .collect();
    let expected: Vec<(String, f64)> = model.into_iter().collect();
    assert_eq!(traversed, expected);
}

/// Range scans return exactly the brute-force filter, in ticker order.
#[test]
fn stress_range_scan_matches_filter() {
    let index = run_deterministic_sequence(7, 3_000);
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for _ in 0..200 {
        let a = random_price(&mut rng);
        let b = random_price(&mut rng);
        let (min, max) = if a <= b { (a, b) } else { (b, a) };

        let got: Vec<&str> = index
            .range_scan(min, max)
            .into_iter()
            .map(|r| r.ticker.as_str())
            .collect();
        let expected: Vec<&str> = index
            .iter()
            .filter(|r| r.last_price >= min && r.last_price <= max)
            .map(|r| r.ticker.as_str())
            .collect();

        assert_eq!(got, expected, "range [{min}, {max}]");
    }
}

/// Extremal scans seeded from inside the index find the true extremes.
#[test]
fn stress_extremal_matches_fold() {
    let index = run_deterministic_sequence(11, 3_000);
    let seed = index.iter().next().unwrap();

    let max = index.find_extremal(Extremum::Max, seed);
    let min = index.find_extremal(Extremum::Min, seed);

    let true_max = index.iter().map(|r| r.last_price).fold(f64::MIN, f64::max);
    let true_min = index.iter().map(|r| r.last_price).fold(f64::MAX, f64::min);
    assert_eq!(max.last_price, true_max);
    assert_eq!(min.last_price, true_min);
}

/// The five-record scenario from the module docs.
#[test]
fn scenario_five_records() {
    let mut index = OrderedIndex::new();
    for (key, price) in [("AAA", 10.0), ("BBB", 5.0), ("CCC", 20.0), ("DDD", 1.0), ("EEE", 15.0)] {
        index.insert(priced(key, price)).unwrap();
    }

    let tickers = |records: Vec<&Record>| -> Vec<String> {
        records.into_iter().map(|r| r.ticker.clone()).collect()
    };
    assert_eq!(tickers(index.range_scan(5.0, 15.0)), ["AAA", "BBB", "EEE"]);
    assert_eq!(tickers(index.range_scan(18.0, 25.0)), ["CCC"]);

    let seed = index.lookup("AAA").unwrap();
    assert_eq!(index.find_extremal(Extremum::Max, seed).ticker, "CCC");
    assert_eq!(index.find_extremal(Extremum::Min, seed).ticker, "DDD");

    assert_eq!(index.delete("BBB").map(|r| r.ticker), Some("BBB".to_string()));
    let remaining: Vec<&str> = index.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(remaining, ["AAA", "CCC", "DDD", "EEE"]);
    assert!(index.validate().is_ok());
}

/// Updates change record contents but never the tree shape.
#[test]
fn update_preserves_shape() {
    let mut index = run_deterministic_sequence(3, 2_000);
    let shape = index.shape_root();
    let state = index.compute_state_root();

    let keys: Vec<String> = index.iter().map(|r| r.ticker.clone()).collect();
    for (i, key) in keys.iter().enumerate() {
        assert!(index.update(priced(key, i as f64)).unwrap());
    }

    assert_eq!(index.shape_root(), shape);
    assert_ne!(index.compute_state_root(), state);
    assert!(index.validate().is_ok());
}

/// Same sequence produces identical roots; a different seed does not.
#[test]
fn verify_determinism() {
    const TEST_COUNT: usize = 10_000;
    const SEED: u64 = 12345;

    let first = run_deterministic_sequence(SEED, TEST_COUNT);
    let second = run_deterministic_sequence(SEED, TEST_COUNT);

    println!("  Run 1 state root: {}", first.state_root_hex());
    println!("  Run 2 state root: {}", second.state_root_hex());

    assert_eq!(first.compute_state_root(), second.compute_state_root());
    assert_eq!(first.shape_root(), second.shape_root());

    let other = run_deterministic_sequence(SEED + 1, TEST_COUNT);
    println!("  Different seed:   {}", hex::encode(other.compute_state_root()));
    assert_ne!(first.compute_state_root(), other.compute_state_root());
}

/// Bulk sorted load stays logarithmic and every slot is reclaimed on delete.
#[test]
fn stress_bulk_load_and_drain() {
    println!("\n=== BULK LOAD: {BULK_COUNT} records ===\n");

    let mut index = OrderedIndex::with_capacity(BULK_COUNT);
    let start = Instant::now();
    for n in 0..BULK_COUNT {
        index.insert(priced(&format!("K{n:07}"), n as f64)).unwrap();
    }
    println!("  Inserted in {:.2?}", start.elapsed());

    // AVL bound: h < 1.4405 * log2(n + 2)
    let bound = (1.4405 * ((BULK_COUNT + 2) as f64).log2()).ceil() as u32;
    println!("  Height:     {} (bound {bound})", index.height());
    assert!(index.height() <= bound);
    assert!(index.validate().is_ok());

    let start = Instant::now();
    for n in (0..BULK_COUNT).step_by(2) {
        assert!(index.delete(&format!("K{n:07}")).is_some());
    }
    println!("  Deleted half in {:.2?}", start.elapsed());

    assert_eq!(index.len(), BULK_COUNT / 2);
    assert!(index.validate().is_ok());

    for n in (1..BULK_COUNT).step_by(2) {
        index.delete(&format!("K{n:07}"));
    }
    assert!(index.is_empty());
    assert_eq!(index.height(), 0);
    assert!(index.validate().is_ok());
}
