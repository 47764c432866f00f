//! Identity-keyed memoization.
//!
//! Results are keyed by the allocation an `Arc` points at, not by the value
//! inside it. Two structurally equal inputs in separate allocations are
//! separate entries. Entries are never evicted. Each holds a `Weak` to its
//! input, which pins the allocation so its address is not reused while the
//! entry exists; a dropped input simply stops producing hits.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheStats;

struct Slot<T, R> {
    input: Weak<T>,
    result: R,
}

// == Identity Memo ==
/// Memoized results of a pure function, keyed by `Arc` allocation identity.
pub struct IdentityMemo<T, R> {
    slots: HashMap<usize, Slot<T, R>>,
    stats: CacheStats,
}

impl<T, R: Clone> IdentityMemo<T, R> {
    /// Creates an empty memo.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    fn identity(input: &Arc<T>) -> usize {
        Arc::as_ptr(input) as *const () as usize
    }

    /// Returns the stored result for this exact allocation, if any.
    pub fn get(&self, input: &Arc<T>) -> Option<R> {
        let slot = self.slots.get(&Self::identity(input))?;
        let alive = slot.input.upgrade()?;
        Arc::ptr_eq(&alive, input).then(|| slot.result.clone())
    }

    // == Get Or Compute ==
    /// Returns the memoized result for `input`, calling `compute` only on a miss.
    pub fn get_or_compute<F>(&mut self, input: &Arc<T>, compute: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        if let Some(result) = self.get(input) {
            self.stats.record_hit();
            debug!("memo hit");
            return result;
        }

        self.stats.record_miss();
        let result = compute(input.as_ref());
        self.slots.insert(
            Self::identity(input),
            Slot {
                input: Arc::downgrade(input),
                result: result.clone(),
            },
        );
        self.stats.set_total_entries(self.slots.len());
        result
    }

    /// Number of stored results, including those whose input was dropped.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true when nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}

impl<T, R: Clone> Default for IdentityMemo<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R> std::fmt::Debug for IdentityMemo<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityMemo")
            .field("entries", &self.slots.len())
            .field("stats", &self.stats)
            .finish()
    }
}

// == Expensive Calculation ==
/// Input record for [`expensive_calculation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub value: f64,
}

impl Measure {
    /// Allocates a shareable input.
    pub fn shared(value: f64) -> Arc<Self> {
        Arc::new(Self { value })
    }
}

/// Memo type used by [`expensive_calculation`].
pub type MeasureMemo = IdentityMemo<Measure, f64>;

/// Doubles `input.value`, reusing the result for the same allocation.
pub fn expensive_calculation(memo: &mut MeasureMemo, input: &Arc<Measure>) -> f64 {
    memo.get_or_compute(input, |m| m.value * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_same_reference_computes_once() {
        let mut memo = MeasureMemo::new();
        let input = Measure::shared(10.0);
        let calls = Cell::new(0);

        let first = memo.get_or_compute(&input, |m| {
            calls.set(calls.get() + 1);
            m.value * 2.0
        });
        let second = memo.get_or_compute(&input, |m| {
            calls.set(calls.get() + 1);
            m.value * 2.0
        });

        assert_eq!(first, 20.0);
        assert_eq!(second, 20.0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_equal_values_distinct_references_recompute() {
        let mut memo = MeasureMemo::new();
        let a = Measure::shared(10.0);
        let b = Measure::shared(10.0);
        assert_eq!(a, b);

        let calls = Cell::new(0);
        let mut run = |input: &Arc<Measure>| {
            memo.get_or_compute(input, |m| {
                calls.set(calls.get() + 1);
                m.value * 2.0
            })
        };

        assert_eq!(run(&a), 20.0);
        assert_eq!(run(&b), 20.0);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_cloned_arc_shares_identity() {
        let mut memo = MeasureMemo::new();
        let input = Measure::shared(3.0);
        let alias = Arc::clone(&input);

        expensive_calculation(&mut memo, &input);
        expensive_calculation(&mut memo, &alias);

        let stats = memo.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_entries_are_never_evicted() {
        let mut memo = MeasureMemo::new();
        let inputs: Vec<_> = (0..5).map(|i| Measure::shared(i as f64)).collect();
        for input in &inputs {
            expensive_calculation(&mut memo, input);
        }
        drop(inputs);

        assert_eq!(memo.len(), 5);
    }

    #[test]
    fn test_dropped_input_is_not_a_hit() {
        let mut memo = MeasureMemo::new();
        let input = Measure::shared(4.0);
        expensive_calculation(&mut memo, &input);
        let weak = Arc::downgrade(&input);
        drop(input);

        assert!(weak.upgrade().is_none());
        let fresh = Measure::shared(8.0);
        assert_eq!(expensive_calculation(&mut memo, &fresh), 16.0);
    }

    #[test]
    fn test_expensive_calculation_doubles() {
        let mut memo = MeasureMemo::new();
        assert_eq!(expensive_calculation(&mut memo, &Measure::shared(-2.5)), -5.0);
    }
}
