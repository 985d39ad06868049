//! Grouped aggregation folded chunk by chunk.
//!
//! Every report runs the same loop: take one [`Batch`], group its rows by a
//! key into a partial aggregate, fold the partial into a cumulative one with
//! an associative and commutative [`CombineRule`], and finalize once the
//! stream is exhausted. A [`Grouping`] is the per-report configuration of
//! that loop.

use std::collections::hash_map::{self, HashMap};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use clickstream_core::error::Result;
use clickstream_core::models::EventRecord;
use tracing::debug;

use crate::reader::Batch;

// ── Combine rules ─────────────────────────────────────────────────────────────

/// How two measures for the same key are merged.
///
/// `combine` must be associative and commutative, and
/// `Measure::default()` must be its identity for the measures a report
/// produces. A key missing on one side of a fold is treated as holding the
/// default, never as absent.
pub trait CombineRule {
    type Measure: Clone + Default + fmt::Debug;

    fn combine(left: Self::Measure, right: Self::Measure) -> Self::Measure;
}

/// Row counts, added together.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountSum;

impl CombineRule for CountSum {
    type Measure = u64;

    fn combine(left: u64, right: u64) -> u64 {
        left + right
    }
}

/// Largest value seen, with a missing side filled by zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxFillZero;

impl CombineRule for MaxFillZero {
    type Measure = f64;

    fn combine(left: f64, right: f64) -> f64 {
        left.max(right)
    }
}

// ── GroupedAggregate ──────────────────────────────────────────────────────────

/// Mapping from grouping key to one measure.
///
/// Used both for the partial result of a single batch and for the
/// cumulative result across batches.
pub struct GroupedAggregate<K, R: CombineRule> {
    cells: HashMap<K, R::Measure>,
}

impl<K: Eq + Hash, R: CombineRule> GroupedAggregate<K, R> {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&R::Measure> {
        self.cells.get(key)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, R::Measure> {
        self.cells.iter()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, K, R::Measure> {
        self.cells.keys()
    }

    /// Record one row's measure inside a single batch.
    pub fn observe(&mut self, key: K, measure: R::Measure) {
        match self.cells.entry(key) {
            hash_map::Entry::Occupied(mut slot) => {
                let current = std::mem::take(slot.get_mut());
                *slot.get_mut() = R::combine(current, measure);
            }
            hash_map::Entry::Vacant(slot) => {
                slot.insert(measure);
            }
        }
    }

    /// Fold `partial` into `self` in place.
    ///
    /// Keys are aligned as in an outer join; a key missing from `self`
    /// starts from the default measure (zero) before combining.
    pub fn merge(&mut self, partial: Self) {
        for (key, measure) in partial.cells {
            let slot = self.cells.entry(key).or_default();
            *slot = R::combine(std::mem::take(slot), measure);
        }
    }

    /// Give every key prefix present in the aggregate an explicit entry for
    /// each value in `required`.
    ///
    /// `prefix` extracts the part of a key that identifies the group (for
    /// example the session) and `rebuild` joins a prefix with one required
    /// value back into a full key. Existing entries are left untouched;
    /// missing ones are inserted with the default measure.
    pub fn densify<P, S>(
        &mut self,
        required: &[S],
        prefix: impl Fn(&K) -> P,
        rebuild: impl Fn(&P, &S) -> K,
    ) where
        P: Eq + Hash,
    {
        let prefixes: HashSet<P> = self.cells.keys().map(&prefix).collect();
        for p in &prefixes {
            for value in required {
                self.cells.entry(rebuild(p, value)).or_default();
            }
        }
    }
}

impl<K: Eq + Hash, R: CombineRule> Default for GroupedAggregate<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, R: CombineRule> Clone for GroupedAggregate<K, R> {
    fn clone(&self) -> Self {
        Self {
            cells: self.cells.clone(),
        }
    }
}

impl<K: fmt::Debug, R: CombineRule> fmt::Debug for GroupedAggregate<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.cells.iter()).finish()
    }
}

impl<K, R> PartialEq for GroupedAggregate<K, R>
where
    K: Eq + Hash,
    R: CombineRule,
    R::Measure: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl<K, R: CombineRule> IntoIterator for GroupedAggregate<K, R> {
    type Item = (K, R::Measure);
    type IntoIter = hash_map::IntoIter<K, R::Measure>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl<K: Eq + Hash, R: CombineRule> FromIterator<(K, R::Measure)> for GroupedAggregate<K, R> {
    fn from_iter<I: IntoIterator<Item = (K, R::Measure)>>(iter: I) -> Self {
        let mut aggregate = Self::new();
        for (key, measure) in iter {
            aggregate.observe(key, measure);
        }
        aggregate
    }
}

// ── Grouping ──────────────────────────────────────────────────────────────────

type RowFilter<'a> = Box<dyn Fn(&EventRecord) -> bool + 'a>;
type KeyFn<'a, K> = Box<dyn Fn(&EventRecord) -> K + 'a>;
type MeasureFn<'a, M> = Box<dyn Fn(&EventRecord) -> M + 'a>;
type DensifyFn<'a, K, R> = Box<dyn Fn(&mut GroupedAggregate<K, R>) + 'a>;

/// Configuration of one stream-group-fold pass: which rows count, how they
/// are keyed, what each contributes, and whether partials are densified
/// before folding.
pub struct Grouping<'a, K, R: CombineRule> {
    filter: RowFilter<'a>,
    key: KeyFn<'a, K>,
    measure: MeasureFn<'a, R::Measure>,
    densify: Option<DensifyFn<'a, K, R>>,
}

impl<'a, K: Eq + Hash> Grouping<'a, K, CountSum> {
    /// Count rows per key.
    pub fn count(key: impl Fn(&EventRecord) -> K + 'a) -> Self {
        Self::new(key, |_| 1)
    }
}

impl<'a, K: Eq + Hash> Grouping<'a, K, MaxFillZero> {
    /// Largest `measure` per key.
    pub fn max(
        key: impl Fn(&EventRecord) -> K + 'a,
        measure: impl Fn(&EventRecord) -> f64 + 'a,
    ) -> Self {
        Self::new(key, measure)
    }
}

impl<'a, K: Eq + Hash, R: CombineRule> Grouping<'a, K, R> {
    /// Group by `key`, each row contributing `measure`.
    pub fn new(
        key: impl Fn(&EventRecord) -> K + 'a,
        measure: impl Fn(&EventRecord) -> R::Measure + 'a,
    ) -> Self {
        Self {
            filter: Box::new(|_| true),
            key: Box::new(key),
            measure: Box::new(measure),
            densify: None,
        }
    }

    /// Keep only rows matching `predicate`. Repeated calls are combined
    /// with a logical AND.
    pub fn filter(mut self, predicate: impl Fn(&EventRecord) -> bool + 'a) -> Self {
        let previous = self.filter;
        self.filter = Box::new(move |record| previous(record) && predicate(record));
        self
    }

    /// Run `densify` on every partial aggregate before it is folded.
    pub fn densify_with(mut self, densify: impl Fn(&mut GroupedAggregate<K, R>) + 'a) -> Self {
        self.densify = Some(Box::new(densify));
        self
    }

    /// Partial aggregate of a single batch.
    pub fn partial(&self, batch: &Batch) -> GroupedAggregate<K, R> {
        let mut partial = GroupedAggregate::new();
        for record in batch.records.iter().filter(|r| (self.filter)(r)) {
            partial.observe((self.key)(record), (self.measure)(record));
        }
        if let Some(densify) = &self.densify {
            densify(&mut partial);
        }
        partial
    }

    /// Stream `batches`, folding each partial into one cumulative aggregate.
    ///
    /// The first failing batch aborts the accumulation.
    pub fn accumulate<I>(&self, batches: I) -> Result<GroupedAggregate<K, R>>
    where
        I: IntoIterator<Item = Result<Batch>>,
    {
        let mut cumulative = GroupedAggregate::new();
        let mut rows = 0usize;
        let mut n_batches = 0usize;

        for batch in batches {
            let batch = batch?;
            let partial = self.partial(&batch);
            debug!(
                "Folding batch {}: {} rows, {} partial keys",
                batch.index,
                batch.len(),
                partial.len()
            );
            rows += batch.len();
            n_batches += 1;
            cumulative.merge(partial);
        }

        debug!(
            "Accumulated {} rows from {} batches into {} keys",
            rows,
            n_batches,
            cumulative.len()
        );
        Ok(cumulative)
    }

    /// [`Grouping::accumulate`] followed by a report-specific finalization.
    pub fn run<I, T>(
        &self,
        batches: I,
        finalize: impl FnOnce(GroupedAggregate<K, R>) -> T,
    ) -> Result<T>
    where
        I: IntoIterator<Item = Result<Batch>>,
    {
        self.accumulate(batches).map(finalize)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
