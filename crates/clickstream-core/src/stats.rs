use std::cmp::Ordering;

// ── Rates ─────────────────────────────────────────────────────────────────────

/// Share of `part` in `whole` as an integer percentage, rounded in two
/// stages: the ratio is first rounded to two decimals (half away from
/// zero), then scaled by 100 and truncated.
///
/// The truncation happens on the binary product, so a ratio of `0.29`
/// reports `28`. Returns `0` when `whole` is zero.
pub fn two_stage_rate_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let ratio = part as f64 / whole as f64;
    let rounded = (ratio * 100.0).round() / 100.0;
    (rounded * 100.0) as u32
}

/// `part / whole` as a percentage rounded once to the nearest integer.
/// Returns `0` when `whole` is zero.
pub fn rate_percent(part: f64, whole: f64) -> u32 {
    if whole == 0.0 {
        return 0;
    }
    (part / whole * 100.0).round() as u32
}

// ── Mean ──────────────────────────────────────────────────────────────────────

/// Running mean that never stores its samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    sum: f64,
    count: u64,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `NaN` when nothing was pushed.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        self.sum / self.count as f64
    }
}

// ── Top-N ─────────────────────────────────────────────────────────────────────

/// Sort `items` by measure, largest first, and keep the first `n`
/// (all of them when `n` is `None` or zero).
///
/// Equal measures are ordered by key so the output does not depend on hash
/// iteration order.
pub fn top_n<K, M>(items: impl IntoIterator<Item = (K, M)>, n: Option<usize>) -> Vec<(K, M)>
where
    K: Ord,
    M: PartialOrd,
{
    let mut sorted: Vec<(K, M)> = items.into_iter().collect();
    sorted.sort_by(|(ka, ma), (kb, mb)| {
        mb.partial_cmp(ma)
            .unwrap_or(Ordering::Equal)
            .then_with(|| ka.cmp(kb))
    });
    if let Some(n) = n.filter(|n| *n > 0) {
        sorted.truncate(n);
    }
    sorted
}

// ── Tests ──────────────────────────────────────────────────────────────────────
