//! Time spent between funnel stages.
//!
//! Timestamps are collected per session/product pair across all batches
//! and paired up only once the stream is exhausted, so a pair whose events
//! straddle a batch boundary is measured like any other. Views only keep
//! their earliest time.

use chrono::NaiveDateTime;
use clickstream_core::error::Result;
use clickstream_core::models::{Column, EventRecord, EventType};
use clickstream_core::stats::MeanAccumulator;
use clickstream_core::time_utils::seconds_between;

use crate::accumulator::{CombineRule, GroupedAggregate, Grouping};
use crate::reader::Batch;

pub const TIMING_COLUMNS: &[Column] = &[
    Column::EventTime,
    Column::EventType,
    Column::ProductId,
    Column::UserSession,
];

/// Mean of the positive deltas found, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSummary {
    /// `NaN` when no delta was found.
    pub mean_seconds: f64,
    pub samples: u64,
}

// ── Timeline ──────────────────────────────────────────────────────────────────

/// Event times of one session/product pair, by stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub first_view: Option<NaiveDateTime>,
    pub carts: Vec<NaiveDateTime>,
    pub purchases: Vec<NaiveDateTime>,
}

impl Timeline {
    fn single(record: &EventRecord) -> Self {
        let mut timeline = Timeline::default();
        if let Some(time) = record.event_time {
            match record.event_type {
                EventType::View => timeline.first_view = Some(time),
                EventType::Cart => timeline.carts.push(time),
                EventType::Purchase => timeline.purchases.push(time),
                EventType::Other(_) => {}
            }
        }
        timeline
    }

    fn sort(&mut self) {
        self.carts.sort_unstable();
        self.purchases.sort_unstable();
    }

    /// Seconds from the n-th cart to the n-th purchase.
    fn cart_to_purchase_deltas(&self) -> impl Iterator<Item = f64> + '_ {
        self.carts
            .iter()
            .zip(&self.purchases)
            .map(|(cart, purchase)| seconds_between(*cart, *purchase))
    }

    /// Seconds from the first view to the first cart or purchase strictly
    /// after it.
    fn first_view_to_action(&self) -> Option<f64> {
        let first_view = self.first_view?;
        self.carts
            .iter()
            .chain(&self.purchases)
            .filter(|t| **t > first_view)
            .min()
            .map(|action| seconds_between(first_view, *action))
    }
}

/// Keeps the earlier first view and concatenates the goal timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendTimes;

impl CombineRule for AppendTimes {
    type Measure = Timeline;

    fn combine(mut left: Timeline, right: Timeline) -> Timeline {
        left.first_view = match (left.first_view, right.first_view) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        left.carts.extend(right.carts);
        left.purchases.extend(right.purchases);
        left
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Average time an item stays in the cart before it is purchased.
pub fn cart_to_purchase_time<I>(batches: I) -> Result<TimingSummary>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let timelines = pair_timelines(batches, &[EventType::Cart, EventType::Purchase])?;
    Ok(summarize(timelines, |t| t.cart_to_purchase_deltas().collect()))
}

/// Average time from the first view of a product to its first cart or
/// purchase.
pub fn view_to_action_time<I>(batches: I) -> Result<TimingSummary>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let timelines = pair_timelines(
        batches,
        &[EventType::View, EventType::Cart, EventType::Purchase],
    )?;
    Ok(summarize(timelines, |t| t.first_view_to_action().into_iter().collect()))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn pair_timelines<I>(
    batches: I,
    stages: &[EventType],
) -> Result<GroupedAggregate<(String, u32), AppendTimes>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    Grouping::<_, AppendTimes>::new(
        |r: &EventRecord| (r.user_session.clone(), r.product_id),
        Timeline::single,
    )
    .filter(|r| r.event_time.is_some() && stages.contains(&r.event_type))
    .accumulate(batches)
}

/// Mean of the positive deltas `deltas` extracts from each sorted timeline.
fn summarize(
    timelines: GroupedAggregate<(String, u32), AppendTimes>,
    deltas: impl Fn(&Timeline) -> Vec<f64>,
) -> TimingSummary {
    let mut mean = MeanAccumulator::default();
    for (_, mut timeline) in timelines {
        timeline.sort();
        for delta in deltas(&timeline).into_iter().filter(|d| *d > 0.0) {
            mean.push(delta);
        }
    }
    TimingSummary {
        mean_seconds: mean.mean(),
        samples: mean.count(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::testing::{batches, timed};

    // ── cart_to_purchase_time ─────────────────────────────────────────────────

    #[test]
    fn test_cart_to_purchase_pairs_nth_cart_with_nth_purchase() {
        let log = vec![
            timed("s1", 1, "cart", "2019-10-01 10:00:00"),
            timed("s1", 1, "purchase", "2019-10-01 10:01:00"),
            timed("s1", 1, "cart", "2019-10-01 10:05:00"),
            timed("s1", 1, "purchase", "2019-10-01 10:08:00"),
            timed("s2", 2, "cart", "2019-10-01 11:00:00"),
        ];
        let summary = cart_to_purchase_time(batches(&log, 10)).unwrap();
        // 60 s and 180 s; the lone cart of s2 has no purchase.
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.mean_seconds, 120.0);
    }

    #[test]
    fn test_cart_to_purchase_across_batch_boundary() {
        let log = vec![
            timed("s1", 1, "cart", "2019-10-01 10:00:00"),
            timed("s1", 1, "view", "2019-10-01 10:00:30"),
            timed("s1", 1, "purchase", "2019-10-01 10:02:00"),
        ];
        let whole = cart_to_purchase_time(batches(&log, 3)).unwrap();
        let split = cart_to_purchase_time(batches(&log, 1)).unwrap();
        assert_eq!(whole, split);
        assert_eq!(split.mean_seconds, 120.0);
    }

    #[test]
    fn test_cart_to_purchase_discards_non_positive_deltas() {
        let log = vec![
            timed("s1", 1, "purchase", "2019-10-01 10:00:00"),
            timed("s1", 1, "cart", "2019-10-01 10:00:00"),
        ];
        let summary = cart_to_purchase_time(batches(&log, 2)).unwrap();
        assert_eq!(summary.samples, 0);
        assert!(summary.mean_seconds.is_nan());
    }

    #[test]
    fn test_cart_to_purchase_keeps_multi_day_deltas() {
        let log = vec![
            timed("s1", 1, "cart", "2019-10-01 10:00:00"),
            timed("s1", 1, "purchase", "2019-10-03 10:00:05"),
        ];
        let summary = cart_to_purchase_time(batches(&log, 1)).unwrap();
        assert_eq!(summary.mean_seconds, 2.0 * 86_400.0 + 5.0);
    }

    // ── view_to_action_time ───────────────────────────────────────────────────

    #[test]
    fn test_view_to_action_uses_first_view_and_next_goal() {
        let log = vec![
            timed("s1", 1, "view", "2019-10-01 10:00:00"),
            timed("s1", 1, "view", "2019-10-01 10:00:20"),
            timed("s1", 1, "cart", "2019-10-01 10:00:50"),
            timed("s1", 1, "purchase", "2019-10-01 10:03:00"),
            timed("s2", 2, "view", "2019-10-01 12:00:00"),
            timed("s2", 2, "purchase", "2019-10-01 12:01:40"),
        ];
        let summary = view_to_action_time(batches(&log, 4)).unwrap();
        // s1: 50 s, s2: 100 s.
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.mean_seconds, 75.0);
    }

    #[test]
    fn test_view_to_action_ignores_goals_before_first_view() {
        let log = vec![
            timed("s1", 1, "cart", "2019-10-01 09:00:00"),
            timed("s1", 1, "view", "2019-10-01 10:00:00"),
            timed("s1", 1, "purchase", "2019-10-01 10:00:10"),
        ];
        let summary = view_to_action_time(batches(&log, 1)).unwrap();
        assert_eq!(summary.mean_seconds, 10.0);
    }

    #[test]
    fn test_view_to_action_requires_both_stages() {
        let log = vec![
            timed("s1", 1, "view", "2019-10-01 10:00:00"),
            timed("s2", 2, "cart", "2019-10-01 10:00:10"),
        ];
        let summary = view_to_action_time(batches(&log, 2)).unwrap();
        assert_eq!(summary.samples, 0);
        assert!(summary.mean_seconds.is_nan());
    }

    // ── combine ───────────────────────────────────────────────────────────────

    fn at(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_append_times_merges_stage_lists() {
        let a = Timeline {
            first_view: Some(at("2019-10-01 10:00:00")),
            ..Default::default()
        };
        let b = Timeline {
            carts: vec![at("2019-10-01 10:00:00")],
            ..Default::default()
        };
        let merged = AppendTimes::combine(a, b);
        assert_eq!(merged.first_view, Some(at("2019-10-01 10:00:00")));
        assert_eq!((merged.carts.len(), merged.purchases.len()), (1, 0));
    }

    #[test]
    fn test_append_times_keeps_earliest_view() {
        let later = Timeline {
            first_view: Some(at("2019-10-01 10:05:00")),
            ..Default::default()
        };
        let earlier = Timeline {
            first_view: Some(at("2019-10-01 10:00:00")),
            ..Default::default()
        };
        let merged = AppendTimes::combine(later, earlier);
        assert_eq!(merged.first_view, Some(at("2019-10-01 10:00:00")));
        let merged = AppendTimes::combine(Timeline::default(), merged);
        assert_eq!(merged.first_view, Some(at("2019-10-01 10:00:00")));
    }

    #[test]
    fn test_views_stored_once_per_pair() {
        // 1000 views, one per second, newest first across ten batches.
        let log: Vec<_> = (0..1000)
            .rev()
            .map(|s| {
                let time = at("2019-10-01 10:00:00") + chrono::Duration::seconds(s);
                timed("s1", 1, "view", &time.format("%Y-%m-%d %H:%M:%S").to_string())
            })
            .collect();
        let timelines = pair_timelines(
            batches(&log, 100),
            &[EventType::View, EventType::Cart, EventType::Purchase],
        )
        .unwrap();

        assert_eq!(timelines.len(), 1);
        let timeline = timelines.get(&("s1".to_string(), 1)).unwrap();
        assert_eq!(timeline.first_view, Some(at("2019-10-01 10:00:00")));
        assert!(timeline.carts.is_empty() && timeline.purchases.is_empty());
    }
}
