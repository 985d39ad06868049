//! Funnel reports: how sessions move from view to cart to purchase.

use std::collections::HashMap;

use clickstream_core::error::Result;
use clickstream_core::models::{Column, EventRecord, EventType, FUNNEL_STAGES};
use clickstream_core::stats::{rate_percent, top_n, two_stage_rate_percent, MeanAccumulator};

use crate::accumulator::{CountSum, GroupedAggregate, Grouping};
use crate::reader::Batch;

pub const EVENT_TYPE_COLUMNS: &[Column] = &[Column::EventType];

pub const SESSION_COLUMNS: &[Column] = &[Column::UserSession, Column::EventType];

pub const PAIR_COLUMNS: &[Column] = &[Column::UserSession, Column::ProductId, Column::EventType];

type PairEventKey = (String, u32, EventType);

// ── Result types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelRate {
    /// Session/product pairs with at least one purchase.
    pub complete: u64,
    /// Session/product pairs with at least one view.
    pub pairs: u64,
    pub rate_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartConversion {
    pub carts: u64,
    pub purchases: u64,
    pub probability_percent: u32,
}

/// Event counts of one session/product pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StageCounts {
    views: u64,
    carts: u64,
    purchases: u64,
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Distinct event types in the log, sorted by name.
pub fn event_types<I>(batches: I) -> Result<Vec<EventType>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    Grouping::count(|r: &EventRecord| r.event_type.clone()).run(batches, |seen| {
        let mut types: Vec<EventType> = seen.into_iter().map(|(t, _)| t).collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    })
}

/// Share of viewed session/product pairs that also saw a purchase.
pub fn funnel_rate<I>(batches: I) -> Result<FunnelRate>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let counts = pair_event_counts(batches, &[EventType::View, EventType::Purchase])?;

    let complete = counts.keys().filter(|(_, _, t)| *t == EventType::Purchase).count() as u64;
    let pairs = counts.keys().filter(|(_, _, t)| *t == EventType::View).count() as u64;

    Ok(FunnelRate {
        complete,
        pairs,
        rate_percent: two_stage_rate_percent(complete, pairs),
    })
}

/// Mean number of views, carts and purchases per session, largest first.
///
/// Every session of a batch is densified against the funnel stages, so a
/// stage a session never reached counts as zero in its mean. This includes
/// sessions that only produced other event types.
pub fn repeated_operations<I>(batches: I) -> Result<Vec<(EventType, f64)>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let grouping = Grouping::count(|r: &EventRecord| (r.user_session.clone(), r.event_type.clone()))
        .densify_with(|partial| {
            partial.densify(
                &FUNNEL_STAGES,
                |(session, _)| session.clone(),
                |session, stage| (session.clone(), stage.clone()),
            )
        });

    grouping.run(batches, |sessions| {
        let mut means: HashMap<EventType, MeanAccumulator> = HashMap::new();
        for ((_, stage), count) in sessions {
            if !FUNNEL_STAGES.contains(&stage) {
                continue;
            }
            means.entry(stage).or_default().push(count as f64);
        }
        top_n(means.into_iter().map(|(stage, acc)| (stage, acc.mean())), None)
    })
}

/// Mean of `views / carts` over session/product pairs that reached the cart.
/// `NaN` when no pair did.
pub fn views_before_cart<I>(batches: I) -> Result<f64>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let counts = pair_event_counts(batches, &[EventType::View, EventType::Cart])?;

    let mut ratio = MeanAccumulator::default();
    for stages in pivot_pairs(counts).values().filter(|s| s.carts > 0) {
        ratio.push(stages.views as f64 / stages.carts as f64);
    }
    Ok(ratio.mean())
}

/// Purchases over carts, restricted to pairs that were added to the cart.
pub fn cart_to_purchase<I>(batches: I) -> Result<CartConversion>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let counts = pair_event_counts(batches, &[EventType::Cart, EventType::Purchase])?;

    let (carts, purchases) = pivot_pairs(counts)
        .values()
        .filter(|s| s.carts > 0)
        .fold((0u64, 0u64), |(c, p), s| (c + s.carts, p + s.purchases));

    Ok(CartConversion {
        carts,
        purchases,
        probability_percent: rate_percent(purchases as f64, carts as f64),
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn pair_event_counts<I>(
    batches: I,
    stages: &[EventType],
) -> Result<GroupedAggregate<PairEventKey, CountSum>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    Grouping::count(|r: &EventRecord| (r.user_session.clone(), r.product_id, r.event_type.clone()))
        .filter(|r| stages.contains(&r.event_type))
        .accumulate(batches)
}

/// One row per session/product pair with its per-stage counts; stages that
/// never occurred read as zero.
fn pivot_pairs(counts: GroupedAggregate<PairEventKey, CountSum>) -> HashMap<(String, u32), StageCounts> {
    let mut pairs: HashMap<(String, u32), StageCounts> = HashMap::new();
    for ((session, product, stage), count) in counts {
        let slot = pairs.entry((session, product)).or_default();
        match stage {
            EventType::View => slot.views += count,
            EventType::Cart => slot.carts += count,
            EventType::Purchase => slot.purchases += count,
            EventType::Other(_) => {}
        }
    }
    pairs
}

// ── Tests ─────────────────────────────────────────────────────────────────────
