//! Category reports: what sells, what gets visited.

use clickstream_core::error::Result;
use clickstream_core::models::{Column, EventRecord, EventType};
use clickstream_core::stats::top_n;

use crate::accumulator::{CountSum, GroupedAggregate, Grouping};
use crate::reader::{Batch, SummaryRow};

pub const CATEGORY_COLUMNS: &[Column] = &[Column::CategoryCode, Column::EventType];

pub const CATEGORY_LIST_COLUMNS: &[Column] = &[Column::CategoryCode];

pub const SOLD_PRODUCT_COLUMNS: &[Column] =
    &[Column::CategoryCode, Column::EventType, Column::ProductId];

/// Sub-category levels always kept when a depth is requested.
const MIN_SUBCATEGORY_SEGMENTS: usize = 2;

/// Best sellers of one top-level category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoldProducts {
    pub category: String,
    /// Number of products asked for.
    pub top_n: usize,
    /// Product ids, best seller first. May be shorter than `top_n`.
    pub product_ids: Vec<u32>,
}

/// Purchases per top-level category, largest first.
pub fn trending_categories<I>(batches: I) -> Result<Vec<(String, u64)>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    Grouping::count(|r: &EventRecord| r.top_category().to_string())
        .filter(|r| r.event_type == EventType::Purchase && !r.top_category().is_empty())
        .run(batches, |counts| top_n(counts, None))
}

/// Purchases per top-level category from a precomputed summary.
pub fn trending_from_summary(rows: Vec<SummaryRow>) -> Vec<(String, u64)> {
    let counts: GroupedAggregate<String, CountSum> = rows
        .into_iter()
        .map(|row| {
            let top = row.category.split('.').next().unwrap_or_default().to_string();
            (top, row.n_purchases)
        })
        .collect();
    top_n(counts, None)
}

/// Views per category path, largest first, keeping `top_n` entries.
///
/// With `depth = Some(n)` paths are cut to their first `max(2, n + 1)`
/// segments before counting, so sibling leaves roll up into their parent.
pub fn visited_subcategories<I>(
    batches: I,
    top: Option<usize>,
    depth: Option<usize>,
) -> Result<Vec<(String, u64)>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let segments = depth
        .filter(|d| *d > 0)
        .map(|d| MIN_SUBCATEGORY_SEGMENTS.max(d + 1));

    Grouping::count(move |r: &EventRecord| match segments {
        Some(n) => r.category_prefix(n),
        None => r.category_code.clone(),
    })
    .filter(|r| r.event_type == EventType::View && !r.category_code.is_empty())
    .run(batches, |counts| top_n(counts, top))
}

/// Distinct top-level categories, sorted.
pub fn categories<I>(batches: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    Grouping::count(|r: &EventRecord| r.top_category().to_string())
        .filter(|r| !r.top_category().is_empty())
        .run(batches, |seen| {
            let mut names: Vec<String> = seen.into_iter().map(|(name, _)| name).collect();
            names.sort();
            names
        })
}

/// The `top` most purchased products of `category`.
pub fn sold_products<I>(batches: I, category: &str, top: usize) -> Result<SoldProducts>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let product_ids = Grouping::count(|r: &EventRecord| r.product_id)
        .filter(|r| r.event_type == EventType::Purchase && r.top_category() == category)
        .run(batches, |counts| {
            top_n(counts, Some(top))
                .into_iter()
                .map(|(id, _)| id)
                .collect::<Vec<u32>>()
        })?;

    Ok(SoldProducts {
        category: category.to_string(),
        top_n: top,
        product_ids,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
