//! Brand pricing within one top-level category.

use std::collections::HashMap;

use clickstream_core::error::Result;
use clickstream_core::models::{Column, EventRecord, EventType};
use clickstream_core::stats::{top_n, MeanAccumulator};

use crate::accumulator::Grouping;
use crate::reader::Batch;

/// Columns for the pricing of purchased products.
pub const BRAND_PURCHASE_COLUMNS: &[Column] = &[
    Column::CategoryCode,
    Column::EventType,
    Column::Brand,
    Column::ProductId,
    Column::Price,
];

/// Columns for the pricing of every product seen, whatever the event.
pub const BRAND_COLUMNS: &[Column] = &[
    Column::CategoryCode,
    Column::Brand,
    Column::ProductId,
    Column::Price,
];

/// Mean price of the products each brand sold in `category`, largest first,
/// keeping `top` entries.
pub fn brand_prices<I>(batches: I, category: &str, top: Option<usize>) -> Result<Vec<(String, f64)>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    brand_mean_prices(batches, category, true, top)
}

/// Names of the `top` brands with the highest mean prices in `category`,
/// counting every event type.
pub fn top_brands<I>(batches: I, category: &str, top: usize) -> Result<Vec<String>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let ranked = brand_mean_prices(batches, category, false, Some(top))?;
    Ok(ranked.into_iter().map(|(brand, _)| brand).collect())
}

/// Highest price per `(brand, product)` folded with max-fill-zero, then
/// averaged per brand.
fn brand_mean_prices<I>(
    batches: I,
    category: &str,
    purchases_only: bool,
    top: Option<usize>,
) -> Result<Vec<(String, f64)>>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let mut grouping = Grouping::max(
        |r: &EventRecord| (r.brand.clone(), r.product_id),
        |r| r.price,
    )
    .filter(|r| !r.brand.is_empty() && r.top_category() == category);
    if purchases_only {
        grouping = grouping.filter(|r| r.event_type == EventType::Purchase);
    }

    grouping.run(batches, |products| {
        let mut brands: HashMap<String, MeanAccumulator> = HashMap::new();
        for ((brand, _), price) in products {
            brands.entry(brand).or_default().push(price);
        }
        top_n(brands.into_iter().map(|(brand, acc)| (brand, acc.mean())), top)
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
