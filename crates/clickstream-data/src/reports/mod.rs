//! The fixed battery of clickstream reports.
//!
//! Each report is a [`Grouping`](crate::accumulator::Grouping) over the
//! batches of one dataset plus a finalization step. Reports only compute;
//! rendering lives in the UI crate.

pub mod brands;
pub mod categories;
pub mod funnel;
pub mod timing;

use std::path::PathBuf;

use clickstream_core::datasets::DatasetInfo;
use clickstream_core::models::EventType;

pub use brands::{brand_prices, top_brands, BRAND_COLUMNS, BRAND_PURCHASE_COLUMNS};
pub use categories::{
    categories, sold_products, trending_categories, trending_from_summary, visited_subcategories,
    SoldProducts, CATEGORY_COLUMNS, CATEGORY_LIST_COLUMNS, SOLD_PRODUCT_COLUMNS,
};
pub use funnel::{
    cart_to_purchase, event_types, funnel_rate, repeated_operations, views_before_cart,
    CartConversion, FunnelRate, EVENT_TYPE_COLUMNS, PAIR_COLUMNS, SESSION_COLUMNS,
};
pub use timing::{cart_to_purchase_time, view_to_action_time, TimingSummary, TIMING_COLUMNS};

/// One dataset file found on disk, joined with its catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetListing {
    pub label: String,
    pub path: PathBuf,
    pub info: Option<DatasetInfo>,
}

/// Finalized result of one report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutput {
    /// Distinct event types, sorted by name.
    EventTypes(Vec<EventType>),
    FunnelRate(FunnelRate),
    /// Mean number of events per session for each funnel stage, largest first.
    RepeatedOperations(Vec<(EventType, f64)>),
    /// Mean views per carted session/product pair; `NaN` when none.
    ViewsBeforeCart(f64),
    CartToPurchase(CartConversion),
    CartToPurchaseTime(TimingSummary),
    ViewToActionTime(TimingSummary),
    /// Purchases per top-level category, largest first.
    TrendingCategories(Vec<(String, u64)>),
    /// Views per (sub-)category, largest first.
    VisitedSubcategories {
        top_n: Option<usize>,
        visits: Vec<(String, u64)>,
    },
    /// Distinct top-level categories, sorted.
    Categories(Vec<String>),
    SoldProducts(SoldProducts),
    /// Mean product price per brand, largest first.
    BrandPrices {
        category: String,
        top_n: Option<usize>,
        prices: Vec<(String, f64)>,
    },
    /// Brands with the highest mean prices, best first.
    TopBrand {
        category: String,
        brands: Vec<String>,
    },
    Datasets(Vec<DatasetListing>),
}

impl ReportOutput {
    /// Short machine name of the report, used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ReportOutput::EventTypes(_) => "event-types",
            ReportOutput::FunnelRate(_) => "funnel-rate",
            ReportOutput::RepeatedOperations(_) => "repeated-operations",
            ReportOutput::ViewsBeforeCart(_) => "views-before-cart",
            ReportOutput::CartToPurchase(_) => "cart-to-purchase",
            ReportOutput::CartToPurchaseTime(_) => "cart-to-purchase-time",
            ReportOutput::ViewToActionTime(_) => "view-to-action-time",
            ReportOutput::TrendingCategories(_) => "trending-categories",
            ReportOutput::VisitedSubcategories { .. } => "visited-subcategories",
            ReportOutput::Categories(_) => "categories",
            ReportOutput::SoldProducts(_) => "sold-products",
            ReportOutput::BrandPrices { .. } => "brand-prices",
            ReportOutput::TopBrand { .. } => "top-brand",
            ReportOutput::Datasets(_) => "datasets",
        }
    }
}

/// Record builders shared by the report tests.
#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDateTime;
    use clickstream_core::error::Result;
    use clickstream_core::models::{EventRecord, EventType};

    use crate::reader::Batch;

    pub fn event(session: &str, product: u32, kind: &str) -> EventRecord {
        EventRecord {
            user_session: session.to_string(),
            product_id: product,
            event_type: EventType::from(kind),
            ..Default::default()
        }
    }

    pub fn timed(session: &str, product: u32, kind: &str, time: &str) -> EventRecord {
        EventRecord {
            event_time: Some(
                NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M:%S").unwrap(),
            ),
            ..event(session, product, kind)
        }
    }

    pub fn in_category(kind: &str, category: &str) -> EventRecord {
        EventRecord {
            event_type: EventType::from(kind),
            category_code: category.to_string(),
            ..Default::default()
        }
    }

    pub fn priced(kind: &str, category: &str, brand: &str, product: u32, price: f64) -> EventRecord {
        EventRecord {
            product_id: product,
            brand: brand.to_string(),
            price,
            ..in_category(kind, category)
        }
    }

    /// Split `records` into batches of `size` rows.
    pub fn batches(records: &[EventRecord], size: usize) -> Vec<Result<Batch>> {
        records
            .chunks(size.max(1))
            .enumerate()
            .map(|(index, chunk)| {
                Ok(Batch {
                    index,
                    records: chunk.to_vec(),
                })
            })
            .collect()
    }
}
