use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

/// Kind of interaction recorded by one clickstream row.
///
/// The log carries a small fixed vocabulary; anything outside the three
/// funnel stages is kept verbatim in [`EventType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    View,
    Cart,
    Purchase,
    Other(String),
}

/// The funnel stages in their natural order.
pub const FUNNEL_STAGES: [EventType; 3] = [EventType::View, EventType::Cart, EventType::Purchase];

impl EventType {
    /// The raw string used in the source log.
    pub fn as_str(&self) -> &str {
        match self {
            EventType::View => "view",
            EventType::Cart => "cart",
            EventType::Purchase => "purchase",
            EventType::Other(raw) => raw,
        }
    }
}

impl Default for EventType {
    fn default() -> Self {
        EventType::Other(String::new())
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        match value {
            "view" => EventType::View,
            "cart" => EventType::Cart,
            "purchase" => EventType::Purchase,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl FromStr for EventType {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(EventType::from(value))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns of the source log that a report may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    EventTime,
    EventType,
    ProductId,
    CategoryCode,
    Brand,
    Price,
    UserSession,
}

impl Column {
    /// Header name in the source CSV.
    pub fn name(&self) -> &'static str {
        match self {
            Column::EventTime => "event_time",
            Column::EventType => "event_type",
            Column::ProductId => "product_id",
            Column::CategoryCode => "category_code",
            Column::Brand => "brand",
            Column::Price => "price",
            Column::UserSession => "user_session",
        }
    }
}

/// One row of the source log, restricted to the columns that were loaded.
///
/// Columns that were not requested keep their default value. String fields
/// that are empty in the source stay empty, they are never a null sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecord {
    /// Timezone-naive instant (UTC) of the event.
    pub event_time: Option<NaiveDateTime>,
    pub event_type: EventType,
    pub product_id: u32,
    /// Opaque session identifier.
    pub user_session: String,
    /// Dot-separated category path, possibly empty.
    pub category_code: String,
    pub brand: String,
    /// Non-negative amount.
    pub price: f64,
}

impl EventRecord {
    /// First segment of the category path, trimmed. Empty when the row has
    /// no category.
    pub fn top_category(&self) -> &str {
        self.category_code
            .split('.')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// The category path cut down to its first `segments` segments.
    pub fn category_prefix(&self, segments: usize) -> String {
        self.category_code
            .split('.')
            .take(segments)
            .collect::<Vec<_>>()
            .join(".")
    }
}
