//! Known top-level categories per dataset label.
//!
//! Filled by the `categories` report and consulted by the category prompt
//! to reject names a dataset does not contain. The cache lives for one
//! session and is owned by the [`ReportRunner`](crate::runner::ReportRunner).

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CategoryCache {
    by_label: HashMap<String, Vec<String>>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the categories of `label`, replacing any earlier entry.
    pub fn insert(&mut self, label: &str, categories: Vec<String>) {
        tracing::debug!(label, count = categories.len(), "category cache populated");
        self.by_label.insert(label.to_string(), categories);
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.by_label.get(label).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    /// Whether `category` may be queried on `label`.
    ///
    /// Anything is accepted for a label whose categories are not known yet.
    pub fn accepts(&self, label: &str, category: &str) -> bool {
        match self.get(label) {
            Some(known) => known.iter().any(|c| c == category),
            None => true,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
