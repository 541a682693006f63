// crates/fold-track-core/src/core/report.rs
// ============================================================================
// Module: Fold Track Report Query Model
// Description: Report-page parameter parsing and sort toggling.
// Purpose: Map untrusted query parameters onto a bounded, typed visit query.
// Dependencies: crate::interfaces, serde
// ============================================================================

//! ## Overview
//! Report parameters are untrusted request input. Parsing never fails:
//! unrecognized `orderby` values fall back to [`SortKey::Timestamp`],
//! unrecognized `order` values fall back to [`SortOrder::Desc`], and
//! non-numeric `screen_width` filters are dropped. Sort keys map through a
//! fixed enum so user input can never reach a SQL sort clause.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::VisitQuery;

// ============================================================================
// SECTION: Sort Model
// ============================================================================

/// Allow-listed report sort columns.
///
/// # Invariants
/// - Variants are the only values that may ever reach a sort clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Sort by visit timestamp.
    #[default]
    Timestamp,
    /// Sort by viewport width.
    ScreenWidth,
    /// Sort by viewport height.
    ScreenHeight,
}

impl SortKey {
    /// Parses a query parameter, falling back to [`Self::Timestamp`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "screen_width" => Self::ScreenWidth,
            "screen_height" => Self::ScreenHeight,
            _ => Self::Timestamp,
        }
    }

    /// Returns the stable query-parameter label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::ScreenWidth => "screen_width",
            Self::ScreenHeight => "screen_height",
        }
    }
}

/// Report sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending order.
    Asc,
    /// Descending order.
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses a query parameter case-insensitively, falling back to
    /// [`Self::Desc`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// Returns the stable query-parameter label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

// ============================================================================
// SECTION: Report Parameters
// ============================================================================

/// Parsed report-page request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportParams {
    /// Optional exact-match viewport width filter.
    pub screen_width: Option<u32>,
    /// Optional substring filter against the serialized links.
    pub link_contains: Option<String>,
    /// Selected sort column.
    pub orderby: SortKey,
    /// Selected sort direction.
    pub order: SortOrder,
}

impl ReportParams {
    /// Parses report parameters from decoded query pairs.
    ///
    /// Malformed values recover to safe defaults and never surface as errors.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key {
                "screen_width" => params.screen_width = value.parse::<u32>().ok(),
                "link_contains" => {
                    params.link_contains =
                        (!value.is_empty()).then(|| value.to_string());
                }
                "orderby" => params.orderby = SortKey::parse(value),
                "order" => params.order = SortOrder::parse(value),
                _ => {}
            }
        }
        params
    }

    /// Returns the sort direction a header link for `key` should request.
    ///
    /// Clicking the currently sorted column flips its direction; clicking any
    /// other column starts ascending.
    #[must_use]
    pub fn next_order_for(&self, key: SortKey) -> SortOrder {
        if self.orderby == key {
            self.order.flipped()
        } else {
            SortOrder::Asc
        }
    }

    /// Returns the active filter values as query pairs.
    ///
    /// Used to preserve filter state across sort-toggle links and to keep the
    /// sort state in the filter form.
    #[must_use]
    pub fn filter_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(width) = self.screen_width {
            pairs.push(("screen_width", width.to_string()));
        }
        if let Some(needle) = &self.link_contains {
            pairs.push(("link_contains", needle.clone()));
        }
        pairs
    }

    /// Builds the bounded store query for these parameters.
    ///
    /// The report window is an implicit base filter independent from the
    /// retention window.
    #[must_use]
    pub fn to_query(&self, now_ms: i64, window_ms: i64, max_rows: usize) -> VisitQuery {
        VisitQuery {
            since_ms: now_ms.saturating_sub(window_ms),
            screen_width: self.screen_width,
            link_contains: self.link_contains.clone(),
            orderby: self.orderby,
            order: self.order,
            limit: max_rows,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
