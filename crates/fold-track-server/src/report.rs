// crates/fold-track-server/src/report.rs
// ============================================================================
// Module: Report Renderer
// Description: HTML rendering for the visit report.
// Purpose: Render filtered, sortable visit rows with escaped output.
// Dependencies: fold-track-core, time, url
// ============================================================================

//! ## Overview
//! The report page lists visits from the report window as an HTML table.
//! Column headers link back to the page with the sort toggled: clicking the
//! active column flips its direction, clicking another column starts it
//! ascending. Active filters survive sort changes because header links carry
//! the current filter pairs. All stored values are HTML-escaped on output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fold_track_core::ReportParams;
use fold_track_core::SortKey;
use fold_track_core::VisitRecord;
use time::OffsetDateTime;
use time::macros::format_description;
use url::form_urlencoded;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Sortable report columns in display order.
const SORTABLE_COLUMNS: [(SortKey, &str); 3] = [
    (SortKey::Timestamp, "Date/Time"),
    (SortKey::ScreenWidth, "Screen Width"),
    (SortKey::ScreenHeight, "Screen Height"),
];

/// Renders the visit report page.
#[must_use]
pub fn render_report(params: &ReportParams, rows: &[VisitRecord]) -> String {
    let mut page = String::new();
    page.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str("<title>Above the Fold Links</title>\n</head>\n<body>\n");
    page.push_str("<h1>Above the Fold Links</h1>\n");
    render_filter_form(&mut page, params);
    page.push_str("<table>\n<thead>\n<tr>\n");
    for (key, label) in SORTABLE_COLUMNS {
        render_header_cell(&mut page, params, key, label);
    }
    page.push_str("<th>Links</th>\n</tr>\n</thead>\n<tbody>\n");
    if rows.is_empty() {
        page.push_str("<tr><td colspan=\"4\">No visits recorded in the report window.</td></tr>\n");
    }
    for row in rows {
        render_row(&mut page, row);
    }
    page.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    page
}

/// Renders the filter form preserving the current sort.
fn render_filter_form(page: &mut String, params: &ReportParams) {
    page.push_str("<form method=\"get\" action=\"\">\n");
    let width_value =
        params.screen_width.map(|width| width.to_string()).unwrap_or_default();
    page.push_str(&format!(
        "<label>Screen width <input type=\"text\" name=\"screen_width\" value=\"{}\"></label>\n",
        html_escape(&width_value)
    ));
    let link_value = params.link_contains.clone().unwrap_or_default();
    page.push_str(&format!(
        "<label>Link contains <input type=\"text\" name=\"link_contains\" \
         value=\"{}\"></label>\n",
        html_escape(&link_value)
    ));
    page.push_str(&format!(
        "<input type=\"hidden\" name=\"orderby\" value=\"{}\">\n",
        params.orderby.as_str()
    ));
    page.push_str(&format!(
        "<input type=\"hidden\" name=\"order\" value=\"{}\">\n",
        params.order.as_str()
    ));
    page.push_str("<button type=\"submit\">Filter</button>\n</form>\n");
}

/// Renders one sortable header cell with its toggle link.
fn render_header_cell(page: &mut String, params: &ReportParams, key: SortKey, label: &str) {
    let next = params.next_order_for(key);
    let mut pairs = params.filter_pairs();
    pairs.push(("orderby", key.as_str().to_string()));
    pairs.push(("order", next.as_str().to_string()));
    let query: String = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(name, value)| (*name, value.as_str())))
        .finish();
    let marker = if params.orderby == key {
        match params.order {
            fold_track_core::SortOrder::Asc => " &#9650;",
            fold_track_core::SortOrder::Desc => " &#9660;",
        }
    } else {
        ""
    };
    page.push_str(&format!(
        "<th><a href=\"?{}\">{}{}</a></th>\n",
        html_escape(&query),
        html_escape(label),
        marker
    ));
}

/// Renders one visit row.
fn render_row(page: &mut String, row: &VisitRecord) {
    page.push_str("<tr>\n");
    page.push_str(&format!("<td>{}</td>\n", html_escape(&format_timestamp(row.timestamp))));
    page.push_str(&format!("<td>{}</td>\n", row.screen_width));
    page.push_str(&format!("<td>{}</td>\n", row.screen_height));
    page.push_str("<td><ul>\n");
    for link in &row.links {
        let escaped = html_escape(link);
        page.push_str(&format!("<li><a href=\"{escaped}\">{escaped}</a></li>\n"));
    }
    page.push_str("</ul></td>\n</tr>\n");
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats a unix-milliseconds timestamp as `YYYY-MM-DD HH:MM:SS` UTC,
/// falling back to the raw millisecond value.
fn format_timestamp(timestamp_ms: i64) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let nanos = i128::from(timestamp_ms) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|datetime| datetime.format(format).ok())
        .map_or_else(|| timestamp_ms.to_string(), |text| text)
}

/// Escapes text for safe interpolation into HTML.
fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// ============================================================================
// SECTION: Tests
// ============================================================================
