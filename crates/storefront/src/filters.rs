//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Returns the content hash for search.js.
///
/// Usage in templates: `{{ ""|js_hash }}`
#[askama::filter_fn]
pub fn js_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("JS_HASH"))
}

/// Turns a backend status string into a badge modifier class.
///
/// Usage in templates: `<span class="badge badge--{{ order.status|status_class }}">`
#[askama::filter_fn]
pub fn status_class(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(badge_class(&value.to_string()).to_owned())
}

fn badge_class(status: &str) -> &'static str {
    match status {
        "delivered" | "paid" | "approved" | "active" => "good",
        "cancelled" | "returned" | "failed" | "rejected" | "blocked" => "bad",
        "shipped" | "processing" | "confirmed" => "info",
        _ => "neutral",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_class() {
        assert_eq!(badge_class("delivered"), "good");
        assert_eq!(badge_class("blocked"), "bad");
        assert_eq!(badge_class("shipped"), "info");
        assert_eq!(badge_class("pending"), "neutral");
    }
}
