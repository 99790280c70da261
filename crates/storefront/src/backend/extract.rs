//! Shape probing over unwrapped backend payloads.
//!
//! The backend does not return one shape per resource: a cart may arrive as
//! a bare array, as `{carts: [...]}`, as `{items: [...]}` or nested under
//! further `data` keys. Every probe order lives here as data so it can be
//! narrowed in one place once the contract settles.

use bazaar_core::OrderId;
use rust_decimal::Decimal;
use serde_json::Value;

/// Deepest nesting searched by the first-array fallback.
const MAX_FALLBACK_DEPTH: usize = 4;

/// JSON pointers probed, in order, for the id of a freshly created order.
pub const ORDER_ID_PATHS: [&str; 10] = [
    "/orderId",
    "/order_id",
    "/_id",
    "/id",
    "/order/_id",
    "/order/id",
    "/order/orderId",
    "/data/_id",
    "/data/id",
    "/orders/0/_id",
];

/// Extract a list of records from an unwrapped payload.
///
/// Probe order:
/// 1. the payload itself, if it is an array;
/// 2. `carts`, then each of `resource_keys`;
/// 3. `data`, then `data.data`;
/// 4. the first array-valued property, searched depth-first.
///
/// Anything else yields an empty list.
#[must_use]
pub fn list(payload: &Value, resource_keys: &[&str]) -> Vec<Value> {
    if let Value::Array(items) = payload {
        return items.clone();
    }

    let keyed = std::iter::once("carts")
        .chain(resource_keys.iter().copied())
        .map(|key| format!("/{key}"))
        .chain(["/data".to_owned(), "/data/data".to_owned()]);

    for pointer in keyed {
        if let Some(Value::Array(items)) = payload.pointer(&pointer) {
            return items.clone();
        }
    }

    first_array(payload, MAX_FALLBACK_DEPTH)
        .cloned()
        .unwrap_or_default()
}

/// Depth-first search for the first array-valued property.
fn first_array(value: &Value, depth: usize) -> Option<&Vec<Value>> {
    let Value::Object(map) = value else {
        return None;
    };

    if let Some(items) = map.values().find_map(Value::as_array) {
        return Some(items);
    }

    if depth == 0 {
        return None;
    }

    map.values()
        .filter(|v| v.is_object())
        .find_map(|v| first_array(v, depth - 1))
}

/// Extract the id of a created order.
#[must_use]
pub fn order_id(payload: &Value) -> Option<OrderId> {
    string(payload, &ORDER_ID_PATHS).map(OrderId::new)
}

/// First non-empty string (or number, stringified) at any of `paths`.
#[must_use]
pub fn string(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| match value.pointer(path)? {
        Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()).map(str::to_owned),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First decimal at any of `paths`.
///
/// Accepts JSON numbers and numeric strings; currency prefixes, commas and
/// whitespace inside strings are ignored (`"₹1,299.00"`, `"Rs. 499"`).
#[must_use]
pub fn decimal(value: &Value, paths: &[&str]) -> Option<Decimal> {
    paths.iter().find_map(|path| match value.pointer(path)? {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => parse_amount(s),
        _ => None,
    })
}

/// Parse the number inside a display string. A currency prefix is skipped
/// up to the first digit, so the dot in `"Rs. 499"` or `"Rs.499"` is not
/// read as a decimal point.
fn parse_amount(s: &str) -> Option<Decimal> {
    let first_digit = s.find(|c: char| c.is_ascii_digit())?;
    let prefix = s.get(..first_digit)?;

    let mut cleaned = String::new();
    let mut prefix_chars = prefix.chars().rev();
    match prefix_chars.next() {
        Some('.') if !prefix_chars.next().is_some_and(char::is_alphabetic) => {
            if prefix.trim_end_matches('.').ends_with('-') {
                cleaned.push('-');
            }
            cleaned.push('.');
        }
        Some('-') => cleaned.push('-'),
        _ => {}
    }

    cleaned.extend(
        s.get(first_digit..)?
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.'),
    );
    cleaned.parse::<Decimal>().ok()
}

/// First non-negative integer at any of `paths`.
#[must_use]
pub fn count(value: &Value, paths: &[&str]) -> Option<u64> {
    paths.iter().find_map(|path| match value.pointer(path)? {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // filtered to >= 0
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

/// First boolean at any of `paths`. Strings `"true"`/`"false"` are accepted.
#[must_use]
pub fn flag(value: &Value, paths: &[&str]) -> Option<bool> {
    paths.iter().find_map(|path| match value.pointer(path)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse::<bool>().ok(),
        _ => None,
    })
}

/// The first path that resolves to a JSON object.
#[must_use]
pub fn object<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| value.pointer(path))
        .find(|v| v.is_object())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ids(items: &[Value]) -> Vec<i64> {
        items.iter().filter_map(|i| i["id"].as_i64()).collect()
    }

    #[test]
    fn test_list_bare_array() {
        assert_eq!(ids(&list(&json!([{"id": 1}, {"id": 2}]), &[])), vec![1, 2]);
    }

    #[test]
    fn test_list_carts_key_wins_over_resource_keys() {
        let payload = json!({"items": [{"id": 2}], "carts": [{"id": 1}]});
        assert_eq!(ids(&list(&payload, &["items"])), vec![1]);
    }

    #[test]
    fn test_list_resource_key() {
        let payload = json!({"wishlist": [{"id": 7}], "count": 1});
        assert_eq!(ids(&list(&payload, &["wishlist"])), vec![7]);
    }

    #[test]
    fn test_list_nested_data() {
        assert_eq!(ids(&list(&json!({"data": [{"id": 3}]}), &[])), vec![3]);
        assert_eq!(
            ids(&list(&json!({"data": {"data": [{"id": 4}]}}), &[])),
            vec![4]
        );
    }

    #[test]
    fn test_list_falls_back_to_first_array_property() {
        let payload = json!({"user": "u1", "cart": {"total": 10, "lines": [{"id": 5}]}});
        assert_eq!(ids(&list(&payload, &["items"])), vec![5]);
    }

    #[test]
    fn test_list_non_list_is_empty() {
        assert!(list(&json!({"message": "empty"}), &["items"]).is_empty());
        assert!(list(&Value::Null, &[]).is_empty());
    }

    #[test]
    fn test_order_id_probe() {
        assert_eq!(
            order_id(&json!({"order": {"_id": "abc"}})).map(OrderId::into_inner),
            Some("abc".to_owned())
        );
        assert_eq!(
            order_id(&json!({"orderId": 1042})).map(OrderId::into_inner),
            Some("1042".to_owned())
        );
        assert_eq!(
            order_id(&json!({"id": "", "orders": [{"_id": "o9"}]})).map(OrderId::into_inner),
            Some("o9".to_owned())
        );
        assert_eq!(order_id(&json!({"ok": true})), None);
    }

    #[test]
    fn test_decimal_accepts_numbers_and_formatted_strings() {
        let value = json!({"a": 199.5, "b": "₹1,299.00", "c": "n/a"});
        assert_eq!(decimal(&value, &["/a"]), Some(Decimal::new(1995, 1)));
        assert_eq!(decimal(&value, &["/c", "/b"]), Some(Decimal::new(129_900, 2)));
        assert_eq!(decimal(&value, &["/c"]), None);
    }

    #[test]
    fn test_decimal_skips_currency_prefix() {
        let value = json!({
            "rs": "Rs. 499",
            "tight": "Rs.499",
            "inr": "INR 1,299.00",
            "fraction": ".5",
            "negative": "-12.50",
        });
        assert_eq!(decimal(&value, &["/rs"]), Some(Decimal::new(499, 0)));
        assert_eq!(decimal(&value, &["/tight"]), Some(Decimal::new(499, 0)));
        assert_eq!(decimal(&value, &["/inr"]), Some(Decimal::new(129_900, 2)));
        assert_eq!(decimal(&value, &["/fraction"]), Some(Decimal::new(5, 1)));
        assert_eq!(decimal(&value, &["/negative"]), Some(Decimal::new(-1250, 2)));
    }

    #[test]
    fn test_count_and_flag() {
        let value = json!({"qty": "3", "stock": 2.0, "ok": "true"});
        assert_eq!(count(&value, &["/missing", "/qty"]), Some(3));
        assert_eq!(count(&value, &["/stock"]), Some(2));
        assert_eq!(flag(&value, &["/ok"]), Some(true));
    }
}
