//! Normalization of service responses into an ordered [`GridSet`].
//!
//! The service may answer with a bare list, a `{"grids": [...]}` wrapper, or
//! a map of `grid_<n>` keys. [`ServerPayload::classify`] names the shape and
//! [`ServerPayload::into_grid_set`] maps every shape (including the
//! unrecognized fallback) to a grid list.

use std::cmp::Ordering;

use serde_json::Value;

use crate::grid::{Grid, GridSet};

/// Key prefix of the keyed payload shape.
pub const GRID_KEY_PREFIX: &str = "grid_";

#[derive(Debug, Clone, PartialEq)]
pub enum ServerPayload {
    /// No body, or JSON `null`.
    Absent,
    /// A bare JSON array, taken to already be a grid set.
    GridList(Vec<Value>),
    /// `{"grids": [...]}`.
    Wrapped(Vec<Value>),
    /// `{"grid_0": ..., "grid_1": ...}` in whatever order the object held them.
    Keyed(Vec<(String, Value)>),
    /// Anything else. Maps to an empty grid set.
    Unrecognized,
}

impl ServerPayload {
    pub fn classify(payload: Option<Value>) -> Self {
        match payload {
            None | Some(Value::Null) => ServerPayload::Absent,
            Some(Value::Array(items)) => ServerPayload::GridList(items),
            Some(Value::Object(mut map)) => {
                if matches!(map.get("grids"), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove("grids") {
                        return ServerPayload::Wrapped(items);
                    }
                }
                let keyed: Vec<(String, Value)> = map
                    .into_iter()
                    .filter(|(k, _)| k.starts_with(GRID_KEY_PREFIX))
                    .collect();
                if keyed.is_empty() {
                    ServerPayload::Unrecognized
                } else {
                    ServerPayload::Keyed(keyed)
                }
            }
            Some(_) => ServerPayload::Unrecognized,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServerPayload::Absent => "absent",
            ServerPayload::GridList(_) => "list",
            ServerPayload::Wrapped(_) => "wrapped",
            ServerPayload::Keyed(_) => "keyed",
            ServerPayload::Unrecognized => "unrecognized",
        }
    }

    pub fn into_grid_set(self) -> GridSet {
        match self {
            ServerPayload::Absent | ServerPayload::Unrecognized => Vec::new(),
            ServerPayload::GridList(items) | ServerPayload::Wrapped(items) => {
                items.into_iter().map(Grid::from_value).collect()
            }
            ServerPayload::Keyed(entries) => order_keyed(entries)
                .into_iter()
                .map(|(_, v)| Grid::from_value(v))
                .collect(),
        }
    }
}

/// Turns any accepted response body into an ordered grid list.
pub fn normalize(payload: Option<Value>) -> GridSet {
    ServerPayload::classify(payload).into_grid_set()
}

/// Integer value of the segment after the first `_`, read like a lenient
/// integer parse: leading whitespace and sign allowed, trailing junk ignored.
fn suffix_index(key: &str) -> Option<i64> {
    let segment = key.split('_').nth(1)?.trim_start();
    let (negative, digits) = match segment.as_bytes().first() {
        Some(b'-') => (true, &segment[1..]),
        Some(b'+') => (false, &segment[1..]),
        _ => (false, segment),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Only overflow can fail here; a longer run still reads as a number.
    let value: i64 = digits[..end].parse().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Numeric when both suffixes parse, lexicographic for that pair otherwise.
///
/// Mixing the two rules is not a total order over mixed key sets; the order
/// it produces is deterministic but not necessarily monotonic.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (suffix_index(a), suffix_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Stable insertion sort with [`compare_keys`].
///
/// The input is first put in plain key order so the result does not depend
/// on object enumeration order. Insertion sort never inspects the comparator
/// for consistency, so a non-transitive mix of keys cannot panic.
fn order_keyed(mut entries: Vec<(String, Value)>) -> Vec<(String, Value)> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut ordered: Vec<(String, Value)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let at = ordered
            .iter()
            .rposition(|placed| compare_keys(&placed.0, &entry.0) != Ordering::Greater)
            .map_or(0, |i| i + 1);
        ordered.insert(at, entry);
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(grids: &GridSet) -> Vec<Value> {
        grids.iter().map(|g| g.as_value().clone()).collect()
    }

    #[test]
    fn absent_and_null_are_empty() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(Value::Null)).is_empty());
    }

    #[test]
    fn bare_list_is_identity() {
        let payload = json!([[[0, 1], [1, 0]], [[1]], "not even a grid"]);
        let grids = normalize(Some(payload.clone()));
        assert_eq!(Value::Array(values(&grids)), payload);
    }

    #[test]
    fn wrapped_list_is_unwrapped() {
        let inner = json!([[[0, 1], [1, 0]], [[1, 1], [0, 0]]]);
        let grids = normalize(Some(json!({ "grids": inner.clone(), "generation": 4 })));
        assert_eq!(Value::Array(values(&grids)), inner);
    }

    #[test]
    fn keyed_payload_sorts_numerically() {
        let grids = normalize(Some(json!({
            "grid_0": "A",
            "grid_2": "C",
            "grid_1": "B",
        })));
        assert_eq!(values(&grids), vec![json!("A"), json!("B"), json!("C")]);

        let grids = normalize(Some(json!({
            "grid_10": 10,
            "grid_9": 9,
            "grid_2": 2,
        })));
        assert_eq!(values(&grids), vec![json!(2), json!(9), json!(10)]);
    }

    #[test]
    fn oversized_suffix_still_orders_numerically() {
        assert_eq!(suffix_index("grid_100000000000000000000"), Some(i64::MAX));
        let grids = normalize(Some(json!({
            "grid_100000000000000000000": "big",
            "grid_5": "five",
        })));
        assert_eq!(values(&grids), vec![json!("five"), json!("big")]);
    }

    #[test]
    fn keyed_payload_ignores_unrelated_keys() {
        let grids = normalize(Some(json!({ "grid_1": 1, "meta": "x", "grid_0": 0 })));
        assert_eq!(values(&grids), vec![json!(0), json!(1)]);
    }

    #[test]
    fn non_array_grids_field_falls_back_to_keyed() {
        let p = ServerPayload::classify(Some(json!({ "grids": {"a": 1}, "grid_0": 0 })));
        assert_eq!(p.label(), "keyed");
        assert_eq!(values(&p.into_grid_set()), vec![json!(0)]);
    }

    #[test]
    fn mixed_suffixes_are_deterministic() {
        let entries = |order: &[&str]| -> Vec<(String, Value)> {
            order
                .iter()
                .map(|k| (k.to_string(), Value::String(k.to_string())))
                .collect()
        };
        let first = order_keyed(entries(&["grid_x", "grid_10", "grid_2", "grid_1"]));
        let second = order_keyed(entries(&["grid_1", "grid_2", "grid_x", "grid_10"]));
        let keys: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["grid_1", "grid_2", "grid_10", "grid_x"]);
        assert_eq!(first, second);
    }

    #[test]
    fn suffix_parsing_is_lenient() {
        assert_eq!(suffix_index("grid_12"), Some(12));
        assert_eq!(suffix_index("grid_3abc"), Some(3));
        assert_eq!(suffix_index("grid_-2"), Some(-2));
        assert_eq!(suffix_index("grid_4_extra"), Some(4));
        assert_eq!(suffix_index("grid_x"), None);
        assert_eq!(suffix_index("grid_"), None);
    }

    #[test]
    fn unrecognized_shapes_are_empty() {
        for payload in [json!(true), json!(42), json!("grid_0"), json!({ "other": [1] })] {
            let p = ServerPayload::classify(Some(payload));
            assert_eq!(p, ServerPayload::Unrecognized);
            assert!(p.into_grid_set().is_empty());
        }
    }
}
