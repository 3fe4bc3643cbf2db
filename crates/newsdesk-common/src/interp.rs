//! Tolerant field extraction over backend response bodies.
//!
//! The backend's response shapes are not a contract this client can rely on, so nothing in
//! here fails: a body that is not JSON behaves as an empty document, a missing key yields a
//! placeholder and a wrongly-typed value is treated as missing.
//!
//! ```rust
//! use newsdesk_common::interp::Doc;
//!
//! let doc = Doc::parse(r#"{"market_cap": 4250000000, "peg_ratio": null}"#);
//! assert_eq!(doc.number("market_cap"), "4.25B");
//! assert_eq!(doc.number("peg_ratio"), "N/A");
//! assert_eq!(doc.number("pe_ratio"), "-");
//! ```

use serde_json::Value;

/// Placeholder for a field that is absent or cannot be read as a number.
pub const MISSING: &str = "-";

/// Placeholder for a field the backend explicitly reported as `null`.
pub const NOT_APPLICABLE: &str = "N/A";

/// A parsed response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Doc(Value);

impl Doc {
    /// Parse `body`; anything that is not valid JSON becomes an empty document.
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self(value),
            Err(e) => {
                log::trace!("response body is not JSON ({e}); treating it as empty");
                Self(Value::Null)
            }
        }
    }

    /// `true` when the body parsed to something other than `null`.
    pub fn is_present(&self) -> bool {
        !self.0.is_null()
    }

    /// Find `key` on the top-level object, falling back to the first nested object that
    /// carries it. Arrays are not searched; use [`records()`] for those.
    ///
    /// [`records()`]: #method.records
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        find(&self.0, key)
    }

    /// Numeric field formatted for display, see [`format_number()`].
    ///
    /// [`format_number()`]: ./fn.format_number.html
    pub fn number(&self, key: &str) -> String {
        match self.lookup(key) {
            None => MISSING.to_string(),
            Some(Value::Null) => NOT_APPLICABLE.to_string(),
            Some(Value::Number(num)) => num
                .as_f64()
                .map(format_number)
                .unwrap_or_else(|| MISSING.to_string()),
            Some(_) => MISSING.to_string(),
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.lookup(key).and_then(Value::as_f64)
    }

    /// Integer field; fractional values are truncated toward zero.
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.lookup(key)? {
            Value::Number(num) => num.as_i64().or_else(|| num.as_f64().map(|f| f as i64)),
            _ => None,
        }
    }

    /// String field, empty when absent or not a string.
    pub fn text(&self, key: &str) -> String {
        self.opt_text(key).unwrap_or_default()
    }

    /// String field, `None` when absent, not a string, or empty.
    pub fn opt_text(&self, key: &str) -> Option<String> {
        match self.lookup(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// `true` only for a literal JSON `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.lookup(key), Some(Value::Bool(true)))
    }

    /// Each object inside the array field `key`, in order. Non-object entries are skipped
    /// and a missing or non-array field gives an empty list.
    pub fn records(&self, key: &str) -> Vec<Doc> {
        match self.lookup(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| item.is_object())
                .cloned()
                .map(Doc)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn find<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let Value::Object(map) = value else {
        return None;
    };
    if let Some(found) = map.get(key) {
        return Some(found);
    }
    map.values()
        .filter(|nested| nested.is_object())
        .find_map(|nested| find(nested, key))
}

/// Display formatting for backend numbers:
///
/// ```text
/// 4250000000  -> "4.25B"
/// 12500000    -> "12.50M"
/// 42.5        -> "42.50"
/// ```
pub fn format_number(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else {
        format!("{value:.2}")
    }
}

/// The backend's `detail` error string, when the body carries one.
pub fn detail(body: &str) -> Option<String> {
    Doc::parse(body).opt_text("detail")
}
