//! Typed coercion of string values from the site config store
//!
//! The store only holds strings. Values headed for generated PHP config are
//! coerced once here; bool and numeric values are written unquoted ("raw"),
//! anything else as a quoted string.

use regex::Regex;
use std::sync::LazyLock;

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid regex"));

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+\.?[0-9]*$").expect("valid regex"));

/// A config value after coercion
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl TypedValue {
    /// Whether this value is written without quoting
    pub fn is_raw(&self) -> bool {
        !matches!(self, Self::String(_))
    }

    /// Truthiness for feature flags: `false`, `0`, `no` and empty are off
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("no"),
        }
    }
}

/// Coerce a raw store value
///
/// Rules, first match wins: `true`/`false` in any case, integer
/// (optional sign, digits), decimal (optional sign, digits, optional dot,
/// optional digits), otherwise the string unchanged.
pub fn coerce(value: &str) -> TypedValue {
    if value.eq_ignore_ascii_case("true") {
        return TypedValue::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return TypedValue::Bool(false);
    }
    if INTEGER.is_match(value) {
        if let Ok(i) = value.trim_start_matches('+').parse::<i64>() {
            return TypedValue::Int(i);
        }
    }
    if DECIMAL.is_match(value) {
        if let Ok(x) = value.trim_start_matches('+').parse::<f64>() {
            return TypedValue::Float(x);
        }
    }
    TypedValue::String(value.to_string())
}

/// One entry of the custom constants map, coerced and ready to inject
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantEntry {
    pub key: String,
    pub value: TypedValue,
    /// Text written to the config file; numbers keep their configured digits
    pub literal: String,
}

impl ConstantEntry {
    pub fn new(key: &str, raw: &str) -> Self {
        let value = coerce(raw);
        let literal = match &value {
            TypedValue::Bool(b) => b.to_string(),
            TypedValue::Int(_) | TypedValue::Float(_) => raw.trim_start_matches('+').to_string(),
            TypedValue::String(s) => s.clone(),
        };
        Self {
            key: key.to_string(),
            value,
            literal,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.value.is_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans_any_case() {
        assert_eq!(coerce("true"), TypedValue::Bool(true));
        assert_eq!(coerce("TRUE"), TypedValue::Bool(true));
        assert_eq!(coerce("False"), TypedValue::Bool(false));
    }

    #[test]
    fn test_integers() {
        assert_eq!(coerce("42"), TypedValue::Int(42));
        assert_eq!(coerce("-7"), TypedValue::Int(-7));
        assert_eq!(coerce("+3"), TypedValue::Int(3));
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_decimals() {
        assert_eq!(coerce("3.14"), TypedValue::Float(3.14));
        assert_eq!(coerce("-0.5"), TypedValue::Float(-0.5));
        assert_eq!(coerce("2."), TypedValue::Float(2.0));
    }

    #[test]
    fn test_integer_overflow_falls_back_to_float() {
        assert!(matches!(
            coerce("99999999999999999999"),
            TypedValue::Float(_)
        ));
    }

    #[test]
    fn test_strings() {
        assert_eq!(coerce("hello"), TypedValue::String("hello".into()));
        assert_eq!(coerce(".5"), TypedValue::String(".5".into()));
        assert_eq!(coerce("1.2.3"), TypedValue::String("1.2.3".into()));
        assert_eq!(coerce("+"), TypedValue::String("+".into()));
        assert_eq!(coerce(" 42"), TypedValue::String(" 42".into()));
    }

    #[test]
    fn test_empty_is_string() {
        let v = coerce("");
        assert_eq!(v, TypedValue::String(String::new()));
        assert!(!v.is_raw());
    }

    #[test]
    fn test_raw_mode() {
        assert!(coerce("true").is_raw());
        assert!(coerce("42").is_raw());
        assert!(coerce("3.14").is_raw());
        assert!(!coerce("hello").is_raw());
    }

    #[test]
    fn test_constant_literals() {
        let literal = |raw| ConstantEntry::new("X", raw).literal;
        assert_eq!(literal("TRUE"), "true");
        assert_eq!(literal("+42"), "42");
        assert_eq!(literal("3.14"), "3.14");
        assert_eq!(literal("2."), "2.");
        assert_eq!(literal("hello"), "hello");
    }

    #[test]
    fn test_wide_number_keeps_configured_digits() {
        let entry = ConstantEntry::new("BIG", "12345678901234567890");
        assert!(entry.is_raw());
        assert_eq!(entry.literal, "12345678901234567890");
    }

    #[test]
    fn test_truthiness() {
        assert!(coerce("true").is_truthy());
        assert!(coerce("1").is_truthy());
        assert!(coerce("yes").is_truthy());
        assert!(!coerce("false").is_truthy());
        assert!(!coerce("0").is_truthy());
        assert!(!coerce("").is_truthy());
        assert!(!coerce("No").is_truthy());
    }

    #[test]
    fn test_constant_entry() {
        let entry = ConstantEntry::new("WP_MEMORY_LIMIT", "256M");
        assert_eq!(entry.key, "WP_MEMORY_LIMIT");
        assert_eq!(entry.value, TypedValue::String("256M".into()));
        assert_eq!(entry.literal, "256M");
        assert!(!entry.is_raw());
    }
}
