//! Fixed-precision decimal coercion
//!
//! Inbound payloads carry numeric values as either JSON numbers or strings;
//! both are coerced into `rust_decimal::Decimal` so precision survives the
//! wire. Use `#[serde(with = "shared::decimal")]` on DTO fields, or
//! [`parse_loose`] for ad-hoc string validation.

use rust_decimal::Decimal;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

/// Parse a decimal from a string, accepting plain and scientific notation.
pub fn parse_loose(input: &str) -> Result<Decimal, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty decimal value".to_string());
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| format!("invalid decimal '{trimmed}': {e}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseInput {
    Number(f64),
    Text(String),
}

/// Deserialize a decimal from a JSON number or string
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    match LooseInput::deserialize(deserializer)? {
        LooseInput::Number(n) => {
            Decimal::try_from(n).map_err(|e| D::Error::custom(format!("invalid decimal: {e}")))
        }
        LooseInput::Text(s) => parse_loose(&s).map_err(D::Error::custom),
    }
}

/// Serialize a decimal as a string to avoid float rounding on the way out
pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(with = "crate::decimal")]
        amount: Decimal,
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(parse_loose("12.50").unwrap(), Decimal::new(1250, 2));
        assert_eq!(parse_loose(" 3 ").unwrap(), Decimal::new(3, 0));
        assert!(parse_loose("").is_err());
        assert!(parse_loose("abc").is_err());
    }

    #[test]
    fn test_deserialize_from_number() {
        let w: Wrapper = serde_json::from_str(r#"{"amount": 9.75}"#).unwrap();
        assert_eq!(w.amount, Decimal::new(975, 2));
    }

    #[test]
    fn test_deserialize_from_string() {
        let w: Wrapper = serde_json::from_str(r#"{"amount": "42.10"}"#).unwrap();
        assert_eq!(w.amount, Decimal::new(4210, 2));
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"amount": "x"}"#).is_err());
    }
}
