//! Raw customer records prior to encoding

use crate::errors::{ChurnError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A single raw attribute value: a categorical label or a numeric scalar.
///
/// JSON numbers deserialize as [`RawValue::Numeric`], strings as
/// [`RawValue::Categorical`] and booleans as `1.0` / `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Numeric(f64),
    Categorical(String),
}

impl RawValue {
    /// Category key used for vocabulary lookups and column naming.
    ///
    /// Integral numbers render without a fractional part so that `1` and
    /// `1.0` share a category. Text that [`RawValue::from_cell`] would read
    /// as a number gets the same key as that number.
    pub fn category_key(&self) -> String {
        match self {
            RawValue::Categorical(value) => match RawValue::from_cell(value) {
                RawValue::Numeric(number) => numeric_key(number),
                RawValue::Categorical(_) => value.clone(),
            },
            RawValue::Numeric(value) => numeric_key(*value),
        }
    }

    /// Interpret the value as a number.
    ///
    /// Categorical values are accepted when they parse as a finite number,
    /// which is how CSV cells arrive.
    pub fn as_f64(&self, attribute: &str) -> Result<f64> {
        let value = match self {
            RawValue::Numeric(value) => *value,
            RawValue::Categorical(text) => {
                text.trim()
                    .parse::<f64>()
                    .map_err(|_| ChurnError::TypeMismatch {
                        attribute: attribute.to_string(),
                        expected: "number",
                    })?
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ChurnError::TypeMismatch {
                attribute: attribute.to_string(),
                expected: "finite number",
            })
        }
    }

    /// Parse a CSV cell: numbers become numeric, everything else categorical.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => RawValue::Numeric(value),
            _ => RawValue::Categorical(trimmed.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, RawValue::Numeric(_))
    }
}

fn numeric_key(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Flag(bool),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(value) => RawValue::Numeric(value),
            Repr::Flag(flag) => RawValue::Numeric(if flag { 1.0 } else { 0.0 }),
            Repr::Text(text) => RawValue::Categorical(text),
        })
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Numeric(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Numeric(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Categorical(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Categorical(value)
    }
}

/// One customer's attributes prior to encoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    values: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.values.insert(attribute.into(), value.into());
        self
    }

    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(attribute.into(), value.into());
    }

    pub fn get(&self, attribute: &str) -> Option<&RawValue> {
        self.values.get(attribute)
    }

    /// Look up an attribute, failing with `MissingFeature` when absent
    pub fn require(&self, attribute: &str) -> Result<&RawValue> {
        self.values
            .get(attribute)
            .ok_or_else(|| ChurnError::MissingFeature(attribute.to_string()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, RawValue> {
        &self.values
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_mixed_values() {
        let record: RawRecord = serde_json::from_str(
            r#"{"Contract":"Month-to-month","tenure":12,"MonthlyCharges":70.35,"Partner":true}"#,
        )
        .unwrap();

        assert_eq!(
            record.get("Contract"),
            Some(&RawValue::Categorical("Month-to-month".into()))
        );
        assert_eq!(record.get("tenure"), Some(&RawValue::Numeric(12.0)));
        assert_eq!(record.get("Partner"), Some(&RawValue::Numeric(1.0)));
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_category_key_for_integral_numbers() {
        assert_eq!(RawValue::Numeric(1.0).category_key(), "1");
        assert_eq!(RawValue::Numeric(0.5).category_key(), "0.5");
        assert_eq!(RawValue::from("Two year").category_key(), "Two year");
    }

    #[test]
    fn test_numeric_text_shares_key_with_number() {
        assert_eq!(RawValue::from("1.0").category_key(), RawValue::Numeric(1.0).category_key());
        assert_eq!(RawValue::from(" 1 ").category_key(), "1");
        assert_eq!(RawValue::from("0.50").category_key(), "0.5");
        assert_eq!(RawValue::from("NaN").category_key(), "NaN");
    }

    #[test]
    fn test_as_f64_accepts_numeric_strings() {
        assert_eq!(RawValue::from(" 29.85 ").as_f64("TotalCharges").unwrap(), 29.85);
        let err = RawValue::from("DSL").as_f64("InternetService").unwrap_err();
        assert!(matches!(err, ChurnError::TypeMismatch { .. }));
    }

    #[test]
    fn test_from_cell() {
        assert_eq!(RawValue::from_cell("42"), RawValue::Numeric(42.0));
        assert_eq!(
            RawValue::from_cell(" Fiber optic "),
            RawValue::Categorical("Fiber optic".into())
        );
        assert_eq!(RawValue::from_cell(" "), RawValue::Categorical(String::new()));
    }

    #[test]
    fn test_require_missing_attribute() {
        let record = RawRecord::new().with("tenure", 3i64);
        assert!(record.require("tenure").is_ok());
        assert!(matches!(
            record.require("Contract"),
            Err(ChurnError::MissingFeature(name)) if name == "Contract"
        ));
    }
}
