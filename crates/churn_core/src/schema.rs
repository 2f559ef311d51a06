//! Canonical encoded-column schema
//!
//! The ordered list of column names a classifier was trained on. The schema
//! hash is BLAKE3 over the canonical JSON of the names, so two schemas are
//! compatible exactly when they list the same names in the same order.

use crate::errors::{ChurnError, Result};
use crate::serde_canon::hash_canonical_hex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The 37 encoded features of the telco churn dataset, in model input order
pub const TELCO_FEATURE_COLUMNS: [&str; 37] = [
    "Partner",
    "gender",
    "Dependents",
    "PaperlessBilling",
    "PhoneService",
    "InternetService_DSL",
    "InternetService_Fiber optic",
    "InternetService_No",
    "PaymentMethod_Electronic check",
    "PaymentMethod_Mailed check",
    "PaymentMethod_Bank transfer (automatic)",
    "PaymentMethod_Credit card (automatic)",
    "Contract_Month-to-month",
    "Contract_One year",
    "Contract_Two year",
    "TechSupport_No",
    "TechSupport_Yes",
    "TechSupport_No internet service",
    "OnlineBackup_Yes",
    "OnlineBackup_No",
    "OnlineBackup_No internet service",
    "DeviceProtection_No",
    "DeviceProtection_Yes",
    "DeviceProtection_No internet service",
    "MultipleLines_No phone service",
    "MultipleLines_No",
    "MultipleLines_Yes",
    "StreamingTV_No",
    "StreamingTV_Yes",
    "StreamingTV_No internet service",
    "StreamingMovies_No",
    "StreamingMovies_Yes",
    "StreamingMovies_No internet service",
    "SeniorCitizen",
    "tenure",
    "MonthlyCharges",
    "TotalCharges",
];

/// Schema version written by the current encoder
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaRepr")]
pub struct EncodedColumnSchema {
    version: u32,
    columns: Vec<String>,
    hash: String,
}

#[derive(Deserialize)]
struct SchemaRepr {
    version: u32,
    columns: Vec<String>,
    hash: String,
}

impl TryFrom<SchemaRepr> for EncodedColumnSchema {
    type Error = ChurnError;

    fn try_from(repr: SchemaRepr) -> Result<Self> {
        let schema = EncodedColumnSchema::new(repr.version, repr.columns)?;
        if schema.hash != repr.hash {
            return Err(ChurnError::IntegrityFailure(format!(
                "schema hash mismatch: stored {}, computed {}",
                repr.hash, schema.hash
            )));
        }
        Ok(schema)
    }
}

impl EncodedColumnSchema {
    /// Build a schema, rejecting empty, blank or duplicate column names
    pub fn new<S: Into<String>>(version: u32, columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(ChurnError::InvalidSchema("schema has no columns".to_string()));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if name.trim().is_empty() {
                return Err(ChurnError::InvalidSchema("blank column name".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ChurnError::InvalidSchema(format!("duplicate column {name}")));
            }
        }

        let hash = hash_canonical_hex(&columns)?;
        Ok(Self {
            version,
            columns,
            hash,
        })
    }

    /// The pre-encoded telco schema
    pub fn telco() -> Self {
        let columns: Vec<String> = TELCO_FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        let hash = hex::encode(blake3::hash(telco_names_json(&columns).as_bytes()).as_bytes());
        Self {
            version: SCHEMA_VERSION,
            columns,
            hash,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn is_compatible_with(&self, other: &EncodedColumnSchema) -> bool {
        self.hash == other.hash
    }

    /// Check an incoming header against this schema, name by name
    pub fn check_header<S: AsRef<str>>(&self, header: &[S]) -> Result<()> {
        if header.len() != self.columns.len() {
            return Err(ChurnError::SchemaMismatch {
                expected: self.columns.len(),
                actual: header.len(),
            });
        }
        for (expected, actual) in self.columns.iter().zip(header) {
            if expected != actual.as_ref() {
                return Err(ChurnError::InvalidSchema(format!(
                    "expected column {expected}, found {}",
                    actual.as_ref()
                )));
            }
        }
        Ok(())
    }
}

// Canonical JSON of a string array is its compact serde_json form; serializing
// strings cannot fail.
fn telco_names_json(columns: &[String]) -> String {
    let quoted: Vec<String> = columns
        .iter()
        .map(|c| serde_json::Value::String(c.clone()).to_string())
        .collect();
    format!("[{}]", quoted.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telco_schema_shape() {
        let schema = EncodedColumnSchema::telco();
        assert_eq!(schema.len(), 37);
        assert_eq!(schema.columns()[0], "Partner");
        assert_eq!(schema.columns()[36], "TotalCharges");
        assert_eq!(schema.position("tenure"), Some(34));
    }

    #[test]
    fn test_telco_hash_matches_generic_constructor() {
        let generic = EncodedColumnSchema::new(SCHEMA_VERSION, TELCO_FEATURE_COLUMNS).unwrap();
        assert_eq!(generic, EncodedColumnSchema::telco());
    }

    #[test]
    fn test_hash_stable_and_order_sensitive() {
        let a = EncodedColumnSchema::new(1, ["A", "B", "C"]).unwrap();
        let b = EncodedColumnSchema::new(1, ["A", "B", "C"]).unwrap();
        let c = EncodedColumnSchema::new(1, ["B", "A", "C"]).unwrap();

        assert_eq!(a.hash(), b.hash());
        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
    }

    #[test]
    fn test_version_does_not_change_hash() {
        let v1 = EncodedColumnSchema::new(1, ["A", "B"]).unwrap();
        let v2 = EncodedColumnSchema::new(2, ["A", "B"]).unwrap();
        assert!(v1.is_compatible_with(&v2));
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert!(EncodedColumnSchema::new(1, Vec::<String>::new()).is_err());
        assert!(EncodedColumnSchema::new(1, ["A", ""]).is_err());
        assert!(matches!(
            EncodedColumnSchema::new(1, ["A", "B", "A"]),
            Err(ChurnError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_deserialize_verifies_hash() {
        let schema = EncodedColumnSchema::new(1, ["A", "B"]).unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        let back: EncodedColumnSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);

        let tampered = json.replace("\"B\"", "\"C\"");
        assert!(serde_json::from_str::<EncodedColumnSchema>(&tampered).is_err());
    }

    #[test]
    fn test_check_header() {
        let schema = EncodedColumnSchema::new(1, ["A", "B"]).unwrap();
        assert!(schema.check_header(&["A", "B"]).is_ok());
        assert!(matches!(
            schema.check_header(&["A"]),
            Err(ChurnError::SchemaMismatch { expected: 2, actual: 1 })
        ));
        assert!(schema.check_header(&["B", "A"]).is_err());
    }
}
