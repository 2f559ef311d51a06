//! Schema alignment
//!
//! Reindexes an incoming feature payload onto the canonical column order of an
//! [`EncodedColumnSchema`]. Positional payloads must match the schema length
//! exactly; named payloads must supply every schema column.

use crate::errors::{ChurnError, Result};
use crate::record::RawValue;
use crate::schema::EncodedColumnSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Request body accepted by the aligner: an ordered list of values or a
/// mapping from encoded column name to value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeaturePayload {
    Positional(Vec<RawValue>),
    Named(BTreeMap<String, RawValue>),
}

impl FeaturePayload {
    pub fn len(&self) -> usize {
        match self {
            FeaturePayload::Positional(values) => values.len(),
            FeaturePayload::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<f64>> for FeaturePayload {
    fn from(values: Vec<f64>) -> Self {
        FeaturePayload::Positional(values.into_iter().map(RawValue::Numeric).collect())
    }
}

/// What to do with named keys the schema does not list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeyPolicy {
    /// Drop them and log at debug level
    #[default]
    Ignore,
    /// Fail with `UnexpectedFeature`
    Reject,
}

impl FromStr for UnknownKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown key policy: {other}")),
        }
    }
}

impl fmt::Display for UnknownKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ignore => "ignore",
            Self::Reject => "reject",
        })
    }
}

/// One numeric row aligned 1:1 with a schema
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow<'a> {
    schema: &'a EncodedColumnSchema,
    values: Vec<f64>,
}

impl<'a> EncodedRow<'a> {
    pub fn schema(&self) -> &'a EncodedColumnSchema {
        self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|idx| self.values[idx])
    }

    /// `(column name, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Align a payload onto `schema`
pub fn align<'a>(
    payload: &FeaturePayload,
    schema: &'a EncodedColumnSchema,
    policy: UnknownKeyPolicy,
) -> Result<EncodedRow<'a>> {
    match payload {
        FeaturePayload::Positional(values) => align_positional(values, schema),
        FeaturePayload::Named(values) => align_named(values, schema, policy),
    }
}

/// Zip an ordered list of values to the schema's names
pub fn align_positional<'a>(values: &[RawValue], schema: &'a EncodedColumnSchema) -> Result<EncodedRow<'a>> {
    if values.len() != schema.len() {
        return Err(ChurnError::SchemaMismatch {
            expected: schema.len(),
            actual: values.len(),
        });
    }

    let values = schema
        .columns()
        .iter()
        .zip(values)
        .map(|(name, value)| value.as_f64(name))
        .collect::<Result<Vec<f64>>>()?;

    Ok(EncodedRow { schema, values })
}

/// Reorder a named mapping into schema order
pub fn align_named<'a>(
    values: &BTreeMap<String, RawValue>,
    schema: &'a EncodedColumnSchema,
    policy: UnknownKeyPolicy,
) -> Result<EncodedRow<'a>> {
    let aligned = schema
        .columns()
        .iter()
        .map(|name| {
            values
                .get(name)
                .ok_or_else(|| ChurnError::MissingFeature(name.clone()))?
                .as_f64(name)
        })
        .collect::<Result<Vec<f64>>>()?;

    let extra: Vec<&str> = values
        .keys()
        .filter(|k| !schema.contains(k))
        .map(String::as_str)
        .collect();
    if !extra.is_empty() {
        match policy {
            UnknownKeyPolicy::Reject => {
                return Err(ChurnError::UnexpectedFeature(extra.join(", ")));
            }
            UnknownKeyPolicy::Ignore => {
                debug!(keys = ?extra, "ignoring features not in schema");
            }
        }
    }

    Ok(EncodedRow {
        schema,
        values: aligned,
    })
}
