//! Categorical and numeric column encoding
//!
//! Turns raw customer records into numeric columns with a fixed, reproducible
//! naming scheme:
//! - one-hot: one column per vocabulary entry, named `"{attribute}_{value}"`,
//!   vocabulary in first-seen order
//! - label: a single column `"{attribute}_enc"` holding dense codes `0..k-1`
//!   assigned by ascending value
//! - numeric: the raw value passed through under the attribute's own name
//!
//! [`one_hot`] and [`label_encode`] fit and transform in one step. Serving
//! code must instead reuse a [`FeatureEncoder`] fitted at training time, whose
//! vocabularies never grow on transform.

use crate::errors::{ChurnError, Result};
use crate::record::{RawRecord, RawValue};
use crate::schema::EncodedColumnSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Code written for an unseen category by the label encoder under
/// [`UnknownCategoryPolicy::Ignore`].
pub const UNKNOWN_LABEL_CODE: f64 = -1.0;

/// What to do with a categorical value missing from the fitted vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Fail with `UnseenCategory`
    #[default]
    Reject,
    /// One-hot: all-zero row. Label: [`UNKNOWN_LABEL_CODE`].
    Ignore,
}

impl FromStr for UnknownCategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown category policy: {other}")),
        }
    }
}

impl fmt::Display for UnknownCategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reject => "reject",
            Self::Ignore => "ignore",
        })
    }
}

/// Ordered set of distinct values of one categorical attribute, fixed at fit time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    attribute: String,
    values: Vec<String>,
}

impl CategoryVocabulary {
    /// Vocabulary in order of first appearance
    pub fn first_seen<'a, I>(attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = &'a RawValue>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for value in values {
            let key = value.category_key();
            if seen.insert(key.clone()) {
                ordered.push(key);
            }
        }

        Self {
            attribute: attribute.to_string(),
            values: ordered,
        }
    }

    /// Vocabulary in ascending value order: numbers numerically, then strings
    /// lexicographically.
    pub fn sorted<'a, I>(attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = &'a RawValue>,
    {
        let mut seen = HashSet::new();
        let mut distinct: Vec<&RawValue> = Vec::new();
        for value in values {
            if seen.insert(value.category_key()) {
                distinct.push(value);
            }
        }
        distinct.sort_by(|a, b| compare_raw(a, b));

        Self {
            attribute: attribute.to_string(),
            values: distinct.into_iter().map(RawValue::category_key).collect(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index_of(&self, value: &RawValue) -> Option<usize> {
        let key = value.category_key();
        self.values.iter().position(|v| *v == key)
    }

    /// One-hot output column names, `"{attribute}_{value}"`
    pub fn one_hot_names(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|value| format!("{}_{}", self.attribute, value))
            .collect()
    }

    /// Label-encoded output column name, `"{attribute}_enc"`
    pub fn label_name(&self) -> String {
        format!("{}_enc", self.attribute)
    }

    fn unseen(&self, value: &RawValue) -> ChurnError {
        ChurnError::UnseenCategory {
            attribute: self.attribute.clone(),
            value: value.category_key(),
        }
    }

    /// Expand values into one indicator column per vocabulary entry
    pub fn encode_one_hot(
        &self,
        values: &[&RawValue],
        policy: UnknownCategoryPolicy,
    ) -> Result<Vec<EncodedColumn>> {
        let mut columns: Vec<EncodedColumn> = self
            .one_hot_names()
            .into_iter()
            .map(|name| EncodedColumn::new(name, vec![0.0; values.len()]))
            .collect();

        for (row, value) in values.iter().enumerate() {
            match self.index_of(value) {
                Some(idx) => columns[idx].values[row] = 1.0,
                None => match policy {
                    UnknownCategoryPolicy::Reject => return Err(self.unseen(value)),
                    UnknownCategoryPolicy::Ignore => {
                        debug!(attribute = %self.attribute, value = %value.category_key(), "unseen category encoded as all-zero row");
                    }
                },
            }
        }

        Ok(columns)
    }

    /// Replace values with their integer codes
    pub fn encode_label(
        &self,
        values: &[&RawValue],
        policy: UnknownCategoryPolicy,
    ) -> Result<EncodedColumn> {
        let codes = values
            .iter()
            .map(|value| match self.index_of(value) {
                Some(idx) => Ok(idx as f64),
                None => match policy {
                    UnknownCategoryPolicy::Reject => Err(self.unseen(value)),
                    UnknownCategoryPolicy::Ignore => Ok(UNKNOWN_LABEL_CODE),
                },
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(EncodedColumn::new(self.label_name(), codes))
    }
}

/// Numeric text orders as its number, matching [`RawValue::category_key`]
fn compare_raw(a: &RawValue, b: &RawValue) -> Ordering {
    let normalize = |value: &RawValue| match value {
        RawValue::Categorical(text) => RawValue::from_cell(text),
        numeric => numeric.clone(),
    };
    match (&normalize(a), &normalize(b)) {
        (RawValue::Numeric(x), RawValue::Numeric(y)) => x.total_cmp(y),
        (RawValue::Numeric(_), RawValue::Categorical(_)) => Ordering::Less,
        (RawValue::Categorical(_), RawValue::Numeric(_)) => Ordering::Greater,
        (RawValue::Categorical(x), RawValue::Categorical(y)) => x.cmp(y),
    }
}

/// A named numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl EncodedColumn {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Column-major numeric table produced by the encoders
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrame {
    rows: usize,
    columns: Vec<EncodedColumn>,
}

impl EncodedFrame {
    /// Empty frame with a fixed row count
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    pub fn from_columns(rows: usize, columns: Vec<EncodedColumn>) -> Result<Self> {
        let mut frame = Self::new(rows);
        for column in columns {
            frame.push_column(column)?;
        }
        Ok(frame)
    }

    pub fn push_column(&mut self, column: EncodedColumn) -> Result<()> {
        if column.values.len() != self.rows {
            return Err(ChurnError::SchemaMismatch {
                expected: self.rows,
                actual: column.values.len(),
            });
        }
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(ChurnError::InvalidSchema(format!(
                "duplicate encoded column {}",
                column.name
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Append all columns of `other` after the columns of `self`
    pub fn concat(mut self, other: EncodedFrame) -> Result<Self> {
        if other.rows != self.rows {
            return Err(ChurnError::SchemaMismatch {
                expected: self.rows,
                actual: other.rows,
            });
        }
        for column in other.columns {
            self.push_column(column)?;
        }
        Ok(self)
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&EncodedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row(&self, idx: usize) -> Option<Vec<f64>> {
        (idx < self.rows).then(|| self.columns.iter().map(|c| c.values[idx]).collect())
    }

    /// Row-major copy of the frame
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows)
            .map(|idx| self.columns.iter().map(|c| c.values[idx]).collect())
            .collect()
    }

    /// One row as a name → value mapping, ready for alignment
    pub fn row_map(&self, idx: usize) -> Option<BTreeMap<String, RawValue>> {
        (idx < self.rows).then(|| {
            self.columns
                .iter()
                .map(|c| (c.name.clone(), RawValue::Numeric(c.values[idx])))
                .collect()
        })
    }
}

fn collect_values<'a>(attribute: &str, records: &'a [RawRecord]) -> Result<Vec<&'a RawValue>> {
    records.iter().map(|r| r.require(attribute)).collect()
}

/// One-hot encode `attribute` across `records`.
///
/// The vocabulary is built from the values present, in order of first
/// appearance. Empty `records` is a configuration error.
pub fn one_hot(attribute: &str, records: &[RawRecord]) -> Result<(CategoryVocabulary, EncodedFrame)> {
    if records.is_empty() {
        return Err(ChurnError::EmptyInput(format!(
            "cannot one-hot encode {attribute}: no records"
        )));
    }

    let values = collect_values(attribute, records)?;
    let vocabulary = CategoryVocabulary::first_seen(attribute, values.iter().copied());
    let columns = vocabulary.encode_one_hot(&values, UnknownCategoryPolicy::Reject)?;
    let frame = EncodedFrame::from_columns(records.len(), columns)?;

    Ok((vocabulary, frame))
}

/// Label encode `attribute` across `records` into a single `"{attribute}_enc"`
/// column with dense codes assigned by ascending value.
pub fn label_encode(attribute: &str, records: &[RawRecord]) -> Result<(CategoryVocabulary, EncodedColumn)> {
    if records.is_empty() {
        return Err(ChurnError::EmptyInput(format!(
            "cannot label encode {attribute}: no records"
        )));
    }

    let values = collect_values(attribute, records)?;
    let vocabulary = CategoryVocabulary::sorted(attribute, values.iter().copied());
    let column = vocabulary.encode_label(&values, UnknownCategoryPolicy::Reject)?;

    Ok((vocabulary, column))
}

/// Encoding applied to one raw attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStrategy {
    OneHot,
    Label,
    Numeric,
}

/// Ordered list of attributes and how each one is encoded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingPlan {
    columns: Vec<(String, ColumnStrategy)>,
}

impl EncodingPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan over `columns` in their given order: names listed in `one_hot` or
    /// `label` get that strategy, every other column is numeric.
    pub fn for_columns<S: AsRef<str>>(columns: &[S], one_hot: &[S], label: &[S]) -> Result<Self> {
        let one_hot: HashSet<&str> = one_hot.iter().map(AsRef::as_ref).collect();
        let label: HashSet<&str> = label.iter().map(AsRef::as_ref).collect();

        if let Some(both) = one_hot.intersection(&label).next() {
            return Err(ChurnError::InvalidSchema(format!(
                "{both} is listed for both one-hot and label encoding"
            )));
        }
        let known: HashSet<&str> = columns.iter().map(AsRef::as_ref).collect();
        if let Some(missing) = one_hot.union(&label).find(|name| !known.contains(*name)) {
            return Err(ChurnError::MissingFeature(missing.to_string()));
        }

        let mut plan = Self::new();
        for column in columns {
            let name = column.as_ref();
            let strategy = if one_hot.contains(name) {
                ColumnStrategy::OneHot
            } else if label.contains(name) {
                ColumnStrategy::Label
            } else {
                ColumnStrategy::Numeric
            };
            plan.columns.push((name.to_string(), strategy));
        }
        Ok(plan)
    }

    pub fn one_hot(self, attribute: impl Into<String>) -> Self {
        self.with(attribute, ColumnStrategy::OneHot)
    }

    pub fn label(self, attribute: impl Into<String>) -> Self {
        self.with(attribute, ColumnStrategy::Label)
    }

    pub fn numeric(self, attribute: impl Into<String>) -> Self {
        self.with(attribute, ColumnStrategy::Numeric)
    }

    pub fn with(mut self, attribute: impl Into<String>, strategy: ColumnStrategy) -> Self {
        self.columns.push((attribute.into(), strategy));
        self
    }

    pub fn columns(&self) -> &[(String, ColumnStrategy)] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A single attribute's fitted encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FittedColumn {
    OneHot { vocabulary: CategoryVocabulary },
    Label { vocabulary: CategoryVocabulary },
    Numeric { attribute: String },
}

impl FittedColumn {
    pub fn attribute(&self) -> &str {
        match self {
            FittedColumn::OneHot { vocabulary } | FittedColumn::Label { vocabulary } => {
                vocabulary.attribute()
            }
            FittedColumn::Numeric { attribute } => attribute,
        }
    }

    pub fn output_names(&self) -> Vec<String> {
        match self {
            FittedColumn::OneHot { vocabulary } => vocabulary.one_hot_names(),
            FittedColumn::Label { vocabulary } => vec![vocabulary.label_name()],
            FittedColumn::Numeric { attribute } => vec![attribute.clone()],
        }
    }

    fn transform(&self, values: &[&RawValue], policy: UnknownCategoryPolicy) -> Result<Vec<EncodedColumn>> {
        match self {
            FittedColumn::OneHot { vocabulary } => vocabulary.encode_one_hot(values, policy),
            FittedColumn::Label { vocabulary } => {
                Ok(vec![vocabulary.encode_label(values, policy)?])
            }
            FittedColumn::Numeric { attribute } => {
                let numbers = values
                    .iter()
                    .map(|value| value.as_f64(attribute))
                    .collect::<Result<Vec<f64>>>()?;
                Ok(vec![EncodedColumn::new(attribute.clone(), numbers)])
            }
        }
    }
}

/// Encoder whose vocabularies were frozen at training time.
///
/// Persisted alongside the classifier; serving only ever calls
/// [`FeatureEncoder::transform`] / [`FeatureEncoder::encode_record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<FittedColumn>,
}

impl FeatureEncoder {
    /// Fit every attribute of `plan` on `records`, in plan order
    pub fn fit(plan: &EncodingPlan, records: &[RawRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(ChurnError::EmptyInput(
                "cannot fit feature encoder: no records".to_string(),
            ));
        }
        if plan.is_empty() {
            return Err(ChurnError::InvalidSchema(
                "encoding plan has no columns".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(plan.columns().len());
        for (attribute, strategy) in plan.columns() {
            let values = collect_values(attribute, records)?;
            let fitted = match strategy {
                ColumnStrategy::OneHot => FittedColumn::OneHot {
                    vocabulary: CategoryVocabulary::first_seen(attribute, values.iter().copied()),
                },
                ColumnStrategy::Label => FittedColumn::Label {
                    vocabulary: CategoryVocabulary::sorted(attribute, values.iter().copied()),
                },
                ColumnStrategy::Numeric => {
                    for value in &values {
                        value.as_f64(attribute)?;
                    }
                    FittedColumn::Numeric {
                        attribute: attribute.clone(),
                    }
                }
            };
            debug!(
                attribute = %attribute,
                outputs = fitted.output_names().len(),
                "fitted column encoding"
            );
            columns.push(fitted);
        }

        let encoder = Self { columns };
        encoder.validate()?;
        Ok(encoder)
    }

    /// Check that output names are unique and non-empty
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if let FittedColumn::OneHot { vocabulary } | FittedColumn::Label { vocabulary } = column {
                if vocabulary.is_empty() {
                    return Err(ChurnError::InvalidSchema(format!(
                        "empty vocabulary for {}",
                        vocabulary.attribute()
                    )));
                }
            }
            for name in column.output_names() {
                if !seen.insert(name.clone()) {
                    return Err(ChurnError::InvalidSchema(format!(
                        "duplicate encoded column {name}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> &[FittedColumn] {
        &self.columns
    }

    /// Ordered encoded column names
    pub fn output_names(&self) -> Vec<String> {
        self.columns.iter().flat_map(FittedColumn::output_names).collect()
    }

    /// Canonical schema described by this encoder
    pub fn schema(&self, version: u32) -> Result<EncodedColumnSchema> {
        EncodedColumnSchema::new(version, self.output_names())
    }

    /// Encode records with the frozen vocabularies
    pub fn transform(&self, records: &[RawRecord], policy: UnknownCategoryPolicy) -> Result<EncodedFrame> {
        let mut frame = EncodedFrame::new(records.len());
        for column in &self.columns {
            let values = collect_values(column.attribute(), records)?;
            for encoded in column.transform(&values, policy)? {
                frame.push_column(encoded)?;
            }
        }
        Ok(frame)
    }

    /// Encode a single request record
    pub fn encode_record(&self, record: &RawRecord, policy: UnknownCategoryPolicy) -> Result<EncodedFrame> {
        self.transform(std::slice::from_ref(record), policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract_records() -> Vec<RawRecord> {
        ["Month-to-month", "Two year", "Month-to-month"]
            .iter()
            .map(|value| RawRecord::new().with("Contract", *value))
            .collect()
    }

    #[test]
    fn test_one_hot_contract_scenario() {
        let (vocabulary, frame) = one_hot("Contract", &contract_records()).unwrap();

        assert_eq!(vocabulary.values(), &["Month-to-month", "Two year"]);
        assert_eq!(
            frame.column_names(),
            vec!["Contract_Month-to-month", "Contract_Two year"]
        );
        assert_eq!(
            frame.to_rows(),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]]
        );
    }

    #[test]
    fn test_one_hot_keeps_first_seen_order() {
        let records: Vec<RawRecord> = ["No", "Yes", "No internet service", "Yes"]
            .iter()
            .map(|v| RawRecord::new().with("TechSupport", *v))
            .collect();

        let (vocabulary, frame) = one_hot("TechSupport", &records).unwrap();
        assert_eq!(vocabulary.values(), &["No", "Yes", "No internet service"]);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 4);
    }

    #[test]
    fn test_one_hot_empty_records_is_error() {
        let err = one_hot("Contract", &[]).unwrap_err();
        assert!(matches!(err, ChurnError::EmptyInput(_)));
    }

    #[test]
    fn test_one_hot_missing_attribute() {
        let records = vec![RawRecord::new().with("tenure", 1i64)];
        assert!(matches!(
            one_hot("Contract", &records),
            Err(ChurnError::MissingFeature(_))
        ));
    }

    #[test]
    fn test_label_encode_sorted_dense_codes() {
        let records: Vec<RawRecord> = ["Male", "Female", "Male", "Female"]
            .iter()
            .map(|v| RawRecord::new().with("gender", *v))
            .collect();

        let (vocabulary, column) = label_encode("gender", &records).unwrap();
        assert_eq!(vocabulary.values(), &["Female", "Male"]);
        assert_eq!(column.name, "gender_enc");
        assert_eq!(column.values, vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_label_encode_numeric_values_sort_numerically() {
        let records: Vec<RawRecord> = [10i64, 2, 33, 2]
            .iter()
            .map(|v| RawRecord::new().with("tenure", *v))
            .collect();

        let (vocabulary, column) = label_encode("tenure", &records).unwrap();
        assert_eq!(vocabulary.values(), &["2", "10", "33"]);
        assert_eq!(column.values, vec![1.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_unseen_category_policies() {
        let (vocabulary, _) = one_hot("Contract", &contract_records()).unwrap();
        let unseen = RawValue::from("One year");

        let err = vocabulary
            .encode_one_hot(&[&unseen], UnknownCategoryPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, ChurnError::UnseenCategory { .. }));

        let columns = vocabulary
            .encode_one_hot(&[&unseen], UnknownCategoryPolicy::Ignore)
            .unwrap();
        assert!(columns.iter().all(|c| c.values == vec![0.0]));
        assert_eq!(vocabulary.len(), 2);

        let label = vocabulary
            .encode_label(&[&unseen], UnknownCategoryPolicy::Ignore)
            .unwrap();
        assert_eq!(label.values, vec![UNKNOWN_LABEL_CODE]);
    }

    #[test]
    fn test_feature_encoder_reuses_vocabulary() {
        let training: Vec<RawRecord> = vec![
            RawRecord::new().with("Contract", "Month-to-month").with("gender", "Male").with("tenure", 1i64),
            RawRecord::new().with("Contract", "Two year").with("gender", "Female").with("tenure", 60i64),
        ];
        let plan = EncodingPlan::new()
            .one_hot("Contract")
            .label("gender")
            .numeric("tenure");
        let encoder = FeatureEncoder::fit(&plan, &training).unwrap();

        assert_eq!(
            encoder.output_names(),
            vec!["Contract_Month-to-month", "Contract_Two year", "gender_enc", "tenure"]
        );

        // A single serving record only ever contains one category; the
        // encoder must still emit every training-time column.
        let request = RawRecord::new()
            .with("Contract", "Two year")
            .with("gender", "Male")
            .with("tenure", 12i64);
        let frame = encoder
            .encode_record(&request, UnknownCategoryPolicy::Reject)
            .unwrap();
        assert_eq!(frame.row(0).unwrap(), vec![0.0, 1.0, 1.0, 12.0]);
        assert_eq!(frame.column_names(), encoder.output_names());
    }

    #[test]
    fn test_numeric_text_matches_csv_vocabulary() {
        let training: Vec<RawRecord> = ["0", "1"]
            .iter()
            .map(|cell| RawRecord::new().with("SeniorCitizen", RawValue::from_cell(cell)))
            .collect();
        let plan = EncodingPlan::new().one_hot("SeniorCitizen");
        let encoder = FeatureEncoder::fit(&plan, &training).unwrap();
        assert_eq!(encoder.output_names(), vec!["SeniorCitizen_0", "SeniorCitizen_1"]);

        let request = RawRecord::new().with("SeniorCitizen", "1.0");
        let frame = encoder
            .encode_record(&request, UnknownCategoryPolicy::Reject)
            .unwrap();
        assert_eq!(frame.row(0).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_feature_encoder_numeric_type_mismatch() {
        let records = vec![RawRecord::new().with("TotalCharges", " ")];
        let plan = EncodingPlan::new().numeric("TotalCharges");
        assert!(matches!(
            FeatureEncoder::fit(&plan, &records),
            Err(ChurnError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_plan_for_columns() {
        let columns = ["gender", "tenure", "Contract"];
        let plan = EncodingPlan::for_columns(&columns, &["Contract"], &["gender"]).unwrap();
        assert_eq!(
            plan.columns(),
            &[
                ("gender".to_string(), ColumnStrategy::Label),
                ("tenure".to_string(), ColumnStrategy::Numeric),
                ("Contract".to_string(), ColumnStrategy::OneHot),
            ]
        );

        assert!(EncodingPlan::for_columns(&columns, &["Contract"], &["Contract"]).is_err());
        assert!(matches!(
            EncodingPlan::for_columns(&columns, &["PaymentMethod"], &[]),
            Err(ChurnError::MissingFeature(_))
        ));
    }

    #[test]
    fn test_frame_concat_checks_rows() {
        let left = EncodedFrame::from_columns(2, vec![EncodedColumn::new("a", vec![1.0, 2.0])]).unwrap();
        let right = EncodedFrame::from_columns(1, vec![EncodedColumn::new("b", vec![3.0])]).unwrap();
        assert!(left.clone().concat(right).is_err());

        let right = EncodedFrame::from_columns(2, vec![EncodedColumn::new("b", vec![3.0, 4.0])]).unwrap();
        let joined = left.concat(right).unwrap();
        assert_eq!(joined.to_rows(), vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }
}
