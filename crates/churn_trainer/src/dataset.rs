//! CSV dataset loading and splitting
//!
//! Reads a headed CSV with one row per customer. The target column holds
//! `Yes`/`No` (or `1`/`0`); every other kept column becomes an attribute of a
//! [`RawRecord`].

use crate::errors::{Result, TrainerError};
use churn_core::{RawRecord, RawValue};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Default target column of the telco churn dataset
pub const TARGET_COLUMN: &str = "Churn";

/// Identifier column dropped before encoding
pub const ID_COLUMN: &str = "customerID";

/// Labelled raw records
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    attributes: Vec<String>,
    records: Vec<RawRecord>,
    targets: Vec<u8>,
}

impl Dataset {
    pub fn new(attributes: Vec<String>, records: Vec<RawRecord>, targets: Vec<u8>) -> Result<Self> {
        if records.len() != targets.len() {
            return Err(TrainerError::Dataset(format!(
                "{} records but {} targets",
                records.len(),
                targets.len()
            )));
        }
        Ok(Self {
            attributes,
            records,
            targets,
        })
    }

    /// Load from a CSV file, dropping `drop` columns
    pub fn from_csv<P: AsRef<Path>>(path: P, target: &str, drop: &[String]) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;
        Self::read(reader, target, drop)
    }

    pub fn from_reader<R: Read>(input: R, target: &str, drop: &[String]) -> Result<Self> {
        let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
        Self::read(reader, target, drop)
    }

    fn read<R: Read>(mut reader: csv::Reader<R>, target: &str, drop: &[String]) -> Result<Self> {
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let target_idx = header
            .iter()
            .position(|h| h == target)
            .ok_or_else(|| TrainerError::Dataset(format!("target column {target} not found")))?;

        let dropped: HashSet<&str> = drop.iter().map(String::as_str).collect();
        let kept: Vec<usize> = (0..header.len())
            .filter(|&i| i != target_idx && !dropped.contains(header[i].as_str()))
            .collect();
        let attributes: Vec<String> = kept.iter().map(|&i| header[i].clone()).collect();

        let mut records = Vec::new();
        let mut targets = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = row?;
            let label = row.get(target_idx).unwrap_or_default();
            let label = parse_label(label).ok_or_else(|| {
                TrainerError::Dataset(format!("row {}: invalid target value {label:?}", line + 2))
            })?;

            let record: RawRecord = kept
                .iter()
                .map(|&i| (header[i].clone(), RawValue::from_cell(row.get(i).unwrap_or_default())))
                .collect();
            records.push(record);
            targets.push(label);
        }

        if records.is_empty() {
            return Err(TrainerError::Dataset("dataset is empty".to_string()));
        }
        debug!(rows = records.len(), attributes = attributes.len(), "loaded dataset");

        Self::new(attributes, records, targets)
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn targets(&self) -> &[u8] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn positive_rate(&self) -> f64 {
        if self.targets.is_empty() {
            return 0.0;
        }
        self.targets.iter().map(|&t| t as f64).sum::<f64>() / self.targets.len() as f64
    }

    /// Whether every value of `attribute` parses as a number
    pub fn is_numeric(&self, attribute: &str) -> bool {
        self.records
            .iter()
            .all(|r| r.get(attribute).map_or(false, |v| v.as_f64(attribute).is_ok()))
    }

    /// Number of distinct values of `attribute`
    pub fn cardinality(&self, attribute: &str) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.get(attribute))
            .map(RawValue::category_key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Drop rows where any of `attributes` is not a finite number.
    ///
    /// The telco export leaves `TotalCharges` blank for brand-new customers.
    pub fn drop_non_numeric(&mut self, attributes: &[&str]) -> usize {
        let before = self.records.len();
        let keep: Vec<bool> = self
            .records
            .iter()
            .map(|r| {
                attributes.iter().all(|a| match r.get(a) {
                    Some(v) => v.as_f64(a).is_ok(),
                    None => true,
                })
            })
            .collect();

        let mut flags = keep.iter();
        self.records.retain(|_| *flags.next().unwrap_or(&true));
        let mut flags = keep.iter();
        self.targets.retain(|_| *flags.next().unwrap_or(&true));

        let dropped = before - self.records.len();
        if dropped > 0 {
            warn!(dropped, ?attributes, "dropped rows with non-numeric values");
        }
        dropped
    }

    /// Shuffle rows with a seeded RNG
    pub fn shuffle(&mut self, seed: u64) {
        let order = shuffled_indices(self.len(), seed);
        *self = self.subset(&order);
    }

    /// Seeded train/test partition; `test_size` is the held-out fraction
    pub fn split(&self, test_size: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(TrainerError::Dataset(format!(
                "test size must be in (0, 1), got {test_size}"
            )));
        }
        if self.len() < 2 {
            return Err(TrainerError::Dataset(
                "need at least two rows to split".to_string(),
            ));
        }

        let n_test = ((self.len() as f64) * test_size).ceil() as usize;
        let n_test = n_test.clamp(1, self.len() - 1);
        let order = shuffled_indices(self.len(), seed);
        let (test_idx, train_idx) = order.split_at(n_test);

        Ok((self.subset(train_idx), self.subset(test_idx)))
    }

    fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            attributes: self.attributes.clone(),
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }
}

fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);
    order
}

/// Parse a churn label: `Yes`/`No`, `True`/`False` or a 0/1 number
pub fn parse_label(value: &str) -> Option<u8> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "true" | "1" => Some(1),
        "no" | "false" | "0" => Some(0),
        other => match other.parse::<f64>() {
            Ok(v) if v == 1.0 => Some(1),
            Ok(v) if v == 0.0 => Some(0),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
customerID,gender,SeniorCitizen,tenure,Contract,TotalCharges,Churn
7590-VHVEG,Female,0,1,Month-to-month,29.85,No
5575-GNVDE,Male,0,34,One year,1889.5,No
3668-QPYBK,Male,0,2,Month-to-month,108.15,Yes
7795-CFOCW,Male,0,45,One year,1840.75,No
9237-HQITU,Female,0,2,Month-to-month,151.65,Yes
4472-LVYGI,Female,0,0,Two year, ,No
";

    fn load() -> Dataset {
        Dataset::from_reader(CSV.as_bytes(), TARGET_COLUMN, &[ID_COLUMN.to_string()]).unwrap()
    }

    #[test]
    fn test_load_csv() {
        let dataset = load();
        assert_eq!(dataset.len(), 6);
        assert_eq!(
            dataset.attributes(),
            &["gender", "SeniorCitizen", "tenure", "Contract", "TotalCharges"]
        );
        assert_eq!(dataset.targets(), &[0, 0, 1, 0, 1, 0]);
        assert_eq!(
            dataset.records()[0].get("Contract"),
            Some(&RawValue::from("Month-to-month"))
        );
        assert_eq!(dataset.records()[1].get("tenure"), Some(&RawValue::Numeric(34.0)));
        assert!(dataset.records()[0].get(ID_COLUMN).is_none());
    }

    #[test]
    fn test_missing_target_column() {
        let err = Dataset::from_reader(CSV.as_bytes(), "Exited", &[]).unwrap_err();
        assert!(matches!(err, TrainerError::Dataset(_)));
    }

    #[test]
    fn test_invalid_label() {
        let csv = "tenure,Churn\n1,Maybe\n";
        assert!(Dataset::from_reader(csv.as_bytes(), TARGET_COLUMN, &[]).is_err());
    }

    #[test]
    fn test_drop_non_numeric() {
        let mut dataset = load();
        assert!(!dataset.is_numeric("TotalCharges"));

        assert_eq!(dataset.drop_non_numeric(&["TotalCharges"]), 1);
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.targets().len(), 5);
        assert!(dataset.is_numeric("TotalCharges"));
        assert!(!dataset.is_numeric("Contract"));
        assert_eq!(dataset.cardinality("Contract"), 2);
    }

    #[test]
    fn test_split_is_deterministic() {
        let dataset = load();
        let (train_a, test_a) = dataset.split(0.3, 1).unwrap();
        let (train_b, test_b) = dataset.split(0.3, 1).unwrap();

        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(test_a.len(), 2);
        assert_eq!(train_a.len() + test_a.len(), dataset.len());
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let dataset = load();
        assert!(dataset.split(0.0, 1).is_err());
        assert!(dataset.split(1.0, 1).is_err());
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("Yes"), Some(1));
        assert_eq!(parse_label(" no "), Some(0));
        assert_eq!(parse_label("1.0"), Some(1));
        assert_eq!(parse_label("2"), None);
    }
}
