//! Persisted model artifact
//!
//! Bundles a classifier with the schema it was trained against and, when
//! trained from raw attributes, the fitted encoder that produced that schema.

use crate::align::{align, align_named, FeaturePayload, UnknownKeyPolicy};
use crate::encoding::{FeatureEncoder, UnknownCategoryPolicy};
use crate::errors::{ChurnError, Result};
use crate::model::{Classifier, ModelKind, TrainedClassifier};
use crate::record::RawRecord;
use crate::schema::EncodedColumnSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Evaluation figures recorded at training time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    /// Out-of-bag accuracy, random forest only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oob_accuracy: Option<f64>,
    pub train_rows: usize,
    pub test_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub key: String,
    pub kind: ModelKind,
    pub schema: EncodedColumnSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder: Option<FeatureEncoder>,
    pub classifier: TrainedClassifier,
    pub metrics: ModelMetrics,
    pub created_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn new(
        schema: EncodedColumnSchema,
        encoder: Option<FeatureEncoder>,
        classifier: TrainedClassifier,
        metrics: ModelMetrics,
    ) -> Result<Self> {
        let kind = classifier.kind();
        let artifact = Self {
            key: kind.as_key().to_string(),
            kind,
            schema,
            encoder,
            classifier,
            metrics,
            created_at: Utc::now(),
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Cross-check key, kind, schema width and encoder output names
    pub fn validate(&self) -> Result<()> {
        if self.classifier.kind() != self.kind || self.kind.as_key() != self.key {
            return Err(ChurnError::InvalidSchema(format!(
                "artifact key {} does not match classifier kind {}",
                self.key,
                self.classifier.kind()
            )));
        }

        self.classifier.validate()?;
        if self.classifier.feature_count() != self.schema.len() {
            return Err(ChurnError::SchemaMismatch {
                expected: self.schema.len(),
                actual: self.classifier.feature_count(),
            });
        }

        if let Some(encoder) = &self.encoder {
            encoder.validate()?;
            if encoder.output_names() != self.schema.columns() {
                return Err(ChurnError::InvalidSchema(
                    "encoder output does not match artifact schema".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Predict from an already-encoded payload
    pub fn predict_payload(&self, payload: &FeaturePayload, policy: UnknownKeyPolicy) -> Result<u8> {
        let row = align(payload, &self.schema, policy)?;
        self.classifier.predict_one(row.values())
    }

    /// Encode a raw record with the stored encoder, then predict
    pub fn predict_record(&self, record: &RawRecord, policy: UnknownCategoryPolicy) -> Result<u8> {
        let encoder = self.encoder.as_ref().ok_or_else(|| {
            ChurnError::PredictionFailure(format!(
                "model {} was trained on pre-encoded features and cannot encode raw records",
                self.key
            ))
        })?;

        let frame = encoder.encode_record(record, policy)?;
        let encoded = frame
            .row_map(0)
            .ok_or_else(|| ChurnError::EmptyInput("encoder produced no rows".to_string()))?;
        let row = align_named(&encoded, &self.schema, UnknownKeyPolicy::Reject)?;
        self.classifier.predict_one(row.values())
    }
}
