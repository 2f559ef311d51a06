//! Directory-backed model store
//!
//! Each artifact lives under its key as `{key}.json` (canonical JSON) with a
//! sibling `{key}.hash` holding the BLAKE3 hex digest of the JSON bytes.

use crate::artifact::ModelArtifact;
use crate::errors::{ChurnError, Result};
use crate::model::ModelKind;
use crate::serde_canon::{hash_bytes_hex, to_canonical_json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, kind: ModelKind) -> PathBuf {
        self.root.join(format!("{}.json", kind.as_key()))
    }

    pub fn hash_path(&self, kind: ModelKind) -> PathBuf {
        self.root.join(format!("{}.hash", kind.as_key()))
    }

    /// Persist an artifact under its key, returning the content hash
    pub fn save(&self, artifact: &ModelArtifact) -> Result<String> {
        artifact.validate()?;
        fs::create_dir_all(&self.root)?;

        let json = to_canonical_json(artifact)?;
        let hash = hash_bytes_hex(json.as_bytes());

        let artifact_path = self.artifact_path(artifact.kind);
        fs::write(&artifact_path, json.as_bytes())?;
        fs::write(self.hash_path(artifact.kind), &hash)?;

        info!(
            key = %artifact.key,
            path = %artifact_path.display(),
            hash = %hash,
            "saved model artifact"
        );
        Ok(hash)
    }

    /// Load and verify the artifact stored under `key`
    pub fn load(&self, key: &str) -> Result<ModelArtifact> {
        let kind: ModelKind = key.parse()?;
        let artifact_path = self.artifact_path(kind);
        if !artifact_path.is_file() {
            return Err(ChurnError::ModelNotFound(key.to_string()));
        }

        let bytes = fs::read(&artifact_path)?;
        let hash_path = self.hash_path(kind);
        let expected = fs::read_to_string(&hash_path).map_err(|e| {
            ChurnError::IntegrityFailure(format!("cannot read {}: {e}", hash_path.display()))
        })?;
        let actual = hash_bytes_hex(&bytes);
        if expected.trim() != actual {
            return Err(ChurnError::IntegrityFailure(format!(
                "artifact {key}: expected hash {}, computed {actual}",
                expected.trim()
            )));
        }

        // Schema hash is re-verified during deserialization.
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        if artifact.key != key {
            return Err(ChurnError::IntegrityFailure(format!(
                "file for key {key} holds artifact {}",
                artifact.key
            )));
        }
        artifact.validate()?;

        debug!(key, hash = %actual, features = artifact.schema.len(), "loaded model artifact");
        Ok(artifact)
    }

    /// Kinds with an artifact file present
    pub fn list(&self) -> Vec<ModelKind> {
        ModelKind::ALL
            .into_iter()
            .filter(|kind| self.artifact_path(*kind).is_file())
            .collect()
    }
}
