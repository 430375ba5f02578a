use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{ArtifactError, Classifier, ColumnLayout, Scaler, read_artifact};

/// Where the three training artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub columns: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("rf_model.toml"),
            scaler: PathBuf::from("scaler.toml"),
            columns: PathBuf::from("columns_to_use.toml"),
        }
    }
}

/// The read-only context every prediction runs against.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    classifier: Classifier,
    scaler: Scaler,
    layout: ColumnLayout,
}

impl ArtifactStore {
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let classifier: Classifier = read_artifact(&paths.model)?;
        let scaler: Scaler = read_artifact(&paths.scaler)?;
        let layout = ColumnLayout::load(&paths.columns)?;
        Self::from_parts(classifier, scaler, layout)
    }

    /// Assembles a store from already-parsed artifacts, enforcing that all three agree
    /// on the feature count.
    pub fn from_parts(
        classifier: Classifier,
        scaler: Scaler,
        layout: ColumnLayout,
    ) -> Result<Self, ArtifactError> {
        classifier.validate()?;
        scaler.validate()?;

        let expected = layout.len();
        if scaler.n_features() != expected {
            return Err(ArtifactError::FeatureCountMismatch {
                artifact: "scaler",
                found: scaler.n_features(),
                expected,
            });
        }
        if classifier.n_features() != expected {
            return Err(ArtifactError::FeatureCountMismatch {
                artifact: "classifier",
                found: classifier.n_features(),
                expected,
            });
        }

        Ok(Self {
            classifier,
            scaler,
            layout,
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }
}
