//! # Artifact Store
//!
//! The three files produced by offline training: a fitted classifier, a fitted feature
//! scaler, and the ordered list of encoded column names the classifier was trained on.
//!
//! They are loaded once, checked against each other, and then only ever read. A row
//! encoded against one column list is meaningless to a scaler or classifier fitted on
//! another, so [`ArtifactStore::from_parts`] refuses any combination whose feature
//! counts disagree.
//!
//! Artifacts are TOML by default, the same human-readable format used for every model
//! file in this project. Files ending in `.json` are read as JSON instead, which is what
//! most export scripts emit.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod classifier;
pub mod columns;
pub mod scaler;
pub mod store;

pub use classifier::{
    Classifier, ClassifierError, DecisionTree, LogisticRegression, RandomForest, TreeNode,
};
pub use columns::ColumnLayout;
pub use scaler::{Scaler, ScalerError};
pub use store::{ArtifactPaths, ArtifactStore};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read artifact '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML artifact '{}': {source}", path.display())]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON artifact '{}': {source}", path.display())]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("The column list is empty.")]
    EmptyColumns,
    #[error("Column '{0}' appears more than once in the column list.")]
    DuplicateColumn(String),
    #[error("The {artifact} expects {found} features, but the column list has {expected}.")]
    FeatureCountMismatch {
        artifact: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("Invalid classifier: {0}")]
    InvalidClassifier(String),
    #[error("Invalid scaler: {0}")]
    InvalidScaler(String),
}

/// Reads one artifact file, choosing the parser from the file extension.
pub(crate) fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if is_json(path) {
        serde_json::from_str(&contents).map_err(|source| ArtifactError::JsonParse {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(&contents).map_err(|source| ArtifactError::TomlParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
