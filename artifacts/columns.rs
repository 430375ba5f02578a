use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::{ArtifactError, read_artifact};

/// The encoded column order the scaler and classifier were fitted on.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

/// On-disk forms of the column list. TOML needs a table at the top level; JSON exports
/// are usually a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnListFile {
    Table { columns: Vec<String> },
    List(Vec<String>),
}

impl ColumnLayout {
    pub fn new(names: Vec<String>) -> Result<Self, ArtifactError> {
        if names.is_empty() {
            return Err(ArtifactError::EmptyColumns);
        }

        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), idx).is_some() {
                return Err(ArtifactError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self { names, positions })
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let names = match read_artifact::<ColumnListFile>(path)? {
            ColumnListFile::Table { columns } => columns,
            ColumnListFile::List(columns) => columns,
        };
        Self::new(names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
}
