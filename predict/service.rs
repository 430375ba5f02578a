use thiserror::Error;

use crate::artifacts::{ArtifactStore, ClassifierError, ScalerError};
use crate::encode::{self, EncodeError};
use crate::types::{EncodedFeatureRow, PredictionLabel, PredictionRequest};

/// Any failure while turning a request into a label. Callers report it as-is; the kinds
/// exist for tests and messages, not for recovery.
#[derive(Error, Debug, PartialEq)]
pub enum PredictionError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Scale(#[from] ScalerError),
    #[error(transparent)]
    Classify(#[from] ClassifierError),
}

/// Encoder, scaler and classifier run back to back against one artifact store.
///
/// The service holds no mutable state, so a single instance can be shared by every
/// request handler and every batch worker.
#[derive(Debug, Clone)]
pub struct PredictionService {
    store: ArtifactStore,
}

impl PredictionService {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn encode(
        &self,
        request: &PredictionRequest,
    ) -> Result<EncodedFeatureRow<'_>, PredictionError> {
        Ok(encode::encode(request, self.store.layout())?)
    }

    pub fn predict_row(
        &self,
        row: &EncodedFeatureRow<'_>,
    ) -> Result<PredictionLabel, PredictionError> {
        let scaled = self.store.scaler().transform(row.values())?;
        let class = self.store.classifier().predict(scaled.view())?;
        Ok(PredictionLabel::from_class(class))
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionLabel, PredictionError> {
        let row = self.encode(request)?;
        self.predict_row(&row)
    }
}
