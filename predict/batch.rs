//! # Batch Scoring
//!
//! Scores a tab-separated file of patients through the same [`PredictionService`] the
//! HTTP endpoint uses. Each row carries the request fields flattened into columns:
//!
//! `sample_id` (optional), `BRCA`, `weight`, `height`, `AGE_GROUP`, `PROVINCE_GROUP`,
//! `GENDER_N`
//!
//! The output has one `sample_id`/`prediction` line per input row, in input order. When
//! the input has no `sample_id` column, 1-based row numbers are used instead.

use std::fs::File;
use std::io;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service::{PredictionError, PredictionService};
use crate::types::{
    BodyMeasurements, PredictionLabel, PredictionRequest, deserialize_whole_number,
};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Error reading or writing TSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: {source}")]
    Prediction {
        row: usize,
        #[source]
        source: PredictionError,
    },
}

/// One input line, with the request fields flattened into columns.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientRecord {
    #[serde(default)]
    pub sample_id: Option<String>,
    #[serde(rename = "BRCA")]
    pub brca: String,
    pub weight: f64,
    pub height: f64,
    #[serde(rename = "AGE_GROUP", deserialize_with = "deserialize_whole_number")]
    pub age: i64,
    #[serde(rename = "PROVINCE_GROUP")]
    pub province: String,
    #[serde(rename = "GENDER_N")]
    pub gender: String,
}

impl PatientRecord {
    pub fn to_request(&self) -> PredictionRequest {
        PredictionRequest {
            brca: vec![self.brca.clone()],
            body: BodyMeasurements {
                weight: self.weight,
                height: self.height,
            },
            age: self.age,
            province: vec![self.province.clone()],
            gender: self.gender.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredRecord {
    pub sample_id: String,
    pub prediction: PredictionLabel,
}

/// Reads every record from a TSV. Fails on the first malformed row.
pub fn read_records(path: &Path) -> Result<Vec<PatientRecord>, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(File::open(path)?);
    let records = reader
        .deserialize()
        .collect::<Result<Vec<PatientRecord>, csv::Error>>()?;
    Ok(records)
}

/// Scores all records in parallel, preserving input order. When several rows fail,
/// the lowest row number is reported.
pub fn score_records(
    service: &PredictionService,
    records: &[PatientRecord],
) -> Result<Vec<ScoredRecord>, BatchError> {
    let outcomes: Vec<Result<ScoredRecord, BatchError>> = records
        .par_iter()
        .enumerate()
        .map(|(idx, record)| {
            let row = idx + 1;
            let prediction = service
                .predict(&record.to_request())
                .map_err(|source| BatchError::Prediction { row, source })?;
            let sample_id = record
                .sample_id
                .clone()
                .unwrap_or_else(|| row.to_string());
            Ok(ScoredRecord {
                sample_id,
                prediction,
            })
        })
        .collect();
    outcomes.into_iter().collect()
}

pub fn write_predictions(path: &Path, scored: &[ScoredRecord]) -> Result<(), BatchError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    for record in scored {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads `input`, scores every row and writes the results to `output`. Returns the
/// number of rows scored.
pub fn score_tsv(
    service: &PredictionService,
    input: &Path,
    output: &Path,
) -> Result<usize, BatchError> {
    let records = read_records(input)?;
    let scored = score_records(service, &records)?;
    write_predictions(output, &scored)?;
    Ok(scored.len())
}
