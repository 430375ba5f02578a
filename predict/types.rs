// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// This file is ONLY for types that are SHARED BETWEEN FILES, not types that only are used in one file.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, ArrayView1};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::artifacts::ColumnLayout;

/// One screening request, exactly as the front end posts it.
///
/// Field names follow the column names used at training time, which is why they are
/// upper case on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "BRCA")]
    pub brca: Vec<String>,
    #[serde(rename = "BMI_GROUP")]
    pub body: BodyMeasurements,
    #[serde(rename = "AGE_GROUP", deserialize_with = "deserialize_whole_number")]
    pub age: i64,
    #[serde(rename = "PROVINCE_GROUP")]
    pub province: Vec<String>,
    #[serde(rename = "GENDER_N")]
    pub gender: String,
}

/// Weight in kilograms and height in centimeters. A missing key reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "MeasurementMap")]
pub struct BodyMeasurements {
    pub weight: f64,
    pub height: f64,
}

/// The `BMI_GROUP` object as sent. Keys other than weight and height are ignored, but
/// they must still hold numbers.
#[derive(Deserialize)]
struct MeasurementMap {
    #[serde(default)]
    weight: f64,
    #[serde(default)]
    height: f64,
    #[serde(flatten)]
    _other: BTreeMap<String, f64>,
}

impl From<MeasurementMap> for BodyMeasurements {
    fn from(map: MeasurementMap) -> Self {
        Self {
            weight: map.weight,
            height: map.height,
        }
    }
}

/// Reads a whole number written either as an integer (`45`) or as an integral float
/// (`45.0`). Fractions and non-numbers are rejected.
pub(crate) fn deserialize_whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WholeNumber {
        Int(i64),
        Float(f64),
    }

    let number = match WholeNumber::deserialize(deserializer) {
        Ok(number) => number,
        Err(_) => return Err(de::Error::custom("expected a whole number")),
    };
    match number {
        WholeNumber::Int(n) => Ok(n),
        WholeNumber::Float(x)
            if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 =>
        {
            Ok(x as i64)
        }
        WholeNumber::Float(x) => Err(de::Error::custom(format!(
            "expected a whole number, found {x}"
        ))),
    }
}

/// The only two answers the service ever gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionLabel {
    #[serde(rename = "At risk of cancer")]
    AtRisk,
    #[serde(rename = "Healthy")]
    Healthy,
}

impl PredictionLabel {
    /// Maps the classifier's raw class label. Only class `1` means at risk.
    pub fn from_class(class: i64) -> Self {
        if class == 1 {
            Self::AtRisk
        } else {
            Self::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtRisk => "At risk of cancer",
            Self::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: PredictionLabel,
}

/// A single feature row aligned to the column layout it was built against.
///
/// The row keeps a borrow of its layout, so a row can never be handed to a scaler or
/// classifier that was loaded alongside a different column list.
#[derive(Debug, Clone)]
pub struct EncodedFeatureRow<'a> {
    layout: &'a ColumnLayout,
    values: Array1<f64>,
}

impl<'a> EncodedFeatureRow<'a> {
    pub(crate) fn new(layout: &'a ColumnLayout, values: Array1<f64>) -> Self {
        debug_assert_eq!(layout.len(), values.len());
        Self { layout, values }
    }

    pub fn layout(&self) -> &'a ColumnLayout {
        self.layout
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column, or `None` when the layout has no such column.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.layout.position(column).map(|idx| self.values[idx])
    }

    /// Columns paired with their values, in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + '_ {
        self.layout
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}
