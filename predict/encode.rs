//! # Feature Encoder
//!
//! Turns one [`PredictionRequest`] into the numeric row the scaler and classifier were
//! fitted on. Encoding runs in two stages:
//!
//! 1. Field mapping. Each raw field is mapped onto the category code or number used in
//!    the training table (`"positive"` becomes `"2:P"`, a height and weight become a BMI
//!    band, a province becomes a region number). Every mapping is total: values outside
//!    the known vocabulary fall into an explicit "unknown" level.
//! 2. Expansion and reindexing. Categorical fields are one-hot expanded over their full
//!    vocabulary with the first (`0:`) level dropped as the baseline, numeric fields are
//!    passed through, and the result is aligned to the artifact column list. Columns
//!    the list does not know are dropped; columns the request did not produce are zero.

use ndarray::Array1;
use thiserror::Error;

use crate::artifacts::ColumnLayout;
use crate::types::{BodyMeasurements, EncodedFeatureRow, PredictionRequest};

pub const BRCA_FIELD: &str = "BRCA";
pub const BMI_FIELD: &str = "BMI_GROUP";
pub const AGE_FIELD: &str = "AGE_GROUP";
pub const PROVINCE_FIELD: &str = "PROVINCE_GROUP";
pub const GENDER_FIELD: &str = "GENDER_N";

/// Region assigned to provinces outside the lookup table.
pub const OTHER_REGION: u8 = 4;

/// Gender code for anything other than `"Male"` or `"Female"`.
pub const UNKNOWN_GENDER: i8 = -1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("BRCA must contain exactly one result, found {found}")]
    BrcaEntries { found: usize },
    #[error("PROVINCE_GROUP must contain at least one province")]
    EmptyProvince,
}

/// A categorical training column whose levels are expanded into indicator columns.
pub trait Categorical: Copy + PartialEq + 'static {
    /// Column name in the training table, also the prefix of every indicator column.
    const FIELD: &'static str;
    /// All levels in training order. The first one is the dropped baseline.
    const LEVELS: &'static [Self];

    fn code(self) -> &'static str;

    fn indicator_column(self) -> String {
        format!("{}_{}", Self::FIELD, self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrcaCode {
    Unknown,
    Negative,
    Positive,
}

impl BrcaCode {
    pub fn from_result(result: &str) -> Self {
        match result {
            "negative" => Self::Negative,
            "positive" => Self::Positive,
            _ => Self::Unknown,
        }
    }
}

impl Categorical for BrcaCode {
    const FIELD: &'static str = BRCA_FIELD;
    const LEVELS: &'static [Self] = &[Self::Unknown, Self::Negative, Self::Positive];

    fn code(self) -> &'static str {
        match self {
            Self::Unknown => "0:Unknown",
            Self::Negative => "1:N",
            Self::Positive => "2:P",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BmiBand {
    /// BMI of 99 or more, or not a number at all.
    OutOfRange,
    Under19,
    Under25,
    Under30,
    Under99,
}

impl BmiBand {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi <= 18.5 {
            Self::Under19
        } else if bmi <= 24.9 {
            Self::Under25
        } else if bmi <= 29.9 {
            Self::Under30
        } else if bmi < 99.0 {
            Self::Under99
        } else {
            Self::OutOfRange
        }
    }
}

impl Categorical for BmiBand {
    const FIELD: &'static str = BMI_FIELD;
    const LEVELS: &'static [Self] = &[
        Self::OutOfRange,
        Self::Under19,
        Self::Under25,
        Self::Under30,
        Self::Under99,
    ];

    fn code(self) -> &'static str {
        match self {
            Self::OutOfRange => "0:No",
            Self::Under19 => "1:<19",
            Self::Under25 => "2:<25",
            Self::Under30 => "3:<30",
            Self::Under99 => "4:<99",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBand {
    Unknown,
    Under30,
    Under40,
    Under50,
    Under99,
}

impl AgeBand {
    pub fn from_age(age: i64) -> Self {
        if age < 30 {
            Self::Under30
        } else if age <= 39 {
            Self::Under40
        } else if age <= 49 {
            Self::Under50
        } else if age < 99 {
            Self::Under99
        } else {
            Self::Unknown
        }
    }
}

impl Categorical for AgeBand {
    const FIELD: &'static str = AGE_FIELD;
    const LEVELS: &'static [Self] = &[
        Self::Unknown,
        Self::Under30,
        Self::Under40,
        Self::Under50,
        Self::Under99,
    ];

    fn code(self) -> &'static str {
        match self {
            Self::Unknown => "0:Unknown",
            Self::Under30 => "1:<30",
            Self::Under40 => "2:<40",
            Self::Under50 => "3:<50",
            Self::Under99 => "4:<99",
        }
    }
}

/// Weight over height squared, with height given in centimeters. A non-positive height
/// yields zero rather than dividing by it.
pub fn body_mass_index(body: &BodyMeasurements) -> f64 {
    let height_m = body.height / 100.0;
    if height_m > 0.0 {
        body.weight / height_m.powi(2)
    } else {
        0.0
    }
}

/// Southern-Thailand region number for a province name. `อื่นๆ` ("other") and every
/// province outside the table share region 4.
pub fn region_code(province: &str) -> u8 {
    match province {
        "ยะลา" | "ปัตตานี" | "นราธิวาส" => 1,
        "สงขลา" | "สตูล" => 2,
        "พังงา" | "พัทลุง" => 3,
        _ => OTHER_REGION,
    }
}

pub fn gender_code(gender: &str) -> i8 {
    match gender {
        "Male" => 0,
        "Female" => 1,
        _ => UNKNOWN_GENDER,
    }
}

/// The request after field mapping, before expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedFields {
    pub brca: BrcaCode,
    pub bmi: f64,
    pub bmi_band: BmiBand,
    pub age_band: AgeBand,
    pub region: u8,
    pub gender: i8,
}

impl EncodedFields {
    pub fn from_request(request: &PredictionRequest) -> Result<Self, EncodeError> {
        let brca = match request.brca.as_slice() {
            [result] => BrcaCode::from_result(result),
            other => return Err(EncodeError::BrcaEntries { found: other.len() }),
        };
        let province = request
            .province
            .first()
            .ok_or(EncodeError::EmptyProvince)?;
        let bmi = body_mass_index(&request.body);

        Ok(Self {
            brca,
            bmi,
            bmi_band: BmiBand::from_bmi(bmi),
            age_band: AgeBand::from_age(request.age),
            region: region_code(province),
            gender: gender_code(&request.gender),
        })
    }

    /// Every column this request produces on its own, before alignment.
    pub fn natural_columns(&self) -> Vec<(String, f64)> {
        let mut columns = Vec::new();
        push_indicators(self.brca, &mut columns);
        push_indicators(self.bmi_band, &mut columns);
        push_indicators(self.age_band, &mut columns);
        columns.push((PROVINCE_FIELD.to_string(), f64::from(self.region)));
        columns.push((GENDER_FIELD.to_string(), f64::from(self.gender)));
        columns
    }
}

/// One column per level of the field's vocabulary except the `0:` baseline. The
/// baseline is fixed by the vocabulary, not by which levels this row happens to hold.
fn push_indicators<C: Categorical>(value: C, columns: &mut Vec<(String, f64)>) {
    for &level in &C::LEVELS[1..] {
        let hot = if level == value { 1.0 } else { 0.0 };
        columns.push((level.indicator_column(), hot));
    }
}

/// Aligns named values to `layout`: unknown names are dropped, absent columns are zero.
pub fn reindex<'a>(natural: &[(String, f64)], layout: &'a ColumnLayout) -> EncodedFeatureRow<'a> {
    let mut values = Array1::zeros(layout.len());
    for (name, value) in natural {
        if let Some(idx) = layout.position(name) {
            values[idx] = *value;
        }
    }
    EncodedFeatureRow::new(layout, values)
}

pub fn encode<'a>(
    request: &PredictionRequest,
    layout: &'a ColumnLayout,
) -> Result<EncodedFeatureRow<'a>, EncodeError> {
    let fields = EncodedFields::from_request(request)?;
    Ok(reindex(&fields.natural_columns(), layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn request() -> PredictionRequest {
        PredictionRequest {
            brca: vec!["positive".to_string()],
            body: BodyMeasurements {
                weight: 70.0,
                height: 175.0,
            },
            age: 45,
            province: vec!["สงขลา".to_string()],
            gender: "Female".to_string(),
        }
    }

    fn full_layout() -> ColumnLayout {
        let mut names = vec![PROVINCE_FIELD.to_string(), GENDER_FIELD.to_string()];
        for level in &BrcaCode::LEVELS[1..] {
            names.push(level.indicator_column());
        }
        for level in &BmiBand::LEVELS[1..] {
            names.push(level.indicator_column());
        }
        for level in &AgeBand::LEVELS[1..] {
            names.push(level.indicator_column());
        }
        ColumnLayout::new(names).unwrap()
    }

    #[test]
    fn reference_request_maps_every_field() {
        let fields = EncodedFields::from_request(&request()).unwrap();
        assert_abs_diff_eq!(fields.bmi, 22.857142857142858, epsilon = 1e-9);
        assert_eq!(fields.bmi_band.code(), "2:<25");
        assert_eq!(fields.age_band.code(), "3:<50");
        assert_eq!(fields.gender, 1);
        assert_eq!(fields.region, 2);
        assert_eq!(fields.brca.code(), "2:P");
    }

    #[test]
    fn brca_vocabulary_is_total() {
        assert_eq!(BrcaCode::from_result("negative").code(), "1:N");
        assert_eq!(BrcaCode::from_result("positive").code(), "2:P");
        for other in ["", "Positive", "unknown", "inconclusive"] {
            assert_eq!(BrcaCode::from_result(other).code(), "0:Unknown");
        }
    }

    #[test]
    fn bmi_bands_have_inclusive_upper_edges() {
        let cases = [
            (-5.0, "1:<19"),
            (0.0, "1:<19"),
            (18.5, "1:<19"),
            (18.51, "2:<25"),
            (24.9, "2:<25"),
            (24.91, "3:<30"),
            (29.9, "3:<30"),
            (29.91, "4:<99"),
            (98.999, "4:<99"),
            (99.0, "0:No"),
            (1e9, "0:No"),
            (f64::INFINITY, "0:No"),
            (f64::NAN, "0:No"),
        ];
        for (bmi, code) in cases {
            assert_eq!(BmiBand::from_bmi(bmi).code(), code, "bmi = {bmi}");
        }
    }

    #[test]
    fn bmi_bands_are_monotonic() {
        let rank = |band: BmiBand| match band {
            BmiBand::Under19 => 0,
            BmiBand::Under25 => 1,
            BmiBand::Under30 => 2,
            BmiBand::Under99 => 3,
            BmiBand::OutOfRange => 4,
        };
        let mut previous = rank(BmiBand::from_bmi(-10.0));
        let mut bmi = -10.0;
        while bmi < 150.0 {
            let current = rank(BmiBand::from_bmi(bmi));
            assert!(current >= previous, "band decreased at bmi = {bmi}");
            previous = current;
            bmi += 0.01;
        }
    }

    #[test]
    fn non_positive_height_gives_zero_bmi() {
        for height in [0.0, -170.0] {
            for weight in [0.0, 55.0, 1e6] {
                let bmi = body_mass_index(&BodyMeasurements { weight, height });
                assert_eq!(bmi, 0.0);
                assert_eq!(BmiBand::from_bmi(bmi), BmiBand::Under19);
            }
        }
    }

    #[test]
    fn age_bands_follow_boundaries() {
        let cases = [
            (i64::MIN, "1:<30"),
            (0, "1:<30"),
            (29, "1:<30"),
            (30, "2:<40"),
            (39, "2:<40"),
            (40, "3:<50"),
            (49, "3:<50"),
            (50, "4:<99"),
            (98, "4:<99"),
            (99, "0:Unknown"),
            (150, "0:Unknown"),
        ];
        for (age, code) in cases {
            assert_eq!(AgeBand::from_age(age).code(), code, "age = {age}");
        }
    }

    #[test]
    fn province_and_gender_fall_back_to_sentinels() {
        assert_eq!(region_code("ยะลา"), 1);
        assert_eq!(region_code("ปัตตานี"), 1);
        assert_eq!(region_code("นราธิวาส"), 1);
        assert_eq!(region_code("สตูล"), 2);
        assert_eq!(region_code("พังงา"), 3);
        assert_eq!(region_code("พัทลุง"), 3);
        assert_eq!(region_code("อื่นๆ"), OTHER_REGION);
        assert_eq!(region_code("กรุงเทพมหานคร"), OTHER_REGION);
        assert_eq!(region_code(""), OTHER_REGION);

        assert_eq!(gender_code("Male"), 0);
        assert_eq!(gender_code("Female"), 1);
        assert_eq!(gender_code("female"), UNKNOWN_GENDER);
        assert_eq!(gender_code("Other"), UNKNOWN_GENDER);
    }

    #[test]
    fn only_the_first_province_is_consulted() {
        let mut req = request();
        req.province = vec!["ยะลา".to_string(), "สงขลา".to_string()];
        assert_eq!(EncodedFields::from_request(&req).unwrap().region, 1);
    }

    #[test]
    fn malformed_sequences_are_rejected() {
        let mut req = request();
        req.brca.clear();
        assert_eq!(
            EncodedFields::from_request(&req).unwrap_err(),
            EncodeError::BrcaEntries { found: 0 }
        );

        let mut req = request();
        req.brca.push("negative".to_string());
        assert_eq!(
            EncodedFields::from_request(&req).unwrap_err(),
            EncodeError::BrcaEntries { found: 2 }
        );

        let mut req = request();
        req.province.clear();
        assert_eq!(
            EncodedFields::from_request(&req).unwrap_err(),
            EncodeError::EmptyProvince
        );
    }

    #[test]
    fn natural_columns_drop_the_baseline_level() {
        let fields = EncodedFields::from_request(&request()).unwrap();
        let natural = fields.natural_columns();
        let names: Vec<&str> = natural.iter().map(|(name, _)| name.as_str()).collect();

        assert!(!names.contains(&"BRCA_0:Unknown"));
        assert!(!names.contains(&"BMI_GROUP_0:No"));
        assert!(!names.contains(&"AGE_GROUP_0:Unknown"));
        // 2 BRCA + 4 BMI + 4 age indicators, then province and gender.
        assert_eq!(natural.len(), 12);

        let hot: Vec<&str> = natural
            .iter()
            .filter(|(_, value)| *value == 1.0)
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(
            hot,
            vec!["BRCA_2:P", "BMI_GROUP_2:<25", "AGE_GROUP_3:<50", GENDER_FIELD]
        );
    }

    #[test]
    fn encoded_row_matches_layout_exactly() {
        let layout = full_layout();
        let row = encode(&request(), &layout).unwrap();
        assert_eq!(row.len(), layout.len());

        let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        let expected: Vec<&str> = layout.names().iter().map(String::as_str).collect();
        assert_eq!(names, expected);

        assert_eq!(row.get(PROVINCE_FIELD), Some(2.0));
        assert_eq!(row.get(GENDER_FIELD), Some(1.0));
        assert_eq!(row.get("BRCA_2:P"), Some(1.0));
        assert_eq!(row.get("BRCA_1:N"), Some(0.0));
        assert_eq!(row.get("AGE_GROUP_3:<50"), Some(1.0));
    }

    #[test]
    fn reindex_fills_missing_and_drops_unknown_columns() {
        let layout = ColumnLayout::new(vec![
            "GENDER_N".to_string(),
            "SMOKER".to_string(),
            "BRCA_2:P".to_string(),
        ])
        .unwrap();

        let mut req = request();
        req.gender = "Male".to_string();
        req.brca = vec!["unknown".to_string()];
        let row = encode(&req, &layout).unwrap();

        assert_eq!(row.values().to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(row.get(PROVINCE_FIELD), None);
    }

    #[test]
    fn every_branch_yields_the_same_shape() {
        let layout = full_layout();
        let brcas = ["negative", "positive", "???"];
        let ages = [10, 35, 45, 70, 120];
        let heights = [0.0, 120.0, 175.0, 300.0];
        for brca in brcas {
            for age in ages {
                for height in heights {
                    let mut req = request();
                    req.brca = vec![brca.to_string()];
                    req.age = age;
                    req.body.height = height;
                    let row = encode(&req, &layout).unwrap();
                    assert_eq!(row.len(), layout.len());
                    let hot = row.values().iter().filter(|v| **v == 1.0).count();
                    // BRCA/BMI/age contribute at most one indicator each; gender is 1.
                    assert!(hot <= 4);
                }
            }
        }
    }
}
