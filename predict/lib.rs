#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod batch;
pub mod encode;
pub mod service;
pub mod types;

#[path = "../artifacts/mod.rs"]
pub mod artifacts;

#[path = "../serve/mod.rs"]
pub mod serve;

pub use artifacts::{ArtifactError, ArtifactPaths, ArtifactStore};
pub use service::{PredictionError, PredictionService};
pub use types::{BodyMeasurements, PredictionLabel, PredictionRequest, PredictionResponse};
