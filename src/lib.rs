//! Pitch-tracking CSV decoding and feature/label projection.
//!
//! Each data line of a pitch file decodes into a fixed 33-column
//! [`DecodedRecord`], which one of two projector policies turns into
//! classifier input: a fixed-order feature vector with a one-hot label
//! (training) or a named feature map with the raw class code (estimator).

pub mod config;
pub mod data;
pub mod error;

pub use config::{Config, DatasetConfig, InputConfig};
pub use data::decoder::{decode, decode_record};
pub use data::model::{
    DecodedRecord, EstimatorExample, FeatureMap, FieldValue, Projection, TrainingExample,
};
pub use data::projector::{one_hot, project, project_estimator, project_training, ProjectorKind};
pub use data::schema::{NUM_PITCH_CLASSES, PITCH_CLASSES, PITCH_SCHEMA};
pub use error::{ConfigError, DecodeError, LoadError, ProjectionError};
