use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::model::{DecodedRecord, EstimatorExample, FeatureMap, Projection, TrainingExample};
use super::schema::{
    ColumnType, ESTIMATOR_AUXILIARY, ESTIMATOR_FEATURES, NUM_PITCH_CLASSES, PITCH_CODE_INDEX,
    PITCH_COLUMNS, TRAINING_FEATURES,
};
use crate::error::ProjectionError;

// ---------------------------------------------------------------------------
// Projector kinds
// ---------------------------------------------------------------------------

/// Which downstream consumer a record is projected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProjectorKind {
    /// Fixed-order feature vector with a one-hot label.
    #[default]
    Training,
    /// Named feature map with the raw class code.
    Estimator,
}

/// Project a record with the given policy.
pub fn project(kind: ProjectorKind, record: &DecodedRecord) -> Result<Projection, ProjectionError> {
    match kind {
        ProjectorKind::Training => project_training(record).map(Projection::Training),
        ProjectorKind::Estimator => project_estimator(record).map(Projection::Estimator),
    }
}

// ---------------------------------------------------------------------------
// Training policy
// ---------------------------------------------------------------------------

/// One-hot label plus `[ax, ay, az, vx0, vy0, vz0, px, pz]`.
pub fn project_training(record: &DecodedRecord) -> Result<TrainingExample, ProjectionError> {
    let code = pitch_code(record)?;
    let label = one_hot(code, NUM_PITCH_CLASSES)?;

    let features = TRAINING_FEATURES
        .iter()
        .map(|(_, index)| float_at(record, *index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrainingExample {
        label,
        features: Array1::from(features),
    })
}

/// Encode `code` as a vector of `width` zeros with a single one.
pub fn one_hot(code: i32, width: usize) -> Result<Array1<f32>, ProjectionError> {
    let index = usize::try_from(code)
        .ok()
        .filter(|i| *i < width)
        .ok_or(ProjectionError::Encoding { code, classes: width })?;

    let mut label = Array1::zeros(width);
    label[index] = 1.0;
    Ok(label)
}

// ---------------------------------------------------------------------------
// Estimator policy
// ---------------------------------------------------------------------------

/// Named `vx0, vy0, vz0, ax, ay, az` features plus the untouched class code.
pub fn project_estimator(record: &DecodedRecord) -> Result<EstimatorExample, ProjectionError> {
    let pitch_code = pitch_code(record)?;

    // Read alongside the features and dropped; they are not part of the
    // estimator's input.
    let _auxiliary = auxiliary_fields(record)?;

    let entries = ESTIMATOR_FEATURES
        .iter()
        .map(|(name, index)| float_at(record, *index).map(|v| (*name, v)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EstimatorExample {
        features: FeatureMap::from_entries(entries),
        pitch_code,
    })
}

/// break_y, break_angle, break_length, start_speed, end_speed, type_confidence.
fn auxiliary_fields(record: &DecodedRecord) -> Result<[f32; 6], ProjectionError> {
    let mut values = [0.0; 6];
    for (slot, (_, index)) in values.iter_mut().zip(ESTIMATOR_AUXILIARY.iter()) {
        *slot = float_at(record, *index)?;
    }
    Ok(values)
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

fn pitch_code(record: &DecodedRecord) -> Result<i32, ProjectionError> {
    record
        .integer(PITCH_CODE_INDEX)
        .ok_or_else(|| column_type_error(PITCH_CODE_INDEX, ColumnType::Integer))
}

fn float_at(record: &DecodedRecord, index: usize) -> Result<f32, ProjectionError> {
    record
        .float(index)
        .ok_or_else(|| column_type_error(index, ColumnType::Float))
}

fn column_type_error(index: usize, expected: ColumnType) -> ProjectionError {
    ProjectionError::ColumnType {
        index,
        column: PITCH_COLUMNS.get(index).map_or("<out of range>", |c| c.name),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::decoder::decode;
    use crate::data::model::FieldValue;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    const FT_LINE: &str = ",,FT,,,,,,,,,,-1.496,2.793,,,,3.183,-135.149,-2.005,-16.296,29.576,-22.414,,,,FT,2,0.943,,,,";

    fn record_with_code(code: &str) -> DecodedRecord {
        let mut fields = vec![""; 33];
        fields[27] = code;
        decode(&fields.join(",")).unwrap()
    }

    #[test]
    fn test_training_example_line() {
        let rec = decode(FT_LINE).unwrap();
        let example = project_training(&rec).unwrap();

        let expected = array![-16.296f32, 29.576, -22.414, 3.183, -135.149, -2.005, -1.496, 2.793];
        assert_abs_diff_eq!(example.features, expected, epsilon = 1e-6);

        assert_eq!(example.label.len(), 11);
        assert_eq!(example.label[2], 1.0);
        assert_eq!(example.label.sum(), 1.0);
    }

    #[test]
    fn test_estimator_example_line() {
        let rec = decode(FT_LINE).unwrap();
        let example = project_estimator(&rec).unwrap();

        assert_eq!(
            example.features.keys().collect::<Vec<_>>(),
            vec!["vx0", "vy0", "vz0", "ax", "ay", "az"]
        );
        assert_eq!(example.features.get("vx0"), Some(3.183));
        assert_eq!(example.features.get("vy0"), Some(-135.149));
        assert_eq!(example.features.get("vz0"), Some(-2.005));
        assert_eq!(example.features.get("ax"), Some(-16.296));
        assert_eq!(example.features.get("ay"), Some(29.576));
        assert_eq!(example.features.get("az"), Some(-22.414));
        assert_eq!(example.pitch_code, 2);
    }

    #[test]
    fn test_estimator_omits_auxiliary_fields() {
        let rec = decode(FT_LINE).unwrap();
        let example = project_estimator(&rec).unwrap();
        assert_eq!(example.features.len(), 6);
        for (name, _) in ESTIMATOR_AUXILIARY {
            assert_eq!(example.features.get(name), None);
        }
    }

    #[test]
    fn test_one_hot_boundaries() {
        let last = project_training(&record_with_code("10")).unwrap();
        assert_eq!(last.label[10], 1.0);
        assert_eq!(last.label.sum(), 1.0);

        let first = project_training(&record_with_code("0")).unwrap();
        assert_eq!(first.label[0], 1.0);

        for code in ["11", "-1"] {
            let err = project_training(&record_with_code(code)).unwrap_err();
            assert!(matches!(err, ProjectionError::Encoding { classes: 11, .. }));
        }
    }

    #[test]
    fn test_estimator_passes_code_through() {
        let example = project_estimator(&record_with_code("11")).unwrap();
        assert_eq!(example.pitch_code, 11);
    }

    #[test]
    fn test_projection_is_repeatable() {
        let rec = decode(FT_LINE).unwrap();
        let a = project_training(&rec).unwrap();
        let b = project_training(&rec).unwrap();
        let bits = |x: &Array1<f32>| x.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.features), bits(&b.features));
        assert_eq!(bits(&a.label), bits(&b.label));

        let c = project_estimator(&rec).unwrap();
        let d = project_estimator(&rec).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn test_project_dispatch() {
        let rec = decode(FT_LINE).unwrap();
        assert!(matches!(
            project(ProjectorKind::Training, &rec),
            Ok(Projection::Training(_))
        ));
        assert!(matches!(
            project(ProjectorKind::Estimator, &rec),
            Ok(Projection::Estimator(_))
        ));
    }

    #[test]
    fn test_hand_built_record_with_wrong_type() {
        let mut fields = decode(FT_LINE).unwrap().fields().to_vec();
        fields[20] = FieldValue::String("fast".into());
        let rec = DecodedRecord::new(fields);
        let err = project_estimator(&rec).unwrap_err();
        assert_eq!(
            err,
            ProjectionError::ColumnType {
                index: 20,
                column: "ax",
                expected: ColumnType::Float
            }
        );
    }
}
