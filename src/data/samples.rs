//! Reference pitches for smoke-testing a trained estimator.

use ndarray::Array1;

use super::dataset::EstimatorBatch;
use super::model::FeatureMap;
use super::schema::ESTIMATOR_FEATURES;

/// `[vx0, vy0, vz0, ax, ay, az]` per row. Row 2 is a two-seam fastball (FT).
pub const REFERENCE_PITCHES: [[f32; 6]; 12] = [
    [-9.706, -135.569, -4.866, 6.548, 28.308, -14.883],
    [-9.375, -115.324, -2.395, -1.281, 22.358, -39.066],
    [3.183, -135.149, -2.005, -16.296, 29.576, -22.414],
    [5.09, -123.243, -6.224, -19.159, 28.283, -25.269],
    [3.857, -116.851, -0.632, -1.749, 22.639, -34.27],
    [0.664, -117.548, 1.539, 3.957, 24.355, -40.877],
    [1.158, -91.701, 1.385, -1.263, 13.798, -30.613],
    [9.089, -120.985, -2.767, -11.007, 23.257, -28.045],
    [3.902, -117.524, 1.619, 7.688, 24.31, -40.42],
    [-3.94, -132.87, -1.45, 18.93, 30.41, -31.62],
    [7.254, -133.116, -6.822, 2.01, 30.686, -8.24],
    [5.94, 6.75, -110.35, 0.4, 4.86, 21.73],
];

pub fn reference_feature_maps() -> Vec<FeatureMap> {
    REFERENCE_PITCHES
        .iter()
        .map(|row| {
            FeatureMap::from_entries(
                ESTIMATOR_FEATURES
                    .iter()
                    .zip(row.iter())
                    .map(|((name, _), v)| (*name, *v))
                    .collect(),
            )
        })
        .collect()
}

/// The reference pitches as estimator input columns. Codes are unknown and
/// left empty.
pub fn reference_batch() -> EstimatorBatch {
    let features = ESTIMATOR_FEATURES
        .iter()
        .enumerate()
        .map(|(j, (name, _))| {
            let column: Array1<f32> = REFERENCE_PITCHES.iter().map(|row| row[j]).collect();
            (*name, column)
        })
        .collect();
    EstimatorBatch {
        features,
        codes: Array1::zeros(0),
    }
}
