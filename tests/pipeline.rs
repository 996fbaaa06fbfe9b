use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use ndarray::array;

use pitchfx::data::dataset::{Batch, Dataset};
use pitchfx::data::loader::{ErrorPolicy, PitchFile, SourceOptions};
use pitchfx::data::schema::PITCH_COLUMNS;
use pitchfx::{decode, project_estimator, project_training, DatasetConfig, LoadError};

const FT_LINE: &str = ",,FT,,,,,,,,,,-1.496,2.793,,,,3.183,-135.149,-2.005,-16.296,29.576,-22.414,,,,FT,2,0.943,,,,";

fn header() -> String {
    PITCH_COLUMNS.iter().map(|c| c.name).collect::<Vec<_>>().join(",")
}

fn line_with_code(code: usize) -> String {
    let mut fields = vec![String::new(); 33];
    fields[20] = format!("{}.5", code);
    fields[27] = code.to_string();
    fields.join(",")
}

/// A pitch file under the system temp dir, removed on drop.
struct TempPitchFile(PathBuf);

impl TempPitchFile {
    fn new(name: &str, lines: &[String]) -> Self {
        let path = std::env::temp_dir().join(format!("pitchfx-{}-{name}.csv", std::process::id()));
        let mut text = header();
        for line in lines {
            text.push('\n');
            text.push_str(line);
        }
        text.push('\n');
        std::fs::write(&path, text).unwrap();
        TempPitchFile(path)
    }
}

impl Drop for TempPitchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn test_example_line_training() {
    let record = decode(FT_LINE).unwrap();
    let example = project_training(&record).unwrap();
    assert_abs_diff_eq!(
        example.features,
        array![-16.296f32, 29.576, -22.414, 3.183, -135.149, -2.005, -1.496, 2.793],
        epsilon = 1e-6
    );
    let hot: Vec<usize> = example
        .label
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == 1.0)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(hot, vec![2]);
}

#[test]
fn test_example_line_estimator() {
    let record = decode(FT_LINE).unwrap();
    let example = project_estimator(&record).unwrap();
    let pairs: Vec<(&str, f32)> = example.features.iter().collect();
    assert_eq!(
        pairs,
        vec![
            ("vx0", 3.183),
            ("vy0", -135.149),
            ("vz0", -2.005),
            ("ax", -16.296),
            ("ay", 29.576),
            ("az", -22.414),
        ]
    );
    assert_eq!(example.pitch_code, 2);
}

#[test]
fn test_training_dataset_batches_in_file_order() {
    let lines: Vec<String> = (0..25).map(|i| line_with_code(i % 11)).collect();
    let file = TempPitchFile::new("order", &lines);
    let config = DatasetConfig {
        batch_size: 10,
        ..DatasetConfig::training()
    };
    let dataset = Dataset::new(PitchFile::new(&file.0, SourceOptions::default()), config).unwrap();

    let batches: Vec<Batch> = dataset.batches().unwrap().collect::<Result<_, _>>().unwrap();
    let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
    assert_eq!(sizes, vec![10, 10, 5]);

    match &batches[1] {
        Batch::Training(b) => {
            assert_eq!(b.labels.dim(), (10, 11));
            assert_eq!(b.features.dim(), (10, 8));
            // Record 10 has code 10.
            assert_eq!(b.labels[[0, 10]], 1.0);
            assert_eq!(b.features[[0, 0]], 10.5);
        }
        other => panic!("unexpected batch: {other:?}"),
    }
}

#[test]
fn test_estimator_dataset_shuffles_and_repeats() {
    let lines: Vec<String> = (0..11).map(line_with_code).collect();
    let file = TempPitchFile::new("repeat", &lines);
    let config = DatasetConfig {
        batch_size: 11,
        shuffle_buffer: 11,
        ..DatasetConfig::estimator_train()
    };
    let dataset = Dataset::new(PitchFile::new(&file.0, SourceOptions::default()), config).unwrap();

    let batches: Vec<Batch> = dataset
        .batches()
        .unwrap()
        .take(3)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(batches.len(), 3);
    for batch in &batches {
        match batch {
            Batch::Estimator(b) => {
                let mut codes = b.codes.to_vec();
                codes.sort_unstable();
                assert_eq!(codes, (0..11).collect::<Vec<i32>>());
            }
            other => panic!("unexpected batch: {other:?}"),
        }
    }
}

#[test]
fn test_bad_record_fails_its_batch() {
    let mut lines: Vec<String> = (0..6).map(line_with_code).collect();
    lines[4] = line_with_code(11);
    let file = TempPitchFile::new("bad", &lines);
    let config = DatasetConfig {
        batch_size: 3,
        ..DatasetConfig::training()
    };
    let dataset = Dataset::new(PitchFile::new(&file.0, SourceOptions::default()), config).unwrap();

    let results: Vec<_> = dataset.batches().unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(LoadError::Projection { line: 6, .. })));
}

#[test]
fn test_skip_policy_drops_bad_record() {
    let mut lines: Vec<String> = (0..6).map(line_with_code).collect();
    lines[4] = line_with_code(11);
    let file = TempPitchFile::new("skip", &lines);
    let options = SourceOptions {
        on_error: ErrorPolicy::Skip,
        ..SourceOptions::default()
    };
    let config = DatasetConfig {
        batch_size: 3,
        ..DatasetConfig::training()
    };
    let dataset = Dataset::new(PitchFile::new(&file.0, options), config).unwrap();

    let sizes: Vec<usize> = dataset
        .batches()
        .unwrap()
        .map(|b| b.unwrap().len())
        .collect();
    assert_eq!(sizes, vec![3, 2]);
}

#[test]
fn test_missing_file_fails_up_front() {
    let file = PitchFile::new("no/such/pitches.csv", SourceOptions::default());
    let dataset = Dataset::new(file, DatasetConfig::estimator_eval()).unwrap();
    assert!(matches!(dataset.batches().err(), Some(LoadError::Io(_))));
}

#[test]
fn test_abort_stops_a_repeating_dataset() {
    let lines = vec![FT_LINE.to_string(), line_with_code(11)];
    let file = TempPitchFile::new("abort-repeat", &lines);
    let config = DatasetConfig {
        batch_size: 1,
        repeat: true,
        ..DatasetConfig::training()
    };
    let dataset = Dataset::new(PitchFile::new(&file.0, SourceOptions::default()), config).unwrap();

    let results: Vec<_> = dataset.batches().unwrap().take(6).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(LoadError::Projection { line: 3, .. })));
}

#[test]
fn test_failed_reopen_ends_the_stream() {
    let file = TempPitchFile::new("reopen", &[FT_LINE.to_string()]);
    let options = SourceOptions {
        on_error: ErrorPolicy::Skip,
        ..SourceOptions::default()
    };
    let config = DatasetConfig {
        batch_size: 1,
        repeat: true,
        ..DatasetConfig::training()
    };
    let dataset = Dataset::new(PitchFile::new(&file.0, options), config).unwrap();

    // The first pass is already open, so only the second one fails.
    let batches = dataset.batches().unwrap();
    std::fs::remove_file(&file.0).unwrap();
    let results: Vec<_> = batches.take(10).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(LoadError::Io(_))));
}
