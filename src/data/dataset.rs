use ndarray::{Array1, Array2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::loader::{ErrorPolicy, PitchFile};
use super::model::{EstimatorExample, Projection, TrainingExample};
use super::projector::ProjectorKind;
use super::schema::{ESTIMATOR_FEATURES, NUM_PITCH_CLASSES, TRAINING_FEATURES};
use crate::config::DatasetConfig;
use crate::error::{ConfigError, LoadError};

// ---------------------------------------------------------------------------
// Generic sequence adapters
// ---------------------------------------------------------------------------

/// Windowed shuffle: holds up to `capacity` items and emits a random one.
pub struct Shuffle<I: Iterator, R> {
    iter: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    rng: R,
}

pub fn shuffle<I: Iterator, R: Rng>(iter: I, capacity: usize, rng: R) -> Shuffle<I, R> {
    let capacity = capacity.max(1);
    Shuffle {
        iter,
        buffer: Vec::with_capacity(capacity.min(4096)),
        capacity,
        rng,
    }
}

impl<I: Iterator, R: Rng> Iterator for Shuffle<I, R> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.capacity {
            match self.iter.next() {
                Some(item) => self.buffer.push(item),
                None => break,
            }
        }
        if self.buffer.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.buffer.len());
        Some(self.buffer.swap_remove(index))
    }
}

/// Consecutive chunks of `size` items; the last may be shorter.
pub struct Batches<I> {
    iter: I,
    size: usize,
}

pub fn batch<I: Iterator>(iter: I, size: usize) -> Result<Batches<I>, ConfigError> {
    if size == 0 {
        return Err(ConfigError::Invalid("batch size must be at least 1".into()));
    }
    Ok(Batches { iter, size })
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<_> = self.iter.by_ref().take(self.size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}

/// Endless passes over a source rebuilt by `factory`.
///
/// Stops if a fresh pass is empty straight away, or once `limit` passes
/// have run.
pub struct Repeat<F, I> {
    factory: F,
    current: Option<I>,
    passes: usize,
    limit: Option<usize>,
}

pub fn repeat<F, I>(factory: F) -> Repeat<F, I>
where
    F: FnMut() -> I,
    I: Iterator,
{
    Repeat {
        factory,
        current: None,
        passes: 0,
        limit: None,
    }
}

impl<F, I> Repeat<F, I> {
    /// Run at most `passes` passes.
    pub fn limit(mut self, passes: usize) -> Self {
        self.limit = Some(passes);
        self
    }

    /// Passes started so far.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

impl<F, I> Iterator for Repeat<F, I>
where
    F: FnMut() -> I,
    I: Iterator,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.current.as_mut().and_then(Iterator::next) {
            return Some(item);
        }
        if self.limit.is_some_and(|limit| self.passes >= limit) {
            return None;
        }
        let mut fresh = (self.factory)();
        self.passes += 1;
        if self.passes > 1 {
            log::debug!("restarting source, pass {}", self.passes);
        }
        let item = fresh.next()?;
        self.current = Some(fresh);
        Some(item)
    }
}

// ---------------------------------------------------------------------------
// Stacked batches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingBatch {
    /// `[n, NUM_PITCH_CLASSES]`
    pub labels: Array2<f32>,
    /// `[n, 8]`
    pub features: Array2<f32>,
}

impl TrainingBatch {
    pub fn stack(examples: &[TrainingExample]) -> Self {
        let n = examples.len();
        TrainingBatch {
            labels: Array2::from_shape_fn((n, NUM_PITCH_CLASSES), |(i, j)| examples[i].label[j]),
            features: Array2::from_shape_fn((n, TRAINING_FEATURES.len()), |(i, j)| {
                examples[i].features[j]
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorBatch {
    /// One column per estimator feature, in estimator order.
    pub features: Vec<(&'static str, Array1<f32>)>,
    pub codes: Array1<i32>,
}

impl EstimatorBatch {
    pub fn stack(examples: &[EstimatorExample]) -> Self {
        let features = ESTIMATOR_FEATURES
            .iter()
            .map(|(name, _)| {
                let column = examples
                    .iter()
                    .map(|e| e.features.get(name).unwrap_or(f32::NAN))
                    .collect::<Array1<f32>>();
                (*name, column)
            })
            .collect();
        EstimatorBatch {
            features,
            codes: examples.iter().map(|e| e.pitch_code).collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Array1<f32>> {
        self.features
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Training(TrainingBatch),
    Estimator(EstimatorBatch),
}

impl Batch {
    /// Stack projections made by the `kind` policy; other variants are ignored.
    pub fn stack(kind: ProjectorKind, projections: Vec<Projection>) -> Self {
        match kind {
            ProjectorKind::Training => {
                let examples: Vec<_> = projections
                    .into_iter()
                    .filter_map(|p| match p {
                        Projection::Training(t) => Some(t),
                        Projection::Estimator(_) => None,
                    })
                    .collect();
                Batch::Training(TrainingBatch::stack(&examples))
            }
            ProjectorKind::Estimator => {
                let examples: Vec<_> = projections
                    .into_iter()
                    .filter_map(|p| match p {
                        Projection::Estimator(e) => Some(e),
                        Projection::Training(_) => None,
                    })
                    .collect();
                Batch::Estimator(EstimatorBatch::stack(&examples))
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Batch::Training(b) => b.len(),
            Batch::Estimator(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Dataset – pitch file → batches
// ---------------------------------------------------------------------------

/// A pitch file composed with a projector and shuffle/batch/repeat settings.
#[derive(Debug, Clone)]
pub struct Dataset {
    file: PitchFile,
    config: DatasetConfig,
}

impl Dataset {
    pub fn new(file: PitchFile, config: DatasetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Dataset { file, config })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Lazily read, project, shuffle, repeat and batch the file.
    ///
    /// A batch containing a failed record is yielded as that record's error.
    /// Under [`ErrorPolicy::Abort`] nothing follows that error, even when
    /// repeating. A file that cannot be reopened for a later pass yields the
    /// open error once and ends the stream.
    pub fn batches(&self) -> Result<impl Iterator<Item = Result<Batch, LoadError>> + '_, LoadError> {
        let kind = self.config.policy;
        let abort = self.file.options().on_error == ErrorPolicy::Abort;

        // Open once up front so a missing file fails here, not mid-stream.
        let mut first = Some(self.file.open()?);
        let mut reopen_failed = false;
        let mut pass: u64 = 0;
        let mut passes = repeat(move || {
            let rng = SmallRng::seed_from_u64(self.config.seed.wrapping_add(pass));
            pass += 1;
            let source: Box<dyn Iterator<Item = Result<Projection, LoadError>>> = if reopen_failed {
                // An empty pass ends the repeat.
                Box::new(std::iter::empty())
            } else {
                match first.take().map_or_else(|| self.file.open(), Ok) {
                    Ok(source) => Box::new(source.projected(kind)),
                    Err(err) => {
                        reopen_failed = true;
                        Box::new(std::iter::once(Err(err)))
                    }
                }
            };
            shuffle(source, self.config.shuffle_buffer, rng)
        });

        if !self.config.repeat {
            passes = passes.limit(1);
        }
        let records = passes.scan(false, move |failed, item| {
            if *failed {
                return None;
            }
            *failed = abort && item.is_err();
            Some(item)
        });
        let batches = batch(records, self.config.batch_size)?;

        Ok(batches.map(move |chunk| {
            let projections = chunk.into_iter().collect::<Result<Vec<_>, _>>()?;
            Ok(Batch::stack(kind, projections))
        }))
    }
}
