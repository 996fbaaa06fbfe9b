//! Data layer: schema, decoding, projection, and the dataset plumbing
//! around them.
//!
//! Architecture:
//! ```text
//!   pitches.csv (header + lines)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  read lines, skip header, apply error policy
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ decoder   │  line → DecodedRecord (33 typed fields, via schema)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ projector │  training: (one-hot[11], [f32; 8])
//!   └──────────┘  estimator: (FeatureMap{6}, raw code)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ dataset   │  shuffle → repeat → batch → stacked ndarray tensors
//!   └──────────┘
//! ```
//!
//! `schema`, `decoder`, and `projector` are pure and hold no state.

pub mod dataset;
pub mod decoder;
pub mod loader;
pub mod model;
pub mod projector;
pub mod samples;
pub mod schema;
