use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Column types
// ---------------------------------------------------------------------------

/// Semantic type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
        }
    }
}

/// One schema position.
///
/// `name` is the header label of the source file. The decoder identifies
/// columns by position only; names are for header checks and messages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnType,
}

impl ColumnSpec {
    const fn string(name: &'static str) -> Self {
        ColumnSpec { name, kind: ColumnType::String }
    }

    const fn integer(name: &'static str) -> Self {
        ColumnSpec { name, kind: ColumnType::Integer }
    }

    const fn float(name: &'static str) -> Self {
        ColumnSpec { name, kind: ColumnType::Float }
    }
}

/// Default substituted for an empty float field.
pub const FLOAT_DEFAULT: f32 = f32::NAN;
/// Default substituted for an empty integer field.
pub const INTEGER_DEFAULT: i32 = 0;

// ---------------------------------------------------------------------------
// Pitch schema
// ---------------------------------------------------------------------------

pub const NUM_COLUMNS: usize = 33;

pub const PITCH_COLUMNS: [ColumnSpec; NUM_COLUMNS] = [
    ColumnSpec::string("des"),
    ColumnSpec::float("id"),
    ColumnSpec::string("type"),
    ColumnSpec::string("tfs_zulu"),
    ColumnSpec::float("x"),
    ColumnSpec::float("y"),
    ColumnSpec::float("start_speed"),
    ColumnSpec::float("end_speed"),
    ColumnSpec::float("sz_top"),
    ColumnSpec::float("sz_bot"),
    ColumnSpec::float("pfx_x"),
    ColumnSpec::float("pfx_z"),
    ColumnSpec::float("px"),
    ColumnSpec::float("pz"),
    ColumnSpec::float("x0"),
    ColumnSpec::float("y0"),
    ColumnSpec::float("z0"),
    ColumnSpec::float("vx0"),
    ColumnSpec::float("vy0"),
    ColumnSpec::float("vz0"),
    ColumnSpec::float("ax"),
    ColumnSpec::float("ay"),
    ColumnSpec::float("az"),
    ColumnSpec::float("break_y"),
    ColumnSpec::float("break_angle"),
    ColumnSpec::float("break_length"),
    ColumnSpec::string("pitch_type"),
    ColumnSpec::integer("pitch_code"),
    ColumnSpec::float("type_confidence"),
    ColumnSpec::float("zone"),
    ColumnSpec::float("nasty"),
    ColumnSpec::float("spin_dir"),
    ColumnSpec::float("spin_rate"),
];

/// Position of the integer class code.
pub const PITCH_CODE_INDEX: usize = 27;

pub const NUM_PITCH_CLASSES: usize = 11;

/// Pitch-type codes; a code's position is its class index.
pub const PITCH_CLASSES: [&str; NUM_PITCH_CLASSES] = [
    "FF", "SL", "FT", "CH", "KN", "CU", "EP", "FS", "KC", "SI", "FC",
];

/// Training feature layout, in output order.
pub const TRAINING_FEATURES: [(&str, usize); 8] = [
    ("ax", 20),
    ("ay", 21),
    ("az", 22),
    ("vx0", 17),
    ("vy0", 18),
    ("vz0", 19),
    ("px", 12),
    ("pz", 13),
];

/// Estimator feature layout, in output order.
pub const ESTIMATOR_FEATURES: [(&str, usize); 6] = [
    ("vx0", 17),
    ("vy0", 18),
    ("vz0", 19),
    ("ax", 20),
    ("ay", 21),
    ("az", 22),
];

/// Fields the estimator policy reads but never emits.
pub const ESTIMATOR_AUXILIARY: [(&str, usize); 6] = [
    ("break_y", 23),
    ("break_angle", 24),
    ("break_length", 25),
    ("start_speed", 6),
    ("end_speed", 7),
    ("type_confidence", 28),
];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Class codes with their implicit index bijection.
#[derive(Debug, Clone, Copy)]
pub struct ClassVocabulary {
    codes: &'static [&'static str],
}

impl ClassVocabulary {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Class index of a pitch-type code.
    pub fn index_of(&self, code: &str) -> Option<usize> {
        self.codes.iter().position(|c| *c == code)
    }

    /// Pitch-type code of a class index.
    pub fn code_of(&self, index: usize) -> Option<&'static str> {
        self.codes.get(index).copied()
    }

    pub fn codes(&self) -> &'static [&'static str] {
        self.codes
    }
}

/// The fixed description of a pitch file: columns, delimiter, vocabulary.
#[derive(Debug)]
pub struct Schema {
    pub columns: &'static [ColumnSpec],
    pub delimiter: u8,
    pub vocabulary: ClassVocabulary,
    pub class_index: usize,
}

/// Process-wide pitch schema.
pub static PITCH_SCHEMA: Schema = Schema {
    columns: &PITCH_COLUMNS,
    delimiter: b',',
    vocabulary: ClassVocabulary { codes: &PITCH_CLASSES },
    class_index: PITCH_CODE_INDEX,
};

impl Schema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the column with the given header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Check that a header row names every column in schema order.
    ///
    /// Returns the first offending position with the expected name, and the
    /// name found there (empty when the header is too short).
    pub fn check_header<'a, I>(&self, headers: I) -> Result<(), (usize, &'static str, String)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut headers = headers.into_iter();
        for (index, column) in self.columns.iter().enumerate() {
            match headers.next() {
                Some(h) if h.trim() == column.name => {}
                Some(h) => return Err((index, column.name, h.to_string())),
                None => return Err((index, column.name, String::new())),
            }
        }
        if let Some(extra) = headers.next() {
            return Err((self.columns.len(), "<end of header>", extra.to_string()));
        }
        Ok(())
    }
}
