use csv::{ReaderBuilder, StringRecord};

use super::model::{DecodedRecord, FieldValue};
use super::schema::{ColumnSpec, ColumnType, Schema, FLOAT_DEFAULT, INTEGER_DEFAULT, PITCH_SCHEMA};
use crate::error::DecodeError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Decode one data line of a pitch file.
///
/// The header line must already have been skipped.
pub fn decode(line: &str) -> Result<DecodedRecord, DecodeError> {
    decode_with(&PITCH_SCHEMA, line)
}

/// Decode a record that a CSV reader has already split.
pub fn decode_record(record: &StringRecord) -> Result<DecodedRecord, DecodeError> {
    decode_record_with(&PITCH_SCHEMA, record)
}

/// Decode one delimited line against an arbitrary schema.
pub fn decode_with(schema: &Schema, line: &str) -> Result<DecodedRecord, DecodeError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(schema.delimiter)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    if !reader.read_record(&mut record)? {
        // The CSV reader skips blank lines entirely.
        return Err(DecodeError::SchemaMismatch {
            expected: schema.len(),
            found: 0,
        });
    }
    if reader.read_record(&mut StringRecord::new())? {
        return Err(DecodeError::MultipleRecords);
    }
    decode_record_with(schema, &record)
}

/// Coerce each field of `record` to its column type.
///
/// Empty fields take the column default; any other field that does not
/// parse is an error.
pub fn decode_record_with(schema: &Schema, record: &StringRecord) -> Result<DecodedRecord, DecodeError> {
    if record.len() != schema.len() {
        return Err(DecodeError::SchemaMismatch {
            expected: schema.len(),
            found: record.len(),
        });
    }

    let fields = schema
        .columns
        .iter()
        .zip(record.iter())
        .enumerate()
        .map(|(index, (column, raw))| parse_field(index, column, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedRecord::new(fields))
}

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

fn parse_field(index: usize, column: &ColumnSpec, raw: &str) -> Result<FieldValue, DecodeError> {
    if raw.is_empty() {
        return Ok(default_value(column.kind));
    }

    let invalid = || DecodeError::InvalidField {
        index,
        column: column.name,
        kind: column.kind,
        value: raw.to_string(),
    };

    match column.kind {
        ColumnType::String => Ok(FieldValue::String(raw.to_string())),
        ColumnType::Integer => raw
            .parse::<i32>()
            .map(FieldValue::Integer)
            .map_err(|_| invalid()),
        ColumnType::Float => raw
            .parse::<f32>()
            .map(FieldValue::Float)
            .map_err(|_| invalid()),
    }
}

/// Value substituted for an empty field of the given type.
pub fn default_value(kind: ColumnType) -> FieldValue {
    match kind {
        ColumnType::String => FieldValue::String(String::new()),
        ColumnType::Integer => FieldValue::Integer(INTEGER_DEFAULT),
        ColumnType::Float => FieldValue::Float(FLOAT_DEFAULT),
    }
}
