//! Row decoding.
//!
//! Turns one row of raw cells into a [`MetricRecord`] according to the
//! query's [`Classification`].

use super::{Classification, ColumnRole, FieldValue, MetricRecord};
use crate::db::RawCell;
use crate::error::DecodeError;

/// Decodes one row.
///
/// `cells`, `column_names` and `classification` are walked in lockstep and
/// must have the same length; callers reject ragged rows first. NULL cells
/// produce no entry. When two columns share a destination name the later
/// column wins. A typed-numeric cell that is not a base-10 signed 64-bit
/// integer fails the whole row.
pub fn decode(
    cells: &[RawCell],
    column_names: &[String],
    classification: &Classification,
) -> Result<MetricRecord, DecodeError> {
    debug_assert_eq!(cells.len(), column_names.len(), "row width differs from column count");
    debug_assert_eq!(
        column_names.len(),
        classification.len(),
        "classification covers a different column count"
    );

    let mut record = MetricRecord::new();

    for ((cell, name), role) in cells
        .iter()
        .zip(column_names)
        .zip(classification.roles())
    {
        let Some(text) = cell.as_text() else {
            continue;
        };

        match role {
            ColumnRole::Tag => {
                record.tags.insert(name.clone(), text.to_string());
            }
            ColumnRole::TypedNumeric => {
                let value = text
                    .parse::<i64>()
                    .map_err(|e| DecodeError::numeric_parse(name.as_str(), text, e))?;
                record.fields.insert(name.clone(), FieldValue::Integer(value));
            }
            ColumnRole::DefaultText => {
                record
                    .fields
                    .insert(name.clone(), FieldValue::String(text.to_string()));
            }
        }
    }

    Ok(record)
}
