// src/process/utils.rs

use arrow::{
    array::ArrayRef,
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Literal tokens that mean "no value" in the source file.
pub const NULL_MARKERS: [&str; 2] = ["Not Available", "unknown"];

/// True for empty fields and for the known null markers.
pub fn is_null_marker(raw: &str) -> bool {
    raw.is_empty() || NULL_MARKERS.contains(&raw)
}

/// Lowercase and replace spaces with underscores. Idempotent.
pub fn normalize_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Narrowest type every non-null value fits: Int64, then Float64, else Utf8.
/// A column without any values is Utf8.
pub fn infer_dtype<'a, I>(values: I) -> DataType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen_any = false;
    let mut all_int = true;
    let mut all_float = true;
    for v in values.into_iter().flatten() {
        seen_any = true;
        let v = v.trim();
        if all_int && v.parse::<i64>().is_err() {
            all_int = false;
        }
        // NaN/inf spellings still count as numeric; they load as null
        if v.parse::<f64>().is_err() {
            all_float = false;
            break;
        }
    }
    match (seen_any, all_int, all_float) {
        (true, true, _) => DataType::Int64,
        (true, false, true) => DataType::Float64,
        _ => DataType::Utf8,
    }
}

/// Parse a float, treating NaN and infinities as missing.
pub fn parse_finite_f64(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Replace the column called `name`, or append it when absent.
pub fn set_column(
    batch: &RecordBatch,
    name: &str,
    array: ArrayRef,
) -> Result<RecordBatch, ArrowError> {
    let field = Arc::new(Field::new(name, array.data_type().clone(), true));
    let mut fields: Vec<_> = batch.schema().fields().iter().cloned().collect();
    let mut columns = batch.columns().to_vec();

    match batch.schema().index_of(name) {
        Ok(idx) => {
            fields[idx] = field;
            columns[idx] = array;
        }
        Err(_) => {
            fields.push(field);
            columns.push(array);
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}
