// src/process/convert.rs

use crate::process::utils::{infer_dtype, parse_finite_f64};
use arrow::{
    array::{ArrayRef, Float64Builder, Int64Builder, StringArray},
    datatypes::DataType,
};
use std::sync::Arc;

/// Turn one column of raw (already null-substituted) cells into a typed Arrow array.
pub fn typed_column(values: &[Option<String>]) -> ArrayRef {
    let dtype = infer_dtype(values.iter().map(|v| v.as_deref()));
    match dtype {
        DataType::Int64 => {
            let mut b = Int64Builder::with_capacity(values.len());
            for v in values {
                b.append_option(v.as_deref().and_then(|s| s.trim().parse().ok()));
            }
            Arc::new(b.finish())
        }
        DataType::Float64 => {
            let mut b = Float64Builder::with_capacity(values.len());
            for v in values {
                b.append_option(v.as_deref().and_then(parse_finite_f64));
            }
            Arc::new(b.finish())
        }
        // Everything else stays text
        _ => Arc::new(values.iter().map(|v| v.as_deref()).collect::<StringArray>()),
    }
}
