// src/process/derive.rs

use crate::error::{PipelineError, Result, Stage};
use crate::process::utils::set_column;
use arrow::{
    array::{Array, ArrayRef, Float64Array},
    compute::{
        cast,
        kernels::numeric::{mul, sub},
    },
    datatypes::DataType,
    error::ArrowError,
    record_batch::RecordBatch,
};
use tracing::{debug, instrument};

pub const LIST_PRICE: &str = "list_price";
pub const COST_PRICE: &str = "cost_price";
pub const DISCOUNT_PERCENT: &str = "discount_percent";
pub const DISCOUNT: &str = "discount";
pub const SALE_PRICE: &str = "sale_price";
pub const PROFIT: &str = "profit";

/// Add `discount`, `sale_price` and `profit`:
///
/// ```text
/// discount   = list_price * discount_percent * 0.01
/// sale_price = list_price - discount
/// profit     = sale_price - cost_price
/// ```
///
/// Inputs are widened to Float64; a null in any input gives a null result for that row.
#[instrument(level = "info", skip_all, fields(rows = batch.num_rows()))]
pub fn add_calculated_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let list_price = numeric_column(batch, LIST_PRICE)?;
    let discount_percent = numeric_column(batch, DISCOUNT_PERCENT)?;
    let cost_price = numeric_column(batch, COST_PRICE)?;

    let gross = mul(&list_price, &discount_percent).map_err(kernel_err(DISCOUNT))?;
    let discount =
        mul(&gross, &Float64Array::new_scalar(0.01)).map_err(kernel_err(DISCOUNT))?;
    let sale_price = sub(&list_price, &discount).map_err(kernel_err(SALE_PRICE))?;
    let profit = sub(&sale_price, &cost_price).map_err(kernel_err(PROFIT))?;

    let mut out = batch.clone();
    for (name, array) in [(DISCOUNT, discount), (SALE_PRICE, sale_price), (PROFIT, profit)] {
        out = set_column(&out, name, array).map_err(kernel_err(name))?;
    }
    debug!(columns = out.num_columns(), "calculated columns added");
    Ok(out)
}

fn kernel_err(column: &'static str) -> impl FnOnce(ArrowError) -> PipelineError {
    move |e| PipelineError::schema(Stage::Derive, column, e)
}

/// Fetch `name` as Float64, widening integer columns. A column holding only nulls
/// is accepted whatever its inferred type.
fn numeric_column(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::schema(Stage::Derive, name, "required column is missing"))?;

    let all_null = col.null_count() == col.len();
    match col.data_type() {
        DataType::Float64 => Ok(col.clone()),
        dt if dt.is_numeric() || all_null => {
            cast(col, &DataType::Float64).map_err(|e| PipelineError::schema(Stage::Derive, name, e))
        }
        other => Err(PipelineError::schema(
            Stage::Derive,
            name,
            format!("expected a numeric column, found {other}"),
        )),
    }
}
