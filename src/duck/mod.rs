// src/duck/mod.rs

mod types;

pub use types::{ConnectionDescriptor, Driver, InsertPolicy};

use crate::error::{PipelineError, Result};
use arrow::{
    array::{Array, ArrayRef, AsArray},
    datatypes::{DataType, Date32Type, Float64Type, Int64Type},
    record_batch::RecordBatch,
};
use duckdb::{appender_params_from_iter, types::Value, Connection};
use std::{collections::HashMap, path::Path, time::Instant};
use tracing::{debug, info, instrument};

/// Open a connection described by `desc`.
pub fn open_connection(desc: &ConnectionDescriptor) -> Result<Connection> {
    let fail = |reason: String| PipelineError::persistence(desc.to_string(), reason);
    match desc.driver {
        Driver::DuckDb => {
            if let Some(host) = &desc.host {
                return Err(fail(format!(
                    "duckdb is an embedded engine and cannot connect to host `{host}`"
                )));
            }
            let conn = if desc.is_in_memory() {
                Connection::open_in_memory()
            } else {
                Connection::open(Path::new(&desc.database))
            };
            conn.map_err(|e| fail(format!("connecting: {e}")))
        }
    }
}

/// Bulk-write `batch` into `table` through a connection that lives only for this call.
/// Returns the number of rows written.
#[instrument(level = "info", skip(batch, desc), fields(target = %desc, rows = batch.num_rows()))]
pub fn load_to_table(
    batch: &RecordBatch,
    table: &str,
    desc: &ConnectionDescriptor,
    policy: InsertPolicy,
) -> Result<usize> {
    let mut conn = open_connection(desc)?;
    let written = load_into(&mut conn, batch, table, policy)?;
    // conn drops here on both paths
    Ok(written)
}

/// Write every row of `batch` into `table` inside a single transaction.
///
/// `Replace` drops and recreates the table. `Append` creates it when absent and
/// otherwise requires the existing columns to be exactly the batch's columns (any
/// order). The batch carries no row index, so none is written.
pub fn load_into(
    conn: &mut Connection,
    batch: &RecordBatch,
    table: &str,
    policy: InsertPolicy,
) -> Result<usize> {
    let fail = |e: duckdb::Error| PipelineError::persistence(table, e);
    let start = Instant::now();
    let schema = batch.schema();
    let batch_columns: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();

    let tx = conn.transaction().map_err(fail)?;

    // Position of each table column within the batch.
    let order: Vec<usize> = match policy {
        InsertPolicy::Replace => {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
                .map_err(fail)?;
            tx.execute_batch(&create_table_sql(table, batch)?)
                .map_err(fail)?;
            (0..batch.num_columns()).collect()
        }
        InsertPolicy::Append => match table_columns(&tx, table)? {
            None => {
                tx.execute_batch(&create_table_sql(table, batch)?)
                    .map_err(fail)?;
                (0..batch.num_columns()).collect()
            }
            Some(existing) => column_order(table, &existing, &batch_columns)?,
        },
    };

    {
        let mut appender = tx.appender(table).map_err(fail)?;
        let columns: Vec<&ArrayRef> = order.iter().map(|&i| batch.column(i)).collect();
        for row in 0..batch.num_rows() {
            let values = columns
                .iter()
                .zip(&order)
                .map(|(col, &i)| cell_value(col, row, table, batch_columns[i]))
                .collect::<Result<Vec<Value>>>()?;
            appender.append_row(appender_params_from_iter(values)).map_err(fail)?;
        }
        appender.flush().map_err(fail)?;
    }
    tx.commit().map_err(fail)?;

    info!(
        table,
        policy = %policy,
        rows = batch.num_rows(),
        elapsed = ?start.elapsed(),
        "rows written"
    );
    Ok(batch.num_rows())
}

/// Row count of `table`.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |r| r.get(0),
    )
    .map_err(|e| PipelineError::persistence(table, e))
}

/// Column names of `table` in definition order, or `None` when it does not exist.
/// Names match case-insensitively, like DuckDB identifiers.
fn table_columns(conn: &Connection, table: &str) -> Result<Option<Vec<String>>> {
    let fail = |e: duckdb::Error| PipelineError::persistence(table, e);
    let mut stmt = conn
        .prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = current_schema() AND lower(table_name) = lower(?1) \
             ORDER BY ordinal_position",
        )
        .map_err(fail)?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))
        .map_err(fail)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(fail)?;
    debug!(table, columns = names.len(), "looked up existing table");
    Ok(if names.is_empty() { None } else { Some(names) })
}

/// Map the existing table's column order onto batch positions.
fn column_order(table: &str, existing: &[String], batch_columns: &[&str]) -> Result<Vec<usize>> {
    let positions: HashMap<&str, usize> = batch_columns
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i))
        .collect();
    let order: Option<Vec<usize>> = existing
        .iter()
        .map(|name| positions.get(name.as_str()).copied())
        .collect();
    match order {
        Some(order) if existing.len() == batch_columns.len() => Ok(order),
        _ => Err(PipelineError::persistence(
            table,
            format!(
                "schema mismatch: table has columns {existing:?}, dataset has {batch_columns:?}"
            ),
        )),
    }
}

fn create_table_sql(table: &str, batch: &RecordBatch) -> Result<String> {
    let columns = batch
        .schema()
        .fields()
        .iter()
        .map(|f| -> Result<String> {
            let ty = sql_type(table, f.name(), f.data_type())?;
            Ok(format!("{} {ty}", quote_ident(f.name())))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_ident(table),
        columns.join(", ")
    ))
}

fn sql_type(table: &str, column: &str, dt: &DataType) -> Result<&'static str> {
    match dt {
        DataType::Int64 => Ok("BIGINT"),
        DataType::Float64 => Ok("DOUBLE"),
        DataType::Date32 => Ok("DATE"),
        DataType::Utf8 => Ok("VARCHAR"),
        DataType::Boolean => Ok("BOOLEAN"),
        other => Err(unsupported(table, column, other)),
    }
}

fn cell_value(col: &ArrayRef, row: usize, table: &str, column: &str) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    Ok(match col.data_type() {
        DataType::Int64 => Value::BigInt(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => Value::Double(col.as_primitive::<Float64Type>().value(row)),
        DataType::Date32 => Value::Date32(col.as_primitive::<Date32Type>().value(row)),
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::Boolean => Value::Boolean(col.as_boolean().value(row)),
        other => return Err(unsupported(table, column, other)),
    })
}

fn unsupported(table: &str, column: &str, dt: &DataType) -> PipelineError {
    PipelineError::persistence(table, format!("column `{column}` has unsupported type {dt}"))
}

/// Double-quote an identifier, escaping embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
    use std::sync::Arc;

    fn orders(ids: Vec<i64>) -> RecordBatch {
        let n = ids.len();
        RecordBatch::try_from_iter([
            ("order_id", Arc::new(Int64Array::from(ids)) as ArrayRef),
            ("order_date", Arc::new(Date32Array::from(vec![19478; n])) as ArrayRef),
            (
                "ship_mode",
                Arc::new(StringArray::from(vec![Some("First Class"); n])) as ArrayRef,
            ),
            ("profit", Arc::new(Float64Array::from(vec![Some(50.0); n])) as ArrayRef),
        ])
        .unwrap()
    }

    fn ids(conn: &Connection, table: &str) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(&format!("SELECT order_id FROM {table} ORDER BY order_id"))?;
        let rows = stmt
            .query_map([], |r| r.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    #[test]
    fn append_keeps_old_rows() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        load_into(&mut conn, &orders(vec![1, 2]), "df_orders", InsertPolicy::Append)?;
        load_into(&mut conn, &orders(vec![3]), "df_orders", InsertPolicy::Append)?;
        assert_eq!(ids(&conn, "df_orders")?, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn replace_discards_old_rows() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        load_into(&mut conn, &orders(vec![1, 2]), "df_orders", InsertPolicy::Append)?;
        let written = load_into(&mut conn, &orders(vec![7]), "df_orders", InsertPolicy::Replace)?;
        assert_eq!(written, 1);
        assert_eq!(ids(&conn, "df_orders")?, vec![7]);
        assert_eq!(count_rows(&conn, "df_orders")?, 1);
        Ok(())
    }

    #[test]
    fn column_types_and_nulls() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        let batch = RecordBatch::try_from_iter([
            ("order_date", Arc::new(Date32Array::from(vec![Some(19478), None])) as ArrayRef),
            ("profit", Arc::new(Float64Array::from(vec![Some(50.0), None])) as ArrayRef),
        ])?;
        load_into(&mut conn, &batch, "typed", InsertPolicy::Replace)?;

        let (ty, date): (String, String) = conn.query_row(
            "SELECT typeof(order_date), CAST(order_date AS VARCHAR) FROM typed WHERE profit IS NOT NULL",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        assert_eq!(ty, "DATE");
        assert_eq!(date, "2023-05-01");

        let nulls: i64 = conn.query_row(
            "SELECT COUNT(*) FROM typed WHERE order_date IS NULL AND profit IS NULL",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(nulls, 1);
        Ok(())
    }

    #[test]
    fn append_matches_table_name_case_insensitively() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        load_into(&mut conn, &orders(vec![1]), "df_orders", InsertPolicy::Append)?;
        load_into(&mut conn, &orders(vec![2]), "DF_Orders", InsertPolicy::Append)?;
        assert_eq!(ids(&conn, "df_orders")?, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn append_reorders_to_existing_layout() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE df_orders (profit DOUBLE, ship_mode VARCHAR, order_date DATE, order_id BIGINT)",
        )?;
        load_into(&mut conn, &orders(vec![4]), "df_orders", InsertPolicy::Append)?;
        let (id, mode): (i64, String) = conn.query_row(
            "SELECT order_id, ship_mode FROM df_orders",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        assert_eq!((id, mode.as_str()), (4, "First Class"));
        Ok(())
    }

    #[test]
    fn append_with_different_columns_fails_and_keeps_table() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        load_into(&mut conn, &orders(vec![1]), "df_orders", InsertPolicy::Append)?;

        let other = RecordBatch::try_from_iter([(
            "order_id",
            Arc::new(Int64Array::from(vec![2])) as ArrayRef,
        )])?;
        let err = load_into(&mut conn, &other, "df_orders", InsertPolicy::Append).unwrap_err();
        assert!(matches!(err, PipelineError::Persistence { .. }));
        assert!(err.to_string().contains("schema mismatch"));
        assert_eq!(ids(&conn, "df_orders")?, vec![1]);
        Ok(())
    }

    #[test]
    fn embedded_driver_rejects_host() {
        let desc = ConnectionDescriptor {
            host: Some("db.internal".into()),
            ..ConnectionDescriptor::in_memory()
        };
        let err = open_connection(&desc).unwrap_err();
        assert!(err.to_string().contains("embedded"));
    }

    #[test]
    fn file_database_persists_between_connections() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let desc = ConnectionDescriptor {
            database: dir.path().join("orders.duckdb").display().to_string(),
            ..ConnectionDescriptor::default()
        };
        load_to_table(&orders(vec![1, 2]), "df_orders", &desc, InsertPolicy::Replace)?;
        load_to_table(&orders(vec![3]), "df_orders", &desc, InsertPolicy::Append)?;

        let conn = open_connection(&desc)?;
        assert_eq!(count_rows(&conn, "df_orders")?, 3);
        Ok(())
    }
}
