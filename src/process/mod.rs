// src/process/mod.rs

pub mod coerce;
pub mod convert;
pub mod date_parser;
pub mod derive;
pub mod inspect;
pub mod load;
pub mod prune;
pub mod utils;

pub use coerce::{coerce_date_column, ORDER_DATE};
pub use derive::add_calculated_columns;
pub use load::{load_csv, normalize_column_names};
pub use prune::drop_columns;
