// Key column names and the column helpers shared by every stage.
//
// Stages hold their data in polars `DataFrame`s. Raw sheets arrive with
// nullable String columns; the merge stage types them. The helpers here
// translate polars' lookup failures into `TableError::MissingColumn` so a
// renamed source column is reported by name.

use polars::prelude::*;
use thiserror::Error;

/// Season key column.
pub const YEAR: &str = "Year";
/// Player name key column.
pub const PLAYER: &str = "Player";
/// Team abbreviation column.
pub const TEAM: &str = "Tm";
/// Fantasy position column.
pub const POSITION: &str = "Position";

/// Scratch column holding the original row position across joins.
pub(crate) const ROW_INDEX: &str = "__row";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TableError {
    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),

    #[error("column `{column}` is {dtype}, expected a number")]
    NotNumeric { column: String, dtype: String },

    #[error("lookback depth must be at least 1, got {0}")]
    InvalidLookback(usize),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

pub fn require<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, TableError> {
    df.column(name)
        .map_err(|_| TableError::MissingColumn(name.to_string()))
}

pub fn require_all<S: AsRef<str>>(df: &DataFrame, names: &[S]) -> Result<(), TableError> {
    for name in names {
        require(df, name.as_ref())?;
    }
    Ok(())
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns().iter().map(|c| c.name().to_string()).collect()
}

/// Columns in the given order.
pub fn select<S: AsRef<str>>(df: &DataFrame, names: &[S]) -> Result<DataFrame, TableError> {
    require_all(df, names)?;
    let exprs: Vec<Expr> = names.iter().map(|n| col(n.as_ref())).collect();
    Ok(df.clone().lazy().select(exprs).collect()?)
}

/// Every column except `names`. Unknown names are an error.
pub fn drop_columns<S: AsRef<str>>(df: &DataFrame, names: &[S]) -> Result<DataFrame, TableError> {
    require_all(df, names)?;
    let kept: Vec<String> = column_names(df)
        .into_iter()
        .filter(|c| !names.iter().any(|n| n.as_ref() == c))
        .collect();
    select(df, &kept)
}

// ---------------------------------------------------------------------------
// Column values
// ---------------------------------------------------------------------------

/// Values of a column rendered as text; nulls stay `None`.
pub fn strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, TableError> {
    let column = require(df, name)?.cast(&DataType::String)?;
    let values = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Values of a column as numbers. Text that does not parse is `None`.
pub fn numbers(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, TableError> {
    let column = require(df, name)?.cast(&DataType::Float64)?;
    let values = column.as_materialized_series().f64()?.into_iter().collect();
    Ok(values)
}

/// Replace a column by `f` applied to its text values. Nulls stay null and
/// the column keeps its position.
pub fn map_text<F>(df: &DataFrame, name: &str, f: F) -> Result<DataFrame, TableError>
where
    F: Fn(&str) -> String,
{
    let mapped: Vec<Option<String>> = strings(df, name)?
        .into_iter()
        .map(|v| v.map(|s| f(&s)))
        .collect();
    let mut out = df.clone();
    out.with_column(Series::new(name.into(), mapped))?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Null-safe text equality: null compares unequal.
pub fn text_eq(name: &str, value: &str) -> Expr {
    col(name)
        .cast(DataType::String)
        .eq(lit(value))
        .fill_null(lit(false))
}

/// Numeric coercion: unparseable text, NaN and infinities become null.
pub fn to_number(name: &str) -> Expr {
    let value = col(name).cast(DataType::Float64);
    when(value.clone().is_finite())
        .then(value)
        .otherwise(lit(NULL))
        .alias(name)
}

/// Count of non-null cells per row.
pub fn present_count(df: &DataFrame) -> Expr {
    df.get_columns()
        .iter()
        .map(|c| col(c.name().as_str()).is_not_null().cast(DataType::UInt32))
        .reduce(|a, b| a + b)
        .unwrap_or_else(|| lit(0u32))
}

/// Fill nulls with zero: `"0"` in text columns, `0` elsewhere.
pub fn fill_missing_zero(df: &DataFrame) -> Result<DataFrame, TableError> {
    let fills: Vec<Expr> = df
        .get_columns()
        .iter()
        .map(|c| {
            let name = c.name().as_str();
            if c.dtype() == &DataType::String {
                col(name).fill_null(lit("0"))
            } else {
                col(name).fill_null(lit(0))
            }
        })
        .collect();
    Ok(df.clone().lazy().with_columns(fills).collect()?)
}
