// Raw sheet cleanup: embedded header rows, player names, blank cells.

use polars::prelude::*;
use tracing::debug;

use crate::names::NameNormalizer;
use crate::table::{fill_missing_zero, require, text_eq, TableError, PLAYER};

/// Rank column; its header text repeats inside the sheet body every few
/// dozen rows.
pub const RANK: &str = "Rk";

/// Remove repeated header rows, normalize `Player`, and fill every missing
/// cell with zero. Retained rows keep their order.
pub fn clean_raw_table(df: &DataFrame, names: &NameNormalizer) -> Result<DataFrame, TableError> {
    require(df, RANK)?;
    require(df, PLAYER)?;
    let body = df
        .clone()
        .lazy()
        .filter(text_eq(RANK, RANK).not())
        .collect()?;
    debug!(
        "removed {} embedded header rows from {} rows",
        df.height() - body.height(),
        df.height()
    );
    let named = names.normalize_column(&body, PLAYER)?;
    fill_missing_zero(&named)
}
