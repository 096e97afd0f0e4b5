// History join: pairs each target season with the statistics of the
// player's previous seasons.
//
// For lookback N the statistics table is shifted forward 1..=N seasons and
// left-joined onto the target rows, so a row for (player, Y) gains the
// columns of (player, Y-1) suffixed `-1`, of (player, Y-2) suffixed `-2`,
// and so on. `Tm-n` is replaced by a same-team flag.

use polars::prelude::*;
use tracing::{debug, info};

use crate::split::unresolved_position;
use crate::table::{
    column_names, fill_missing_zero, present_count, require, require_all, TableError, PLAYER,
    POSITION, ROW_INDEX, TEAM, YEAR,
};

/// Whether the join builds training rows or rows to predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Drop the first N seasons of the data, which cannot have a full
    /// N-season history.
    Training,
    /// Keep every target row, however little history it has.
    Inference,
}

/// Name of column `name` as drawn from `offset` seasons back.
pub fn offset_column(name: &str, offset: usize) -> String {
    format!("{name}-{offset}")
}

/// Join up to `lookback` seasons of statistics onto `targets`.
///
/// `targets` needs `Year`, `Player` and `Tm`; `stats` needs `Year`, `Player`,
/// `Tm` plus any number of statistic columns. Rows without a partner season
/// get nulls for that offset and a `Tm-n` flag of 0. Target rows keep their
/// order.
pub fn join_history(
    lookback: usize,
    targets: &DataFrame,
    stats: &DataFrame,
    mode: JoinMode,
) -> Result<DataFrame, TableError> {
    if lookback == 0 {
        return Err(TableError::InvalidLookback(lookback));
    }
    require_all(targets, &[YEAR, PLAYER, TEAM])?;
    require_all(stats, &[YEAR, PLAYER, TEAM])?;

    let mut joined = keyed(targets).with_row_index(ROW_INDEX, None);
    if mode == JoinMode::Training {
        joined = joined.filter(col(YEAR).gt_eq(col(YEAR).min() + lit(lookback as i32)));
    }

    let mut columns = column_names(targets);
    for offset in 1..=lookback {
        let shifted = shift_seasons(stats, offset);
        for name in column_names(stats) {
            if name == YEAR || name == PLAYER {
                continue;
            }
            let suffixed = offset_column(&name, offset);
            if columns.contains(&suffixed) {
                return Err(TableError::DuplicateColumn(suffixed));
            }
            columns.push(suffixed);
        }
        let keys = [col(YEAR), col(PLAYER)];
        joined = joined
            .join(shifted, keys.clone(), keys, JoinArgs::new(JoinType::Left))
            .with_column(same_team_flag(offset));
        debug!("queued offset {}: {} columns", offset, columns.len());
    }

    let joined = joined
        .sort([ROW_INDEX], SortMultipleOptions::default().with_maintain_order(true))
        .collect()?
        .drop(ROW_INDEX)?;

    info!(
        "History join (lookback {}, {:?}): {} target rows -> {} rows, {} columns",
        lookback,
        mode,
        targets.height(),
        joined.height(),
        joined.width()
    );
    Ok(joined)
}

/// Join keys typed the same on both sides of every offset join.
fn keyed(df: &DataFrame) -> LazyFrame {
    df.clone().lazy().with_columns([
        col(YEAR).cast(DataType::Int32),
        col(PLAYER).cast(DataType::String),
        col(TEAM).cast(DataType::String),
    ])
}

/// Relabel season Y statistics as season Y + offset and suffix every
/// non-key column with the offset.
fn shift_seasons(stats: &DataFrame, offset: usize) -> LazyFrame {
    let relabeled: Vec<Expr> = column_names(stats)
        .iter()
        .map(|name| match name.as_str() {
            YEAR => col(YEAR) + lit(offset as i32),
            PLAYER => col(PLAYER),
            other => col(other).alias(offset_column(other, offset)),
        })
        .collect();
    keyed(stats).select(relabeled)
}

/// `Tm-offset` as 1 when it equals the target `Tm`, else 0.
fn same_team_flag(offset: usize) -> Expr {
    let past = offset_column(TEAM, offset);
    when(col(TEAM).eq(col(past.as_str())).fill_null(lit(false)))
        .then(lit(1i32))
        .otherwise(lit(0i32))
        .alias(past)
}

/// Drop rows with fewer than `min_non_missing` populated cells (players
/// without enough history, typically rookies), zero-fill what remains, and
/// drop rows whose position is still the unresolved placeholder.
pub fn remove_rookies(df: &DataFrame, min_non_missing: usize) -> Result<DataFrame, TableError> {
    require(df, POSITION)?;
    let floor = u32::try_from(min_non_missing).unwrap_or(u32::MAX);
    let established = df
        .clone()
        .lazy()
        .filter(present_count(df).gt_eq(lit(floor)))
        .collect()?;
    let placed = fill_missing_zero(&established)?
        .lazy()
        .filter(unresolved_position().not())
        .collect()?;
    info!(
        "Rookie filter (min {} cells): {} rows -> {} rows",
        min_non_missing,
        df.height(),
        placed.height()
    );
    Ok(placed)
}
