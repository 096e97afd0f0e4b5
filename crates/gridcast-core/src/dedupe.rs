// Player-season duplicate resolution.
//
// A player traded mid-season can appear once per team. Each colliding
// (Player, Year) group collapses to its column-wise maximum. This is an
// approximation of a season total, not a sum: a 9-game + 7-game split
// reports G = 9.

use std::collections::HashMap;

use polars::prelude::*;
use tracing::{debug, info};

use crate::table::{column_names, strings, TableError, PLAYER, YEAR};

/// Return a frame with exactly one row per (`Player`, `Year`).
///
/// Rows that do not collide keep their relative order; each resolved group
/// is appended afterwards in (`Player`, `Year`) order.
pub fn resolve_duplicates(df: &DataFrame) -> Result<DataFrame, TableError> {
    let players = strings(df, PLAYER)?;
    let years = strings(df, YEAR)?;

    let mut sizes: HashMap<(&Option<String>, &Option<String>), usize> = HashMap::new();
    for key in players.iter().zip(&years) {
        *sizes.entry(key).or_default() += 1;
    }
    let colliding: BooleanChunked = players
        .iter()
        .zip(&years)
        .map(|key| sizes.get(&key).is_some_and(|&n| n > 1))
        .collect();
    if !colliding.any() {
        return Ok(df.clone());
    }

    let unique = df.filter(&!&colliding)?;
    let duplicated = df.filter(&colliding)?;
    let order: Vec<Expr> = column_names(df).iter().map(|c| col(c.as_str())).collect();
    let resolved = duplicated
        .lazy()
        .group_by([col(PLAYER), col(YEAR)])
        .agg([all().max()])
        .sort([PLAYER, YEAR], SortMultipleOptions::default())
        .select(order)
        .collect()?;
    debug!(
        "collapsed {} duplicate rows into {} player-seasons",
        df.height() - unique.height(),
        resolved.height()
    );

    let out = unique.vstack(&resolved)?;
    info!(
        "Resolved {} duplicate player-seasons ({} rows -> {} rows)",
        resolved.height(),
        df.height(),
        out.height()
    );
    Ok(out)
}
