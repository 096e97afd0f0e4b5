// Target rows for an upcoming season, built from a draft-rankings roster.
//
// The rankings export has no fantasy outcome yet, so the rows carry only
// `Tm, Year, Player, Position` and go through the history join in
// inference mode.

use polars::prelude::*;
use tracing::info;

use crate::history::{join_history, remove_rookies, JoinMode};
use crate::names::NameNormalizer;
use crate::table::{map_text, select, text_eq, TableError, PLAYER, POSITION, TEAM, YEAR};

/// Player name column of the rankings export.
pub const ROSTER_PLAYER: &str = "Overall";
/// Team column of the rankings export.
pub const ROSTER_TEAM: &str = "Team";
/// Position column of the rankings export (e.g. `RB12`).
pub const ROSTER_POSITION: &str = "Pos";

/// Team value for unsigned players.
const FREE_AGENT: &str = "FA";
/// Positions outside the model's scope.
const EXCLUDED_POSITIONS: [&str; 2] = ["K", "DST"];

/// Strip the positional rank from a position label: `RB12` -> `RB`.
fn strip_rank(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Convert a rankings export into target rows for `season`: signed,
/// non-kicker, non-defense players with normalized names.
pub fn roster_targets(
    roster: &DataFrame,
    season: i32,
    names: &NameNormalizer,
) -> Result<DataFrame, TableError> {
    let picked = select(roster, &[ROSTER_PLAYER, ROSTER_TEAM, ROSTER_POSITION])?;
    let positions = map_text(&picked, ROSTER_POSITION, strip_rank)?;

    let in_scope = EXCLUDED_POSITIONS
        .iter()
        .fold(text_eq(ROSTER_TEAM, FREE_AGENT).not(), |keep, excluded| {
            keep.and(text_eq(ROSTER_POSITION, excluded).not())
        });
    let shaped = positions
        .lazy()
        .filter(in_scope)
        .select([
            col(ROSTER_TEAM).cast(DataType::String).alias(TEAM),
            lit(season).alias(YEAR),
            col(ROSTER_PLAYER).cast(DataType::String).alias(PLAYER),
            col(ROSTER_POSITION).alias(POSITION),
        ])
        .collect()?;
    names.normalize_column(&shaped, PLAYER)
}

/// Join the roster's target rows with `lookback` seasons of history and
/// drop the players without enough of it.
pub fn project_roster(
    targets: &DataFrame,
    stats: &DataFrame,
    lookback: usize,
    min_non_missing: usize,
) -> Result<DataFrame, TableError> {
    let joined = join_history(lookback, targets, stats, JoinMode::Inference)?;
    let projected = remove_rookies(&joined, min_non_missing)?;
    info!(
        "Projected {} of {} roster players with {}-season history",
        projected.height(),
        targets.height(),
        lookback
    );
    Ok(projected)
}
