// Split of the season table into fantasy outcomes and historical statistics.

use polars::prelude::*;
use tracing::info;

use crate::schema::{Schema, Thresholds};
use crate::table::{require, require_all, select, text_eq, TableError, PLAYER, POSITION, TEAM, YEAR};

/// Fantasy outcomes and statistics derived from one season table.
#[derive(Debug, Clone)]
pub struct SplitTables {
    /// `Year, Player, Tm, Position` plus the scoring columns, restricted to
    /// fantasy-eligible seasons.
    pub fantasy: DataFrame,
    /// `Year, Player, Tm` plus the statistic columns, for every season.
    pub stats: DataFrame,
}

/// Row-wise mean of the target scoring columns.
pub fn target_score(schema: &Schema) -> Expr {
    let n = schema.target_columns.len().max(1) as f64;
    schema
        .target_columns
        .iter()
        .map(|c| col(c.as_str()).cast(DataType::Float64))
        .reduce(|a, b| a + b)
        .map(|sum| sum / lit(n))
        .unwrap_or_else(|| lit(NULL).cast(DataType::Float64))
}

/// Whether a season clears both the games-played and the scoring floor.
/// Null values fail.
pub fn meets_floors(schema: &Schema, thresholds: &Thresholds) -> Expr {
    col(schema.games_column.as_str())
        .cast(DataType::Float64)
        .gt_eq(lit(thresholds.min_games))
        .and(target_score(schema).gt(lit(thresholds.min_scoring)))
        .fill_null(lit(false))
}

/// A position holding the zero placeholder left by missing-value filling.
pub fn unresolved_position() -> Expr {
    text_eq(POSITION, "0")
}

fn require_floor_columns(df: &DataFrame, schema: &Schema) -> Result<(), TableError> {
    require(df, &schema.games_column)?;
    require_all(df, &schema.target_columns)
}

/// Partition the deduplicated season table. The fantasy side is filtered by
/// the floors; the statistics side is not, since a season that missed the
/// scoring cut is still valid history for the following years.
pub fn split_fantasy_stats(
    df: &DataFrame,
    schema: &Schema,
    thresholds: &Thresholds,
) -> Result<SplitTables, TableError> {
    require_floor_columns(df, schema)?;

    let mut fantasy_columns: Vec<&str> = vec![YEAR, PLAYER, TEAM, POSITION];
    fantasy_columns.extend(schema.scoring_columns.iter().map(String::as_str));
    let eligible = df
        .clone()
        .lazy()
        .filter(meets_floors(schema, thresholds))
        .collect()?;
    let fantasy = select(&eligible, &fantasy_columns)?;

    let mut stat_columns: Vec<&str> = vec![YEAR, PLAYER, TEAM];
    stat_columns.extend(schema.stat_columns.iter().map(String::as_str));
    let stats = select(df, &stat_columns)?;

    info!(
        "Split {} seasons into {} fantasy-eligible rows and {} stat rows",
        df.height(),
        fantasy.height(),
        stats.height()
    );
    Ok(SplitTables { fantasy, stats })
}

/// Every season that clears the floors and has a resolved position, with
/// all columns kept. This is the zero-lookback view of the data.
pub fn eligible_seasons(
    df: &DataFrame,
    schema: &Schema,
    thresholds: &Thresholds,
) -> Result<DataFrame, TableError> {
    require_floor_columns(df, schema)?;
    require(df, POSITION)?;
    let eligible = df
        .clone()
        .lazy()
        .filter(meets_floors(schema, thresholds).and(unresolved_position().not()))
        .collect()?;
    Ok(eligible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{column_names, numbers, strings};
    use polars::df;

    fn schema() -> Schema {
        Schema {
            stat_columns: vec!["Age".into(), "G".into(), "RSH_Yds".into()],
            ..Schema::default()
        }
    }

    type Season = (&'static str, &'static str, f64, f64, f64);

    fn table() -> DataFrame {
        let rows: [Season; 6] = [
            ("Starter", "RB", 16.0, 10.0, 14.0),
            ("Short Season", "RB", 7.0, 10.0, 14.0),
            ("Exactly Eight", "WR", 8.0, 5.0, 7.0),
            ("Low Scorer", "TE", 16.0, 0.2, 0.8),
            ("Boundary", "TE", 16.0, 0.5, 0.5),
            ("No Position", "0", 16.0, 10.0, 14.0),
        ];
        let n = rows.len();
        df!(
            "Player" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            "Tm" => vec!["NWE"; n],
            "Position" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            "Year" => vec![2019; n],
            "Age" => vec![25.0; n],
            "G" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            "RSH_Yds" => vec![400.0; n],
            "FantPt_G" => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
            "PPR_G" => rows.iter().map(|r| r.4).collect::<Vec<_>>(),
            "DKPt_G" => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
            "FDPt_G" => rows.iter().map(|r| r.3).collect::<Vec<_>>()
        )
        .unwrap()
    }

    fn players(df: &DataFrame) -> Vec<String> {
        strings(df, "Player").unwrap().into_iter().flatten().collect()
    }

    #[test]
    fn fantasy_side_applies_floors() {
        let split = split_fantasy_stats(&table(), &schema(), &Thresholds::default()).unwrap();
        assert_eq!(
            players(&split.fantasy),
            vec!["Starter", "Exactly Eight", "No Position"]
        );
        assert_eq!(
            column_names(&split.fantasy),
            vec!["Year", "Player", "Tm", "Position", "FantPt_G", "PPR_G", "DKPt_G", "FDPt_G"]
        );
    }

    #[test]
    fn stats_side_keeps_every_row() {
        let split = split_fantasy_stats(&table(), &schema(), &Thresholds::default()).unwrap();
        assert_eq!(split.stats.height(), 6);
        assert_eq!(
            column_names(&split.stats),
            vec!["Year", "Player", "Tm", "Age", "G", "RSH_Yds"]
        );
    }

    #[test]
    fn eligible_excludes_unresolved_position() {
        let eligible = eligible_seasons(&table(), &schema(), &Thresholds::default()).unwrap();
        assert_eq!(players(&eligible), vec!["Starter", "Exactly Eight"]);
        assert_eq!(eligible.width(), table().width());
    }

    #[test]
    fn missing_stat_column_is_error() {
        let bad = Schema {
            stat_columns: vec!["Nope".into()],
            ..schema()
        };
        let err = split_fantasy_stats(&table(), &bad, &Thresholds::default()).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(c) if c == "Nope"));
    }

    #[test]
    fn target_score_is_mean_of_targets() {
        let scores = table()
            .lazy()
            .select([target_score(&schema()).alias("score")])
            .collect()
            .unwrap();
        assert_eq!(numbers(&scores, "score").unwrap()[0], Some(12.0));
    }

    #[test]
    fn null_games_fail_the_floor() {
        let df = df!(
            "G" => [None, Some(16.0)],
            "FantPt_G" => [10.0, 10.0],
            "PPR_G" => [14.0, 14.0]
        )
        .unwrap();
        let kept = df
            .lazy()
            .filter(meets_floors(&schema(), &Thresholds::default()))
            .collect()
            .unwrap();
        assert_eq!(kept.height(), 1);
    }

    #[test]
    fn unresolved_position_detection() {
        let df = df!("Position" => [Some("0"), Some("QB"), None]).unwrap();
        let flags = df
            .lazy()
            .select([unresolved_position().alias("flag")])
            .collect()
            .unwrap();
        assert_eq!(
            strings(&flags, "flag").unwrap(),
            vec![Some("true".to_string()), Some("false".to_string()), Some("false".to_string())]
        );
    }
}
