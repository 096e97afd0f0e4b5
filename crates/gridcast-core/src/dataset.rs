// Supervised dataset assembly: history join, rookie filter, team names,
// feature/target split.

use polars::prelude::*;
use tracing::info;

use crate::history::{join_history, remove_rookies, JoinMode};
use crate::schema::{Schema, Thresholds};
use crate::split::target_score;
use crate::table::{drop_columns, require, TableError};
use crate::teams::TeamCodes;

/// One lookback depth's worth of model data.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Every column, scoring included.
    pub full: DataFrame,
    /// `full` without the scoring columns.
    pub features: DataFrame,
    /// Single column: mean of the target scoring columns, row-aligned with
    /// `features`.
    pub target: DataFrame,
}

/// Builds datasets for any lookback depth from shared settings.
#[derive(Debug, Clone, Copy)]
pub struct DatasetAssembler<'a> {
    schema: &'a Schema,
    thresholds: &'a Thresholds,
    teams: &'a TeamCodes,
}

impl<'a> DatasetAssembler<'a> {
    pub fn new(schema: &'a Schema, thresholds: &'a Thresholds, teams: &'a TeamCodes) -> Self {
        DatasetAssembler {
            schema,
            thresholds,
            teams,
        }
    }

    pub fn assemble(
        &self,
        lookback: usize,
        fantasy: &DataFrame,
        stats: &DataFrame,
        mode: JoinMode,
    ) -> Result<Dataset, TableError> {
        let joined = join_history(lookback, fantasy, stats, mode)?;
        let established = remove_rookies(&joined, self.thresholds.min_non_missing)?;
        let full = self.teams.apply(&established)?;
        let features = drop_columns(&full, &self.schema.scoring_columns)?;
        let target = target_table(&full, self.schema)?;

        info!(
            "Assembled {}-season dataset: {} rows, {} features",
            lookback,
            features.height(),
            features.width()
        );
        Ok(Dataset {
            full,
            features,
            target,
        })
    }
}

/// Row-wise mean of the schema's target columns as a one-column frame.
pub fn target_table(df: &DataFrame, schema: &Schema) -> Result<DataFrame, TableError> {
    for name in &schema.target_columns {
        let dtype = require(df, name)?.dtype();
        if !(dtype.is_float() || dtype.is_integer()) {
            return Err(TableError::NotNumeric {
                column: name.clone(),
                dtype: dtype.to_string(),
            });
        }
    }
    let target = df
        .clone()
        .lazy()
        .select([target_score(schema).alias(schema.target_name.as_str())])
        .collect()?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{column_names, has_column, numbers, strings};
    use polars::df;

    fn fantasy() -> DataFrame {
        df!(
            "Year" => [2018, 2019, 2019],
            "Player" => ["A", "A", "Rookie"],
            "Tm" => ["NWE", "NWE", "KAN"],
            "Position" => ["RB", "RB", "WR"],
            "FantPt_G" => [10.0, 12.0, 8.0],
            "PPR_G" => [14.0, 16.0, 12.0],
            "DKPt_G" => [14.5, 16.5, 12.5],
            "FDPt_G" => [12.0, 14.0, 10.0]
        )
        .unwrap()
    }

    fn stats() -> DataFrame {
        df!(
            "Year" => [2017, 2018, 2019, 2019],
            "Player" => ["A", "A", "A", "Rookie"],
            "Tm" => ["NWE", "NWE", "NWE", "KAN"],
            "G" => [16.0, 15.0, 16.0, 16.0],
            "RSH_Yds" => [1000.0, 1100.0, 1200.0, 700.0]
        )
        .unwrap()
    }

    fn teams() -> TeamCodes {
        TeamCodes::from_table(&df!("Tm" => ["NWE"], "Team" => ["New England Patriots"]).unwrap())
            .unwrap()
    }

    #[test]
    fn features_and_target_aligned() {
        let schema = Schema::default();
        let thresholds = Thresholds {
            min_non_missing: 11,
            ..Thresholds::default()
        };
        let teams = teams();
        let data = DatasetAssembler::new(&schema, &thresholds, &teams)
            .assemble(1, &fantasy(), &stats(), JoinMode::Training)
            .unwrap();

        assert_eq!(data.full.height(), 1);
        assert_eq!(data.features.height(), data.target.height());
        assert_eq!(column_names(&data.target), vec!["HPPR_G"]);
        assert_eq!(numbers(&data.target, "HPPR_G").unwrap(), vec![Some(14.0)]);
        assert_eq!(column_names(&data.features)[0], "Tm");
        assert_eq!(
            strings(&data.features, "Tm").unwrap()[0].as_deref(),
            Some("New England Patriots")
        );
        for scoring in &schema.scoring_columns {
            assert!(!has_column(&data.features, scoring));
            assert!(has_column(&data.full, scoring));
        }
        assert_eq!(numbers(&data.features, "RSH_Yds-1").unwrap()[0], Some(1100.0));
    }

    #[test]
    fn target_is_mean_of_configured_columns() {
        let target = target_table(&fantasy(), &Schema::default()).unwrap();
        assert_eq!(
            numbers(&target, "HPPR_G").unwrap(),
            vec![Some(12.0), Some(14.0), Some(10.0)]
        );
    }

    #[test]
    fn target_rejects_text_scores() {
        let t = df!("FantPt_G" => ["n/a"], "PPR_G" => [3.0]).unwrap();
        let err = target_table(&t, &Schema::default()).unwrap_err();
        assert!(matches!(err, TableError::NotNumeric { column, .. } if column == "FantPt_G"));
    }
}
