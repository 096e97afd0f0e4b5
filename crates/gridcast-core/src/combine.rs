// Per-season sheet loading and concatenation.

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

use crate::table::YEAR;

/// Supplies one raw sheet per (dataset, season), e.g. `("fantasy", 2019)`.
pub trait SeasonSource {
    fn season(&self, dataset: &str, year: i32) -> Result<DataFrame>;
}

/// Load every season of `dataset` from `start` to `end` inclusive, tag each
/// row with its `Year`, and stack them in season order. Columns are the
/// union of every sheet's columns; a sheet lacking one gets nulls. A season
/// the source cannot supply aborts the whole load.
pub fn combine_seasons(
    source: &dyn SeasonSource,
    dataset: &str,
    start: i32,
    end: i32,
) -> Result<DataFrame> {
    let mut seasons = Vec::new();
    for year in start..=end {
        let mut sheet = source
            .season(dataset, year)
            .with_context(|| format!("failed to load {dataset} season {year}"))?;
        let tag = Series::new(YEAR.into(), vec![year; sheet.height()]);
        sheet.with_column(tag)?;
        seasons.push(sheet.lazy());
    }
    let count = seasons.len();
    let combined = concat_lf_diagonal(seasons, UnionArgs::default())?
        .collect()
        .with_context(|| format!("failed to stack {dataset} seasons"))?;
    info!(
        "Combined {} {} seasons ({}-{}): {} rows, {} columns",
        count,
        dataset,
        start,
        end,
        combined.height(),
        combined.width()
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{column_names, numbers, strings};
    use polars::df;
    use std::collections::HashMap;

    struct Sheets(HashMap<(String, i32), DataFrame>);

    impl SeasonSource for Sheets {
        fn season(&self, dataset: &str, year: i32) -> Result<DataFrame> {
            self.0
                .get(&(dataset.to_string(), year))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no sheet {dataset}/{year}"))
        }
    }

    fn sheet(players: &[&str]) -> DataFrame {
        let ranks: Vec<String> = (1..=players.len()).map(|i| i.to_string()).collect();
        df!("Rk" => ranks, "Player" => players).unwrap()
    }

    #[test]
    fn seasons_stacked_in_order_with_year() {
        let mut sheets = HashMap::new();
        sheets.insert(("fantasy".to_string(), 2000), sheet(&["A", "B"]));
        sheets.insert(("fantasy".to_string(), 2001), sheet(&["C"]));
        let combined = combine_seasons(&Sheets(sheets), "fantasy", 2000, 2001).unwrap();

        assert_eq!(combined.height(), 3);
        assert_eq!(
            numbers(&combined, "Year").unwrap(),
            vec![Some(2000.0), Some(2000.0), Some(2001.0)]
        );
        assert_eq!(strings(&combined, "Player").unwrap()[2].as_deref(), Some("C"));
    }

    #[test]
    fn column_union_fills_nulls() {
        let mut sheets = HashMap::new();
        sheets.insert(("scrimmage".to_string(), 2000), sheet(&["A"]));
        let wider = df!("Rk" => ["1"], "Player" => ["B"], "Touch" => ["300"]).unwrap();
        sheets.insert(("scrimmage".to_string(), 2001), wider);
        let combined = combine_seasons(&Sheets(sheets), "scrimmage", 2000, 2001).unwrap();

        assert_eq!(column_names(&combined), vec!["Rk", "Player", "Year", "Touch"]);
        assert_eq!(
            strings(&combined, "Touch").unwrap(),
            vec![None, Some("300".to_string())]
        );
    }

    #[test]
    fn missing_season_fails() {
        let mut sheets = HashMap::new();
        sheets.insert(("fantasy".to_string(), 2000), sheet(&["A"]));
        let err = combine_seasons(&Sheets(sheets), "fantasy", 2000, 2001).unwrap_err();
        assert!(err.to_string().contains("fantasy season 2001"));
    }

    #[test]
    fn existing_year_column_overwritten() {
        let mut sheets = HashMap::new();
        let with_year = df!("Rk" => ["1"], "Player" => ["A"], "Year" => [1999]).unwrap();
        sheets.insert(("scrimmage".to_string(), 2005), with_year);
        let combined = combine_seasons(&Sheets(sheets), "scrimmage", 2005, 2005).unwrap();
        assert_eq!(combined.width(), 3);
        assert_eq!(numbers(&combined, "Year").unwrap(), vec![Some(2005.0)]);
    }
}
