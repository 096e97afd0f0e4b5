// Merge of the fantasy and scrimmage sheets into one wide season table.

use polars::prelude::*;
use tracing::{debug, info};

use crate::clean::clean_raw_table;
use crate::names::NameNormalizer;
use crate::schema::Schema;
use crate::table::{
    column_names, drop_columns, to_number, TableError, PLAYER, ROW_INDEX, YEAR,
};

/// Clean both sheets, drop their redundant columns, outer-join them on
/// (`Year`, `Player`), and type the columns: the schema's text columns as
/// strings, `Year` as an integer, every other column as a float.
///
/// Rows still holding a null afterwards (a player found on only one side, or
/// a value that failed numeric coercion) are dropped. Those rows are treated
/// as unreliable rather than as errors. Surviving rows keep the fantasy
/// sheet's order.
pub fn merge_fantasy_scrimmage(
    fantasy: &DataFrame,
    scrimmage: &DataFrame,
    schema: &Schema,
    names: &NameNormalizer,
) -> Result<DataFrame, TableError> {
    let fantasy = drop_columns(&clean_raw_table(fantasy, names)?, &schema.fantasy_drop)?;
    let scrimmage = drop_columns(&clean_raw_table(scrimmage, names)?, &schema.scrimmage_drop)?;

    let fantasy_columns = column_names(&fantasy);
    if let Some(shared) = column_names(&scrimmage)
        .into_iter()
        .find(|c| c != YEAR && c != PLAYER && fantasy_columns.contains(c))
    {
        return Err(TableError::DuplicateColumn(shared));
    }

    let keys = [col(YEAR), col(PLAYER)];
    let joined = keyed(&fantasy)?
        .with_row_index(ROW_INDEX, None)
        .join(
            keyed(&scrimmage)?,
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .sort(
            [ROW_INDEX],
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?
        .drop(ROW_INDEX)?;

    let typed: Vec<Expr> = column_names(&joined)
        .iter()
        .map(|c| {
            if schema.text_columns.contains(c) {
                col(c.as_str()).cast(DataType::String)
            } else if c == YEAR {
                col(c.as_str())
            } else {
                to_number(c)
            }
        })
        .collect();
    let typed = joined.lazy().select(typed).collect()?;
    let complete = typed.drop_nulls::<String>(None)?;

    debug!(
        "dropped {} unmatched or non-numeric rows after merge",
        typed.height() - complete.height()
    );
    info!(
        "Merged fantasy ({} rows) and scrimmage ({} rows) into {} rows, {} columns",
        fantasy.height(),
        scrimmage.height(),
        complete.height(),
        complete.width()
    );
    Ok(complete)
}

/// Join keys with one type on both sides: integer `Year`, string `Player`.
fn keyed(df: &DataFrame) -> Result<LazyFrame, TableError> {
    crate::table::require_all(df, &[YEAR, PLAYER])?;
    Ok(df.clone().lazy().with_columns([
        col(YEAR).cast(DataType::Int32),
        col(PLAYER).cast(DataType::String),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_io::read_table_from_reader;
    use crate::table::{numbers, strings};

    fn schema() -> Schema {
        Schema {
            fantasy_drop: vec!["Rk".into(), "VBD_G".into()],
            scrimmage_drop: vec!["Rk".into(), "Tm".into()],
            ..Schema::default()
        }
    }

    fn csv(text: &str) -> DataFrame {
        read_table_from_reader(text.as_bytes()).unwrap()
    }

    fn fantasy() -> DataFrame {
        csv("\
Rk,Player,Tm,Position,G,FantPt_G,PPR_G,VBD_G,Year
1,Christian McCaffrey*+,CAR,RB,16,21.1,29.2,7,2019
Rk,Player,Tm,Position,G,FantPt_G,PPR_G,VBD_G,Year
2,Lamar Jackson*,BAL,QB,15,27.7,27.7,6,2019
3,Only Fantasy,NYG,WR,10,8.0,11.0,,2019")
    }

    fn scrimmage() -> DataFrame {
        csv("\
Rk,Player,Tm,Touch,YScm,Year
1,Christian McCaffrey,CAR,403,2392,2019
2,Lamar Jackson,BAL,176,1206,2019
3,Only Scrimmage,DEN,20,n/a,2019")
    }

    fn merge(fantasy: &DataFrame, scrimmage: &DataFrame) -> DataFrame {
        merge_fantasy_scrimmage(fantasy, scrimmage, &schema(), &NameNormalizer::default()).unwrap()
    }

    fn players(df: &DataFrame) -> Vec<String> {
        strings(df, "Player").unwrap().into_iter().flatten().collect()
    }

    #[test]
    fn matched_rows_are_typed() {
        let merged = merge(&fantasy(), &scrimmage());

        assert_eq!(
            column_names(&merged),
            vec!["Player", "Tm", "Position", "G", "FantPt_G", "PPR_G", "Year", "Touch", "YScm"]
        );
        assert_eq!(players(&merged), vec!["Christian McCaffrey", "Lamar Jackson"]);
        assert_eq!(strings(&merged, "Tm").unwrap()[0].as_deref(), Some("CAR"));
        assert_eq!(numbers(&merged, "YScm").unwrap()[0], Some(2392.0));
        assert_eq!(merged.column("Year").unwrap().dtype(), &DataType::Int32);
        assert_eq!(merged.column("G").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn one_sided_rows_dropped() {
        let merged = merge(&fantasy(), &scrimmage());
        assert_eq!(merged.height(), 2);
        assert!(!players(&merged).contains(&"Only Fantasy".to_string()));
        assert!(!players(&merged).contains(&"Only Scrimmage".to_string()));
    }

    #[test]
    fn no_missing_cells() {
        let merged = merge(&fantasy(), &scrimmage());
        for column in merged.get_columns() {
            assert_eq!(column.null_count(), 0, "null in {}", column.name());
        }
    }

    #[test]
    fn non_finite_numbers_drop_the_row() {
        let fantasy = csv("\
Rk,Player,Tm,Position,G,FantPt_G,PPR_G,VBD_G,Year
1,Infinite Games,CAR,RB,inf,21.1,29.2,7,2019
2,Lamar Jackson,BAL,QB,15,27.7,27.7,6,2019
3,Negative Infinity,NYG,WR,16,-infinity,11.0,1,2019");
        let scrimmage = csv("\
Rk,Player,Tm,Touch,YScm,Year
1,Infinite Games,CAR,403,2392,2019
2,Lamar Jackson,BAL,176,1206,2019
3,Negative Infinity,NYG,20,100,2019");

        let merged = merge(&fantasy, &scrimmage);
        assert_eq!(players(&merged), vec!["Lamar Jackson"]);
        for column in ["G", "FantPt_G", "YScm"] {
            assert!(numbers(&merged, column).unwrap().iter().flatten().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn na_markers_are_zero_filled_not_dropped() {
        let fantasy = csv("\
Rk,Player,Tm,Position,G,FantPt_G,PPR_G,VBD_G,Year
1,Marker Player,CAR,RB,16,N/A,NaN,7,2019");
        let scrimmage = csv("\
Rk,Player,Tm,Touch,YScm,Year
1,Marker Player,CAR,NA,2392,2019");

        let merged = merge(&fantasy, &scrimmage);
        assert_eq!(merged.height(), 1);
        assert_eq!(numbers(&merged, "FantPt_G").unwrap(), vec![Some(0.0)]);
        assert_eq!(numbers(&merged, "PPR_G").unwrap(), vec![Some(0.0)]);
        assert_eq!(numbers(&merged, "Touch").unwrap(), vec![Some(0.0)]);
    }

    #[test]
    fn unknown_drop_column_is_error() {
        let bad = Schema {
            fantasy_drop: vec!["NotThere".into()],
            ..schema()
        };
        let err = merge_fantasy_scrimmage(&fantasy(), &scrimmage(), &bad, &NameNormalizer::default())
            .unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(c) if c == "NotThere"));
    }

    #[test]
    fn overlapping_columns_rejected() {
        let keep_team = Schema {
            scrimmage_drop: vec!["Rk".into()],
            ..schema()
        };
        let err = merge_fantasy_scrimmage(&fantasy(), &scrimmage(), &keep_team, &NameNormalizer::default())
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(c) if c == "Tm"));
    }
}
