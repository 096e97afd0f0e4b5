// Named column sets and inclusion thresholds.
//
// Every stage selects columns by name from here instead of by position, so a
// source sheet that gains or reorders columns fails loudly with a
// `MissingColumn` error rather than silently shifting features.

use serde::Deserialize;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Column layout of the source sheets and of the derived tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Schema {
    /// Columns removed from the fantasy sheet before merging.
    pub fantasy_drop: Vec<String>,
    /// Columns removed from the scrimmage sheet before merging.
    pub scrimmage_drop: Vec<String>,
    /// Identifier columns kept as text after merging; every other column is
    /// coerced to a number.
    pub text_columns: Vec<String>,
    /// Games-played column used by the eligibility floor.
    pub games_column: String,
    /// Historical statistics carried into the feature set (besides the key
    /// columns and `Tm`).
    pub stat_columns: Vec<String>,
    /// Per-game fantasy scoring columns (the outcome, never a feature).
    pub scoring_columns: Vec<String>,
    /// Scoring columns averaged into the target.
    pub target_columns: Vec<String>,
    /// Name of the target column.
    pub target_name: String,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            fantasy_drop: strings(&[
                "Rk",
                "REC_Y_R",
                "RSH_Y_A",
                "VBD_G",
                "PosRank_G",
                "OvRank_G",
                "Total_2PM_G",
                "Total_2PP_G",
            ]),
            scrimmage_drop: strings(&[
                "Rk", "Tm", "Age", "Pos", "G", "GS", "RSH_Y_G", "RSH_A_G", "REC_R_G", "REC_R_G.1",
                "RSH_Lng", "REC_Lng",
            ]),
            text_columns: strings(&["Player", "Tm", "Position"]),
            games_column: "G".to_string(),
            stat_columns: strings(&[
                "Age",
                "G",
                "GS",
                "PASS_Cmp",
                "PASS_Att",
                "PASS_Yds",
                "PASS_TD",
                "PASS_Int",
                "RSH_Att",
                "RSH_Yds",
                "RSH_TD",
                "REC_Tgt",
                "REC_Rec",
                "REC_Yds",
                "REC_TD",
                "FMB",
                "FL",
                "Total_TD",
                "RSH_1D",
                "REC_Ctch_Pct",
                "REC_1D",
                "REC_Y_G",
                "Touch",
                "Y_Tch",
                "YScm",
                "RRTD",
            ]),
            scoring_columns: strings(&["FantPt_G", "PPR_G", "DKPt_G", "FDPt_G"]),
            target_columns: strings(&["FantPt_G", "PPR_G"]),
            target_name: "HPPR_G".to_string(),
        }
    }
}

/// Row inclusion floors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum games played for a fantasy-eligible season.
    pub min_games: f64,
    /// The mean of the target columns must exceed this.
    pub min_scoring: f64,
    /// Rows of the history join with fewer non-missing cells are treated as
    /// rookies and dropped.
    pub min_non_missing: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            min_games: 8.0,
            min_scoring: 0.5,
            min_non_missing: 20,
        }
    }
}
