// Team abbreviation to canonical team name mapping.

use std::collections::HashMap;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::table::{require, strings, TableError, TEAM};

/// Canonical team name column of the mapping table.
pub const CANONICAL_TEAM: &str = "Team";

/// Lookup from a raw abbreviation (`Tm`) to a canonical name (`Team`).
#[derive(Debug, Clone, Default)]
pub struct TeamCodes {
    names: HashMap<String, String>,
}

impl TeamCodes {
    /// Build the mapping from a two-column `Tm`/`Team` frame. A repeated
    /// abbreviation keeps its last name.
    pub fn from_table(df: &DataFrame) -> Result<Self, TableError> {
        require(df, TEAM)?;
        require(df, CANONICAL_TEAM)?;
        let mut names = HashMap::new();
        for (code, name) in strings(df, TEAM)?.into_iter().zip(strings(df, CANONICAL_TEAM)?) {
            let (Some(code), Some(name)) = (&code, &name) else {
                warn!(
                    "skipping incomplete team mapping row: '{}' -> '{}'",
                    code.as_deref().unwrap_or_default(),
                    name.as_deref().unwrap_or_default()
                );
                continue;
            };
            let code = code.trim().to_string();
            if names.contains_key(&code) {
                warn!("duplicate team mapping for '{}', using latest value", code);
            }
            names.insert(code, name.trim().to_string());
        }
        Ok(TeamCodes { names })
    }

    pub fn canonical(&self, code: &str) -> Option<&str> {
        self.names.get(code.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Replace the `Tm` abbreviations with canonical names. Every row is
    /// kept and an abbreviation with no mapping becomes null. The renamed
    /// `Tm` moves to the first column, where a right join of the mapping
    /// onto the frame puts it.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, TableError> {
        let renamed: Vec<Option<String>> = strings(df, TEAM)?
            .into_iter()
            .map(|code| code.and_then(|c| self.canonical(&c).map(str::to_string)))
            .collect();
        let unmapped = renamed.iter().filter(|n| n.is_none()).count();
        if unmapped > 0 {
            debug!("{} rows have a team code with no canonical name", unmapped);
        }

        let mut columns = vec![Column::new(TEAM.into(), renamed)];
        columns.extend(
            df.get_columns()
                .iter()
                .filter(|c| c.name().as_str() != TEAM)
                .cloned(),
        );
        Ok(DataFrame::new(columns)?)
    }
}
