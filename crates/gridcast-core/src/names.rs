// Player name normalization.
//
// Source tables decorate names with award markers (`*` Pro Bowl, `+` All-Pro)
// and generational suffixes that differ between sites, so names are reduced
// to a canonical form before any join on `Player`.

use std::collections::{BTreeMap, HashSet};

use polars::prelude::DataFrame;
use serde::Deserialize;

use crate::table::{map_text, TableError};

/// Characters stripped from every name.
const STRIPPED_CHARS: [char; 3] = ['*', '+', '.'];

/// Name rules as they appear in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NameRules {
    /// Exact raw-name replacements applied before any other cleanup.
    pub aliases: BTreeMap<String, String>,
    /// Tokens removed wherever they appear (compared case-insensitively).
    pub suffixes: Vec<String>,
}

impl Default for NameRules {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("Mitch Trubisky".to_string(), "Mitchell Trubisky".to_string());
        NameRules {
            aliases,
            suffixes: ["ii", "iii", "iv", "v", "jr"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Canonicalizes player names.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    aliases: BTreeMap<String, String>,
    suffixes: HashSet<String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        NameNormalizer::new(&NameRules::default())
    }
}

impl NameNormalizer {
    pub fn new(rules: &NameRules) -> Self {
        NameNormalizer {
            aliases: rules.aliases.clone(),
            suffixes: rules.suffixes.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Normalize a raw name: alias lookup, punctuation removal, whitespace
    /// collapse, then removal of every suffix token.
    pub fn normalize(&self, raw: &str) -> String {
        let name = self.aliases.get(raw).map(String::as_str).unwrap_or(raw);
        let stripped: String = name.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
        stripped
            .split_whitespace()
            .filter(|token| !self.suffixes.contains(&token.to_lowercase()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalize every name in column `name`. Numeric placeholders from
    /// malformed rows are rendered as text first; nulls stay null.
    pub fn normalize_column(&self, df: &DataFrame, name: &str) -> Result<DataFrame, TableError> {
        map_text(df, name, |raw| self.normalize(raw))
    }
}
