// End-to-end dataset build.
//
// Stage order:
// 1. Combine the per-season scrimmage and fantasy sheets
// 2. Merge them and resolve duplicate player-seasons
// 3. Split into fantasy outcomes and statistics
// 4. Assemble one dataset per lookback depth
// 5. Optionally project an upcoming season's roster

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::combine::{combine_seasons, SeasonSource};
use crate::dataset::DatasetAssembler;
use crate::dedupe::resolve_duplicates;
use crate::history::JoinMode;
use crate::merge::merge_fantasy_scrimmage;
use crate::names::NameNormalizer;
use crate::roster::{project_roster, roster_targets};
use crate::schema::{Schema, Thresholds};
use crate::split::{eligible_seasons, split_fantasy_stats};
use crate::teams::TeamCodes;

/// Dataset name of the scrimmage sheets.
pub const SCRIMMAGE: &str = "scrimmage";
/// Dataset name of the fantasy sheets.
pub const FANTASY: &str = "fantasy";

/// Destination for the tables each stage produces.
pub trait TableSink {
    fn write(&mut self, name: &str, table: &DataFrame) -> Result<()>;
}

/// Sink that keeps every table in memory, keyed by output name.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: BTreeMap<String, DataFrame>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.tables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

impl TableSink for MemorySink {
    fn write(&mut self, name: &str, table: &DataFrame) -> Result<()> {
        self.tables.insert(name.to_string(), table.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output names
// ---------------------------------------------------------------------------

pub fn raw_output(dataset: &str, start: i32, end: i32) -> String {
    format!("{dataset}_{start}_{end}.csv")
}

pub const SEASONS_OUTPUT: &str = "stat_by_year.csv";

pub const ELIGIBLE_OUTPUT: &str = "0_years_stat_full.csv";

pub fn full_output(lookback: usize) -> String {
    format!("{lookback}_years_stat_full.csv")
}

pub fn features_output(lookback: usize) -> String {
    format!("{lookback}_years_x.csv")
}

pub fn target_output(lookback: usize) -> String {
    format!("{lookback}_years_y.csv")
}

pub fn roster_output(season: i32) -> String {
    format!("{season}_x.csv")
}

// ---------------------------------------------------------------------------
// Options and summary
// ---------------------------------------------------------------------------

/// Roster projection settings.
#[derive(Debug, Clone)]
pub struct RosterOptions {
    pub roster: DataFrame,
    pub season: i32,
    pub lookback: usize,
}

/// Everything the pipeline needs besides its source and sink.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub start_year: i32,
    pub end_year: i32,
    pub lookback_depths: Vec<usize>,
    pub schema: Schema,
    pub thresholds: Thresholds,
    pub names: NameNormalizer,
    pub teams: TeamCodes,
    pub roster: Option<RosterOptions>,
}

/// Row counts of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub lookback: usize,
    pub rows: usize,
    pub features: usize,
}

/// What a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub start_year: i32,
    pub end_year: i32,
    pub seasons: usize,
    pub eligible: usize,
    pub fantasy_rows: usize,
    pub stat_rows: usize,
    pub datasets: Vec<DatasetSummary>,
    pub roster_rows: Option<usize>,
    pub outputs: Vec<String>,
}

fn emit(
    sink: &mut dyn TableSink,
    outputs: &mut Vec<String>,
    name: String,
    table: &DataFrame,
) -> Result<()> {
    sink.write(&name, table)
        .with_context(|| format!("failed to write {name}"))?;
    outputs.push(name);
    Ok(())
}

/// Run every stage, writing each intermediate and final table to `sink`.
pub fn run(
    options: &PipelineOptions,
    source: &dyn SeasonSource,
    sink: &mut dyn TableSink,
) -> Result<PipelineSummary> {
    let (start, end) = (options.start_year, options.end_year);
    let mut outputs = Vec::new();

    // 1. Combine raw seasons
    let scrimmage = combine_seasons(source, SCRIMMAGE, start, end)?;
    emit(sink, &mut outputs, raw_output(SCRIMMAGE, start, end), &scrimmage)?;
    let fantasy = combine_seasons(source, FANTASY, start, end)?;
    emit(sink, &mut outputs, raw_output(FANTASY, start, end), &fantasy)?;

    // 2. Merge and deduplicate
    let merged = merge_fantasy_scrimmage(&fantasy, &scrimmage, &options.schema, &options.names)
        .context("failed to merge fantasy and scrimmage tables")?;
    let seasons = resolve_duplicates(&merged).context("failed to resolve duplicates")?;
    emit(sink, &mut outputs, SEASONS_OUTPUT.to_string(), &seasons)?;

    let eligible = eligible_seasons(&seasons, &options.schema, &options.thresholds)?;
    emit(sink, &mut outputs, ELIGIBLE_OUTPUT.to_string(), &eligible)?;

    // 3. Split
    let split = split_fantasy_stats(&seasons, &options.schema, &options.thresholds)
        .context("failed to split fantasy and stat columns")?;

    // 4. Per-depth datasets
    let assembler = DatasetAssembler::new(&options.schema, &options.thresholds, &options.teams);
    let mut datasets = Vec::new();
    for &lookback in &options.lookback_depths {
        let data = assembler
            .assemble(lookback, &split.fantasy, &split.stats, JoinMode::Training)
            .with_context(|| format!("failed to assemble {lookback}-season dataset"))?;
        emit(sink, &mut outputs, full_output(lookback), &data.full)?;
        emit(sink, &mut outputs, features_output(lookback), &data.features)?;
        emit(sink, &mut outputs, target_output(lookback), &data.target)?;
        datasets.push(DatasetSummary {
            lookback,
            rows: data.features.height(),
            features: data.features.width(),
        });
    }

    // 5. Roster projection
    let roster_rows = match &options.roster {
        Some(roster) => {
            let targets = roster_targets(&roster.roster, roster.season, &options.names)
                .context("failed to read roster")?;
            let projected = project_roster(
                &targets,
                &split.stats,
                roster.lookback,
                options.thresholds.min_non_missing,
            )
            .context("failed to project roster")?;
            emit(sink, &mut outputs, roster_output(roster.season), &projected)?;
            Some(projected.height())
        }
        None => None,
    };

    info!("Pipeline finished: {} tables written", outputs.len());
    Ok(PipelineSummary {
        start_year: start,
        end_year: end,
        seasons: seasons.height(),
        eligible: eligible.height(),
        fantasy_rows: split.fantasy.height(),
        stat_rows: split.stats.height(),
        datasets,
        roster_rows,
        outputs,
    })
}
