// Wiring from a loaded config to a pipeline run over files on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gridcast_core::csv_io::read_table;
use gridcast_core::combine::SeasonSource;
use gridcast_core::names::NameNormalizer;
use gridcast_core::pipeline::{self, PipelineOptions, PipelineSummary, RosterOptions};
use gridcast_core::teams::TeamCodes;
use tracing::info;

use crate::config::{Config, RawFormat};
use crate::files::{CsvDirSink, CsvSeasonSource, WorkbookSeasonSource};

/// Run summary written next to the outputs.
pub const SUMMARY_FILE: &str = "summary.json";

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Read the team mapping and optional roster, then assemble pipeline
/// options from `config`.
pub fn pipeline_options(config: &Config, base_dir: &Path) -> Result<PipelineOptions> {
    let team_path = resolve(base_dir, &config.paths.team_codes);
    let team_table = read_table(&team_path).context("failed to read team codes")?;
    let teams = TeamCodes::from_table(&team_table)
        .with_context(|| format!("invalid team codes in {}", team_path.display()))?;
    info!("Loaded {} team codes", teams.len());

    let roster = match &config.paths.roster {
        Some(path) => {
            let path = resolve(base_dir, path);
            let table = read_table(&path).context("failed to read roster")?;
            info!("Loaded roster of {} players from {}", table.height(), path.display());
            Some(RosterOptions {
                roster: table,
                season: config.roster_season(),
                lookback: config.datasets.roster_lookback,
            })
        }
        None => None,
    };

    Ok(PipelineOptions {
        start_year: config.seasons.start,
        end_year: config.seasons.end,
        lookback_depths: config.datasets.lookback_depths.clone(),
        schema: config.schema.clone(),
        thresholds: config.filters.clone(),
        names: NameNormalizer::new(&config.names),
        teams,
        roster,
    })
}

/// Run the pipeline described by `config`, writing every table and a JSON
/// summary into the configured output directory.
pub fn run(config: &Config, base_dir: &Path) -> Result<PipelineSummary> {
    let options = pipeline_options(config, base_dir)?;
    let raw_dir = resolve(base_dir, &config.paths.raw_dir);
    let source: Box<dyn SeasonSource> = match config.paths.raw_format {
        RawFormat::Csv => Box::new(CsvSeasonSource::new(raw_dir)),
        RawFormat::Xlsx => Box::new(WorkbookSeasonSource::new(raw_dir)),
    };
    let mut sink = CsvDirSink::new(resolve(base_dir, &config.paths.output_dir));

    let summary = pipeline::run(&options, source.as_ref(), &mut sink)?;

    let summary_path = sink.dir().join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
    std::fs::write(&summary_path, json)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    info!("Summary written to {}", summary_path.display());

    Ok(summary)
}
