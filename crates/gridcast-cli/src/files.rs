// Season sources (CSV directory or per-dataset workbooks) and the CSV
// directory sink.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use gridcast_core::combine::SeasonSource;
use gridcast_core::csv_io::{frame_from_rows, read_table, write_table};
use gridcast_core::pipeline::TableSink;
use polars::prelude::DataFrame;
use tracing::debug;

/// Reads season sheets laid out as `{root}/{dataset}/{year}.csv`.
#[derive(Debug, Clone)]
pub struct CsvSeasonSource {
    root: PathBuf,
}

impl CsvSeasonSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CsvSeasonSource { root: root.into() }
    }

    pub fn sheet_path(&self, dataset: &str, year: i32) -> PathBuf {
        self.root.join(dataset).join(format!("{year}.csv"))
    }
}

impl SeasonSource for CsvSeasonSource {
    fn season(&self, dataset: &str, year: i32) -> Result<DataFrame> {
        let path = self.sheet_path(dataset, year);
        let df = read_table(&path)?;
        debug!("read {} rows from {}", df.height(), path.display());
        Ok(df)
    }
}

/// Reads season sheets from one workbook per dataset,
/// `{root}/{dataset}.xlsx`, with one worksheet named after each season.
#[derive(Debug, Clone)]
pub struct WorkbookSeasonSource {
    root: PathBuf,
}

impl WorkbookSeasonSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WorkbookSeasonSource { root: root.into() }
    }

    pub fn workbook_path(&self, dataset: &str) -> PathBuf {
        self.root.join(format!("{dataset}.xlsx"))
    }
}

/// Text form of a worksheet cell; empty cells are blank.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

impl SeasonSource for WorkbookSeasonSource {
    fn season(&self, dataset: &str, year: i32) -> Result<DataFrame> {
        let path = self.workbook_path(dataset);
        let mut workbook = open_workbook_auto(&path)
            .with_context(|| format!("failed to open workbook {}", path.display()))?;
        let sheet = year.to_string();
        let range = workbook
            .worksheet_range(&sheet)
            .with_context(|| format!("no sheet '{sheet}' in {}", path.display()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(|c| cell_text(c).trim().to_string()).collect(),
            None => Vec::new(),
        };
        let df = frame_from_rows(&headers, rows.map(|row| row.iter().map(cell_text).collect()))
            .with_context(|| format!("malformed sheet '{sheet}' in {}", path.display()))?;
        debug!("read {} rows from {}[{}]", df.height(), path.display(), sheet);
        Ok(df)
    }
}

/// Writes every frame to `{dir}/{name}`.
#[derive(Debug, Clone)]
pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvDirSink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TableSink for CsvDirSink {
    fn write(&mut self, name: &str, df: &DataFrame) -> Result<()> {
        let path = self.dir.join(name);
        write_table(&path, df)?;
        debug!("wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcast_core::table::strings;
    use polars::df;
    use std::fs;

    #[test]
    fn source_reads_dataset_year_layout() {
        let tmp = std::env::temp_dir().join("gridcast_files_source");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("fantasy")).unwrap();
        fs::write(tmp.join("fantasy/2019.csv"), "Rk,Player\n1,A\n2,B\n").unwrap();

        let source = CsvSeasonSource::new(&tmp);
        let df = source.season("fantasy", 2019).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(strings(&df, "Player").unwrap()[1].as_deref(), Some("B"));

        let err = source.season("fantasy", 2018).unwrap_err();
        assert!(err.to_string().contains("2018.csv"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn workbook_path_per_dataset() {
        let source = WorkbookSeasonSource::new("data_raw");
        assert_eq!(
            source.workbook_path("scrimmage"),
            Path::new("data_raw").join("scrimmage.xlsx")
        );
    }

    #[test]
    fn missing_workbook_names_path() {
        let source = WorkbookSeasonSource::new("/nonexistent/gridcast");
        let err = source.season("fantasy", 2019).unwrap_err();
        assert!(format!("{err:#}").contains("fantasy.xlsx"));
    }

    #[test]
    fn worksheet_cells_as_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(16.0)), "16");
        assert_eq!(cell_text(&Data::Float(21.5)), "21.5");
        assert_eq!(cell_text(&Data::Int(2019)), "2019");
        assert_eq!(cell_text(&Data::String("Derrick Henry".into())), "Derrick Henry");
    }

    #[test]
    fn sink_writes_named_files() {
        let tmp = std::env::temp_dir().join("gridcast_files_sink");
        let _ = fs::remove_dir_all(&tmp);

        let df = df!("Player" => ["A", "B"], "G" => [Some(16), None]).unwrap();
        let mut sink = CsvDirSink::new(tmp.join("out"));
        sink.write("2_years_x.csv", &df).unwrap();

        let written = fs::read_to_string(tmp.join("out/2_years_x.csv")).unwrap();
        assert_eq!(written, "Player,G\nA,16\nB,\n");
        let _ = fs::remove_dir_all(&tmp);
    }
}
