//! CSV Data Loader Module
//! Strict row-by-row parsing of the athlete-event and NOC region tables.

use super::model::{AthleteEvent, Medal, NocRegion, Season, Sex};
use csv::StringRecord;
use std::collections::HashSet;
use std::fmt::Display;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Column layout of `athlete_events.csv`.
pub const ATHLETE_COLUMNS: [&str; 15] = [
    "ID", "Name", "Sex", "Age", "Height", "Weight", "Team", "NOC", "Games", "Year", "Season",
    "City", "Sport", "Event", "Medal",
];

/// Column layout of `noc_regions.csv`.
pub const REGION_COLUMNS: [&str; 3] = ["NOC", "region", "notes"];

/// A single malformed cell or row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("row {row}, column {column}: {reason} (value: '{value}')")]
pub struct ParseError {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub column: String,
    pub value: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unexpected header: expected [{expected}], found [{found}]")]
    HeaderMismatch { expected: String, found: String },
    #[error("Malformed input at {0}")]
    Parse(#[from] ParseError),
}

/// Parses the two input tables into typed records.
///
/// Missing cells (`NA` or empty) in nullable columns become `None`. Anything
/// else that does not fit the column type aborts the load.
pub struct DataLoader;

impl DataLoader {
    /// Load `athlete_events.csv` from disk.
    pub fn load_athlete_events(path: impl AsRef<Path>) -> Result<Vec<AthleteEvent>, LoaderError> {
        let path = path.as_ref();
        let events = Self::read_athlete_events(Self::open(path)?)?;
        info!(path = %path.display(), rows = events.len(), "loaded athlete events");
        Ok(events)
    }

    /// Load `noc_regions.csv` from disk.
    pub fn load_noc_regions(path: impl AsRef<Path>) -> Result<Vec<NocRegion>, LoaderError> {
        let path = path.as_ref();
        let regions = Self::read_noc_regions(Self::open(path)?)?;
        info!(path = %path.display(), rows = regions.len(), "loaded NOC regions");
        Ok(regions)
    }

    pub fn read_athlete_events<R: Read>(reader: R) -> Result<Vec<AthleteEvent>, LoaderError> {
        let mut csv = Self::reader(reader);
        Self::check_header(csv.headers()?, &ATHLETE_COLUMNS)?;

        let mut events = Vec::new();
        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            let row = RowParser::new(idx + 1, &record, &ATHLETE_COLUMNS)?;
            events.push(AthleteEvent {
                id: row.required(0)?,
                name: row.text(1)?,
                sex: row.required::<Sex>(2)?,
                age: row.optional(3)?,
                height: row.real(4)?,
                weight: row.real(5)?,
                team: row.text(6)?,
                noc: row.noc(7)?,
                games: row.text(8)?,
                year: row.required(9)?,
                season: row.required::<Season>(10)?,
                city: row.text(11)?,
                sport: row.text(12)?,
                event: row.text(13)?,
                medal: row.optional::<Medal>(14)?,
            });
        }

        debug!(rows = events.len(), "parsed athlete-event table");
        Ok(events)
    }

    pub fn read_noc_regions<R: Read>(reader: R) -> Result<Vec<NocRegion>, LoaderError> {
        let mut csv = Self::reader(reader);
        Self::check_header(csv.headers()?, &REGION_COLUMNS)?;

        let mut seen = HashSet::new();
        let mut regions = Vec::new();
        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            let row = RowParser::new(idx + 1, &record, &REGION_COLUMNS)?;
            let noc = row.noc(0)?;
            if !seen.insert(noc.clone()) {
                return Err(row.error(0, "duplicate NOC code").into());
            }
            regions.push(NocRegion {
                noc,
                region: row.optional_text(1),
                notes: row.optional_text(2),
            });
        }

        Ok(regions)
    }

    fn open(path: &Path) -> Result<File, LoaderError> {
        File::open(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Column counts are checked per row so the error can name the row.
    fn reader<R: Read>(reader: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader)
    }

    fn check_header(found: &StringRecord, expected: &[&str]) -> Result<(), LoaderError> {
        if found.iter().eq(expected.iter().copied()) {
            return Ok(());
        }
        Err(LoaderError::HeaderMismatch {
            expected: expected.join(","),
            found: found.iter().collect::<Vec<_>>().join(","),
        })
    }
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw == "NA"
}

/// Typed access to the cells of one record, with errors that carry the row
/// number and column name.
struct RowParser<'a> {
    row: usize,
    record: &'a StringRecord,
    columns: &'static [&'static str],
}

impl<'a> RowParser<'a> {
    fn new(
        row: usize,
        record: &'a StringRecord,
        columns: &'static [&'static str],
    ) -> Result<Self, ParseError> {
        let found = record.len();
        let expected = columns.len();
        if found != expected {
            let column = if found < expected {
                columns[found].to_string()
            } else {
                format!("<extra field {}>", expected + 1)
            };
            return Err(ParseError {
                row,
                column,
                value: record.iter().collect::<Vec<_>>().join(","),
                reason: format!("expected {expected} fields, found {found}"),
            });
        }
        Ok(Self {
            row,
            record,
            columns,
        })
    }

    fn raw(&self, idx: usize) -> &'a str {
        self.record.get(idx).unwrap_or_default()
    }

    fn error(&self, idx: usize, reason: impl Into<String>) -> ParseError {
        ParseError {
            row: self.row,
            column: self.columns[idx].to_string(),
            value: self.raw(idx).to_string(),
            reason: reason.into(),
        }
    }

    fn text(&self, idx: usize) -> Result<String, ParseError> {
        let raw = self.raw(idx);
        if raw.is_empty() {
            return Err(self.error(idx, "missing required value"));
        }
        Ok(raw.to_string())
    }

    fn optional_text(&self, idx: usize) -> Option<String> {
        let raw = self.raw(idx);
        (!is_missing(raw)).then(|| raw.to_string())
    }

    fn noc(&self, idx: usize) -> Result<String, ParseError> {
        let raw = self.raw(idx);
        if raw.len() != 3 || !raw.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(self.error(idx, "expected a 3-letter NOC code"));
        }
        Ok(raw.to_string())
    }

    fn required<T>(&self, idx: usize) -> Result<T, ParseError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.raw(idx);
        if is_missing(raw) {
            return Err(self.error(idx, "missing required value"));
        }
        raw.parse().map_err(|e: T::Err| self.error(idx, e.to_string()))
    }

    fn optional<T>(&self, idx: usize) -> Result<Option<T>, ParseError>
    where
        T: FromStr,
        T::Err: Display,
    {
        if is_missing(self.raw(idx)) {
            return Ok(None);
        }
        self.required(idx).map(Some)
    }

    fn real(&self, idx: usize) -> Result<Option<f64>, ParseError> {
        match self.optional::<f64>(idx)? {
            Some(v) if !v.is_finite() => Err(self.error(idx, "expected a finite number")),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ID,Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal\n";

    fn parse(body: &str) -> Result<Vec<AthleteEvent>, LoaderError> {
        DataLoader::read_athlete_events(format!("{HEADER}{body}").as_bytes())
    }

    fn parse_error(body: &str) -> ParseError {
        match parse(body) {
            Err(LoaderError::Parse(e)) => e,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parses_complete_row() {
        let events = parse(
            "1,A Dijiang,M,24,180,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Basketball,Basketball Men's Basketball,NA\n",
        )
        .unwrap();
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.id, 1);
        assert_eq!(e.sex, Sex::M);
        assert_eq!(e.age, Some(24));
        assert_eq!(e.height, Some(180.0));
        assert_eq!(e.noc, "CHN");
        assert_eq!(e.season, Season::Summer);
        assert_eq!(e.medal, None);
    }

    #[test]
    fn test_quoted_name_with_comma() {
        let events = parse(
            "5,\"Christine Jacoba Aaftink\",F,21,185,82,Netherlands,NED,1988 Winter,1988,Winter,Calgary,Speed Skating,\"Speed Skating Women's 500 metres\",Gold\n",
        )
        .unwrap();
        assert_eq!(events[0].medal, Some(Medal::Gold));
        assert_eq!(events[0].season, Season::Winter);
    }

    #[test]
    fn test_missing_numeric_cells_are_none() {
        let events = parse(
            "2,A Lamusi,M,NA,,NA,China,CHN,2012 Summer,2012,Summer,London,Judo,Judo Men's Extra-Lightweight,\n",
        )
        .unwrap();
        assert_eq!(events[0].age, None);
        assert_eq!(events[0].height, None);
        assert_eq!(events[0].weight, None);
        assert_eq!(events[0].medal, None);
    }

    #[test]
    fn test_non_numeric_weight_names_row_and_column() {
        let err = parse_error(
            "1,A,M,24,180,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Judo,Judo,NA\n\
             2,B,M,24,180,heavy,China,CHN,1992 Summer,1992,Summer,Barcelona,Judo,Judo,NA\n",
        );
        assert_eq!(err.row, 2);
        assert_eq!(err.column, "Weight");
        assert_eq!(err.value, "heavy");
    }

    #[test]
    fn test_short_row_is_rejected() {
        let err = parse_error("1,A,M,24,180,80,China,CHN,1992 Summer,1992\n");
        assert_eq!(err.row, 1);
        assert_eq!(err.column, "Season");
    }

    #[test]
    fn test_long_row_is_rejected() {
        let err = parse_error(
            "1,A,M,24,180,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Judo,Judo,NA,extra\n",
        );
        assert!(err.reason.contains("expected 15 fields, found 16"));
    }

    #[test]
    fn test_nan_is_rejected() {
        let err = parse_error(
            "1,A,M,24,NaN,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Judo,Judo,NA\n",
        );
        assert_eq!(err.column, "Height");
    }

    #[test]
    fn test_unknown_medal_is_rejected() {
        let err = parse_error(
            "1,A,M,24,180,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Judo,Judo,Platinum\n",
        );
        assert_eq!(err.column, "Medal");
    }

    #[test]
    fn test_header_mismatch() {
        let result = DataLoader::read_athlete_events("ID,Name\n1,A\n".as_bytes());
        assert!(matches!(result, Err(LoaderError::HeaderMismatch { .. })));
    }

    #[test]
    fn test_regions_with_missing_region() {
        let regions = DataLoader::read_noc_regions(
            "NOC,region,notes\nAFG,Afghanistan,\nROT,,Refugee Olympic Team\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region.as_deref(), Some("Afghanistan"));
        assert_eq!(regions[0].notes, None);
        assert_eq!(regions[1].region, None);
        assert_eq!(regions[1].notes.as_deref(), Some("Refugee Olympic Team"));
    }

    #[test]
    fn test_duplicate_region_code() {
        let result = DataLoader::read_noc_regions(
            "NOC,region,notes\nAFG,Afghanistan,\nAFG,Afghanistan,\n".as_bytes(),
        );
        match result {
            Err(LoaderError::Parse(e)) => assert_eq!(e.row, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let result = DataLoader::load_noc_regions("/definitely/not/here.csv");
        assert!(matches!(result, Err(LoaderError::Io { .. })));
    }
}
