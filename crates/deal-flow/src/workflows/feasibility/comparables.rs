use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use super::input::Comparable;
use super::lenient::deserialize_amount;

#[derive(Debug)]
pub enum ComparablesImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ComparablesImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparablesImportError::Io(err) => {
                write!(f, "failed to read comparables file: {}", err)
            }
            ComparablesImportError::Csv(err) => write!(f, "invalid comparables CSV data: {}", err),
        }
    }
}

impl std::error::Error for ComparablesImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComparablesImportError::Io(err) => Some(err),
            ComparablesImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ComparablesImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ComparablesImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct ComparableRow {
    #[serde(default, alias = "Link", alias = "url")]
    link: String,
    #[serde(default, alias = "Value", alias = "valor", deserialize_with = "deserialize_amount")]
    value: f64,
    #[serde(default, alias = "Area", alias = "area_m2", deserialize_with = "deserialize_amount")]
    area: f64,
}

/// Reads `link,value,area` rows. Rows are kept even when unusable for pricing; the calculator
/// skips them.
pub struct ComparablesImporter;

impl ComparablesImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Comparable>, ComparablesImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Comparable>, ComparablesImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut comparables = Vec::new();

        for record in csv_reader.deserialize::<ComparableRow>() {
            let row = record?;
            comparables.push(Comparable::new(row.link, row.value, row.area));
        }

        Ok(comparables)
    }
}
