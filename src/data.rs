use crate::error::{FuelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const AREA_COLUMN: &str = "Area";
pub const YEAR_COLUMN: &str = "Year";
pub const MONTH_COLUMN: &str = "Month";
pub const CONSUMPTION_COLUMN: &str = "Petrol Consumption (Liters)";

const REQUIRED_COLUMNS: [&str; 4] = [AREA_COLUMN, YEAR_COLUMN, MONTH_COLUMN, CONSUMPTION_COLUMN];

/// One row of the consumption table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Petrol Consumption (Liters)")]
    pub consumption: f64,
}

impl Record {
    pub fn new(area: &str, year: i32, month: &str, consumption: f64) -> Self {
        Self {
            area: area.to_string(),
            year,
            month: month.to_string(),
            consumption,
        }
    }
}

/// The full table, loaded once and only ever read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load a dataset from a CSV file on disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| FuelError::DatasetLoad {
            path: Some(path.to_path_buf()),
            line: None,
            message: e.to_string(),
        })?;
        let dataset = Self::from_reader(file).map_err(|e| e.with_path(path))?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            "Loaded consumption dataset"
        );
        Ok(dataset)
    }

    /// Parse CSV from any reader. Schema problems fail here rather than at request time.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| FuelError::dataset(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(FuelError::dataset(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(|e| FuelError::DatasetLoad {
                path: None,
                line: e.position().map(|p| p.line()),
                message: e.to_string(),
            })?;
            let line = row.position().map(|p| p.line());

            let record: Record = row.deserialize(Some(&headers)).map_err(|e| {
                FuelError::DatasetLoad {
                    path: None,
                    line,
                    message: e.to_string(),
                }
            })?;

            if !record.consumption.is_finite() {
                return Err(FuelError::DatasetLoad {
                    path: None,
                    line,
                    message: format!(
                        "non-finite consumption for {} {} {}",
                        record.area, record.year, record.month
                    ),
                });
            }
            records.push(record);
        }

        debug!(rows = records.len(), "Parsed CSV rows");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct areas, years and months for populating a selection form
    pub fn options(&self) -> DropdownOptions {
        let areas: BTreeSet<&str> = self.records.iter().map(|r| r.area.as_str()).collect();
        let years: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        let mut months: Vec<String> = self
            .records
            .iter()
            .map(|r| r.month.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        sort_months(&mut months);

        DropdownOptions {
            areas: areas.into_iter().map(str::to_string).collect(),
            years: years.into_iter().collect(),
            months,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOptions {
    pub areas: Vec<String>,
    pub years: Vec<i32>,
    pub months: Vec<String>,
}

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Calendar position (1-12) of a month label: full name, three-letter
/// abbreviation, or a plain ordinal.
pub fn month_ordinal(label: &str) -> Option<u32> {
    let label = label.trim();
    if let Ok(n) = label.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }

    let lower = label.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| *name == lower || (lower.len() == 3 && name.starts_with(&lower)))
        .map(|idx| idx as u32 + 1)
}

/// Sort month labels on the calendar when every label is recognised,
/// lexically otherwise. Labels naming the same month fall back to lexical
/// order so the result never depends on input order.
pub fn sort_months(months: &mut [String]) {
    if months.iter().all(|m| month_ordinal(m).is_some()) {
        months.sort_by(|a, b| (month_ordinal(a), a).cmp(&(month_ordinal(b), b)));
    } else {
        months.sort();
    }
}
