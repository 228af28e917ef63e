use crate::data::{Dataset, Record};
use crate::error::{FuelError, Result};
use serde::Serialize;
use tracing::debug;

/// The (area, year[, month]) key supplied with each request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub area: String,
    pub year: i32,
    /// Accepted and echoed back, but filtering is by area and year only.
    pub month: Option<String>,
}

impl Selection {
    pub fn new(area: &str, year: i32) -> Self {
        Self {
            area: area.to_string(),
            year,
            month: None,
        }
    }

    pub fn with_month(mut self, month: &str) -> Self {
        self.month = Some(month.to_string());
        self
    }

    /// Validate raw form values into a selection.
    pub fn parse(area: Option<&str>, year: Option<&str>, month: Option<&str>) -> Result<Self> {
        let area = match area {
            Some(a) if !a.trim().is_empty() => a.to_string(),
            _ => return Err(FuelError::InvalidSelection("area is required".to_string())),
        };

        let year_str = year
            .map(str::trim)
            .filter(|y| !y.is_empty())
            .ok_or_else(|| FuelError::InvalidSelection("year is required".to_string()))?;
        let year = year_str.parse::<i32>().map_err(|_| {
            FuelError::InvalidSelection(format!("year '{}' is not an integer", year_str))
        })?;

        let month = month
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Ok(Self { area, year, month })
    }
}

/// Records matching one selection, borrowed from the dataset
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    selection: Selection,
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn consumption(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.consumption).collect()
    }
}

/// Return every record whose area (exact, case-sensitive) and year match.
/// An empty match is reported as `NoData` rather than an empty view.
pub fn select<'a>(dataset: &'a Dataset, selection: &Selection) -> Result<FilteredView<'a>> {
    if let Some(month) = &selection.month {
        debug!(month = %month, "Month is not used for filtering");
    }

    let records: Vec<&Record> = dataset
        .records()
        .iter()
        .filter(|r| r.area == selection.area && r.year == selection.year)
        .collect();

    if records.is_empty() {
        return Err(FuelError::NoData {
            area: selection.area.clone(),
            year: selection.year,
        });
    }

    debug!(
        area = %selection.area,
        year = selection.year,
        rows = records.len(),
        "Selected records"
    );

    Ok(FilteredView {
        selection: selection.clone(),
        records,
    })
}
