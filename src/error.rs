use std::path::PathBuf;
use thiserror::Error;

use crate::ir::ChartKind;

#[derive(Error, Debug)]
pub enum FuelError {
    /// The selection matched zero records. Terminal, shown to the user as-is.
    #[error("No data found for {area}, {year}.")]
    NoData { area: String, year: i32 },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Failed to load dataset{}: {message}", describe_location(.path, .line))]
    DatasetLoad {
        path: Option<PathBuf>,
        line: Option<u64>,
        message: String,
    },

    #[error("Failed to render {chart} chart: {message}")]
    Render { chart: ChartKind, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FuelError {
    pub fn dataset(message: impl Into<String>) -> Self {
        FuelError::DatasetLoad {
            path: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn render(chart: ChartKind, message: impl ToString) -> Self {
        FuelError::Render {
            chart,
            message: message.to_string(),
        }
    }

    /// Attach the source file to a dataset error raised while reading a stream.
    pub fn with_path(self, source: impl Into<PathBuf>) -> Self {
        match self {
            FuelError::DatasetLoad { line, message, .. } => FuelError::DatasetLoad {
                path: Some(source.into()),
                line,
                message,
            },
            other => other,
        }
    }
}

fn describe_location(path: &Option<PathBuf>, line: &Option<u64>) -> String {
    match (path, line) {
        (Some(p), Some(l)) => format!(" ({}, line {})", p.display(), l),
        (Some(p), None) => format!(" ({})", p.display()),
        (None, Some(l)) => format!(" (line {})", l),
        (None, None) => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, FuelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_message() {
        let err = FuelError::NoData {
            area: "Gachibowli".to_string(),
            year: 2023,
        };
        assert_eq!(err.to_string(), "No data found for Gachibowli, 2023.");
    }

    #[test]
    fn test_dataset_error_location() {
        let err = FuelError::DatasetLoad {
            path: None,
            line: Some(4),
            message: "bad value".to_string(),
        }
        .with_path("fuel.csv");
        assert_eq!(
            err.to_string(),
            "Failed to load dataset (fuel.csv, line 4): bad value"
        );
    }

    #[test]
    fn test_render_error_names_chart() {
        let err = FuelError::render(ChartKind::Share, "empty series");
        assert_eq!(err.to_string(), "Failed to render share chart: empty series");
    }
}
