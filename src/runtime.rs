// Dashboard executor: select, aggregate, then render each chart independently

use crate::data::Dataset;
use crate::error::{FuelError, Result};
use crate::graph;
use crate::ir::{ChartKind, ChartSpec};
use crate::selection::{self, Selection};
use crate::transform;
use crate::RenderOptions;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A chart written to disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub chart: ChartKind,
    pub path: PathBuf,
}

/// A chart that could not be produced, reported alongside the successful ones
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFailure {
    pub chart: ChartKind,
    pub error: String,
}

/// Response for one dashboard request
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub area: String,
    pub year: i32,
    pub month: Option<String>,
    pub rows: usize,
    pub output_dir: PathBuf,
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<ChartFailure>,
}

impl DashboardReport {
    pub fn artifact(&self, chart: ChartKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.chart == chart)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run one request end to end. `NoData` is returned as an error; a chart
/// that fails to render is recorded in the report and the rest still run.
pub fn render_dashboard(
    dataset: &Dataset,
    selection: &Selection,
    options: &RenderOptions,
) -> Result<DashboardReport> {
    let view = selection::select(dataset, selection)?;
    let specs = transform::build_chart_specs(&view, options.bins);

    let output_dir = selection_dir(&options.output_dir, selection);
    std::fs::create_dir_all(&output_dir)?;

    info!(
        area = %selection.area,
        year = selection.year,
        rows = view.len(),
        dir = %output_dir.display(),
        "Rendering dashboard"
    );

    let mut artifacts = Vec::new();
    let mut failures = Vec::new();

    for spec in &specs {
        match write_chart(spec, &output_dir, options) {
            Ok(path) => {
                debug!(chart = %spec.kind, path = %path.display(), "Wrote chart");
                artifacts.push(Artifact {
                    chart: spec.kind,
                    path,
                });
            }
            Err(e) => {
                warn!(chart = %spec.kind, error = %e, "Chart failed");
                failures.push(ChartFailure {
                    chart: spec.kind,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(DashboardReport {
        area: selection.area.clone(),
        year: selection.year,
        month: selection.month.clone(),
        rows: view.len(),
        output_dir,
        artifacts,
        failures,
    })
}

/// Render a spec and persist it as `<dir>/<kind>.<ext>`.
///
/// The image is written to a temporary file in the same directory and then
/// renamed over the target, so readers never see a partial file.
pub fn write_chart(spec: &ChartSpec, dir: &Path, options: &RenderOptions) -> Result<PathBuf> {
    let bytes = graph::render_chart(spec, options)?;

    let path = dir.join(format!("{}.{}", spec.kind.id(), options.format.extension()));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.flush()?;
    tmp.persist(&path).map_err(|e| FuelError::Io(e.error))?;

    Ok(path)
}

/// Per-selection output directory, `<root>/<slug>-<crc32 of area>-<year>`.
///
/// The slug keeps the area readable; the crc32 of the exact area string keeps
/// areas that differ only in case or punctuation apart.
pub fn selection_dir(root: &Path, selection: &Selection) -> PathBuf {
    root.join(format!(
        "{}-{:08x}-{}",
        slugify(&selection.area),
        crc32fast::hash(selection.area.as_bytes()),
        selection.year
    ))
}

fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("area");
    }
    slug
}
