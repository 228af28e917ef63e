// Intermediate representation shared by the aggregation and rendering phases

use serde::Serialize;
use std::fmt;

/// Identifies one of the six dashboard charts. The kebab-case id doubles as
/// the artifact file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Distribution,
    Trend,
    MonthlyTotal,
    Share,
    Raw,
    PerMonthDistribution,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Distribution,
        ChartKind::Trend,
        ChartKind::MonthlyTotal,
        ChartKind::Share,
        ChartKind::Raw,
        ChartKind::PerMonthDistribution,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ChartKind::Distribution => "distribution",
            ChartKind::Trend => "trend",
            ChartKind::MonthlyTotal => "monthly-total",
            ChartKind::Share => "share",
            ChartKind::Raw => "raw",
            ChartKind::PerMonthDistribution => "per-month-distribution",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One histogram bucket, covering [start, end)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// A point on the density curve drawn over the histogram, in count units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityPoint {
    pub x: f64,
    pub y: f64,
}

/// Histogram bins plus a kernel density estimate scaled to the bin counts.
/// `density` is empty when the data has no spread to estimate from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
    pub density: Vec<DensityPoint>,
}

/// A single value attached to a month label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthValue {
    pub month: String,
    pub value: f64,
}

/// Spread statistics for one month's values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub month: String,
    pub values: Vec<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Derived data for one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChartView {
    Histogram(Histogram),
    Series(Vec<MonthValue>),
    Categories(Vec<MonthValue>),
    Shares(Vec<MonthValue>),
    Pairs(Vec<MonthValue>),
    Boxes(Vec<BoxStats>),
}

impl ChartView {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartView::Histogram(h) => h.bins.is_empty(),
            ChartView::Series(v)
            | ChartView::Categories(v)
            | ChartView::Shares(v)
            | ChartView::Pairs(v) => v.is_empty(),
            ChartView::Boxes(b) => b.is_empty(),
        }
    }
}

/// A named statistical view plus the labels a renderer needs to draw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub view: ChartView,
}
