use crate::data::sort_months;
use crate::ir::{Bin, BoxStats, ChartKind, ChartSpec, ChartView, DensityPoint, Histogram, MonthValue};
use crate::selection::FilteredView;
use std::collections::HashMap;

pub const DEFAULT_BINS: usize = 10;

/// Resolution of the density curve drawn over the histogram
const DENSITY_POINTS: usize = 200;

const CONSUMPTION_LABEL: &str = "Petrol Consumption (Liters)";

/// Derive all six chart specs from a filtered view, in dashboard order.
/// Every derivation reads the view independently; none feeds another.
pub fn build_chart_specs(view: &FilteredView, bins: usize) -> Vec<ChartSpec> {
    ChartKind::ALL
        .iter()
        .map(|&kind| build_chart_spec(kind, view, bins))
        .collect()
}

pub fn build_chart_spec(kind: ChartKind, view: &FilteredView, bins: usize) -> ChartSpec {
    let (title, x_label, y_label, data) = match kind {
        ChartKind::Distribution => (
            "Petrol Consumption Distribution",
            CONSUMPTION_LABEL,
            "Frequency",
            ChartView::Histogram(histogram(&view.consumption(), bins)),
        ),
        ChartKind::Trend => (
            "Monthly Petrol Consumption Trend",
            "Month",
            "Consumption (Liters)",
            ChartView::Series(trend(view)),
        ),
        ChartKind::MonthlyTotal => (
            "Monthly Petrol Consumption",
            "Month",
            "Consumption (Liters)",
            ChartView::Categories(monthly_total(view)),
        ),
        ChartKind::Share => (
            "Monthly Consumption Share",
            "",
            "",
            ChartView::Shares(share(view)),
        ),
        ChartKind::Raw => (
            "Petrol Consumption Scatter Plot",
            "Month",
            "Consumption (Liters)",
            ChartView::Pairs(raw_pairs(view)),
        ),
        ChartKind::PerMonthDistribution => (
            "Monthly Consumption Distribution",
            "Month",
            "Consumption (Liters)",
            ChartView::Boxes(per_month_distribution(view)),
        ),
    };

    ChartSpec {
        kind,
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        view: data,
    }
}

/// Bucket values into `bin_count` equal-width bins spanning [min, max].
/// The last bin is closed so the maximum lands inside it. A zero-width
/// range is widened to one unit centred on the value.
pub fn distribution(values: &[f64], bin_count: usize) -> Vec<Bin> {
    if values.is_empty() {
        return Vec::new();
    }
    let bin_count = bin_count.max(1);

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let (start, range) = if max == min {
        (min - 0.5, 1.0)
    } else {
        (min, max - min)
    };
    let width = range / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for &v in values {
        let idx = ((v - start) / width).floor() as usize;
        counts[idx.min(bin_count - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: start + i as f64 * width,
            end: start + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Histogram bins with a Gaussian KDE overlay. The curve spans the data
/// range and is scaled by `n * bin_width` so it sits on the count axis.
pub fn histogram(values: &[f64], bin_count: usize) -> Histogram {
    let bins = distribution(values, bin_count);

    let density = match (bins.first(), bins.last(), scott_bandwidth(values)) {
        (Some(first), Some(last), Some(bandwidth)) => {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let bin_width = (last.end - first.start) / bins.len() as f64;
            let scale = values.len() as f64 * bin_width;
            kde_curve(values, bandwidth, scale, min..max, DENSITY_POINTS)
        }
        _ => Vec::new(),
    };

    Histogram { bins, density }
}

/// Scott's rule: h = sample std * n^(-1/5). None when there is no spread.
fn scott_bandwidth(data: &[f64]) -> Option<f64> {
    let n = data.len() as f64;
    if n < 2.0 { return None; }

    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    (std_dev > 0.0).then(|| std_dev * n.powf(-0.2))
}

/// Gaussian kernel function
fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Evaluate the kernel density estimate on an even grid over `range`,
/// multiplied by `scale`.
fn kde_curve(
    data: &[f64],
    bandwidth: f64,
    scale: f64,
    range: std::ops::Range<f64>,
    points: usize,
) -> Vec<DensityPoint> {
    let n = data.len() as f64;
    let points = points.max(2);
    let step = (range.end - range.start) / (points - 1) as f64;

    (0..points)
        .map(|i| {
            let x = range.start + i as f64 * step;
            let d: f64 = data
                .iter()
                .map(|&xi| gaussian_kernel((x - xi) / bandwidth))
                .sum::<f64>()
                / (n * bandwidth);
            DensityPoint { x, y: d * scale }
        })
        .collect()
}

/// One value per month in month order: the mean of that month's rows
pub fn trend(view: &FilteredView) -> Vec<MonthValue> {
    group_by_month(view)
        .into_iter()
        .map(|(month, values)| {
            let value = values.iter().sum::<f64>() / values.len() as f64;
            MonthValue { month, value }
        })
        .collect()
}

pub fn monthly_total(view: &FilteredView) -> Vec<MonthValue> {
    group_by_month(view)
        .into_iter()
        .map(|(month, values)| MonthValue {
            month,
            value: values.iter().sum(),
        })
        .collect()
}

/// Each month's total as a percentage of the grand total
pub fn share(view: &FilteredView) -> Vec<MonthValue> {
    let totals = monthly_total(view);
    let grand_total: f64 = totals.iter().map(|t| t.value).sum();

    totals
        .into_iter()
        .map(|t| MonthValue {
            value: if grand_total == 0.0 {
                0.0
            } else {
                t.value / grand_total * 100.0
            },
            month: t.month,
        })
        .collect()
}

/// Unaggregated (month, consumption) pairs in dataset order
pub fn raw_pairs(view: &FilteredView) -> Vec<MonthValue> {
    view.records()
        .iter()
        .map(|r| MonthValue {
            month: r.month.clone(),
            value: r.consumption,
        })
        .collect()
}

/// Full value list per month plus box-plot statistics (1.5 IQR whiskers)
pub fn per_month_distribution(view: &FilteredView) -> Vec<BoxStats> {
    group_by_month(view)
        .into_iter()
        .map(|(month, values)| box_stats(month, values))
        .collect()
}

fn box_stats(month: String, values: Vec<f64>) -> BoxStats {
    let mut ys = values.clone();
    ys.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // Whiskers reach the most extreme values still inside the fences
    let lower_whisker = ys.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);

    let outliers: Vec<f64> = ys
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    BoxStats {
        month,
        min: ys.first().copied().unwrap_or(0.0),
        max: ys.last().copied().unwrap_or(0.0),
        values,
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
    }
}

/// Linear-interpolated percentile over already sorted data
fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return 0.0; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Group consumption values by month label, returned in month order.
/// Values within a group keep dataset order.
fn group_by_month(view: &FilteredView) -> Vec<(String, Vec<f64>)> {
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for r in view.records() {
        groups.entry(r.month.as_str()).or_default().push(r.consumption);
    }

    let mut months: Vec<String> = groups.keys().map(|m| m.to_string()).collect();
    sort_months(&mut months);

    months
        .into_iter()
        .map(|m| {
            let values = groups.remove(m.as_str()).unwrap_or_default();
            (m, values)
        })
        .collect()
}
