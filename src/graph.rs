use crate::data::sort_months;
use crate::error::{FuelError, Result};
use crate::ir::{BoxStats, ChartKind, ChartSpec, ChartView, Histogram, MonthValue};
use crate::{OutputFormat, RenderOptions, MAX_CANVAS_SIDE};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;

/// Qualitative palette used for per-month fills
const PALETTE: [RGBColor; 8] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

const HISTOGRAM_COLOR: RGBColor = RGBColor(31, 119, 180);
const TREND_COLOR: RGBColor = RGBColor(44, 160, 44);
const BAR_COLOR: RGBColor = RGBColor(49, 130, 189);
const SCATTER_COLOR: RGBColor = RGBColor(214, 39, 40);

/// Render one chart spec to image bytes in the configured format
pub fn render_chart(spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    validate_view(spec)?;

    let (width, height) = canvas_size(spec.kind, options);

    match options.format {
        OutputFormat::Png => {
            let len = rgb_buffer_len(width, height).ok_or_else(|| {
                FuelError::render(
                    spec.kind,
                    format!("canvas {}x{} is too large", width, height),
                )
            })?;
            let mut buffer = vec![0u8; len];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
                    .into_drawing_area();
                draw_chart(&root, spec)?;
                root.present().map_err(fail(spec.kind))?;
            }
            encode_png(&buffer, width, height, spec.kind)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                draw_chart(&root, spec)?;
                root.present().map_err(fail(spec.kind))?;
            }
            Ok(svg.into_bytes())
        }
    }
}

/// Byte length of an RGB pixel buffer, or None past the canvas limit
fn rgb_buffer_len(width: u32, height: u32) -> Option<usize> {
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return None;
    }
    (width as usize).checked_mul(height as usize)?.checked_mul(3)
}

/// Pie charts are drawn on a square canvas
fn canvas_size(kind: ChartKind, options: &RenderOptions) -> (u32, u32) {
    match kind {
        ChartKind::Share => {
            let side = options.width.min(options.height);
            (side, side)
        }
        _ => (options.width, options.height),
    }
}

/// Reject views a renderer cannot draw before touching any backend
fn validate_view(spec: &ChartSpec) -> Result<()> {
    if spec.view.is_empty() {
        return Err(FuelError::render(spec.kind, "no data to draw"));
    }

    let finite = match &spec.view {
        ChartView::Histogram(hist) => {
            hist.bins.iter().all(|b| b.start.is_finite() && b.end.is_finite())
                && hist.density.iter().all(|p| p.x.is_finite() && p.y.is_finite())
        }
        ChartView::Series(v)
        | ChartView::Categories(v)
        | ChartView::Shares(v)
        | ChartView::Pairs(v) => v.iter().all(|m| m.value.is_finite()),
        ChartView::Boxes(boxes) => boxes.iter().all(|b| b.values.iter().all(|v| v.is_finite())),
    };
    if !finite {
        return Err(FuelError::render(spec.kind, "data contains non-finite values"));
    }

    if let ChartView::Shares(shares) = &spec.view {
        if shares.iter().all(|s| s.value == 0.0) {
            return Err(FuelError::render(spec.kind, "cannot draw shares of a zero total"));
        }
    }

    Ok(())
}

fn fail<E: Display>(kind: ChartKind) -> impl Fn(E) -> FuelError {
    move |e| FuelError::render(kind, e)
}

fn draw_chart<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()> {
    root.fill(&WHITE).map_err(fail(spec.kind))?;

    match &spec.view {
        ChartView::Histogram(hist) => draw_histogram(root, spec, hist),
        ChartView::Series(series) => draw_line(root, spec, series),
        ChartView::Categories(totals) => draw_bars(root, spec, totals),
        ChartView::Shares(shares) => draw_pie(root, spec, shares),
        ChartView::Pairs(pairs) => draw_scatter(root, spec, pairs),
        ChartView::Boxes(boxes) => draw_boxes(root, spec, boxes),
    }
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    hist: &Histogram,
) -> Result<()> {
    let bins = &hist.bins;
    let x_min = bins.first().map(|b| b.start).unwrap_or(0.0);
    let x_max = bins.last().map(|b| b.end).unwrap_or(1.0);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let max_density = hist.density.iter().map(|p| p.y).fold(0.0, f64::max);
    let y_max = (max_count.max(max_density) * 1.1).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&spec.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(fail(spec.kind))?;

    chart
        .configure_mesh()
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()
        .map_err(fail(spec.kind))?;

    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new(
                [(b.start, 0.0), (b.end, b.count as f64)],
                HISTOGRAM_COLOR.mix(0.7).filled(),
            )
        }))
        .map_err(fail(spec.kind))?;

    // Bin outlines
    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLACK.stroke_width(1))
        }))
        .map_err(fail(spec.kind))?;

    if !hist.density.is_empty() {
        chart
            .draw_series(LineSeries::new(
                hist.density.iter().map(|p| (p.x, p.y)),
                HISTOGRAM_COLOR.stroke_width(2),
            ))
            .map_err(fail(spec.kind))?;
    }

    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    series: &[MonthValue],
) -> Result<()> {
    let months = category_order(series);
    let values: Vec<f64> = series.iter().map(|s| s.value).collect();

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&spec.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(category_range(months.len()), padded_range(&values))
        .map_err(fail(spec.kind))?;

    chart
        .configure_mesh()
        .x_labels(months.len())
        .x_label_formatter(&|x| category_label(&months, *x))
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()
        .map_err(fail(spec.kind))?;

    let points: Vec<(f64, f64)> = series
        .iter()
        .map(|s| (category_index(&months, &s.month), s.value))
        .collect();

    chart
        .draw_series(LineSeries::new(points.clone(), TREND_COLOR.stroke_width(2)))
        .map_err(fail(spec.kind))?;

    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, TREND_COLOR.filled())))
        .map_err(fail(spec.kind))?;

    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    totals: &[MonthValue],
) -> Result<()> {
    let months = category_order(totals);
    let y_max = totals.iter().map(|t| t.value).fold(0.0, f64::max);
    let y_min = totals.iter().map(|t| t.value).fold(0.0, f64::min);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&spec.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            category_range(months.len()),
            (y_min * 1.1)..(y_max * 1.1).max(1.0),
        )
        .map_err(fail(spec.kind))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(months.len())
        .x_label_formatter(&|x| category_label(&months, *x))
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()
        .map_err(fail(spec.kind))?;

    let bar_width = 0.8;
    chart
        .draw_series(totals.iter().map(|t| {
            let x_center = category_index(&months, &t.month);
            Rectangle::new(
                [
                    (x_center - bar_width / 2.0, 0.0),
                    (x_center + bar_width / 2.0, t.value),
                ],
                BAR_COLOR.filled(),
            )
        }))
        .map_err(fail(spec.kind))?;

    Ok(())
}

fn draw_pie<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    shares: &[MonthValue],
) -> Result<()> {
    let area = root
        .titled(&spec.title, ("sans-serif", 20))
        .map_err(fail(spec.kind))?;

    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.35;

    let sizes: Vec<f64> = shares.iter().map(|s| s.value).collect();
    let colors: Vec<RGBColor> = (0..shares.len()).map(|i| PALETTE[i % PALETTE.len()]).collect();
    let labels: Vec<String> = shares.iter().map(|s| s.month.clone()).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style(("sans-serif", 14).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 12).into_font().color(&BLACK));

    area.draw(&pie).map_err(fail(spec.kind))?;

    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    pairs: &[MonthValue],
) -> Result<()> {
    let months = category_order(pairs);
    let values: Vec<f64> = pairs.iter().map(|p| p.value).collect();

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&spec.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(category_range(months.len()), padded_range(&values))
        .map_err(fail(spec.kind))?;

    chart
        .configure_mesh()
        .x_labels(months.len())
        .x_label_formatter(&|x| category_label(&months, *x))
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()
        .map_err(fail(spec.kind))?;

    chart
        .draw_series(pairs.iter().map(|p| {
            Circle::new(
                (category_index(&months, &p.month), p.value),
                4,
                SCATTER_COLOR.filled(),
            )
        }))
        .map_err(fail(spec.kind))?;

    Ok(())
}

fn draw_boxes<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    boxes: &[BoxStats],
) -> Result<()> {
    let months: Vec<String> = boxes.iter().map(|b| b.month.clone()).collect();
    let all_values: Vec<f64> = boxes.iter().flat_map(|b| b.values.iter().copied()).collect();

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&spec.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(category_range(months.len()), padded_range(&all_values))
        .map_err(fail(spec.kind))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(months.len())
        .x_label_formatter(&|x| category_label(&months, *x))
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()
        .map_err(fail(spec.kind))?;

    let half_width = 0.3;
    let cap_half = half_width * 0.4;

    for (idx, b) in boxes.iter().enumerate() {
        let x = idx as f64;
        let fill = PALETTE[idx % PALETTE.len()];

        // Whiskers and caps
        let whiskers = vec![
            vec![(x, b.lower_whisker), (x, b.q1)],
            vec![(x, b.q3), (x, b.upper_whisker)],
            vec![(x - cap_half, b.lower_whisker), (x + cap_half, b.lower_whisker)],
            vec![(x - cap_half, b.upper_whisker), (x + cap_half, b.upper_whisker)],
        ];
        chart
            .draw_series(
                whiskers
                    .into_iter()
                    .map(|path| PathElement::new(path, BLACK.stroke_width(1))),
            )
            .map_err(fail(spec.kind))?;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - half_width, b.q3), (x + half_width, b.q1)],
                fill.filled(),
            )))
            .map_err(fail(spec.kind))?;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - half_width, b.q3), (x + half_width, b.q1)],
                BLACK.stroke_width(1),
            )))
            .map_err(fail(spec.kind))?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x - half_width, b.median), (x + half_width, b.median)],
                BLACK.stroke_width(2),
            )))
            .map_err(fail(spec.kind))?;

        chart
            .draw_series(
                b.outliers
                    .iter()
                    .map(|&v| Circle::new((x, v), 3, BLACK.stroke_width(1))),
            )
            .map_err(fail(spec.kind))?;
    }

    Ok(())
}

/// Distinct month labels in month order. Raw pairs arrive in row order, so
/// the axis cannot rely on input order.
fn category_order(values: &[MonthValue]) -> Vec<String> {
    let mut months: Vec<String> = Vec::new();
    for v in values {
        if !months.contains(&v.month) {
            months.push(v.month.clone());
        }
    }
    sort_months(&mut months);
    months
}

fn category_index(categories: &[String], month: &str) -> f64 {
    categories
        .iter()
        .position(|c| c == month)
        .unwrap_or(0) as f64
}

fn category_range(n: usize) -> Range<f64> {
    -0.5..(n as f64 - 0.5)
}

/// Label only the integer positions that map onto a category
fn category_label(categories: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    categories.get(rounded as usize).cloned().unwrap_or_default()
}

/// Data range with 5% padding; a flat range is widened by one unit each side
fn padded_range(values: &[f64]) -> Range<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32, kind: ChartKind) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(buffer, width, height, image::ColorType::Rgb8)
            .map_err(fail(kind))?;
    }

    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: ChartKind, view: ChartView) -> ChartSpec {
        ChartSpec {
            kind,
            title: "test".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            view,
        }
    }

    fn mv(month: &str, value: f64) -> MonthValue {
        MonthValue {
            month: month.to_string(),
            value,
        }
    }

    #[test]
    fn test_empty_view_is_render_error() {
        let err = render_chart(
            &spec(ChartKind::Trend, ChartView::Series(vec![])),
            &RenderOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FuelError::Render { chart: ChartKind::Trend, .. }));
    }

    #[test]
    fn test_non_finite_is_render_error() {
        let err = render_chart(
            &spec(ChartKind::Raw, ChartView::Pairs(vec![mv("Jan", f64::NAN)])),
            &RenderOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn test_zero_shares_is_render_error() {
        let view = ChartView::Shares(vec![mv("Jan", 0.0), mv("Feb", 0.0)]);
        assert!(render_chart(&spec(ChartKind::Share, view), &RenderOptions::default()).is_err());
    }

    #[test]
    fn test_oversized_canvas_is_render_error() {
        let options = RenderOptions {
            width: 40_000,
            height: 40_000,
            ..RenderOptions::default()
        };
        let view = ChartView::Pairs(vec![mv("Jan", 1.0)]);
        let err = render_chart(&spec(ChartKind::Raw, view), &options).unwrap_err();
        assert!(matches!(err, FuelError::Render { chart: ChartKind::Raw, .. }));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_rgb_buffer_len() {
        assert_eq!(rgb_buffer_len(800, 600), Some(800 * 600 * 3));
        assert_eq!(rgb_buffer_len(MAX_CANVAS_SIDE, MAX_CANVAS_SIDE), Some(300_000_000));
        assert_eq!(rgb_buffer_len(MAX_CANVAS_SIDE + 1, 100), None);
        assert_eq!(rgb_buffer_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_pie_canvas_is_square() {
        let options = RenderOptions::default();
        assert_eq!(canvas_size(ChartKind::Share, &options), (600, 600));
        assert_eq!(canvas_size(ChartKind::Trend, &options), (800, 600));
    }

    #[test]
    fn test_category_helpers() {
        let months = category_order(&[mv("Mar", 1.0), mv("Jan", 2.0), mv("Mar", 3.0)]);
        assert_eq!(months, vec!["Jan", "Mar"]);
        assert_eq!(category_index(&months, "Mar"), 1.0);
        assert_eq!(category_label(&months, 1.0), "Mar");
        assert_eq!(category_label(&months, 0.5), "");
        assert_eq!(category_label(&months, 5.0), "");
        assert_eq!(category_range(2), -0.5..1.5);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(&[5.0, 5.0]), 4.0..6.0);
        let r = padded_range(&[0.0, 100.0]);
        assert_eq!(r, -5.0..105.0);
    }
}
