use fuelgraph::transform::{self, DEFAULT_BINS};
use fuelgraph::{select, ChartKind, ChartView, Dataset, FuelError, Selection};
use std::path::Path;

fn load_fixture() -> Dataset {
    Dataset::from_path(Path::new("test/petrol.csv")).expect("fixture loads")
}

#[test]
fn test_every_present_key_selects_matching_rows() {
    let dataset = load_fixture();
    let options = dataset.options();

    for area in &options.areas {
        for &year in &options.years {
            let view = select(&dataset, &Selection::new(area, year)).unwrap();
            assert!(!view.is_empty());
            assert!(view.records().iter().all(|r| &r.area == area && r.year == year));
        }
    }
}

#[test]
fn test_absent_keys_signal_no_data() {
    let dataset = load_fixture();
    for (area, year) in [("Nonexistent", 1900), ("Gachibowli", 1999), ("Madhapur ", 2023)] {
        assert!(matches!(
            select(&dataset, &Selection::new(area, year)),
            Err(FuelError::NoData { .. })
        ));
    }
}

#[test]
fn test_aggregates_conserve_totals() {
    let dataset = load_fixture();
    let view = select(&dataset, &Selection::new("Kukatpally", 2022)).unwrap();
    let raw_total: f64 = view.consumption().iter().sum();

    let monthly: f64 = transform::monthly_total(&view).iter().map(|m| m.value).sum();
    assert!((monthly - raw_total).abs() < 1e-6);

    let shares: f64 = transform::share(&view).iter().map(|s| s.value).sum();
    assert!((shares - 100.0).abs() < 0.1);

    let binned: usize = transform::distribution(&view.consumption(), DEFAULT_BINS)
        .iter()
        .map(|b| b.count)
        .sum();
    assert_eq!(binned, view.len());

    let boxed: usize = transform::per_month_distribution(&view)
        .iter()
        .map(|b| b.values.len())
        .sum();
    assert_eq!(boxed, view.len());
}

#[test]
fn test_pipeline_is_idempotent() {
    let dataset = load_fixture();
    let selection = Selection::new("Madhapur", 2023).with_month("Jul");

    let first = transform::build_chart_specs(&select(&dataset, &selection).unwrap(), DEFAULT_BINS);
    let second = transform::build_chart_specs(&select(&dataset, &selection).unwrap(), DEFAULT_BINS);
    assert_eq!(first, second);
}

#[test]
fn test_specs_cover_every_chart() {
    let dataset = load_fixture();
    let view = select(&dataset, &Selection::new("Gachibowli", 2023)).unwrap();
    let specs = transform::build_chart_specs(&view, 8);

    assert_eq!(specs.iter().map(|s| s.kind).collect::<Vec<_>>(), ChartKind::ALL);
    match &specs[0].view {
        ChartView::Histogram(hist) => {
            assert_eq!(hist.bins.len(), 8);
            assert!(!hist.density.is_empty());
        }
        other => panic!("unexpected view: {:?}", other),
    }
    match &specs[1].view {
        ChartView::Series(series) => assert_eq!(series.len(), 12),
        other => panic!("unexpected view: {:?}", other),
    }
}
