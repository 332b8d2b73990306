use jiff::Zoned;
use jiff::civil::date;
use jiff::tz::TimeZone;
use liverlens_core::models::filter::{Criterion, FilterSpec, RelativeWindow};
use liverlens_core::models::sort::{SortDirection, SortSpec};

#[test]
fn default_filter_is_empty() {
    assert!(FilterSpec::new().is_empty());
}

#[test]
fn blank_criteria_do_not_count_as_active() {
    let spec = FilterSpec::new()
        .exact("risk_level", "")
        .range("age", "", "  ")
        .search("search", "", &["input_data.Patient_ID"])
        .date_range("timestamp", "", "");

    assert!(spec.is_empty());
    assert_eq!(spec.active().count(), 0);
}

#[test]
fn range_keeps_one_sided_bounds() {
    let spec = FilterSpec::new().range("age", "40", "");
    assert_eq!(
        spec.get("age"),
        Some(&Criterion::Range {
            min: Some("40".to_string()),
            max: None,
        })
    );
    assert!(!spec.is_empty());
}

#[test]
fn without_removes_a_criterion() {
    let spec = FilterSpec::new()
        .exact("risk_level", "High")
        .exact("drug", "Placebo")
        .without("drug");
    let keys: Vec<_> = spec.active().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["risk_level"]);
}

#[test]
fn filter_spec_round_trips_through_json() {
    let spec = FilterSpec::new()
        .exact("risk_level", "High")
        .within("timestamp", RelativeWindow::Week);
    let json = serde_json::to_string(&spec).unwrap();
    let back: FilterSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(spec, back);
}

#[test]
fn relative_windows_count_back_from_now() {
    let now: Zoned = date(2025, 3, 15)
        .at(14, 30, 0, 0)
        .to_zoned(TimeZone::UTC)
        .unwrap();

    let today = RelativeWindow::Today.since(&now).unwrap();
    assert_eq!(today.datetime(), date(2025, 3, 15).at(0, 0, 0, 0));

    let week = RelativeWindow::Week.since(&now).unwrap();
    assert_eq!(week.date(), date(2025, 3, 8));

    let month = RelativeWindow::Month.since(&now).unwrap();
    assert_eq!(month.date(), date(2025, 2, 15));

    let year = RelativeWindow::Year.since(&now).unwrap();
    assert_eq!(year.date(), date(2024, 3, 15));
}

#[test]
fn sort_toggle_flips_same_key_and_resets_new_key() {
    let sort = SortSpec::asc("age");
    let flipped = sort.toggled("age");
    assert_eq!(flipped.direction, SortDirection::Desc);

    let back = flipped.toggled("age");
    assert_eq!(back.direction, SortDirection::Asc);

    let other = flipped.toggled("bilirubin");
    assert_eq!(other, SortSpec::asc("bilirubin"));
}

#[test]
fn default_sort_is_newest_first() {
    let sort = SortSpec::default();
    assert_eq!(sort.key, "timestamp");
    assert_eq!(sort.direction.as_str(), "desc");
}
