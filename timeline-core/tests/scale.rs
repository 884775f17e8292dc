use chrono::NaiveDate;
use timeline_core::{EntryKind, Scale, StatusCounts, TimelineConfig, TimelineEntry, TimelineError};

fn entry(day: u32, kind: EntryKind) -> TimelineEntry {
    TimelineEntry {
        date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        kind,
    }
}

fn bar(accepted: u64, user_intervened: u64) -> EntryKind {
    EntryKind::Bar(StatusCounts {
        accepted,
        user_intervened,
        ..StatusCounts::default()
    })
}

#[test]
fn domain_spans_busiest_day_and_range_leaves_axis_room() {
    let entries = vec![
        entry(1, bar(2, 3)),
        entry(2, EntryKind::Zero),
        entry(3, bar(10, 10)),
        entry(
            4,
            EntryKind::Loading {
                trigger_fetch: true,
                next_offset: Some(1),
            },
        ),
    ];
    let scale = Scale::from_timeline(&entries, 230.0, &TimelineConfig::default())
        .expect("scale builds");

    assert_eq!(scale.domain(), (0.0, 20.0));
    assert_eq!(scale.range(), (0.0, 200.0));
    assert_eq!(scale.map(10.0), 100.0);
    assert_eq!(scale.map_count(5), 50.0);
}

#[test]
fn values_outside_domain_clamp() {
    let scale = Scale::new((0.0, 40.0), (0.0, 120.0));

    assert_eq!(scale.map(-3.0), 0.0);
    assert_eq!(scale.map(0.0), 0.0);
    assert_eq!(scale.map(40.0), 120.0);
    assert_eq!(scale.map(400.0), 120.0);
}

#[test]
fn all_zero_timeline_maps_everything_to_range_min() {
    let entries = vec![entry(1, EntryKind::Zero), entry(2, EntryKind::Zero)];
    let scale = Scale::from_timeline(&entries, 100.0, &TimelineConfig::default())
        .expect("scale builds");

    assert_eq!(scale.domain(), (0.0, 0.0));
    assert_eq!(scale.map(0.0), 0.0);
    assert_eq!(scale.map(f64::NAN), 0.0);
}

#[test]
fn short_track_clamps_range_to_zero() {
    let entries = vec![entry(1, bar(1, 0))];
    let scale = Scale::from_timeline(&entries, 12.0, &TimelineConfig::default())
        .expect("scale builds");

    assert_eq!(scale.range(), (0.0, 0.0));
}

#[test]
fn empty_timeline_is_rejected() {
    let result = Scale::from_timeline(&[], 300.0, &TimelineConfig::default());
    assert_eq!(result, Err(TimelineError::EmptyTimeline));
}

#[test]
fn oversized_counts_saturate_instead_of_overflowing() {
    let counts = StatusCounts {
        accepted: u64::MAX,
        wait_first_response: 1,
        ..StatusCounts::default()
    };
    assert_eq!(counts.total(), u64::MAX);

    let entries = vec![entry(1, EntryKind::Bar(counts)), entry(2, bar(1, 0))];
    let scale = Scale::from_timeline(&entries, 130.0, &TimelineConfig::default())
        .expect("scale builds");

    assert_eq!(scale.domain(), (0.0, u64::MAX as f64));
    assert_eq!(scale.map_count(u64::MAX), 100.0);
}
