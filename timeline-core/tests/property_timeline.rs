use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use timeline_core::{
    interpolate_at, DailyRecord, ResourceBundle, Scale, StatusCounts, TimelineConfig,
    TimelineInput,
};

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 45, 0).unwrap()
}

fn bundle(days_ago: &[i64], earliest_ago: Option<i64>, total: u64) -> ResourceBundle {
    let today = reference_now().date_naive();
    let iso = |ago: i64| (today - Duration::days(ago)).format("%Y-%m-%d").to_string();
    ResourceBundle {
        records: days_ago
            .iter()
            .map(|&ago| {
                DailyRecord::new(
                    iso(ago),
                    StatusCounts {
                        accepted: ago.unsigned_abs() % 7,
                        ..StatusCounts::default()
                    },
                )
            })
            .collect(),
        earliest_date: earliest_ago.map(iso),
        latest_date: None,
        total,
    }
}

proptest! {
    #[test]
    fn timeline_is_dense_and_strictly_ascending(
        days_ago in prop::collection::vec(0i64..400, 0..40),
        earliest_ago in prop::option::of(0i64..400),
        more in any::<bool>(),
    ) {
        let input = TimelineInput {
            initialized: true,
            has_more_data: more,
            next_offset: more.then_some(1),
            resources: Some(bundle(&days_ago, earliest_ago, 1000)),
            ..TimelineInput::default()
        };
        let view = interpolate_at(&input, &TimelineConfig::default(), reference_now()).unwrap();
        let timeline = view.timeline.unwrap();

        prop_assert_eq!(timeline.entries.len(), timeline.window.len());
        prop_assert!(timeline.window.len() >= 121);
        prop_assert_eq!(timeline.entries[0].date, timeline.window.start);
        prop_assert_eq!(timeline.entries.last().unwrap().date, timeline.window.end);
        for pair in timeline.entries.windows(2) {
            prop_assert_eq!(pair[0].date + Duration::days(1), pair[1].date);
        }
    }

    #[test]
    fn loading_entries_only_when_more_data(
        days_ago in prop::collection::vec(0i64..200, 1..40),
        more in any::<bool>(),
    ) {
        let input = TimelineInput {
            initialized: true,
            has_more_data: more,
            next_offset: more.then_some(3),
            resources: Some(bundle(&days_ago, None, 1000)),
            ..TimelineInput::default()
        };
        let view = interpolate_at(&input, &TimelineConfig::default(), reference_now()).unwrap();
        let timeline = view.timeline.unwrap();

        let triggers: Vec<_> = timeline.entries.iter().filter(|e| e.triggers_fetch()).collect();
        if !more {
            prop_assert_eq!(timeline.loading_days(), 0);
            prop_assert!(triggers.is_empty());
        } else {
            prop_assert!(triggers.len() <= 1);
            let boundary = timeline.raw.last().unwrap().day().unwrap();
            for entry in timeline.entries.iter().filter(|e| e.is_loading()) {
                prop_assert!(entry.date < boundary);
            }
            if let Some(newest) = timeline.entries.iter().rev().find(|e| e.is_loading()) {
                prop_assert_eq!(triggers.len(), 1);
                prop_assert_eq!(triggers[0].date, newest.date);
            }
        }
    }

    #[test]
    fn scale_clamps_and_is_monotonic(
        max in 1u32..10_000,
        height in 31.0f64..2_000.0,
        a in 0u32..10_000,
        b in 0u32..10_000,
        overshoot in 1.0f64..1e6,
    ) {
        let scale = Scale::new((0.0, f64::from(max)), (0.0, height - 30.0));
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        prop_assert_eq!(scale.map(-overshoot), 0.0);
        prop_assert_eq!(scale.map(f64::from(max) + overshoot), height - 30.0);
        prop_assert!(scale.map(f64::from(low)) <= scale.map(f64::from(high)));
    }
}
