use std::collections::HashMap;

use chrono::NaiveDate;
use timeline_core::presentation::{
    build_cells, current_day_index, day_flags, stacked_segments, tooltip_date, tooltip_rows,
    weekday_label, CellBody, DateRange, Status, StatusLegend,
};
use timeline_core::{
    DayWindow, DenseTimeline, EntryKind, Scale, StatusCounts, TimelineEntry, TimelineMeta,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn counts() -> StatusCounts {
    StatusCounts {
        accepted: 1,
        negotiation_in_progress: 2,
        requires_user_intervention: 3,
        user_intervened: 4,
        wait_first_response: 5,
    }
}

#[test]
fn legend_falls_back_to_gray_and_status_key() {
    let legend = StatusLegend {
        colors: HashMap::from([(Status::Accepted, "#02BA86".to_string())]),
        labels: HashMap::from([(Status::Accepted, "Accepted".to_string())]),
    };

    assert_eq!(legend.color_of(Status::Accepted), "#02BA86");
    assert_eq!(legend.color_of(Status::UserIntervened), "gray");
    assert_eq!(legend.label_of(Status::Accepted), "Accepted");
    assert_eq!(
        legend.label_of(Status::RequiresUserIntervention),
        "requiresUserIntervention"
    );
}

#[test]
fn tooltip_rows_follow_counter_order() {
    let rows = tooltip_rows(&counts(), &StatusLegend::default());
    let keys: Vec<_> = rows.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "accepted",
            "negotiationInProgress",
            "requiresUserIntervention",
            "userIntervened",
            "waitFirstResponse",
        ]
    );
    assert_eq!(rows[2].count, 3);
}

#[test]
fn segments_stack_in_bar_order_with_scaled_heights() {
    let scale = Scale::new((0.0, 10.0), (0.0, 100.0));
    let segments = stacked_segments(&counts(), &scale);

    let order: Vec<_> = segments.iter().map(|segment| segment.status).collect();
    assert_eq!(order, Status::STACK_ORDER.to_vec());
    assert_eq!(segments[1].count, 3);
    assert_eq!(segments[1].height, 30.0);
}

#[test]
fn date_range_highlight_rules() {
    let day = date(2024, 5, 10);
    assert!(!DateRange::default().contains(day));
    assert!(DateRange {
        start: Some(date(2024, 5, 10)),
        end: None
    }
    .contains(day));
    assert!(!DateRange {
        start: None,
        end: Some(date(2024, 5, 9))
    }
    .contains(day));
    assert!(DateRange {
        start: Some(date(2024, 5, 1)),
        end: Some(date(2024, 5, 10))
    }
    .contains(day));
}

#[test]
fn calendar_flags_and_labels() {
    let today = date(2024, 2, 29);
    let flags = day_flags(date(2024, 2, 29), today, None);
    assert!(flags.end_of_month && flags.today && !flags.before_today);

    let flags = day_flags(date(2024, 2, 1), today, None);
    assert!(flags.start_of_month && flags.before_today && !flags.highlighted);

    assert_eq!(weekday_label(date(2024, 2, 29)), "Th");
    assert_eq!(tooltip_date(date(2024, 3, 5), today), "Tue 3/05");
    assert_eq!(tooltip_date(date(2023, 12, 31), today), "Sun 12/31/2023");
}

#[test]
fn cells_mirror_entries_and_locate_today() {
    let today = date(2024, 1, 2);
    let entries = vec![
        TimelineEntry {
            date: date(2024, 1, 1),
            kind: EntryKind::Loading {
                trigger_fetch: true,
                next_offset: Some(1),
            },
        },
        TimelineEntry {
            date: date(2024, 1, 2),
            kind: EntryKind::Bar(counts()),
        },
        TimelineEntry {
            date: date(2024, 1, 3),
            kind: EntryKind::Zero,
        },
    ];
    let timeline = DenseTimeline {
        window: DayWindow {
            start: date(2024, 1, 1),
            end: date(2024, 1, 3),
        },
        meta: TimelineMeta {
            center: None,
            total: 1,
        },
        raw: Vec::new(),
        entries,
    };
    let scale = Scale::new((0.0, 15.0), (0.0, 150.0));

    let cells = build_cells(&timeline, &scale, today, None);
    assert_eq!(cells.len(), 3);
    assert_eq!(
        cells[0].body,
        CellBody::Loading {
            height: 150.0,
            trigger_fetch: true,
            next_offset: Some(1),
        }
    );
    assert_eq!(cells[1].key, 1_704_153_600);
    assert!(cells[1].flags.today);
    assert_eq!(current_day_index(&timeline.entries, today), Some(1));
    assert_eq!(current_day_index(&timeline.entries, date(2024, 2, 1)), None);
}
