// src/pipeline/assemble.rs

//! Event-to-schedule projection.
//!
//! A pure step: it groups already-scraped events by calendar date and
//! converts each into its schedule-facing shape. Metadata text wins
//! over the raw timestamp when both are present, because the metadata
//! reflects exactly what the portal displayed to the student.

use std::collections::BTreeMap;

use crate::models::{Activity, CalendarEvent, ScheduleData};
use crate::utils::time::{
    epoch_to_date_string, epoch_to_time_string, spanish_date_to_iso,
};

/// Group events into per-date schedules, sorted by date and, within a
/// date, by start time. Every input event lands in exactly one bucket.
pub fn assemble_schedule(events: Vec<CalendarEvent>) -> Vec<ScheduleData> {
    let mut buckets: BTreeMap<String, Vec<Activity>> = BTreeMap::new();

    for event in events {
        let (date, start_time) = date_and_time(&event);
        buckets.entry(date).or_default().push(project(event, start_time));
    }

    buckets
        .into_iter()
        .map(|(date, mut activities)| {
            activities.sort_by(|a, b| a.start_time.cmp(&b.start_time));
            ScheduleData { date, activities }
        })
        .collect()
}

fn date_and_time(event: &CalendarEvent) -> (String, String) {
    if let Some(metadata) = &event.metadata {
        if let (Some(date_text), Some(time_text)) = (&metadata.date, &metadata.time) {
            return (spanish_date_to_iso(date_text), time_text.clone());
        }
    }
    (
        epoch_to_date_string(event.timestart),
        epoch_to_time_string(event.timestart),
    )
}

fn project(event: CalendarEvent, start_time: String) -> Activity {
    let end_time = (event.timeduration > 0)
        .then(|| epoch_to_time_string(event.timestart + event.timeduration));

    Activity {
        id: event.id,
        title: event.name,
        start_time,
        end_time,
        description: event.description,
        location: event.location,
        activity_type: event.eventtype,
        activity_dates: event.activity_dates,
        course: event.course,
        url: event.url,
        metadata: event.metadata,
    }
}
