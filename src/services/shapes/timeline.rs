// src/services/shapes/timeline.rs

//! Timeline layout: date-header sections carrying a day-granular
//! `data-timestamp`, each followed by sibling event rows.

use scraper::{ElementRef, Html, Selector};

use crate::models::{CalendarEvent, CourseRef, EventMetadata};
use crate::services::event_type;
use crate::utils::time::{combine_day_and_time, same_day};
use crate::utils::{absolutize, extract_id_param, normalize_whitespace};

const SECS_PER_DAY: i64 = 86_400;

pub fn parse(document: &Html, day_epoch: i64, base_url: &str) -> Vec<CalendarEvent> {
    let Ok(date_header) = Selector::parse(r#"[data-region="event-list-content-date"]"#) else {
        return Vec::new();
    };
    let Ok(event_row) = Selector::parse(r#"[data-region="event-list-item"]"#) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for header in document.select(&date_header) {
        let Some(section_ts) = header
            .value()
            .attr("data-timestamp")
            .and_then(|v| v.parse::<i64>().ok())
        else {
            continue;
        };
        if !same_day(section_ts, day_epoch) {
            continue;
        }

        let date_text = normalize_whitespace(&header.text().collect::<String>());
        let day_start = section_ts.div_euclid(SECS_PER_DAY) * SECS_PER_DAY;

        // Rows live in siblings between this header and the next one.
        for sibling in header.next_siblings().filter_map(ElementRef::wrap) {
            if sibling.value().attr("data-region") == Some("event-list-content-date") {
                break;
            }
            let rows: Vec<ElementRef> = if is_event_row(&sibling) {
                vec![sibling]
            } else {
                sibling.select(&event_row).collect()
            };
            for row in rows {
                if let Some(event) = parse_row(row, day_start, &date_text, base_url) {
                    events.push(event);
                }
            }
        }
    }
    events
}

fn is_event_row(element: &ElementRef) -> bool {
    element.value().attr("data-region") == Some("event-list-item")
}

fn parse_row(
    row: ElementRef,
    day_start: i64,
    date_text: &str,
    base_url: &str,
) -> Option<CalendarEvent> {
    let name_link = select_first(&row, ".event-name a");
    let name = name_link
        .map(element_text)
        .or_else(|| select_first(&row, ".event-name").map(element_text))
        .map(|t| normalize_whitespace(&t))
        .filter(|t| !t.is_empty())?;

    let url = name_link
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize(base_url, href));

    let time_text = select_first(&row, ".small-info-text, small")
        .map(element_text)
        .map(|t| normalize_whitespace(&t));

    let course_text = select_first(&row, ".coursename-action, .event-course")
        .map(element_text)
        .map(|t| normalize_whitespace(&t))
        .filter(|t| !t.is_empty());

    let icon = select_first(&row, ".activityiconcontainer img, img.activityicon")
        .and_then(|img| {
            img.value()
                .attr("title")
                .or_else(|| img.value().attr("alt"))
        })
        .map(String::from);

    let action_link = select_first(&row, ".timeline-action-button a");
    let action_button = action_link
        .map(element_text)
        .map(|t| normalize_whitespace(&t))
        .filter(|t| !t.is_empty());
    let action_button_url = action_link
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize(base_url, href));

    // The timeline renders no dedicated event id; the view link's id
    // parameter is the activity id and serves the same purpose.
    let id = url
        .as_deref()
        .and_then(extract_id_param)
        .or_else(|| action_button_url.as_deref().and_then(extract_id_param))
        .unwrap_or_else(|| "0".to_string());

    let timestart = time_text
        .as_deref()
        .map(|t| combine_day_and_time(day_start, t))
        .unwrap_or(day_start);

    let eventtype = event_type::from_action(
        action_button.as_deref().unwrap_or_default(),
        icon.as_deref().unwrap_or_default(),
    );

    Some(CalendarEvent {
        id,
        name,
        description: None,
        timestart,
        timeduration: 0,
        course: course_text
            .as_deref()
            .map(|text| CourseRef::from_fullname("", text)),
        location: None,
        eventtype,
        url,
        activity_dates: None,
        metadata: Some(EventMetadata {
            date: Some(date_text.to_string()),
            time: time_text,
            action_type: action_button.clone(),
            action_button,
            action_button_url,
            activity_icon: icon,
            component: None,
            eventtype: None,
        }),
    })
}

fn select_first<'a>(scope: &ElementRef<'a>, selectors: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selectors).ok()?;
    scope.select(&selector).next()
}

fn element_text(element: ElementRef) -> String {
    element.text().collect()
}
