// src/services/shapes/month_grid.rs

//! Month-grid layout: a calendar table whose cells carry `data-day`,
//! with event items inside the requested day's cell. Cells expose no
//! per-event time, so `timestart` stays 0 for this shape.

use chrono::{DateTime, Datelike, Utc};
use scraper::{ElementRef, Html, Selector};

use crate::models::{CalendarEvent, EventMetadata};
use crate::services::event_type;
use crate::utils::{absolutize, normalize_whitespace};

pub fn parse(document: &Html, day_epoch: i64, base_url: &str) -> Vec<CalendarEvent> {
    let Some(day_of_month) =
        DateTime::<Utc>::from_timestamp(day_epoch, 0).map(|dt| dt.day())
    else {
        return Vec::new();
    };

    let Some(cell) = find_day_cell(document, day_of_month) else {
        return Vec::new();
    };

    let Ok(item_selector) = Selector::parse(r#"[data-region="event-item"], a[data-event-id]"#)
    else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for item in cell.select(&item_selector) {
        if let Some(event) = parse_item(item, base_url) {
            events.push(event);
        }
    }
    let mut seen = std::collections::HashSet::new();
    events.retain(|e| seen.insert(e.id.clone()));
    events
}

fn find_day_cell(document: &Html, day: u32) -> Option<ElementRef<'_>> {
    // Preferred exact selector, then a scan over every day cell for
    // themes that drop the `day` class.
    if let Ok(selector) = Selector::parse(&format!(r#"td.day[data-day="{day}"]"#)) {
        if let Some(cell) = document.select(&selector).next() {
            return Some(cell);
        }
    }
    let selector = Selector::parse("td[data-day]").ok()?;
    document
        .select(&selector)
        .find(|td| td.value().attr("data-day") == Some(day.to_string().as_str()))
}

fn parse_item(item: ElementRef, base_url: &str) -> Option<CalendarEvent> {
    let link = if item.value().name() == "a" {
        Some(item)
    } else {
        select_first(&item, "a")
    };

    let id = item
        .value()
        .attr("data-event-id")
        .or_else(|| link.and_then(|a| a.value().attr("data-event-id")))
        .map(String::from)?;

    let name = select_first(&item, ".eventname")
        .map(|el| el.text().collect::<String>())
        .unwrap_or_else(|| item.text().collect())
        .trim()
        .to_string();
    let name = normalize_whitespace(&name);
    if name.is_empty() {
        return None;
    }

    let url = link
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize(base_url, href));

    let component = item
        .value()
        .attr("data-event-component")
        .or_else(|| link.and_then(|a| a.value().attr("data-event-component")))
        .map(String::from);
    let raw_eventtype = item
        .value()
        .attr("data-eventtype")
        .or_else(|| link.and_then(|a| a.value().attr("data-eventtype")))
        .map(String::from);

    let eventtype = match component.as_deref().map(|c| c.trim_start_matches("mod_")) {
        Some(kind @ ("assign" | "quiz" | "forum" | "lesson")) => kind.to_string(),
        _ => event_type::from_classes(item.value().attr("class").unwrap_or_default(), &name),
    };

    Some(CalendarEvent {
        id,
        name,
        description: None,
        timestart: 0,
        timeduration: 0,
        course: None,
        location: None,
        eventtype,
        url,
        activity_dates: None,
        metadata: Some(EventMetadata {
            component,
            eventtype: raw_eventtype,
            ..EventMetadata::default()
        }),
    })
}

fn select_first<'a>(scope: &ElementRef<'a>, selectors: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selectors).ok()?;
    scope.select(&selector).next()
}
