// src/services/shapes/event_list.rs

//! Whole-page event scan used for the month view. Rather than walking
//! the grid cell by cell, collect every element that looks like an
//! event anywhere on the page and keep the distinct ones.

use scraper::{ElementRef, Html, Selector};

use crate::models::CalendarEvent;
use crate::services::event_type;
use crate::utils::time::time_text_to_today_epoch;
use crate::utils::{absolutize, extract_id_param, normalize_whitespace};

pub fn parse(document: &Html, base_url: &str) -> Vec<CalendarEvent> {
    let Ok(candidate) = Selector::parse(
        r#".calendar-event, .event, [data-event-id], [data-region="event-item"]"#,
    ) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for element in document.select(&candidate) {
        if let Some(event) = parse_candidate(element, base_url) {
            events.push(event);
        }
    }
    let mut seen = std::collections::HashSet::new();
    events.retain(|e| seen.insert((e.id.clone(), e.name.clone())));
    events
}

fn parse_candidate(element: ElementRef, base_url: &str) -> Option<CalendarEvent> {
    let name = select_first(&element, ".eventname, .event-name, h3, h4, a")
        .map(|el| el.text().collect::<String>())
        .unwrap_or_else(|| element.text().collect());
    let name = normalize_whitespace(&name);
    if name.chars().count() <= 3 {
        return None;
    }

    let link = if element.value().name() == "a" {
        Some(element)
    } else {
        select_first(&element, "a[href]")
    };
    let url = link
        .and_then(|a| a.value().attr("href"))
        .filter(|href| !href.starts_with('#'))
        .map(|href| absolutize(base_url, href));

    let id = element
        .value()
        .attr("data-event-id")
        .map(String::from)
        .or_else(|| url.as_deref().and_then(extract_id_param))
        .unwrap_or_else(|| "0".to_string());

    // Anything with an explicit timestamp keeps it; otherwise a time
    // rendered in the element text is mapped onto today.
    let timestart = element
        .value()
        .attr("data-timestamp")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or_else(|| time_text_to_today_epoch(&element.text().collect::<String>()));

    let classes = element.value().attr("class").unwrap_or_default();
    let title = element.value().attr("title").unwrap_or_default();

    Some(CalendarEvent {
        id,
        name: name.clone(),
        description: None,
        timestart,
        timeduration: 0,
        course: None,
        location: None,
        eventtype: event_type::from_classes(classes, &format!("{title} {name}")),
        url,
        activity_dates: None,
        metadata: None,
    })
}

fn select_first<'a>(scope: &ElementRef<'a>, selectors: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selectors).ok()?;
    scope.select(&selector).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_events_collected_across_page() {
        let html = r#"<div>
            <div class="calendar-event assignment" data-event-id="15" data-timestamp="1760202000">
                <a href="/mod/assign/view.php?id=15"><span class="eventname">Taller 4</span></a>
            </div>
            <div class="event" title="Examen parcial" data-event-id="16">
                <h4>Parcial de Cálculo</h4>
            </div>
            <a data-event-id="15" href="/mod/assign/view.php?id=15">Taller 4</a>
            <span class="event">ok</span>
        </div>"#;
        let document = Html::parse_document(html);
        let events = parse(&document, "https://sima.unicartagena.edu.co");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "15");
        assert_eq!(events[0].timestart, 1_760_202_000);
        assert_eq!(events[0].eventtype, "assign");
        assert_eq!(events[1].eventtype, "exam");
        // "ok" and the repeated anchor are dropped.
        assert!(events.iter().filter(|e| e.id == "15").count() == 1);
    }
}
