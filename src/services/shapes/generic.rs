// src/services/shapes/generic.rs

//! Fallback layout: no timeline sections and no month table. Treat any
//! list item that links into an activity module as an event. No
//! timestamp is recoverable here, so `timestart` stays 0.

use scraper::{ElementRef, Html, Selector};

use crate::models::CalendarEvent;
use crate::services::event_type;
use crate::utils::{absolutize, extract_id_param, normalize_whitespace};

pub fn parse(document: &Html, base_url: &str) -> Vec<CalendarEvent> {
    let Ok(item_selector) =
        Selector::parse(".list-group-item, .event-item, .calendar-event-item, [data-event-id]")
    else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for item in document.select(&item_selector) {
        if let Some(event) = parse_item(item, base_url) {
            events.push(event);
        }
    }
    let mut seen = std::collections::HashSet::new();
    events.retain(|e| seen.insert((e.id.clone(), e.name.clone())));
    events
}

fn parse_item(item: ElementRef, base_url: &str) -> Option<CalendarEvent> {
    let link = select_first(&item, r#"a[href*="/mod/"], a[href*="view.php"]"#)
        .or_else(|| select_first(&item, "a[href]"));

    // Without an activity link or an explicit event id this is just
    // page chrome.
    let explicit_id = item.value().attr("data-event-id");
    if link.is_none() && explicit_id.is_none() {
        return None;
    }

    let name = link
        .map(|a| a.text().collect::<String>())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| item.text().collect());
    let name = normalize_whitespace(&name);
    if name.chars().count() <= 3 {
        return None;
    }

    let url = link
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize(base_url, href));

    let id = explicit_id
        .map(String::from)
        .or_else(|| url.as_deref().and_then(extract_id_param))
        .unwrap_or_else(|| "0".to_string());

    let classes = item.value().attr("class").unwrap_or_default();
    let icon_title = select_first(&item, "img")
        .and_then(|img| {
            img.value()
                .attr("title")
                .or_else(|| img.value().attr("alt"))
        })
        .unwrap_or_default();

    Some(CalendarEvent {
        id,
        name: name.clone(),
        description: None,
        timestart: 0,
        timeduration: 0,
        course: None,
        location: None,
        eventtype: event_type::from_classes(classes, &format!("{name} {icon_title}")),
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
    fn test_activity_links_become_events() {
        let html = r#"<ul>
            <li class="list-group-item">
                <img src="i.svg" alt="Tarea">
                <a href="/mod/assign/view.php?id=12">Entrega proyecto final</a>
            </li>
            <li class="list-group-item"><a href="/index.php">Inicio</a></li>
            <li class="list-group-item">sin enlace</li>
        </ul>"#;
        let document = Html::parse_document(html);
        let events = parse(&document, "https://sima.unicartagena.edu.co");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "12");
        assert_eq!(events[0].eventtype, "assign");
        assert_eq!(events[0].timestart, 0);
        assert_eq!(events[1].name, "Inicio");
        assert_eq!(events[1].id, "0");
    }
}
