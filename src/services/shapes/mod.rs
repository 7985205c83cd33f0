// src/services/shapes/mod.rs

//! Layout-specific calendar parsers.
//!
//! The portal serves at least three different day-view layouts
//! depending on theme and term configuration. Each parser handles one
//! shape; the classifier here picks which applies, and the generic
//! parser absorbs anything unrecognized.

pub mod event_list;
pub mod generic;
pub mod month_grid;
pub mod timeline;

use log::debug;
use scraper::{Html, Selector};

use crate::models::CalendarEvent;

/// Detected day-page layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    Timeline,
    MonthGrid,
    Generic,
}

impl PageShape {
    pub fn detect(document: &Html) -> Self {
        if matches_any(
            document,
            r#"[data-region="timeline"], [data-region="event-list-wrapper"], [data-region="event-list-content-date"], .block-timeline"#,
        ) {
            PageShape::Timeline
        } else if matches_any(document, "td[data-day]") {
            PageShape::MonthGrid
        } else {
            PageShape::Generic
        }
    }
}

fn matches_any(document: &Html, selectors: &str) -> bool {
    match Selector::parse(selectors) {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

/// Parse a day page, dispatching on its detected shape. `day_epoch` is
/// any timestamp within the requested day.
pub fn parse_day_page(body: &str, day_epoch: i64, base_url: &str) -> Vec<CalendarEvent> {
    let document = Html::parse_document(body);
    let shape = PageShape::detect(&document);
    debug!("day page classified as {shape:?}");
    match shape {
        PageShape::Timeline => timeline::parse(&document, day_epoch, base_url),
        PageShape::MonthGrid => month_grid::parse(&document, day_epoch, base_url),
        PageShape::Generic => generic::parse(&document, base_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_detection_order() {
        let timeline = Html::parse_document(r#"<div data-region="timeline"></div>"#);
        assert_eq!(PageShape::detect(&timeline), PageShape::Timeline);

        let grid = Html::parse_document(r#"<table><td data-day="4"></td></table>"#);
        assert_eq!(PageShape::detect(&grid), PageShape::MonthGrid);

        let plain = Html::parse_document("<div class='list-group'></div>");
        assert_eq!(PageShape::detect(&plain), PageShape::Generic);
    }
}
