// src/services/activities.rs

//! Submission-window enrichment.
//!
//! Calendar events only say when something is due; the activity's own
//! page carries the full "Apertura"/"Cierre" window. Enrichment visits
//! each deadline-bearing event's page and folds those labels back into
//! the event. A failed page never aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{ActivityDates, CalendarEvent, Config};
use crate::utils::cookies::CookieJar;
use crate::utils::http::{Transport, browser_headers};
use crate::utils::normalize_whitespace;

/// Enrichment result with the per-event failure count, so callers can
/// tell "no dates on the page" from "pages kept failing".
#[derive(Debug)]
pub struct EnrichOutcome {
    pub events: Vec<CalendarEvent>,
    pub failures: usize,
}

pub struct ActivityDatesScraper {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl ActivityDatesScraper {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Fetch one activity page and extract its submission window.
    pub async fn get_activity_dates(
        &self,
        cookies: &CookieJar,
        activity_url: &str,
    ) -> Result<ActivityDates> {
        let url = submission_view_url(activity_url);
        let headers = browser_headers(Some(&cookies.header()));
        let page = self.transport.get(&url, &headers, true).await?;
        Ok(parse_activity_dates(&page.body))
    }

    /// Enrich every deadline-bearing event in place, sequentially and
    /// politely.
    pub async fn enhance_events(
        &self,
        cookies: &CookieJar,
        mut events: Vec<CalendarEvent>,
    ) -> EnrichOutcome {
        let delay = Duration::from_millis(self.config.portal.request_delay_ms);
        let mut failures = 0;

        for event in events.iter_mut() {
            if !wants_dates(event) {
                continue;
            }
            let Some(url) = event.detail_url().map(String::from) else {
                continue;
            };

            match self.get_activity_dates(cookies, &url).await {
                Ok(dates) if !dates.is_empty() => {
                    debug!("dates found for '{}'", event.name);
                    event.activity_dates = Some(dates);
                }
                Ok(_) => debug!("no dates block on page for '{}'", event.name),
                Err(err) => {
                    warn!("date fetch failed for '{}': {err}", event.name);
                    failures += 1;
                }
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        EnrichOutcome { events, failures }
    }
}

/// Whether an event plausibly has a submission window worth a fetch.
fn wants_dates(event: &CalendarEvent) -> bool {
    if matches!(event.eventtype.as_str(), "assign" | "assignment" | "quiz") {
        return true;
    }
    if event.name.to_lowercase().contains("evaluación") {
        return true;
    }
    event
        .metadata
        .as_ref()
        .and_then(|m| m.action_type.as_deref())
        .map(|action| {
            let action = action.to_lowercase();
            action.contains("tarea") || action.contains("cuestionario")
        })
        .unwrap_or(false)
}

/// The assignment view only renders the dates block on its submission
/// form, so plain view URLs get `action=editsubmission` appended.
fn submission_view_url(url: &str) -> String {
    if url.contains("/mod/assign/view.php") && !url.contains("action=") {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}action=editsubmission")
    } else {
        url.to_string()
    }
}

pub(crate) fn parse_activity_dates(body: &str) -> ActivityDates {
    let document = Html::parse_document(body);
    let Ok(row_selector) = Selector::parse(r#"[data-region="activity-dates"] div"#) else {
        return ActivityDates::default();
    };
    let Ok(strong_selector) = Selector::parse("strong") else {
        return ActivityDates::default();
    };

    let mut dates = ActivityDates::default();
    for row in document.select(&row_selector) {
        let Some(strong) = row.select(&strong_selector).next() else {
            continue;
        };
        let label = normalize_whitespace(&strong.text().collect::<String>());
        let full = normalize_whitespace(&row.text().collect::<String>());
        let value = full.replacen(&label, "", 1).trim().to_string();
        if value.is_empty() {
            continue;
        }

        if label.starts_with("Apertura") || label.starts_with("Abrió") {
            dates.apertura.get_or_insert(value);
        } else if label.starts_with("Cierre") || label.starts_with("Cerró") {
            dates.cierre.get_or_insert(value);
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventMetadata;
    use crate::utils::http::PageResponse;
    use crate::utils::http::stub::StubTransport;

    const DATES_PAGE: &str = r#"<div data-region="activity-dates">
        <div><strong>Apertura:</strong> lunes, 6 de octubre de 2025, 08:00</div>
        <div><strong>Cierre:</strong> sábado, 11 de octubre de 2025, 23:59</div>
    </div>"#;

    fn event(id: &str, eventtype: &str, url: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            id: id.into(),
            name: format!("Evento {id}"),
            description: None,
            timestart: 0,
            timeduration: 0,
            course: None,
            location: None,
            eventtype: eventtype.into(),
            url: url.map(String::from),
            activity_dates: None,
            metadata: None,
        }
    }

    #[test]
    fn test_parse_both_labels() {
        let dates = parse_activity_dates(DATES_PAGE);
        assert_eq!(
            dates.apertura.as_deref(),
            Some("lunes, 6 de octubre de 2025, 08:00")
        );
        assert_eq!(
            dates.cierre.as_deref(),
            Some("sábado, 11 de octubre de 2025, 23:59")
        );
    }

    #[test]
    fn test_parse_alternate_labels() {
        let html = r#"<div data-region="activity-dates">
            <div><strong>Abrió:</strong> hace dos días</div>
            <div><strong>Cerró:</strong> ayer</div>
        </div>"#;
        let dates = parse_activity_dates(html);
        assert_eq!(dates.apertura.as_deref(), Some("hace dos días"));
        assert_eq!(dates.cierre.as_deref(), Some("ayer"));
    }

    #[test]
    fn test_missing_block_is_empty() {
        assert!(parse_activity_dates("<html><body>nada</body></html>").is_empty());
    }

    #[test]
    fn test_submission_view_url_rules() {
        assert_eq!(
            submission_view_url("https://x/mod/assign/view.php?id=3"),
            "https://x/mod/assign/view.php?id=3&action=editsubmission"
        );
        // Already targeted URLs and other modules stay untouched.
        assert_eq!(
            submission_view_url("https://x/mod/assign/view.php?id=3&action=grading"),
            "https://x/mod/assign/view.php?id=3&action=grading"
        );
        assert_eq!(
            submission_view_url("https://x/mod/quiz/view.php?id=3"),
            "https://x/mod/quiz/view.php?id=3"
        );
    }

    #[tokio::test]
    async fn test_enhance_skips_ineligible_and_survives_failures() {
        let stub = StubTransport::new()
            .fail("id=1", "connection reset")
            .on("id=2", PageResponse::ok(DATES_PAGE));

        let mut quiz_with_action = event("3", "activity", Some("https://x/mod/quiz/view.php?id=2"));
        quiz_with_action.metadata = Some(EventMetadata {
            action_type: Some("Intentar resolver el cuestionario".into()),
            ..EventMetadata::default()
        });

        let events = vec![
            event("1", "assign", Some("https://x/mod/assign/view.php?id=1")),
            event("2", "forum", Some("https://x/mod/forum/view.php?id=9")),
            quiz_with_action,
        ];

        let config = Config {
            portal: crate::models::PortalConfig {
                request_delay_ms: 0,
                ..crate::models::PortalConfig::default()
            },
            ..Config::default()
        };
        let scraper = ActivityDatesScraper::new(Arc::new(config), Arc::new(stub));
        let outcome = scraper.enhance_events(&CookieJar::new(), events).await;

        assert_eq!(outcome.failures, 1);
        assert!(outcome.events[0].activity_dates.is_none());
        // The forum event was never eligible, so never fetched.
        assert!(outcome.events[1].activity_dates.is_none());
        assert!(outcome.events[2].activity_dates.is_some());
    }
}
