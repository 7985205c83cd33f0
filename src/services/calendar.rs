// src/services/calendar.rs

//! Calendar retrieval across the portal's views.
//!
//! Course-scoped upcoming events come from the portal's own AJAX
//! endpoint, which returns structured JSON and needs a sesskey. Every
//! other view is scraped from the rendered HTML through the shape
//! parsers.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{CalendarEvent, CalendarView, Config, CourseRef};
use crate::services::event_type;
use crate::services::session::{SessionProbe, has_login_form};
use crate::services::shapes::{self, event_list};
use crate::utils::cookies::CookieJar;
use crate::utils::http::{Transport, ajax_headers, browser_headers};

pub struct CalendarScraper {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl CalendarScraper {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Fetch events for a view. `time` scopes the day view; `course_id`
    /// scopes any view to one course.
    pub async fn get_events(
        &self,
        cookies: &CookieJar,
        view: CalendarView,
        course_id: Option<&str>,
        time: Option<i64>,
    ) -> Result<Vec<CalendarEvent>> {
        if view == CalendarView::Upcoming {
            if let Some(course_id) = course_id {
                return Ok(self.upcoming_via_ajax(cookies, course_id).await);
            }
        }

        // The page renders site-wide events under course 1.
        let course = course_id.unwrap_or("1");
        let mut url = format!(
            "{}?view={}&course={course}",
            self.config.portal.url("calendar/view.php"),
            view.as_str()
        );
        if let Some(time) = time {
            url.push_str(&format!("&time={time}"));
        }

        let headers = browser_headers(Some(&cookies.header()));
        let page = self.transport.get(&url, &headers, true).await?;
        if page.final_url.contains("/login/") || has_login_form(&page.body) {
            return Err(AppError::SessionExpired);
        }

        let base = &self.config.portal.base_url;
        let events = match view {
            CalendarView::Day => {
                let day_epoch = time.unwrap_or_else(|| Utc::now().timestamp());
                shapes::parse_day_page(&page.body, day_epoch, base)
            }
            CalendarView::Month | CalendarView::Upcoming => {
                let document = scraper::Html::parse_document(&page.body);
                event_list::parse(&document, base)
            }
        };
        debug!("{} event(s) scraped from {} view", events.len(), view.as_str());
        Ok(events)
    }

    /// Course-scoped upcoming events through `lib/ajax/service.php`.
    /// Any failure on this path degrades to an empty list; the HTML
    /// views remain the source of truth.
    async fn upcoming_via_ajax(&self, cookies: &CookieJar, course_id: &str) -> Vec<CalendarEvent> {
        let sesskey = match SessionProbe::new(self.config.clone(), self.transport.clone())
            .get_session_key(cookies)
            .await
        {
            Ok(key) => key,
            Err(err) => {
                warn!("sesskey unavailable for upcoming view: {err}");
                return Vec::new();
            }
        };

        const METHOD: &str = "core_calendar_get_calendar_upcoming_view";
        let url = format!(
            "{}?sesskey={sesskey}&info={METHOD}",
            self.config.portal.url("lib/ajax/service.php")
        );
        let body = json!([{
            "index": 0,
            "methodname": METHOD,
            "args": { "courseid": course_id },
        }]);
        let referer = self.config.portal.url("calendar/view.php?view=upcoming");
        let headers = ajax_headers(
            &cookies.header(),
            &self.config.portal.base_url,
            &referer,
        );

        let response = match self.transport.post_json(&url, &headers, &body).await {
            Ok(response) => response,
            Err(err) => {
                warn!("upcoming AJAX call failed: {err}");
                return Vec::new();
            }
        };

        parse_ajax_response(&response.body)
    }
}

fn parse_ajax_response(body: &str) -> Vec<CalendarEvent> {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!("upcoming AJAX response is not JSON: {err}");
            return Vec::new();
        }
    };
    let first = &parsed[0];
    if first["error"].as_bool() == Some(true) || first.get("exception").is_some() {
        warn!("upcoming AJAX response carries an error payload");
        return Vec::new();
    }
    first["data"]["events"]
        .as_array()
        .map(|events| events.iter().filter_map(map_ajax_event).collect())
        .unwrap_or_default()
}

fn map_ajax_event(value: &Value) -> Option<CalendarEvent> {
    let name = value["name"].as_str()?.to_string();
    let id = json_id(&value["id"])?;

    let course = value["course"].as_object().and_then(|course| {
        let id = json_id(course.get("id")?)?;
        let fullname = course.get("fullname")?.as_str()?;
        let mut reference = CourseRef::from_fullname(id, fullname);
        if let Some(shortname) = course.get("shortname").and_then(Value::as_str) {
            reference.shortname = shortname.to_string();
        }
        Some(reference)
    });

    let action_name = value["action"]["name"].as_str().unwrap_or_default();
    let icon_title = value["icon"]["title"].as_str().unwrap_or_default();
    let eventtype = match value["modulename"].as_str() {
        Some(kind @ ("assign" | "quiz" | "forum" | "lesson")) => kind.to_string(),
        _ => event_type::from_action(action_name, icon_title),
    };

    let url = value["url"]
        .as_str()
        .or_else(|| value["action"]["url"].as_str())
        .map(String::from);

    Some(CalendarEvent {
        id,
        name,
        description: value["description"].as_str().map(String::from),
        timestart: value["timestart"].as_i64().unwrap_or(0),
        timeduration: value["timeduration"].as_i64().unwrap_or(0),
        course,
        location: value["location"]
            .as_str()
            .filter(|l| !l.is_empty())
            .map(String::from),
        eventtype,
        url,
        activity_dates: None,
        metadata: None,
    })
}

/// The endpoint serializes ids as numbers or strings depending on
/// Moodle version.
fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::PageResponse;
    use crate::utils::http::stub::StubTransport;

    fn scraper_with(stub: StubTransport) -> CalendarScraper {
        CalendarScraper::new(Arc::new(Config::default()), Arc::new(stub))
    }

    #[tokio::test]
    async fn test_day_view_builds_scoped_url() {
        let stub = StubTransport::new().on(
            "calendar/view.php",
            PageResponse::ok("<div class='list-group'></div>")
                .with_final_url("https://sima.unicartagena.edu.co/calendar/view.php"),
        );
        let scraper = scraper_with(stub);
        let events = scraper
            .get_events(
                &CookieJar::new(),
                CalendarView::Day,
                Some("42"),
                Some(1_760_140_800),
            )
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_login_bounce_is_session_expired() {
        let stub = StubTransport::new().on(
            "calendar/view.php",
            PageResponse::ok("<form><input name='username'><input name='password'></form>")
                .with_final_url("https://sima.unicartagena.edu.co/login/index.php"),
        );
        let err = scraper_with(stub)
            .get_events(&CookieJar::new(), CalendarView::Month, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SessionExpired));
    }

    #[tokio::test]
    async fn test_upcoming_with_course_uses_ajax() {
        let sesskey_page = r#"<input type="hidden" name="sesskey" value="k9">"#;
        let ajax_body = serde_json::json!([{
            "error": false,
            "data": { "events": [
                {
                    "id": 88,
                    "name": "Entrega avance",
                    "timestart": 1_760_200_000i64,
                    "timeduration": 0,
                    "modulename": "assign",
                    "url": "https://sima.unicartagena.edu.co/mod/assign/view.php?id=88",
                    "course": { "id": 42, "fullname": "IS301 - Ingeniería de Software",
                                "shortname": "IS301" }
                }
            ]}
        }])
        .to_string();
        let stub = StubTransport::new()
            .on(
                "calendar/view.php",
                PageResponse::ok(sesskey_page)
                    .with_final_url("https://sima.unicartagena.edu.co/calendar/view.php"),
            )
            .on("lib/ajax/service.php", PageResponse::ok(ajax_body));

        let events = scraper_with(stub)
            .get_events(&CookieJar::new(), CalendarView::Upcoming, Some("42"), None)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "88");
        assert_eq!(events[0].eventtype, "assign");
        assert_eq!(events[0].course.as_ref().unwrap().shortname, "IS301");
    }

    #[tokio::test]
    async fn test_ajax_error_payload_degrades_to_empty() {
        let sesskey_page = r#"<input type="hidden" name="sesskey" value="k9">"#;
        let stub = StubTransport::new()
            .on(
                "calendar/view.php",
                PageResponse::ok(sesskey_page)
                    .with_final_url("https://sima.unicartagena.edu.co/calendar/view.php"),
            )
            .on(
                "lib/ajax/service.php",
                PageResponse::ok(r#"[{"error":true,"exception":{"message":"bad sesskey"}}]"#),
            );
        let events = scraper_with(stub)
            .get_events(&CookieJar::new(), CalendarView::Upcoming, Some("42"), None)
            .await
            .unwrap();
        assert!(events.is_empty());
    }
}
