// src/services/courses.rs

//! Enrolled-course discovery.
//!
//! The portal exposes course listings on several pages depending on the
//! theme and Moodle version, and none of them is guaranteed to exist.
//! Discovery probes a configured list of candidate paths and, on the
//! first authenticated page, tries a structured container parse before
//! falling back to bare course-view anchors.

use std::sync::Arc;

use log::{debug, info, warn};
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Config, CourseInfo};
use crate::services::session::has_login_form;
use crate::utils::cookies::CookieJar;
use crate::utils::http::{Transport, browser_headers};
use crate::utils::{extract_course_view_id, normalize_whitespace};

pub struct CourseDiscovery {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl CourseDiscovery {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Walk the configured listing paths and parse the first page that
    /// renders as authenticated. Errors with `NoAuthenticatedPage` only
    /// when every candidate bounces to the login form.
    pub async fn discover(&self, cookies: &CookieJar) -> Result<Vec<CourseInfo>> {
        let headers = browser_headers(Some(&cookies.header()));
        for path in &self.config.courses.listing_paths {
            let url = self.config.portal.url(path);
            debug!("probing course listing at {url}");
            let page = match self.transport.get(&url, &headers, true).await {
                Ok(page) => page,
                Err(err) => {
                    warn!("course listing fetch failed for {url}: {err}");
                    continue;
                }
            };

            if page.final_url.contains("/login/") || has_login_form(&page.body) {
                debug!("{url} bounced to login, trying next candidate");
                continue;
            }

            let courses = parse_course_listing(&page.body);
            info!("found {} course(s) at {url}", courses.len());
            return Ok(courses);
        }
        Err(AppError::NoAuthenticatedPage)
    }
}

/// Containers first, anchors second; always deduplicated by id.
pub(crate) fn parse_course_listing(body: &str) -> Vec<CourseInfo> {
    let document = Html::parse_document(body);

    let mut courses = parse_course_containers(&document);
    if courses.is_empty() {
        courses = parse_course_anchors(&document);
    }

    let mut seen = std::collections::HashSet::new();
    courses.retain(|c| seen.insert(c.id.clone()));
    courses
}

fn parse_course_containers(document: &Html) -> Vec<CourseInfo> {
    let Ok(container) =
        Selector::parse(".course-info-container, .coursebox, [data-course-id]")
    else {
        return Vec::new();
    };
    let view_link = match Selector::parse(r#"a[href*="/course/view.php"]"#) {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };

    let mut courses = Vec::new();
    for element in document.select(&container) {
        let link = element.select(&view_link).next();

        let id = element
            .value()
            .attr("data-course-id")
            .map(String::from)
            .or_else(|| {
                link.and_then(|a| a.value().attr("href"))
                    .and_then(extract_course_view_id)
            });
        let Some(id) = id else { continue };

        let name = first_text(&element, ".coursename, .course-title, h3")
            .or_else(|| link.map(element_text))
            .map(|t| normalize_whitespace(&t))
            .filter(|t| !t.is_empty());
        let Some(name) = name else { continue };

        let shortname = first_text(&element, ".course-shortname, .shortname")
            .map(|t| normalize_whitespace(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| first_word(&name));

        courses.push(CourseInfo {
            id,
            name,
            shortname,
        });
    }
    courses
}

fn parse_course_anchors(document: &Html) -> Vec<CourseInfo> {
    let Ok(anchor) = Selector::parse(r#"a[href*="/course/view.php"]"#) else {
        return Vec::new();
    };

    let mut courses = Vec::new();
    for a in document.select(&anchor) {
        let Some(id) = a.value().attr("href").and_then(extract_course_view_id) else {
            continue;
        };
        let name = normalize_whitespace(&element_text(a));
        // Icon-only and breadcrumb links carry no usable title. Counted
        // in characters, not bytes: accented text is common here.
        if name.chars().count() <= 3 {
            continue;
        }
        let shortname = first_word(&name);
        courses.push(CourseInfo {
            id,
            name,
            shortname,
        });
    }
    courses
}

fn first_text(scope: &ElementRef, selectors: &str) -> Option<String> {
    let selector = Selector::parse(selectors).ok()?;
    scope.select(&selector).next().map(element_text)
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn first_word(name: &str) -> String {
    name.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}
