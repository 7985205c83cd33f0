// src/services/course_activities.rs

//! Per-section course scraping.
//!
//! A course page only renders one section at a time on this portal's
//! theme, so each numbered section is fetched as its own page. One bad
//! section never sinks the course: it is logged, recorded in the
//! outcome and omitted from the result.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Config, CourseActivity, CourseSchedule, CourseSection};
use crate::services::activities::parse_activity_dates;
use crate::services::session::has_login_form;
use crate::utils::cookies::CookieJar;
use crate::utils::http::{Transport, browser_headers};
use crate::utils::{absolutize, normalize_whitespace};

/// Per-course scrape result, with the section numbers that had to be
/// dropped.
#[derive(Debug)]
pub struct CourseScrapeOutcome {
    pub schedule: CourseSchedule,
    pub omitted_sections: Vec<u32>,
}

pub struct CourseActivitiesScraper {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl CourseActivitiesScraper {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Scrape the configured section range of one course.
    pub async fn get_course_activities(
        &self,
        cookies: &CookieJar,
        course_id: &str,
    ) -> Result<CourseScrapeOutcome> {
        let headers = browser_headers(Some(&cookies.header()));
        let landing_url = self
            .config
            .portal
            .url(&format!("course/view.php?id={course_id}"));
        let landing = self.transport.get(&landing_url, &headers, true).await?;
        if landing.final_url.contains("/login/") || has_login_form(&landing.body) {
            return Err(AppError::SessionExpired);
        }

        // The landing page is the one fetch that must succeed: without
        // a course title the id is likely stale or unenrolled.
        let course_name = parse_course_title(&landing.body).ok_or_else(|| {
            AppError::scrape(
                format!("course {course_id}"),
                "course page has no title heading",
            )
        })?;

        let delay = Duration::from_millis(self.config.portal.request_delay_ms);
        let mut sections = Vec::new();
        let mut omitted = Vec::new();

        for number in self.config.courses.section_range_start..=self.config.courses.section_range_end
        {
            let url = self
                .config
                .portal
                .url(&format!("course/view.php?id={course_id}&section={number}"));
            debug!("fetching section {number} of course {course_id}");

            match self.transport.get(&url, &headers, true).await {
                Ok(page) => {
                    let section =
                        parse_section(&page.body, number, &self.config.portal.base_url);
                    if section.activities.is_empty() {
                        debug!("section {number} of course {course_id} is empty, omitting");
                        omitted.push(number);
                    } else {
                        sections.push(section);
                    }
                }
                Err(err) => {
                    warn!("section {number} of course {course_id} failed: {err}");
                    omitted.push(number);
                }
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let total_activities = sections.iter().map(|s| s.activities.len()).sum();
        info!(
            "course {course_id}: {} section(s), {total_activities} activit(y/ies)",
            sections.len()
        );
        Ok(CourseScrapeOutcome {
            schedule: CourseSchedule {
                course_id: course_id.to_string(),
                course_name: Some(course_name),
                sections,
                total_activities,
                last_updated: chrono::Utc::now().to_rfc3339(),
            },
            omitted_sections: omitted,
        })
    }

    /// Scrape several courses sequentially; a failed course is omitted,
    /// never fatal for the batch.
    pub async fn get_multiple_courses_activities(
        &self,
        cookies: &CookieJar,
        course_ids: &[String],
    ) -> Vec<CourseScrapeOutcome> {
        let mut outcomes = Vec::new();
        for course_id in course_ids {
            match self.get_course_activities(cookies, course_id).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!("course {course_id} skipped: {err}"),
            }
        }
        outcomes
    }

    /// Like [`get_course_activities`], but keeping only activities that
    /// carry a submission window.
    ///
    /// [`get_course_activities`]: Self::get_course_activities
    pub async fn get_course_activities_with_dates(
        &self,
        cookies: &CookieJar,
        course_id: &str,
    ) -> Result<CourseScrapeOutcome> {
        let mut outcome = self.get_course_activities(cookies, course_id).await?;
        for section in outcome.schedule.sections.iter_mut() {
            section.activities.retain(CourseActivity::has_dates);
        }
        outcome.schedule.sections.retain(|s| !s.activities.is_empty());
        outcome.schedule.total_activities = outcome
            .schedule
            .sections
            .iter()
            .map(|s| s.activities.len())
            .sum();
        Ok(outcome)
    }
}

fn parse_course_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse(".page-header-headings h1, h1").ok()?;
    document
        .select(&selector)
        .next()
        .map(|h1| normalize_whitespace(&h1.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn parse_section(body: &str, number: u32, base_url: &str) -> CourseSection {
    let document = Html::parse_document(body);

    let section_name = select_text(&document, ".sectionname span, h3.sectionname, .sectionname")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("UNIDAD {number}"));

    let mut activities = Vec::new();
    if let Ok(activity_selector) = Selector::parse("li.activity") {
        for li in document.select(&activity_selector) {
            if let Some(activity) = parse_activity(li, number, &section_name, base_url) {
                activities.push(activity);
            }
        }
    }

    CourseSection {
        section_number: number,
        section_name,
        activities,
    }
}

fn parse_activity(
    li: ElementRef,
    section: u32,
    section_name: &str,
    base_url: &str,
) -> Option<CourseActivity> {
    let classes = li.value().attr("class").unwrap_or_default();
    let activity_type = modtype(classes)?;
    // Labels are section prose, not schedulable work.
    if activity_type == "label" {
        return None;
    }

    let name = instance_name(&li)?;

    let link = select_first(&li, ".activityname a, a.aalink");
    let url = link
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize(base_url, href));

    let id = li
        .value()
        .attr("data-id")
        .map(String::from)
        .or_else(|| url.as_deref().and_then(crate::utils::extract_id_param))?;

    let icon = select_first(&li, ".activityicon, .activityiconcontainer img")
        .and_then(|img| img.value().attr("src"))
        .map(|src| absolutize(base_url, src));

    let dates = Some(parse_activity_dates(&li.html())).filter(|d| !d.is_empty());

    Some(CourseActivity {
        id,
        name,
        activity_type,
        section,
        section_name: Some(section_name.to_string()),
        url,
        dates,
        icon,
        description: None,
    })
}

/// Module type from the `modtype_*` class token.
fn modtype(classes: &str) -> Option<String> {
    let re = Regex::new(r"modtype_(\w+)").ok()?;
    re.captures(classes)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Visible activity name: the `.instancename` text minus its hidden
/// accessibility suffix ("Tarea", "Cuestionario", ...).
fn instance_name(li: &ElementRef) -> Option<String> {
    if let Some(instance) = select_first(li, ".instancename") {
        let full: String = instance.text().collect();
        let hidden: String = select_first(&instance, ".accesshide")
            .map(|el| el.text().collect())
            .unwrap_or_default();
        let name = normalize_whitespace(full.trim_end_matches(hidden.trim()));
        if !name.is_empty() {
            return Some(name);
        }
    }
    select_first(li, ".activityname a")
        .map(|a| normalize_whitespace(&a.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn select_text(document: &Html, selectors: &str) -> Option<String> {
    let selector = Selector::parse(selectors).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
}

fn select_first<'a>(scope: &ElementRef<'a>, selectors: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selectors).ok()?;
    scope.select(&selector).next()
}
