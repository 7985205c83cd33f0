// src/pipeline/schedule.rs

//! End-to-end schedule orchestration: session check, calendar fetch,
//! date enrichment, schedule assembly.
//!
//! Day queries search forward: an empty day advances one day at a time
//! until something is found or the configured cap runs out, so a
//! student asking "what's next" on a quiet Friday still gets Monday's
//! deadlines.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use log::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{CalendarEvent, CalendarView, Config, ScheduleData, SchedulePeriod};
use crate::pipeline::assemble::assemble_schedule;
use crate::services::activities::ActivityDatesScraper;
use crate::services::calendar::CalendarScraper;
use crate::services::session::SessionProbe;
use crate::utils::cookies::CookieJar;
use crate::utils::http::Transport;
use crate::utils::time::date_to_epoch;

/// Assembled schedule plus what the pipeline had to do to get it.
#[derive(Debug)]
pub struct ScheduleOutcome {
    pub schedule: Vec<ScheduleData>,

    /// For day queries, the date that actually produced events; `None`
    /// when the search cap ran out or another period was asked for
    pub matched_date: Option<String>,

    /// Count of events whose date-enrichment fetch failed
    pub enrichment_failures: usize,
}

pub struct SchedulePipeline {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl SchedulePipeline {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Scrape the schedule for a period, optionally scoped to a course,
    /// starting at `date` (day period only; defaults to today).
    pub async fn scrape(
        &self,
        cookies: &CookieJar,
        period: SchedulePeriod,
        course_id: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<ScheduleOutcome> {
        let probe = SessionProbe::new(self.config.clone(), self.transport.clone());
        if !probe.validate_session(cookies).await? {
            return Err(AppError::SessionExpired);
        }

        let calendar = CalendarScraper::new(self.config.clone(), self.transport.clone());
        let (events, matched_date) = match period {
            SchedulePeriod::Day => {
                self.search_from(&calendar, cookies, course_id, date)
                    .await?
            }
            _ => {
                // Month (and week riding on it) is still scoped to the
                // requested date; the portal renders that date's month.
                // The upcoming view takes no time parameter.
                let time = match period.view() {
                    CalendarView::Month => date.map(date_to_epoch),
                    _ => None,
                };
                let events = calendar
                    .get_events(cookies, period.view(), course_id, time)
                    .await?;
                (events, None)
            }
        };

        let enricher = ActivityDatesScraper::new(self.config.clone(), self.transport.clone());
        let outcome = enricher.enhance_events(cookies, events).await;

        Ok(ScheduleOutcome {
            schedule: assemble_schedule(outcome.events),
            matched_date,
            enrichment_failures: outcome.failures,
        })
    }

    /// Probe day by day until events appear or the cap is reached.
    async fn search_from(
        &self,
        calendar: &CalendarScraper,
        cookies: &CookieJar,
        course_id: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<(Vec<CalendarEvent>, Option<String>)> {
        let start = date.unwrap_or_else(|| Utc::now().date_naive());

        for offset in 0..=self.config.schedule.day_search_limit {
            let Some(day) = start.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            let epoch = date_to_epoch(day);
            let events = calendar
                .get_events(cookies, SchedulePeriod::Day.view(), course_id, Some(epoch))
                .await?;
            if !events.is_empty() {
                if offset > 0 {
                    info!("no events on {start}, matched {day} after {offset} day(s)");
                }
                return Ok((events, Some(day.format("%Y-%m-%d").to_string())));
            }
            debug!("no events on {day}, probing next day");
        }
        info!(
            "no events within {} day(s) of {start}",
            self.config.schedule.day_search_limit
        );
        Ok((Vec::new(), None))
    }
}
