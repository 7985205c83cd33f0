// src/models/mod.rs

//! Domain models for the scraping engine.
//!
//! This module contains all data structures used throughout the engine,
//! organized by their primary purpose.

mod config;
mod course;
mod event;
mod schedule;

// Re-export all public types
pub use config::{Config, CoursesConfig, PortalConfig, ScheduleConfig};
pub use course::{CourseActivity, CourseInfo, CourseSchedule, CourseSection};
pub use event::{ActivityDates, CalendarEvent, CalendarView, CourseRef, EventMetadata};
pub use schedule::{Activity, ScheduleData};

/// Credentials for the scraped portal, distinct from any account of the
/// surrounding application.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Requested schedule period at the orchestration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePeriod {
    Day,
    Week,
    Month,
    Upcoming,
}

impl SchedulePeriod {
    /// The calendar view backing this period. The portal has no week
    /// view, so `week` rides on the month view.
    pub fn view(&self) -> CalendarView {
        match self {
            SchedulePeriod::Day => CalendarView::Day,
            SchedulePeriod::Week | SchedulePeriod::Month => CalendarView::Month,
            SchedulePeriod::Upcoming => CalendarView::Upcoming,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulePeriod::Day => "day",
            SchedulePeriod::Week => "week",
            SchedulePeriod::Month => "month",
            SchedulePeriod::Upcoming => "upcoming",
        }
    }
}

impl std::str::FromStr for SchedulePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(SchedulePeriod::Day),
            "week" => Ok(SchedulePeriod::Week),
            "month" => Ok(SchedulePeriod::Month),
            "upcoming" => Ok(SchedulePeriod::Upcoming),
            other => Err(format!(
                "invalid period '{other}', expected day|week|month|upcoming"
            )),
        }
    }
}
