// src/services/mod.rs

//! Portal-facing scraping services.

pub mod activities;
pub mod calendar;
pub mod course_activities;
pub mod courses;
pub mod event_type;
pub mod login;
pub mod session;
pub mod shapes;

pub use activities::{ActivityDatesScraper, EnrichOutcome};
pub use calendar::CalendarScraper;
pub use course_activities::{CourseActivitiesScraper, CourseScrapeOutcome};
pub use courses::CourseDiscovery;
pub use login::{LoginEngine, LoginOutcome, SessionData};
pub use session::SessionProbe;
