// src/main.rs

//! sima-scraper: session-emulating scraper CLI for the SIMA portal.
//!
//! Every command prints its result as JSON on stdout; session cookies
//! persist in a local file between commands, so `login` once and then
//! query.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;

use sima_scraper::error::{AppError, Result};
use sima_scraper::models::{CalendarView, Config, Credentials, SchedulePeriod};
use sima_scraper::pipeline::SchedulePipeline;
use sima_scraper::services::{
    ActivityDatesScraper, CalendarScraper, CourseActivitiesScraper, CourseDiscovery, LoginEngine,
    SessionProbe,
};
use sima_scraper::utils::cookies::CookieJar;
use sima_scraper::utils::http::HttpTransport;

#[derive(Parser, Debug)]
#[command(
    name = "sima-scraper",
    version,
    about = "Session-emulating scraper for the SIMA student portal"
)]
struct Cli {
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    /// Cookie jar file, written by `login` and read by every other
    /// command
    #[arg(long, default_value = "data/cookies.json")]
    cookies: String,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session cookies
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Password; falls back to the SIMA_PASSWORD environment
        /// variable
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Check whether the stored session is still alive
    Validate,
    /// List enrolled courses
    Courses,
    /// Scrape the schedule for a period
    Schedule {
        /// day, week, month or upcoming
        #[arg(long, default_value = "day")]
        period: String,
        #[arg(long)]
        course: Option<String>,
        /// Start date (YYYY-MM-DD) for day queries, default today
        #[arg(long)]
        date: Option<String>,
    },
    /// Upcoming events, raw
    Upcoming {
        #[arg(long)]
        course: Option<String>,
        /// Also fetch each deadline's submission window
        #[arg(long)]
        with_dates: bool,
    },
    /// Section-by-section activities of one or more courses
    Activities {
        #[arg(required = true)]
        course_ids: Vec<String>,
        /// Keep only activities carrying a submission window
        #[arg(long)]
        with_dates: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    }
    builder.init();

    let config = Arc::new(Config::load_or_default(&cli.config));
    config.validate()?;
    let transport = Arc::new(HttpTransport::new(&config.portal)?);

    match cli.command {
        Command::Login { username, password } => {
            let credentials = resolve_credentials(username, password)?;
            let engine = LoginEngine::new(config, transport);
            let outcome = engine.login(&credentials).await?;
            if outcome.success {
                save_cookies(&cli.cookies, &outcome.cookies)?;
                info!("session cookies written to {}", cli.cookies);
            }
            print_json(&outcome)?;
        }
        Command::Validate => {
            let jar = load_cookies(&cli.cookies)?;
            let probe = SessionProbe::new(config, transport);
            let valid = probe.validate_session(&jar).await?;
            print_json(&serde_json::json!({ "valid": valid }))?;
        }
        Command::Courses => {
            let jar = load_cookies(&cli.cookies)?;
            let discovery = CourseDiscovery::new(config, transport);
            let courses = discovery.discover(&jar).await?;
            print_json(&courses)?;
        }
        Command::Schedule {
            period,
            course,
            date,
        } => {
            let jar = load_cookies(&cli.cookies)?;
            let period: SchedulePeriod = period.parse().map_err(AppError::Config)?;
            let date = date.map(|d| parse_date(&d)).transpose()?;
            let pipeline = SchedulePipeline::new(config, transport);
            let outcome = pipeline
                .scrape(&jar, period, course.as_deref(), date)
                .await?;
            print_json(&serde_json::json!({
                "schedule": outcome.schedule,
                "matchedDate": outcome.matched_date,
            }))?;
        }
        Command::Upcoming { course, with_dates } => {
            let jar = load_cookies(&cli.cookies)?;
            let calendar = CalendarScraper::new(config.clone(), transport.clone());
            let events = calendar
                .get_events(&jar, CalendarView::Upcoming, course.as_deref(), None)
                .await?;
            let events = if with_dates {
                let enricher = ActivityDatesScraper::new(config, transport);
                enricher.enhance_events(&jar, events).await.events
            } else {
                events
            };
            print_json(&events)?;
        }
        Command::Activities {
            course_ids,
            with_dates,
        } => {
            let jar = load_cookies(&cli.cookies)?;
            let scraper = CourseActivitiesScraper::new(config, transport);
            let mut schedules = Vec::new();
            if with_dates {
                for course_id in &course_ids {
                    match scraper.get_course_activities_with_dates(&jar, course_id).await {
                        Ok(outcome) => schedules.push(outcome.schedule),
                        Err(err) => log::warn!("course {course_id} skipped: {err}"),
                    }
                }
            } else {
                for outcome in scraper
                    .get_multiple_courses_activities(&jar, &course_ids)
                    .await
                {
                    schedules.push(outcome.schedule);
                }
            }
            print_json(&schedules)?;
        }
    }

    Ok(())
}

fn resolve_credentials(username: Option<String>, password: Option<String>) -> Result<Credentials> {
    let username = username
        .or_else(|| std::env::var("SIMA_USERNAME").ok())
        .ok_or_else(|| AppError::config("username missing: pass --username or set SIMA_USERNAME"))?;
    let password = password
        .or_else(|| std::env::var("SIMA_PASSWORD").ok())
        .ok_or_else(|| AppError::config("password missing: pass --password or set SIMA_PASSWORD"))?;
    Ok(Credentials { username, password })
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| AppError::config(format!("invalid date '{text}', expected YYYY-MM-DD")))
}

fn load_cookies(path: &str) -> Result<CookieJar> {
    let content = fs::read_to_string(path).map_err(|_| {
        AppError::config(format!("no cookie jar at {path}; run `login` first"))
    })?;
    let raw: Vec<String> = serde_json::from_str(&content)?;
    Ok(CookieJar::from_raw(raw))
}

fn save_cookies(path: &str, cookies: &[String]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(cookies)?)?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
