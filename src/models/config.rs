//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Portal connection settings
    #[serde(default)]
    pub portal: PortalConfig,

    /// Schedule orchestration settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Course scraping settings
    #[serde(default)]
    pub courses: CoursesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.portal.base_url.trim().is_empty() {
            return Err(AppError::config("portal.base_url is empty"));
        }
        if url::Url::parse(&self.portal.base_url).is_err() {
            return Err(AppError::config(format!(
                "portal.base_url is not a valid URL: {}",
                self.portal.base_url
            )));
        }
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::config("portal.user_agent is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::config("portal.timeout_secs must be > 0"));
        }
        if self.schedule.day_search_limit == 0 {
            return Err(AppError::config("schedule.day_search_limit must be > 0"));
        }
        if self.courses.section_range_start > self.courses.section_range_end {
            return Err(AppError::config(
                "courses.section_range_start must be <= courses.section_range_end",
            ));
        }
        if self.courses.listing_paths.is_empty() {
            return Err(AppError::config("courses.listing_paths is empty"));
        }
        Ok(())
    }
}

/// Portal connection settings.
///
/// The portal root URL is an external dependency subject to change, so it
/// must never be hard-coded anywhere but here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Root URL of the scraped portal (no trailing slash)
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between sequential requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Accept invalid TLS certificates. Strict verification is the
    /// default; enable only against a portal with a broken chain.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            accept_invalid_certs: false,
        }
    }
}

impl PortalConfig {
    /// Build a full URL from a path relative to the portal root.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{}/", base)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// Schedule orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Maximum days to probe forward when a day query returns no events.
    /// The cap is a heuristic with no documented business rule, hence a
    /// knob rather than a constant.
    #[serde(default = "defaults::day_search_limit")]
    pub day_search_limit: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            day_search_limit: defaults::day_search_limit(),
        }
    }
}

/// Course scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursesConfig {
    /// First numbered section fetched per course
    #[serde(default = "defaults::section_start")]
    pub section_range_start: u32,

    /// Last numbered section fetched per course (inclusive)
    #[serde(default = "defaults::section_end")]
    pub section_range_end: u32,

    /// Candidate "my courses" paths, probed in order
    #[serde(default = "defaults::listing_paths")]
    pub listing_paths: Vec<String>,
}

impl Default for CoursesConfig {
    fn default() -> Self {
        Self {
            section_range_start: defaults::section_start(),
            section_range_end: defaults::section_end(),
            listing_paths: defaults::listing_paths(),
        }
    }
}

mod defaults {
    // Portal defaults
    pub fn base_url() -> String {
        "https://sima.unicartagena.edu.co".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/141.0.0.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Schedule defaults
    pub fn day_search_limit() -> u32 {
        30
    }

    // Course defaults
    pub fn section_start() -> u32 {
        1
    }
    pub fn section_end() -> u32 {
        5
    }
    pub fn listing_paths() -> Vec<String> {
        vec![
            "course/index.php".into(),
            "my/courses.php".into(),
            "".into(),
            "my/".into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_base_url() {
        let mut config = Config::default();
        config.portal.base_url = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_day_search_limit() {
        let mut config = Config::default();
        config.schedule.day_search_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_section_range() {
        let mut config = Config::default();
        config.courses.section_range_start = 6;
        config.courses.section_range_end = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let mut portal = PortalConfig::default();
        portal.base_url = "https://example.edu/".to_string();
        assert_eq!(
            portal.url("/calendar/view.php"),
            "https://example.edu/calendar/view.php"
        );
        assert_eq!(portal.url(""), "https://example.edu/");
    }
}
