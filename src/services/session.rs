// src/services/session.rs

//! Session key resolution and cookie-jar validation.

use std::sync::Arc;

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::utils::cookies::CookieJar;
use crate::utils::http::{Transport, browser_headers};

/// Login-form markers that expose an unauthenticated response.
pub(crate) fn has_login_form(body: &str) -> bool {
    let has_username = body.contains(r#"name="username""#) || body.contains(r#"id="username""#);
    let has_password = body.contains(r#"name="password""#) || body.contains(r#"id="password""#);
    has_username && has_password
}

/// Resolves sesskeys and validates cookie jars against the portal.
pub struct SessionProbe {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl SessionProbe {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Fetch an authenticated page and extract the anti-CSRF sesskey.
    ///
    /// The token is cheap to fetch and only valid alongside its cookie
    /// jar, so it is re-derived per AJAX call, never cached. Both error
    /// variants are "re-authenticate" signals to the caller.
    pub async fn get_session_key(&self, jar: &CookieJar) -> Result<String> {
        let url = self.config.portal.url("calendar/view.php");
        let headers = browser_headers(Some(&jar.header()));
        let response = self.transport.get(&url, &headers, true).await?;

        if response.final_url.contains("/login/") {
            return Err(AppError::SessionExpired);
        }

        extract_sesskey(&response.body).ok_or(AppError::SessionKeyNotFound)
    }

    /// Probe an authenticated-only landing page and report whether the
    /// jar still carries a live session.
    ///
    /// Never errs on a successful exchange; only transport failures
    /// propagate, which callers treat as "cannot determine, assume
    /// invalid".
    pub async fn validate_session(&self, jar: &CookieJar) -> Result<bool> {
        let url = self.config.portal.url("my/");
        let headers = browser_headers(Some(&jar.header()));
        let response = self.transport.get(&url, &headers, false).await?;

        if response.is_redirect() {
            return Ok(!response.location_contains("/login/"));
        }

        if has_login_form(&response.body) || response.body.contains("loginform") {
            return Ok(false);
        }

        Ok(true)
    }
}

/// Extract the sesskey from page HTML, trying the named input, then a
/// data attribute, then a raw-text regex.
fn extract_sesskey(body: &str) -> Option<String> {
    let document = Html::parse_document(body);

    if let Ok(selector) = Selector::parse(r#"input[name="sesskey"]"#) {
        if let Some(value) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("value"))
        {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    if let Ok(selector) = Selector::parse("[data-sesskey]") {
        if let Some(value) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("data-sesskey"))
        {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    let re = regex::Regex::new(r#"(?i)sesskey["']?\s*[:=]\s*["']?([^"',\s]+)"#).ok()?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}
