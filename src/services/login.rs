// src/services/login.rs

//! Authenticated-session acquisition.
//!
//! The portal's login is a short redirect dance: fetch the form and its
//! anti-CSRF token, submit credentials with redirects disabled, then
//! classify the redirect target. A `testsession=` location is the
//! portal's session-bridging hop and must be followed manually so every
//! intermediate `Set-Cookie` lands in the jar; no single response
//! carries the complete cookie set.

use std::sync::Arc;

use scraper::{Html, Selector};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, Credentials};
use crate::utils::absolutize;
use crate::utils::cookies::CookieJar;
use crate::utils::http::{PageResponse, Transport, browser_headers};

/// Which stage of the login chain a hop belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoginStep {
    FetchToken,
    SubmitCredentials,
    FollowBridge,
    FetchLanding,
}

/// One observed request/response of the login chain, kept as data so the
/// state machine is inspectable without log scraping.
#[derive(Debug, Clone, Serialize)]
pub struct LoginHop {
    pub step: LoginStep,
    pub url: String,
    pub status: u16,
    pub location: Option<String>,
    pub cookies_received: usize,
}

/// Session details of a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub login_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// Terminal result of the login state machine.
///
/// Credential rejection is a `success: false` outcome, never an `Err`;
/// only transport failures on the chain propagate as errors.
#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub success: bool,

    /// Union of every cookie observed across all hops
    pub cookies: Vec<String>,

    #[serde(rename = "sessionData", skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Hop-by-hop trace, not part of the wire contract
    #[serde(skip)]
    pub trace: Vec<LoginHop>,
}

const BRIDGE_MARKER: &str = "testsession=";
const LOGIN_PATH: &str = "/login/";

/// Performs the multi-hop login against the portal.
pub struct LoginEngine {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl LoginEngine {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Run the login chain to a terminal state.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        let mut jar = CookieJar::new();
        let mut trace = Vec::new();

        // FetchToken
        let login_url = self.config.portal.url("login/index.php");
        let token_page = self
            .transport
            .get(&login_url, &browser_headers(None), true)
            .await?;
        jar.extend(&token_page.set_cookies);
        record(&mut trace, LoginStep::FetchToken, &login_url, &token_page);

        let Some(login_token) = extract_login_token(&token_page.body) else {
            return Err(AppError::LoginTokenNotFound);
        };

        // SubmitCredentials, redirects disabled so the 302/303 success
        // signal and its Location are inspectable.
        let form = vec![
            ("logintoken".to_string(), login_token.clone()),
            ("username".to_string(), credentials.username.clone()),
            ("password".to_string(), credentials.password.clone()),
        ];
        let mut headers = browser_headers(Some(&jar.header()));
        headers.push(("Origin".to_string(), self.config.portal.base_url.clone()));
        headers.push(("Referer".to_string(), login_url.clone()));
        let submit = self
            .transport
            .post_form(&login_url, &headers, &form, false)
            .await?;
        jar.extend(&submit.set_cookies);
        record(&mut trace, LoginStep::SubmitCredentials, &login_url, &submit);

        // ClassifyRedirect
        if submit.is_redirect() {
            if submit.location_contains(LOGIN_PATH) {
                let message = scrape_login_error(&submit.body)
                    .unwrap_or_else(|| "Authentication failed - invalid credentials".to_string());
                return Ok(failed(message, jar, trace));
            }
            if submit.location_contains(BRIDGE_MARKER) {
                let bridge_url = absolutize(
                    &self.config.portal.base_url,
                    submit.location.as_deref().unwrap_or_default(),
                );
                return self
                    .follow_bridge(&bridge_url, login_token, jar, trace)
                    .await;
            }
            let redirect_url = submit.location.clone();
            return Ok(authenticated(login_token, redirect_url, jar, trace));
        }

        // NoRedirect fallback: a 200 page either carries a rendered
        // error, or the absence of the username input means we are in.
        if let Some(message) = scrape_login_error(&submit.body) {
            return Ok(failed(message, jar, trace));
        }
        if !has_username_input(&submit.body) {
            return Ok(authenticated(login_token, None, jar, trace));
        }
        Ok(failed(
            "Authentication failed - invalid credentials".to_string(),
            jar,
            trace,
        ))
    }

    /// Follow the session-bridging redirect, merging cookies at every
    /// hop. Bounded: at most two further requests.
    async fn follow_bridge(
        &self,
        bridge_url: &str,
        login_token: String,
        mut jar: CookieJar,
        mut trace: Vec<LoginHop>,
    ) -> Result<LoginOutcome> {
        let headers = browser_headers(Some(&jar.header()));
        let bridge = self.transport.get(bridge_url, &headers, false).await?;
        jar.extend(&bridge.set_cookies);
        record(&mut trace, LoginStep::FollowBridge, bridge_url, &bridge);

        if bridge.is_redirect() {
            if bridge.location_contains(LOGIN_PATH) {
                return Ok(failed(
                    "Session bridge bounced back to login".to_string(),
                    jar,
                    trace,
                ));
            }
            if !bridge.location_contains(BRIDGE_MARKER) {
                // The bridge settled; one more hop reaches the
                // authenticated landing page.
                let landing_url = absolutize(
                    &self.config.portal.base_url,
                    bridge.location.as_deref().unwrap_or_default(),
                );
                let headers = browser_headers(Some(&jar.header()));
                let landing = self.transport.get(&landing_url, &headers, true).await?;
                jar.extend(&landing.set_cookies);
                record(&mut trace, LoginStep::FetchLanding, &landing_url, &landing);

                let redirect_url = non_empty(landing.final_url).or(Some(landing_url));
                return Ok(authenticated(login_token, redirect_url, jar, trace));
            }
        }

        // Stalled at the bridge: one explicit GET to the dashboard
        // forces the portal to issue the final session cookie.
        let dashboard_url = self.config.portal.url("my/");
        let headers = browser_headers(Some(&jar.header()));
        let dashboard = self.transport.get(&dashboard_url, &headers, true).await?;
        jar.extend(&dashboard.set_cookies);
        record(&mut trace, LoginStep::FetchLanding, &dashboard_url, &dashboard);

        let redirect_url = non_empty(dashboard.final_url).or(Some(dashboard_url));
        Ok(authenticated(login_token, redirect_url, jar, trace))
    }
}

fn record(trace: &mut Vec<LoginHop>, step: LoginStep, url: &str, response: &PageResponse) {
    trace.push(LoginHop {
        step,
        url: url.to_string(),
        status: response.status,
        location: response.location.clone(),
        cookies_received: response.set_cookies.len(),
    });
}

fn authenticated(
    login_token: String,
    redirect_url: Option<String>,
    jar: CookieJar,
    trace: Vec<LoginHop>,
) -> LoginOutcome {
    LoginOutcome {
        success: true,
        cookies: jar.into_raw(),
        session: Some(SessionData {
            login_token,
            redirect_url,
        }),
        error: None,
        trace,
    }
}

fn failed(message: String, jar: CookieJar, trace: Vec<LoginHop>) -> LoginOutcome {
    LoginOutcome {
        success: false,
        cookies: jar.into_raw(),
        session: None,
        error: Some(message),
        trace,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn extract_login_token(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse(r#"input[name="logintoken"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("value"))
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn scrape_login_error(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let document = Html::parse_document(body);
    let selector = Selector::parse(".alert-danger, .error").ok()?;
    let text: String = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect())?;
    let text = text.trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

fn has_username_input(body: &str) -> bool {
    let document = Html::parse_document(body);
    match Selector::parse(r#"input[name="username"]"#) {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::stub::StubTransport;

    const LOGIN_FORM: &str = r#"<html><form id="login">
        <input type="hidden" name="logintoken" value="tok123">
        <input name="username"><input name="password">
        </form></html>"#;

    fn engine(stub: StubTransport) -> LoginEngine {
        LoginEngine::new(Arc::new(Config::default()), Arc::new(stub))
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "student".into(),
            password: "hunter2".into(),
        }
    }

    #[tokio::test]
    async fn test_direct_redirect_success() {
        let stub = StubTransport::new()
            .on_once(
                "login/index.php",
                PageResponse::ok(LOGIN_FORM).with_cookies(&["MoodleSession=initial; path=/"]),
            )
            .on_once(
                "login/index.php",
                PageResponse::redirect(303, "https://sima.unicartagena.edu.co/my/")
                    .with_cookies(&["MoodleSession=after; path=/"]),
            );
        let outcome = engine(stub).login(&credentials()).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.cookies.len(), 2);
        let session = outcome.session.unwrap();
        assert_eq!(session.login_token, "tok123");
        assert_eq!(
            session.redirect_url.as_deref(),
            Some("https://sima.unicartagena.edu.co/my/")
        );
        assert_eq!(outcome.trace.len(), 2);
        assert_eq!(outcome.trace[1].step, LoginStep::SubmitCredentials);
    }

    #[tokio::test]
    async fn test_redirect_back_to_login_fails() {
        let stub = StubTransport::new()
            .on_once("login/index.php", PageResponse::ok(LOGIN_FORM))
            .on_once(
                "login/index.php",
                PageResponse::redirect(
                    303,
                    "https://sima.unicartagena.edu.co/login/index.php?errorcode=3",
                ),
            );
        let outcome = engine(stub).login(&credentials()).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn test_bridge_redirect_merges_both_hops() {
        let bridge = "https://sima.unicartagena.edu.co/login/index.php?testsession=1042";
        let stub = StubTransport::new()
            .on_once(
                "login/index.php",
                PageResponse::ok(LOGIN_FORM).with_cookies(&["MoodleSession=first; path=/"]),
            )
            .on_once("login/index.php", PageResponse::redirect(303, bridge))
            .on_once(
                "testsession=",
                PageResponse::redirect(302, "https://sima.unicartagena.edu.co/my/")
                    .with_cookies(&["MoodleSession=bridged; path=/; HttpOnly"]),
            )
            .on_once(
                "my/",
                PageResponse::ok("<html>Área personal</html>")
                    .with_final_url("https://sima.unicartagena.edu.co/my/"),
            );
        let outcome = engine(stub).login(&credentials()).await.unwrap();
        assert!(outcome.success);
        // Cookies from the token hop and the bridge hop are both kept.
        assert!(outcome.cookies.iter().any(|c| c.contains("first")));
        assert!(outcome.cookies.iter().any(|c| c.contains("bridged")));
        assert_eq!(outcome.trace.len(), 4);
        assert_eq!(outcome.trace[2].step, LoginStep::FollowBridge);
        assert_eq!(outcome.trace[3].step, LoginStep::FetchLanding);
    }

    #[tokio::test]
    async fn test_bridge_stall_probes_dashboard() {
        let bridge = "https://sima.unicartagena.edu.co/login/index.php?testsession=7";
        let stub = StubTransport::new()
            .on_once("login/index.php", PageResponse::ok(LOGIN_FORM))
            .on_once("login/index.php", PageResponse::redirect(303, bridge))
            .on_once("testsession=", PageResponse::ok("<html>still here</html>"))
            .on_once(
                "my/",
                PageResponse::ok("<html>dash</html>")
                    .with_cookies(&["MoodleSession=final; path=/"])
                    .with_final_url("https://sima.unicartagena.edu.co/my/"),
            );
        let outcome = engine(stub).login(&credentials()).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.cookies.iter().any(|c| c.contains("final")));
    }

    #[tokio::test]
    async fn test_missing_login_token_is_error() {
        let stub = StubTransport::new().on_once(
            "login/index.php",
            PageResponse::ok("<html><form></form></html>"),
        );
        let err = engine(stub).login(&credentials()).await.unwrap_err();
        assert!(matches!(err, AppError::LoginTokenNotFound));
    }

    #[tokio::test]
    async fn test_rendered_error_message_surfaced() {
        let stub = StubTransport::new()
            .on_once("login/index.php", PageResponse::ok(LOGIN_FORM))
            .on_once(
                "login/index.php",
                PageResponse::ok(concat!(
                    r#"<div class="alert-danger">Datos erróneos. Por favor,"#,
                    r#" inténtelo otra vez.</div>"#,
                    r#"<form><input name="username"></form>"#,
                )),
            );
        let outcome = engine(stub).login(&credentials()).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().starts_with("Datos erróneos"));
    }

    #[tokio::test]
    async fn test_plain_page_without_username_input_is_success() {
        let stub = StubTransport::new()
            .on_once("login/index.php", PageResponse::ok(LOGIN_FORM))
            .on_once(
                "login/index.php",
                PageResponse::ok("<html><div>Área personal</div></html>"),
            );
        let outcome = engine(stub).login(&credentials()).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.session.unwrap().redirect_url.is_none());
    }
}
