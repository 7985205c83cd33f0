// src/utils/http.rs

//! HTTP transport layer.
//!
//! All portal traffic goes through the [`Transport`] trait so the engine
//! can be exercised against scripted responses. The production
//! [`HttpTransport`] wraps two reqwest clients, one that follows
//! redirects and one that surfaces them, because the login chain and the
//! session validator must inspect `Location` headers directly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use reqwest::redirect;

use crate::error::Result;
use crate::models::PortalConfig;

/// What one portal response looks like to the engine.
#[derive(Debug, Clone, Default)]
pub struct PageResponse {
    pub status: u16,
    /// URL the response was ultimately served from
    pub final_url: String,
    /// `Location` header, present on unfollowed redirects
    pub location: Option<String>,
    /// Raw `Set-Cookie` header values in response order
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl PageResponse {
    /// A plain 200 with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            ..Self::default()
        }
    }

    /// An unfollowed redirect.
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            ..Self::default()
        }
    }

    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        self.final_url = url.into();
        self
    }

    pub fn with_cookies(mut self, cookies: &[&str]) -> Self {
        self.set_cookies = cookies.iter().map(|s| s.to_string()).collect();
        self
    }

    /// True for 3xx statuses.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// True when the `Location` header contains the given fragment.
    pub fn location_contains(&self, fragment: &str) -> bool {
        self.location.as_deref().is_some_and(|l| l.contains(fragment))
    }
}

/// Injectable transport seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a page. `follow_redirects` disabled surfaces the first 3xx.
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        follow_redirects: bool,
    ) -> Result<PageResponse>;

    /// POST a form-encoded body.
    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        form: &[(String, String)],
        follow_redirects: bool,
    ) -> Result<PageResponse>;

    /// POST a JSON body.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
    ) -> Result<PageResponse>;
}

/// Browser-shaped headers the portal expects on document requests.
pub fn browser_headers(cookie_header: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8".to_string(),
        ),
        ("Accept-Language".to_string(), "es-419,es;q=0.9,en;q=0.8".to_string()),
        ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
    ];
    if let Some(cookie) = cookie_header {
        if !cookie.is_empty() {
            headers.push(("Cookie".to_string(), cookie.to_string()));
        }
    }
    headers
}

/// Headers for the portal's AJAX endpoint.
pub fn ajax_headers(cookie_header: &str, origin: &str, referer: &str) -> Vec<(String, String)> {
    vec![
        (
            "Accept".to_string(),
            "application/json, text/javascript, */*; q=0.01".to_string(),
        ),
        ("Accept-Language".to_string(), "es-419,es;q=0.9".to_string()),
        ("Cookie".to_string(), cookie_header.to_string()),
        ("Origin".to_string(), origin.to_string()),
        ("Referer".to_string(), referer.to_string()),
        ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
    ]
}

/// Production transport over reqwest.
pub struct HttpTransport {
    following: reqwest::Client,
    manual: reqwest::Client,
}

impl HttpTransport {
    /// Build the transport from portal settings. TLS verification stays
    /// strict unless the configuration explicitly opts out.
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let base = |policy: redirect::Policy| {
            reqwest::Client::builder()
                .user_agent(&config.user_agent)
                .timeout(Duration::from_secs(config.timeout_secs))
                .redirect(policy)
                .danger_accept_invalid_certs(config.accept_invalid_certs)
                .build()
        };
        Ok(Self {
            following: base(redirect::Policy::limited(10))?,
            manual: base(redirect::Policy::none())?,
        })
    }

    fn client(&self, follow_redirects: bool) -> &reqwest::Client {
        if follow_redirects {
            &self.following
        } else {
            &self.manual
        }
    }

    async fn into_page(response: reqwest::Response) -> Result<PageResponse> {
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let body = response.text().await?;
        Ok(PageResponse {
            status,
            final_url,
            location,
            set_cookies,
            body,
        })
    }

    fn apply_headers(
        mut request: reqwest::RequestBuilder,
        headers: &[(String, String)],
    ) -> reqwest::RequestBuilder {
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        follow_redirects: bool,
    ) -> Result<PageResponse> {
        let request = Self::apply_headers(self.client(follow_redirects).get(url), headers);
        Self::into_page(request.send().await?).await
    }

    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        form: &[(String, String)],
        follow_redirects: bool,
    ) -> Result<PageResponse> {
        let request = Self::apply_headers(self.client(follow_redirects).post(url), headers)
            .form(&form.to_vec());
        Self::into_page(request.send().await?).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
    ) -> Result<PageResponse> {
        let request = Self::apply_headers(self.client(true).post(url), headers)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(body)?);
        Self::into_page(request.send().await?).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_helpers() {
        let response = PageResponse::redirect(303, "https://e.edu/login/index.php");
        assert!(response.is_redirect());
        assert!(response.location_contains("/login/"));
        assert!(!response.location_contains("testsession"));
        assert!(!PageResponse::ok("hi").is_redirect());
    }

    #[test]
    fn test_browser_headers_cookie_optional() {
        assert!(
            !browser_headers(None)
                .iter()
                .any(|(name, _)| name == "Cookie")
        );
        assert!(
            browser_headers(Some("a=1"))
                .iter()
                .any(|(name, value)| name == "Cookie" && value == "a=1")
        );
        assert!(
            !browser_headers(Some(""))
                .iter()
                .any(|(name, _)| name == "Cookie")
        );
    }
}
