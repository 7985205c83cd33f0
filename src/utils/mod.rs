//! Utility functions and helpers.

pub mod cookies;
pub mod http;
pub mod time;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string, passing absolute
/// URLs through untouched.
pub fn absolutize(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match Url::parse(base_url) {
        Ok(base) => resolve_url(&base, href),
        Err(_) => href.to_string(),
    }
}

/// Extract the `id` query parameter value from a URL.
pub fn extract_id_param(url: &str) -> Option<String> {
    let re = regex::Regex::new(r"[?&]id=(\d+)").ok()?;
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract a course id from a `course/view.php?id=<n>` link.
pub fn extract_course_view_id(href: &str) -> Option<String> {
    let re = regex::Regex::new(r"course/view\.php\?id=(\d+)").ok()?;
    re.captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://sima.example.edu", "/mod/assign/view.php?id=3"),
            "https://sima.example.edu/mod/assign/view.php?id=3"
        );
        assert_eq!(
            absolutize("https://sima.example.edu", "course/view.php?id=1"),
            "https://sima.example.edu/course/view.php?id=1"
        );
        assert_eq!(
            absolutize("https://sima.example.edu", "https://other.edu/x"),
            "https://other.edu/x"
        );
    }

    #[test]
    fn test_extract_id_param() {
        assert_eq!(
            extract_id_param("https://e.edu/mod/assign/view.php?id=123"),
            Some("123".to_string())
        );
        assert_eq!(
            extract_id_param("https://e.edu/view.php?course=4&id=9"),
            Some("9".to_string())
        );
        assert_eq!(extract_id_param("https://e.edu/view.php"), None);
    }

    #[test]
    fn test_extract_course_view_id() {
        assert_eq!(
            extract_course_view_id("https://e.edu/course/view.php?id=42"),
            Some("42".to_string())
        );
        assert_eq!(extract_course_view_id("https://e.edu/my/"), None);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n b\t c  "), "a b c");
    }
}
