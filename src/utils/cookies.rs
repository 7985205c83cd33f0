// src/utils/cookies.rs

//! Cookie jar handling.
//!
//! The portal issues session cookies incrementally across a login chain;
//! the jar keeps every raw `Set-Cookie` string in arrival order and
//! canonicalizes them into a single `Cookie` request header on demand.

use serde::{Deserialize, Serialize};

/// Accumulated session cookies for one browsing session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CookieJar {
    raw: Vec<String>,
}

impl CookieJar {
    /// Create an empty jar, the starting state of a login chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a jar from raw cookie strings persisted by the caller.
    pub fn from_raw(raw: Vec<String>) -> Self {
        Self { raw }
    }

    /// Append the `Set-Cookie` strings of one response.
    pub fn extend(&mut self, set_cookies: &[String]) {
        self.raw.extend_from_slice(set_cookies);
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// The raw cookie strings in arrival order.
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    pub fn into_raw(self) -> Vec<String> {
        self.raw
    }

    /// Serialize into a `Cookie` header value.
    ///
    /// Each raw string is cut at the first `;` and split into its
    /// `name=value` pair; duplicate names keep the value of the later
    /// entry. Malformed entries are silently skipped.
    pub fn header(&self) -> String {
        // Insertion-ordered map, last write wins on the value.
        let mut names: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        for raw in &self.raw {
            let pair = raw.split(';').next().unwrap_or("");
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            match names.iter().position(|n| n == name) {
                Some(idx) => values[idx] = value.to_string(),
                None => {
                    names.push(name.to_string());
                    values.push(value.to_string());
                }
            }
        }

        names
            .iter()
            .zip(values.iter())
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// True when any cookie name contains the given substring,
    /// case-insensitively.
    pub fn has_cookie_like(&self, fragment: &str) -> bool {
        let fragment = fragment.to_lowercase();
        self.raw.iter().any(|c| c.to_lowercase().contains(&fragment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar(raw: &[&str]) -> CookieJar {
        CookieJar::from_raw(raw.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_header_joins_pairs() {
        let jar = jar(&[
            "MoodleSession=abc123; path=/; HttpOnly",
            "MOODLEID1_=deadbeef; expires=Fri, 01 Jan 2027 00:00:00 GMT",
        ]);
        assert_eq!(jar.header(), "MoodleSession=abc123; MOODLEID1_=deadbeef");
    }

    #[test]
    fn test_later_duplicate_wins() {
        let jar = jar(&[
            "MoodleSession=first; path=/",
            "other=1",
            "MoodleSession=second; path=/; Secure",
        ]);
        assert_eq!(jar.header(), "MoodleSession=second; other=1");
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let jar = jar(&["novalue", "=orphan", "ok=1", "empty=; path=/"]);
        assert_eq!(jar.header(), "ok=1");
    }

    #[test]
    fn test_header_deterministic_for_input_order() {
        let a = jar(&["x=1", "y=2", "x=3"]);
        let b = jar(&["x=1", "y=2", "x=3"]);
        assert_eq!(a.header(), b.header());
        assert_eq!(a.header(), "x=3; y=2");
    }

    #[test]
    fn test_extend_accumulates() {
        let mut jar = CookieJar::new();
        assert!(jar.is_empty());
        jar.extend(&["a=1".to_string()]);
        jar.extend(&["b=2".to_string(), "a=9".to_string()]);
        assert_eq!(jar.len(), 3);
        assert_eq!(jar.header(), "a=9; b=2");
    }

    #[test]
    fn test_has_cookie_like() {
        let jar = jar(&["MoodleSession=abc; HttpOnly"]);
        assert!(jar.has_cookie_like("moodlesession"));
        assert!(!jar.has_cookie_like("sesskey"));
    }
}
