//! Course discovery and per-course activity data structures.

use serde::{Deserialize, Serialize};

use super::event::ActivityDates;

/// A course as the portal lists it for the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseInfo {
    /// Portal-internal numeric identifier, the foreign key for every
    /// per-course scraping call
    pub id: String,

    /// Full display name
    pub name: String,

    /// Short name
    pub shortname: String,
}

/// One activity inside a course section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseActivity {
    pub id: String,

    pub name: String,

    /// Module type token, e.g. "assign", "quiz", "resource"
    #[serde(rename = "type")]
    pub activity_type: String,

    /// Section number the activity belongs to
    pub section: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<ActivityDates>,

    /// Icon image source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CourseActivity {
    /// True when the activity carries a non-empty submission window.
    pub fn has_dates(&self) -> bool {
        self.dates.as_ref().is_some_and(|d| !d.is_empty())
    }
}

/// A course section with its parsed activities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseSection {
    pub section_number: u32,
    pub section_name: String,
    pub activities: Vec<CourseActivity>,
}

/// The section-scoped view of a single course.
///
/// Invariant: `total_activities` equals the sum of activity counts over
/// the sections actually present; errored or empty sections are omitted,
/// never zero-filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseSchedule {
    pub course_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,

    pub sections: Vec<CourseSection>,

    pub total_activities: usize,

    /// RFC 3339 timestamp of the scrape
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_activity(dates: Option<ActivityDates>) -> CourseActivity {
        CourseActivity {
            id: "101".into(),
            name: "Protocolo individual".into(),
            activity_type: "assign".into(),
            section: 1,
            section_name: Some("UNIDAD 1".into()),
            url: Some("https://e.edu/mod/assign/view.php?id=101".into()),
            dates,
            icon: None,
            description: None,
        }
    }

    #[test]
    fn test_has_dates() {
        assert!(!sample_activity(None).has_dates());
        assert!(!sample_activity(Some(ActivityDates::default())).has_dates());
        assert!(
            sample_activity(Some(ActivityDates {
                apertura: Some("lunes, 6 de octubre".into()),
                cierre: None,
            }))
            .has_dates()
        );
    }

    #[test]
    fn test_schedule_wire_names() {
        let schedule = CourseSchedule {
            course_id: "42".into(),
            course_name: Some("IS301".into()),
            sections: vec![],
            total_activities: 0,
            last_updated: "2025-10-11T00:00:00Z".into(),
        };
        let json = serde_json::to_value(&schedule).unwrap();
        assert!(json["courseId"].is_string());
        assert!(json["totalActivities"].is_number());
        assert!(json["lastUpdated"].is_string());
    }

    #[test]
    fn test_activity_type_wire_name() {
        let json = serde_json::to_value(sample_activity(None)).unwrap();
        assert_eq!(json["type"], "assign");
        assert_eq!(json["sectionName"], "UNIDAD 1");
    }
}
