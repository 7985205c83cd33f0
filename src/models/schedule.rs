//! Schedule-facing projections of calendar events.

use serde::{Deserialize, Serialize};

use super::event::{ActivityDates, CourseRef, EventMetadata};

/// The schedule-facing projection of a calendar event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,

    pub title: String,

    /// Zero-padded "HH:MM"
    pub start_time: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(rename = "type")]
    pub activity_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_dates: Option<ActivityDates>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
}

/// All activities falling on one calendar date.
///
/// `date` is ISO "YYYY-MM-DD"; activities are sorted ascending by
/// `start_time`, which is lexicographically valid for zero-padded times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleData {
    pub date: String,
    pub activities: Vec<Activity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_wire_names() {
        let activity = Activity {
            id: "9".into(),
            title: "Entrega".into(),
            start_time: "08:30".into(),
            end_time: None,
            description: None,
            location: None,
            activity_type: "assign".into(),
            activity_dates: None,
            course: None,
            url: None,
            metadata: None,
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["startTime"], "08:30");
        assert_eq!(json["type"], "assign");
        assert!(json.get("endTime").is_none());
    }
}
