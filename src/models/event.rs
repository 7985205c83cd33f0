//! Calendar event data structures.

use serde::{Deserialize, Serialize};

/// A course as the portal attaches it to an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseRef {
    /// Portal-internal numeric identifier
    pub id: String,

    /// Full course name as displayed
    pub fullname: String,

    /// Short name, usually the last dash-separated segment
    pub shortname: String,
}

impl CourseRef {
    /// Build a reference from a display name, deriving the short name
    /// the way the portal formats course titles ("CODE - NAME").
    pub fn from_fullname(id: impl Into<String>, fullname: &str) -> Self {
        let shortname = fullname
            .rsplit('-')
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fullname.to_string());
        Self {
            id: id.into(),
            fullname: fullname.to_string(),
            shortname,
        }
    }
}

/// Submission window of an activity, as labeled on its page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityDates {
    /// "Apertura:" / "Abrió:" label text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apertura: Option<String>,

    /// "Cierre:" / "Cerró:" label text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cierre: Option<String>,
}

impl ActivityDates {
    /// True when neither boundary was found.
    pub fn is_empty(&self) -> bool {
        self.apertura.is_none() && self.cierre.is_none()
    }
}

/// Extra context captured by the HTML parsers that the portal's own
/// event endpoints do not expose.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// Section-level date text, e.g. "sábado, 11 de octubre de 2025"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Time-of-day text, e.g. "14:30"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Action description, e.g. "Vencimiento de Tarea"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,

    /// Action button label, e.g. "Agregar entrega"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_button: Option<String>,

    /// Action button target URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_button_url: Option<String>,

    /// Activity icon title/alt text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_icon: Option<String>,

    /// Month-grid component attribute, e.g. "mod_assign"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    /// Month-grid eventtype attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eventtype: Option<String>,
}

/// One detected calendar entry.
///
/// `timestart` is `0` when the page layout carried no timestamp (the
/// month-grid and generic shapes); that is a known precision loss, not
/// an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Epoch seconds, 0 when the layout exposed no timestamp
    pub timestart: i64,

    /// Duration in seconds
    pub timeduration: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Inferred kind: assign, quiz, forum, exam, activity, ...
    pub eventtype: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "activityDates", skip_serializing_if = "Option::is_none")]
    pub activity_dates: Option<ActivityDates>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
}

impl CalendarEvent {
    /// The URL worth fetching for submission-window details: the action
    /// button target when present, else the event's own URL.
    pub fn detail_url(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.action_button_url.as_deref())
            .or(self.url.as_deref())
    }
}

/// Requested calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Day,
    Month,
    Upcoming,
}

impl CalendarView {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarView::Day => "day",
            CalendarView::Month => "month",
            CalendarView::Upcoming => "upcoming",
        }
    }
}
