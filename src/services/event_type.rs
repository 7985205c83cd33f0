// src/services/event_type.rs

//! Normalization of the portal's Spanish activity labels into the
//! canonical event-type vocabulary used across every page shape.

/// Canonical types, in the order they are matched.
pub const ASSIGN: &str = "assign";
pub const QUIZ: &str = "quiz";
pub const FORUM: &str = "forum";
pub const EXAM: &str = "exam";
pub const LESSON: &str = "lesson";
pub const ACTIVITY: &str = "activity";

/// Classify an event from its action label and icon metadata, as shown
/// on timeline rows. First match wins.
pub fn from_action(action_type: &str, icon_title: &str) -> String {
    let haystack = format!(
        "{} {}",
        action_type.to_lowercase(),
        icon_title.to_lowercase()
    );
    if haystack.contains("tarea") || haystack.contains("assign") {
        ASSIGN.to_string()
    } else if haystack.contains("cuestionario") || haystack.contains("quiz") {
        QUIZ.to_string()
    } else if haystack.contains("foro") || haystack.contains("forum") {
        FORUM.to_string()
    } else if haystack.contains("examen") || haystack.contains("exam") {
        EXAM.to_string()
    } else {
        ACTIVITY.to_string()
    }
}

/// Classify an event from its CSS classes and hover title, for shapes
/// that render no action metadata.
pub fn from_classes(classes: &str, title: &str) -> String {
    let haystack = format!("{} {}", classes.to_lowercase(), title.to_lowercase());
    if haystack.contains("assignment") || haystack.contains("assign") || haystack.contains("tarea")
    {
        ASSIGN.to_string()
    } else if haystack.contains("quiz") || haystack.contains("cuestionario") {
        QUIZ.to_string()
    } else if haystack.contains("examen") || haystack.contains("exam") {
        EXAM.to_string()
    } else if haystack.contains("forum") || haystack.contains("foro") {
        FORUM.to_string()
    } else if haystack.contains("lesson")
        || haystack.contains("lección")
        || haystack.contains("clase")
    {
        LESSON.to_string()
    } else {
        ACTIVITY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_action_labels() {
        assert_eq!(from_action("Agregar entrega (Tarea)", ""), ASSIGN);
        assert_eq!(from_action("Intentar resolver el cuestionario", ""), QUIZ);
        assert_eq!(from_action("", "Foro de dudas"), FORUM);
        assert_eq!(from_action("Presentar examen final", ""), EXAM);
        assert_eq!(from_action("Ver", "recurso"), ACTIVITY);
    }

    #[test]
    fn test_class_based_detection() {
        assert_eq!(from_classes("calendar_event_course assignment", ""), ASSIGN);
        assert_eq!(from_classes("event", "Examen parcial"), EXAM);
        assert_eq!(from_classes("event", "Clase magistral"), LESSON);
        assert_eq!(from_classes("event plain", "Reunión"), ACTIVITY);
    }
}
