use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::rubric::RubricLevel;

/// The three Point/Evidence/Explanation fields of a student's written
/// response. Field names are capitalized on the wire to match the form
/// template the submissions come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StudentResponse {
    #[serde(rename = "Point", default)]
    pub(crate) point: Option<String>,
    #[serde(rename = "Evidence", default)]
    pub(crate) evidence: Option<String>,
    #[serde(rename = "Explanation", default)]
    pub(crate) explanation: Option<String>,
}

impl StudentResponse {
    /// True when no field is present at all. Fields that are present but
    /// empty still count as a submission; they render as "N/A" downstream.
    pub(crate) fn is_missing(&self) -> bool {
        self.point.is_none() && self.evidence.is_none() && self.explanation.is_none()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitRequest {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Invalid student email address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) response: Option<StudentResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FeedbackResponse {
    pub(crate) feedback: String,
    pub(crate) grade: Option<RubricLevel>,
    pub(crate) notified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_response_accepts_capitalized_fields() {
        let parsed: StudentResponse = serde_json::from_str(
            r#"{"Point": "main idea", "Evidence": "a quote", "Explanation": "because"}"#,
        )
        .expect("parse");
        assert_eq!(parsed.point.as_deref(), Some("main idea"));
        assert_eq!(parsed.evidence.as_deref(), Some("a quote"));
        assert_eq!(parsed.explanation.as_deref(), Some("because"));
        assert!(!parsed.is_missing());
    }

    #[test]
    fn student_response_missing_only_when_no_field_present() {
        let missing: StudentResponse = serde_json::from_str("{}").expect("parse");
        assert!(missing.is_missing());

        // Empty strings are still a submission; they become "N/A" later.
        let empty: StudentResponse =
            serde_json::from_str(r#"{"Point": "", "Evidence": "  "}"#).expect("parse");
        assert!(!empty.is_missing());
    }

    #[test]
    fn submit_request_rejects_bad_email() {
        let request: SubmitRequest =
            serde_json::from_str(r#"{"email": "not-an-address", "response": {}}"#).expect("parse");
        assert!(validator::Validate::validate(&request).is_err());
    }

    #[test]
    fn feedback_response_round_trips_grade_string() {
        let response = FeedbackResponse {
            feedback: "Well done.\n\nGrade: Exceeding".to_string(),
            grade: Some(RubricLevel::Exceeding),
            notified: false,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["grade"], "Exceeding");

        let reparsed: FeedbackResponse = serde_json::from_value(json).expect("deserialize");
        assert_eq!(reparsed.grade, Some(RubricLevel::Exceeding));
        assert_eq!(
            serde_json::to_value(reparsed.grade).expect("serialize grade"),
            serde_json::Value::String("Exceeding".to_string())
        );
    }

    #[test]
    fn feedback_response_serializes_missing_grade_as_null() {
        let response = FeedbackResponse {
            feedback: "OpenAI API error: quota".to_string(),
            grade: None,
            notified: false,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json["grade"].is_null());
    }
}
