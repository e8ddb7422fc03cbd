//! Types for the content service API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the content service HTTP API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional bearer token issued by the external auth service
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ============================================================================
// Course Content Types
// ============================================================================

/// Module as returned by `GET /courses/{id}/modules`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
}

/// Media attached to a lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Lesson as returned by `GET /lessons/module/{moduleId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub module_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub order: u32,
    /// Lock state computed by the server for the requesting user
    #[serde(default)]
    pub is_globally_locked: bool,
}

/// Quiz question reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Quiz as returned by `GET /quizzes/module/{moduleId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub module_id: String,
    pub passing_score: f64,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

// ============================================================================
// Reorder Types
// ============================================================================

/// One `{id, order}` pair of a full target ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: String,
    pub order: u32,
}

impl OrderEntry {
    pub fn new(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }
}

/// Request body for `PUT /lessons/reorder`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderLessonsRequest {
    pub module_id: String,
    pub lessons: Vec<OrderEntry>,
}

/// Request body for `PUT /modules/{courseId}/reorder`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderModulesRequest {
    pub modules: Vec<OrderEntry>,
}

/// Plain acknowledgement returned by write endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Progress Types
// ============================================================================

/// Completion of a lesson or a quiz attempt by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    /// Record for a completed lesson
    pub fn lesson(user_id: impl Into<String>, lesson_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            lesson_id: Some(lesson_id.into()),
            quiz_id: None,
            passed: true,
            completed_at: Utc::now(),
        }
    }

    /// Record for a quiz attempt
    pub fn quiz(user_id: impl Into<String>, quiz_id: impl Into<String>, passed: bool) -> Self {
        Self {
            user_id: user_id.into(),
            lesson_id: None,
            quiz_id: Some(quiz_id.into()),
            passed,
            completed_at: Utc::now(),
        }
    }
}

/// Request body for `POST /lessons/{lessonId}/complete`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonRequest {
    pub user_id: String,
}

/// A single answer in a quiz submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_id: String,
    pub answer: serde_json::Value,
}

/// Request body for `POST /quizzes/{quizId}/submit`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub user_id: String,
    pub answers: Vec<QuizAnswer>,
}

/// Server verdict on a quiz submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub passed: bool,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_record_accepts_mongo_ids() {
        let json = r#"{
            "_id": "l1",
            "moduleId": "m1",
            "title": "Grace",
            "content": "",
            "order": 0,
            "isGloballyLocked": true
        }"#;

        let lesson: LessonRecord = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.id, "l1");
        assert!(lesson.is_globally_locked);
        assert!(lesson.media.is_none());
    }

    #[test]
    fn test_reorder_lessons_request_serialization() {
        let request = ReorderLessonsRequest {
            module_id: "m1".to_string(),
            lessons: vec![OrderEntry::new("l2", 0), OrderEntry::new("l1", 1)],
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"moduleId\":\"m1\""));
        assert!(json.contains("{\"id\":\"l2\",\"order\":0}"));
    }

    #[test]
    fn test_client_config_defaults_from_partial_toml_shape() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "https://church.example/api"}"#).unwrap();
        assert_eq!(config.base_url, "https://church.example/api");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.api_key.is_none());
    }
}
