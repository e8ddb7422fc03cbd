//! HTTP client for the content service API

use crate::error::{ClientError, Result};
use crate::types::*;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// HTTP client for the content service API
///
/// # Example
///
/// ```rust,no_run
/// use lectern_client::{ClientConfig, ContentClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ContentClient::new(ClientConfig {
///     base_url: "http://localhost:5000/api".into(),
///     ..Default::default()
/// })?;
///
/// let modules = client.list_modules("course-1").await?;
/// for module in &modules {
///     let lessons = client.list_lessons(&module.id).await?;
///     println!("{} has {} lessons", module.title, lessons.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ContentClient {
    config: ClientConfig,
    client: Client,
}

impl ContentClient {
    /// Create a new content client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ClientError::Config(format!("invalid API key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ==================== Course Content ====================

    /// List the modules of a course, in server order
    pub async fn list_modules(&self, course_id: &str) -> Result<Vec<ModuleRecord>> {
        let url = format!(
            "{}/courses/{}/modules",
            self.base_url(),
            urlencoding::encode(course_id)
        );

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// List the lessons of a module, in server order
    pub async fn list_lessons(&self, module_id: &str) -> Result<Vec<LessonRecord>> {
        let url = format!(
            "{}/lessons/module/{}",
            self.base_url(),
            urlencoding::encode(module_id)
        );

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Get the quiz gating a module, if the module has one
    pub async fn get_quiz(&self, module_id: &str) -> Result<Option<QuizRecord>> {
        let url = format!(
            "{}/quizzes/module/{}",
            self.base_url(),
            urlencoding::encode(module_id)
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(response).await.map(Some)
    }

    // ==================== Ordering ====================

    /// Persist the full ordering of a module's lessons
    pub async fn reorder_lessons(
        &self,
        module_id: &str,
        lessons: &[OrderEntry],
    ) -> Result<MessageResponse> {
        let url = format!("{}/lessons/reorder", self.base_url());

        let body = ReorderLessonsRequest {
            module_id: module_id.to_string(),
            lessons: lessons.to_vec(),
        };

        debug!(module_id, count = lessons.len(), "PUT lessons/reorder");

        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Persist the full ordering of a course's modules
    pub async fn reorder_modules(
        &self,
        course_id: &str,
        modules: &[OrderEntry],
    ) -> Result<MessageResponse> {
        let url = format!(
            "{}/modules/{}/reorder",
            self.base_url(),
            urlencoding::encode(course_id)
        );

        let body = ReorderModulesRequest {
            modules: modules.to_vec(),
        };

        debug!(course_id, count = modules.len(), "PUT modules/reorder");

        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    // ==================== Progress ====================

    /// List a user's completion records within a course
    pub async fn list_completions(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<CompletionRecord>> {
        let url = format!(
            "{}/progress/{}/courses/{}",
            self.base_url(),
            urlencoding::encode(user_id),
            urlencoding::encode(course_id)
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        self.handle_response(response).await
    }

    /// Record a lesson as completed by a user
    ///
    /// The server enforces the sequential gate; a refused write comes back
    /// as [`ClientError::Locked`].
    pub async fn complete_lesson(&self, user_id: &str, lesson_id: &str) -> Result<CompletionRecord> {
        let url = format!(
            "{}/lessons/{}/complete",
            self.base_url(),
            urlencoding::encode(lesson_id)
        );

        let body = CompleteLessonRequest {
            user_id: user_id.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        self.handle_gated_response(response, lesson_id).await
    }

    /// Submit answers to a quiz
    pub async fn submit_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
        answers: &[QuizAnswer],
    ) -> Result<QuizResult> {
        let url = format!(
            "{}/quizzes/{}/submit",
            self.base_url(),
            urlencoding::encode(quiz_id)
        );

        let body = QuizSubmission {
            user_id: user_id.to_string(),
            answers: answers.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        self.handle_gated_response(response, quiz_id).await
    }

    // ==================== Helper Methods ====================

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn handle_gated_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        resource: &str,
    ) -> Result<T> {
        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::LOCKED {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Locked {
                resource: resource.to_string(),
                message,
            });
        }
        self.handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status() == StatusCode::NOT_FOUND {
            let url = response.url().path().to_string();
            return Err(ClientError::NotFound(url));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status,
                message: body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            // Well-formed JSON of the wrong shape is a schema mismatch
            if e.is_data() {
                return ClientError::Json(e);
            }
            ClientError::InvalidResponse(format!(
                "{} (body: {})",
                e,
                String::from_utf8_lossy(&bytes).chars().take(200).collect::<String>()
            ))
        })
    }
}
