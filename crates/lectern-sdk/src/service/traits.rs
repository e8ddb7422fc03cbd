//! Core trait for the remote content service.
//!
//! This module defines the `ContentService` trait - the seam between the
//! ordering/progression core and whatever serves course content.

use async_trait::async_trait;
use lectern_client::{
    ClientError, CompletionRecord, LessonRecord, MessageResponse, ModuleRecord, OrderEntry,
    QuizAnswer, QuizRecord, QuizResult,
};

/// Remote content service.
///
/// The service owns all durable state and is the authority on ordering
/// and on progression gating. Every method maps to one request.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Modules of a course, in server order.
    async fn list_modules(&self, course_id: &str) -> Result<Vec<ModuleRecord>, ClientError>;

    /// Lessons of a module, in server order.
    async fn list_lessons(&self, module_id: &str) -> Result<Vec<LessonRecord>, ClientError>;

    /// The quiz gating a module, if any.
    async fn get_quiz(&self, module_id: &str) -> Result<Option<QuizRecord>, ClientError>;

    /// Persist the full ordering of a module's lessons.
    async fn reorder_lessons(
        &self,
        module_id: &str,
        lessons: &[OrderEntry],
    ) -> Result<MessageResponse, ClientError>;

    /// Persist the full ordering of a course's modules.
    async fn reorder_modules(
        &self,
        course_id: &str,
        modules: &[OrderEntry],
    ) -> Result<MessageResponse, ClientError>;

    /// A user's completion records within a course.
    async fn list_completions(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<CompletionRecord>, ClientError>;

    /// Record a lesson completion; refused with `ClientError::Locked` when
    /// the lesson's gate is closed.
    async fn complete_lesson(
        &self,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<CompletionRecord, ClientError>;

    /// Submit quiz answers; refused with `ClientError::Locked` when the
    /// module's lessons are incomplete.
    async fn submit_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
        answers: &[QuizAnswer],
    ) -> Result<QuizResult, ClientError>;
}
