//! HTTP-backed content service.

use async_trait::async_trait;
use lectern_client::{
    ClientError, CompletionRecord, ContentClient, LessonRecord, MessageResponse, ModuleRecord,
    OrderEntry, QuizAnswer, QuizRecord, QuizResult,
};

use super::traits::ContentService;

#[async_trait]
impl ContentService for ContentClient {
    async fn list_modules(&self, course_id: &str) -> Result<Vec<ModuleRecord>, ClientError> {
        ContentClient::list_modules(self, course_id).await
    }

    async fn list_lessons(&self, module_id: &str) -> Result<Vec<LessonRecord>, ClientError> {
        ContentClient::list_lessons(self, module_id).await
    }

    async fn get_quiz(&self, module_id: &str) -> Result<Option<QuizRecord>, ClientError> {
        ContentClient::get_quiz(self, module_id).await
    }

    async fn reorder_lessons(
        &self,
        module_id: &str,
        lessons: &[OrderEntry],
    ) -> Result<MessageResponse, ClientError> {
        ContentClient::reorder_lessons(self, module_id, lessons).await
    }

    async fn reorder_modules(
        &self,
        course_id: &str,
        modules: &[OrderEntry],
    ) -> Result<MessageResponse, ClientError> {
        ContentClient::reorder_modules(self, course_id, modules).await
    }

    async fn list_completions(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<CompletionRecord>, ClientError> {
        ContentClient::list_completions(self, user_id, course_id).await
    }

    async fn complete_lesson(
        &self,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<CompletionRecord, ClientError> {
        ContentClient::complete_lesson(self, user_id, lesson_id).await
    }

    async fn submit_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
        answers: &[QuizAnswer],
    ) -> Result<QuizResult, ClientError> {
        ContentClient::submit_quiz(self, user_id, quiz_id, answers).await
    }
}
