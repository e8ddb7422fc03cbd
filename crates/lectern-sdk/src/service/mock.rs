//! In-memory content service for testing.

use async_trait::async_trait;
use lectern_client::{
    ClientError, CompletionRecord, LessonRecord, MessageResponse, ModuleRecord, OrderEntry,
    QuizAnswer, QuizRecord, QuizResult,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

use super::traits::ContentService;
use crate::model::{CourseOutline, Lesson, Module, ModuleOutline, Quiz};
use crate::progression::{self, CompletionLedger, NodeRef, QuizAttempt};

/// How the mock answers reorder requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderBehavior {
    /// Apply and acknowledge
    #[default]
    Accept,
    /// Reject without applying
    Reject,
    /// Apply, then report failure anyway (partial write)
    RejectAfterApply,
}

#[derive(Debug, Default)]
struct MockState {
    modules: HashMap<String, Vec<ModuleRecord>>,
    lessons: HashMap<String, Vec<LessonRecord>>,
    quizzes: HashMap<String, QuizRecord>,
    completions: Vec<CompletionRecord>,
    quiz_scores: HashMap<String, f64>,
    failing_fetches: HashSet<String>,
    reorder_behavior: ReorderBehavior,
    hold_next_reorder: Option<Arc<Notify>>,
}

/// Mock content service for testing.
///
/// Holds the authoritative copy of a few courses in memory, enforces the
/// same sequential gate as a real service, and can be told to reject or
/// stall reorder requests.
#[derive(Debug, Default)]
pub struct MockContentService {
    state: Mutex<MockState>,
    reorder_calls: AtomicU32,
    fetch_calls: AtomicU32,
}

impl MockContentService {
    /// Create an empty mock service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module.
    pub fn with_module(self, module: ModuleRecord) -> Self {
        {
            let mut state = self.lock();
            let modules = state.modules.entry(module.course_id.clone()).or_default();
            modules.push(module);
            modules.sort_by_key(|m| m.order);
        }
        self
    }

    /// Add a lesson.
    pub fn with_lesson(self, lesson: LessonRecord) -> Self {
        {
            let mut state = self.lock();
            let lessons = state.lessons.entry(lesson.module_id.clone()).or_default();
            lessons.push(lesson);
            lessons.sort_by_key(|l| l.order);
        }
        self
    }

    /// Add a quiz.
    pub fn with_quiz(self, quiz: QuizRecord) -> Self {
        self.lock().quizzes.insert(quiz.module_id.clone(), quiz);
        self
    }

    /// Delete a module with its lessons and quiz, as another editor would.
    pub fn remove_module(&self, module_id: &str) {
        let mut state = self.lock();
        for modules in state.modules.values_mut() {
            modules.retain(|m| m.id != module_id);
        }
        state.lessons.remove(module_id);
        state.quizzes.remove(module_id);
    }

    /// Add an existing completion record.
    pub fn with_completion(self, record: CompletionRecord) -> Self {
        self.lock().completions.push(record);
        self
    }

    /// Set how reorder requests are answered.
    pub fn set_reorder_behavior(&self, behavior: ReorderBehavior) {
        self.lock().reorder_behavior = behavior;
    }

    /// Stall the next reorder request until the returned handle is notified.
    pub fn hold_next_reorder(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.lock().hold_next_reorder = Some(Arc::clone(&notify));
        notify
    }

    /// Make a fetch fail with 503. Keys: `modules:{course}`,
    /// `lessons:{module}`, `quiz:{module}`.
    pub fn fail_fetch(&self, key: impl Into<String>) {
        self.lock().failing_fetches.insert(key.into());
    }

    /// Score the service will award for the next submissions of a quiz.
    pub fn set_quiz_score(&self, quiz_id: impl Into<String>, score: f64) {
        self.lock().quiz_scores.insert(quiz_id.into(), score);
    }

    /// Server-side lesson ids of a module, in order.
    pub fn lesson_order(&self, module_id: &str) -> Vec<String> {
        self.lock()
            .lessons
            .get(module_id)
            .map(|ls| ls.iter().map(|l| l.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Server-side module ids of a course, in order.
    pub fn module_order(&self, course_id: &str) -> Vec<String> {
        self.lock()
            .modules
            .get(course_id)
            .map(|ms| ms.iter().map(|m| m.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Server-side completion records.
    pub fn completions(&self) -> Vec<CompletionRecord> {
        self.lock().completions.clone()
    }

    /// Number of reorder requests received.
    pub fn reorder_calls(&self) -> u32 {
        self.reorder_calls.load(Ordering::SeqCst)
    }

    /// Number of read requests received.
    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_fetch(&self, key: String) -> Result<(), ClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.lock().failing_fetches.contains(&key) {
            return Err(ClientError::Server {
                status: 503,
                message: format!("{} unavailable", key),
            });
        }
        Ok(())
    }

    async fn reorder<F>(&self, parent_id: &str, entries: &[OrderEntry], apply: F) -> Result<MessageResponse, ClientError>
    where
        F: FnOnce(&mut MockState, &HashMap<&str, u32>) -> Result<(), ClientError>,
    {
        self.reorder_calls.fetch_add(1, Ordering::SeqCst);

        let hold = self.lock().hold_next_reorder.take();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        let mut state = self.lock();
        let behavior = state.reorder_behavior;
        if behavior == ReorderBehavior::Reject {
            return Err(ClientError::Server {
                status: 500,
                message: format!("reorder of {} rejected", parent_id),
            });
        }

        let positions: HashMap<&str, u32> = entries.iter().map(|e| (e.id.as_str(), e.order)).collect();
        apply(&mut state, &positions)?;

        if behavior == ReorderBehavior::RejectAfterApply {
            return Err(ClientError::Server {
                status: 502,
                message: "upstream timeout".to_string(),
            });
        }

        Ok(MessageResponse {
            message: "Order updated".to_string(),
        })
    }

    /// Outline of the course containing `module_id`, with the current ledger
    fn gate_context(state: &MockState, user_id: &str, module_id: &str) -> Option<(CourseOutline, CompletionLedger)> {
        let course_id = state
            .modules
            .iter()
            .find(|(_, modules)| modules.iter().any(|m| m.id == module_id))
            .map(|(course_id, _)| course_id.clone())?;

        let modules = state
            .modules
            .get(&course_id)?
            .iter()
            .map(|m| ModuleOutline {
                module: Module::from(m.clone()),
                lessons: state
                    .lessons
                    .get(&m.id)
                    .map(|ls| ls.iter().cloned().map(Lesson::from).collect())
                    .unwrap_or_default(),
                quiz: state.quizzes.get(&m.id).cloned().map(Quiz::from),
            })
            .collect();

        let outline = CourseOutline { course_id, modules };
        let ledger = CompletionLedger::from_records(user_id, &state.completions);
        Some((outline, ledger))
    }
}

fn apply_positions<T>(
    items: &mut [T],
    positions: &HashMap<&str, u32>,
    id: impl Fn(&T) -> &str,
    set_order: impl Fn(&mut T, u32),
) -> Result<(), ClientError> {
    if items.len() != positions.len() || items.iter().any(|i| !positions.contains_key(id(i))) {
        return Err(ClientError::Server {
            status: 400,
            message: "ordering must name every sibling exactly once".to_string(),
        });
    }
    for item in items.iter_mut() {
        let order = positions[id(item)];
        set_order(item, order);
    }
    Ok(())
}

#[async_trait]
impl ContentService for MockContentService {
    async fn list_modules(&self, course_id: &str) -> Result<Vec<ModuleRecord>, ClientError> {
        self.check_fetch(format!("modules:{}", course_id))?;
        Ok(self.lock().modules.get(course_id).cloned().unwrap_or_default())
    }

    async fn list_lessons(&self, module_id: &str) -> Result<Vec<LessonRecord>, ClientError> {
        self.check_fetch(format!("lessons:{}", module_id))?;
        Ok(self.lock().lessons.get(module_id).cloned().unwrap_or_default())
    }

    async fn get_quiz(&self, module_id: &str) -> Result<Option<QuizRecord>, ClientError> {
        self.check_fetch(format!("quiz:{}", module_id))?;
        Ok(self.lock().quizzes.get(module_id).cloned())
    }

    async fn reorder_lessons(
        &self,
        module_id: &str,
        lessons: &[OrderEntry],
    ) -> Result<MessageResponse, ClientError> {
        let module_id = module_id.to_string();
        self.reorder(&module_id, lessons, |state, positions| {
            let items = state
                .lessons
                .get_mut(&module_id)
                .ok_or_else(|| ClientError::NotFound(module_id.clone()))?;
            apply_positions(items, positions, |l| l.id.as_str(), |l, order| l.order = order)?;
            items.sort_by_key(|l| l.order);
            Ok(())
        })
        .await
    }

    async fn reorder_modules(
        &self,
        course_id: &str,
        modules: &[OrderEntry],
    ) -> Result<MessageResponse, ClientError> {
        let course_id = course_id.to_string();
        self.reorder(&course_id, modules, |state, positions| {
            let items = state
                .modules
                .get_mut(&course_id)
                .ok_or_else(|| ClientError::NotFound(course_id.clone()))?;
            apply_positions(items, positions, |m| m.id.as_str(), |m, order| m.order = order)?;
            items.sort_by_key(|m| m.order);
            Ok(())
        })
        .await
    }

    async fn list_completions(
        &self,
        user_id: &str,
        _course_id: &str,
    ) -> Result<Vec<CompletionRecord>, ClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lock()
            .completions
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn complete_lesson(
        &self,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<CompletionRecord, ClientError> {
        let mut state = self.lock();

        let module_id = state
            .lessons
            .iter()
            .find(|(_, lessons)| lessons.iter().any(|l| l.id == lesson_id))
            .map(|(module_id, _)| module_id.clone())
            .ok_or_else(|| ClientError::NotFound(lesson_id.to_string()))?;

        if let Some((outline, ledger)) = Self::gate_context(&state, user_id, &module_id) {
            let view = progression::evaluate(user_id, &outline, &ledger);
            if view.check_access(&NodeRef::Lesson(lesson_id.to_string())).is_err() {
                return Err(ClientError::Locked {
                    resource: lesson_id.to_string(),
                    message: "complete the previous lesson first".to_string(),
                });
            }
        }

        let record = CompletionRecord::lesson(user_id, lesson_id);
        state.completions.push(record.clone());
        Ok(record)
    }

    async fn submit_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
        _answers: &[QuizAnswer],
    ) -> Result<QuizResult, ClientError> {
        let mut state = self.lock();

        let quiz = state
            .quizzes
            .values()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(quiz_id.to_string()))?;

        if let Some((outline, ledger)) = Self::gate_context(&state, user_id, &quiz.module_id) {
            let view = progression::evaluate(user_id, &outline, &ledger);
            if view.check_access(&NodeRef::Quiz(quiz_id.to_string())).is_err() {
                return Err(ClientError::Locked {
                    resource: quiz_id.to_string(),
                    message: "complete every lesson of the module first".to_string(),
                });
            }
        }

        let score = state.quiz_scores.get(quiz_id).copied().unwrap_or(100.0);
        let passed = QuizAttempt::new(score, quiz.passing_score).passed();
        state
            .completions
            .push(CompletionRecord::quiz(user_id, quiz_id, passed));

        Ok(QuizResult { passed, score })
    }
}
