//! Content hierarchy coordinator
//!
//! Owns the working copy of one course: loads it from the content service,
//! routes reorders through the mutation controller, and evaluates
//! progression against whatever order is current.
//!
//! The state lock is held only for synchronous work. It is never held
//! across a service call, so independent reorders and reads interleave
//! freely while each sibling set still has at most one reorder in flight.

use super::state::HierarchyState;
use crate::config::CoordinatorConfig;
use crate::error::{Result, SdkError};
use crate::model::{CourseOutline, Quiz, SiblingKey, SiblingScope};
use crate::mutation::{MutationPhase, ReorderIntent, Settlement};
use crate::ordering::OrderingStore;
use crate::progression::{self, CompletionLedger, ProgressionView, QuizAttempt};
use crate::service::ContentService;
use lectern_client::{ClientError, CompletionRecord, MessageResponse, QuizAnswer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Final result of a reorder that was not rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The service persisted this ordering
    Confirmed,
    /// A newer reorder of the same sibling set took over before this one
    /// settled; its result was discarded
    Superseded,
}

/// Outcome of a quiz submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub quiz_id: String,
    pub score: f64,
    pub passing_score: f64,
    pub passed: bool,
}

/// Coordinates loading, reordering and progression for one course
pub struct ContentCoordinator<S: ContentService> {
    service: Arc<S>,
    config: CoordinatorConfig,
    state: Mutex<HierarchyState>,
}

impl<S: ContentService> ContentCoordinator<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_config(service, CoordinatorConfig::default())
    }

    pub fn with_config(service: Arc<S>, config: CoordinatorConfig) -> Self {
        Self {
            service,
            config,
            state: Mutex::new(HierarchyState::default()),
        }
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Id of the loaded course, if any
    pub async fn course_id(&self) -> Option<String> {
        self.state.lock().await.course_id.clone()
    }

    /// Fetch modules, then every module's lessons, then every module's quiz
    ///
    /// Any failed fetch aborts the load and is reported with the stage it
    /// failed at. The previous working state stays in place until the whole
    /// hierarchy has been fetched; swapping it out cancels any reorder still
    /// in flight against it.
    pub async fn load_hierarchy(&self, course_id: &str) -> Result<CourseOutline> {
        info!(course_id, "Loading course hierarchy");

        let load_err = |stage: String| {
            let course_id = course_id.to_string();
            move |source: ClientError| SdkError::HierarchyLoad {
                course_id,
                stage,
                source,
            }
        };

        let modules = self
            .service
            .list_modules(course_id)
            .await
            .map_err(load_err("modules".to_string()))?;

        let module_ids: Vec<String> = modules.iter().map(|m| m.id.clone()).collect();
        let mut next = HierarchyState::for_course(course_id);
        next.replace_modules(modules)?;

        for module_id in &module_ids {
            let lessons = self
                .service
                .list_lessons(module_id)
                .await
                .map_err(load_err(format!("lessons of module {}", module_id)))?;
            next.replace_lessons(module_id, lessons)?;
        }

        for module_id in &module_ids {
            let quiz = self
                .service
                .get_quiz(module_id)
                .await
                .map_err(load_err(format!("quiz of module {}", module_id)))?;
            next.set_quiz(module_id, quiz.map(Quiz::from));
        }

        let mut state = self.state.lock().await;
        state.mutations.cancel_all();
        next.mutations = std::mem::take(&mut state.mutations);
        *state = next;

        let outline = state
            .outline()
            .ok_or_else(|| SdkError::NotLoaded(course_id.to_string()))?;
        info!(
            course_id,
            modules = outline.modules.len(),
            lessons = outline.modules.iter().map(|m| m.lessons.len()).sum::<usize>(),
            "Course hierarchy loaded"
        );
        Ok(outline)
    }

    /// Current working hierarchy, including any speculative order
    pub async fn outline(&self) -> Result<CourseOutline> {
        self.state
            .lock()
            .await
            .outline()
            .ok_or_else(|| SdkError::NotLoaded("no course loaded".to_string()))
    }

    /// Reorder the modules of the loaded course
    pub async fn reorder_modules<I, T>(&self, course_id: &str, new_order: I) -> Result<ReorderOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.apply_reorder(ReorderIntent::modules(course_id, new_order))
            .await
    }

    /// Reorder the lessons of one module
    pub async fn reorder_lessons<I, T>(&self, module_id: &str, new_order: I) -> Result<ReorderOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.apply_reorder(ReorderIntent::lessons(module_id, new_order))
            .await
    }

    /// Apply `intent` optimistically and persist it
    ///
    /// The store shows the new order as soon as this is called. A rejected
    /// request restores the last confirmed order and returns
    /// [`SdkError::ReorderFailed`]. If a newer intent for the same sibling
    /// set arrives first, this call returns [`ReorderOutcome::Superseded`]
    /// without waiting for its request.
    pub async fn apply_reorder(&self, intent: ReorderIntent) -> Result<ReorderOutcome> {
        let key = intent.key();
        let pending = self.state.lock().await.begin(&intent)?;
        let cancellation = pending.cancellation();
        let generation = pending.generation();

        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => None,
            result = self.persist(&intent) => Some(result),
        };

        let Some(response) = response else {
            debug!(sibling_set = %key, generation, "Reorder superseded before the service answered");
            let _ = self.state.lock().await.settle(pending, false);
            return Ok(ReorderOutcome::Superseded);
        };

        let settlement = self.state.lock().await.settle(pending, response.is_ok());

        if settlement == Settlement::Superseded {
            return Ok(ReorderOutcome::Superseded);
        }

        if self.config.reconcile_after_reorder {
            self.reconcile(&key).await;
        }

        match response {
            Ok(_) => Ok(ReorderOutcome::Confirmed),
            Err(err) => Err(SdkError::ReorderFailed {
                scope: key.scope,
                parent_id: key.parent_id,
                reason: err.to_string(),
            }),
        }
    }

    async fn persist(&self, intent: &ReorderIntent) -> std::result::Result<MessageResponse, ClientError> {
        let entries = intent.normalized_entries();
        match intent.scope {
            SiblingScope::Modules => self.service.reorder_modules(&intent.parent_id, &entries).await,
            SiblingScope::Lessons => self.service.reorder_lessons(&intent.parent_id, &entries).await,
        }
    }

    /// Re-fetch a settled sibling set so the store mirrors the service
    ///
    /// The fetch is applied only if no reorder of the set began and no reload
    /// happened while it was outstanding. Failures are logged; the settled
    /// state stays as it was.
    async fn reconcile(&self, key: &SiblingKey) {
        let revision = self.state.lock().await.mutations.revision(key);

        let result = match key.scope {
            SiblingScope::Modules => match self.service.list_modules(&key.parent_id).await {
                Ok(records) => {
                    let mut state = self.state.lock().await;
                    if !Self::still_current(&state, key, revision) {
                        return;
                    }
                    state.replace_modules(records)
                }
                Err(err) => Err(err.into()),
            },
            SiblingScope::Lessons => match self.service.list_lessons(&key.parent_id).await {
                Ok(records) => {
                    let mut state = self.state.lock().await;
                    if !Self::still_current(&state, key, revision) {
                        return;
                    }
                    state.replace_lessons(&key.parent_id, records)
                }
                Err(err) => Err(err.into()),
            },
        };

        match result {
            Ok(()) => debug!(sibling_set = %key, "Reconciled with service"),
            Err(err) => warn!(sibling_set = %key, error = %err, "Reconciliation failed"),
        }
    }

    fn still_current(state: &HierarchyState, key: &SiblingKey, revision: u64) -> bool {
        if state.mutations.revision(key) != revision {
            debug!(sibling_set = %key, "Discarding reconciliation, sibling set changed since the fetch");
            return false;
        }
        if !state.mutations.is_stable(key) {
            debug!(sibling_set = %key, "Skipping reconciliation, reorder in flight");
            return false;
        }
        true
    }

    /// Mutation phase of one sibling set
    pub async fn phase(&self, scope: SiblingScope, parent_id: &str) -> MutationPhase {
        let key = SiblingKey {
            scope,
            parent_id: parent_id.to_string(),
        };
        self.state.lock().await.mutations.phase(&key)
    }

    /// Ordering of one sibling set as currently held
    pub async fn ordering(&self, scope: SiblingScope, parent_id: &str) -> Result<OrderingStore> {
        let key = SiblingKey {
            scope,
            parent_id: parent_id.to_string(),
        };
        self.state
            .lock()
            .await
            .store(&key)
            .cloned()
            .ok_or_else(|| SdkError::NotLoaded(key.to_string()))
    }

    /// Evaluate progression for `user_id` with fresh completion records
    pub async fn annotate_progression(&self, user_id: &str) -> Result<ProgressionView> {
        let course_id = self
            .course_id()
            .await
            .ok_or_else(|| SdkError::NotLoaded("no course loaded".to_string()))?;

        let records = self.service.list_completions(user_id, &course_id).await?;
        debug!(user_id, course_id = %course_id, records = records.len(), "Fetched completion records");
        self.annotate_with(user_id, &records).await
    }

    /// Evaluate progression for `user_id` against the given records
    pub async fn annotate_with(&self, user_id: &str, records: &[CompletionRecord]) -> Result<ProgressionView> {
        let outline = self.outline().await?;
        let ledger = CompletionLedger::from_records(user_id, records);
        Ok(progression::evaluate(user_id, &outline, &ledger))
    }

    /// Outline with `is_locked` filled in for `user_id`
    pub async fn annotated_outline(&self, user_id: &str) -> Result<(CourseOutline, ProgressionView)> {
        let view = self.annotate_progression(user_id).await?;
        let mut outline = self.outline().await?;
        view.apply_to(&mut outline);
        Ok((outline, view))
    }

    /// Record a lesson completion with the service
    ///
    /// The service enforces the gate; a refusal becomes
    /// [`SdkError::LessonLocked`].
    pub async fn complete_lesson(&self, user_id: &str, lesson_id: &str) -> Result<CompletionRecord> {
        if !self.state.lock().await.has_lesson(lesson_id) {
            return Err(SdkError::NotLoaded(format!("lesson {}", lesson_id)));
        }

        match self.service.complete_lesson(user_id, lesson_id).await {
            Ok(record) => {
                info!(user_id, lesson_id, "Lesson completed");
                Ok(record)
            }
            Err(ClientError::Locked { message, .. }) => {
                debug!(user_id, lesson_id, reason = %message, "Lesson completion refused");
                Err(SdkError::LessonLocked(lesson_id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Submit answers for the quiz of `module_id`
    ///
    /// A failing score is a normal outcome, not an error; the quiz stays
    /// open for another attempt.
    pub async fn submit_quiz(
        &self,
        user_id: &str,
        module_id: &str,
        answers: &[QuizAnswer],
    ) -> Result<QuizOutcome> {
        let quiz = self
            .state
            .lock()
            .await
            .quiz(module_id)
            .cloned()
            .ok_or_else(|| SdkError::NotLoaded(format!("quiz of module {}", module_id)))?;

        let result = match self.service.submit_quiz(user_id, &quiz.id, answers).await {
            Ok(result) => result,
            Err(ClientError::Locked { message, .. }) => {
                debug!(user_id, quiz_id = %quiz.id, reason = %message, "Quiz submission refused");
                return Err(SdkError::QuizLocked(quiz.id));
            }
            Err(err) => return Err(err.into()),
        };

        if QuizAttempt::evaluate(result.score, quiz.passing_score) != result.passed {
            warn!(
                quiz_id = %quiz.id,
                score = result.score,
                passing_score = quiz.passing_score,
                "Service verdict disagrees with passing score, using service verdict"
            );
        }

        if result.passed {
            info!(user_id, quiz_id = %quiz.id, score = result.score, "Quiz passed");
        } else {
            info!(user_id, quiz_id = %quiz.id, score = result.score, "Quiz failed, retry available");
        }

        Ok(QuizOutcome {
            quiz_id: quiz.id,
            score: result.score,
            passing_score: quiz.passing_score,
            passed: result.passed,
        })
    }
}
