//! Sequential progression gating
//!
//! Decides, for one learner, which lessons and quizzes of a course are
//! accessible. The decision is a pure function of the current ordering and
//! the learner's completion records:
//!
//! - the first lesson of the first module is always open
//! - a lesson opens when the lesson before it is completed
//! - the first lesson of a later module opens when the previous module is
//!   finished (its quiz if it has one, otherwise its last lesson)
//! - a quiz opens when every lesson of its module is completed
//! - a node with a completion record is completed, whatever its gate says
//!
//! Nothing here caches positions, so evaluating again after a reorder always
//! reflects the new order.

use crate::error::{Result, SdkError};
use crate::model::CourseOutline;
use lectern_client::CompletionRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Accessibility of a lesson or quiz
///
/// Ordered by progress: `Locked < Unlocked < Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Locked,
    Unlocked,
    Completed,
}

impl NodeState {
    pub fn is_accessible(&self) -> bool {
        !matches!(self, Self::Locked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A gated node in the course
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum NodeRef {
    Lesson(String),
    Quiz(String),
}

impl NodeRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Lesson(id) | Self::Quiz(id) => id,
        }
    }
}

/// Pass/fail rule for one quiz attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizAttempt {
    pub score: f64,
    pub passing_score: f64,
}

impl QuizAttempt {
    pub fn new(score: f64, passing_score: f64) -> Self {
        Self {
            score,
            passing_score,
        }
    }

    /// An attempt passes iff `score >= passing_score`
    pub fn passed(&self) -> bool {
        self.score >= self.passing_score
    }

    pub fn evaluate(score: f64, passing_score: f64) -> bool {
        Self::new(score, passing_score).passed()
    }
}

/// What one learner has completed
///
/// Lessons count as completed when any record exists for them. Quizzes
/// count only when a record says `passed`; failed attempts are kept for
/// reporting but never complete anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionLedger {
    lessons: HashSet<String>,
    passed_quizzes: HashSet<String>,
    attempted_quizzes: HashSet<String>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from records, keeping only those of `user_id`
    pub fn from_records(user_id: &str, records: &[CompletionRecord]) -> Self {
        let mut ledger = Self::new();
        for record in records.iter().filter(|r| r.user_id == user_id) {
            ledger.record(record);
        }
        ledger
    }

    pub fn record(&mut self, record: &CompletionRecord) {
        if let Some(ref lesson_id) = record.lesson_id {
            self.complete_lesson(lesson_id.clone());
        }
        if let Some(ref quiz_id) = record.quiz_id {
            self.record_quiz_attempt(quiz_id.clone(), record.passed);
        }
    }

    pub fn complete_lesson(&mut self, lesson_id: impl Into<String>) {
        self.lessons.insert(lesson_id.into());
    }

    /// Failing attempts never remove an earlier pass
    pub fn record_quiz_attempt(&mut self, quiz_id: impl Into<String>, passed: bool) {
        let quiz_id = quiz_id.into();
        if passed {
            self.passed_quizzes.insert(quiz_id.clone());
        }
        self.attempted_quizzes.insert(quiz_id);
    }

    pub fn lesson_completed(&self, lesson_id: &str) -> bool {
        self.lessons.contains(lesson_id)
    }

    pub fn quiz_passed(&self, quiz_id: &str) -> bool {
        self.passed_quizzes.contains(quiz_id)
    }

    pub fn quiz_attempted(&self, quiz_id: &str) -> bool {
        self.attempted_quizzes.contains(quiz_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub state: NodeState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizProgress {
    pub quiz_id: String,
    pub state: NodeState,
    /// A failed attempt exists and the quiz is still open for retry
    pub retry_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub module_id: String,
    pub lessons: Vec<LessonProgress>,
    pub quiz: Option<QuizProgress>,
    /// Whether the module no longer blocks the next one
    pub finished: bool,
}

/// Lock/unlock annotation of a whole course for one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionView {
    pub course_id: String,
    pub user_id: String,
    pub modules: Vec<ModuleProgress>,
    #[serde(skip)]
    states: HashMap<NodeRef, NodeState>,
}

impl ProgressionView {
    pub fn state(&self, node: &NodeRef) -> Option<NodeState> {
        self.states.get(node).copied()
    }

    pub fn lesson_state(&self, lesson_id: &str) -> Option<NodeState> {
        self.state(&NodeRef::Lesson(lesson_id.to_string()))
    }

    pub fn quiz_state(&self, quiz_id: &str) -> Option<NodeState> {
        self.state(&NodeRef::Quiz(quiz_id.to_string()))
    }

    /// Refuse navigation to a locked node
    ///
    /// This is a client-side preview; the content service remains the
    /// authority for completion writes.
    pub fn check_access(&self, node: &NodeRef) -> Result<()> {
        match self.state(node) {
            Some(state) if state.is_accessible() => Ok(()),
            Some(_) => Err(match node {
                NodeRef::Lesson(id) => SdkError::LessonLocked(id.clone()),
                NodeRef::Quiz(id) => SdkError::QuizLocked(id.clone()),
            }),
            None => Err(SdkError::NotLoaded(format!("{:?}", node))),
        }
    }

    /// First unlocked, not yet completed node in course order
    pub fn next_node(&self) -> Option<NodeRef> {
        for module in &self.modules {
            for lesson in &module.lessons {
                if lesson.state == NodeState::Unlocked {
                    return Some(NodeRef::Lesson(lesson.lesson_id.clone()));
                }
            }
            if let Some(ref quiz) = module.quiz {
                if quiz.state == NodeState::Unlocked {
                    return Some(NodeRef::Quiz(quiz.quiz_id.clone()));
                }
            }
        }
        None
    }

    /// Copy derived lock flags onto an outline's lessons
    pub fn apply_to(&self, outline: &mut CourseOutline) {
        for module in &mut outline.modules {
            for lesson in &mut module.lessons {
                lesson.is_locked = !self
                    .lesson_state(&lesson.id)
                    .map(|s| s.is_accessible())
                    .unwrap_or(false);
            }
        }
    }
}

/// Evaluate every lesson and quiz of `outline` for one learner
pub fn evaluate(user_id: &str, outline: &CourseOutline, ledger: &CompletionLedger) -> ProgressionView {
    let mut states = HashMap::new();
    let mut modules = Vec::with_capacity(outline.modules.len());

    // Whether the previous module lets learners into the current one
    let mut entry_open = true;

    for module in &outline.modules {
        let mut previous_completed = entry_open;
        let mut lessons = Vec::with_capacity(module.lessons.len());

        for lesson in &module.lessons {
            let state = if ledger.lesson_completed(&lesson.id) {
                NodeState::Completed
            } else if previous_completed && !lesson.globally_locked {
                NodeState::Unlocked
            } else {
                NodeState::Locked
            };

            previous_completed = state == NodeState::Completed;
            states.insert(NodeRef::Lesson(lesson.id.clone()), state);
            lessons.push(LessonProgress {
                lesson_id: lesson.id.clone(),
                state,
            });
        }

        let all_lessons_completed = lessons.iter().all(|l| l.state == NodeState::Completed);

        let quiz = module.quiz.as_ref().map(|quiz| {
            let state = if ledger.quiz_passed(&quiz.id) {
                NodeState::Completed
            } else if all_lessons_completed && (!lessons.is_empty() || entry_open) {
                NodeState::Unlocked
            } else {
                NodeState::Locked
            };

            states.insert(NodeRef::Quiz(quiz.id.clone()), state);
            QuizProgress {
                quiz_id: quiz.id.clone(),
                state,
                retry_available: state == NodeState::Unlocked && ledger.quiz_attempted(&quiz.id),
            }
        });

        // An empty module without a quiz passes its own entry gate through
        let finished = match (&quiz, lessons.last()) {
            (Some(quiz), _) => quiz.state == NodeState::Completed,
            (None, Some(last)) => last.state == NodeState::Completed,
            (None, None) => entry_open,
        };

        entry_open = finished;
        modules.push(ModuleProgress {
            module_id: module.module.id.clone(),
            lessons,
            quiz,
            finished,
        });
    }

    ProgressionView {
        course_id: outline.course_id.clone(),
        user_id: user_id.to_string(),
        modules,
        states,
    }
}
