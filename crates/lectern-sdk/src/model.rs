//! Course content model
//!
//! Domain views of the records served by the content service. Positions
//! (`order`) on these types are always copied out of the ordering stores,
//! so an outline taken during a speculative reorder already shows the
//! speculative positions.

use lectern_client::{LessonRecord, ModuleRecord, QuizRecord};
use serde::{Deserialize, Serialize};

pub use lectern_client::{MediaRef, OrderEntry};

/// Which kind of sibling set an ordering covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingScope {
    /// Modules of a course (parent is the course id)
    Modules,
    /// Lessons of a module (parent is the module id)
    Lessons,
}

impl SiblingScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modules => "modules",
            Self::Lessons => "lessons",
        }
    }
}

impl std::fmt::Display for SiblingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of one sibling set: `(scope, parent_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiblingKey {
    pub scope: SiblingScope,
    pub parent_id: String,
}

impl SiblingKey {
    pub fn modules(course_id: impl Into<String>) -> Self {
        Self {
            scope: SiblingScope::Modules,
            parent_id: course_id.into(),
        }
    }

    pub fn lessons(module_id: impl Into<String>) -> Self {
        Self {
            scope: SiblingScope::Lessons,
            parent_id: module_id.into(),
        }
    }
}

impl std::fmt::Display for SiblingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scope, self.parent_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub order: u32,
    pub quiz_id: Option<String>,
}

impl From<ModuleRecord> for Module {
    fn from(record: ModuleRecord) -> Self {
        Self {
            id: record.id,
            course_id: record.course_id,
            title: record.title,
            order: record.order,
            quiz_id: record.quiz_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub content: String,
    pub media: Option<MediaRef>,
    pub duration: Option<f64>,
    pub order: u32,
    /// Derived view state; filled in by progression annotation
    pub is_locked: bool,
    /// Lock hint computed by the service for the requesting user
    pub globally_locked: bool,
}

impl From<LessonRecord> for Lesson {
    fn from(record: LessonRecord) -> Self {
        Self {
            id: record.id,
            module_id: record.module_id,
            title: record.title,
            content: record.content,
            media: record.media,
            duration: record.duration,
            order: record.order,
            is_locked: false,
            globally_locked: record.is_globally_locked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub order: u32,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub module_id: String,
    pub passing_score: f64,
    /// Sorted by `order`
    pub questions: Vec<Question>,
}

impl From<QuizRecord> for Quiz {
    fn from(record: QuizRecord) -> Self {
        let mut questions: Vec<Question> = record
            .questions
            .into_iter()
            .map(|q| Question {
                id: q.id,
                order: q.order,
                prompt: q.prompt,
            })
            .collect();
        questions.sort_by_key(|q| q.order);

        Self {
            id: record.id,
            module_id: record.module_id,
            passing_score: record.passing_score,
            questions,
        }
    }
}

/// One module with its ordered lessons and optional quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutline {
    pub module: Module,
    pub lessons: Vec<Lesson>,
    pub quiz: Option<Quiz>,
}

/// A course's content hierarchy in current order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOutline {
    pub course_id: String,
    pub modules: Vec<ModuleOutline>,
}

impl CourseOutline {
    /// Find a module outline by module id
    pub fn module(&self, module_id: &str) -> Option<&ModuleOutline> {
        self.modules.iter().find(|m| m.module.id == module_id)
    }

    /// Lesson ids of a module, in order
    pub fn lesson_ids(&self, module_id: &str) -> Vec<String> {
        self.module(module_id)
            .map(|m| m.lessons.iter().map(|l| l.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Module ids, in order
    pub fn module_ids(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.module.id.clone()).collect()
    }
}
