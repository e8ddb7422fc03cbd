//! Working state of one loaded course
//!
//! Payloads (titles, content, quizzes) are kept by id; positions live only
//! in the ordering stores, one per sibling set. Outlines are assembled from
//! both on demand.

use crate::error::{Result, SdkError};
use crate::model::{CourseOutline, Lesson, Module, ModuleOutline, Quiz, SiblingKey, SiblingScope};
use crate::mutation::{MutationController, PendingReorder, ReorderIntent, Settlement};
use crate::ordering::{OrderedEntity, OrderingStore};
use lectern_client::{LessonRecord, ModuleRecord};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub(crate) struct HierarchyState {
    pub(crate) course_id: Option<String>,
    modules: HashMap<String, Module>,
    module_order: OrderingStore,
    lessons: HashMap<String, Lesson>,
    lesson_orders: HashMap<String, OrderingStore>,
    /// Keyed by module id
    quizzes: HashMap<String, Quiz>,
    pub(crate) mutations: MutationController,
}

impl HierarchyState {
    pub(crate) fn for_course(course_id: &str) -> Self {
        Self {
            course_id: Some(course_id.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn replace_modules(&mut self, records: Vec<ModuleRecord>) -> Result<()> {
        let entities = records
            .iter()
            .map(|m| OrderedEntity::new(m.id.clone(), m.order))
            .collect();
        self.module_order.load(entities)?;

        let previous: Vec<String> = self.modules.keys().cloned().collect();
        self.modules = records.into_iter().map(|m| (m.id.clone(), Module::from(m))).collect();

        for module_id in self.modules.keys() {
            self.lesson_orders.entry(module_id.clone()).or_default();
        }

        let modules = &self.modules;
        for removed in previous.iter().filter(|id| !modules.contains_key(*id)) {
            self.mutations.abandon(&SiblingKey::lessons(removed.as_str()));
        }
        self.lesson_orders.retain(|id, _| modules.contains_key(id));
        self.lessons.retain(|_, lesson| modules.contains_key(&lesson.module_id));
        self.quizzes.retain(|id, _| modules.contains_key(id));

        let changed = previous.len() != self.modules.len()
            || previous.iter().any(|id| !self.modules.contains_key(id));
        if !previous.is_empty() && changed {
            info!(
                course_id = self.course_id.as_deref().unwrap_or_default(),
                "Module set changed on the service; reload for new lessons"
            );
        }
        Ok(())
    }

    pub(crate) fn replace_lessons(&mut self, module_id: &str, records: Vec<LessonRecord>) -> Result<()> {
        let entities = records
            .iter()
            .map(|l| OrderedEntity::new(l.id.clone(), l.order))
            .collect();

        let store = self.lesson_orders.entry(module_id.to_string()).or_default();
        store.load(entities)?;

        self.lessons.retain(|_, lesson| lesson.module_id != module_id);
        for record in records {
            self.lessons.insert(record.id.clone(), Lesson::from(record));
        }
        Ok(())
    }

    pub(crate) fn set_quiz(&mut self, module_id: &str, quiz: Option<Quiz>) {
        match quiz {
            Some(quiz) => {
                self.quizzes.insert(module_id.to_string(), quiz);
            }
            None => {
                self.quizzes.remove(module_id);
            }
        }
    }

    pub(crate) fn quiz(&self, module_id: &str) -> Option<&Quiz> {
        self.quizzes.get(module_id)
    }

    pub(crate) fn has_lesson(&self, lesson_id: &str) -> bool {
        self.lessons.contains_key(lesson_id)
    }

    pub(crate) fn store(&self, key: &SiblingKey) -> Option<&OrderingStore> {
        match key.scope {
            SiblingScope::Modules if self.course_id.as_deref() == Some(key.parent_id.as_str()) => {
                Some(&self.module_order)
            }
            SiblingScope::Modules => None,
            SiblingScope::Lessons => self.lesson_orders.get(&key.parent_id),
        }
    }

    fn store_mut(&mut self, key: &SiblingKey) -> Option<&mut OrderingStore> {
        match key.scope {
            SiblingScope::Modules if self.course_id.as_deref() == Some(key.parent_id.as_str()) => {
                Some(&mut self.module_order)
            }
            SiblingScope::Modules => None,
            SiblingScope::Lessons => self.lesson_orders.get_mut(&key.parent_id),
        }
    }

    /// Start the speculative phase of `intent`
    pub(crate) fn begin(&mut self, intent: &ReorderIntent) -> Result<PendingReorder> {
        let key = intent.key();
        let mut mutations = std::mem::take(&mut self.mutations);

        let result = match self.store_mut(&key) {
            Some(store) => mutations.begin(intent, store),
            None => Err(SdkError::NotLoaded(key.to_string())),
        };

        self.mutations = mutations;
        result
    }

    /// Settle a pending reorder against the store it was applied to
    pub(crate) fn settle(&mut self, pending: PendingReorder, persisted: bool) -> Settlement {
        let key = pending.key().clone();
        let mut mutations = std::mem::take(&mut self.mutations);

        let settlement = match self.store_mut(&key) {
            Some(store) => mutations.settle(pending, persisted, store),
            None => {
                debug!(sibling_set = %key, "Sibling set no longer loaded, discarding response");
                Settlement::Superseded
            }
        };

        self.mutations = mutations;
        settlement
    }

    /// Current hierarchy, in store order
    pub(crate) fn outline(&self) -> Option<CourseOutline> {
        let course_id = self.course_id.clone()?;

        let modules = self
            .module_order
            .entries()
            .iter()
            .filter_map(|entry| {
                let mut module = self.modules.get(&entry.id)?.clone();
                module.order = entry.order;

                let lessons = self
                    .lesson_orders
                    .get(&module.id)
                    .map(|store| {
                        store
                            .entries()
                            .iter()
                            .filter_map(|e| {
                                let mut lesson = self.lessons.get(&e.id)?.clone();
                                lesson.order = e.order;
                                Some(lesson)
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let quiz = self.quizzes.get(&module.id).cloned();
                Some(ModuleOutline {
                    module,
                    lessons,
                    quiz,
                })
            })
            .collect();

        Some(CourseOutline { course_id, modules })
    }
}
