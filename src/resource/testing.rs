//! In-memory [`ResourceApi`] for unit tests

use super::model::{
    CreateInput, Item, Mentor, Questionnaire, RecordId, ResourceKind, ResourceRecord, UpdateInput,
    User,
};
use super::remote::{PageWindow, ResourceApi};
use crate::api::error::{ApiError, ApiResult};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

pub fn questionnaires(count: usize) -> Vec<ResourceRecord> {
    (1..=count)
        .map(|n| {
            ResourceRecord::Questionnaire(Questionnaire {
                id: RecordId::from(n as i64),
                question: format!("Question {}", n),
                answer: None,
                written_answer: None,
                notification_date: None,
                user_id: None,
            })
        })
        .collect()
}

pub fn items(count: usize) -> Vec<ResourceRecord> {
    (1..=count)
        .map(|n| {
            ResourceRecord::Item(Item {
                id: RecordId::from(n as i64),
                title: format!("Item {}", n),
                description: None,
                owner_id: None,
            })
        })
        .collect()
}

/// Backend double. List calls can be held at a gate and released one by one.
pub struct FakeApi {
    records: Mutex<HashMap<ResourceKind, Vec<ResourceRecord>>>,
    list_calls: Mutex<Vec<(ResourceKind, PageWindow)>>,
    deleted: Mutex<Vec<(ResourceKind, RecordId)>>,
    updated: Mutex<Vec<(RecordId, UpdateInput)>>,
    created: Mutex<Vec<CreateInput>>,
    gate: Semaphore,
    fail_lists: AtomicBool,
    mutation_error: Mutex<Option<ApiError>>,
    next_id: AtomicI64,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::with_gate(Semaphore::MAX_PERMITS)
    }

    /// List calls block until [`FakeApi::release`] is called
    pub fn paused() -> Self {
        Self::with_gate(0)
    }

    fn with_gate(permits: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            list_calls: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            gate: Semaphore::new(permits),
            fail_lists: AtomicBool::new(false),
            mutation_error: Mutex::new(None),
            next_id: AtomicI64::new(1000),
        }
    }

    pub fn with_records(self, kind: ResourceKind, records: Vec<ResourceRecord>) -> Self {
        self.records.lock().unwrap().insert(kind, records);
        self
    }

    /// Let `n` held list calls through
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self, error: Option<ApiError>) {
        *self.mutation_error.lock().unwrap() = error;
    }

    pub fn list_calls(&self) -> Vec<(ResourceKind, PageWindow)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<(ResourceKind, RecordId)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(RecordId, UpdateInput)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<CreateInput> {
        self.created.lock().unwrap().clone()
    }

    fn mutation_error(&self) -> Option<ApiError> {
        self.mutation_error.lock().unwrap().clone()
    }
}

impl ResourceApi for FakeApi {
    fn list(
        &self,
        kind: ResourceKind,
        window: PageWindow,
    ) -> BoxFuture<'_, ApiResult<Vec<ResourceRecord>>> {
        Box::pin(async move {
            self.list_calls.lock().unwrap().push((kind, window));
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
            if self.fail_lists.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    detail: Some("list failed".to_string()),
                });
            }
            let all = self
                .records
                .lock()
                .unwrap()
                .get(&kind)
                .cloned()
                .unwrap_or_default();
            Ok(window.slice(all))
        })
    }

    fn create(&self, input: CreateInput) -> BoxFuture<'_, ApiResult<ResourceRecord>> {
        Box::pin(async move {
            if let Some(err) = self.mutation_error() {
                return Err(err);
            }
            self.created.lock().unwrap().push(input.clone());
            let id = RecordId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
            let record = match input {
                CreateInput::Item(body) => ResourceRecord::Item(Item {
                    id,
                    title: body.title,
                    description: body.description,
                    owner_id: None,
                }),
                CreateInput::User(body) => ResourceRecord::User(User {
                    id,
                    email: body.email,
                    full_name: body.full_name,
                    is_active: body.is_active,
                    is_superuser: body.is_superuser,
                }),
                CreateInput::Questionnaire(body) => ResourceRecord::Questionnaire(Questionnaire {
                    id,
                    question: body.question,
                    answer: body.answer,
                    written_answer: body.written_answer,
                    notification_date: body.notification_date,
                    user_id: None,
                }),
                CreateInput::Mentor(body) => ResourceRecord::Mentor(Mentor {
                    id,
                    mentor_email: body.mentor_email,
                    mentee_id: None,
                    mentor_id: None,
                }),
            };
            Ok(record)
        })
    }

    fn update(&self, id: RecordId, input: UpdateInput) -> BoxFuture<'_, ApiResult<ResourceRecord>> {
        Box::pin(async move {
            if let Some(err) = self.mutation_error() {
                return Err(err);
            }
            self.updated.lock().unwrap().push((id.clone(), input.clone()));
            let record = match input {
                UpdateInput::Item(body) => ResourceRecord::Item(Item {
                    id,
                    title: body.title,
                    description: body.description,
                    owner_id: None,
                }),
                UpdateInput::User(body) => ResourceRecord::User(User {
                    id,
                    email: body.email,
                    full_name: body.full_name,
                    is_active: body.is_active,
                    is_superuser: body.is_superuser,
                }),
                UpdateInput::Questionnaire(body) => ResourceRecord::Questionnaire(Questionnaire {
                    id,
                    question: body.question,
                    answer: body.answer,
                    written_answer: body.written_answer,
                    notification_date: body.notification_date,
                    user_id: None,
                }),
            };
            Ok(record)
        })
    }

    fn delete(&self, kind: ResourceKind, id: RecordId) -> BoxFuture<'_, ApiResult<()>> {
        Box::pin(async move {
            if let Some(err) = self.mutation_error() {
                return Err(err);
            }
            self.deleted.lock().unwrap().push((kind, id.clone()));
            if let Some(records) = self.records.lock().unwrap().get_mut(&kind) {
                records.retain(|record| record.id() != &id);
            }
            Ok(())
        })
    }
}
