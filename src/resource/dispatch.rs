//! Resource Action Dispatcher
//!
//! Decides, per resource kind, which editor opens for a record and what that
//! editor receives, and owns the open/closed state of the edit and delete
//! modals for one row.

use super::model::{Item, Mentor, Questionnaire, RecordId, ResourceKind, ResourceRecord, User};
use super::registry::is_editable;
use serde::Serialize;

/// Edit form component to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorKind {
    /// Generic title/description editor
    #[default]
    Item,
    User,
    Questionnaire,
}

/// Pick the editor for a kind.
///
/// Users and questionnaires have dedicated editors; every other kind uses
/// the caller's default.
pub fn select_edit_component(kind: ResourceKind, default: EditorKind) -> EditorKind {
    match kind {
        ResourceKind::User => EditorKind::User,
        ResourceKind::Questionnaire => EditorKind::Questionnaire,
        ResourceKind::Item | ResourceKind::Mentor => default,
    }
}

/// What an editor receives: exactly one record, labelled by its kind.
///
/// Serializes as `{"questionnaire": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditFormInput {
    Item(Item),
    User(User),
    Questionnaire(Questionnaire),
    Mentor(Mentor),
}

impl EditFormInput {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Item(_) => ResourceKind::Item,
            Self::User(_) => ResourceKind::User,
            Self::Questionnaire(_) => ResourceKind::Questionnaire,
            Self::Mentor(_) => ResourceKind::Mentor,
        }
    }

    pub fn id(&self) -> &RecordId {
        match self {
            Self::Item(item) => &item.id,
            Self::User(user) => &user.id,
            Self::Questionnaire(q) => &q.id,
            Self::Mentor(mentor) => &mentor.id,
        }
    }
}

/// Project a record into the labelled input for `kind`.
///
/// Returns `None` when the record is not of that kind.
pub fn shape_value_for_edit(kind: ResourceKind, record: &ResourceRecord) -> Option<EditFormInput> {
    match (kind, record) {
        (ResourceKind::Item, ResourceRecord::Item(item)) => Some(EditFormInput::Item(item.clone())),
        (ResourceKind::User, ResourceRecord::User(user)) => Some(EditFormInput::User(user.clone())),
        (ResourceKind::Questionnaire, ResourceRecord::Questionnaire(q)) => {
            Some(EditFormInput::Questionnaire(q.clone()))
        }
        (ResourceKind::Mentor, ResourceRecord::Mentor(mentor)) => {
            Some(EditFormInput::Mentor(mentor.clone()))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Open,
}

/// Open/closed state of one modal
#[derive(Debug, Clone, Copy, Default)]
pub struct Disclosure {
    state: ModalState,
}

impl Disclosure {
    /// Open the modal. Opening an open modal leaves it open.
    pub fn open(&mut self) {
        self.state = ModalState::Open;
    }

    /// Close the modal, returns true if it was open
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = ModalState::Closed;
        was_open
    }

    pub fn is_open(&self) -> bool {
        self.state == ModalState::Open
    }

    pub fn state(&self) -> ModalState {
        self.state
    }
}

/// Entry in a row's actions menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

impl RowAction {
    pub fn label(self, kind: ResourceKind) -> String {
        match self {
            Self::Edit => format!("Edit {}", kind),
            Self::Delete => format!("Delete {}", kind),
        }
    }
}

/// What the delete confirmation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub kind: ResourceKind,
    pub id: RecordId,
    pub label: String,
}

/// Actions for one listed record
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    kind: ResourceKind,
    record: ResourceRecord,
    default_editor: EditorKind,
    edit: Disclosure,
    delete: Disclosure,
}

impl ActionDispatcher {
    pub fn new(kind: ResourceKind, record: ResourceRecord) -> Self {
        Self {
            kind,
            record,
            default_editor: EditorKind::default(),
            edit: Disclosure::default(),
            delete: Disclosure::default(),
        }
    }

    /// Editor used for kinds without a dedicated one
    pub fn with_default_editor(mut self, editor: EditorKind) -> Self {
        self.default_editor = editor;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn record(&self) -> &ResourceRecord {
        &self.record
    }

    pub fn editable(&self) -> bool {
        is_editable(self.kind)
    }

    /// Menu entries; Edit is only offered for editable kinds
    pub fn actions(&self) -> Vec<RowAction> {
        if self.editable() {
            vec![RowAction::Edit, RowAction::Delete]
        } else {
            vec![RowAction::Delete]
        }
    }

    /// Open the edit modal. Returns false for non-editable kinds.
    pub fn request_edit(&mut self) -> bool {
        if !self.editable() {
            tracing::debug!("edit requested for non-editable kind {}", self.kind);
            return false;
        }
        self.edit.open();
        true
    }

    pub fn request_delete(&mut self) {
        self.delete.open();
    }

    pub fn close_edit(&mut self) -> bool {
        self.edit.close()
    }

    pub fn close_delete(&mut self) -> bool {
        self.delete.close()
    }

    pub fn edit_state(&self) -> ModalState {
        self.edit.state()
    }

    pub fn delete_state(&self) -> ModalState {
        self.delete.state()
    }

    /// Editor for this row, `None` when the kind cannot be edited
    pub fn edit_component(&self) -> Option<EditorKind> {
        self.editable()
            .then(|| select_edit_component(self.kind, self.default_editor))
    }

    /// Input for the editor, `None` when the kind cannot be edited
    pub fn edit_input(&self) -> Option<EditFormInput> {
        if !self.editable() {
            return None;
        }
        shape_value_for_edit(self.kind, &self.record)
    }

    pub fn delete_target(&self) -> DeleteTarget {
        DeleteTarget {
            kind: self.kind,
            id: self.record.delete_id(),
            label: self.record.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(kind: ResourceKind, value: serde_json::Value) -> ResourceRecord {
        ResourceRecord::from_value(kind, value).unwrap()
    }

    fn questionnaire() -> ResourceRecord {
        record(
            ResourceKind::Questionnaire,
            json!({"id": 7, "question": "Weekly check-in?"}),
        )
    }

    #[test]
    fn test_select_edit_component_policy() {
        let default = EditorKind::Item;
        assert_eq!(select_edit_component(ResourceKind::User, default), EditorKind::User);
        assert_eq!(
            select_edit_component(ResourceKind::Questionnaire, default),
            EditorKind::Questionnaire
        );
        assert_eq!(select_edit_component(ResourceKind::Item, default), EditorKind::Item);
        assert_eq!(select_edit_component(ResourceKind::Mentor, default), EditorKind::Item);
        // caller default wins for kinds without a dedicated editor
        assert_eq!(
            select_edit_component(ResourceKind::Item, EditorKind::Questionnaire),
            EditorKind::Questionnaire
        );
    }

    #[test]
    fn test_select_edit_component_is_stable() {
        let first = select_edit_component(ResourceKind::User, EditorKind::Item);
        let second = select_edit_component(ResourceKind::User, EditorKind::Item);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mentor_input_exposes_single_key() {
        let mentor = record(
            ResourceKind::Mentor,
            json!({"id": "m1", "mentor_email": "a@b.com"}),
        );
        let input = shape_value_for_edit(ResourceKind::Mentor, &mentor).unwrap();
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value, json!({"mentor": {"id": "m1", "mentor_email": "a@b.com"}}));

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["mentor"]);
    }

    #[test]
    fn test_user_input_is_keyed_user() {
        let user = record(ResourceKind::User, json!({"id": "u1", "email": "x@y.io"}));
        let value = serde_json::to_value(shape_value_for_edit(ResourceKind::User, &user)).unwrap();
        assert!(value.get("user").is_some());
        assert!(value.get("item").is_none());
    }

    #[test]
    fn test_mismatched_kind_yields_nothing() {
        assert!(shape_value_for_edit(ResourceKind::User, &questionnaire()).is_none());
    }

    #[test]
    fn test_request_edit_is_idempotent() {
        let mut dispatcher = ActionDispatcher::new(ResourceKind::Questionnaire, questionnaire());
        assert_eq!(dispatcher.edit_state(), ModalState::Closed);

        assert!(dispatcher.request_edit());
        assert!(dispatcher.request_edit());
        assert_eq!(dispatcher.edit_state(), ModalState::Open);

        assert!(dispatcher.close_edit());
        assert_eq!(dispatcher.edit_state(), ModalState::Closed);
        assert!(!dispatcher.close_edit());
    }

    #[test]
    fn test_edit_and_delete_modals_are_independent() {
        let mut dispatcher = ActionDispatcher::new(ResourceKind::Questionnaire, questionnaire());
        dispatcher.request_delete();
        assert_eq!(dispatcher.delete_state(), ModalState::Open);
        assert_eq!(dispatcher.edit_state(), ModalState::Closed);
    }

    #[test]
    fn test_non_editable_kind_hides_and_blocks_edit() {
        let mentor = record(
            ResourceKind::Mentor,
            json!({"id": "m1", "mentor_email": "a@b.com", "mentor_id": "u2"}),
        );
        let mut dispatcher = ActionDispatcher::new(ResourceKind::Mentor, mentor);

        assert_eq!(dispatcher.actions(), vec![RowAction::Delete]);
        assert!(!dispatcher.request_edit());
        assert_eq!(dispatcher.edit_state(), ModalState::Closed);
        assert!(dispatcher.edit_component().is_none());
        assert!(dispatcher.edit_input().is_none());

        let target = dispatcher.delete_target();
        assert_eq!(target.id, RecordId::from("u2"));
        assert_eq!(target.label, "a@b.com");
    }

    #[test]
    fn test_delete_target_forwards_kind_and_id() {
        let dispatcher = ActionDispatcher::new(ResourceKind::Questionnaire, questionnaire());
        let target = dispatcher.delete_target();
        assert_eq!(target.kind, ResourceKind::Questionnaire);
        assert_eq!(target.id, RecordId::from("7"));
        assert_eq!(RowAction::Delete.label(target.kind), "Delete Questionnaire");
    }
}
