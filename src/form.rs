//! Create and edit forms
//!
//! One [`FormState`] per open modal. Fields are typed per resource kind,
//! validated on submit, and turned into a [`Submission`] for the API.

use crate::resource::dispatch::EditFormInput;
use crate::resource::model::{
    parse_datetime, ItemCreate, ItemUpdate, MentorAssign, QuestionnaireInput, UserCreate,
    UserUpdate,
};
use crate::resource::{CreateInput, RecordId, ResourceKind, UpdateInput};
use regex::Regex;
use std::sync::OnceLock;

const MAX_TEXT_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 40;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .unwrap_or_else(|e| panic!("invalid email pattern: {}", e))
    })
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Title,
    Description,
    Email,
    FullName,
    Password,
    ConfirmPassword,
    IsSuperuser,
    IsActive,
    Question,
    Answer,
    WrittenAnswer,
    NotificationDate,
    MentorEmail,
}

impl FieldKey {
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Email => "Email",
            Self::FullName => "Full name",
            Self::Password => "Password",
            Self::ConfirmPassword => "Confirm password",
            Self::IsSuperuser => "Is superuser?",
            Self::IsActive => "Is active?",
            Self::Question => "Question",
            Self::Answer => "Answer",
            Self::WrittenAnswer => "Written answer",
            Self::NotificationDate => "Notification date",
            Self::MentorEmail => "Mentor email",
        }
    }

    fn is_secret(self) -> bool {
        matches!(self, Self::Password | Self::ConfirmPassword)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    /// Yes / No / not answered
    Answer(Option<bool>),
}

impl FieldValue {
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Flag(true) => "[x]".to_string(),
            Self::Flag(false) => "[ ]".to_string(),
            Self::Answer(Some(true)) => "Yes".to_string(),
            Self::Answer(Some(false)) => "No".to_string(),
            Self::Answer(None) => "N/A".to_string(),
        }
    }
}

fn toggled(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Flag(on) => FieldValue::Flag(!on),
        FieldValue::Answer(None) => FieldValue::Answer(Some(true)),
        FieldValue::Answer(Some(true)) => FieldValue::Answer(Some(false)),
        FieldValue::Answer(Some(false)) => FieldValue::Answer(None),
        FieldValue::Text(_) => value.clone(),
    }
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub key: FieldKey,
    pub value: FieldValue,
    pub error: Option<String>,
}

impl FormField {
    fn text(key: FieldKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: FieldValue::Text(value.into()),
            error: None,
        }
    }

    fn flag(key: FieldKey, value: bool) -> Self {
        Self {
            key,
            value: FieldValue::Flag(value),
            error: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.key.label()
    }

    /// Rendered value, secrets masked
    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(text) if self.key.is_secret() => "*".repeat(text.chars().count()),
            other => other.display(),
        }
    }

    fn text_value(&self) -> &str {
        match &self.value {
            FieldValue::Text(text) => text,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

/// Validated form output, ready for the API
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(CreateInput),
    Update { id: RecordId, input: UpdateInput },
}

impl Submission {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Create(input) => input.kind(),
            Self::Update { input, .. } => input.kind(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub kind: ResourceKind,
    pub mode: FormMode,
    pub fields: Vec<FormField>,
    pub focus: usize,
    /// Waiting for the API; further submits are ignored
    pub submitting: bool,
    initial: Vec<FieldValue>,
}

impl FormState {
    fn from_fields(kind: ResourceKind, mode: FormMode, fields: Vec<FormField>) -> Self {
        let initial = fields.iter().map(|field| field.value.clone()).collect();
        Self {
            kind,
            mode,
            fields,
            focus: 0,
            submitting: false,
            initial,
        }
    }

    /// Empty create form for a kind
    pub fn create(kind: ResourceKind) -> Self {
        let fields = match kind {
            ResourceKind::Item => vec![
                FormField::text(FieldKey::Title, ""),
                FormField::text(FieldKey::Description, ""),
            ],
            ResourceKind::User => vec![
                FormField::text(FieldKey::Email, ""),
                FormField::text(FieldKey::FullName, ""),
                FormField::text(FieldKey::Password, ""),
                FormField::text(FieldKey::ConfirmPassword, ""),
                FormField::flag(FieldKey::IsSuperuser, false),
                FormField::flag(FieldKey::IsActive, false),
            ],
            ResourceKind::Questionnaire => vec![
                FormField::text(FieldKey::Question, ""),
                FormField {
                    key: FieldKey::Answer,
                    value: FieldValue::Answer(None),
                    error: None,
                },
                FormField::text(FieldKey::WrittenAnswer, ""),
                FormField::text(FieldKey::NotificationDate, ""),
            ],
            ResourceKind::Mentor => vec![FormField::text(FieldKey::MentorEmail, "")],
        };
        Self::from_fields(kind, FormMode::Create, fields)
    }

    /// Edit form pre-filled from the dispatcher's input. Mentors have none.
    pub fn edit(input: &EditFormInput) -> Option<Self> {
        let fields = match input {
            EditFormInput::Item(item) => vec![
                FormField::text(FieldKey::Title, item.title.clone()),
                FormField::text(FieldKey::Description, item.description.clone().unwrap_or_default()),
            ],
            EditFormInput::User(user) => vec![
                FormField::text(FieldKey::Email, user.email.clone()),
                FormField::text(FieldKey::FullName, user.full_name.clone().unwrap_or_default()),
                FormField::text(FieldKey::Password, ""),
                FormField::text(FieldKey::ConfirmPassword, ""),
                FormField::flag(FieldKey::IsSuperuser, user.is_superuser),
                FormField::flag(FieldKey::IsActive, user.is_active),
            ],
            EditFormInput::Questionnaire(q) => vec![
                FormField::text(FieldKey::Question, q.question.clone()),
                FormField {
                    key: FieldKey::Answer,
                    value: FieldValue::Answer(q.answer),
                    error: None,
                },
                FormField::text(FieldKey::WrittenAnswer, q.written_answer.clone().unwrap_or_default()),
                FormField::text(
                    FieldKey::NotificationDate,
                    q.notification_date
                        .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                ),
            ],
            EditFormInput::Mentor(_) => return None,
        };
        Some(Self::from_fields(
            input.kind(),
            FormMode::Edit(input.id().clone()),
            fields,
        ))
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Create if self.kind == ResourceKind::Mentor => "Assign Mentor".to_string(),
            FormMode::Create => format!("Add {}", self.kind),
            FormMode::Edit(_) => format!("Edit {}", self.kind),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    pub fn is_dirty(&self) -> bool {
        self.fields
            .iter()
            .zip(&self.initial)
            .any(|(field, initial)| &field.value != initial)
    }

    /// Edit forms can only be saved once something changed
    pub fn can_submit(&self) -> bool {
        !self.submitting && (!self.is_edit() || self.is_dirty())
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn input_char(&mut self, c: char) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match &mut field.value {
            FieldValue::Text(text) => {
                text.push(c);
                field.error = None;
            }
            value if c == ' ' => *value = toggled(value),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if let FieldValue::Text(text) = &mut field.value {
                text.pop();
                field.error = None;
            }
        }
    }

    /// Flip a checkbox, or cycle an answer Yes -> No -> N/A
    pub fn toggle(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value = toggled(&field.value);
        }
    }

    fn text(&self, key: FieldKey) -> String {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.text_value().trim().to_string())
            .unwrap_or_default()
    }

    fn optional_text(&self, key: FieldKey) -> Option<String> {
        Some(self.text(key)).filter(|text| !text.is_empty())
    }

    fn flag(&self, key: FieldKey) -> bool {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .is_some_and(|field| field.value == FieldValue::Flag(true))
    }

    fn answer(&self) -> Option<bool> {
        self.fields
            .iter()
            .find_map(|field| match field.value {
                FieldValue::Answer(answer) => Some(answer),
                _ => None,
            })
            .flatten()
    }

    fn check(&self, field: &FormField) -> Option<String> {
        let value = field.text_value().trim();
        let len = value.chars().count();
        let password_required = !self.is_edit();

        match field.key {
            FieldKey::Title | FieldKey::Question if value.is_empty() => {
                Some(format!("{} is required.", field.label()))
            }
            FieldKey::Email | FieldKey::MentorEmail if value.is_empty() => {
                Some("Email is required".to_string())
            }
            FieldKey::Email | FieldKey::MentorEmail if !is_valid_email(value) => {
                Some("Invalid email address".to_string())
            }
            FieldKey::Title
            | FieldKey::Description
            | FieldKey::Email
            | FieldKey::MentorEmail
            | FieldKey::FullName
                if len > MAX_TEXT_LEN =>
            {
                Some(format!("{} can be at most {} characters.", field.label(), MAX_TEXT_LEN))
            }
            FieldKey::Password if value.is_empty() && password_required => {
                Some("Password is required".to_string())
            }
            FieldKey::Password if !value.is_empty() && len < MIN_PASSWORD_LEN => {
                Some(format!("Password must be at least {} characters", MIN_PASSWORD_LEN))
            }
            FieldKey::Password if len > MAX_PASSWORD_LEN => {
                Some(format!("Password can be at most {} characters", MAX_PASSWORD_LEN))
            }
            FieldKey::ConfirmPassword
                if (password_required || !self.text(FieldKey::Password).is_empty())
                    && value.is_empty() =>
            {
                Some("Please confirm your password".to_string())
            }
            FieldKey::ConfirmPassword if value != self.text(FieldKey::Password) => {
                Some("The passwords do not match".to_string())
            }
            FieldKey::NotificationDate if !value.is_empty() && parse_datetime(value).is_none() => {
                Some("Use YYYY-MM-DD or YYYY-MM-DD HH:MM".to_string())
            }
            _ => None,
        }
    }

    /// Run every rule, storing messages on the fields. True when all pass.
    pub fn validate(&mut self) -> bool {
        let errors: Vec<Option<String>> = self.fields.iter().map(|field| self.check(field)).collect();
        for (field, error) in self.fields.iter_mut().zip(errors) {
            field.error = error;
        }
        if let Some(first) = self.fields.iter().position(|field| field.error.is_some()) {
            self.focus = first;
            return false;
        }
        true
    }

    /// Validate and build the API payload.
    ///
    /// `None` when a rule fails, when an edit form is unchanged, or while a
    /// previous submit is still running.
    pub fn submission(&mut self) -> Option<Submission> {
        if !self.can_submit() || !self.validate() {
            return None;
        }

        let notification_date = self
            .optional_text(FieldKey::NotificationDate)
            .and_then(|raw| parse_datetime(&raw));

        let submission = match (&self.mode, self.kind) {
            (FormMode::Create, ResourceKind::Item) => Submission::Create(CreateInput::Item(ItemCreate {
                title: self.text(FieldKey::Title),
                description: self.optional_text(FieldKey::Description),
            })),
            (FormMode::Create, ResourceKind::User) => Submission::Create(CreateInput::User(UserCreate {
                email: self.text(FieldKey::Email),
                password: self.text(FieldKey::Password),
                full_name: self.optional_text(FieldKey::FullName),
                is_active: self.flag(FieldKey::IsActive),
                is_superuser: self.flag(FieldKey::IsSuperuser),
            })),
            (FormMode::Create, ResourceKind::Questionnaire) => {
                Submission::Create(CreateInput::Questionnaire(QuestionnaireInput {
                    question: self.text(FieldKey::Question),
                    answer: self.answer(),
                    written_answer: self.optional_text(FieldKey::WrittenAnswer),
                    notification_date,
                }))
            }
            (FormMode::Create, ResourceKind::Mentor) => Submission::Create(CreateInput::Mentor(MentorAssign {
                mentor_email: self.text(FieldKey::MentorEmail),
            })),
            (FormMode::Edit(id), ResourceKind::Item) => Submission::Update {
                id: id.clone(),
                input: UpdateInput::Item(ItemUpdate {
                    title: self.text(FieldKey::Title),
                    description: self.optional_text(FieldKey::Description),
                }),
            },
            (FormMode::Edit(id), ResourceKind::User) => Submission::Update {
                id: id.clone(),
                input: UpdateInput::User(UserUpdate {
                    email: self.text(FieldKey::Email),
                    full_name: self.optional_text(FieldKey::FullName),
                    password: self.optional_text(FieldKey::Password),
                    is_active: self.flag(FieldKey::IsActive),
                    is_superuser: self.flag(FieldKey::IsSuperuser),
                }),
            },
            (FormMode::Edit(id), ResourceKind::Questionnaire) => Submission::Update {
                id: id.clone(),
                input: UpdateInput::Questionnaire(QuestionnaireInput {
                    question: self.text(FieldKey::Question),
                    answer: self.answer(),
                    written_answer: self.optional_text(FieldKey::WrittenAnswer),
                    notification_date,
                }),
            },
            (FormMode::Edit(_), ResourceKind::Mentor) => return None,
        };

        Some(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::dispatch::shape_value_for_edit;
    use crate::resource::ResourceRecord;
    use serde_json::json;

    fn type_text(form: &mut FormState, text: &str) {
        for c in text.chars() {
            form.input_char(c);
        }
    }

    fn edit_form(kind: ResourceKind, value: serde_json::Value) -> FormState {
        let record = ResourceRecord::from_value(kind, value).unwrap();
        FormState::edit(&shape_value_for_edit(kind, &record).unwrap()).unwrap()
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("mentor@example.com"));
        assert!(is_valid_email("  a.b+c@sub.example.io "));
        assert!(!is_valid_email("mentor@"));
        assert!(!is_valid_email("no-at-sign.com"));
    }

    #[test]
    fn test_item_title_is_required() {
        let mut form = FormState::create(ResourceKind::Item);
        assert!(form.submission().is_none());
        assert_eq!(form.fields[0].error.as_deref(), Some("Title is required."));

        type_text(&mut form, "Laptop");
        let submission = form.submission().unwrap();
        assert_eq!(
            submission,
            Submission::Create(CreateInput::Item(ItemCreate {
                title: "Laptop".to_string(),
                description: None,
            }))
        );
    }

    #[test]
    fn test_long_description_rejected() {
        let mut form = FormState::create(ResourceKind::Item);
        type_text(&mut form, "ok");
        form.focus_next();
        type_text(&mut form, &"x".repeat(256));
        assert!(form.submission().is_none());
        assert_eq!(form.focus, 1);
    }

    #[test]
    fn test_user_create_password_rules() {
        let mut form = FormState::create(ResourceKind::User);
        type_text(&mut form, "new@example.com");
        form.focus = 2;
        type_text(&mut form, "short");
        assert!(form.submission().is_none());
        assert!(form.fields[2].error.as_deref().unwrap().contains("at least 8"));

        form.fields[2].value = FieldValue::Text("long enough".to_string());
        form.fields[3].value = FieldValue::Text("different!".to_string());
        assert!(form.submission().is_none());
        assert_eq!(form.fields[3].error.as_deref(), Some("The passwords do not match"));

        form.fields[3].value = FieldValue::Text("long enough".to_string());
        form.focus = 5;
        form.toggle();
        match form.submission() {
            Some(Submission::Create(CreateInput::User(user))) => {
                assert_eq!(user.email, "new@example.com");
                assert!(user.is_active);
                assert!(!user.is_superuser);
            }
            other => panic!("unexpected submission: {:?}", other),
        }
    }

    #[test]
    fn test_edit_requires_changes() {
        let mut form = edit_form(
            ResourceKind::Item,
            json!({"id": 3, "title": "Desk", "description": "Oak"}),
        );
        assert_eq!(form.title(), "Edit Item");
        assert!(!form.is_dirty());
        assert!(form.submission().is_none());

        type_text(&mut form, "s");
        assert!(form.is_dirty());
        match form.submission() {
            Some(Submission::Update { id, input: UpdateInput::Item(body) }) => {
                assert_eq!(id, RecordId::from(3));
                assert_eq!(body.title, "Desks");
                assert_eq!(body.description.as_deref(), Some("Oak"));
            }
            other => panic!("unexpected submission: {:?}", other),
        }
    }

    #[test]
    fn test_user_edit_password_optional() {
        let mut form = edit_form(
            ResourceKind::User,
            json!({"id": "u1", "email": "x@y.io", "is_active": true}),
        );
        form.focus = 1;
        type_text(&mut form, "Xavier");
        match form.submission() {
            Some(Submission::Update { input: UpdateInput::User(body), .. }) => {
                assert_eq!(body.password, None);
                assert_eq!(body.full_name.as_deref(), Some("Xavier"));
                assert!(body.is_active);
            }
            other => panic!("unexpected submission: {:?}", other),
        }
    }

    #[test]
    fn test_questionnaire_answer_cycles_and_date_parses() {
        let mut form = FormState::create(ResourceKind::Questionnaire);
        type_text(&mut form, "Weekly check-in?");
        form.focus_next();
        form.toggle();
        assert_eq!(form.fields[1].value, FieldValue::Answer(Some(true)));
        form.toggle();
        form.toggle();
        assert_eq!(form.fields[1].value, FieldValue::Answer(None));
        form.toggle();

        form.focus = 3;
        type_text(&mut form, "tomorrow");
        assert!(form.submission().is_none());

        form.fields[3].value = FieldValue::Text("2024-05-01 09:30".to_string());
        match form.submission() {
            Some(Submission::Create(CreateInput::Questionnaire(body))) => {
                assert_eq!(body.answer, Some(true));
                assert_eq!(
                    body.notification_date.map(|d| d.to_string()),
                    Some("2024-05-01 09:30:00".to_string())
                );
            }
            other => panic!("unexpected submission: {:?}", other),
        }
    }

    #[test]
    fn test_mentor_assign_by_email() {
        let mut form = FormState::create(ResourceKind::Mentor);
        assert_eq!(form.title(), "Assign Mentor");
        type_text(&mut form, "not-an-email");
        assert!(form.submission().is_none());
        assert_eq!(form.fields[0].error.as_deref(), Some("Invalid email address"));

        form.fields[0].value = FieldValue::Text("mentor@example.com".to_string());
        assert_eq!(form.submission().map(|s| s.kind()), Some(ResourceKind::Mentor));
    }

    #[test]
    fn test_mentor_email_length_limit() {
        let mut form = FormState::create(ResourceKind::Mentor);
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&long));
        type_text(&mut form, &long);
        assert!(form.submission().is_none());
        assert_eq!(
            form.fields[0].error.as_deref(),
            Some("Mentor email can be at most 255 characters.")
        );
    }

    #[test]
    fn test_mentor_has_no_edit_form() {
        let record = ResourceRecord::from_value(
            ResourceKind::Mentor,
            json!({"id": "m1", "mentor_email": "a@b.com"}),
        )
        .unwrap();
        let input = shape_value_for_edit(ResourceKind::Mentor, &record).unwrap();
        assert!(FormState::edit(&input).is_none());
    }

    #[test]
    fn test_secret_fields_are_masked() {
        let mut form = FormState::create(ResourceKind::User);
        form.focus = 2;
        type_text(&mut form, "hunter22");
        assert_eq!(form.fields[2].display_value(), "********");
    }

    #[test]
    fn test_submitting_blocks_resubmit() {
        let mut form = FormState::create(ResourceKind::Mentor);
        type_text(&mut form, "a@b.com");
        form.submitting = true;
        assert!(form.submission().is_none());
    }
}
