//! Application State
//!
//! Central application state management for tadmin.

use crate::api::error::{format_api_error, ApiResult};
use crate::config::Config;
use crate::form::{FormState, Submission};
use crate::notification::{NotificationManager, Operation};
use crate::resource::dispatch::DeleteTarget;
use crate::resource::loader::{can_go_previous, CacheKey};
use crate::resource::registry::get_all_resource_keys;
use crate::resource::{
    get_resource, ActionDispatcher, LoaderEvent, PageLoader, PageState, ResourceApi, ResourceDef,
    ResourceKind, ResourceRecord, RowAction,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Application modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,        // Viewing list
    Command,       // : command input
    Help,          // ? help popup
    Actions,       // Row actions menu
    Form,          // Create/edit modal
    ConfirmDelete, // Delete confirmation modal
    Warning,       // Warning/info dialog (OK only)
    Notifications, // Notifications history panel
}

/// Request sent to the API in the background
#[derive(Debug, Clone)]
enum Mutation {
    Submit(Submission),
    Delete(DeleteTarget),
}

impl Mutation {
    fn operation(&self) -> Operation {
        match self {
            Self::Submit(Submission::Create(_)) => Operation::Create,
            Self::Submit(Submission::Update { .. }) => Operation::Update,
            Self::Delete(_) => Operation::Delete,
        }
    }

    fn kind(&self) -> ResourceKind {
        match self {
            Self::Submit(submission) => submission.kind(),
            Self::Delete(target) => target.kind,
        }
    }
}

/// Result of a background create/update/delete
#[derive(Debug)]
struct MutationOutcome {
    notification: Uuid,
    kind: ResourceKind,
    result: ApiResult<()>,
}

/// Main application state
pub struct App {
    api: Arc<dyn ResourceApi>,
    pub loader: PageLoader,
    loader_rx: mpsc::UnboundedReceiver<LoaderEvent>,
    mutation_tx: mpsc::UnboundedSender<MutationOutcome>,
    mutation_rx: mpsc::UnboundedReceiver<MutationOutcome>,

    // What is being listed
    pub kind: ResourceKind,
    pub page: u32,
    pub page_state: PageState,

    // Navigation state
    pub selected: usize,
    pub mode: Mode,

    // Row actions and modals
    pub dispatcher: Option<ActionDispatcher>,
    pub actions_selected: usize,
    pub form: Option<FormState>,
    pub delete_selected_yes: bool,
    pub deleting: bool,
    /// Request started by the open form or delete dialog
    modal_request: Option<Uuid>,

    // Command input
    pub command_text: String,
    pub command_suggestions: Vec<String>,
    pub command_suggestion_selected: usize,
    pub command_preview: Option<String>,

    // UI state
    pub error_message: Option<String>,
    pub warning_message: Option<String>,

    pub api_url: String,
    pub config: Config,
    pub readonly: bool,

    pub notification_manager: NotificationManager,
    pub notifications_selected: usize,
}

impl App {
    pub fn new(
        api: Arc<dyn ResourceApi>,
        kind: ResourceKind,
        api_url: String,
        config: Config,
        readonly: bool,
    ) -> Self {
        let (loader, loader_rx) = PageLoader::new(Arc::clone(&api));
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();

        let mut notification_manager = NotificationManager::new();
        config.notifications.apply(&mut notification_manager);

        Self {
            api,
            loader,
            loader_rx,
            mutation_tx,
            mutation_rx,
            kind,
            page: 1,
            page_state: PageState {
                page: 1,
                items: Vec::new(),
                is_placeholder: false,
                is_pending: true,
            },
            selected: 0,
            mode: Mode::Normal,
            dispatcher: None,
            actions_selected: 0,
            form: None,
            delete_selected_yes: false,
            deleting: false,
            modal_request: None,
            command_text: String::new(),
            command_suggestions: Vec::new(),
            command_suggestion_selected: 0,
            command_preview: None,
            error_message: None,
            warning_message: None,
            api_url,
            config,
            readonly,
            notification_manager,
            notifications_selected: 0,
        }
    }

    // =========================================================================
    // Resource Definition Access
    // =========================================================================

    pub fn current_resource(&self) -> &'static ResourceDef {
        get_resource(self.kind)
    }

    pub fn current_key(&self) -> CacheKey {
        CacheKey::new(self.kind, self.page)
    }

    pub fn get_available_commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = get_all_resource_keys()
            .iter()
            .map(|s| s.to_string())
            .collect();

        commands.push("create".to_string());
        commands.push("refresh".to_string());
        commands.push("notifications".to_string());
        commands.push("notifications clear".to_string());
        commands.push("quit".to_string());

        commands.sort();
        commands
    }

    // =========================================================================
    // Data Loading
    // =========================================================================

    /// Request the current page; renders from cache or placeholder at once
    pub fn load_current(&mut self) {
        self.loader.load(self.kind, self.page);
        self.sync_page();
    }

    /// Re-read the current page from the cache
    fn sync_page(&mut self) {
        self.page_state = self.loader.state(self.kind, self.page);

        if !self.page_state.items.is_empty() {
            self.selected = self.selected.min(self.page_state.items.len() - 1);
        } else {
            self.selected = 0;
        }

        self.error_message = self
            .loader
            .cache()
            .error(self.current_key())
            .map(|e| format_api_error(&e));

        self.loader.prefetch_next(self.kind, &self.page_state);
    }

    /// Apply finished background work. Returns true if anything arrived.
    pub fn drain_background(&mut self) -> bool {
        let mut changed = false;

        while let Ok(event) = self.loader_rx.try_recv() {
            self.handle_loader_event(event);
            changed = true;
        }

        while let Ok(outcome) = self.mutation_rx.try_recv() {
            self.handle_mutation_outcome(outcome);
            changed = true;
        }

        changed
    }

    fn handle_loader_event(&mut self, event: LoaderEvent) {
        // Prefetched pages just sit in the cache
        if event.key() != self.current_key() {
            return;
        }
        // Invalidated while the fetch was running
        self.loader.revalidate(self.kind, self.page);
        self.sync_page();
    }

    pub fn has_next_page(&self) -> bool {
        self.loader.has_next_page(&self.page_state)
    }

    pub fn can_go_previous(&self) -> bool {
        can_go_previous(self.page)
    }

    pub fn next_page(&mut self) {
        if !self.has_next_page() {
            return;
        }
        self.page += 1;
        self.selected = 0;
        tracing::info!("{} page {}", self.kind.key(), self.page);
        self.load_current();
    }

    pub fn prev_page(&mut self) {
        if !self.can_go_previous() {
            return;
        }
        self.page -= 1;
        self.selected = 0;
        tracing::info!("{} page {}", self.kind.key(), self.page);
        self.load_current();
    }

    /// Mark every page of the current kind stale and refetch this one
    pub fn refresh(&mut self) {
        self.loader.invalidate(self.kind);
        self.load_current();
    }

    pub fn switch_resource(&mut self, kind: ResourceKind) {
        tracing::info!("Switching to {}", kind.key());
        self.kind = kind;
        self.page = 1;
        self.selected = 0;
        self.mode = Mode::Normal;
        self.dispatcher = None;
        self.form = None;
        self.deleting = false;
        self.modal_request = None;

        if let Err(e) = self.config.set_last_resource(kind) {
            tracing::warn!("Failed to save last resource to config: {}", e);
        }

        self.load_current();
    }

    pub fn selected_record(&self) -> Option<&ResourceRecord> {
        self.page_state.items.get(self.selected)
    }

    // =========================================================================
    // List Navigation
    // =========================================================================

    pub fn next(&mut self) {
        match self.mode {
            Mode::Actions => {
                let count = self.available_actions().len();
                if count > 0 {
                    self.actions_selected = (self.actions_selected + 1).min(count - 1);
                }
            }
            Mode::Notifications => {
                let count = self.notification_manager.notifications.len();
                if count > 0 {
                    self.notifications_selected = (self.notifications_selected + 1).min(count - 1);
                }
            }
            _ => {
                if !self.page_state.items.is_empty() {
                    self.selected = (self.selected + 1).min(self.page_state.items.len() - 1);
                }
            }
        }
    }

    pub fn previous(&mut self) {
        match self.mode {
            Mode::Actions => self.actions_selected = self.actions_selected.saturating_sub(1),
            Mode::Notifications => {
                self.notifications_selected = self.notifications_selected.saturating_sub(1)
            }
            _ => self.selected = self.selected.saturating_sub(1),
        }
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.selected = self.page_state.items.len().saturating_sub(1);
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_text.clear();
        self.command_suggestions = self.get_available_commands();
        self.command_suggestion_selected = 0;
        self.command_preview = None;
    }

    pub fn update_command_suggestions(&mut self) {
        let input = self.command_text.to_lowercase();
        let all_commands = self.get_available_commands();

        if input.is_empty() {
            self.command_suggestions = all_commands;
        } else {
            self.command_suggestions = all_commands
                .into_iter()
                .filter(|cmd| cmd.contains(&input))
                .collect();
        }

        if self.command_suggestion_selected >= self.command_suggestions.len() {
            self.command_suggestion_selected = 0;
        }

        self.update_preview();
    }

    fn update_preview(&mut self) {
        self.command_preview = self
            .command_suggestions
            .get(self.command_suggestion_selected)
            .cloned();
    }

    pub fn next_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            self.command_suggestion_selected =
                (self.command_suggestion_selected + 1) % self.command_suggestions.len();
            self.update_preview();
        }
    }

    pub fn prev_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            if self.command_suggestion_selected == 0 {
                self.command_suggestion_selected = self.command_suggestions.len() - 1;
            } else {
                self.command_suggestion_selected -= 1;
            }
            self.update_preview();
        }
    }

    pub fn apply_suggestion(&mut self) {
        if let Some(preview) = &self.command_preview {
            self.command_text = preview.clone();
            self.update_command_suggestions();
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn enter_notifications_mode(&mut self) {
        self.notifications_selected = 0;
        self.mode = Mode::Notifications;
    }

    pub fn show_warning(&mut self, message: &str) {
        self.warning_message = Some(message.to_string());
        self.mode = Mode::Warning;
    }

    fn block_if_readonly(&mut self) -> bool {
        if self.readonly {
            self.show_warning("This operation is not supported in read-only mode");
        }
        self.readonly
    }

    /// Close whatever modal is open and go back to the list
    pub fn exit_mode(&mut self) {
        if let Some(dispatcher) = self.dispatcher.as_mut() {
            dispatcher.close_edit();
            dispatcher.close_delete();
        }
        self.dispatcher = None;
        self.form = None;
        self.deleting = false;
        self.modal_request = None;
        self.warning_message = None;
        self.mode = Mode::Normal;
    }

    // =========================================================================
    // Row Actions
    // =========================================================================

    /// Open the actions menu for the selected row
    pub fn open_actions(&mut self) {
        let Some(record) = self.selected_record().cloned() else {
            return;
        };
        if self.page_state.is_placeholder {
            return;
        }
        self.dispatcher = Some(ActionDispatcher::new(self.kind, record));
        self.actions_selected = 0;
        self.mode = Mode::Actions;
    }

    pub fn available_actions(&self) -> Vec<RowAction> {
        self.dispatcher
            .as_ref()
            .map(|dispatcher| dispatcher.actions())
            .unwrap_or_default()
    }

    pub fn choose_selected_action(&mut self) {
        if let Some(action) = self.available_actions().get(self.actions_selected).copied() {
            self.choose_action(action);
        }
    }

    pub fn choose_action(&mut self, action: RowAction) {
        if self.block_if_readonly() {
            self.dispatcher = None;
            return;
        }
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            return;
        };

        match action {
            RowAction::Edit => {
                if !dispatcher.request_edit() {
                    return;
                }
                match dispatcher.edit_input().and_then(|input| FormState::edit(&input)) {
                    Some(form) => {
                        self.form = Some(form);
                        self.modal_request = None;
                        self.mode = Mode::Form;
                    }
                    None => {
                        dispatcher.close_edit();
                        self.mode = Mode::Normal;
                    }
                }
            }
            RowAction::Delete => {
                dispatcher.request_delete();
                self.delete_selected_yes = false;
                self.deleting = false;
                self.modal_request = None;
                self.mode = Mode::ConfirmDelete;
            }
        }
    }

    /// Shortcut from the list: edit the selected row
    pub fn edit_selected(&mut self) {
        self.open_actions();
        if self.dispatcher.as_ref().is_some_and(|d| d.editable()) {
            self.choose_action(RowAction::Edit);
        } else if self.dispatcher.is_some() {
            self.exit_mode();
        }
    }

    /// Shortcut from the list: delete the selected row
    pub fn delete_selected(&mut self) {
        self.open_actions();
        if self.dispatcher.is_some() {
            self.choose_action(RowAction::Delete);
        }
    }

    pub fn open_create_form(&mut self) {
        if self.block_if_readonly() {
            return;
        }
        self.dispatcher = None;
        self.form = Some(FormState::create(self.kind));
        self.modal_request = None;
        self.mode = Mode::Form;
    }

    /// Validate the open form and send it. The modal stays open until the
    /// API answers.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.submitting {
            return;
        }
        let Some(submission) = form.submission() else {
            return;
        };
        form.submitting = true;
        let subject = self.dispatcher.as_ref().map(|d| d.record().label());
        let request = self.spawn_mutation(Mutation::Submit(submission), subject);
        self.modal_request = Some(request);
    }

    pub fn confirm_delete(&mut self) {
        if self.deleting {
            return;
        }
        let Some(target) = self.dispatcher.as_ref().map(|d| d.delete_target()) else {
            return;
        };
        self.deleting = true;
        let subject = Some(target.label.clone());
        let request = self.spawn_mutation(Mutation::Delete(target), subject);
        self.modal_request = Some(request);
    }

    /// Send a mutation in the background; returns its notification id
    fn spawn_mutation(&mut self, mutation: Mutation, subject: Option<String>) -> Uuid {
        let kind = mutation.kind();
        let notification = self
            .notification_manager
            .start(mutation.operation(), kind, subject);

        let api = Arc::clone(&self.api);
        let tx = self.mutation_tx.clone();

        tokio::spawn(async move {
            let result = match mutation {
                Mutation::Submit(Submission::Create(input)) => api.create(input).await.map(|_| ()),
                Mutation::Submit(Submission::Update { id, input }) => {
                    api.update(id, input).await.map(|_| ())
                }
                Mutation::Delete(target) => api.delete(target.kind, target.id).await,
            };
            let _ = tx.send(MutationOutcome {
                notification,
                kind,
                result,
            });
        });

        notification
    }

    fn handle_mutation_outcome(&mut self, outcome: MutationOutcome) {
        // Only the modal that sent the request reacts to its answer
        let owns_modal = self.modal_request == Some(outcome.notification);
        if owns_modal {
            self.modal_request = None;
        }

        match outcome.result {
            Ok(()) => {
                self.notification_manager.mark_success(outcome.notification);
                self.loader.invalidate(outcome.kind);
                if owns_modal && matches!(self.mode, Mode::Form | Mode::ConfirmDelete) {
                    self.exit_mode();
                }
                if outcome.kind == self.kind {
                    self.load_current();
                }
            }
            Err(e) => {
                tracing::error!("{} request failed: {}", outcome.kind.key(), e);
                self.notification_manager.mark_error(outcome.notification, &e);
                if owns_modal {
                    if let Some(form) = self.form.as_mut() {
                        form.submitting = false;
                    }
                    self.deleting = false;
                }
            }
        }
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    pub fn execute_command(&mut self) -> Result<bool> {
        let command_text = if self.command_text.is_empty() {
            self.command_preview.clone().unwrap_or_default()
        } else if let Some(preview) = &self.command_preview {
            if preview.contains(&self.command_text) {
                preview.clone()
            } else {
                self.command_text.clone()
            }
        } else {
            self.command_text.clone()
        };

        let parts: Vec<&str> = command_text.split_whitespace().collect();
        let Some(cmd) = parts.first().copied() else {
            self.mode = Mode::Normal;
            return Ok(false);
        };

        self.mode = Mode::Normal;

        match cmd {
            "q" | "quit" => return Ok(true),
            "notifications" => {
                if parts.get(1) == Some(&"clear") {
                    self.notification_manager.clear();
                } else {
                    self.enter_notifications_mode();
                }
            }
            "refresh" => self.refresh(),
            "create" | "new" => self.open_create_form(),
            other => match ResourceKind::from_key(other) {
                Some(kind) => self.switch_resource(kind),
                None => self.error_message = Some(format!("Unknown command: {}", other)),
            },
        }

        Ok(false)
    }
}
