//! Event Handling
//!
//! Keyboard and event handling for tadmin.

use crate::app::{App, Mode};
use crate::resource::RowAction;
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::time::Duration;

/// Handle events, returns true if app should quit
pub fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            return handle_key_event(app, key.code, key.modifiers);
        }
    }
    Ok(false)
}

pub fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers),
        Mode::Command => handle_command_mode(app, code, modifiers),
        Mode::Help => handle_help_mode(app, code),
        Mode::Actions => handle_actions_mode(app, code),
        Mode::Form => handle_form_mode(app, code, modifiers),
        Mode::ConfirmDelete => handle_confirm_mode(app, code),
        Mode::Warning => handle_warning_mode(app, code),
        Mode::Notifications => handle_notifications_mode(app, code),
    }
}

fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Char('q') => return Ok(true),

        // Navigation - vim style + accessible alternatives
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Home => app.go_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.go_to_bottom(),

        // Quick jump to a row on the page
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(digit) = c.to_digit(10) {
                let idx = digit as usize - 1;
                if idx < app.page_state.items.len() {
                    app.selected = idx;
                }
            }
        }

        // Pagination
        KeyCode::Char(']') | KeyCode::Char('n') | KeyCode::Right => app.next_page(),
        KeyCode::Char('[') | KeyCode::Char('p') | KeyCode::Left => app.prev_page(),

        KeyCode::Char('R') => app.refresh(),

        // Row actions
        KeyCode::Enter => app.open_actions(),
        KeyCode::Char('e') => app.edit_selected(),
        KeyCode::Char('d') if !modifiers.contains(KeyModifiers::CONTROL) => app.delete_selected(),
        KeyCode::Char('a') | KeyCode::Char('c') => app.open_create_form(),

        KeyCode::Char(':') => app.enter_command_mode(),
        KeyCode::Char('?') => app.enter_help_mode(),
        KeyCode::Char('N') => app.enter_notifications_mode(),
        _ => {}
    }
    Ok(false)
}

fn handle_command_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.exit_mode();
        }
        KeyCode::Enter => {
            return app.execute_command();
        }
        KeyCode::Backspace => {
            app.command_text.pop();
            app.update_command_suggestions();
        }
        KeyCode::Tab | KeyCode::Right => {
            app.apply_suggestion();
        }
        KeyCode::Down => {
            app.next_suggestion();
        }
        KeyCode::Up => {
            app.prev_suggestion();
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_text.push(c);
            app.update_command_suggestions();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    if matches!(
        code,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter
    ) {
        app.exit_mode();
    }
    Ok(false)
}

fn handle_actions_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => app.exit_mode(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Enter => app.choose_selected_action(),
        KeyCode::Char('e') if app.available_actions().contains(&RowAction::Edit) => {
            app.choose_action(RowAction::Edit)
        }
        KeyCode::Char('d') => app.choose_action(RowAction::Delete),
        _ => {}
    }
    Ok(false)
}

fn handle_form_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Saving: the form stays until the API answers
    if app.form.as_ref().is_some_and(|form| form.submitting) {
        return Ok(false);
    }
    if code == KeyCode::Esc {
        app.exit_mode();
        return Ok(false);
    }
    if code == KeyCode::Enter
        || (code == KeyCode::Char('s') && modifiers.contains(KeyModifiers::CONTROL))
    {
        app.submit_form();
        return Ok(false);
    }

    let Some(form) = app.form.as_mut() else {
        app.exit_mode();
        return Ok(false);
    };

    match code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Left | KeyCode::Right => form.toggle(),
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => form.input_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_confirm_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    if app.deleting {
        return Ok(false);
    }
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.exit_mode(),
        KeyCode::Left | KeyCode::Char('h') => app.delete_selected_yes = true,
        KeyCode::Right | KeyCode::Char('l') => app.delete_selected_yes = false,
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
        KeyCode::Enter => {
            if app.delete_selected_yes {
                app.confirm_delete();
            } else {
                app.exit_mode();
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_warning_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    if matches!(code, KeyCode::Esc | KeyCode::Enter) {
        app.exit_mode();
    }
    Ok(false)
}

fn handle_notifications_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => app.exit_mode(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Char('c') => {
            app.notification_manager.clear();
            app.notifications_selected = 0;
        }
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::resource::testing::{items, FakeApi};
    use crate::resource::{ResourceApi, ResourceKind};
    use std::sync::Arc;

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, code, KeyModifiers::NONE).unwrap()
    }

    fn app() -> App {
        let api: Arc<dyn ResourceApi> =
            Arc::new(FakeApi::new().with_records(ResourceKind::Item, items(3)));
        App::new(api, ResourceKind::Item, String::new(), Config::default(), false)
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(handle_key_event(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL).unwrap());
    }

    #[tokio::test]
    async fn test_create_form_typing_and_cancel() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.mode, Mode::Form);

        for c in "Pen".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.form.as_ref().unwrap().fields[0].display_value(), "Pe");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.form.is_none());
    }

    #[tokio::test]
    async fn test_previous_page_disabled_on_first_page() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.page, 1);
    }

    /// Let spawned fetches and mutations finish, then apply them
    async fn drain(app: &mut App) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
            app.drain_background();
        }
    }

    #[tokio::test]
    async fn test_escape_is_ignored_while_saving() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        for c in "Pen".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.form.as_ref().unwrap().submitting);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Form);
        assert!(app.form.is_some());

        drain(&mut app).await;
        assert_eq!(app.mode, Mode::Normal);
    }

    #[tokio::test]
    async fn test_escape_during_delete_does_not_allow_a_second_delete() {
        let api = Arc::new(FakeApi::new().with_records(ResourceKind::Item, items(3)));
        let mut app = App::new(
            Arc::clone(&api) as Arc<dyn ResourceApi>,
            ResourceKind::Item,
            String::new(),
            Config::default(),
            false,
        );
        app.load_current();
        drain(&mut app).await;

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, Mode::ConfirmDelete);
        press(&mut app, KeyCode::Char('y'));
        assert!(app.deleting);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, Mode::ConfirmDelete);

        drain(&mut app).await;
        assert_eq!(api.deleted().len(), 1);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[tokio::test]
    async fn test_help_toggles() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, Mode::Help);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, Mode::Normal);
    }
}
