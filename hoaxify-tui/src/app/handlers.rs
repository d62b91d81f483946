use crate::app::state::{App, AuthMode, Screen, Tab};
use crate::log_key_event;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Synchronous key dispatch. Keys that start backend calls are matched in
/// the main loop before this runs; everything left is pure state mutation.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Result<()> {
    if key.kind != KeyEventKind::Press {
        return Ok(());
    }

    // Priority 1: Help modal (highest priority)
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            app.toggle_help();
        }
        return Ok(());
    }

    // Priority 2: Delete confirmation modal. 'y' (confirm) is async and
    // handled in the main loop; while the delete request is in flight the
    // modal ignores everything.
    if app.feed.pending_delete.is_some() {
        if app.feed.deleting {
            return Ok(());
        }
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N')) {
            app.cancel_delete();
        }
        return Ok(());
    }

    // Priority 3: Composer modal
    if app.composer.focused {
        return handle_composer_keys(app, key);
    }

    // Priority 4: Profile edit form
    if app.profile.in_edit_mode {
        return handle_profile_edit_keys(app, key);
    }

    // Priority 5: Global keys
    match key.code {
        KeyCode::Char('?') if app.screen == Screen::Main => {
            app.toggle_help();
            return Ok(());
        }
        KeyCode::Char('q') | KeyCode::Char('Q') if app.screen == Screen::Main => {
            app.running = false;
            return Ok(());
        }
        _ => {}
    }

    match app.screen {
        Screen::Auth => handle_auth_keys(app, key),
        Screen::Main => handle_main_keys(app, key),
    }
}

pub fn handle_main_keys(app: &mut App, key: KeyEvent) -> Result<()> {
    log_key_event!(
        app.log_config,
        "main key={:?}, tab={:?}",
        key.code,
        app.tab
    );

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            app.tab = app.tab.next();
        }
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => {
            app.feed.select_next();
        }
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => {
            app.feed.select_previous();
        }
        KeyCode::Char('n') | KeyCode::Char('N') => {
            app.composer.focus();
        }
        KeyCode::Char('x') | KeyCode::Char('X') => {
            app.request_delete();
        }
        KeyCode::Char('u') | KeyCode::Char('U') if app.tab == Tab::Home => {
            app.users.select_next();
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_composer_keys(app: &mut App, key: KeyEvent) -> Result<()> {
    // Submit (Enter) and file selection (Enter in the file prompt) are
    // async, dispatched in the main loop.
    if app.composer.submitting {
        return Ok(());
    }

    if app.composer.file_input_active {
        match key.code {
            KeyCode::Esc => {
                app.composer.file_input_active = false;
                app.composer.file_input.clear();
            }
            KeyCode::Backspace => {
                app.composer.file_input.pop();
            }
            KeyCode::Char(c) => {
                app.composer.file_input.push(c);
            }
            _ => {}
        }
        return Ok(());
    }

    match key.code {
        KeyCode::Esc => {
            app.cancel_composer();
        }
        KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.composer.file_input_active = true;
        }
        _ => {
            // Everything else edits the content textarea
            app.composer.textarea.input(key);
            app.composer.errors.clear();
        }
    }
    Ok(())
}

pub fn handle_profile_edit_keys(app: &mut App, key: KeyEvent) -> Result<()> {
    // Save (Enter) is async, dispatched in the main loop.
    if app.profile.pending_update {
        return Ok(());
    }

    if app.profile.file_input_active {
        match key.code {
            KeyCode::Esc => {
                app.profile.file_input_active = false;
                app.profile.file_input.clear();
            }
            KeyCode::Backspace => {
                app.profile.file_input.pop();
            }
            KeyCode::Char(c) => {
                app.profile.file_input.push(c);
            }
            _ => {}
        }
        return Ok(());
    }

    match key.code {
        KeyCode::Esc => {
            app.profile.cancel();
        }
        KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.profile.file_input_active = true;
        }
        KeyCode::Backspace => {
            let mut name = app
                .profile
                .user
                .as_ref()
                .map(|u| u.display_name.clone())
                .unwrap_or_default();
            name.pop();
            app.profile.change_display_name(name);
        }
        KeyCode::Char(c) => {
            let mut name = app
                .profile
                .user
                .as_ref()
                .map(|u| u.display_name.clone())
                .unwrap_or_default();
            name.push(c);
            app.profile.change_display_name(name);
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_auth_keys(app: &mut App, key: KeyEvent) -> Result<()> {
    // Enter (login/signup) is async, dispatched in the main loop.
    if app.auth.pending {
        return Ok(());
    }

    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.auth.focus = (app.auth.focus + 1) % app.auth.field_count();
        }
        KeyCode::BackTab | KeyCode::Up => {
            let count = app.auth.field_count();
            app.auth.focus = (app.auth.focus + count - 1) % count;
        }
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.auth.toggle_mode();
        }
        KeyCode::Backspace => {
            focused_auth_field(app).pop();
            clear_focused_auth_error(app);
        }
        KeyCode::Char(c) => {
            focused_auth_field(app).push(c);
            clear_focused_auth_error(app);
        }
        _ => {}
    }
    Ok(())
}

/// Field order mirrors the form layout: login is username/password, signup
/// is display name, username, password, password repeat.
fn focused_auth_field(app: &mut App) -> &mut String {
    match (app.auth.mode, app.auth.focus) {
        (AuthMode::Login, 0) => &mut app.auth.username,
        (AuthMode::Login, _) => &mut app.auth.password,
        (AuthMode::Signup, 0) => &mut app.auth.display_name,
        (AuthMode::Signup, 1) => &mut app.auth.username,
        (AuthMode::Signup, 2) => &mut app.auth.password,
        (AuthMode::Signup, _) => &mut app.auth.password_repeat,
    }
}

/// Editing a field dismisses the error attached to it.
fn clear_focused_auth_error(app: &mut App) {
    app.auth.login_error = None;
    match (app.auth.mode, app.auth.focus) {
        (AuthMode::Signup, 0) => app.auth.signup_errors.display_name = None,
        (AuthMode::Signup, 1) => app.auth.signup_errors.username = None,
        (AuthMode::Signup, 2) => app.auth.signup_errors.password = None,
        _ => {}
    }
}
