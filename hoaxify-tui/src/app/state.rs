use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ratatui::widgets::ListState;
use tui_textarea::TextArea;

use hoaxify_types::{Attachment, Hoax, Page, User};

use crate::api::HoaxifyApi;
use crate::poller::Poller;
use crate::session::{Session, SessionStore};

pub const EMPTY_FEED_MESSAGE: &str = "There are no hoaxes";
pub const LOAD_MORE_LABEL: &str = "Load More";
pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";
pub const USER_LOAD_ERROR_MESSAGE: &str = "Load Error";
pub const USERS_NEXT_LABEL: &str = "next >";
pub const USERS_PREV_LABEL: &str = "< prev";

/// Banner text for the "new hoaxes available" control.
/// Exactly 1 gets singular phrasing, everything else plural.
pub fn new_hoax_message(count: u64) -> String {
    if count == 1 {
        "There is 1 new hoax".to_string()
    } else {
        format!("There are {} new hoaxes", count)
    }
}

/// Body of the delete confirmation modal for a staged hoax.
pub fn delete_prompt(hoax: &Hoax) -> String {
    format!("Are you sure to delete \"{}\"?", hoax.content)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    Auth,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Home,
    Profile,
}

impl Tab {
    pub fn next(&self) -> Self {
        match self {
            Tab::Home => Tab::Profile,
            Tab::Profile => Tab::Home,
        }
    }
}

/// Whose timeline the feed shows.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedScope {
    Global,
    User(String),
}

impl FeedScope {
    pub fn username(&self) -> Option<&str> {
        match self {
            FeedScope::Global => None,
            FeedScope::User(name) => Some(name.as_str()),
        }
    }
}

/// Which of the feed's mutually exclusive display states to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedDisplay {
    InitialLoading,
    Empty,
    Hoaxes,
}

/// Paginated, pollable, deletable list of hoaxes for one scope.
///
/// `page` is the accumulated view: the content of possibly several backend
/// pages concatenated newest-first, carrying the pagination metadata of the
/// most recently fetched older page.
pub struct FeedState {
    pub scope: FeedScope,
    pub page: Page<Hoax>,
    pub loading_initial: bool,
    pub loading_older: bool,
    pub loading_newer: bool,
    pub new_hoax_count: u64,
    pub pending_delete: Option<Hoax>,
    pub deleting: bool,
    pub list_state: ListState,
}

impl FeedState {
    pub fn new(scope: FeedScope) -> Self {
        Self {
            scope,
            page: Page::default(),
            loading_initial: false,
            loading_older: false,
            loading_newer: false,
            new_hoax_count: 0,
            pending_delete: None,
            deleting: false,
            list_state: ListState::default(),
        }
    }

    /// Id of the newest hoax in the view, 0 when empty. Recomputed from the
    /// current head on every use; never cached across view mutations.
    pub fn top_hoax_id(&self) -> i64 {
        self.page.content.first().map(|h| h.id).unwrap_or(0)
    }

    /// Id of the oldest hoax in the view, the cursor for "load older".
    pub fn bottom_hoax_id(&self) -> Option<i64> {
        self.page.content.last().map(|h| h.id)
    }

    pub fn display(&self) -> FeedDisplay {
        if self.loading_initial {
            FeedDisplay::InitialLoading
        } else if self.page.content.is_empty() && self.new_hoax_count == 0 {
            FeedDisplay::Empty
        } else {
            FeedDisplay::Hoaxes
        }
    }

    /// Replace the view with a freshly loaded first page.
    pub fn apply_initial(&mut self, page: Page<Hoax>) {
        self.page = page;
        self.list_state = ListState::default();
        if !self.page.content.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    /// Append an older page: its hoaxes go after the current content, its
    /// pagination metadata replaces the view's.
    pub fn append_older(&mut self, mut older: Page<Hoax>) {
        let mut content = std::mem::take(&mut self.page.content);
        content.append(&mut older.content);
        older.content = content;
        self.page = older;
    }

    /// Prepend newly fetched hoaxes, in the order received, ahead of all
    /// previously held content. Resets the new-hoax counter.
    pub fn prepend_newer(&mut self, newer: Vec<Hoax>) {
        let shift = newer.len();
        let mut content = newer;
        content.append(&mut self.page.content);
        self.page.content = content;
        self.new_hoax_count = 0;
        // Keep the selection on the same hoax
        if let Some(selected) = self.list_state.selected() {
            self.list_state.select(Some(selected + shift));
        }
    }

    /// Store a poll result, unless the view's head moved since the poll was
    /// issued. A stale count racing a concurrent "load newer" is dropped so
    /// it cannot repopulate a counter that was just reset.
    pub fn apply_new_count(&mut self, polled_top_id: i64, count: u64) {
        if self.top_hoax_id() == polled_top_id {
            self.new_hoax_count = count;
        } else {
            log::debug!(
                "Dropping stale new-hoax count {} polled at head {}",
                count,
                polled_top_id
            );
        }
    }

    /// Remove a hoax from the view after a confirmed delete.
    pub fn remove(&mut self, hoax_id: i64) {
        self.page.content.retain(|h| h.id != hoax_id);
        let len = self.page.content.len();
        if len == 0 {
            self.list_state.select(None);
        } else if let Some(selected) = self.list_state.selected() {
            if selected >= len {
                self.list_state.select(Some(len - 1));
            }
        }
    }

    pub fn selected_hoax(&self) -> Option<&Hoax> {
        self.list_state
            .selected()
            .and_then(|i| self.page.content.get(i))
    }

    pub fn select_next(&mut self) {
        let len = self.page.content.len();
        if len == 0 {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.page.content.is_empty() {
            return;
        }
        let prev = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(prev));
    }
}

/// Paginated directory of accounts, shown beside the feed.
///
/// Unlike the feed, the directory holds exactly one backend page at a time
/// and pages through them with the page index from the current metadata.
pub struct UserListState {
    pub page: Page<User>,
    pub loading: bool,
    pub load_error: bool,
    pub list_state: ListState,
}

impl UserListState {
    pub fn new() -> Self {
        Self {
            page: Page::default(),
            loading: false,
            load_error: false,
            list_state: ListState::default(),
        }
    }

    /// Replace the shown page. Any earlier load error is cleared; a failed
    /// load never reaches this, so the previous page stays visible on error.
    pub fn apply_page(&mut self, page: Page<User>) {
        self.page = page;
        self.load_error = false;
        self.list_state = ListState::default();
        if !self.page.content.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.list_state
            .selected()
            .and_then(|i| self.page.content.get(i))
    }

    /// Cycle the selection through the page, wrapping at the end.
    pub fn select_next(&mut self) {
        let len = self.page.content.len();
        if len == 0 {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.list_state.select(Some(next));
    }
}

/// Field-level errors of the composer form. A closed type so every possible
/// error slot is enumerable and rendered exhaustively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposerFieldErrors {
    pub content: Option<String>,
    pub attachment: Option<String>,
}

impl ComposerFieldErrors {
    pub fn from_validation(errors: &HashMap<String, String>) -> Self {
        Self {
            content: errors.get("content").cloned(),
            attachment: errors.get("attachment").cloned(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// State of the new-hoax composer.
pub struct ComposerState {
    pub focused: bool,
    pub textarea: TextArea<'static>,
    pub submitting: bool,
    pub errors: ComposerFieldErrors,
    /// Data-URL preview of the selected file, for local display only.
    pub preview_image: Option<String>,
    pub selected_file: Option<PathBuf>,
    /// Backend reference of the most recent completed upload.
    pub attachment: Option<Attachment>,
    pub file_input: String,
    pub file_input_active: bool,
}

impl ComposerState {
    pub fn new() -> Self {
        let mut textarea = TextArea::default();
        textarea.set_hard_tab_indent(true);
        Self {
            focused: false,
            textarea,
            submitting: false,
            errors: ComposerFieldErrors::default(),
            preview_image: None,
            selected_file: None,
            attachment: None,
            file_input: String::new(),
            file_input_active: false,
        }
    }

    pub fn content(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Back to the unfocused, empty, error-free, attachment-free baseline.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Field-level errors of the profile form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFieldErrors {
    pub display_name: Option<String>,
    pub image: Option<String>,
}

impl ProfileFieldErrors {
    pub fn from_validation(errors: &HashMap<String, String>) -> Self {
        Self {
            display_name: errors.get("displayName").cloned(),
            image: errors.get("image").cloned(),
        }
    }
}

/// A user's profile page: page-level load state plus the view/edit state
/// machine over the loaded profile.
pub struct ProfilePageState {
    /// Whose page is shown. `None` until a page is opened.
    pub username: Option<String>,
    pub user: Option<User>,
    pub loading: bool,
    pub error: bool,
    pub in_edit_mode: bool,
    /// Pre-edit display name, restored on cancel.
    pub original_display_name: Option<String>,
    pub pending_update: bool,
    /// Staged avatar as a data URL; sent with the prefix stripped.
    pub staged_image: Option<String>,
    pub errors: ProfileFieldErrors,
    pub file_input: String,
    pub file_input_active: bool,
}

impl ProfilePageState {
    pub fn new() -> Self {
        Self {
            username: None,
            user: None,
            loading: false,
            error: false,
            in_edit_mode: false,
            original_display_name: None,
            pending_update: false,
            staged_image: None,
            errors: ProfileFieldErrors::default(),
            file_input: String::new(),
            file_input_active: false,
        }
    }

    /// Enter edit mode, recording the rollback snapshot.
    pub fn edit(&mut self) {
        if let Some(user) = &self.user {
            self.original_display_name = Some(user.display_name.clone());
            self.in_edit_mode = true;
        }
    }

    pub fn change_display_name(&mut self, display_name: String) {
        if let Some(user) = &mut self.user {
            user.display_name = display_name;
        }
        self.errors.display_name = None;
    }

    pub fn select_file(&mut self, data_url: String) {
        self.staged_image = Some(data_url);
        self.errors.image = None;
    }

    /// Discard staged edits and exit to viewing.
    pub fn cancel(&mut self) {
        if let (Some(user), Some(original)) = (&mut self.user, self.original_display_name.take()) {
            user.display_name = original;
        }
        self.staged_image = None;
        self.errors = ProfileFieldErrors::default();
        self.in_edit_mode = false;
        self.file_input.clear();
        self.file_input_active = false;
    }

    /// Commit a successful save: new avatar reference, back to viewing.
    pub fn apply_update_success(&mut self, image: Option<String>) {
        if let Some(user) = &mut self.user {
            user.image = image;
        }
        self.in_edit_mode = false;
        self.pending_update = false;
        self.staged_image = None;
        self.original_display_name = None;
        self.errors = ProfileFieldErrors::default();
        self.file_input.clear();
        self.file_input_active = false;
    }

    /// A failed save stays in edit mode with the submitted input visible.
    pub fn apply_update_failure(&mut self, errors: ProfileFieldErrors) {
        self.errors = errors;
        self.pending_update = false;
    }
}

/// Field-level errors of the signup form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupFieldErrors {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SignupFieldErrors {
    pub fn from_validation(errors: &HashMap<String, String>) -> Self {
        Self {
            display_name: errors.get("displayName").cloned(),
            username: errors.get("username").cloned(),
            password: errors.get("password").cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthMode {
    Login,
    Signup,
}

/// Login/signup screen state.
pub struct AuthState {
    pub mode: AuthMode,
    /// Index of the focused form field.
    pub focus: usize,
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub password_repeat: String,
    pub pending: bool,
    pub login_error: Option<String>,
    pub signup_errors: SignupFieldErrors,
}

impl AuthState {
    pub fn new() -> Self {
        Self {
            mode: AuthMode::Login,
            focus: 0,
            username: String::new(),
            password: String::new(),
            display_name: String::new(),
            password_repeat: String::new(),
            pending: false,
            login_error: None,
            signup_errors: SignupFieldErrors::default(),
        }
    }

    pub fn field_count(&self) -> usize {
        match self.mode {
            AuthMode::Login => 2,
            AuthMode::Signup => 4,
        }
    }

    /// Mismatch message shown as soon as either password field is non-empty.
    pub fn password_repeat_error(&self) -> Option<&'static str> {
        if self.password.is_empty() && self.password_repeat.is_empty() {
            return None;
        }
        if self.password == self.password_repeat {
            None
        } else {
            Some("Does not match to password")
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        };
        self.focus = 0;
        self.login_error = None;
        self.signup_errors = SignupFieldErrors::default();
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub screen: Screen,
    pub tab: Tab,
    pub api: Arc<dyn HoaxifyApi>,
    pub session: Session,
    pub session_store: Option<SessionStore>,
    pub feed: FeedState,
    pub users: UserListState,
    pub poller: Option<Poller>,
    pub composer: ComposerState,
    pub profile: ProfilePageState,
    pub auth: AuthState,
    pub show_help: bool,
    pub log_config: crate::logging::LogConfig,
}
