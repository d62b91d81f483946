use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use hoaxify_types::{HoaxSubmitRequest, LoginRequest, SignupRequest, UserUpdateRequest};

use crate::api::{Credentials, HoaxifyApi};
use crate::poller::Poller;
use crate::session::{Session, SessionEvent, SessionStore};
use crate::{log_api_call, log_feed, log_modal_state};

pub mod state;
pub use state::*;
pub mod handlers;

#[cfg(test)]
mod tests;

/// Period of the "how many new hoaxes exist" poll.
pub const NEW_HOAX_POLL_PERIOD: Duration = Duration::from_secs(3);

/// Page size of the user directory panel.
pub const USERS_PAGE_SIZE: i32 = 3;

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// The backend expects the bare base64 body, without the data-URL prefix.
fn strip_data_url_prefix(data_url: &str) -> Option<String> {
    data_url.split_once(',').map(|(_, body)| body.to_string())
}

impl App {
    pub fn new(api: Arc<dyn HoaxifyApi>) -> Self {
        Self {
            running: true,
            screen: Screen::Auth,
            tab: Tab::Home,
            api,
            session: Session::default(),
            session_store: None,
            feed: FeedState::new(FeedScope::Global),
            users: UserListState::new(),
            poller: None,
            composer: ComposerState::new(),
            profile: ProfilePageState::new(),
            auth: AuthState::new(),
            show_help: false,
            log_config: crate::logging::LogConfig::default(),
        }
    }

    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Toggle help modal
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Synchronous key dispatch; see [`handlers::handle_key_event`].
    pub fn handle_key_event(&mut self, key: crossterm::event::KeyEvent) -> Result<()> {
        handlers::handle_key_event(self, key)
    }

    fn persist_session(&self) {
        if let Some(store) = &self.session_store {
            if let Err(e) = store.save(&self.session) {
                log::warn!("Failed to persist session: {}", e);
            }
        }
    }

    /// Restore a persisted session at startup, if one exists.
    pub fn restore_session(&mut self) -> bool {
        let Some(store) = &self.session_store else {
            return false;
        };
        match store.load() {
            Ok(Some(session)) => {
                self.api.set_credentials(Some(Credentials {
                    username: session.username.clone(),
                    password: session.password.clone(),
                }));
                self.session = session;
                self.screen = Screen::Main;
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!("Failed to load persisted session: {}", e);
                false
            }
        }
    }

    // ---- Feed controller ------------------------------------------------

    /// Load the first page for a scope, replacing the current view.
    /// Runs once per mount and again whenever the scope changes.
    pub async fn initialize_feed(&mut self, scope: FeedScope) -> Result<()> {
        self.feed = FeedState::new(scope.clone());
        self.feed.loading_initial = true;

        log_api_call!(self.log_config, "load hoaxes, scope={:?}", scope);
        match self.api.load_hoaxes(scope.username()).await {
            Ok(page) => {
                self.feed.apply_initial(page);
            }
            Err(e) => {
                log::warn!("Initial feed load failed: {}", e);
            }
        }
        self.feed.loading_initial = false;
        Ok(())
    }

    /// Start the new-hoax-count poll. Runs while the main screen is mounted.
    pub fn mount_poller(&mut self) {
        self.poller = Some(Poller::spawn(NEW_HOAX_POLL_PERIOD));
    }

    /// Cancel the poll. After this returns, no poll tick fires again.
    pub fn teardown_feed(&mut self) {
        if let Some(poller) = &mut self.poller {
            poller.cancel();
        }
        self.poller = None;
    }

    /// Consume a pending poll tick, if the poller is mounted and one fired.
    pub fn poll_tick(&mut self) -> bool {
        self.poller.as_mut().map(Poller::try_tick).unwrap_or(false)
    }

    /// One poll: ask how many hoaxes newer than the current head exist.
    /// May interleave with load/delete operations; it only touches the count.
    pub async fn check_new_hoax_count(&mut self) -> Result<()> {
        let top_id = self.feed.top_hoax_id();
        let scope = self.feed.scope.clone();

        log_api_call!(self.log_config, "count new hoaxes after id={}", top_id);
        match self.api.count_new_hoaxes(top_id, scope.username()).await {
            Ok(count) => {
                if self.feed.scope == scope {
                    self.feed.apply_new_count(top_id, count);
                }
            }
            Err(e) => {
                log::debug!("New-hoax count poll failed: {}", e);
            }
        }
        Ok(())
    }

    /// Fetch the page older than the view's tail and append it.
    /// Dropped (not queued) while another load-older call is outstanding.
    pub async fn load_older(&mut self) -> Result<()> {
        if self.feed.loading_older {
            return Ok(());
        }
        let Some(bottom_id) = self.feed.bottom_hoax_id() else {
            return Ok(());
        };
        self.feed.loading_older = true;

        let scope = self.feed.scope.clone();
        log_api_call!(self.log_config, "load hoaxes before id={}", bottom_id);
        match self.api.load_old_hoaxes(bottom_id, scope.username()).await {
            Ok(page) => {
                self.feed.append_older(page);
                log_feed!(
                    self.log_config,
                    "appended older page, view now holds {} hoaxes",
                    self.feed.page.content.len()
                );
            }
            Err(e) => {
                // View is left untouched; only the loading indicator goes away
                log::warn!("Load older failed: {}", e);
            }
        }
        self.feed.loading_older = false;
        Ok(())
    }

    /// Fetch hoaxes newer than the view's head and prepend them.
    /// Dropped while another load-newer call is outstanding.
    pub async fn load_newer(&mut self) -> Result<()> {
        if self.feed.loading_newer {
            return Ok(());
        }
        self.feed.loading_newer = true;

        let top_id = self.feed.top_hoax_id();
        let scope = self.feed.scope.clone();
        log_api_call!(self.log_config, "load hoaxes after id={}", top_id);
        match self.api.load_new_hoaxes(top_id, scope.username()).await {
            Ok(hoaxes) => {
                self.feed.prepend_newer(hoaxes);
                log_feed!(
                    self.log_config,
                    "prepended newer hoaxes, head is now {}",
                    self.feed.top_hoax_id()
                );
            }
            Err(e) => {
                log::warn!("Load newer failed: {}", e);
            }
        }
        self.feed.loading_newer = false;
        Ok(())
    }

    /// Stage a hoax for deletion; rendering shows the confirmation modal.
    pub fn request_delete(&mut self) {
        let own_id = self.session.id;
        let hoax = self
            .feed
            .selected_hoax()
            .filter(|h| h.user.id == own_id)
            .cloned();
        if let Some(hoax) = hoax {
            log_modal_state!(self.log_config, "delete modal opened for hoax {}", hoax.id);
            self.feed.pending_delete = Some(hoax);
        }
    }

    pub fn cancel_delete(&mut self) {
        log_modal_state!(self.log_config, "delete modal dismissed");
        self.feed.pending_delete = None;
    }

    /// Delete the staged hoax. On failure the modal stays open with its
    /// buttons re-enabled so the user can retry or cancel.
    pub async fn confirm_delete(&mut self) -> Result<()> {
        if self.feed.deleting {
            return Ok(());
        }
        let Some(hoax) = self.feed.pending_delete.clone() else {
            return Ok(());
        };
        self.feed.deleting = true;

        log_api_call!(self.log_config, "delete hoax id={}", hoax.id);
        match self.api.delete_hoax(hoax.id).await {
            Ok(()) => {
                self.feed.remove(hoax.id);
                self.feed.pending_delete = None;
            }
            Err(e) => {
                log::warn!("Delete failed: {}", e);
            }
        }
        self.feed.deleting = false;
        Ok(())
    }

    // ---- User directory ----------------------------------------------------

    /// Load one page of the user directory.
    /// A failed load keeps the previous page visible and flags the error;
    /// the flag clears on the next successful load.
    pub async fn load_users(&mut self, page_index: i32) -> Result<()> {
        if self.users.loading {
            return Ok(());
        }
        self.users.loading = true;

        log_api_call!(self.log_config, "list users page={}", page_index);
        match self.api.list_users(page_index, USERS_PAGE_SIZE).await {
            Ok(page) => {
                self.users.apply_page(page);
            }
            Err(e) => {
                log::warn!("User list load failed: {}", e);
                self.users.load_error = true;
            }
        }
        self.users.loading = false;
        Ok(())
    }

    /// Page the directory forward. No-op on the last page.
    pub async fn next_users_page(&mut self) -> Result<()> {
        if self.users.page.last {
            return Ok(());
        }
        let next = self.users.page.number + 1;
        self.load_users(next).await
    }

    /// Page the directory backward. No-op on the first page.
    pub async fn prev_users_page(&mut self) -> Result<()> {
        if self.users.page.first {
            return Ok(());
        }
        let prev = self.users.page.number - 1;
        self.load_users(prev).await
    }

    // ---- Post composer ---------------------------------------------------

    /// Read a local file, keep a data-URL preview, and upload it.
    /// Exactly one upload per selection; the stored attachment reference
    /// always reflects the most recent completed upload.
    pub async fn select_composer_file(&mut self, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.composer.errors.attachment = Some(format!("Cannot read file: {}", e));
                return Ok(());
            }
        };

        self.composer.preview_image = Some(to_data_url(guess_mime(path), &bytes));
        self.composer.selected_file = Some(path.to_path_buf());
        self.composer.errors.attachment = None;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();

        log_api_call!(self.log_config, "upload attachment {}", file_name);
        match self.api.upload_file(file_name, bytes).await {
            Ok(attachment) => {
                self.composer.attachment = Some(attachment);
            }
            Err(e) => {
                log::warn!("Attachment upload failed: {}", e);
                self.composer.errors.attachment = Some("Upload failed".to_string());
            }
        }
        Ok(())
    }

    /// Submit the composed hoax. Dropped while a submission is outstanding.
    pub async fn submit_hoax(&mut self) -> Result<()> {
        if self.composer.submitting {
            return Ok(());
        }
        self.composer.submitting = true;

        let body = HoaxSubmitRequest {
            content: self.composer.content(),
            attachment: self.composer.attachment.clone(),
        };

        log_api_call!(self.log_config, "post hoax ({} chars)", body.content.len());
        match self.api.post_hoax(body).await {
            Ok(_) => {
                self.composer.reset();
            }
            Err(e) => {
                if let Some(errors) = e.validation_errors() {
                    self.composer.errors = ComposerFieldErrors::from_validation(errors);
                } else {
                    log::warn!("Hoax submission failed: {}", e);
                }
                self.composer.submitting = false;
                // A failed submission always drops the local file state,
                // including the now-stale uploaded reference
                self.composer.selected_file = None;
                self.composer.preview_image = None;
                self.composer.attachment = None;
            }
        }
        Ok(())
    }

    /// Collapse the composer back to its baseline. Disabled while submitting.
    pub fn cancel_composer(&mut self) {
        if self.composer.submitting {
            return;
        }
        self.composer.reset();
    }

    // ---- Profile page ----------------------------------------------------

    /// Load a user's profile page and scope the feed to their timeline.
    pub async fn open_user_page(&mut self, username: String) -> Result<()> {
        self.profile = ProfilePageState::new();
        self.profile.username = Some(username.clone());
        self.profile.loading = true;

        log_api_call!(self.log_config, "get user {}", username);
        match self.api.get_user(&username).await {
            Ok(user) => {
                self.profile.user = Some(user);
            }
            Err(e) => {
                log::warn!("Profile load failed: {}", e);
                self.profile.error = true;
            }
        }
        self.profile.loading = false;

        self.initialize_feed(FeedScope::User(username)).await
    }

    /// Whether the logged-in viewer owns the displayed profile.
    pub fn viewing_own_profile(&self) -> bool {
        self.session.is_logged_in
            && self.profile.username.as_deref() == Some(self.session.username.as_str())
    }

    /// Enter profile edit mode; only the owner may edit.
    pub fn edit_profile(&mut self) {
        if self.viewing_own_profile() {
            self.profile.edit();
        }
    }

    /// Read a local file and stage it as the pending avatar preview.
    /// Nothing is uploaded until save.
    pub async fn stage_profile_image(&mut self, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                self.profile.select_file(to_data_url(guess_mime(path), &bytes));
            }
            Err(e) => {
                self.profile.errors.image = Some(format!("Cannot read file: {}", e));
            }
        }
        Ok(())
    }

    /// Save staged profile edits. On success the shared session picks up the
    /// new display name and avatar and is re-persisted.
    pub async fn save_profile(&mut self) -> Result<()> {
        if self.profile.pending_update {
            return Ok(());
        }
        let Some(user) = self.profile.user.clone() else {
            return Ok(());
        };
        self.profile.pending_update = true;

        let body = UserUpdateRequest {
            display_name: user.display_name.clone(),
            image: self
                .profile
                .staged_image
                .as_deref()
                .and_then(strip_data_url_prefix),
        };

        log_api_call!(self.log_config, "update user id={}", self.session.id);
        match self.api.update_user(self.session.id, body).await {
            Ok(updated) => {
                self.profile.apply_update_success(updated.image.clone());
                self.session = self.session.reduce(SessionEvent::ProfileUpdated {
                    display_name: updated.display_name,
                    image: updated.image,
                });
                self.persist_session();
            }
            Err(e) => {
                let errors = e
                    .validation_errors()
                    .map(ProfileFieldErrors::from_validation)
                    .unwrap_or_default();
                self.profile.apply_update_failure(errors);
            }
        }
        Ok(())
    }

    // ---- Auth ------------------------------------------------------------

    pub async fn login(&mut self) -> Result<()> {
        if self.auth.pending {
            return Ok(());
        }
        self.auth.pending = true;
        self.auth.login_error = None;

        let request = LoginRequest {
            username: self.auth.username.clone(),
            password: self.auth.password.clone(),
        };
        let password = request.password.clone();

        log_api_call!(self.log_config, "login as {}", request.username);
        match self.api.login(request).await {
            Ok(user) => {
                self.session = self.session.reduce(SessionEvent::LoginSuccess {
                    id: user.id,
                    username: user.username.clone(),
                    display_name: user.display_name,
                    image: user.image,
                    password: password.clone(),
                });
                self.api.set_credentials(Some(Credentials {
                    username: user.username,
                    password,
                }));
                self.persist_session();
                self.screen = Screen::Main;
                self.tab = Tab::Home;
                self.auth = AuthState::new();
            }
            Err(e) => {
                self.auth.login_error = Some(format!("Login failed: {}", e));
            }
        }
        self.auth.pending = false;
        Ok(())
    }

    pub async fn signup(&mut self) -> Result<()> {
        if self.auth.pending || self.auth.password_repeat_error().is_some() {
            return Ok(());
        }
        self.auth.pending = true;

        let request = SignupRequest {
            username: self.auth.username.clone(),
            display_name: self.auth.display_name.clone(),
            password: self.auth.password.clone(),
        };

        log_api_call!(self.log_config, "signup as {}", request.username);
        match self.api.signup(request).await {
            Ok(()) => {
                // Log the fresh account straight in
                self.auth.pending = false;
                return self.login().await;
            }
            Err(e) => {
                if let Some(errors) = e.validation_errors() {
                    self.auth.signup_errors = SignupFieldErrors::from_validation(errors);
                } else {
                    self.auth.login_error = Some(format!("Sign up failed: {}", e));
                }
            }
        }
        self.auth.pending = false;
        Ok(())
    }

    /// Tear down the session: credentials, durable record, feed, screens.
    pub fn logout(&mut self) {
        self.api.set_credentials(None);
        self.session = self.session.reduce(SessionEvent::LogoutSuccess);
        if let Some(store) = &self.session_store {
            if let Err(e) = store.delete() {
                log::warn!("Failed to delete session file: {}", e);
            }
        }
        self.teardown_feed();
        self.feed = FeedState::new(FeedScope::Global);
        self.users = UserListState::new();
        self.composer = ComposerState::new();
        self.profile = ProfilePageState::new();
        self.auth = AuthState::new();
        self.tab = Tab::Home;
        self.screen = Screen::Auth;
    }
}
