use super::*;
use crate::api::{ApiError, ApiResult, Credentials};
use async_trait::async_trait;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use hoaxify_types::*;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Helper to create a KeyEvent
fn key_event(code: KeyCode) -> KeyEvent {
    let mut event = KeyEvent::new(code, KeyModifiers::empty());
    event.kind = KeyEventKind::Press;
    event
}

fn user(id: i64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        display_name: format!("display-{}", username),
        image: None,
    }
}

fn hoax(id: i64) -> Hoax {
    Hoax {
        id,
        content: format!("hoax {}", id),
        date: Utc::now(),
        user: user(1, "user1"),
        attachment: None,
    }
}

fn page(ids: &[i64], last: bool) -> Page<Hoax> {
    Page {
        content: ids.iter().copied().map(hoax).collect(),
        first: true,
        last,
        size: 5,
        number: 0,
    }
}

fn user_page(ids: &[i64], first: bool, last: bool, number: i32) -> Page<User> {
    Page {
        content: ids
            .iter()
            .map(|&id| user(id, &format!("user{}", id)))
            .collect(),
        first,
        last,
        size: 3,
        number,
    }
}

/// Scriptable in-memory backend with per-operation call counters.
#[derive(Default)]
struct MockApi {
    credentials: Mutex<Option<Credentials>>,
    initial_page: Mutex<Page<Hoax>>,
    older_page: Mutex<Page<Hoax>>,
    newer_hoaxes: Mutex<Vec<Hoax>>,
    new_count: Mutex<u64>,
    profile_user: Mutex<Option<User>>,
    updated_user: Mutex<Option<User>>,
    users_page: Mutex<Page<User>>,
    last_users_page_param: Mutex<Option<i32>>,
    fail_list_users: AtomicBool,
    post_validation_errors: Mutex<Option<HashMap<String, String>>>,
    update_validation_errors: Mutex<Option<HashMap<String, String>>>,
    last_update_image: Mutex<Option<String>>,
    fail_delete: AtomicBool,
    fail_upload: AtomicBool,
    load_calls: AtomicUsize,
    load_old_calls: AtomicUsize,
    load_new_calls: AtomicUsize,
    count_calls: AtomicUsize,
    post_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    update_calls: AtomicUsize,
    signup_calls: AtomicUsize,
    list_users_calls: AtomicUsize,
}

#[async_trait]
impl HoaxifyApi for MockApi {
    fn set_credentials(&self, credentials: Option<Credentials>) {
        *self.credentials.lock().unwrap() = credentials;
    }

    async fn load_hoaxes(&self, _username: Option<&str>) -> ApiResult<Page<Hoax>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.initial_page.lock().unwrap().clone())
    }

    async fn load_old_hoaxes(
        &self,
        _hoax_id: i64,
        _username: Option<&str>,
    ) -> ApiResult<Page<Hoax>> {
        self.load_old_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.older_page.lock().unwrap().clone())
    }

    async fn load_new_hoaxes(&self, _hoax_id: i64, _username: Option<&str>) -> ApiResult<Vec<Hoax>> {
        self.load_new_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.newer_hoaxes.lock().unwrap().clone())
    }

    async fn count_new_hoaxes(&self, _hoax_id: i64, _username: Option<&str>) -> ApiResult<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.new_count.lock().unwrap())
    }

    async fn post_hoax(&self, body: HoaxSubmitRequest) -> ApiResult<Hoax> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(errors) = self.post_validation_errors.lock().unwrap().clone() {
            return Err(ApiError::Validation(errors));
        }
        Ok(Hoax {
            id: 100,
            content: body.content,
            date: Utc::now(),
            user: user(1, "user1"),
            attachment: body.attachment,
        })
    }

    async fn upload_file(&self, file_name: String, _bytes: Vec<u8>) -> ApiResult<Attachment> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(ApiError::Api("upload rejected".to_string()));
        }
        Ok(Attachment {
            id: 7,
            name: file_name,
            file_type: Some("image/png".to_string()),
        })
    }

    async fn delete_hoax(&self, _hoax_id: i64) -> ApiResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(ApiError::Api("delete rejected".to_string()));
        }
        Ok(())
    }

    async fn get_user(&self, username: &str) -> ApiResult<User> {
        match self.profile_user.lock().unwrap().clone() {
            Some(user) => Ok(user),
            None => Err(ApiError::NotFound(format!("{} not found", username))),
        }
    }

    async fn list_users(&self, page: i32, _size: i32) -> ApiResult<Page<User>> {
        self.list_users_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_users_page_param.lock().unwrap() = Some(page);
        if self.fail_list_users.load(Ordering::SeqCst) {
            return Err(ApiError::Api("listing rejected".to_string()));
        }
        Ok(self.users_page.lock().unwrap().clone())
    }

    async fn update_user(&self, _user_id: i64, body: UserUpdateRequest) -> ApiResult<User> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_update_image.lock().unwrap() = body.image.clone();
        if let Some(errors) = self.update_validation_errors.lock().unwrap().clone() {
            return Err(ApiError::Validation(errors));
        }
        Ok(self.updated_user.lock().unwrap().clone().unwrap_or(User {
            id: 1,
            username: "user1".to_string(),
            display_name: body.display_name,
            image: body.image,
        }))
    }

    async fn login(&self, body: LoginRequest) -> ApiResult<User> {
        if body.password == "P4ssword" {
            Ok(user(1, &body.username))
        } else {
            Err(ApiError::Unauthorized("Incorrect credentials".to_string()))
        }
    }

    async fn signup(&self, _body: SignupRequest) -> ApiResult<()> {
        self.signup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn mock_app() -> (Arc<MockApi>, App) {
    let mock = Arc::new(MockApi::default());
    let mut app = App::new(Arc::clone(&mock) as Arc<dyn HoaxifyApi>);
    app.log_config = crate::logging::LogConfig::disabled();
    (mock, app)
}

async fn logged_in_app(mock: &Arc<MockApi>, app: &mut App) {
    app.auth.username = "user1".to_string();
    app.auth.password = "P4ssword".to_string();
    app.login().await.unwrap();
    assert_eq!(app.screen, Screen::Main);
    assert!(mock.credentials.lock().unwrap().is_some());
}

// ---- Feed loading ----------------------------------------------------

#[tokio::test]
async fn initial_load_populates_feed_and_selects_head() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[9, 8, 7], false);

    app.initialize_feed(FeedScope::Global).await.unwrap();

    assert_eq!(app.feed.top_hoax_id(), 9);
    assert_eq!(app.feed.bottom_hoax_id(), Some(7));
    assert_eq!(app.feed.list_state.selected(), Some(0));
    assert_eq!(app.feed.display(), FeedDisplay::Hoaxes);
}

#[tokio::test]
async fn empty_initial_load_shows_empty_state() {
    let (_, mut app) = mock_app();

    app.initialize_feed(FeedScope::Global).await.unwrap();

    assert_eq!(app.feed.display(), FeedDisplay::Empty);
    assert_eq!(app.feed.top_hoax_id(), 0);
}

#[tokio::test]
async fn load_older_appends_content_and_takes_new_metadata() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[9, 8], false);
    app.initialize_feed(FeedScope::Global).await.unwrap();

    *mock.older_page.lock().unwrap() = page(&[7, 6], true);
    app.load_older().await.unwrap();

    let ids: Vec<i64> = app.feed.page.content.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![9, 8, 7, 6]);
    assert!(app.feed.page.last, "metadata must come from the new page");
    assert!(!app.feed.loading_older);
}

#[tokio::test]
async fn load_older_dropped_while_request_in_flight() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[9, 8], false);
    app.initialize_feed(FeedScope::Global).await.unwrap();

    app.feed.loading_older = true;
    app.load_older().await.unwrap();

    assert_eq!(mock.load_old_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn load_older_skipped_for_empty_view() {
    let (mock, mut app) = mock_app();

    app.load_older().await.unwrap();

    assert_eq!(mock.load_old_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn load_newer_prepends_in_order_and_resets_count() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[7, 6], false);
    app.initialize_feed(FeedScope::Global).await.unwrap();
    app.feed.new_hoax_count = 2;

    *mock.newer_hoaxes.lock().unwrap() = vec![hoax(9), hoax(8)];
    app.load_newer().await.unwrap();

    let ids: Vec<i64> = app.feed.page.content.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![9, 8, 7, 6]);
    assert_eq!(app.feed.new_hoax_count, 0);
    // Selection follows the previously selected hoax
    assert_eq!(app.feed.list_state.selected(), Some(2));
}

#[tokio::test]
async fn load_newer_dropped_while_request_in_flight() {
    let (mock, mut app) = mock_app();
    app.feed.loading_newer = true;

    app.load_newer().await.unwrap();

    assert_eq!(mock.load_new_calls.load(Ordering::SeqCst), 0);
}

// ---- New-hoax polling --------------------------------------------------

#[tokio::test]
async fn poll_stores_count_for_current_head() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[5], true);
    app.initialize_feed(FeedScope::Global).await.unwrap();

    *mock.new_count.lock().unwrap() = 3;
    app.check_new_hoax_count().await.unwrap();

    assert_eq!(app.feed.new_hoax_count, 3);
}

#[test]
fn stale_count_for_old_head_is_dropped() {
    let mut feed = FeedState::new(FeedScope::Global);
    feed.apply_initial(page(&[9, 8], true));

    // Poll was issued when the head was hoax 5; the view has moved on
    feed.apply_new_count(5, 4);

    assert_eq!(feed.new_hoax_count, 0);
}

#[test]
fn count_for_matching_head_is_stored() {
    let mut feed = FeedState::new(FeedScope::Global);
    feed.apply_initial(page(&[9, 8], true));

    feed.apply_new_count(9, 4);

    assert_eq!(feed.new_hoax_count, 4);
}

#[test]
fn head_id_is_zero_for_empty_view() {
    let feed = FeedState::new(FeedScope::Global);
    assert_eq!(feed.top_hoax_id(), 0);
}

#[tokio::test]
async fn no_tick_after_feed_teardown() {
    let (_, mut app) = mock_app();
    app.mount_poller();
    app.teardown_feed();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!app.poll_tick());
    assert!(app.poller.is_none());
}

// ---- Delete flow ---------------------------------------------------------

#[tokio::test]
async fn delete_success_removes_hoax_and_closes_modal() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[9, 8], true);
    logged_in_app(&mock, &mut app).await;
    app.initialize_feed(FeedScope::Global).await.unwrap();

    app.request_delete();
    assert_eq!(app.feed.pending_delete.as_ref().map(|h| h.id), Some(9));

    app.confirm_delete().await.unwrap();

    let ids: Vec<i64> = app.feed.page.content.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![8]);
    assert!(app.feed.pending_delete.is_none());
    assert!(!app.feed.deleting);
}

#[tokio::test]
async fn delete_failure_keeps_modal_open_for_retry() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[9], true);
    logged_in_app(&mock, &mut app).await;
    app.initialize_feed(FeedScope::Global).await.unwrap();
    mock.fail_delete.store(true, Ordering::SeqCst);

    app.request_delete();
    app.confirm_delete().await.unwrap();

    assert_eq!(app.feed.page.content.len(), 1, "nothing removed on failure");
    assert!(app.feed.pending_delete.is_some(), "modal stays open");
    assert!(!app.feed.deleting, "buttons re-enabled");

    // Retry succeeds
    mock.fail_delete.store(false, Ordering::SeqCst);
    app.confirm_delete().await.unwrap();
    assert!(app.feed.pending_delete.is_none());
    assert_eq!(mock.delete_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn confirm_without_staged_hoax_is_a_noop() {
    let (mock, mut app) = mock_app();

    app.confirm_delete().await.unwrap();

    assert_eq!(mock.delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delete_only_offered_for_own_hoaxes() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[9], true);
    app.initialize_feed(FeedScope::Global).await.unwrap();

    // Anonymous session, hoax owned by user id 1
    app.request_delete();

    assert!(app.feed.pending_delete.is_none());
}

#[tokio::test]
async fn modal_ignores_keys_while_deleting() {
    let (mock, mut app) = mock_app();
    *mock.initial_page.lock().unwrap() = page(&[9], true);
    logged_in_app(&mock, &mut app).await;
    app.initialize_feed(FeedScope::Global).await.unwrap();

    app.request_delete();
    app.feed.deleting = true;

    app.handle_key_event(key_event(KeyCode::Esc)).unwrap();
    assert!(app.feed.pending_delete.is_some(), "cannot cancel mid-flight");
}

// ---- Composer ---------------------------------------------------------

#[tokio::test]
async fn submit_success_resets_composer() {
    let (mock, mut app) = mock_app();
    app.composer.focus();
    app.composer.textarea.insert_str("hello world");

    app.submit_hoax().await.unwrap();

    assert_eq!(mock.post_calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.composer.content(), "");
    assert!(!app.composer.focused);
    assert!(!app.composer.submitting);
}

#[tokio::test]
async fn submit_validation_failure_keeps_content_and_maps_errors() {
    let (mock, mut app) = mock_app();
    *mock.post_validation_errors.lock().unwrap() = Some(HashMap::from([(
        "content".to_string(),
        "It must have minimum 10 and maximum 5000 characters".to_string(),
    )]));
    app.composer.focus();
    app.composer.textarea.insert_str("short");

    app.submit_hoax().await.unwrap();

    assert_eq!(app.composer.content(), "short", "typed content survives");
    assert_eq!(
        app.composer.errors.content.as_deref(),
        Some("It must have minimum 10 and maximum 5000 characters")
    );
    assert!(!app.composer.submitting);
}

#[tokio::test]
async fn submit_failure_discards_stale_attachment() {
    let (mock, mut app) = mock_app();
    *mock.post_validation_errors.lock().unwrap() =
        Some(HashMap::from([("content".to_string(), "too short".to_string())]));
    app.composer.focus();
    app.composer.textarea.insert_str("short");
    app.composer.attachment = Some(Attachment {
        id: 7,
        name: "pic.png".to_string(),
        file_type: Some("image/png".to_string()),
    });
    app.composer.preview_image = Some("data:image/png;base64,AAAA".to_string());
    app.composer.selected_file = Some(std::path::PathBuf::from("pic.png"));

    app.submit_hoax().await.unwrap();

    assert!(app.composer.attachment.is_none());
    assert!(app.composer.preview_image.is_none());
    assert!(app.composer.selected_file.is_none());
}

#[tokio::test]
async fn submit_dropped_while_request_in_flight() {
    let (mock, mut app) = mock_app();
    app.composer.focus();
    app.composer.submitting = true;

    app.submit_hoax().await.unwrap();

    assert_eq!(mock.post_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn selecting_file_uploads_exactly_once() {
    let (mock, mut app) = mock_app();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("pic.png");
    std::fs::write(&path, b"\x89PNG fake bytes").unwrap();

    app.select_composer_file(&path).await.unwrap();

    assert_eq!(mock.upload_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        app.composer.attachment.as_ref().map(|a| a.name.as_str()),
        Some("pic.png")
    );
    assert!(app
        .composer
        .preview_image
        .as_deref()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn upload_failure_surfaces_attachment_error() {
    let (mock, mut app) = mock_app();
    mock.fail_upload.store(true, Ordering::SeqCst);
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("pic.png");
    std::fs::write(&path, b"bytes").unwrap();

    app.select_composer_file(&path).await.unwrap();

    assert!(app.composer.attachment.is_none());
    assert!(app.composer.errors.attachment.is_some());
}

#[tokio::test]
async fn unreadable_file_reports_error_without_upload() {
    let (mock, mut app) = mock_app();

    app.select_composer_file(std::path::Path::new("/no/such/file.png"))
        .await
        .unwrap();

    assert_eq!(mock.upload_calls.load(Ordering::SeqCst), 0);
    assert!(app.composer.errors.attachment.is_some());
}

#[tokio::test]
async fn empty_file_selection_is_a_noop() {
    let (mock, mut app) = mock_app();

    app.select_composer_file(std::path::Path::new("")).await.unwrap();

    assert_eq!(mock.upload_calls.load(Ordering::SeqCst), 0);
    assert!(app.composer.errors.attachment.is_none());
}

#[test]
fn cancel_disabled_while_submitting() {
    let (_, mut app) = mock_app();
    app.composer.focus();
    app.composer.textarea.insert_str("in flight");
    app.composer.submitting = true;

    app.cancel_composer();

    assert!(app.composer.focused);
    assert_eq!(app.composer.content(), "in flight");
}

#[test]
fn typing_clears_content_error() {
    let (_, mut app) = mock_app();
    app.screen = Screen::Main;
    app.composer.focus();
    app.composer.errors.content = Some("too short".to_string());

    app.handle_key_event(key_event(KeyCode::Char('a'))).unwrap();

    assert!(app.composer.errors.content.is_none());
}

// ---- User directory ------------------------------------------------------

#[tokio::test]
async fn directory_loads_first_page_of_users() {
    let (mock, mut app) = mock_app();
    *mock.users_page.lock().unwrap() = user_page(&[1, 2, 3], true, false, 0);

    app.load_users(0).await.unwrap();

    assert_eq!(app.users.page.content.len(), 3);
    assert_eq!(*mock.last_users_page_param.lock().unwrap(), Some(0));
    assert_eq!(app.users.list_state.selected(), Some(0));
    assert!(!app.users.load_error);
}

#[tokio::test]
async fn directory_pages_forward_from_current_metadata() {
    let (mock, mut app) = mock_app();
    *mock.users_page.lock().unwrap() = user_page(&[1, 2, 3], true, false, 0);
    app.load_users(0).await.unwrap();

    *mock.users_page.lock().unwrap() = user_page(&[4, 5], false, true, 1);
    app.next_users_page().await.unwrap();

    assert_eq!(*mock.last_users_page_param.lock().unwrap(), Some(1));
    assert_eq!(app.users.page.number, 1);

    *mock.users_page.lock().unwrap() = user_page(&[1, 2, 3], true, false, 0);
    app.prev_users_page().await.unwrap();

    assert_eq!(*mock.last_users_page_param.lock().unwrap(), Some(0));
    assert_eq!(app.users.page.number, 0);
}

#[tokio::test]
async fn directory_paging_stops_at_page_bounds() {
    let (mock, mut app) = mock_app();
    *mock.users_page.lock().unwrap() = user_page(&[1, 2], true, true, 0);
    app.load_users(0).await.unwrap();

    // Single page: neither direction issues a request
    app.next_users_page().await.unwrap();
    app.prev_users_page().await.unwrap();

    assert_eq!(mock.list_users_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn directory_load_failure_keeps_page_and_flags_error() {
    let (mock, mut app) = mock_app();
    *mock.users_page.lock().unwrap() = user_page(&[1, 2], false, false, 1);
    app.load_users(1).await.unwrap();

    mock.fail_list_users.store(true, Ordering::SeqCst);
    app.next_users_page().await.unwrap();

    assert!(app.users.load_error);
    assert_eq!(app.users.page.content.len(), 2, "previous page stays visible");
    assert!(!app.users.loading);

    // The flag clears once a load succeeds again
    mock.fail_list_users.store(false, Ordering::SeqCst);
    app.prev_users_page().await.unwrap();
    assert!(!app.users.load_error);
}

#[tokio::test]
async fn directory_load_dropped_while_request_in_flight() {
    let (mock, mut app) = mock_app();
    app.users.loading = true;

    app.load_users(0).await.unwrap();

    assert_eq!(mock.list_users_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn directory_selection_wraps_around() {
    let (_, mut app) = mock_app();
    app.users.apply_page(user_page(&[1, 2], true, true, 0));
    app.screen = Screen::Main;

    app.handle_key_event(key_event(KeyCode::Char('u'))).unwrap();
    assert_eq!(app.users.list_state.selected(), Some(1));
    app.handle_key_event(key_event(KeyCode::Char('u'))).unwrap();
    assert_eq!(app.users.list_state.selected(), Some(0));
}

// ---- Profile page ------------------------------------------------------

#[tokio::test]
async fn profile_load_failure_sets_error_flag() {
    let (_, mut app) = mock_app();

    app.open_user_page("ghost".to_string()).await.unwrap();

    assert!(app.profile.error);
    assert!(app.profile.user.is_none());
}

#[tokio::test]
async fn edit_is_owner_only() {
    let (mock, mut app) = mock_app();
    *mock.profile_user.lock().unwrap() = Some(user(2, "someone-else"));
    logged_in_app(&mock, &mut app).await;

    app.open_user_page("someone-else".to_string()).await.unwrap();
    app.edit_profile();

    assert!(!app.profile.in_edit_mode);
}

#[tokio::test]
async fn cancel_restores_pre_edit_display_name() {
    let (mock, mut app) = mock_app();
    *mock.profile_user.lock().unwrap() = Some(user(1, "user1"));
    logged_in_app(&mock, &mut app).await;
    app.open_user_page("user1".to_string()).await.unwrap();

    app.edit_profile();
    assert!(app.profile.in_edit_mode);
    app.profile.change_display_name("renamed".to_string());
    app.profile.select_file("data:image/png;base64,AAAA".to_string());
    app.profile.cancel();

    assert!(!app.profile.in_edit_mode);
    assert_eq!(
        app.profile.user.as_ref().unwrap().display_name,
        "display-user1"
    );
    assert!(app.profile.staged_image.is_none());
}

#[tokio::test]
async fn save_success_updates_session_and_exits_edit_mode() {
    let (mock, mut app) = mock_app();
    *mock.profile_user.lock().unwrap() = Some(user(1, "user1"));
    logged_in_app(&mock, &mut app).await;
    app.open_user_page("user1".to_string()).await.unwrap();

    app.edit_profile();
    app.profile.change_display_name("renamed".to_string());
    app.profile.select_file("data:image/png;base64,QUJD".to_string());
    app.save_profile().await.unwrap();

    assert!(!app.profile.in_edit_mode);
    assert_eq!(app.session.display_name, "renamed");
    assert!(app.profile.staged_image.is_none());
}

#[tokio::test]
async fn save_failure_stays_in_edit_mode_with_submitted_input() {
    let (mock, mut app) = mock_app();
    *mock.profile_user.lock().unwrap() = Some(user(1, "user1"));
    *mock.update_validation_errors.lock().unwrap() = Some(HashMap::from([(
        "displayName".to_string(),
        "It must have minimum 4 and maximum 255 characters".to_string(),
    )]));
    logged_in_app(&mock, &mut app).await;
    app.open_user_page("user1".to_string()).await.unwrap();

    app.edit_profile();
    app.profile.change_display_name("a".to_string());
    app.save_profile().await.unwrap();

    assert!(app.profile.in_edit_mode, "stays editing on failure");
    assert_eq!(app.profile.user.as_ref().unwrap().display_name, "a");
    assert_eq!(
        app.profile.errors.display_name.as_deref(),
        Some("It must have minimum 4 and maximum 255 characters")
    );
    assert!(!app.profile.pending_update);
}

#[tokio::test]
async fn save_strips_data_url_prefix_from_staged_image() {
    let (mock, mut app) = mock_app();
    *mock.profile_user.lock().unwrap() = Some(user(1, "user1"));
    *mock.updated_user.lock().unwrap() = Some(User {
        id: 1,
        username: "user1".to_string(),
        display_name: "display-user1".to_string(),
        image: Some("stored-image.png".to_string()),
    });
    logged_in_app(&mock, &mut app).await;
    app.open_user_page("user1".to_string()).await.unwrap();

    app.edit_profile();
    app.profile.select_file("data:image/png;base64,QUJD".to_string());
    app.save_profile().await.unwrap();

    assert_eq!(mock.update_calls.load(Ordering::SeqCst), 1);
    // The backend receives the bare base64 body, not the data URL
    assert_eq!(
        mock.last_update_image.lock().unwrap().as_deref(),
        Some("QUJD")
    );
    assert_eq!(
        app.profile.user.as_ref().unwrap().image.as_deref(),
        Some("stored-image.png")
    );
    assert_eq!(app.session.image, "stored-image.png");
}

// ---- Auth ----------------------------------------------------------------

#[tokio::test]
async fn login_failure_shows_error_and_stays_on_auth() {
    let (_, mut app) = mock_app();
    app.auth.username = "user1".to_string();
    app.auth.password = "wrong".to_string();

    app.login().await.unwrap();

    assert_eq!(app.screen, Screen::Auth);
    assert!(app.auth.login_error.is_some());
    assert!(!app.session.is_logged_in);
}

#[tokio::test]
async fn signup_blocked_on_password_mismatch() {
    let (mock, mut app) = mock_app();
    app.auth.mode = AuthMode::Signup;
    app.auth.password = "P4ssword".to_string();
    app.auth.password_repeat = "P4ssword2".to_string();

    app.signup().await.unwrap();

    assert_eq!(mock.signup_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        app.auth.password_repeat_error(),
        Some("Does not match to password")
    );
}

#[tokio::test]
async fn signup_success_logs_the_account_in() {
    let (mock, mut app) = mock_app();
    app.auth.mode = AuthMode::Signup;
    app.auth.username = "user1".to_string();
    app.auth.display_name = "display1".to_string();
    app.auth.password = "P4ssword".to_string();
    app.auth.password_repeat = "P4ssword".to_string();

    app.signup().await.unwrap();

    assert_eq!(mock.signup_calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.screen, Screen::Main);
    assert!(app.session.is_logged_in);
}

#[tokio::test]
async fn logout_resets_session_and_clears_credentials() {
    let (mock, mut app) = mock_app();
    logged_in_app(&mock, &mut app).await;
    app.mount_poller();

    app.logout();

    assert_eq!(app.screen, Screen::Auth);
    assert!(!app.session.is_logged_in);
    assert!(mock.credentials.lock().unwrap().is_none());
    assert!(app.poller.is_none());
}

// ---- Key dispatch ----------------------------------------------------

#[test]
fn escape_closes_help_modal_first() {
    let (_, mut app) = mock_app();
    app.screen = Screen::Main;
    app.show_help = true;

    app.handle_key_event(key_event(KeyCode::Esc)).unwrap();

    assert!(!app.show_help, "Help modal should be closed");
    assert!(app.running, "App should still be running");
}

#[test]
fn escape_cancels_delete_modal() {
    let (_, mut app) = mock_app();
    app.screen = Screen::Main;
    app.feed.pending_delete = Some(hoax(9));

    app.handle_key_event(key_event(KeyCode::Esc)).unwrap();

    assert!(app.feed.pending_delete.is_none());
    assert!(app.running);
}

#[test]
fn escape_closes_composer() {
    let (_, mut app) = mock_app();
    app.screen = Screen::Main;
    app.composer.focus();
    app.composer.textarea.insert_str("draft");

    app.handle_key_event(key_event(KeyCode::Esc)).unwrap();

    assert!(!app.composer.focused);
    assert_eq!(app.composer.content(), "");
}

#[test]
fn q_quits_only_from_navigation() {
    let (_, mut app) = mock_app();
    app.screen = Screen::Main;
    app.composer.focus();

    app.handle_key_event(key_event(KeyCode::Char('q'))).unwrap();
    assert!(app.running, "typing 'q' in the composer must not quit");

    app.cancel_composer();
    app.handle_key_event(key_event(KeyCode::Char('q'))).unwrap();
    assert!(!app.running);
}

#[test]
fn typing_in_signup_clears_field_error() {
    let (_, mut app) = mock_app();
    app.auth.mode = AuthMode::Signup;
    app.auth.focus = 1; // username
    app.auth.signup_errors.username = Some("This name is in use".to_string());

    app.handle_key_event(key_event(KeyCode::Char('u'))).unwrap();

    assert!(app.auth.signup_errors.username.is_none());
    assert_eq!(app.auth.username, "u");
}

// ---- Display strings -------------------------------------------------------

#[test]
fn feed_messages_use_exact_copy() {
    assert_eq!(EMPTY_FEED_MESSAGE, "There are no hoaxes");
    assert_eq!(LOAD_MORE_LABEL, "Load More");
    assert_eq!(USER_NOT_FOUND_MESSAGE, "User not found");
    assert_eq!(USER_LOAD_ERROR_MESSAGE, "Load Error");
    assert_eq!(USERS_NEXT_LABEL, "next >");
    assert_eq!(USERS_PREV_LABEL, "< prev");
    assert_eq!(new_hoax_message(1), "There is 1 new hoax");
    assert_eq!(new_hoax_message(2), "There are 2 new hoaxes");
}

#[test]
fn delete_prompt_quotes_the_content() {
    let mut h = hoax(9);
    h.content = "hoax content".to_string();
    assert_eq!(delete_prompt(&h), "Are you sure to delete \"hoax content\"?");
}

proptest! {
    #[test]
    fn new_hoax_message_pluralizes(count in 2u64..10_000) {
        prop_assert_eq!(
            new_hoax_message(count),
            format!("There are {} new hoaxes", count)
        );
    }
}
