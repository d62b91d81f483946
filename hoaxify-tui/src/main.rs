mod api;
mod app;
mod config;
#[macro_use]
mod logging;
mod poller;
mod session;
mod terminal;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use api::ApiClient;
use app::{App, AuthMode, FeedScope, Screen, Tab};
use session::SessionStore;

/// Hoaxify - a terminal client for the Hoaxify social network
#[derive(Parser)]
#[command(name = "hoaxify")]
#[command(about = "A terminal client for the Hoaxify social network")]
#[command(version)]
struct Cli {
    /// Server URL to connect to
    #[arg(long, short, env = "HOAXIFY_SERVER_URL")]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

// Load environment variables from .env file
// This allows HOAXIFY_SERVER_URL and other config to be set without
// command-line args
fn load_env() {
    let _ = dotenv::dotenv();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_env();

    let log_config = if cli.verbose {
        logging::LogConfig::verbose()
    } else {
        logging::LogConfig::default()
    };
    logging::init_logging(&log_config)?;

    // Determine server URL based on CLI args, env vars, config file, and
    // the built-in default
    let config_manager = config::ConfigManager::new()?;
    let cli_override = cli.server.is_some();
    let server_url = config_manager.determine_server_url(cli.server)?;
    log::info!("Connecting to {}", server_url);

    // An explicit override becomes the saved config for later runs
    if cli_override {
        if let Err(e) = config_manager.remember_server_url(&server_url) {
            log::warn!("Failed to save server config: {}", e);
        }
    }

    let api = Arc::new(ApiClient::new(server_url));
    let session_store = SessionStore::new()?;

    let mut app = App::new(api).with_session_store(session_store);
    app.log_config = log_config;

    if app.restore_session() {
        log::info!("Restored session for {}", app.session.username);
    } else {
        log::info!("No valid session found, showing authentication screen");
    }

    let mut tui = terminal::init()?;
    let result = run(&mut app, &mut tui).await;
    terminal::restore()?;
    result
}

async fn run(app: &mut App, tui: &mut terminal::Tui) -> Result<()> {
    // The main screen's feed and poller are mounted on every Auth -> Main
    // transition; seeding last_screen with Auth covers the restored-session
    // startup path too.
    let mut last_screen = Screen::Auth;
    let mut last_tab = app.tab;

    while app.running {
        // Mount or tear down the feed when the screen changes
        if app.screen != last_screen {
            log_debug!(
                app.log_config,
                "screen transition {:?} -> {:?}",
                last_screen,
                app.screen
            );
            match app.screen {
                Screen::Main => {
                    app.initialize_feed(FeedScope::Global).await?;
                    app.load_users(0).await?;
                    app.mount_poller();
                }
                Screen::Auth => {
                    // Logout already tore the feed down
                }
            }
            last_screen = app.screen;
            last_tab = app.tab;
        }

        // Re-scope the feed when the tab changes
        if app.tab != last_tab {
            log_debug!(
                app.log_config,
                "tab transition {:?} -> {:?}",
                last_tab,
                app.tab
            );
            match app.tab {
                Tab::Home => {
                    app.initialize_feed(FeedScope::Global).await?;
                }
                Tab::Profile => {
                    let username = app.session.username.clone();
                    app.open_user_page(username).await?;
                }
            }
            last_tab = app.tab;
        }

        // Consume a pending poll tick
        if app.poll_tick() {
            app.check_new_hoax_count().await?;
        }

        tui.draw(|frame| ui::render(app, frame))?;

        // Handle events with timeout
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let event = event::read()?;

        // Keyboard-only navigation
        if matches!(event, Event::Mouse(_)) {
            continue;
        }

        let Event::Key(key) = event else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        log_key_event!(
            app.log_config,
            "key={:?}, screen={:?}, tab={:?}",
            key.code,
            app.screen,
            app.tab
        );

        // Async operations are matched here; everything else is handled by
        // the synchronous dispatcher.
        match key.code {
            KeyCode::Enter if app.screen == Screen::Auth && !app.auth.pending => {
                match app.auth.mode {
                    AuthMode::Login => app.login().await?,
                    AuthMode::Signup => app.signup().await?,
                }
            }
            KeyCode::Char('y') | KeyCode::Char('Y')
                if app.feed.pending_delete.is_some() && !app.feed.deleting =>
            {
                app.confirm_delete().await?;
            }
            KeyCode::Enter if app.composer.focused && app.composer.file_input_active => {
                let path = PathBuf::from(app.composer.file_input.trim());
                app.composer.file_input_active = false;
                app.composer.file_input.clear();
                app.select_composer_file(&path).await?;
            }
            KeyCode::Enter if app.composer.focused && !app.composer.submitting => {
                app.submit_hoax().await?;
            }
            KeyCode::Enter if app.profile.in_edit_mode && app.profile.file_input_active => {
                let path = PathBuf::from(app.profile.file_input.trim());
                app.profile.file_input_active = false;
                app.profile.file_input.clear();
                app.stage_profile_image(&path).await?;
            }
            KeyCode::Enter if app.profile.in_edit_mode && !app.profile.pending_update => {
                app.save_profile().await?;
            }
            KeyCode::Char('m') | KeyCode::Char('M')
                if main_feed_navigable(app) && !app.feed.page.last =>
            {
                app.load_older().await?;
            }
            KeyCode::Char('r') | KeyCode::Char('R')
                if main_feed_navigable(app) && app.feed.new_hoax_count > 0 =>
            {
                app.load_newer().await?;
            }
            KeyCode::Char('p') | KeyCode::Char('P')
                if main_feed_navigable(app) && app.tab == Tab::Home =>
            {
                if let Some(author) = app.feed.selected_hoax().map(|h| h.user.username.clone()) {
                    app.tab = Tab::Profile;
                    last_tab = app.tab;
                    app.open_user_page(author).await?;
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E')
                if main_feed_navigable(app) && app.tab == Tab::Profile =>
            {
                app.edit_profile();
            }
            KeyCode::Char('>') if main_feed_navigable(app) && app.tab == Tab::Home => {
                app.next_users_page().await?;
            }
            KeyCode::Char('<') if main_feed_navigable(app) && app.tab == Tab::Home => {
                app.prev_users_page().await?;
            }
            KeyCode::Char('o') | KeyCode::Char('O')
                if main_feed_navigable(app) && app.tab == Tab::Home =>
            {
                if let Some(username) = app.users.selected_user().map(|u| u.username.clone()) {
                    app.tab = Tab::Profile;
                    last_tab = app.tab;
                    app.open_user_page(username).await?;
                }
            }
            KeyCode::Char('L')
                if app.screen == Screen::Main
                    && key.modifiers.contains(KeyModifiers::SHIFT)
                    && !app.composer.focused
                    && !app.profile.in_edit_mode =>
            {
                app.logout();
            }
            _ => {
                app.handle_key_event(key)?;
            }
        }
    }

    Ok(())
}

/// Whether feed-level shortcuts apply: main screen with no modal or form
/// capturing input.
fn main_feed_navigable(app: &App) -> bool {
    app.screen == Screen::Main
        && !app.show_help
        && !app.composer.focused
        && app.feed.pending_delete.is_none()
        && !app.profile.in_edit_mode
}
