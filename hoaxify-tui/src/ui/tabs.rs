use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use hoaxify_types::Hoax;

use super::formatting::{format_timestamp, truncate};
use super::modals::{render_composer_modal, render_delete_confirmation_modal, render_help_modal};
use super::theme::{get_theme_colors, ThemeColors};
use crate::app::{
    new_hoax_message, App, AuthMode, FeedDisplay, Tab, EMPTY_FEED_MESSAGE, LOAD_MORE_LABEL,
    USERS_NEXT_LABEL, USERS_PREV_LABEL, USER_LOAD_ERROR_MESSAGE, USER_NOT_FOUND_MESSAGE,
};

pub fn render_auth_screen(frame: &mut Frame, app: &mut App) {
    let theme = get_theme_colors();
    let area = frame.area();

    let form_area = super::modals::centered_rect(50, 70, area);

    let title = match app.auth.mode {
        AuthMode::Login => " Login ",
        AuthMode::Signup => " Sign Up ",
    };

    let block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));
    let inner = block.inner(form_area);
    frame.render_widget(block, form_area);

    let mut lines = vec![Line::from("")];

    let fields: Vec<(&str, String, Option<String>)> = match app.auth.mode {
        AuthMode::Login => vec![
            ("Username", app.auth.username.clone(), None),
            ("Password", mask(&app.auth.password), None),
        ],
        AuthMode::Signup => vec![
            (
                "Display Name",
                app.auth.display_name.clone(),
                app.auth.signup_errors.display_name.clone(),
            ),
            (
                "Username",
                app.auth.username.clone(),
                app.auth.signup_errors.username.clone(),
            ),
            (
                "Password",
                mask(&app.auth.password),
                app.auth.signup_errors.password.clone(),
            ),
            (
                "Password Repeat",
                mask(&app.auth.password_repeat),
                app.auth.password_repeat_error().map(str::to_string),
            ),
        ],
    };

    for (i, (label, value, error)) in fields.iter().enumerate() {
        let focused = app.auth.focus == i;
        let marker = if focused { "> " } else { "  " };
        let label_style = if focused {
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_dim)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{}{:<16}", marker, label), label_style),
            Span::styled(value.clone(), Style::default().fg(theme.text)),
        ]));
        if let Some(error) = error {
            lines.push(Line::from(Span::styled(
                format!("    {}", error),
                Style::default().fg(theme.error),
            )));
        }
        lines.push(Line::from(""));
    }

    if app.auth.pending {
        lines.push(Line::from(Span::styled(
            "Loading...",
            Style::default().fg(theme.warning),
        )));
    } else if let Some(error) = &app.auth.login_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.error),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab: Next field | Enter: Submit | Ctrl+T: Switch login/signup",
        Style::default().fg(theme.text_dim),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_main_screen(frame: &mut Frame, app: &mut App) {
    let theme = get_theme_colors();
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with tabs
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(frame, app, &theme, chunks[0]);

    match app.tab {
        Tab::Home => {
            // Feed beside the user directory, as on the home page
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(chunks[1]);
            render_feed(frame, app, &theme, columns[0]);
            render_users_panel(frame, app, &theme, columns[1]);
        }
        Tab::Profile => render_profile_tab(frame, app, &theme, chunks[1]),
    }

    render_footer(frame, app, &theme, chunks[2]);

    // Modals, in priority order
    if app.composer.focused {
        render_composer_modal(frame, app, area);
    }
    if app.feed.pending_delete.is_some() {
        render_delete_confirmation_modal(frame, app, area);
    }
    if app.show_help {
        render_help_modal(frame, area);
    }
}

fn render_header(frame: &mut Frame, app: &App, theme: &ThemeColors, area: Rect) {
    let tab_style = |tab: Tab| {
        if app.tab == tab {
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_dim)
        }
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" Hoaxify ", Style::default().fg(theme.accent)),
        Span::raw("  "),
        Span::styled("[ Home ]", tab_style(Tab::Home)),
        Span::raw(" "),
        Span::styled("[ My Profile ]", tab_style(Tab::Profile)),
        Span::raw("   "),
        Span::styled(
            format!("@{}", app.session.username),
            Style::default().fg(theme.text),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut Frame, app: &App, theme: &ThemeColors, area: Rect) {
    let shortcuts = match app.tab {
        Tab::Home => "j/k: Move | n: New hoax | x: Delete | m: Load more | r: Refresh | p: Author profile | u/o: Users | Tab: Switch | ?: Help | q: Quit",
        Tab::Profile => "j/k: Move | e: Edit profile | x: Delete | m: Load more | Tab: Switch | ?: Help | q: Quit",
    };
    let footer = Paragraph::new(Span::styled(
        shortcuts,
        Style::default().fg(theme.text_dim),
    ));
    frame.render_widget(footer, area);
}

fn render_feed(frame: &mut Frame, app: &mut App, theme: &ThemeColors, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // New-hoax banner
            Constraint::Min(0),    // Hoax list
            Constraint::Length(1), // Load More
        ])
        .split(area);

    // Banner: counts of hoaxes newer than the view's head
    if app.feed.loading_newer {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Loading...",
                Style::default().fg(theme.warning),
            ))
            .alignment(Alignment::Center),
            chunks[0],
        );
    } else if app.feed.new_hoax_count > 0 {
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{} (r)", new_hoax_message(app.feed.new_hoax_count)),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            chunks[0],
        );
    }

    match app.feed.display() {
        FeedDisplay::InitialLoading => {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "Loading...",
                    Style::default().fg(theme.warning),
                ))
                .alignment(Alignment::Center),
                chunks[1],
            );
        }
        FeedDisplay::Empty => {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    EMPTY_FEED_MESSAGE,
                    Style::default().fg(theme.text_dim),
                ))
                .alignment(Alignment::Center),
                chunks[1],
            );
        }
        FeedDisplay::Hoaxes => {
            let width = chunks[1].width as usize;
            let items: Vec<ListItem> = app
                .feed
                .page
                .content
                .iter()
                .map(|hoax| hoax_list_item(hoax, width, theme))
                .collect();

            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(theme.border)),
                )
                .highlight_style(Style::default().bg(theme.highlight_bg));
            frame.render_stateful_widget(list, chunks[1], &mut app.feed.list_state);
        }
    }

    // Load More: only while older pages remain
    if app.feed.loading_older {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Loading...",
                Style::default().fg(theme.warning),
            ))
            .alignment(Alignment::Center),
            chunks[2],
        );
    } else if !app.feed.page.last && !app.feed.page.content.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{} (m)", LOAD_MORE_LABEL),
                Style::default().fg(theme.primary),
            ))
            .alignment(Alignment::Center),
            chunks[2],
        );
    }
}

fn hoax_list_item<'a>(hoax: &Hoax, width: usize, theme: &ThemeColors) -> ListItem<'a> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                hoax.user.display_name.clone(),
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" @{}", hoax.user.username),
                Style::default().fg(theme.text_dim),
            ),
            Span::styled(
                format!("  {}", format_timestamp(&hoax.date)),
                Style::default().fg(theme.text_dim),
            ),
        ]),
        Line::from(Span::styled(
            truncate(&hoax.content, width.saturating_sub(4)),
            Style::default().fg(theme.text),
        )),
    ];

    if let Some(attachment) = &hoax.attachment {
        let marker = if attachment.is_image() {
            format!("[image: {}]", attachment.name)
        } else {
            format!("[file: {}]", attachment.name)
        };
        lines.push(Line::from(Span::styled(
            marker,
            Style::default().fg(theme.accent),
        )));
    }

    lines.push(Line::from(""));
    ListItem::new(lines)
}

fn render_users_panel(frame: &mut Frame, app: &mut App, theme: &ThemeColors, area: Rect) {
    let block = Block::default()
        .title(" Users ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Directory page
            Constraint::Length(1), // Pager
            Constraint::Length(1), // Load error
        ])
        .split(inner);

    if app.users.loading {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Loading...",
                Style::default().fg(theme.warning),
            )),
            chunks[0],
        );
    } else {
        let items: Vec<ListItem> = app
            .users
            .page
            .content
            .iter()
            .map(|user| {
                ListItem::new(Line::from(Span::styled(
                    format!("{}@{}", user.display_name, user.username),
                    Style::default().fg(theme.text),
                )))
            })
            .collect();
        let list = List::new(items).highlight_style(Style::default().bg(theme.highlight_bg));
        frame.render_stateful_widget(list, chunks[0], &mut app.users.list_state);
    }

    let mut pager = vec![];
    if !app.users.page.first {
        pager.push(Span::styled(
            format!("{} (<)", USERS_PREV_LABEL),
            Style::default().fg(theme.primary),
        ));
        pager.push(Span::raw("  "));
    }
    if !app.users.page.last {
        pager.push(Span::styled(
            format!("{} (>)", USERS_NEXT_LABEL),
            Style::default().fg(theme.primary),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(pager)), chunks[1]);

    if app.users.load_error {
        frame.render_widget(
            Paragraph::new(Span::styled(
                USER_LOAD_ERROR_MESSAGE,
                Style::default().fg(theme.error),
            ))
            .alignment(Alignment::Center),
            chunks[2],
        );
    }
}

fn render_profile_tab(frame: &mut Frame, app: &mut App, theme: &ThemeColors, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Profile card
            Constraint::Min(0),    // User's hoaxes
        ])
        .split(area);

    render_profile_card(frame, app, theme, chunks[0]);
    render_feed(frame, app, theme, chunks[1]);
}

fn render_profile_card(frame: &mut Frame, app: &App, theme: &ThemeColors, area: Rect) {
    let block = Block::default()
        .title(" Profile ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![];

    if app.profile.loading {
        lines.push(Line::from(Span::styled(
            "Loading...",
            Style::default().fg(theme.warning),
        )));
    } else if app.profile.error {
        lines.push(Line::from(Span::styled(
            USER_NOT_FOUND_MESSAGE,
            Style::default().fg(theme.error),
        )));
    } else if let Some(user) = &app.profile.user {
        if app.profile.in_edit_mode {
            lines.push(Line::from(vec![
                Span::styled("Display Name: ", Style::default().fg(theme.text_dim)),
                Span::styled(
                    user.display_name.clone(),
                    Style::default()
                        .fg(theme.primary)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            if let Some(error) = &app.profile.errors.display_name {
                lines.push(Line::from(Span::styled(
                    format!("  {}", error),
                    Style::default().fg(theme.error),
                )));
            }

            if app.profile.file_input_active {
                lines.push(Line::from(vec![
                    Span::styled("Image file: ", Style::default().fg(theme.text_dim)),
                    Span::styled(
                        app.profile.file_input.clone(),
                        Style::default().fg(theme.text),
                    ),
                ]));
            } else if app.profile.staged_image.is_some() {
                lines.push(Line::from(Span::styled(
                    "[new image staged]",
                    Style::default().fg(theme.accent),
                )));
            }
            if let Some(error) = &app.profile.errors.image {
                lines.push(Line::from(Span::styled(
                    format!("  {}", error),
                    Style::default().fg(theme.error),
                )));
            }

            lines.push(Line::from(""));
            let hint = if app.profile.pending_update {
                "Saving..."
            } else {
                "Enter: Save | Esc: Cancel | Ctrl+F: Select image"
            };
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(theme.text_dim),
            )));
        } else {
            lines.push(Line::from(vec![
                Span::styled(
                    user.display_name.clone(),
                    Style::default()
                        .fg(theme.primary)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" @{}", user.username),
                    Style::default().fg(theme.text_dim),
                ),
            ]));
            if let Some(image) = &user.image {
                lines.push(Line::from(Span::styled(
                    format!("[avatar: {}]", image),
                    Style::default().fg(theme.accent),
                )));
            }
            if app.viewing_own_profile() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "e: Edit",
                    Style::default().fg(theme.text_dim),
                )));
            }
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn mask(password: &str) -> String {
    "*".repeat(password.chars().count())
}
