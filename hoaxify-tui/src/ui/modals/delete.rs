use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::super::theme::get_theme_colors;
use super::utils::centered_rect;
use crate::app::{delete_prompt, App};

/// Render delete confirmation modal
pub fn render_delete_confirmation_modal(frame: &mut Frame, app: &App, area: Rect) {
    let theme = get_theme_colors();

    let hoax = match &app.feed.pending_delete {
        Some(hoax) => hoax,
        None => return,
    };

    let modal_area = centered_rect(50, 35, area);
    frame.render_widget(Clear, modal_area);

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            delete_prompt(hoax),
            Style::default().fg(theme.text),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "This action cannot be undone.",
            Style::default().fg(theme.text_dim),
        )),
        Line::from(""),
        Line::from("─".repeat(46)).style(Style::default().fg(theme.border)),
        Line::from(""),
    ];

    if app.feed.deleting {
        content.push(Line::from(Span::styled(
            "Deleting...",
            Style::default().fg(theme.warning),
        )));
    } else {
        content.push(Line::from(vec![
            Span::styled(
                "Y",
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            ),
            Span::styled(": Delete  ", Style::default().fg(theme.text)),
            Span::styled(
                "N",
                Style::default()
                    .fg(theme.success)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(": Cancel  ", Style::default().fg(theme.text)),
            Span::styled(
                "Esc",
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(": Cancel", Style::default().fg(theme.text)),
        ]));
    }

    let modal = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .title(" Delete Hoax ")
            .borders(Borders::ALL)
            .border_style(
                Style::default()
                    .fg(theme.warning)
                    .add_modifier(Modifier::BOLD),
            )
            .style(Style::default().bg(theme.background)),
    );

    frame.render_widget(modal, modal_area);
}
