use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::super::theme::get_theme_colors;
use super::utils::centered_rect;
use crate::app::App;

/// Render the new-hoax composer modal
pub fn render_composer_modal(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = get_theme_colors();

    let modal_area = centered_rect(70, 70, area);
    frame.render_widget(Clear, modal_area);

    let outer_block = Block::default()
        .title(" New Hoax ")
        .borders(Borders::ALL)
        .border_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .style(Style::default().bg(theme.background));

    let inner = outer_block.inner(modal_area);
    frame.render_widget(outer_block, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Attachment
            Constraint::Length(2), // Errors
            Constraint::Length(3), // Instructions
        ])
        .split(inner);

    let content_block = Block::default()
        .borders(Borders::ALL)
        .title("Content")
        .border_style(Style::default().fg(theme.primary));
    let content_area = content_block.inner(chunks[0]);
    frame.render_widget(content_block, chunks[0]);
    frame.render_widget(&app.composer.textarea, content_area);

    // Attachment row: file prompt while typing a path, otherwise the state
    // of the most recent selection
    let attachment_line = if app.composer.file_input_active {
        Line::from(vec![
            Span::styled("File: ", Style::default().fg(theme.text_dim)),
            Span::styled(
                app.composer.file_input.clone(),
                Style::default().fg(theme.text),
            ),
        ])
    } else if let Some(attachment) = &app.composer.attachment {
        Line::from(Span::styled(
            format!("[attached: {}]", attachment.name),
            Style::default().fg(theme.success),
        ))
    } else if app.composer.selected_file.is_some() {
        // Selected but the upload has not come back yet
        Line::from(Span::styled(
            "Uploading...",
            Style::default().fg(theme.warning),
        ))
    } else {
        Line::from(Span::styled(
            "No attachment",
            Style::default().fg(theme.text_dim),
        ))
    };
    frame.render_widget(
        Paragraph::new(attachment_line).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Attachment")
                .border_style(Style::default().fg(theme.border)),
        ),
        chunks[1],
    );

    let mut error_lines = vec![];
    if let Some(error) = &app.composer.errors.content {
        error_lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.error),
        )));
    }
    if let Some(error) = &app.composer.errors.attachment {
        error_lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.error),
        )));
    }
    frame.render_widget(Paragraph::new(error_lines), chunks[2]);

    let instructions = if app.composer.submitting {
        "Submitting..."
    } else if app.composer.file_input_active {
        "Type a file path | Enter: Upload | Esc: Back"
    } else {
        "Enter: Submit | Ctrl+F: Attach file | Esc: Cancel"
    };
    frame.render_widget(
        Paragraph::new(instructions)
            .style(Style::default().fg(theme.text))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.border)),
            ),
        chunks[3],
    );
}
