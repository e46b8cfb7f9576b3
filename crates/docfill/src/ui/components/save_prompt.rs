//! Destination prompt shown when saving a document.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Overlay asking for the output path.
#[derive(Debug, Default)]
pub struct SavePrompt;

impl SavePrompt {
    /// Draw the prompt if a destination is being edited.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, destination: Option<&str>) {
        let Some(destination) = destination else {
            return;
        };

        let width = area.width.saturating_sub(10).min(80);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + area.height.saturating_sub(6),
            width,
            height: 5.min(area.height),
        };

        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title("Save Document")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        frame.render_widget(block.clone(), popup);

        let inner = block.inner(popup);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);

        let input = Paragraph::new(format!("{destination}▏"))
            .style(Style::default().fg(Color::White));
        frame.render_widget(input, layout[0]);

        let hint = Paragraph::new(Line::from(vec![
            Span::styled("↵", Style::default().fg(Color::Cyan)),
            Span::raw(" write .docx · "),
            Span::styled("esc", Style::default().fg(Color::Cyan)),
            Span::raw(" cancel"),
        ]))
        .style(Style::default().fg(Color::Gray));
        frame.render_widget(hint, layout[1]);
    }
}
