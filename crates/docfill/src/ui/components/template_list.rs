//! Template picker pane.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Lists registry templates, marking the highlighted and selected entries.
#[derive(Debug, Default)]
pub struct TemplateList;

impl TemplateList {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        names: &[String],
        cursor: usize,
        selected: Option<&str>,
        has_focus: bool,
    ) {
        let block = Block::default()
            .title("Choose Template")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if has_focus {
                Color::Cyan
            } else {
                Color::DarkGray
            }));

        if names.is_empty() {
            let placeholder = Paragraph::new("No templates registered")
                .block(block)
                .style(
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                );
            frame.render_widget(placeholder, area);
            return;
        }

        let items: Vec<ListItem<'_>> = names
            .iter()
            .map(|name| {
                let is_selected = selected == Some(name.as_str());
                let marker = if is_selected { "● " } else { "  " };
                let mut style = Style::default();
                if is_selected {
                    style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
                }
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Cyan)),
                    Span::styled(name.clone(), style),
                ]))
            })
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(cursor.min(names.len() - 1)));

        let highlight_style = if has_focus {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Gray)
                .add_modifier(Modifier::BOLD)
        };

        let list = List::new(items)
            .block(block)
            .highlight_style(highlight_style)
            .highlight_symbol("▸ ");

        frame.render_stateful_widget(list, area, &mut list_state);
    }
}

/// Width that fits the longest template name plus chrome.
pub fn preferred_width(names: &[String]) -> u16 {
    let longest = names.iter().map(|name| name.chars().count()).max().unwrap_or(0);
    (longest + 8).clamp(20, 48) as u16
}
