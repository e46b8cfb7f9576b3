//! Form pane with one labelled input per template field.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::domain::model::{FieldValues, TemplateDefinition};

/// Renders the selected template's fields and their current values.
#[derive(Debug, Default)]
pub struct FieldForm;

impl FieldForm {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        template: Option<&TemplateDefinition>,
        values: &FieldValues,
        field_cursor: usize,
        has_focus: bool,
    ) {
        let title = template
            .map(|template| template.name.clone())
            .unwrap_or_else(|| "Fields".to_string());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if has_focus {
                Color::Cyan
            } else {
                Color::DarkGray
            }));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(template) = template else {
            let placeholder = Paragraph::new("Select a template to fill in its fields")
                .style(
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(placeholder, inner);
            return;
        };

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let lines = field_lines(template, values, field_cursor, has_focus);
        let visible = layout[0].height as usize;
        let scroll = field_cursor.saturating_sub(visible.saturating_sub(1));
        frame.render_widget(
            Paragraph::new(lines).scroll((scroll as u16, 0)),
            layout[0],
        );

        let footer = Paragraph::new(Line::from(vec![
            Span::styled("ctrl+s", Style::default().fg(Color::Cyan)),
            Span::raw(" save document"),
        ]))
        .style(Style::default().fg(Color::Gray));
        frame.render_widget(footer, layout[1]);
    }
}

fn field_lines(
    template: &TemplateDefinition,
    values: &FieldValues,
    field_cursor: usize,
    has_focus: bool,
) -> Vec<Line<'static>> {
    let label_width = template
        .fields
        .iter()
        .map(|field| field.chars().count())
        .max()
        .unwrap_or(0);

    template
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let focused = has_focus && index == field_cursor;
            let value = values.get(field).unwrap_or_default();
            let label_style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let mut spans = vec![
                Span::styled(format!("{field:>label_width$}"), label_style),
                Span::raw(" │ "),
                Span::raw(value.to_string()),
            ];
            if focused {
                spans.push(Span::styled(
                    "▏",
                    Style::default().add_modifier(Modifier::SLOW_BLINK),
                ));
            }
            Line::from(spans)
        })
        .collect()
}
