//! Application loop for the TUI.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::app::fill::Filler;
use crate::app::state::{AppState, Effect, Event, Focus, Status, StatusLevel, transition};
use crate::ui::components::field_form::FieldForm;
use crate::ui::components::save_prompt::SavePrompt;
use crate::ui::components::template_list::{TemplateList, preferred_width};

const TICK_RATE: Duration = Duration::from_millis(120);
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Primary entry point for running the interactive TUI.
pub struct UiApp {
    filler: Filler,
    state: AppState,
    shown_status: Option<(Status, Instant)>,
}

impl UiApp {
    pub fn new(filler: Filler) -> Self {
        let state = AppState::new(filler.registry().clone());
        Self {
            filler,
            state,
            shown_status: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| render(frame, &self.state))?;
            self.tick();

            if self.state.should_quit() {
                break;
            }

            if event::poll(TICK_RATE)?
                && let TermEvent::Key(key) = event::read()?
                && key.kind != KeyEventKind::Release
                && let Some(event) = map_key(&self.state, key)
            {
                self.dispatch(event);
            }
        }
        Ok(())
    }

    /// Feed `event` through the transition function, running effects until
    /// none remain.
    pub fn dispatch(&mut self, event: Event) {
        let mut pending = Some(event);
        while let Some(event) = pending.take() {
            let next = transition(std::mem::take(&mut self.state), event);
            self.state = next.state;
            pending = next.effect.map(|effect| self.perform(effect));
        }
    }

    fn perform(&self, effect: Effect) -> Event {
        match effect {
            Effect::SuggestDestination { template, values } => {
                match self.filler.template(Some(&template)) {
                    Ok(definition) => Event::OpenPrompt(
                        self.filler
                            .suggest_destination(definition, &values)
                            .display()
                            .to_string(),
                    ),
                    Err(err) => Event::SaveFailed(err.to_string()),
                }
            }
            Effect::Save {
                template,
                values,
                destination,
            } => match self.filler.fill(Some(&template), &values, Some(&destination)) {
                Ok(outcome) => Event::SaveSucceeded(outcome.path),
                Err(err) => {
                    tracing::error!(template = %template, error = %err, "save failed");
                    Event::SaveFailed(err.to_string())
                }
            },
        }
    }

    fn tick(&mut self) {
        let Some(current) = self.state.status().cloned() else {
            self.shown_status = None;
            return;
        };
        match &self.shown_status {
            Some((shown, since)) if *shown == current => {
                if since.elapsed() >= STATUS_TTL {
                    self.shown_status = None;
                    self.dispatch(Event::ClearStatus);
                }
            }
            _ => self.shown_status = Some((current, Instant::now())),
        }
    }
}

/// Translate a key press into an application event for the current state.
pub fn map_key(state: &AppState, key: KeyEvent) -> Option<Event> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Some(Event::Quit),
            KeyCode::Char('s') => Some(Event::RequestSave),
            _ => None,
        };
    }
    let typed = |ch: char| {
        (!key.modifiers.contains(KeyModifiers::ALT)).then_some(Event::Input(ch))
    };

    if state.prompt().is_some() {
        return match key.code {
            KeyCode::Esc => Some(Event::Cancel),
            KeyCode::Enter => Some(Event::ConfirmSave),
            KeyCode::Backspace => Some(Event::Backspace),
            KeyCode::Char(ch) => typed(ch),
            _ => None,
        };
    }

    match state.focus() {
        Focus::Templates => match key.code {
            KeyCode::Char('k') | KeyCode::Up => Some(Event::MoveCursor(-1)),
            KeyCode::Char('j') | KeyCode::Down => Some(Event::MoveCursor(1)),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => Some(Event::SelectHighlighted),
            KeyCode::Tab => Some(Event::FocusForm),
            KeyCode::Esc | KeyCode::Char('q') => Some(Event::Quit),
            _ => None,
        },
        Focus::Form => match key.code {
            KeyCode::Esc => Some(Event::Cancel),
            KeyCode::Tab | KeyCode::Down | KeyCode::Enter => Some(Event::NextField),
            KeyCode::BackTab | KeyCode::Up => Some(Event::PreviousField),
            KeyCode::Backspace => Some(Event::Backspace),
            KeyCode::Char(ch) => typed(ch),
            _ => None,
        },
    }
}

/// Draw `state`.
pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let size = frame.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(size);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(preferred_width(state.template_names())),
            Constraint::Min(30),
        ])
        .split(layout[0]);

    TemplateList.render(
        frame,
        main_chunks[0],
        state.template_names(),
        state.cursor(),
        state.selected(),
        state.focus() == Focus::Templates && state.prompt().is_none(),
    );
    FieldForm.render(
        frame,
        main_chunks[1],
        state.selected_template(),
        state.values(),
        state.field_cursor(),
        state.focus() == Focus::Form && state.prompt().is_none(),
    );

    let hints = Paragraph::new(Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Cyan)),
        Span::raw(" move · "),
        Span::styled("↵", Style::default().fg(Color::Cyan)),
        Span::raw(" choose · "),
        Span::styled("tab", Style::default().fg(Color::Cyan)),
        Span::raw(" next field · "),
        Span::styled("ctrl+s", Style::default().fg(Color::Cyan)),
        Span::raw(" save · "),
        Span::styled("esc", Style::default().fg(Color::Cyan)),
        Span::raw(" back · "),
        Span::styled("ctrl+q", Style::default().fg(Color::Cyan)),
        Span::raw(" quit"),
    ]))
    .wrap(Wrap { trim: true })
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(hints, layout[1]);

    render_status(frame, layout[2], state.status());
    SavePrompt.render(frame, size, state.prompt());
}

fn render_status(frame: &mut Frame<'_>, area: Rect, status: Option<&Status>) {
    let line = match status {
        Some(status) => {
            let style = match status.level {
                StatusLevel::Info => Style::default().fg(Color::Gray),
                StatusLevel::Success => Style::default().fg(Color::Green),
                StatusLevel::Error => Style::default().fg(Color::Red),
            };
            Line::styled(status.text.clone(), style)
        }
        None => Line::styled(
            "Ready · choose a template",
            Style::default().fg(Color::DarkGray),
        ),
    };
    frame.render_widget(Paragraph::new(line), area);
}
