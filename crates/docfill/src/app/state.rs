//! Interactive application state and its transition function.
//!
//! The UI never mutates state directly: it maps input to an [`Event`], feeds
//! it through [`transition`], renders the resulting [`AppState`], and runs
//! any [`Effect`] the transition asked for, reporting back with another event.

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::registry::Registry;
use crate::domain::errors::FillError;
use crate::domain::model::{FieldValues, TemplateDefinition};

/// Pane that receives navigation and text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Templates,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

/// Everything that can happen to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Move the template highlight by the given offset, clamped.
    MoveCursor(isize),
    /// Select the highlighted template.
    SelectHighlighted,
    SelectTemplate(String),
    FocusTemplates,
    FocusForm,
    NextField,
    PreviousField,
    Input(char),
    Backspace,
    /// Ask to save; answered with [`Effect::SuggestDestination`].
    RequestSave,
    /// Open the destination prompt prefilled with a suggestion.
    OpenPrompt(String),
    ConfirmSave,
    Cancel,
    SaveSucceeded(PathBuf),
    SaveFailed(String),
    ClearStatus,
    Quit,
}

/// Side effects the runner performs on behalf of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SuggestDestination {
        template: String,
        values: FieldValues,
    },
    Save {
        template: String,
        values: FieldValues,
        destination: PathBuf,
    },
}

/// The next state plus any effect to run.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: AppState,
    pub effect: Option<Effect>,
}

/// Snapshot of the interactive session.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: Arc<Registry>,
    names: Vec<String>,
    cursor: usize,
    selected: Option<String>,
    values: FieldValues,
    field_cursor: usize,
    focus: Focus,
    prompt: Option<String>,
    status: Option<Status>,
    should_quit: bool,
}

impl AppState {
    pub fn new(registry: Arc<Registry>) -> Self {
        let names = registry.names().map(str::to_string).collect();
        Self {
            registry,
            names,
            cursor: 0,
            selected: None,
            values: FieldValues::new(),
            field_cursor: 0,
            focus: Focus::Templates,
            prompt: None,
            status: None,
            should_quit: false,
        }
    }

    pub fn template_names(&self) -> &[String] {
        &self.names
    }

    /// Index of the highlighted template.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_template(&self) -> Option<&TemplateDefinition> {
        self.selected.as_deref().and_then(|name| self.registry.get(name))
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    /// Index of the focused field within the selected template.
    pub fn field_cursor(&self) -> usize {
        self.field_cursor
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Destination being edited, when the save prompt is open.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn focused_field(&self) -> Option<String> {
        self.selected_template()
            .and_then(|template| template.fields.get(self.field_cursor))
            .cloned()
    }

    fn field_count(&self) -> usize {
        self.selected_template()
            .map(|template| template.fields.len())
            .unwrap_or(0)
    }

    fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = Some(Status {
            level,
            text: text.into(),
        });
    }

    fn select(&mut self, name: &str) {
        let Some(template) = self.registry.get(name) else {
            self.set_status(
                StatusLevel::Error,
                FillError::UnknownTemplate(name.to_string()).to_string(),
            );
            return;
        };
        self.values = template.blank_values();
        self.selected = Some(template.name.clone());
        if let Some(index) = self.names.iter().position(|candidate| candidate == name) {
            self.cursor = index;
        }
        self.field_cursor = 0;
        self.prompt = None;
        self.focus = Focus::Form;
        self.status = None;
    }
}

/// An empty session over an empty registry.
impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::default())
    }
}

/// Apply `event` to `state`.
pub fn transition(mut state: AppState, event: Event) -> Transition {
    tracing::debug!(?event, "transition");
    let mut effect = None;

    match event {
        Event::MoveCursor(delta) => {
            if !state.names.is_empty() {
                let last = state.names.len() - 1;
                state.cursor = state.cursor.saturating_add_signed(delta).min(last);
            }
        }
        Event::SelectHighlighted => {
            if let Some(name) = state.names.get(state.cursor).cloned() {
                state.select(&name);
            }
        }
        Event::SelectTemplate(name) => state.select(&name),
        Event::FocusTemplates => state.focus = Focus::Templates,
        Event::FocusForm => {
            if state.selected.is_some() {
                state.focus = Focus::Form;
            }
        }
        Event::NextField => {
            let count = state.field_count();
            if count > 0 {
                state.field_cursor = (state.field_cursor + 1) % count;
            }
        }
        Event::PreviousField => {
            let count = state.field_count();
            if count > 0 {
                state.field_cursor = (state.field_cursor + count - 1) % count;
            }
        }
        Event::Input(ch) => {
            if let Some(prompt) = state.prompt.as_mut() {
                prompt.push(ch);
            } else if state.focus == Focus::Form
                && let Some(field) = state.focused_field()
                && let Some(value) = state.values.get_mut(&field)
            {
                value.push(ch);
            }
        }
        Event::Backspace => {
            if let Some(prompt) = state.prompt.as_mut() {
                prompt.pop();
            } else if state.focus == Focus::Form
                && let Some(field) = state.focused_field()
                && let Some(value) = state.values.get_mut(&field)
            {
                value.pop();
            }
        }
        Event::RequestSave => match state.selected.clone() {
            Some(template) => {
                effect = Some(Effect::SuggestDestination {
                    template,
                    values: state.values.clone(),
                });
            }
            None => state.set_status(StatusLevel::Error, FillError::MissingSelection.to_string()),
        },
        Event::OpenPrompt(suggestion) => {
            if state.selected.is_some() {
                state.prompt = Some(suggestion);
            }
        }
        Event::ConfirmSave => match (state.prompt.take(), state.selected.clone()) {
            (Some(destination), Some(template)) if !destination.trim().is_empty() => {
                effect = Some(Effect::Save {
                    template,
                    values: state.values.clone(),
                    destination: PathBuf::from(destination.trim()),
                });
            }
            (Some(destination), Some(_)) => {
                state.prompt = Some(destination);
                state.set_status(StatusLevel::Error, "Enter a destination file");
            }
            (_, None) => {
                state.set_status(StatusLevel::Error, FillError::MissingSelection.to_string());
            }
            (None, Some(_)) => {}
        },
        Event::Cancel => {
            if state.prompt.take().is_none() {
                state.focus = Focus::Templates;
            }
        }
        Event::SaveSucceeded(path) => {
            if let Some(blank) = state
                .selected_template()
                .map(TemplateDefinition::blank_values)
            {
                state.values = blank;
            }
            state.field_cursor = 0;
            state.set_status(
                StatusLevel::Success,
                format!("Document saved to {}", path.display()),
            );
        }
        Event::SaveFailed(message) => state.set_status(StatusLevel::Error, message),
        Event::ClearStatus => state.status = None,
        Event::Quit => state.should_quit = true,
    }

    Transition { state, effect }
}
