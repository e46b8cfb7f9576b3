//! Collection of reusable TUI components.

pub mod field_form;
pub mod save_prompt;
pub mod template_list;
