//! Builds the visible representation of the list.
//!
//! The view is rebuilt from scratch on every call: the same collection and
//! edit state always produce the same [`ViewModel`] for a given time zone.

use crate::editor::EditState;
use crate::model::Task;
use crate::task_store;
use serde::Serialize;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const EDIT_HINT: &str = "Enter: save · Esc: cancel";
pub const EDIT_LABEL: &str = "Edit task";
pub const DELETE_LABEL: &str = "Delete task";
pub const EMPTY_MESSAGE: &str = "No tasks yet.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub rows: Vec<TaskRow>,
    pub counter: Counter,
    /// When set, the empty-state message replaces the list entirely.
    pub empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub toggle_label: &'static str,
    pub created: String,
    pub editor: Option<EditorView>,
    pub edit_label: &'static str,
    pub delete_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorView {
    pub value: String,
    pub hint: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counter {
    pub pending: usize,
    pub completed: usize,
}

impl Counter {
    pub fn label(&self) -> String {
        format!("{} pending · {} completed", self.pending, self.completed)
    }
}

impl ViewModel {
    pub fn editing_row(&self) -> Option<&TaskRow> {
        self.rows.iter().find(|row| row.editor.is_some())
    }
}

pub fn render(tasks: &[Task], editing: &EditState) -> ViewModel {
    render_with_offset(tasks, editing, local_offset())
}

pub fn render_with_offset(tasks: &[Task], editing: &EditState, offset: UtcOffset) -> ViewModel {
    let rows = tasks
        .iter()
        .map(|task| TaskRow {
            id: task.id.clone(),
            text: task.text.clone(),
            completed: task.completed,
            toggle_label: if task.completed {
                "Mark as pending"
            } else {
                "Mark as completed"
            },
            created: format_created(task.created_at, offset),
            editor: editing.draft_for(&task.id).map(|draft| EditorView {
                value: draft.to_string(),
                hint: EDIT_HINT,
            }),
            edit_label: EDIT_LABEL,
            delete_label: DELETE_LABEL,
        })
        .collect();

    let (pending, completed) = task_store::counts(tasks);

    ViewModel {
        rows,
        counter: Counter { pending, completed },
        empty: tasks.is_empty(),
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Formats epoch milliseconds in `offset`, or `-` when out of range.
pub fn format_created(created_at: i64, offset: UtcOffset) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(created_at) * 1_000_000)
        .ok()
        .and_then(|instant| instant.to_offset(offset).format(&format).ok())
        .unwrap_or_else(|| "-".to_string())
}
