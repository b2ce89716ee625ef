//! Inline editing state: which task, if any, is mid-edit and what its control
//! currently holds. Never persisted.

use crate::model::Task;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        id: String,
        draft: String,
    },
}

impl EditState {
    pub fn editing_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Editing { id, .. } => Some(id.as_str()),
        }
    }

    pub fn draft_for(&self, task_id: &str) -> Option<&str> {
        match self {
            Self::Editing { id, draft } if id == task_id => Some(draft.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct InlineEditor {
    state: EditState,
}

impl InlineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        self.state.editing_id().is_some()
    }

    pub fn is_editing_task(&self, id: &str) -> bool {
        self.state.editing_id() == Some(id)
    }

    /// Opens the editor on `task` with its current text as the draft.
    /// Returns the id of an edit that was replaced, if any.
    pub fn start(&mut self, task: &Task) -> Option<String> {
        let previous = std::mem::replace(
            &mut self.state,
            EditState::Editing {
                id: task.id.clone(),
                draft: task.text.clone(),
            },
        );
        match previous {
            EditState::Editing { id, .. } if id != task.id => Some(id),
            _ => None,
        }
    }

    /// Replaces the draft while editing. Returns false when idle.
    pub fn set_draft(&mut self, text: &str) -> bool {
        match &mut self.state {
            EditState::Editing { draft, .. } => {
                *draft = text.to_string();
                true
            }
            EditState::Idle => false,
        }
    }

    /// Discards the edit in progress, returning the id that was being edited.
    pub fn cancel(&mut self) -> Option<String> {
        match std::mem::take(&mut self.state) {
            EditState::Editing { id, .. } => Some(id),
            EditState::Idle => None,
        }
    }

    /// The `(id, draft)` pair a commit would apply.
    pub fn pending_commit(&self) -> Option<(&str, &str)> {
        match &self.state {
            EditState::Editing { id, draft } => Some((id.as_str(), draft.as_str())),
            EditState::Idle => None,
        }
    }
}
