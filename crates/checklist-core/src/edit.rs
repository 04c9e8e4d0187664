use tracing::{debug, info};

use crate::storage::Storage;
use crate::task_store::TaskStore;

pub const EDITING_MESSAGE: &str = "Editing task. Update text and click Save.";
pub const EMPTY_TITLE_MESSAGE: &str = "Task title cannot be empty.";
pub const ADDED_MESSAGE: &str = "Task added successfully.";
pub const UPDATED_MESSAGE: &str = "Task updated successfully.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Idle,
    Editing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: MessageKind,
}

impl Notice {
    pub fn success(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: MessageKind::Success,
        }
    }

    pub fn error(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: MessageKind::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Added(String),
    Updated(String),
    Rejected,
}

/// The task entry form: what it is editing, what the input shows, whether
/// cancel is offered, and the last message shown under it.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    mode: EditMode,
    pub input: String,
    pub cancel_visible: bool,
    pub message: Option<Notice>,
}

impl FormState {
    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            EditMode::Editing(id) => Some(id),
            EditMode::Idle => None,
        }
    }

    /// Enters edit mode for `id`. Returns false and leaves the form alone
    /// when no such task exists.
    #[tracing::instrument(skip(self, store))]
    pub fn start_edit<S: Storage>(&mut self, store: &TaskStore<S>, id: &str) -> bool {
        let Some(task) = store.get(id) else {
            debug!("edit requested for unknown task");
            return false;
        };

        self.mode = EditMode::Editing(task.id.clone());
        self.input = task.title.clone();
        self.cancel_visible = true;
        self.message = Some(Notice::success(EDITING_MESSAGE));
        true
    }

    pub fn cancel(&mut self) {
        self.reset();
        self.message = None;
    }

    /// Adds or updates depending on the current mode. Blank titles are
    /// rejected with an error message and the mode is kept.
    #[tracing::instrument(skip(self, store, raw_title), fields(mode = ?self.mode))]
    pub fn submit<S: Storage>(
        &mut self,
        store: &mut TaskStore<S>,
        raw_title: &str,
    ) -> anyhow::Result<SubmitOutcome> {
        let title = raw_title.trim();
        if title.is_empty() {
            self.message = Some(Notice::error(EMPTY_TITLE_MESSAGE));
            return Ok(SubmitOutcome::Rejected);
        }

        let outcome = match &self.mode {
            EditMode::Editing(id) => {
                store.update(id, title)?;
                self.message = Some(Notice::success(UPDATED_MESSAGE));
                SubmitOutcome::Updated(id.clone())
            }
            EditMode::Idle => {
                let id = store.add(title)?;
                self.message = Some(Notice::success(ADDED_MESSAGE));
                SubmitOutcome::Added(id)
            }
        };

        info!(?outcome, "form submitted");
        self.reset();
        Ok(outcome)
    }

    /// Drops out of edit mode if `id` is the task being edited.
    pub fn forget(&mut self, id: &str) {
        if self.editing_id() == Some(id) {
            debug!(id, "edited task removed; leaving edit mode");
            self.cancel();
        }
    }

    fn reset(&mut self) {
        self.mode = EditMode::Idle;
        self.input.clear();
        self.cancel_visible = false;
    }
}
