use crate::editor::{EditState, InlineEditor};
use crate::error::AppError;
use crate::model::Task;
use crate::render::{ViewModel, render};
use crate::storage::{KeyValueStore, json_store};
use crate::task_store;
use crate::validate::{Rejection, validate_edit, validate_new};
use std::time::Duration;

pub const NOTHING_TO_CLEAR: &str = "There are no completed tasks to clear.";

/// Hook run before a deleted task leaves the collection.
pub trait RemovalDelay {
    fn pause(&self, task_id: &str);
}

pub struct NoDelay;

impl RemovalDelay for NoDelay {
    fn pause(&self, _task_id: &str) {}
}

pub struct SleepDelay(pub Duration);

impl RemovalDelay for SleepDelay {
    fn pause(&self, _task_id: &str) {
        if !self.0.is_zero() {
            std::thread::sleep(self.0);
        }
    }
}

/// What a gesture did to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Applied,
    Rejected(Rejection),
    Notice(String),
    Ignored,
}

/// Owns the task collection, the inline editor and the status message, and
/// runs each gesture as validate, mutate, persist.
///
/// Rendering is pulled with [`TaskController::view`] after every gesture.
/// Errors only come from writing to storage; by then the in-memory collection
/// already holds the new state.
pub struct TaskController<S: KeyValueStore> {
    storage: S,
    tasks: Vec<Task>,
    editor: InlineEditor,
    status: Option<String>,
    delay: Box<dyn RemovalDelay>,
}

impl<S: KeyValueStore> TaskController<S> {
    pub fn load(storage: S) -> Self {
        let tasks = json_store::load(&storage);
        tracing::debug!(count = tasks.len(), "loaded tasks");
        Self {
            storage,
            tasks,
            editor: InlineEditor::new(),
            status: None,
            delay: Box::new(NoDelay),
        }
    }

    pub fn with_removal_delay<D: RemovalDelay + 'static>(mut self, delay: D) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn edit_state(&self) -> &EditState {
        self.editor.state()
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_editing()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn view(&self) -> ViewModel {
        render(&self.tasks, self.editor.state())
    }

    /// Finds a task by exact id, or by an id prefix matching exactly one task.
    pub fn resolve(&self, needle: &str) -> Option<String> {
        let needle = needle.trim();
        if needle.is_empty() {
            return None;
        }
        if let Some(task) = task_store::find(&self.tasks, needle) {
            return Some(task.id.clone());
        }

        let mut matches = self.tasks.iter().filter(|task| task.id.starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Some(task.id.clone()),
            _ => None,
        }
    }

    pub fn submit(&mut self, raw: &str) -> Result<Feedback, AppError> {
        let text = match validate_new(&self.tasks, raw) {
            Ok(text) => text,
            Err(rejection) => return Ok(self.reject(rejection)),
        };

        self.tasks = task_store::add(&self.tasks, &text);
        tracing::debug!(id = %self.tasks[0].id, "added task");
        self.status = None;
        self.persist()?;
        Ok(Feedback::Applied)
    }

    pub fn toggle(&mut self, id: &str) -> Result<Feedback, AppError> {
        if task_store::find(&self.tasks, id).is_none() {
            return Ok(Feedback::Ignored);
        }

        self.tasks = task_store::toggle(&self.tasks, id);
        tracing::debug!(id, "toggled task");
        self.persist()?;
        Ok(Feedback::Applied)
    }

    pub fn delete(&mut self, id: &str) -> Result<Feedback, AppError> {
        if task_store::find(&self.tasks, id).is_none() {
            return Ok(Feedback::Ignored);
        }

        self.delay.pause(id);
        self.tasks = task_store::delete(&self.tasks, id);
        if self.editor.is_editing_task(id) {
            self.editor.cancel();
        }
        self.recheck_edit_status();
        tracing::debug!(id, "deleted task");
        self.persist()?;
        Ok(Feedback::Applied)
    }

    pub fn clear_completed(&mut self) -> Result<Feedback, AppError> {
        if !task_store::has_completed(&self.tasks) {
            self.status = Some(NOTHING_TO_CLEAR.to_string());
            return Ok(Feedback::Notice(NOTHING_TO_CLEAR.to_string()));
        }

        let before = self.tasks.len();
        self.tasks = task_store::clear_completed(&self.tasks);
        if let Some(id) = self.editor.state().editing_id()
            && task_store::find(&self.tasks, id).is_none()
        {
            self.editor.cancel();
        }
        tracing::debug!(removed = before - self.tasks.len(), "cleared completed tasks");
        self.status = None;
        self.persist()?;
        Ok(Feedback::Applied)
    }

    /// Opens the inline editor on `id`, replacing any edit in progress.
    pub fn start_edit(&mut self, id: &str) -> Feedback {
        let Some(task) = task_store::find(&self.tasks, id) else {
            return Feedback::Ignored;
        };

        if let Some(replaced) = self.editor.start(task) {
            tracing::debug!(replaced = %replaced, "discarded previous edit");
        }
        tracing::debug!(id, "editing task");
        Feedback::Applied
    }

    pub fn set_draft(&mut self, text: &str) -> Feedback {
        if self.editor.set_draft(text) {
            Feedback::Applied
        } else {
            Feedback::Ignored
        }
    }

    pub fn cancel_edit(&mut self) -> Feedback {
        match self.editor.cancel() {
            Some(id) => {
                tracing::debug!(id = %id, "edit cancelled");
                Feedback::Applied
            }
            None => Feedback::Ignored,
        }
    }

    /// Explicit confirm gesture on the inline editor.
    pub fn confirm_edit(&mut self) -> Result<Feedback, AppError> {
        self.commit_edit()
    }

    /// The editor for `id` lost focus. Commits only if `id` is still the task
    /// being edited.
    pub fn blur_edit(&mut self, id: &str) -> Result<Feedback, AppError> {
        if !self.editor.is_editing_task(id) {
            return Ok(Feedback::Ignored);
        }
        self.commit_edit()
    }

    fn commit_edit(&mut self) -> Result<Feedback, AppError> {
        let Some((id, draft)) = self
            .editor
            .pending_commit()
            .map(|(id, draft)| (id.to_string(), draft.to_string()))
        else {
            return Ok(Feedback::Ignored);
        };

        let text = match validate_edit(&self.tasks, &id, &draft) {
            Ok(text) => text,
            Err(rejection) => return Ok(self.reject(rejection)),
        };

        self.tasks = task_store::edit(&self.tasks, &id, &text);
        self.editor.cancel();
        tracing::debug!(id = %id, "edit committed");
        self.status = None;
        self.persist()?;
        Ok(Feedback::Applied)
    }

    /// Drops a rejection shown for the open edit once its draft would be
    /// accepted, e.g. after the conflicting task was deleted.
    fn recheck_edit_status(&mut self) {
        if self.status.is_none() {
            return;
        }
        if let Some((id, draft)) = self.editor.pending_commit()
            && validate_edit(&self.tasks, id, draft).is_ok()
        {
            self.status = None;
        }
    }

    fn reject(&mut self, rejection: Rejection) -> Feedback {
        tracing::debug!(reason = %rejection, "input rejected");
        self.status = Some(rejection.to_string());
        Feedback::Rejected(rejection)
    }

    fn persist(&mut self) -> Result<(), AppError> {
        json_store::save(&mut self.storage, &self.tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::{Feedback, NOTHING_TO_CLEAR, RemovalDelay, TaskController};
    use crate::editor::EditState;
    use crate::error::AppError;
    use crate::model::Task;
    use crate::storage::{KeyValueStore, MemoryStore, json_store};
    use crate::validate::Rejection;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn task(id: &str, text: &str, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed,
            created_at: 1_766_188_800_000,
        }
    }

    fn seeded(tasks: &[Task]) -> TaskController<MemoryStore> {
        let mut store = MemoryStore::new();
        json_store::save(&mut store, tasks).unwrap();
        TaskController::load(store)
    }

    fn persisted(controller: &TaskController<MemoryStore>) -> Vec<Task> {
        json_store::load(controller.storage())
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::io("disk full"))
        }
    }

    struct RecordingDelay(Rc<RefCell<Vec<String>>>);

    impl RemovalDelay for RecordingDelay {
        fn pause(&self, task_id: &str) {
            self.0.borrow_mut().push(task_id.to_string());
        }
    }

    #[test]
    fn submit_blank_text_is_rejected_without_change() {
        let mut controller = seeded(&[task("a", "existing", false)]);

        let feedback = controller.submit("   ").unwrap();

        assert_eq!(feedback, Feedback::Rejected(Rejection::EmptyInput));
        assert_eq!(controller.tasks().len(), 1);
        assert_eq!(controller.status(), Some("Type a task before adding."));
    }

    #[test]
    fn submit_duplicate_is_rejected_without_change() {
        let mut controller = seeded(&[task("a", "Buy milk", false)]);

        let feedback = controller.submit("  BUY   milk").unwrap();

        assert_eq!(feedback, Feedback::Rejected(Rejection::Duplicate));
        assert_eq!(controller.tasks(), &[task("a", "Buy milk", false)]);
        assert_eq!(persisted(&controller), vec![task("a", "Buy milk", false)]);
    }

    #[test]
    fn submit_then_render_shows_new_task_first() {
        let mut controller = TaskController::load(MemoryStore::new());

        assert_eq!(controller.submit("Buy milk").unwrap(), Feedback::Applied);
        let view = controller.view();

        assert_eq!(view.counter.pending, 1);
        assert_eq!(view.counter.completed, 0);
        assert!(!view.empty);
        assert_eq!(view.rows[0].text, "Buy milk");
        assert_eq!(persisted(&controller), controller.tasks());
    }

    #[test]
    fn submit_prepends_and_clears_status() {
        let mut controller = seeded(&[task("a", "older", false)]);
        controller.submit("").unwrap();
        assert!(controller.status().is_some());

        controller.submit("  newer   task ").unwrap();

        assert_eq!(controller.status(), None);
        assert_eq!(controller.tasks()[0].text, "newer task");
        assert_eq!(controller.tasks()[1].id, "a");
    }

    #[test]
    fn toggle_twice_restores_and_persists() {
        let tasks = vec![task("b", "two", false), task("a", "one", true)];
        let mut controller = seeded(&tasks);

        controller.toggle("b").unwrap();
        assert!(persisted(&controller)[0].completed);

        controller.toggle("b").unwrap();
        assert_eq!(controller.tasks(), &tasks[..]);
        assert_eq!(persisted(&controller), tasks);
    }

    #[test]
    fn toggle_and_delete_unknown_ids_are_ignored() {
        let mut controller = seeded(&[task("a", "one", false)]);

        assert_eq!(controller.toggle("zzz").unwrap(), Feedback::Ignored);
        assert_eq!(controller.delete("zzz").unwrap(), Feedback::Ignored);
        assert_eq!(controller.tasks().len(), 1);
        assert_eq!(controller.status(), None);
    }

    #[test]
    fn delete_runs_removal_hook_before_removing() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut controller = seeded(&[task("b", "two", false), task("a", "one", false)])
            .with_removal_delay(RecordingDelay(Rc::clone(&seen)));

        controller.delete("a").unwrap();

        assert_eq!(seen.borrow().as_slice(), ["a"]);
        assert_eq!(persisted(&controller), vec![task("b", "two", false)]);
    }

    #[test]
    fn delete_of_task_under_edit_returns_editor_to_idle() {
        let mut controller = seeded(&[task("a", "one", false)]);
        controller.start_edit("a");

        controller.delete("a").unwrap();

        assert_eq!(controller.edit_state(), &EditState::Idle);
        assert!(controller.view().empty);
    }

    #[test]
    fn clear_completed_keeps_pending_order() {
        let mut controller = seeded(&[
            task("d", "four", true),
            task("c", "three", false),
            task("b", "two", true),
            task("a", "one", false),
        ]);

        assert_eq!(controller.clear_completed().unwrap(), Feedback::Applied);

        let ids: Vec<&str> = controller.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["c", "a"]);
        assert_eq!(persisted(&controller).len(), 2);
    }

    #[test]
    fn clear_completed_with_nothing_to_clear_sets_notice() {
        let mut controller = seeded(&[task("a", "one", false)]);

        let feedback = controller.clear_completed().unwrap();

        assert_eq!(feedback, Feedback::Notice(NOTHING_TO_CLEAR.to_string()));
        assert_eq!(controller.status(), Some(NOTHING_TO_CLEAR));
        assert_eq!(controller.tasks().len(), 1);
    }

    #[test]
    fn editing_to_own_text_succeeds() {
        let mut controller = seeded(&[task("b", "Walk dog", false), task("a", "Buy milk", false)]);
        controller.start_edit("a");
        controller.set_draft("  buy MILK ");

        assert_eq!(controller.confirm_edit().unwrap(), Feedback::Applied);
        assert_eq!(controller.tasks()[1].text, "buy MILK");
        assert_eq!(controller.edit_state(), &EditState::Idle);
        assert_eq!(persisted(&controller)[1].text, "buy MILK");
    }

    #[test]
    fn editing_to_another_tasks_text_fails_and_stays_open() {
        let mut controller = seeded(&[
            task("b", "Walk dog", false),
            task("a", "Buy milk", false),
        ]);
        controller.start_edit("a");
        controller.set_draft("walk DOG");

        let feedback = controller.confirm_edit().unwrap();

        assert_eq!(feedback, Feedback::Rejected(Rejection::DuplicateEdit));
        assert_eq!(controller.edit_state().editing_id(), Some("a"));
        assert_eq!(controller.edit_state().draft_for("a"), Some("walk DOG"));
        assert_eq!(controller.tasks()[1].text, "Buy milk");
        assert_eq!(controller.status(), Some("A task with that text already exists."));
    }

    #[test]
    fn deleting_conflicting_task_clears_stale_edit_message() {
        let mut controller = seeded(&[
            task("b", "Walk dog", false),
            task("a", "Buy milk", false),
        ]);
        controller.start_edit("a");
        controller.set_draft("walk DOG");
        assert_eq!(
            controller.blur_edit("a").unwrap(),
            Feedback::Rejected(Rejection::DuplicateEdit)
        );

        controller.delete("b").unwrap();

        assert_eq!(controller.status(), None);
        assert_eq!(controller.edit_state().draft_for("a"), Some("walk DOG"));
        assert_eq!(controller.confirm_edit().unwrap(), Feedback::Applied);
        assert_eq!(controller.tasks()[0].text, "walk DOG");
    }

    #[test]
    fn deleting_unrelated_task_keeps_edit_message() {
        let mut controller = seeded(&[
            task("c", "Call mum", false),
            task("b", "Walk dog", false),
            task("a", "Buy milk", false),
        ]);
        controller.start_edit("a");
        controller.set_draft("walk dog");
        controller.confirm_edit().unwrap();

        controller.delete("c").unwrap();

        assert_eq!(controller.status(), Some("A task with that text already exists."));
        assert!(controller.is_editing());
    }

    #[test]
    fn byte_order_mark_alone_is_not_added() {
        let mut controller = seeded(&[]);

        assert_eq!(
            controller.submit("\u{FEFF}").unwrap(),
            Feedback::Rejected(Rejection::EmptyInput)
        );
        assert!(controller.tasks().is_empty());
    }

    #[test]
    fn empty_edit_is_rejected() {
        let mut controller = seeded(&[task("a", "Buy milk", false)]);
        controller.start_edit("a");
        controller.set_draft("   ");

        assert_eq!(
            controller.confirm_edit().unwrap(),
            Feedback::Rejected(Rejection::EmptyEdit)
        );
        assert_eq!(controller.tasks()[0].text, "Buy milk");
    }

    #[test]
    fn cancel_discards_in_progress_text() {
        let mut controller = seeded(&[task("a", "Buy milk", false)]);
        controller.start_edit("a");
        controller.set_draft("Buy oat milk");

        assert_eq!(controller.cancel_edit(), Feedback::Applied);

        let view = controller.view();
        assert!(view.editing_row().is_none());
        assert_eq!(view.rows[0].text, "Buy milk");
        assert_eq!(persisted(&controller)[0].text, "Buy milk");
    }

    #[test]
    fn blur_commits_only_for_task_under_edit() {
        let mut controller = seeded(&[task("b", "two", false), task("a", "one", false)]);
        controller.start_edit("a");
        controller.set_draft("one, revised");

        assert_eq!(controller.blur_edit("b").unwrap(), Feedback::Ignored);
        assert!(controller.is_editing());

        assert_eq!(controller.blur_edit("a").unwrap(), Feedback::Applied);
        assert_eq!(controller.tasks()[1].text, "one, revised");
        assert!(!controller.is_editing());
    }

    #[test]
    fn starting_new_edit_cancels_previous_draft() {
        let mut controller = seeded(&[task("b", "two", false), task("a", "one", false)]);
        controller.start_edit("a");
        controller.set_draft("abandoned");

        controller.start_edit("b");

        assert_eq!(controller.edit_state().editing_id(), Some("b"));
        assert_eq!(controller.edit_state().draft_for("b"), Some("two"));
        assert_eq!(controller.tasks()[1].text, "one");
    }

    #[test]
    fn start_edit_on_unknown_id_is_ignored() {
        let mut controller = seeded(&[task("a", "one", false)]);
        assert_eq!(controller.start_edit("nope"), Feedback::Ignored);
        assert!(!controller.is_editing());
        assert_eq!(controller.set_draft("x"), Feedback::Ignored);
        assert_eq!(controller.confirm_edit().unwrap(), Feedback::Ignored);
    }

    #[test]
    fn resolve_accepts_exact_id_or_unique_prefix() {
        let controller = seeded(&[
            task("abc-1", "one", false),
            task("abd-2", "two", false),
            task("xyz-3", "three", false),
        ]);

        assert_eq!(controller.resolve("abc-1").as_deref(), Some("abc-1"));
        assert_eq!(controller.resolve("xy").as_deref(), Some("xyz-3"));
        assert_eq!(controller.resolve("ab"), None);
        assert_eq!(controller.resolve(""), None);
        assert_eq!(controller.resolve("nope"), None);
    }

    #[test]
    fn persistence_failure_is_reported() {
        let mut controller = TaskController::load(FailingStore);

        let err = controller.submit("demo").unwrap_err();

        assert_eq!(err.code(), "io_error");
        assert_eq!(controller.tasks().len(), 1);
    }

    #[test]
    fn corrupt_storage_starts_empty() {
        let store = MemoryStore::with_entry(json_store::STORAGE_KEY, "not json at all");
        let controller = TaskController::load(store);

        assert!(controller.tasks().is_empty());
        assert!(controller.view().empty);
    }
}
