//! Pure mutations over the ordered task collection.
//!
//! Every operation takes the current collection and returns the next one. None
//! of them fail or touch storage; validation happens before they are called.

use crate::model::Task;

/// Prepends a new pending task carrying `text`.
pub fn add(tasks: &[Task], text: &str) -> Vec<Task> {
    prepend(tasks, Task::new(text))
}

pub fn prepend(tasks: &[Task], task: Task) -> Vec<Task> {
    let mut next = Vec::with_capacity(tasks.len() + 1);
    next.push(task);
    next.extend_from_slice(tasks);
    next
}

pub fn delete(tasks: &[Task], id: &str) -> Vec<Task> {
    tasks.iter().filter(|task| task.id != id).cloned().collect()
}

pub fn toggle(tasks: &[Task], id: &str) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            if task.id == id {
                Task {
                    completed: !task.completed,
                    ..task.clone()
                }
            } else {
                task.clone()
            }
        })
        .collect()
}

pub fn edit(tasks: &[Task], id: &str, text: &str) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            if task.id == id {
                Task {
                    text: text.to_string(),
                    ..task.clone()
                }
            } else {
                task.clone()
            }
        })
        .collect()
}

pub fn clear_completed(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|task| task.is_pending()).cloned().collect()
}

pub fn has_completed(tasks: &[Task]) -> bool {
    tasks.iter().any(|task| task.completed)
}

/// Returns `(pending, completed)`.
pub fn counts(tasks: &[Task]) -> (usize, usize) {
    let completed = tasks.iter().filter(|task| task.completed).count();
    (tasks.len() - completed, completed)
}

pub fn find<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    tasks.iter().find(|task| task.id == id)
}
