use crate::model::Task;

/// Why a candidate task text was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Type a task before adding.")]
    EmptyInput,
    #[error("That task already exists. Try a different text.")]
    Duplicate,
    #[error("The edit cannot be empty.")]
    EmptyEdit,
    #[error("A task with that text already exists.")]
    DuplicateEdit,
}

/// Trims the text and collapses every internal whitespace run to one space.
pub fn normalize(raw: &str) -> String {
    raw.split(is_separator)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace as text fields count it: U+FEFF separates words, U+0085 does
/// not.
fn is_separator(ch: char) -> bool {
    (ch.is_whitespace() && ch != '\u{85}') || ch == '\u{FEFF}'
}

/// Comparison key for duplicate detection: normalized, then lowercased.
/// Accents and locale rules are not folded.
pub fn fold(raw: &str) -> String {
    normalize(raw).to_lowercase()
}

/// Validates text submitted for a new task and returns its normalized form.
pub fn validate_new(tasks: &[Task], raw: &str) -> Result<String, Rejection> {
    let text = normalize(raw);
    if text.is_empty() {
        return Err(Rejection::EmptyInput);
    }

    let key = text.to_lowercase();
    if tasks.iter().any(|task| fold(&task.text) == key) {
        return Err(Rejection::Duplicate);
    }

    Ok(text)
}

/// Validates replacement text for task `id`. The task's own text does not
/// count as a duplicate.
pub fn validate_edit(tasks: &[Task], id: &str, raw: &str) -> Result<String, Rejection> {
    let text = normalize(raw);
    if text.is_empty() {
        return Err(Rejection::EmptyEdit);
    }

    let key = text.to_lowercase();
    if tasks
        .iter()
        .any(|task| task.id != id && fold(&task.text) == key)
    {
        return Err(Rejection::DuplicateEdit);
    }

    Ok(text)
}
