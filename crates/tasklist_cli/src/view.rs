use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasklist_core::config::Palette;
use tasklist_core::render::{EMPTY_MESSAGE, TaskRow, ViewModel};

const SHORT_ID_LEN: usize = 8;

#[derive(Tabled)]
struct Line {
    #[tabled(rename = "")]
    check: &'static str,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl Line {
    fn from_row(row: &TaskRow) -> Self {
        let text = match row.editor.as_ref() {
            Some(editor) => format!("> {}", editor.value),
            None => row.text.clone(),
        };
        Self {
            check: if row.completed { "[x]" } else { "[ ]" },
            id: short_id(&row.id),
            text,
            created: row.created.clone(),
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

/// Draws the whole screen: list or empty state, counter, then status.
pub fn screen_text(view: &ViewModel, status: Option<&str>, palette: &Palette) -> String {
    let mut out = String::new();

    if view.empty {
        out.push_str(&palette.mutedize(EMPTY_MESSAGE));
        out.push('\n');
    } else {
        let lines: Vec<Line> = view.rows.iter().map(Line::from_row).collect();
        let mut table = Table::new(lines);
        table.with(Style::psql());
        out.push_str(&table.to_string());
        out.push('\n');

        if let Some(row) = view.editing_row()
            && let Some(editor) = row.editor.as_ref()
        {
            out.push_str(&palette.mutedize(&format!(
                "editing {}: {}",
                short_id(&row.id),
                editor.hint
            )));
            out.push('\n');
        }
    }

    out.push_str(&palette.accentize(&view.counter.label()));
    out.push('\n');

    if let Some(status) = status {
        out.push_str(&palette.accentize(&format!("! {status}")));
        out.push('\n');
    }

    out
}

pub fn screen_json(view: &ViewModel, status: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "status": status,
        "view": view,
    })
}
