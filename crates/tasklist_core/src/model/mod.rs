mod task;

pub use task::{Task, new_task_id, now_millis};
