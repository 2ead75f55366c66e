use crate::error::ApiError;
use crate::remote::Remote;
use crate::task::Task;

pub const NO_TASKS: &str = "You haven't created any tasks yet";

/// Tasks the signed-in user created, with delete.
#[derive(Debug, Default)]
pub struct MyTasksView {
    pub tasks: Remote<Vec<Task>>,
    pub selected: usize,
    /// Task id waiting for a second keypress before it is deleted.
    pub confirm_delete: Option<u64>,
    pub status: Option<String>,
}

impl MyTasksView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&mut self, result: Result<Vec<Task>, ApiError>) {
        self.tasks = Remote::from_result(result);
        self.selected = 0;
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.ready().and_then(|t| t.get(self.selected))
    }

    pub fn move_selection(&mut self, direction: isize) {
        let len = self.tasks.ready().map_or(0, Vec::len);
        let max = len.saturating_sub(1) as isize;
        self.selected = (self.selected as isize + direction).clamp(0, max) as usize;
        self.confirm_delete = None;
    }

    /// First press arms the delete, second press on the same task returns
    /// its id.
    pub fn request_delete(&mut self) -> Option<u64> {
        let id = self.selected_task()?.id;
        if self.confirm_delete == Some(id) {
            self.confirm_delete = None;
            Some(id)
        } else {
            self.confirm_delete = Some(id);
            self.status = Some("Press d again to delete this task".to_string());
            None
        }
    }

    pub fn deleted(&mut self, id: u64, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                if let Some(tasks) = self.tasks.ready_mut() {
                    tasks.retain(|t| t.id != id);
                    self.selected = self.selected.min(tasks.len().saturating_sub(1));
                }
                self.status = Some("Task deleted".to_string());
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }
}
