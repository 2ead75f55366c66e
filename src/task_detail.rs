use crate::error::ApiError;
use crate::remote::Remote;
use crate::task::Task;

/// One task, fetched by the id in the route.
#[derive(Debug)]
pub struct TaskDetailView {
    pub id: u64,
    /// `Ready(None)` is the not-found state.
    pub task: Remote<Option<Task>>,
}

impl TaskDetailView {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            task: Remote::Loading,
        }
    }

    pub fn loaded(&mut self, result: Result<Option<Task>, ApiError>) {
        self.task = Remote::from_result(result);
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.task, Remote::Ready(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::task_from;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "id": 5,
            "title": "Translate a menu",
            "description": "EN to DE",
            "is_completed": true,
            "created_at": "2025-03-01T10:00:00Z",
            "expires_at": "2025-03-09T10:00:00Z",
            "category": "text",
            "price": "25.00",
            "creator": {"id": 2, "name": "Kai", "email": "kai@example.com", "rating": 4}
        })
    }

    #[test]
    fn both_response_shapes_render_the_same_detail() {
        let mut bare = TaskDetailView::new(5);
        bare.loaded(task_from(payload()));
        let mut wrapped = TaskDetailView::new(5);
        wrapped.loaded(task_from(json!({ "task": payload() })));

        assert_eq!(bare.task, wrapped.task);
        let task = bare.task.ready().and_then(Option::as_ref).unwrap();
        assert_eq!(task.title, "Translate a menu");
        assert_eq!(task.status_label(), "Completed");
    }

    #[test]
    fn loading_not_found_and_error_are_distinct() {
        let mut view = TaskDetailView::new(1);
        assert!(view.task.is_loading());

        view.loaded(Ok(None));
        assert!(view.is_not_found());

        view.loaded(Err(ApiError::Network("connection refused".into())));
        assert!(!view.is_not_found());
        assert_eq!(view.task, Remote::Failed("connection refused".into()));
    }
}
