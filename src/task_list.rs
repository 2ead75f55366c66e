use crate::error::ApiError;
use crate::remote::Remote;
use crate::task::{Category, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Sidebar order.
    pub const CHOICES: [CategoryFilter; 8] = [
        CategoryFilter::All,
        CategoryFilter::Only(Category::Design),
        CategoryFilter::Only(Category::Web),
        CategoryFilter::Only(Category::Text),
        CategoryFilter::Only(Category::Video),
        CategoryFilter::Only(Category::Image),
        CategoryFilter::Only(Category::Programming),
        CategoryFilter::Only(Category::Other),
    ];

    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(c) => c.as_str(),
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => task.category == c.as_str(),
        }
    }
}

fn matches_query(task: &Task, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty()
        || task.title.to_lowercase().contains(&query)
        || task.description.to_lowercase().contains(&query)
}

/// The rows shown for a category and keyword query. Pure: same input, same
/// output, fetched order preserved.
pub fn filter_tasks<'a>(tasks: &'a [Task], category: CategoryFilter, query: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| category.matches(t))
        .filter(|t| matches_query(t, query))
        .collect()
}

/// Home screen: every open task on the marketplace.
#[derive(Debug, Default)]
pub struct TaskListView {
    pub tasks: Remote<Vec<Task>>,
    pub category: usize,
    pub query: String,
    pub searching: bool,
    pub selected: usize,
}

impl TaskListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&mut self, result: Result<Vec<Task>, ApiError>) {
        self.tasks = Remote::from_result(result);
        self.clamp_selection();
    }

    pub fn filter(&self) -> CategoryFilter {
        CategoryFilter::CHOICES[self.category]
    }

    pub fn visible(&self) -> Vec<&Task> {
        match self.tasks.ready() {
            Some(tasks) => filter_tasks(tasks, self.filter(), &self.query),
            None => Vec::new(),
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible().get(self.selected).copied()
    }

    pub fn empty_message(&self) -> String {
        format!("No tasks found in the \"{}\" category", self.filter().label())
    }

    pub fn cycle_category(&mut self, direction: isize) {
        let len = CategoryFilter::CHOICES.len() as isize;
        self.category = (self.category as isize + direction).rem_euclid(len) as usize;
        self.selected = 0;
    }

    pub fn select_category(&mut self, filter: CategoryFilter) {
        if let Some(i) = CategoryFilter::CHOICES.iter().position(|c| *c == filter) {
            self.category = i;
            self.selected = 0;
        }
    }

    pub fn move_selection(&mut self, direction: isize) {
        let max = self.visible().len().saturating_sub(1) as isize;
        self.selected = (self.selected as isize + direction).clamp(0, max) as usize;
    }

    pub fn push_query(&mut self, c: char) {
        self.query.push(c);
        self.selected = 0;
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.selected = 0;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::User;
    use chrono::Utc;

    fn task(id: u64, category: &str, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: format!("details for {title}"),
            category: category.to_string(),
            price: "10".to_string(),
            expires_at: Utc::now(),
            created_at: None,
            is_completed: false,
            creator: User::default(),
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task(1, "web", "Shop front"),
            task(2, "design", "Logo"),
            task(3, "web", "Blog"),
            task(4, "cooking", "Soup"),
        ]
    }

    #[test]
    fn all_shows_the_full_set() {
        let tasks = sample();
        assert_eq!(filter_tasks(&tasks, CategoryFilter::All, "").len(), 4);
    }

    #[test]
    fn category_selects_exact_matches_in_fetched_order() {
        let tasks = sample();
        for filter in CategoryFilter::CHOICES {
            let shown = filter_tasks(&tasks, filter, "");
            let expected: Vec<&Task> = tasks.iter().filter(|t| filter.matches(t)).collect();
            assert_eq!(shown, expected);
        }
        let ids: Vec<u64> = filter_tasks(&tasks, CategoryFilter::Only(Category::Web), "")
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn unknown_category_only_shows_under_all() {
        let tasks = sample();
        let everywhere: usize = CategoryFilter::CHOICES[1..]
            .iter()
            .map(|f| filter_tasks(&tasks, *f, "").iter().filter(|t| t.id == 4).count())
            .sum();
        assert_eq!(everywhere, 0);
    }

    #[test]
    fn keyword_narrows_case_insensitively() {
        let tasks = sample();
        let shown = filter_tasks(&tasks, CategoryFilter::Only(Category::Web), "BLOG");
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, 3);
        assert_eq!(filter_tasks(&tasks, CategoryFilter::All, "details").len(), 4);
    }

    #[test]
    fn design_filter_over_web_only_list_is_empty() {
        let mut view = TaskListView::new();
        view.loaded(Ok(vec![task(1, "web", "Shop front")]));
        view.select_category(CategoryFilter::Only(Category::Design));
        assert!(view.visible().is_empty());
        assert!(view.selected_task().is_none());
        assert_eq!(view.empty_message(), "No tasks found in the \"design\" category");
    }

    #[test]
    fn changing_filter_does_not_touch_fetched_tasks() {
        let mut view = TaskListView::new();
        view.loaded(Ok(sample()));
        let before = view.tasks.clone();
        view.cycle_category(1);
        view.cycle_category(-2);
        assert_eq!(view.tasks, before);
        assert_eq!(view.filter(), CategoryFilter::Only(Category::Other));
    }

    #[test]
    fn selection_stays_inside_visible_rows() {
        let mut view = TaskListView::new();
        view.loaded(Ok(sample()));
        view.move_selection(10);
        assert_eq!(view.selected, 3);
        view.move_selection(-10);
        assert_eq!(view.selected, 0);
        view.move_selection(1);
        assert_eq!(view.selected_task().map(|t| t.id), Some(2));
    }

    #[test]
    fn failed_fetch_keeps_the_message() {
        let mut view = TaskListView::new();
        view.loaded(Err(ApiError::Status {
            status: 502,
            message: None,
        }));
        assert_eq!(view.tasks, Remote::Failed("HTTP error! status: 502".into()));
        assert!(view.visible().is_empty());
    }
}
