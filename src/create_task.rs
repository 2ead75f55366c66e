use chrono::{DateTime, Duration, Utc};

use crate::error::ApiError;
use crate::task::{is_numeric_price, Category, TaskDraft};

pub const CREATE_FAILED: &str = "Failed to create task";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Title,
    Category,
    Details,
    Deadline,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Title, Step::Category, Step::Details, Step::Deadline];

    pub fn number(self) -> usize {
        match self {
            Step::Title => 1,
            Step::Category => 2,
            Step::Details => 3,
            Step::Deadline => 4,
        }
    }

    fn next(self) -> Option<Step> {
        match self {
            Step::Title => Some(Step::Category),
            Step::Category => Some(Step::Details),
            Step::Details => Some(Step::Deadline),
            Step::Deadline => None,
        }
    }

    fn prev(self) -> Option<Step> {
        match self {
            Step::Title => None,
            Step::Category => Some(Step::Title),
            Step::Details => Some(Step::Category),
            Step::Deadline => Some(Step::Details),
        }
    }
}

/// Which input has focus on the description + price step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailsField {
    #[default]
    Description,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Back {
    Stepped,
    /// Back on the first step leaves the wizard.
    Exit,
}

/// Step rules, checked against the draft alone.
pub fn validate(step: Step, draft: &TaskDraft) -> Result<(), &'static str> {
    match step {
        Step::Title if draft.title.trim().is_empty() => Err("Please enter a title"),
        Step::Category if draft.category.trim().is_empty() => Err("Please select a category"),
        Step::Details if draft.description.trim().is_empty() => Err("Please enter a description"),
        Step::Details if !is_numeric_price(&draft.price) => Err("Please enter a valid price"),
        _ => Ok(()),
    }
}

/// Four-step create flow: title, category, description + price, deadline.
#[derive(Debug)]
pub struct CreateTaskWizard {
    pub step: Step,
    pub draft: TaskDraft,
    pub field: DetailsField,
    pub category_cursor: usize,
    pub error: Option<String>,
    pub submitting: bool,
}

impl CreateTaskWizard {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            step: Step::Title,
            draft: TaskDraft::new(now),
            field: DetailsField::default(),
            category_cursor: 0,
            error: None,
            submitting: false,
        }
    }

    fn check(&mut self, step: Step) -> bool {
        match validate(step, &self.draft) {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(msg) => {
                self.error = Some(msg.to_string());
                false
            }
        }
    }

    /// Advances one step if the current one validates. Returns whether the
    /// step changed.
    pub fn next(&mut self) -> bool {
        if !self.check(self.step) {
            return false;
        }
        match self.step.next() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> Back {
        match self.step.prev() {
            Some(step) => {
                self.step = step;
                self.error = None;
                Back::Stepped
            }
            None => Back::Exit,
        }
    }

    /// Hands out the draft to POST, or `None` when validation blocks it or a
    /// submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<TaskDraft> {
        if self.submitting || self.step != Step::Deadline {
            return None;
        }
        if !self.check(Step::Deadline) || !self.check(Step::Details) {
            return None;
        }
        self.submitting = true;
        Some(self.draft.clone())
    }

    pub fn submit_failed(&mut self, err: &ApiError) {
        self.submitting = false;
        self.error = Some(err.message_or(CREATE_FAILED));
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match (self.step, self.field) {
            (Step::Title, _) => Some(&mut self.draft.title),
            (Step::Details, DetailsField::Description) => Some(&mut self.draft.description),
            (Step::Details, DetailsField::Price) => Some(&mut self.draft.price),
            _ => None,
        }
    }

    pub fn type_char(&mut self, c: char) {
        if let Some(text) = self.focused_text() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            DetailsField::Description => DetailsField::Price,
            DetailsField::Price => DetailsField::Description,
        };
    }

    pub fn move_category_cursor(&mut self, direction: isize) {
        let len = Category::ALL.len() as isize;
        self.category_cursor = (self.category_cursor as isize + direction).rem_euclid(len) as usize;
    }

    /// Selects the highlighted category, or clears it if it already is the
    /// selection.
    pub fn toggle_category(&mut self) {
        let picked = Category::ALL[self.category_cursor].as_str();
        if self.draft.category == picked {
            self.draft.category.clear();
        } else {
            self.draft.category = picked.to_string();
        }
    }

    /// Moves the deadline, never to less than an hour from `now`.
    pub fn shift_deadline(&mut self, delta: Duration, now: DateTime<Utc>) {
        let earliest = now + Duration::hours(1);
        self.draft.expires_at = (self.draft.expires_at + delta).max(earliest);
    }
}
