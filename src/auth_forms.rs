use crate::error::ApiError;
use crate::user::{Credentials, Registration};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match";
pub const FIELDS_REQUIRED: &str = "Please fill in all fields";
pub const REGISTERED: &str = "Success! Please verify your email";

/// A labelled single-line input.
#[derive(Debug, Clone, Default)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
}

impl Field {
    fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: false,
        }
    }

    fn secret(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: true,
        }
    }

    /// What the screen shows: secrets are masked.
    pub fn display(&self) -> String {
        if self.secret {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// Focus, typing and the error line shared by both dialogs.
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
    pub error: Option<String>,
    pub pending: bool,
}

impl Form {
    fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            focus: 0,
            error: None,
            pending: false,
        }
    }

    pub fn type_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    pub fn move_focus(&mut self, direction: isize) {
        let len = self.fields.len() as isize;
        self.focus = (self.focus as isize + direction).rem_euclid(len) as usize;
    }

    fn value(&self, i: usize) -> String {
        self.fields[i].value.clone()
    }

    fn all_filled(&self) -> bool {
        self.fields.iter().all(|f| !f.value.trim().is_empty())
    }

    /// Common gate: nothing while a request is out, and every field filled.
    fn ready_to_send(&mut self) -> bool {
        if self.pending {
            return false;
        }
        if !self.all_filled() {
            self.error = Some(FIELDS_REQUIRED.to_string());
            return false;
        }
        self.error = None;
        true
    }

    fn failed(&mut self, err: &ApiError, fallback: &str) {
        self.pending = false;
        self.error = Some(err.message_or(fallback));
    }
}

const EMAIL: usize = 0;
const PASSWORD: usize = 1;

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub form: Form,
}

impl LoginForm {
    pub fn new(email: &str) -> Self {
        let mut form = Form::new(vec![Field::text("Email"), Field::secret("Password")]);
        form.fields[EMAIL].value = email.to_string();
        if !email.is_empty() {
            form.focus = PASSWORD;
        }
        Self { form }
    }

    pub fn submit(&mut self) -> Option<Credentials> {
        if !self.form.ready_to_send() {
            return None;
        }
        self.form.pending = true;
        Some(Credentials {
            email: self.form.value(EMAIL).trim().to_string(),
            password: self.form.value(PASSWORD),
        })
    }

    pub fn failed(&mut self, err: &ApiError) {
        self.form.failed(err, LOGIN_FAILED);
    }
}

const REG_NAME: usize = 0;
const REG_EMAIL: usize = 1;
const REG_PASSWORD: usize = 2;
const REG_CONFIRM: usize = 3;

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub form: Form,
    /// Set once the server accepted the registration; the dialog then only
    /// waits to be dismissed.
    pub success: bool,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterForm {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::text("Name"),
                Field::text("Email"),
                Field::secret("Password"),
                Field::secret("Repeat password"),
            ]),
            success: false,
        }
    }

    /// The registration to POST. Mismatched passwords never leave the form.
    pub fn submit(&mut self) -> Option<Registration> {
        if self.success || !self.form.ready_to_send() {
            return None;
        }
        if self.form.value(REG_PASSWORD) != self.form.value(REG_CONFIRM) {
            self.form.error = Some(PASSWORDS_DIFFER.to_string());
            return None;
        }
        self.form.pending = true;
        Some(Registration {
            name: self.form.value(REG_NAME).trim().to_string(),
            email: self.form.value(REG_EMAIL).trim().to_string(),
            password: self.form.value(REG_PASSWORD),
        })
    }

    pub fn succeeded(&mut self) {
        self.form.pending = false;
        self.form.error = None;
        self.success = true;
    }

    pub fn failed(&mut self, err: &ApiError) {
        self.form.failed(err, REGISTRATION_FAILED);
    }

    pub fn email(&self) -> String {
        self.form.value(REG_EMAIL).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(form: &mut Form, values: &[&str]) {
        for (i, v) in values.iter().enumerate() {
            form.focus = i;
            v.chars().for_each(|c| form.type_char(c));
        }
    }

    #[test]
    fn mismatched_passwords_never_produce_a_request() {
        let mut reg = RegisterForm::new();
        fill(&mut reg.form, &["Ann", "ann@example.com", "hunter22", "hunter23"]);
        assert!(reg.submit().is_none());
        assert!(!reg.form.pending);
        assert_eq!(reg.form.error.as_deref(), Some(PASSWORDS_DIFFER));
    }

    #[test]
    fn matching_passwords_produce_a_registration() {
        let mut reg = RegisterForm::new();
        fill(&mut reg.form, &["Ann", " ann@example.com ", "pw", "pw"]);
        let sent = reg.submit().unwrap();
        assert_eq!(
            sent,
            Registration {
                name: "Ann".into(),
                email: "ann@example.com".into(),
                password: "pw".into(),
            }
        );
        assert!(reg.form.pending);
        assert!(reg.submit().is_none());
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut login = LoginForm::new("");
        assert!(login.submit().is_none());
        assert_eq!(login.form.error.as_deref(), Some(FIELDS_REQUIRED));
    }

    #[test]
    fn login_failure_shows_server_message_or_fallback() {
        let mut login = LoginForm::new("ann@example.com");
        assert_eq!(login.form.focus, PASSWORD);
        login.form.type_char('x');
        assert!(login.submit().is_some());

        login.failed(&ApiError::Status {
            status: 401,
            message: Some("Invalid password".into()),
        });
        assert_eq!(login.form.error.as_deref(), Some("Invalid password"));
        assert!(!login.form.pending);

        login.failed(&ApiError::Status {
            status: 500,
            message: None,
        });
        assert_eq!(login.form.error.as_deref(), Some(LOGIN_FAILED));
    }

    #[test]
    fn secrets_are_masked() {
        let mut login = LoginForm::new("");
        login.form.focus = PASSWORD;
        "abc".chars().for_each(|c| login.form.type_char(c));
        assert_eq!(login.form.fields[PASSWORD].display(), "•••");
    }

    #[test]
    fn focus_wraps() {
        let mut reg = RegisterForm::new();
        reg.form.move_focus(-1);
        assert_eq!(reg.form.focus, REG_CONFIRM);
        reg.form.move_focus(1);
        assert_eq!(reg.form.focus, REG_NAME);
    }
}
