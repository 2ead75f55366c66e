use crate::error::ApiError;
use crate::remote::Remote;
use crate::user::User;

pub const NO_ABOUT: &str = "No information provided";

/// The signed-in user's profile. Fetched once on entry, never edited.
#[derive(Debug, Default)]
pub struct AccountView {
    pub user: Remote<User>,
}

impl AccountView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&mut self, result: Result<User, ApiError>) {
        self.user = Remote::from_result(result);
    }

    pub fn about(user: &User) -> &str {
        user.about_me
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NO_ABOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn about_falls_back_when_blank() {
        let mut user = User::default();
        assert_eq!(AccountView::about(&user), NO_ABOUT);
        user.about_me = Some("  ".into());
        assert_eq!(AccountView::about(&user), NO_ABOUT);
        user.about_me = Some("Backend dev".into());
        assert_eq!(AccountView::about(&user), "Backend dev");
    }

    #[test]
    fn unauthorized_profile_fetch_is_an_error_state() {
        let mut view = AccountView::new();
        view.loaded(Err(ApiError::Status {
            status: 401,
            message: Some("Unauthorized".into()),
        }));
        assert_eq!(view.user, Remote::Failed("Unauthorized".into()));
    }
}
