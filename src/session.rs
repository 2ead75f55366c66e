use std::fmt;

/// Where the user is. Mirrors the web front-end's paths so a route can be
/// named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    TaskDetail(u64),
    CreateTask,
    MyTasks,
    Account,
}

impl Route {
    /// Routes that need a signed-in user.
    pub fn is_protected(self) -> bool {
        matches!(self, Route::CreateTask | Route::MyTasks | Route::Account)
    }

    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_matches('/');
        let parts: Vec<&str> = trimmed.split('/').filter(|p| !p.is_empty()).collect();
        match parts.as_slice() {
            [] => Some(Route::Home),
            ["tasks", id] => id.parse().ok().map(Route::TaskDetail),
            ["create-task"] => Some(Route::CreateTask),
            ["me", "tasks"] => Some(Route::MyTasks),
            ["account"] => Some(Route::Account),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::TaskDetail(id) => write!(f, "/tasks/{id}"),
            Route::CreateTask => write!(f, "/create-task"),
            Route::MyTasks => write!(f, "/me/tasks"),
            Route::Account => write!(f, "/account"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AuthState {
    #[default]
    Unknown,
    SignedIn,
    SignedOut,
}

/// Whether the server considers us signed in.
///
/// Nothing is stored locally; the flag is rebuilt from the probe on every
/// launch and afterwards only flipped by login and logout.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: AuthState,
}

impl Session {
    pub fn authenticated(&self) -> bool {
        self.state == AuthState::SignedIn
    }

    pub fn is_probed(&self) -> bool {
        self.state != AuthState::Unknown
    }

    pub fn probed(&mut self, signed_in: bool) {
        self.state = if signed_in {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        };
    }

    pub fn login(&mut self) {
        self.state = AuthState::SignedIn;
    }

    pub fn logout(&mut self) {
        self.state = AuthState::SignedOut;
    }

    /// The route actually shown for `requested`: protected routes send a
    /// signed-out visitor home.
    pub fn resolve(&self, requested: Route) -> Route {
        if requested.is_protected() && !self.authenticated() {
            Route::Home
        } else {
            requested
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_probe_gates_protected_routes() {
        let mut session = Session::default();
        session.probed(false);
        assert!(!session.authenticated());
        for route in [Route::CreateTask, Route::MyTasks, Route::Account] {
            assert_eq!(session.resolve(route), Route::Home);
        }
        assert_eq!(session.resolve(Route::TaskDetail(4)), Route::TaskDetail(4));
    }

    #[test]
    fn unprobed_session_is_not_authenticated() {
        let session = Session::default();
        assert!(!session.is_probed());
        assert_eq!(session.resolve(Route::Account), Route::Home);
    }

    #[test]
    fn login_and_logout_flip_the_flag() {
        let mut session = Session::default();
        session.login();
        assert_eq!(session.resolve(Route::MyTasks), Route::MyTasks);
        session.logout();
        assert_eq!(session.resolve(Route::MyTasks), Route::Home);
    }

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::Home,
            Route::TaskDetail(12),
            Route::CreateTask,
            Route::MyTasks,
            Route::Account,
        ] {
            assert_eq!(Route::parse(&route.to_string()), Some(route));
        }
        assert_eq!(Route::parse("/tasks/12/"), Some(Route::TaskDetail(12)));
        assert_eq!(Route::parse("/tasks/abc"), None);
        assert_eq!(Route::parse("/admin"), None);
    }
}
