use chrono::{Duration, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::account::AccountView;
use crate::auth_forms::{Form, LoginForm, RegisterForm};
use crate::create_task::{Back, CreateTaskWizard, Step};
use crate::error::ApiError;
use crate::my_tasks::MyTasksView;
use crate::session::{Route, Session};
use crate::task::{Task, TaskDraft};
use crate::task_detail::TaskDetailView;
use crate::task_list::TaskListView;
use crate::user::{Credentials, Registration, User};

const MAX_HISTORY: usize = 32;

/// Work for the HTTP side. Each request produces exactly one [`Reply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ProbeSession,
    ListTasks,
    TaskDetail(u64),
    CreateTask(TaskDraft),
    MyTasks,
    DeleteTask(u64),
    Account,
    Login(Credentials),
    Register(Registration),
    Logout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Session(bool),
    Tasks(Result<Vec<Task>, ApiError>),
    TaskDetail(Result<Option<Task>, ApiError>),
    Created(Result<Option<u64>, ApiError>),
    MyTasks(Result<Vec<Task>, ApiError>),
    Deleted(u64, Result<(), ApiError>),
    Account(Result<User, ApiError>),
    LoggedIn(Result<(), ApiError>),
    Registered(Result<(), ApiError>),
    LoggedOut(Result<(), ApiError>),
}

impl Reply {
    /// Session replies apply whenever they arrive; everything else belongs to
    /// the screen that asked for it.
    fn is_view_scoped(&self) -> bool {
        !matches!(
            self,
            Reply::Session(_) | Reply::LoggedIn(_) | Reply::Registered(_) | Reply::LoggedOut(_)
        )
    }
}

/// A request stamped with the navigation generation it was issued in.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub generation: u64,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub generation: u64,
    pub reply: Reply,
}

#[derive(Debug)]
pub enum Screen {
    Home(TaskListView),
    Detail(TaskDetailView),
    Create(CreateTaskWizard),
    MyTasks(MyTasksView),
    Account(AccountView),
}

#[derive(Debug)]
pub enum Modal {
    Login(LoginForm),
    Register(RegisterForm),
}

impl Modal {
    pub fn form(&self) -> &Form {
        match self {
            Modal::Login(login) => &login.form,
            Modal::Register(reg) => &reg.form,
        }
    }

    fn form_mut(&mut self) -> &mut Form {
        match self {
            Modal::Login(login) => &mut login.form,
            Modal::Register(reg) => &mut reg.form,
        }
    }
}

/// Top-level state: the current screen, the session flag and any open
/// dialog. Only the UI thread touches it.
#[derive(Debug)]
pub struct App {
    pub route: Route,
    pub screen: Screen,
    pub session: Session,
    pub modal: Option<Modal>,
    pub generation: u64,
    pub should_quit: bool,
    history: Vec<Route>,
    /// A protected route asked for before the probe answered.
    pending_route: Option<Route>,
    outbox: Vec<Command>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            route: Route::Home,
            screen: Screen::Home(TaskListView::new()),
            session: Session::default(),
            modal: None,
            generation: 0,
            should_quit: false,
            history: Vec::new(),
            pending_route: None,
            outbox: Vec::new(),
        }
    }

    /// Kicks off the session probe and opens `initial`. The probe and the
    /// first page load race each other.
    pub fn start(&mut self, initial: Route) {
        self.send(Request::ProbeSession);
        self.enter(initial);
    }

    pub fn take_requests(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    fn send(&mut self, request: Request) {
        self.outbox.push(Command {
            generation: self.generation,
            request,
        });
    }

    /// User-initiated navigation; remembered for going back. A redirect that
    /// lands on the current route leaves the history alone.
    pub fn navigate(&mut self, route: Route) {
        self.pending_route = None;
        let from = self.route;
        self.enter(route);
        if self.route != from && self.history.last() != Some(&from) {
            self.history.push(from);
            if self.history.len() > MAX_HISTORY {
                self.history.remove(0);
            }
        }
    }

    pub fn go_back(&mut self) {
        let previous = self.history.pop().unwrap_or(Route::Home);
        self.enter(previous);
    }

    /// Re-enters the current route, which re-issues its fetch.
    pub fn refresh(&mut self) {
        self.enter(self.route);
    }

    fn enter(&mut self, requested: Route) {
        let mut requested = requested;
        if requested.is_protected() && !self.session.is_probed() {
            debug!(route = %requested, "holding route until the session probe answers");
            self.pending_route = Some(requested);
            requested = Route::Home;
        }
        let route = self.session.resolve(requested);
        if route != requested {
            info!(requested = %requested, "not signed in; redirecting home");
        }

        self.generation += 1;
        self.route = route;
        info!(route = %route, generation = self.generation, "navigate");

        self.screen = match route {
            Route::Home => {
                self.send(Request::ListTasks);
                Screen::Home(TaskListView::new())
            }
            Route::TaskDetail(id) => {
                self.send(Request::TaskDetail(id));
                Screen::Detail(TaskDetailView::new(id))
            }
            Route::CreateTask => Screen::Create(CreateTaskWizard::new(Utc::now())),
            Route::MyTasks => {
                self.send(Request::MyTasks);
                Screen::MyTasks(MyTasksView::new())
            }
            Route::Account => {
                self.send(Request::Account);
                Screen::Account(AccountView::new())
            }
        };
    }

    pub fn open_login(&mut self, email: &str) {
        self.modal = Some(Modal::Login(LoginForm::new(email)));
    }

    pub fn open_register(&mut self) {
        self.modal = Some(Modal::Register(RegisterForm::new()));
    }

    /// Signs out locally right away; the server call is fire-and-forget.
    pub fn logout(&mut self) {
        self.session.logout();
        self.send(Request::Logout);
        if self.route.is_protected() {
            self.history.clear();
            self.enter(Route::Home);
        }
    }

    pub fn apply(&mut self, envelope: Envelope) {
        let Envelope { generation, reply } = envelope;
        if reply.is_view_scoped() && generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "dropping reply for a screen that is gone"
            );
            return;
        }

        match reply {
            Reply::Session(signed_in) => {
                if self.session.is_probed() {
                    debug!(signed_in, "session already decided; probe ignored");
                    self.pending_route = None;
                    return;
                }
                info!(signed_in, "session probe answered");
                self.session.probed(signed_in);
                if let Some(route) = self.pending_route.take() {
                    if signed_in {
                        self.navigate(route);
                    }
                }
            }
            Reply::LoggedIn(result) => match result {
                Ok(()) => {
                    info!("logged in");
                    self.session.login();
                    self.modal = None;
                }
                Err(err) => {
                    if let Some(Modal::Login(form)) = &mut self.modal {
                        form.failed(&err);
                    }
                }
            },
            Reply::Registered(result) => {
                if let Some(Modal::Register(form)) = &mut self.modal {
                    match result {
                        Ok(()) => form.succeeded(),
                        Err(err) => form.failed(&err),
                    }
                }
            }
            Reply::LoggedOut(result) => {
                if let Err(err) = result {
                    warn!(error = %err, "logout request failed");
                }
            }
            Reply::Created(result) => match result {
                Ok(Some(id)) => {
                    info!(id, "task created");
                    self.enter(Route::TaskDetail(id));
                }
                Ok(None) => {
                    info!("task created; server sent no id");
                    self.enter(Route::MyTasks);
                }
                Err(err) => {
                    if let Screen::Create(wizard) = &mut self.screen {
                        wizard.submit_failed(&err);
                    }
                }
            },
            reply => self.apply_to_screen(reply),
        }
    }

    fn apply_to_screen(&mut self, reply: Reply) {
        match (&mut self.screen, reply) {
            (Screen::Home(view), Reply::Tasks(result)) => view.loaded(result),
            (Screen::Detail(view), Reply::TaskDetail(result)) => view.loaded(result),
            (Screen::MyTasks(view), Reply::MyTasks(result)) => view.loaded(result),
            (Screen::MyTasks(view), Reply::Deleted(id, result)) => view.deleted(id, result),
            (Screen::Account(view), Reply::Account(result)) => view.loaded(result),
            (_, reply) => debug!(?reply, "reply does not match the current screen"),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.modal.is_some() {
            self.handle_modal_key(key);
            return;
        }
        if self.captures_text() {
            self.handle_text_key(key);
            return;
        }
        if self.handle_global_key(key) {
            return;
        }
        self.handle_screen_key(key);
    }

    /// Screens that want every printable key.
    fn captures_text(&self) -> bool {
        match &self.screen {
            Screen::Create(_) => true,
            Screen::Home(view) => view.searching,
            _ => false,
        }
    }

    fn handle_global_key(&mut self, key: KeyEvent) -> bool {
        let signed_in = self.session.authenticated();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('h') => self.navigate(Route::Home),
            KeyCode::Char('c') => self.navigate(Route::CreateTask),
            KeyCode::Char('m') => self.navigate(Route::MyTasks),
            KeyCode::Char('a') => self.navigate(Route::Account),
            KeyCode::Char('R') | KeyCode::F(5) => self.refresh(),
            KeyCode::Char('l') if !signed_in => self.open_login(""),
            KeyCode::Char('r') if !signed_in => self.open_register(),
            KeyCode::Char('o') if signed_in => self.logout(),
            KeyCode::Esc | KeyCode::Backspace if self.route != Route::Home => self.go_back(),
            _ => return false,
        }
        true
    }

    fn handle_screen_key(&mut self, key: KeyEvent) {
        let mut open = None;
        let mut delete = None;
        match &mut self.screen {
            Screen::Home(view) => match key.code {
                KeyCode::Up | KeyCode::Char('k') => view.move_selection(-1),
                KeyCode::Down | KeyCode::Char('j') => view.move_selection(1),
                KeyCode::Left => view.cycle_category(-1),
                KeyCode::Right | KeyCode::Tab => view.cycle_category(1),
                KeyCode::Char('/') => view.searching = true,
                KeyCode::Enter => open = view.selected_task().map(|t| t.id),
                _ => {}
            },
            Screen::MyTasks(view) => match key.code {
                KeyCode::Up | KeyCode::Char('k') => view.move_selection(-1),
                KeyCode::Down | KeyCode::Char('j') => view.move_selection(1),
                KeyCode::Char('d') => delete = view.request_delete(),
                KeyCode::Enter => open = view.selected_task().map(|t| t.id),
                _ => {}
            },
            Screen::Detail(_) | Screen::Account(_) | Screen::Create(_) => {}
        }
        if let Some(id) = open {
            self.navigate(Route::TaskDetail(id));
        }
        if let Some(id) = delete {
            info!(id, "deleting task");
            self.send(Request::DeleteTask(id));
        }
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        let mut submit = None;
        let mut exit = false;
        match &mut self.screen {
            Screen::Home(view) => match key.code {
                KeyCode::Enter | KeyCode::Esc => view.searching = false,
                KeyCode::Backspace => view.pop_query(),
                KeyCode::Char(c) => view.push_query(c),
                _ => {}
            },
            Screen::Create(wizard) => {
                let now = Utc::now();
                match (wizard.step, key.code) {
                    (_, KeyCode::Esc) => exit = wizard.back() == Back::Exit,
                    (Step::Deadline, KeyCode::Enter) => submit = wizard.begin_submit(),
                    (_, KeyCode::Enter) => {
                        wizard.next();
                    }
                    (Step::Details, KeyCode::Tab | KeyCode::BackTab) => wizard.toggle_field(),
                    (Step::Category, KeyCode::Left | KeyCode::Up) => {
                        wizard.move_category_cursor(-1)
                    }
                    (Step::Category, KeyCode::Right | KeyCode::Down) => {
                        wizard.move_category_cursor(1)
                    }
                    (Step::Category, KeyCode::Char(' ')) => wizard.toggle_category(),
                    (Step::Deadline, KeyCode::Up) => wizard.shift_deadline(Duration::days(1), now),
                    (Step::Deadline, KeyCode::Down) => {
                        wizard.shift_deadline(Duration::days(-1), now)
                    }
                    (Step::Deadline, KeyCode::Right) => {
                        wizard.shift_deadline(Duration::hours(1), now)
                    }
                    (Step::Deadline, KeyCode::Left) => {
                        wizard.shift_deadline(Duration::hours(-1), now)
                    }
                    (_, KeyCode::Backspace) => wizard.backspace(),
                    (_, KeyCode::Char(c)) => wizard.type_char(c),
                    _ => {}
                }
            }
            _ => {}
        }
        if exit {
            self.go_back();
        }
        if let Some(draft) = submit {
            info!(title = %draft.title, "submitting new task");
            self.send(Request::CreateTask(draft));
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };

        if let Modal::Register(reg) = modal {
            if reg.success {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    let email = reg.email();
                    self.open_login(&email);
                }
                return;
            }
        }

        match key.code {
            KeyCode::Esc => self.modal = None,
            KeyCode::Enter => {
                let request = match modal {
                    Modal::Login(login) => login.submit().map(Request::Login),
                    Modal::Register(reg) => reg.submit().map(Request::Register),
                };
                if let Some(request) = request {
                    self.send(request);
                }
            }
            code => {
                let form = modal.form_mut();
                match code {
                    KeyCode::Tab | KeyCode::Down => form.move_focus(1),
                    KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
                    KeyCode::Backspace => form.backspace(),
                    KeyCode::Char(c) => form.type_char(c),
                    _ => {}
                }
            }
        }
    }
}
