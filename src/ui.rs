use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::account::AccountView;
use crate::app::{App, Envelope, Modal, Screen};
use crate::auth_forms::REGISTERED;
use crate::create_task::{CreateTaskWizard, DetailsField, Step};
use crate::dispatch::Dispatcher;
use crate::my_tasks::{MyTasksView, NO_TASKS};
use crate::remote::Remote;
use crate::task::{category_icon, format_when, Category, Task};
use crate::task_detail::TaskDetailView;
use crate::task_list::{CategoryFilter, TaskListView};
use crate::user::User;

const ACCENT: Color = Color::Cyan;

/// Draw, apply replies, read one key, repeat. Returns when the user quits.
pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    dispatcher: &Dispatcher,
    replies: &mut UnboundedReceiver<Envelope>,
    tick_rate: Duration,
) -> io::Result<()> {
    loop {
        for command in app.take_requests() {
            dispatcher.dispatch(command);
        }
        while let Ok(envelope) = replies.try_recv() {
            app.apply(envelope);
        }

        terminal.draw(|f| draw(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    match &app.screen {
        Screen::Home(view) => draw_home(f, view, chunks[1]),
        Screen::Detail(view) => draw_detail(f, view, chunks[1]),
        Screen::Create(wizard) => draw_wizard(f, wizard, chunks[1]),
        Screen::MyTasks(view) => draw_my_tasks(f, view, chunks[1]),
        Screen::Account(view) => draw_account(f, view, chunks[1]),
    }
    draw_footer(f, app, chunks[2]);

    if let Some(modal) = &app.modal {
        draw_modal(f, modal);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(ACCENT));
    let mut spans = vec![
        key("h"),
        Span::raw(" Find a Task  "),
        key("c"),
        Span::raw(" Create a Task  "),
        key("m"),
        Span::raw(" My Tasks  "),
        key("a"),
        Span::raw(" Account    "),
    ];
    if app.session.authenticated() {
        spans.push(Span::styled("● signed in  ", Style::default().fg(Color::Green)));
        spans.push(key("o"));
        spans.push(Span::raw(" Log out"));
    } else {
        spans.push(key("l"));
        spans.push(Span::raw(" Log in  "));
        spans.push(key("r"));
        spans.push(Span::raw(" Get started"));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(Span::styled(
                " trivial ",
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL),
    );
    f.render_widget(header, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hint = if app.modal.is_some() {
        "Tab next field · Enter submit · Esc close"
    } else {
        match &app.screen {
            Screen::Home(view) if view.searching => "type to search · Enter/Esc done",
            Screen::Home(_) => {
                "↑↓ select · ←→ category · / search · Enter open · R refresh · q quit"
            }
            Screen::Detail(_) => "Esc back · R refresh · q quit",
            Screen::Create(_) => "Enter next · Esc back",
            Screen::MyTasks(_) => "↑↓ select · Enter open · d delete · Esc back · q quit",
            Screen::Account(_) => "m My Tasks · c Create New Task · Esc back · q quit",
        }
    };
    f.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn status_paragraph<'a>(text: String, color: Color) -> Paragraph<'a> {
    Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL))
}

fn error_text(msg: &str) -> String {
    format!("Error: {msg}")
}

fn rating_spans(user: &User) -> Vec<Span<'static>> {
    vec![
        Span::styled(user.stars(), Style::default().fg(Color::Yellow)),
        Span::styled(
            format!(" ({})", user.rating),
            Style::default().fg(Color::DarkGray),
        ),
    ]
}

fn task_item(task: &Task, show_status: bool) -> ListItem<'static> {
    let mut heading = vec![
        Span::raw(format!("{} ", category_icon(&task.category))),
        Span::styled(
            task.title.clone(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {} $", task.price)),
    ];
    if show_status {
        let color = if task.is_completed {
            Color::Green
        } else {
            Color::Yellow
        };
        heading.push(Span::styled(
            format!("  [{}]", task.status_label()),
            Style::default().fg(color),
        ));
    }

    let mut creator = vec![Span::styled(
        format!("{} ", task.creator.name),
        Style::default().fg(Color::DarkGray),
    )];
    creator.extend(rating_spans(&task.creator));

    ListItem::new(vec![
        Line::from(heading),
        Line::from(Span::styled(
            format!("Deadline: {}", format_when(&task.expires_at)),
            Style::default().fg(Color::Gray),
        )),
        Line::from(task.description.clone()),
        Line::from(creator),
        Line::from(""),
    ])
}

fn draw_home(f: &mut Frame, view: &TaskListView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Min(0), Constraint::Length(22)])
        .split(area);

    let categories: Vec<ListItem> = CategoryFilter::CHOICES
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let (mark, style) = if i == view.category {
                ("✓ ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
            } else {
                ("  ", Style::default())
            };
            ListItem::new(Line::from(Span::styled(format!("{mark}{}", c.label()), style)))
        })
        .collect();
    f.render_widget(
        List::new(categories).block(Block::default().title("Categories").borders(Borders::ALL)),
        chunks[1],
    );

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3), Constraint::Min(0)])
        .split(chunks[0]);

    let search_style = if view.searching {
        Style::default().fg(ACCENT)
    } else {
        Style::default()
    };
    let cursor = if view.searching { "▏" } else { "" };
    f.render_widget(
        Paragraph::new(format!("{}{cursor}", view.query)).block(
            Block::default()
                .title("Search by keywords")
                .borders(Borders::ALL)
                .border_style(search_style),
        ),
        left[0],
    );

    match &view.tasks {
        Remote::Loading => {
            f.render_widget(status_paragraph("Loading...".into(), Color::Gray), left[1])
        }
        Remote::Failed(msg) => {
            f.render_widget(status_paragraph(error_text(msg), Color::Red), left[1])
        }
        Remote::Ready(_) => {
            let visible = view.visible();
            if visible.is_empty() {
                f.render_widget(status_paragraph(view.empty_message(), Color::Gray), left[1]);
                return;
            }
            let items: Vec<ListItem> = visible.iter().map(|t| task_item(t, false)).collect();
            let list = List::new(items)
                .block(Block::default().title("Tasks").borders(Borders::ALL))
                .highlight_style(Style::default().bg(Color::DarkGray))
                .highlight_symbol("▌");
            let mut state = ListState::default().with_selected(Some(view.selected));
            f.render_stateful_widget(list, left[1], &mut state);
        }
    }
}

fn creator_lines(user: &User) -> Vec<Line<'static>> {
    let avatar = user
        .image
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("({})", user.initial()));
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{avatar} "), Style::default().fg(ACCENT)),
            Span::styled(user.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(user.email.clone(), Style::default().fg(Color::DarkGray))),
        Line::from(rating_spans(user)),
        Line::from(format!(
            "Created tasks: {}    Completed tasks: {}",
            user.created_tasks, user.completed_tasks
        )),
    ];
    if let Some(about) = user.about_me.as_deref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(about.to_string()));
    }
    lines
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))
}

fn draw_detail(f: &mut Frame, view: &TaskDetailView, area: Rect) {
    let task = match &view.task {
        Remote::Loading => {
            f.render_widget(status_paragraph("Loading...".into(), Color::Gray), area);
            return;
        }
        Remote::Failed(msg) => {
            f.render_widget(status_paragraph(error_text(msg), Color::Red), area);
            return;
        }
        Remote::Ready(None) => {
            f.render_widget(status_paragraph("Task not found".into(), Color::Gray), area);
            return;
        }
        Remote::Ready(Some(task)) => task,
    };

    let badge_color = if task.is_completed {
        Color::Green
    } else {
        Color::Yellow
    };
    let mut lines = vec![
        Line::from(vec![
            Span::raw(format!("{} ", category_icon(&task.category))),
            Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("   ${}", task.price), Style::default().fg(ACCENT)),
            Span::styled(format!("   [{}]", task.status_label()), Style::default().fg(badge_color)),
        ]),
    ];
    if let Some(created) = &task.created_at {
        lines.push(Line::from(Span::styled(
            format!("Created: {}", format_when(created)),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(""));
    lines.push(section("Task Description"));
    lines.extend(task.description.lines().map(|l| Line::from(l.to_string())));
    lines.push(Line::from(""));
    lines.push(section("Deadline"));
    lines.push(Line::from(Span::styled(
        format_when(&task.expires_at),
        Style::default().fg(Color::Red),
    )));
    lines.push(Line::from(""));
    lines.push(section("Created By"));
    lines.extend(creator_lines(&task.creator));

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().title(format!("Task #{}", view.id)).borders(Borders::ALL)),
        area,
    );
}

fn input_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default()
    };
    let cursor = if focused { "▏" } else { "" };
    Line::from(vec![
        Span::styled(format!("{label}: "), style.add_modifier(Modifier::BOLD)),
        Span::raw(format!("{value}{cursor}")),
    ])
}

fn draw_wizard(f: &mut Frame, wizard: &CreateTaskWizard, area: Rect) {
    let mut progress = Vec::new();
    for step in Step::ALL {
        let style = if step == wizard.step {
            Style::default().fg(Color::Black).bg(ACCENT)
        } else if step.number() < wizard.step.number() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        progress.push(Span::styled(format!(" {} ", step.number()), style));
        if step != Step::Deadline {
            progress.push(Span::raw("──"));
        }
    }

    let mut lines = vec![Line::from(progress), Line::from("")];
    if let Some(err) = &wizard.error {
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
        lines.push(Line::from(""));
    }

    let draft = &wizard.draft;
    match wizard.step {
        Step::Title => {
            lines.push(section("What should the task be called?"));
            lines.push(input_line("Title", &draft.title, true));
        }
        Step::Category => {
            lines.push(section("Choose a category"));
            let chips: Vec<Span> = Category::ALL
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let mut style = Style::default();
                    if draft.category == c.as_str() {
                        style = style.fg(Color::Black).bg(ACCENT);
                    }
                    if i == wizard.category_cursor {
                        style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
                    }
                    Span::styled(format!(" {} ", c.as_str()), style)
                })
                .collect();
            lines.push(Line::from(chips));
            lines.push(Line::from(Span::styled(
                "←→ move · Space select",
                Style::default().fg(Color::DarkGray),
            )));
        }
        Step::Details => {
            lines.push(section("Describe the task and set a price"));
            lines.push(input_line(
                "Description",
                &draft.description,
                wizard.field == DetailsField::Description,
            ));
            lines.push(input_line(
                "Price",
                &draft.price,
                wizard.field == DetailsField::Price,
            ));
            lines.push(Line::from(Span::styled(
                "Tab switch field",
                Style::default().fg(Color::DarkGray),
            )));
        }
        Step::Deadline => {
            lines.push(section("Deadline"));
            lines.push(Line::from(format_when(&draft.expires_at)));
            lines.push(Line::from(Span::styled(
                "↑↓ ±1 day · ←→ ±1 hour",
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::from(""));
            lines.push(section("Check the details"));
            lines.push(Line::from(format!("Title: {}", draft.title)));
            lines.push(Line::from(format!("Category: {}", draft.category)));
            lines.push(Line::from(format!("Price: {}", draft.price)));
            lines.push(Line::from(format!("Deadline: {}", format_when(&draft.expires_at))));
            lines.push(Line::from(""));
            let action = if wizard.submitting {
                "Creating..."
            } else {
                "Enter: Create task"
            };
            lines.push(Line::from(Span::styled(action, Style::default().fg(Color::Green))));
        }
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Create a task").borders(Borders::ALL)),
        area,
    );
}

fn draw_my_tasks(f: &mut Frame, view: &MyTasksView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match &view.tasks {
        Remote::Loading => {
            f.render_widget(status_paragraph("Loading...".into(), Color::Gray), chunks[0])
        }
        Remote::Failed(msg) => {
            f.render_widget(status_paragraph(error_text(msg), Color::Red), chunks[0])
        }
        Remote::Ready(tasks) if tasks.is_empty() => {
            f.render_widget(status_paragraph(NO_TASKS.into(), Color::Gray), chunks[0])
        }
        Remote::Ready(tasks) => {
            let items: Vec<ListItem> = tasks.iter().map(|t| task_item(t, true)).collect();
            let list = List::new(items)
                .block(Block::default().title("My Tasks").borders(Borders::ALL))
                .highlight_style(Style::default().bg(Color::DarkGray))
                .highlight_symbol("▌");
            let mut state = ListState::default().with_selected(Some(view.selected));
            f.render_stateful_widget(list, chunks[0], &mut state);
        }
    }

    if let Some(status) = &view.status {
        f.render_widget(
            Paragraph::new(status.clone()).style(Style::default().fg(Color::Yellow)),
            chunks[1],
        );
    }
}

fn draw_account(f: &mut Frame, view: &AccountView, area: Rect) {
    let user = match &view.user {
        Remote::Loading => {
            f.render_widget(status_paragraph("Loading...".into(), Color::Gray), area);
            return;
        }
        Remote::Failed(msg) => {
            f.render_widget(status_paragraph(error_text(msg), Color::Red), area);
            return;
        }
        Remote::Ready(user) => user,
    };

    let mut lines = creator_lines(user);
    lines.truncate(3);
    lines.push(Line::from(""));
    lines.push(section("Statistics"));
    lines.push(Line::from(format!("Created Tasks:   {}", user.created_tasks)));
    lines.push(Line::from(format!("Completed Tasks: {}", user.completed_tasks)));
    lines.push(Line::from(""));
    lines.push(section("About Me"));
    lines.push(Line::from(AccountView::about(user).to_string()));

    let links = user.social_links();
    if !links.is_empty() {
        lines.push(Line::from(""));
        lines.push(section("Social Links"));
        lines.extend(links.into_iter().map(|link| {
            Line::from(Span::styled(
                link.to_string(),
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            ))
        }));
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Account").borders(Borders::ALL)),
        area,
    );
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_modal(f: &mut Frame, modal: &Modal) {
    let (title, success) = match modal {
        Modal::Login(_) => ("Log in", false),
        Modal::Register(reg) => ("Create an account", reg.success),
    };
    let form = modal.form();
    let area = centered_rect(52, form.fields.len() as u16 + 7, f.area());

    let mut lines = Vec::new();
    if success {
        lines.push(Line::from(Span::styled(
            REGISTERED,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from("Enter to close and log in"));
    } else {
        for (i, field) in form.fields.iter().enumerate() {
            lines.push(input_line(field.label, &field.display(), i == form.focus));
        }
        lines.push(Line::from(""));
        if let Some(err) = &form.error {
            lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
        }
        if form.pending {
            lines.push(Line::from(Span::styled(
                "Sending...",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        ),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Envelope, Reply};
    use crate::session::Route;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use serde_json::json;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn web_task() -> Task {
        serde_json::from_value(json!({
            "id": 1, "title": "Shop front", "category": "web", "price": "120.00",
            "description": "Small storefront",
            "expires_at": "2025-05-01T12:00:00Z",
            "creator": {"name": "Ann", "rating": 4}
        }))
        .unwrap()
    }

    fn reply(app: &mut App, reply: Reply) {
        let generation = app.generation;
        app.apply(Envelope { generation, reply });
    }

    #[test]
    fn home_lists_fetched_tasks() {
        let mut app = App::new();
        app.start(Route::Home);
        reply(&mut app, Reply::Tasks(Ok(vec![web_task()])));
        let text = screen_text(&app);
        assert!(text.contains("Shop front"));
        assert!(text.contains("120.00 $"));
        assert!(text.contains("★★★★☆"));
    }

    #[test]
    fn design_filter_over_web_task_shows_no_tasks_found() {
        let mut app = App::new();
        app.start(Route::Home);
        reply(&mut app, Reply::Tasks(Ok(vec![web_task()])));
        app.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE));
        let text = screen_text(&app);
        assert!(text.contains("No tasks found in the \"design\" category"));
        assert!(!text.contains("Shop front"));
    }

    #[test]
    fn fetch_error_replaces_the_list() {
        let mut app = App::new();
        app.start(Route::Home);
        reply(
            &mut app,
            Reply::Tasks(Err(crate::error::ApiError::Network("connection refused".into()))),
        );
        assert!(screen_text(&app).contains("Error: connection refused"));
    }

    #[test]
    fn detail_not_found_is_its_own_state() {
        let mut app = App::new();
        app.start(Route::TaskDetail(99));
        assert!(screen_text(&app).contains("Loading..."));
        reply(&mut app, Reply::TaskDetail(Ok(None)));
        assert!(screen_text(&app).contains("Task not found"));
    }

    #[test]
    fn register_modal_masks_passwords() {
        let mut app = App::new();
        app.start(Route::Home);
        reply(&mut app, Reply::Session(false));
        app.open_register();
        if let Some(Modal::Register(reg)) = &mut app.modal {
            reg.form.focus = 2;
            "pw".chars().for_each(|c| reg.form.type_char(c));
        }
        let text = screen_text(&app);
        assert!(text.contains("Repeat password"));
        assert!(text.contains("••"));
        assert!(!text.contains("pw"));
    }
}
