use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::db::KeyValueStore;
use crate::error::StoreError;
use crate::format::{format_salary, or_dash};
use crate::models::JobRecord;
use crate::store::{JobStore, SaveOutcome};
use crate::theme::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Company,
    Role,
    Location,
    Salary,
    Date,
    Status,
    Link,
    Notes,
}

impl Field {
    const ALL: [Field; 8] = [
        Field::Company,
        Field::Role,
        Field::Location,
        Field::Salary,
        Field::Date,
        Field::Status,
        Field::Link,
        Field::Notes,
    ];

    fn label(&self) -> &'static str {
        match self {
            Field::Company => "Company",
            Field::Role => "Role",
            Field::Location => "Location",
            Field::Salary => "Salary (e.g., 65000)",
            Field::Date => "Date (YYYY-MM-DD)",
            Field::Status => "Status",
            Field::Link => "Job Link",
            Field::Notes => "Notes",
        }
    }

    fn text_mut(self, form: &mut JobRecord) -> Option<&mut String> {
        match self {
            Field::Company => Some(&mut form.company),
            Field::Role => Some(&mut form.role),
            Field::Location => Some(&mut form.location),
            Field::Salary => Some(&mut form.salary),
            Field::Date => Some(&mut form.date),
            Field::Status => None,
            Field::Link => Some(&mut form.link),
            Field::Notes => Some(&mut form.notes),
        }
    }

    fn value(self, form: &JobRecord) -> &str {
        match self {
            Field::Company => &form.company,
            Field::Role => &form.role,
            Field::Location => &form.location,
            Field::Salary => &form.salary,
            Field::Date => &form.date,
            Field::Status => form.status.as_str(),
            Field::Link => &form.link,
            Field::Notes => &form.notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    Form(usize),
}

struct AppState {
    selected: usize,
    mode: Mode,
    alert: Option<String>,
    status_line: String,
}

impl AppState {
    fn new() -> Self {
        Self {
            selected: 0,
            mode: Mode::Browse,
            alert: None,
            status_line: String::new(),
        }
    }

    fn clamp<S: KeyValueStore>(&mut self, store: &JobStore<S>) {
        let len = store.visible().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn selected_index<S: KeyValueStore>(&self, store: &JobStore<S>) -> Option<usize> {
        store.visible().get(self.selected).map(|listed| listed.index)
    }

    fn report(&mut self, err: StoreError) {
        if !err.is_validation() {
            log::error!("{}", err);
        }
        self.alert = Some(err.to_string());
    }
}

pub fn run_browse<S: KeyValueStore>(store: &mut JobStore<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, store);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    store: &mut JobStore<S>,
) -> Result<()> {
    let mut state = AppState::new();
    let mut list_state = ListState::default();

    loop {
        state.clamp(store);
        list_state.select(if store.visible().is_empty() {
            None
        } else {
            Some(state.selected)
        });
        terminal.draw(|frame| draw(frame, store, &state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                break;
            }
            // The alert blocks everything until dismissed.
            if state.alert.take().is_some() {
                continue;
            }
            let keep_going = match state.mode {
                Mode::Browse => handle_browse(key, store, &mut state),
                Mode::Search => {
                    handle_search(key, store, &mut state);
                    true
                }
                Mode::Form(field) => {
                    handle_form(key, field, store, &mut state);
                    true
                }
            };
            if !keep_going {
                break;
            }
        }
    }
    Ok(())
}

fn handle_browse<S: KeyValueStore>(
    key: KeyEvent,
    store: &mut JobStore<S>,
    state: &mut AppState,
) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Down | KeyCode::Char('j') => state.selected = state.selected.saturating_add(1),
        KeyCode::Up | KeyCode::Char('k') => state.selected = state.selected.saturating_sub(1),
        KeyCode::Char('a') => {
            if store.editing().is_some() {
                store.cancel_edit();
            }
            state.mode = Mode::Form(0);
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(index) = state.selected_index(store) {
                match store.start_edit(index) {
                    Ok(()) => state.mode = Mode::Form(0),
                    Err(e) => state.report(e),
                }
            }
        }
        KeyCode::Char('d') => {
            if let Some(index) = state.selected_index(store) {
                match store.delete(index) {
                    Ok(job) => state.status_line = format!("Deleted {}", or_dash(&job.company)),
                    Err(e) => state.report(e),
                }
            }
        }
        KeyCode::Char('/') => state.mode = Mode::Search,
        KeyCode::Char('f') => {
            store.set_filter(store.filter().next());
            state.selected = 0;
        }
        KeyCode::Char('t') => match store.toggle_theme() {
            Ok(theme) => state.status_line = format!("Theme: {}", theme.as_token()),
            Err(e) => state.report(e),
        },
        _ => {}
    }
    true
}

fn handle_search<S: KeyValueStore>(key: KeyEvent, store: &mut JobStore<S>, state: &mut AppState) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => state.mode = Mode::Browse,
        KeyCode::Backspace => {
            let mut search = store.search().to_string();
            search.pop();
            store.set_search(search);
            state.selected = 0;
        }
        KeyCode::Char(c) => {
            let search = format!("{}{}", store.search(), c);
            store.set_search(search);
            state.selected = 0;
        }
        _ => {}
    }
}

fn handle_form<S: KeyValueStore>(
    key: KeyEvent,
    focus: usize,
    store: &mut JobStore<S>,
    state: &mut AppState,
) {
    let field = Field::ALL[focus];
    match key.code {
        KeyCode::Esc => {
            // Leaving an edit abandons it; a new draft is kept.
            if store.editing().is_some() {
                store.cancel_edit();
            }
            state.mode = Mode::Browse;
        }
        KeyCode::Tab | KeyCode::Down => {
            state.mode = Mode::Form((focus + 1) % Field::ALL.len());
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.mode = Mode::Form((focus + Field::ALL.len() - 1) % Field::ALL.len());
        }
        KeyCode::Enter => match store.submit() {
            Ok(outcome) => {
                state.status_line = match outcome {
                    SaveOutcome::Added(i) => format!("Added job #{}", i + 1),
                    SaveOutcome::Updated(i) => format!("Saved changes to job #{}", i + 1),
                };
                state.mode = Mode::Browse;
            }
            Err(e) => state.report(e),
        },
        KeyCode::Right | KeyCode::Char(' ') if field == Field::Status => {
            let next = store.form().status.next();
            store.form_mut().status = next;
        }
        KeyCode::Left if field == Field::Status => {
            let prev = store.form().status.prev();
            store.form_mut().status = prev;
        }
        KeyCode::Backspace => {
            if let Some(text) = field.text_mut(store.form_mut()) {
                text.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(text) = field.text_mut(store.form_mut()) {
                text.push(c);
            }
        }
        _ => {}
    }
}

fn draw<S: KeyValueStore>(
    frame: &mut Frame,
    store: &JobStore<S>,
    state: &AppState,
    list_state: &mut ListState,
) {
    let palette = store.theme().palette();
    let base = Style::default().bg(palette.bg).fg(palette.fg);
    frame.render_widget(Block::default().style(base), frame.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, rows[0], store, state, &palette);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    draw_list(frame, body[0], store, list_state, &palette);
    match state.mode {
        Mode::Form(focus) => draw_form(frame, body[1], store, focus, &palette),
        _ => draw_detail(frame, body[1], store, state, &palette),
    }

    let help = match state.mode {
        Mode::Browse => " j/k:navigate  a:add  e:edit  d:delete  /:search  f:filter  t:theme  q:quit",
        Mode::Search => " type to search  Backspace:erase  Enter/Esc:done",
        Mode::Form(_) => " Tab/Shift-Tab:field  Left/Right:status  Enter:save  Esc:close",
    };
    let footer = if state.status_line.is_empty() {
        help.to_string()
    } else {
        format!("{}  | {}", help, state.status_line)
    };
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(palette.muted)),
        rows[2],
    );

    if let Some(message) = &state.alert {
        draw_alert(frame, message, &palette);
    }
}

fn draw_header<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    store: &JobStore<S>,
    state: &AppState,
    palette: &Palette,
) {
    let mut chips: Vec<Span> = Vec::new();
    for choice in crate::models::StatusFilter::CHOICES {
        let style = if choice == store.filter() {
            Style::default()
                .fg(palette.bg)
                .bg(palette.fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        chips.push(Span::styled(format!(" {} ", choice), style));
        chips.push(Span::raw(" "));
    }
    let toggle = match store.theme() {
        crate::theme::Theme::Dark => "☀ Light Mode (t)",
        crate::theme::Theme::Light => "🌙 Dark Mode (t)",
    };
    chips.push(Span::styled(format!("   {}", toggle), Style::default().fg(palette.muted)));

    let search_style = if state.mode == Mode::Search {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    };
    let search = if store.search().is_empty() && state.mode != Mode::Search {
        "Search jobs... (company, role, notes, location)".to_string()
    } else {
        format!("Search: {}", store.search())
    };

    let lines = vec![
        Line::from(Span::styled(
            "Job Tracker",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(chips),
        Line::from(Span::styled(search, search_style)),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_list<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    store: &JobStore<S>,
    list_state: &mut ListState,
    palette: &Palette,
) {
    let visible = store.visible();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Your Jobs ({}/{}) ", visible.len(), store.len()));

    if visible.is_empty() {
        let empty = Paragraph::new("No jobs found.")
            .style(Style::default().fg(palette.muted))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|listed| {
            let job = listed.job;
            let mut title = vec![
                Span::styled(or_dash(&job.company).to_string(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(" — {} ", or_dash(&job.role))),
                Span::styled(format!("[{}]", job.status), Style::default().fg(palette.accent)),
            ];
            if store.editing() == Some(listed.index) {
                title.push(Span::styled(" (editing)", Style::default().fg(palette.muted)));
            }
            let mut lines = vec![Line::from(title)];
            let meta = summary_line(job);
            if !meta.is_empty() {
                lines.push(Line::from(Span::styled(meta, Style::default().fg(palette.muted))));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, list_state);
}

/// Date, location and salary on one line, skipping blanks.
fn summary_line(job: &JobRecord) -> String {
    let salary = format_salary(&job.salary);
    [job.date.as_str(), job.location.as_str(), salary.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" • ")
}

fn draw_detail<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    store: &JobStore<S>,
    state: &AppState,
    palette: &Palette,
) {
    let visible = store.visible();
    let Some(listed) = visible.get(state.selected) else {
        let empty = Paragraph::new("No job selected")
            .style(Style::default().fg(palette.muted))
            .block(Block::default().borders(Borders::ALL).title(" Detail "));
        frame.render_widget(empty, area);
        return;
    };
    let job = listed.job;
    let width = area.width.saturating_sub(4).max(20) as usize;

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            format!("{} — {}", or_dash(&job.company), or_dash(&job.role)),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("Status: {}", job.status),
            Style::default().fg(palette.accent),
        )),
    ];
    let meta = summary_line(job);
    if !meta.is_empty() {
        lines.push(Line::from(Span::styled(meta, Style::default().fg(palette.muted))));
    }
    if !job.link.is_empty() {
        lines.push(Line::from(format!("View job posting: {}", job.link)));
    }
    if !job.notes.is_empty() {
        lines.push(Line::from(""));
        for line in textwrap::fill(&job.notes, width).lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(palette.muted),
            )));
        }
    }

    let detail = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Job #{} ", listed.index + 1)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

fn draw_form<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    store: &JobStore<S>,
    focus: usize,
    palette: &Palette,
) {
    let form = store.form();
    let (title, action) = match store.editing() {
        Some(i) => (format!(" Edit job #{} ", i + 1), "Enter: Save Changes"),
        None => (" Add job ".to_string(), "Enter: ＋ Add Job"),
    };

    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in Field::ALL.iter().enumerate() {
        let focused = i == focus;
        let marker = if focused { "> " } else { "  " };
        let value = field.value(form);
        let shown = if *field == Field::Status {
            format!("< {} >", value)
        } else if focused {
            format!("{}_", value)
        } else {
            value.to_string()
        };
        let label_style = if focused {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}{}: ", marker, field.label()), label_style),
            Span::raw(shown),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        action,
        Style::default().add_modifier(Modifier::BOLD),
    )));

    let widget = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn draw_alert(frame: &mut Frame, message: &str, palette: &Palette) {
    let area = centered_rect(40, 5, frame.area());
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(palette.danger).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("press any key", Style::default().fg(palette.muted))),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().bg(palette.bg).fg(palette.fg))
    .block(Block::default().borders(Borders::ALL).title(" Alert "));
    frame.render_widget(popup, area);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{Status, StatusFilter};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text<S: KeyValueStore>(text: &str, store: &mut JobStore<S>, state: &mut AppState) {
        for c in text.chars() {
            let Mode::Form(focus) = state.mode else { panic!("not in form") };
            handle_form(press(KeyCode::Char(c)), focus, store, state);
        }
    }

    #[test]
    fn form_keys_add_a_job() {
        let mem = MemoryStore::new();
        let mut store = JobStore::load(&mem, false).unwrap();
        let mut state = AppState::new();

        handle_browse(press(KeyCode::Char('a')), &mut store, &mut state);
        type_text("Acme", &mut store, &mut state);
        handle_form(press(KeyCode::Tab), 0, &mut store, &mut state);
        type_text("Engineer", &mut store, &mut state);
        // jump to status and cycle once
        state.mode = Mode::Form(5);
        handle_form(press(KeyCode::Right), 5, &mut store, &mut state);
        handle_form(press(KeyCode::Enter), 5, &mut store, &mut state);

        assert_eq!(state.mode, Mode::Browse);
        assert_eq!(store.len(), 1);
        assert_eq!(store.jobs()[0].company, "Acme");
        assert_eq!(store.jobs()[0].role, "Engineer");
        assert_eq!(store.jobs()[0].status, Status::Interview);
    }

    #[test]
    fn invalid_submit_raises_alert_and_keeps_draft() {
        let mem = MemoryStore::new();
        let mut store = JobStore::load(&mem, false).unwrap();
        let mut state = AppState::new();

        handle_browse(press(KeyCode::Char('a')), &mut store, &mut state);
        type_text("Acme", &mut store, &mut state);
        handle_form(press(KeyCode::Enter), 0, &mut store, &mut state);

        assert_eq!(state.alert.as_deref(), Some("Company & Role required!"));
        assert_eq!(state.mode, Mode::Form(0));
        assert_eq!(store.form().company, "Acme");
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn edit_and_delete_use_true_positions() {
        let mem = MemoryStore::new();
        let mut store = JobStore::load(&mem, false).unwrap();
        store.save(JobRecord::new("Acme", "Dev")).unwrap();
        store.save(JobRecord::new("Globex", "Dev").with_status(Status::Offer)).unwrap();
        store.save(JobRecord::new("Initech", "Dev").with_status(Status::Offer)).unwrap();
        store.set_filter(StatusFilter::Only(Status::Offer));

        let mut state = AppState::new();
        state.selected = 1;
        handle_browse(press(KeyCode::Char('e')), &mut store, &mut state);
        assert_eq!(store.editing(), Some(2));
        assert_eq!(store.form().company, "Initech");

        handle_form(press(KeyCode::Esc), 0, &mut store, &mut state);
        assert_eq!(store.editing(), None);

        state.selected = 0;
        handle_browse(press(KeyCode::Char('d')), &mut store, &mut state);
        let names: Vec<&str> = store.jobs().iter().map(|j| j.company.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Initech"]);
    }

    #[test]
    fn search_mode_edits_search_text() {
        let mem = MemoryStore::new();
        let mut store = JobStore::load(&mem, false).unwrap();
        let mut state = AppState::new();

        handle_browse(press(KeyCode::Char('/')), &mut store, &mut state);
        for c in "acmex".chars() {
            handle_search(press(KeyCode::Char(c)), &mut store, &mut state);
        }
        handle_search(press(KeyCode::Backspace), &mut store, &mut state);
        handle_search(press(KeyCode::Enter), &mut store, &mut state);
        assert_eq!(store.search(), "acme");
        assert_eq!(state.mode, Mode::Browse);
    }

    #[test]
    fn summary_skips_blank_parts() {
        let mut job = JobRecord::new("Acme", "Dev");
        assert_eq!(summary_line(&job), "");
        job.location = "Berlin".into();
        job.salary = "65000".into();
        assert_eq!(summary_line(&job), "Berlin • $65,000");
    }
}
