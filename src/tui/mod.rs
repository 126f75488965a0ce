mod help;
mod state;

use crate::cli::{build_config, build_controller, Cli, ConsoleConfig};
use crate::orchestrator::{self, command_channel, ConsoleEvent, UiCommand};
use crate::text_summary::{
    describe_error, describe_event_header, describe_source, job_fields, payload_lines,
};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{
    job_status_color, push_wrapped_status_kv, severity_color, source_status_color, FormField,
    UiState,
};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const BUSY_NOTICE: &str = "Request in flight; wait for it to finish";
const QUIT_WAIT_NOTICE: &str = "Waiting for the in-flight request to finish before exiting";

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ConsoleEvent>();
    let (cmd_tx, cmd_rx) = command_channel();
    let controller = build_controller(&cfg)?.with_events(event_tx);
    let log_path = args
        .log_file
        .clone()
        .or_else(crate::logging::default_log_path)
        .map(|p| p.display().to_string());

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_cfg = cfg.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_cfg, log_path, event_rx, cmd_tx));

    let final_state =
        orchestrator::run_controller(controller, cfg.initial_commands(), cmd_rx).await;
    tracing::info!(
        sources = final_state.sources.len(),
        job = ?final_state.job.as_ref().map(|j| j.id),
        "console session ended"
    );

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }
    Ok(())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    cfg: ConsoleConfig,
    log_path: Option<String>,
    mut event_rx: UnboundedReceiver<ConsoleEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; the controller talks to it through snapshots.
    let mut state = UiState::new(&cfg);
    state.log_path = log_path;

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut state, k.code, k.modifiers) {
                    KeyAction::None => {}
                    KeyAction::Send(cmd) => {
                        if cmd_tx.send(cmd).is_err() {
                            break Ok(());
                        }
                    }
                    KeyAction::Export => {
                        state.notice =
                            Some(match crate::export::export_to_current_dir(&state.session) {
                                Ok(p) => format!("Exported JSON: {}", p.display()),
                                Err(e) => format!("JSON export failed: {e:#}"),
                            });
                    }
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();

    // Quit does not cancel; run() keeps waiting on the controller until the action ends.
    while let Ok(ev) = event_rx.try_recv() {
        state.apply_event(ev);
    }
    if let Some(line) = exit_notice(&state) {
        eprintln!("{line}");
    }
    res
}

/// Line printed after leaving the alternate screen, if the session is still busy.
fn exit_notice(state: &UiState) -> Option<&'static str> {
    state.session.busy.then_some(QUIT_WAIT_NOTICE)
}

#[derive(Debug, PartialEq)]
enum KeyAction {
    None,
    Send(UiCommand),
    Export,
    Quit,
}

fn handle_key(state: &mut UiState, code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }
    state.notice = None;
    let busy = state.session.busy;

    if state.form.editing {
        match code {
            KeyCode::Esc => state.form.editing = false,
            KeyCode::Tab => state.form.toggle_field(),
            KeyCode::Backspace => {
                state.form.active_input().pop();
            }
            KeyCode::Enter if busy => state.notice = Some(BUSY_NOTICE.into()),
            KeyCode::Enter => {
                state.form.editing = false;
                return KeyAction::Send(UiCommand::CreateSource {
                    name: state.form.name.clone(),
                    csv_path: state.form.csv_path.clone(),
                });
            }
            KeyCode::Char(c) => state.form.active_input().push(c),
            _ => {}
        }
        return KeyAction::None;
    }

    match code {
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Tab => {
            state.tab = (state.tab + 1) % 2;
            KeyAction::None
        }
        KeyCode::Char('?') => {
            state.tab = 1;
            KeyAction::None
        }
        KeyCode::Char('e') => KeyAction::Export,
        KeyCode::Char('r' | 's' | 'n' | 'j' | 'k') | KeyCode::Up | KeyCode::Down if busy => {
            state.notice = Some(BUSY_NOTICE.into());
            KeyAction::None
        }
        KeyCode::Char('r') => KeyAction::Send(UiCommand::Refresh),
        KeyCode::Char('s') => {
            if state.session.selected_source().is_some() {
                KeyAction::Send(UiCommand::StartIngestion)
            } else {
                state.notice = Some("Select a source first".into());
                KeyAction::None
            }
        }
        KeyCode::Char('n') => {
            state.tab = 0;
            state.form.editing = true;
            KeyAction::None
        }
        KeyCode::Up | KeyCode::Char('k') => select_step(state, -1),
        KeyCode::Down | KeyCode::Char('j') => select_step(state, 1),
        _ => KeyAction::None,
    }
}

fn select_step(state: &UiState, step: isize) -> KeyAction {
    match state.neighbour_source(step) {
        Some(id) if state.session.selected_source_id != Some(id) => {
            KeyAction::Send(UiCommand::SelectSource(id))
        }
        _ => KeyAction::None,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Dashboard"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("ingest-console"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f, &state.api_base, state.log_path.as_deref()),
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)].as_ref())
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(main[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)].as_ref())
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(7),      // Latest job fields
                Constraint::Min(0),         // Events
                Constraint::Percentage(30), // Errors
            ]
            .as_ref(),
        )
        .split(columns[1]);

    draw_sources(left[0], f, state);
    draw_form(left[1], f, state);
    draw_job(right[0], f, state);
    draw_events(right[1], f, state);
    draw_errors(right[2], f, state);
    draw_status(main[1], f, state);
}

fn placeholder(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Gray),
    ))
}

fn draw_sources(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let session = &state.session;
    let mut lines = Vec::new();
    if session.sources.is_empty() {
        lines.push(placeholder("(No sources yet)"));
    }
    for source in &session.sources {
        let selected = session.selected_source_id == Some(source.id);
        let style = if selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(if selected { "> " } else { "  " }),
            Span::styled(describe_source(source), style),
            Span::raw(" "),
            Span::styled("●", Style::default().fg(source_status_color(&source.status))),
        ]));
    }

    match (session.selected_source_id, session.selected_source()) {
        (_, Some(source)) => {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("CSV path: ", Style::default().fg(Color::Gray)),
                Span::raw(source.csv_path.clone().unwrap_or_else(|| "-".into())),
            ]));
        }
        (Some(id), None) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Selected source #{id} is not in the list"),
                Style::default().fg(Color::Red),
            )));
        }
        (None, None) => {}
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Sources"));
    f.render_widget(p, area);
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let form = &state.form;
    let field_line = |label: &'static str, value: &str, field: FormField| {
        let active = form.editing && form.field == field;
        let value_style = if active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::styled(value.to_string(), value_style),
            Span::raw(if active { "_" } else { "" }),
        ])
    };

    let title = if form.editing {
        "Create Source (enter: create, esc: cancel)"
    } else {
        "Create Source (n to edit)"
    };
    let p = Paragraph::new(vec![
        field_line("Name: ", &form.name, FormField::Name),
        field_line("CSV path: ", &form.csv_path, FormField::CsvPath),
    ])
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_job(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let lines = match state.session.job.as_ref() {
        None => vec![placeholder("No job yet. Start an ingestion.")],
        Some(job) => job_fields(job)
            .into_iter()
            .map(|(label, value)| {
                let value_style = if label == "Status" {
                    Style::default().fg(job_status_color(&job.status))
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
                    Span::styled(value, value_style),
                ])
            })
            .collect(),
    };

    let title = match state.session.job.as_ref() {
        Some(job) if job.status.is_finished() => "Latest Job (finished)",
        Some(_) => "Latest Job (in progress)",
        None => "Latest Job",
    };
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_events(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let events = &state.session.events;
    let mut lines = Vec::new();
    if events.is_empty() {
        lines.push(placeholder("(none)"));
    }
    for event in events {
        lines.push(Line::from(Span::styled(
            describe_event_header(event),
            Style::default().fg(Color::Cyan),
        )));
        lines.extend(
            payload_lines(event)
                .into_iter()
                .map(|l| Line::from(format!("  {l}"))),
        );
    }

    let title = format!("Events ({})", events.len());
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_errors(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let errors = &state.session.errors;
    let mut lines = Vec::new();
    if errors.is_empty() {
        lines.push(placeholder("(none)"));
    }
    for error in errors {
        lines.push(Line::from(Span::styled(
            describe_error(error),
            Style::default().fg(severity_color(&error.severity)),
        )));
    }

    let title = format!("Errors ({})", errors.len());
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let session = &state.session;
    let mut lines = vec![Line::from(vec![
        Span::styled("API: ", Style::default().fg(Color::Gray)),
        Span::raw(state.api_base.clone()),
        Span::raw("   "),
        Span::styled("State: ", Style::default().fg(Color::Gray)),
        if session.busy {
            Span::styled("busy", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("idle", Style::default().fg(Color::Green))
        },
        Span::raw("   "),
        Span::styled("Refreshed: ", Style::default().fg(Color::Gray)),
        Span::raw(
            session
                .last_refreshed_at
                .clone()
                .unwrap_or_else(|| "-".into()),
        ),
    ])];

    push_wrapped_status_kv(&mut lines, "Message", &session.message, area.width);
    if let Some(notice) = state.notice.as_deref() {
        push_wrapped_status_kv(&mut lines, "Info", notice, area.width);
    }

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Source, SourceStatus};
    use clap::Parser;

    fn ui_state() -> UiState {
        let args = Cli::parse_from(["ingest-console", "--base-url", "http://api.test"]);
        UiState::new(&build_config(&args))
    }

    fn press(state: &mut UiState, code: KeyCode) -> KeyAction {
        handle_key(state, code, KeyModifiers::NONE)
    }

    fn add_source(state: &mut UiState, id: i64) {
        let mut sources = state.session.sources.clone();
        sources.push(Source {
            id,
            name: format!("s{id}"),
            csv_path: None,
            status: SourceStatus::new("active"),
        });
        state.session.replace_sources(sources);
    }

    #[test]
    fn quit_keys_always_quit() {
        let mut state = ui_state();
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyAction::Quit);

        state.form.editing = true;
        assert_eq!(
            handle_key(&mut state, KeyCode::Char('c'), KeyModifiers::CONTROL),
            KeyAction::Quit
        );
    }

    #[test]
    fn quitting_while_busy_announces_the_wait() {
        let mut state = ui_state();
        assert_eq!(exit_notice(&state), None);

        state.session.begin_action();
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyAction::Quit);
        assert_eq!(exit_notice(&state), Some(QUIT_WAIT_NOTICE));

        state.session.finish_action();
        assert_eq!(exit_notice(&state), None);
    }

    #[test]
    fn start_requires_a_selected_source() {
        let mut state = ui_state();
        assert_eq!(press(&mut state, KeyCode::Char('s')), KeyAction::None);
        assert_eq!(state.notice.as_deref(), Some("Select a source first"));

        add_source(&mut state, 7);
        assert_eq!(
            press(&mut state, KeyCode::Char('s')),
            KeyAction::Send(UiCommand::StartIngestion)
        );
        assert!(state.notice.is_none());
    }

    #[test]
    fn mutating_keys_are_disabled_while_busy() {
        let mut state = ui_state();
        add_source(&mut state, 7);
        state.session.begin_action();

        for code in [KeyCode::Char('r'), KeyCode::Char('s'), KeyCode::Char('n')] {
            assert_eq!(press(&mut state, code), KeyAction::None);
            assert_eq!(state.notice.as_deref(), Some(BUSY_NOTICE));
        }
        assert!(!state.form.editing);
        assert_eq!(press(&mut state, KeyCode::Char('e')), KeyAction::Export);
    }

    #[test]
    fn form_edits_then_submits_create() {
        let mut state = ui_state();
        press(&mut state, KeyCode::Char('n'));
        assert!(state.form.editing);

        for _ in 0.."Sample CSV".len() {
            press(&mut state, KeyCode::Backspace);
        }
        for c in "Orders".chars() {
            press(&mut state, KeyCode::Char(c));
        }
        // 'q' while editing is text, not quit
        press(&mut state, KeyCode::Char('q'));
        press(&mut state, KeyCode::Backspace);

        assert_eq!(
            press(&mut state, KeyCode::Enter),
            KeyAction::Send(UiCommand::CreateSource {
                name: "Orders".into(),
                csv_path: "./data/sample.csv".into(),
            })
        );
        assert!(!state.form.editing);
    }

    #[test]
    fn navigation_sends_selection_changes_only() {
        let mut state = ui_state();
        add_source(&mut state, 4);
        add_source(&mut state, 5);

        assert_eq!(press(&mut state, KeyCode::Up), KeyAction::None);
        assert_eq!(
            press(&mut state, KeyCode::Char('j')),
            KeyAction::Send(UiCommand::SelectSource(5))
        );
    }

    #[test]
    fn tab_cycles_between_dashboard_and_help() {
        let mut state = ui_state();
        press(&mut state, KeyCode::Tab);
        assert_eq!(state.tab, 1);
        press(&mut state, KeyCode::Tab);
        assert_eq!(state.tab, 0);
        press(&mut state, KeyCode::Char('?'));
        assert_eq!(state.tab, 1);
    }
}
