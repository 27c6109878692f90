mod export;
mod help;
mod state;

use crate::cli::{build_api, build_config, Cli};
use crate::model::{ControllerConfig, ControllerEvent};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let api = build_api(&cfg)?;

    // Unbounded channels keep the UI thread from ever blocking on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // Text given on the command line is submitted right away.
    let initial = args
        .input
        .clone()
        .filter(|t| t != "-")
        .and_then(|t| crate::cli::validate_text(t).ok());
    if let Some(text) = initial.as_ref() {
        let _ = cmd_tx.send(UiCommand::Submit(text.clone()));
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_cfg = cfg.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_args, ui_cfg, initial, event_rx, cmd_tx));

    let res = orchestrator::run_controller(api, &cfg, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    cfg: ControllerConfig,
    initial: Option<String>,
    mut event_rx: UnboundedReceiver<ControllerEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("create terminal");
        }
    };
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::default();
    if let Some(text) = initial {
        state.input = text;
        state.mark_submitted(orchestrator::now_utc());
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&args, &cfg, &mut state, ev);
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
                match (k.modifiers, k.code) {
                    (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Tab) => {
                        state.tab = (state.tab + 1) % 2;
                    }
                    (_, KeyCode::Enter) => match state.submission_text() {
                        Some(text) => {
                            state.mark_submitted(orchestrator::now_utc());
                            state.info = "Submitting…".into();
                            let _ = cmd_tx.send(UiCommand::Submit(text));
                        }
                        None => state.info = "Type some text first".into(),
                    },
                    (_, KeyCode::Backspace) => state.backspace(),
                    (KeyModifiers::CONTROL, KeyCode::Char('u')) => state.clear_input(),
                    (KeyModifiers::CONTROL, KeyCode::Char('y')) => {
                        match state.submission.job_id.clone() {
                            Some(job_id) => match export::copy_to_clipboard(&job_id) {
                                Ok(()) => state.info = format!("Copied job ID: {job_id}"),
                                Err(e) => state.info = format!("Copy failed: {e:#}"),
                            },
                            None => state.info = "No job ID yet".into(),
                        }
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                        if state.submitted_at_utc.is_some() {
                            export::save_and_show_path(&cfg, &mut state);
                        } else {
                            state.info = "Nothing to save yet".into();
                        }
                    }
                    (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                        if state.tab == 0 {
                            state.push_char(c);
                        }
                    }
                    _ => {}
                }
            }
        }
    };

    restore_terminal();
    res
}

fn restore_terminal() {
    disable_raw_mode().ok();
    execute!(io::stdout(), LeaveAlternateScreen).ok();
}

fn apply_event(args: &Cli, cfg: &ControllerConfig, state: &mut UiState, ev: ControllerEvent) {
    match ev {
        ControllerEvent::State(next) => {
            if state.apply_snapshot(*next) {
                handle_settled(args, cfg, state);
            }
        }
        ControllerEvent::Info(info) => state.info = info.to_message(),
    }
}

fn handle_settled(args: &Cli, cfg: &ControllerConfig, state: &mut UiState) {
    let submitted_at = state.submitted_at_utc.clone().unwrap_or_default();
    let processed =
        orchestrator::process_run_completion(args, cfg, submitted_at, &state.submission);

    state.info = match state.submission.status {
        crate::model::JobStatus::Completed => "Analysis completed".into(),
        _ => "Analysis failed".into(),
    };
    if !processed.export_messages.is_empty() {
        state.info = processed.export_messages.join("; ");
        if let Some(p) = args.export_json.as_ref() {
            state.last_exported_path = Some(p.display().to_string());
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Analyze"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("AnalytiCore"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_form(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(8),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let mut input = state.input.clone();
    input.push('▏');
    let input_box = Paragraph::new(input)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Text to analyze ({})", state.submit_hint())),
        );
    f.render_widget(input_box, chunks[0]);

    let title = match state.submission.status {
        crate::model::JobStatus::Idle => "Status".to_string(),
        s => format!("Job status: {s}"),
    };
    let status_box = Paragraph::new(state::status_lines(state, chunks[1].width))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(state::status_color(state.submission.status))),
        );
    f.render_widget(status_box, chunks[1]);

    let footer = Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(state.info.clone(), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(
            "Tab: help  Esc: quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(footer), chunks[2]);
}
