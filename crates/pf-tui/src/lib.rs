use anyhow::{Context, Result};
use base64::Engine as _;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

use pf_core::{Clipboard, CoreError, CoreResult, PromptSource};
use pf_gallery::{run_sweep, Gallery, LoadRequest, PromptLoader, ViewerKey};

const TICK_RATE: Duration = Duration::from_millis(200);

/// Clipboard writes through the terminal's OSC 52 escape sequence.
#[derive(Debug)]
pub struct Osc52Clipboard<W = Stdout> {
    out: W,
}

impl Osc52Clipboard {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn write_text(&mut self, text: &str) -> CoreResult<()> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
        write!(self.out, "\x1b]52;c;{encoded}\x1b\\")
            .and_then(|()| self.out.flush())
            .map_err(|err| CoreError::Clipboard(err.to_string()))
    }
}

#[derive(Debug)]
struct App {
    gallery: Gallery,
    loader: PromptLoader,
    list_state: ListState,
    show_help: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    None,
    Quit,
    Load(LoadRequest),
    Copy,
}

impl App {
    fn new(gallery: Gallery, loader: PromptLoader) -> Self {
        let mut list_state = ListState::default();
        if !gallery.catalog().is_empty() {
            list_state.select(Some(0));
        }
        Self {
            gallery,
            loader,
            list_state,
            show_help: false,
        }
    }

    fn view_len(&self) -> usize {
        self.gallery.view().len()
    }

    fn select_next(&mut self) {
        let len = self.view_len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn select_prev(&mut self) {
        let len = self.view_len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn reset_cursor(&mut self) {
        let selected = if self.view_len() == 0 { None } else { Some(0) };
        self.list_state.select(selected);
    }

    fn open_selected(&mut self) -> Option<LoadRequest> {
        let index = self.list_state.selected()?;
        let id = self.gallery.view().get(index).map(|entry| entry.id)?;
        self.gallery.select(id)
    }

    /// Keep the list cursor on the entry shown in the viewer.
    fn follow_viewer(&mut self) {
        if let Some(position) = self.gallery.active_position() {
            self.list_state.select(Some(position));
        }
    }
}

/// Run the gallery in the terminal until the user quits.
pub fn run(gallery: Gallery, source: Arc<dyn PromptSource>, sweep_delay: Duration) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to initialize runtime")?;

    let (load_tx, mut load_rx) = mpsc::unbounded_channel();
    let (sweep_tx, mut sweep_rx) = mpsc::unbounded_channel();

    let mut app = App::new(gallery, PromptLoader::new(source));
    let targets = app.gallery.begin_sweep();
    if !targets.is_empty() {
        runtime.spawn(run_sweep(app.loader.clone(), targets, sweep_delay, sweep_tx));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut clipboard = Osc52Clipboard::stdout();

    info!(entries = app.gallery.catalog().len(), "gallery opened");

    loop {
        while let Ok(outcome) = load_rx.try_recv() {
            app.gallery.apply_load(&outcome);
        }
        while let Ok(event) = sweep_rx.try_recv() {
            app.gallery.apply_sweep_event(&event);
        }
        app.gallery.tick(Instant::now());

        terminal.draw(|frame| render_app(frame, &app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut app, key) {
                    Action::Quit => break,
                    Action::Load(request) => {
                        let loader = app.loader.clone();
                        let tx = load_tx.clone();
                        runtime.spawn(async move {
                            let _ = tx.send(loader.load_for(request).await);
                        });
                    }
                    Action::Copy => {
                        app.gallery.copy_prompt(&mut clipboard, Instant::now());
                    }
                    Action::None => {}
                }
            }
        }
    }

    restore_terminal(terminal)?;
    runtime.shutdown_background();
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if app.gallery.viewer().is_open() {
        let viewer_key = match key.code {
            KeyCode::Left => Some(ViewerKey::Left),
            KeyCode::Right => Some(ViewerKey::Right),
            KeyCode::Esc | KeyCode::Char('q') => Some(ViewerKey::Escape),
            KeyCode::Char('c' | 'y') => return Action::Copy,
            _ => None,
        };
        let Some(viewer_key) = viewer_key else {
            return Action::None;
        };
        let response = app.gallery.handle_key(viewer_key);
        if !response.handled {
            return Action::None;
        }
        app.follow_viewer();
        return response.load.map_or(Action::None, Action::Load);
    }

    if app.show_help {
        app.show_help = false;
        return Action::None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Enter => {
            if let Some(request) = app.open_selected() {
                return Action::Load(request);
            }
        }
        KeyCode::Char('f') => {
            let filter = app.gallery.preferences().category_filter.next();
            app.gallery.set_filter(filter);
            app.reset_cursor();
        }
        KeyCode::Char('s') => {
            let key = app.gallery.preferences().sort_key.next();
            app.gallery.set_sort_key(key);
            app.reset_cursor();
        }
        KeyCode::Char('d') => {
            let direction = app.gallery.preferences().sort_direction.toggled();
            app.gallery.set_sort_direction(direction);
            app.reset_cursor();
        }
        KeyCode::Char('?') => app.show_help = true,
        _ => {}
    }
    Action::None
}

fn render_app(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(size);

    render_controls(frame, chunks[0], app);
    render_grid(frame, chunks[1], app);
    render_guide_bar(frame, chunks[2], app);

    if app.gallery.viewer().is_open() {
        render_viewer(frame, size, app);
    }

    if app.show_help {
        render_help_popup(frame, size);
    }
}

fn render_controls(frame: &mut Frame, area: Rect, app: &App) {
    let preferences = app.gallery.preferences();
    let mut spans = vec![
        Span::raw("Filter: "),
        Span::styled(
            preferences.category_filter.to_string(),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  Sort: "),
        Span::styled(
            format!(
                "{} ({})",
                preferences.sort_key.label(),
                preferences.sort_direction.label()
            ),
            Style::default().fg(Color::Yellow),
        ),
    ];
    let sweep = app.gallery.sweep_progress();
    if sweep.in_progress {
        spans.push(Span::styled(
            format!("  Classifying {}/{}", sweep.done, sweep.total),
            Style::default().fg(Color::Cyan),
        ));
    }
    if app.loader.is_loading() {
        spans.push(Span::styled("  Loading", Style::default().fg(Color::DarkGray)));
    }

    let controls = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("AI Art Portfolio"));
    frame.render_widget(controls, area);
}

fn render_grid(frame: &mut Frame, area: Rect, app: &App) {
    let view = app.gallery.view();
    let items = view
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<22}", entry.title),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{:<18}", entry.category.label())),
                Span::styled(
                    format!("{} {}  ", entry.date, entry.time),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(entry.model.clone()),
            ]))
        })
        .collect::<Vec<_>>();

    let title = format!("Entries ({}/{})", view.len(), app.gallery.catalog().len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_stateful_widget(list, area, &mut app.list_state.clone());
}

fn render_viewer(frame: &mut Frame, area: Rect, app: &App) {
    let Some(entry) = app.gallery.active_entry() else {
        return;
    };
    let viewer = app.gallery.viewer();
    let popup = centered_rect(80, 80, area);

    let mut lines = vec![
        Line::from(format!("Category: {}", entry.category)),
        Line::from(format!("Model: {}", entry.model)),
        Line::from(format!("Created: {} {}", entry.date, entry.time)),
        Line::from(format!("Image: {}", entry.image_path)),
        Line::from(""),
        Line::from(Span::styled("Prompt", Style::default().add_modifier(Modifier::BOLD))),
    ];
    if viewer.is_prompt_loading() {
        lines.push(Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.extend(viewer.prompt_text().lines().map(|line| Line::from(line.to_string())));
    }

    let enabled = Style::default().fg(Color::Yellow);
    let disabled = Style::default().fg(Color::DarkGray);
    let copy_label = if viewer.copy_feedback_id() == Some(entry.id) {
        "Copied"
    } else {
        "Copy"
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("← Prev", if app.gallery.can_prev() { enabled } else { disabled }),
        Span::raw("  "),
        Span::styled("Next →", if app.gallery.can_next() { enabled } else { disabled }),
        Span::raw("  "),
        Span::styled(
            format!("[c] {copy_label}"),
            if viewer.is_prompt_loading() { disabled } else { enabled },
        ),
        Span::raw("  [Esc] Close"),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(entry.title.clone())
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn render_guide_bar(frame: &mut Frame, area: Rect, app: &App) {
    let hints: &[(&str, &str)] = if app.gallery.viewer().is_open() {
        &[("←/→", "Navigate"), ("c", "Copy"), ("Esc", "Close")]
    } else {
        &[
            ("↑/↓", "Move"),
            ("Enter", "Open"),
            ("f", "Filter"),
            ("s", "Sort"),
            ("d", "Direction"),
            ("?", "Help"),
            ("q", "Quit"),
        ]
    };
    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {label}  ")));
    }
    let bar = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(bar, area);
}

fn render_help_popup(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 50, area);
    let text = "Browse: ↑/↓ or j/k, Enter to open\n\
                Filter: f cycles categories\n\
                Sort: s cycles keys, d flips direction\n\
                Viewer: ←/→ navigate, c copy, Esc close\n\
                Quit: q";
    let help = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });
    frame.render_widget(Clear, popup);
    frame.render_widget(help, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn restore_terminal(mut terminal: Terminal<ratatui::backend::CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
