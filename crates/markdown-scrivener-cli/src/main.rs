use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use markdown_scrivener_config::{Config, EditorConfig};
use markdown_scrivener_engine::{Editor, EngineOptions, Key, KeyInput};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    time::{Duration, Instant},
};

mod view;

/// Longest wait for input before the editor gets a tick anyway.
const IDLE_POLL: Duration = Duration::from_millis(100);

struct App {
    path: PathBuf,
    editor: Editor,
    saved: String,
    status: String,
    scroll: u16,
}

impl App {
    fn open(path: PathBuf, options: EngineOptions) -> Result<Self> {
        let content = if path.exists() {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        } else {
            String::new()
        };

        let mut editor = Editor::new(options);
        editor.set_content(&content);
        let saved = editor.get_markdown();
        log::info!(
            "Opened {} with {} blocks",
            path.display(),
            editor.surface().blocks().len()
        );

        Ok(Self {
            path,
            editor,
            saved,
            status: String::new(),
            scroll: 0,
        })
    }

    fn is_dirty(&self) -> bool {
        self.editor.get_markdown() != self.saved
    }

    fn save(&mut self) -> Result<()> {
        self.editor.flush_history();
        let markdown = self.editor.get_markdown();
        std::fs::write(&self.path, &markdown)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        self.saved = markdown;
        self.status = format!("Saved {}", self.path.display());
        log::info!("{}", self.status);
        Ok(())
    }

    fn keep_caret_visible(&mut self, row: u16, height: u16) {
        if row < self.scroll {
            self.scroll = row;
        } else if height > 0 && row >= self.scroll + height {
            self.scroll = row - height + 1;
        }
    }
}

fn engine_options(config: &EditorConfig) -> EngineOptions {
    EngineOptions {
        history_max_size: config.history_max_size,
        history_debounce: config.history_debounce(),
        reformat_delay: config.reformat_delay(),
        typing_gate: config.typing_gate(),
        parse_cache_size: config.parse_cache_size,
        preserve_structure: config.preserve_structure,
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let Some(log_file) = log_file else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn key_input(key: KeyEvent) -> Option<KeyInput> {
    let code = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::ArrowLeft,
        KeyCode::Right => Key::ArrowRight,
        KeyCode::Up => Key::ArrowUp,
        KeyCode::Down => Key::ArrowDown,
        KeyCode::Tab => Key::Tab,
        KeyCode::Esc => Key::Escape,
        _ => return None,
    };
    Some(KeyInput {
        key: code,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
        meta: key.modifiers.contains(KeyModifiers::SUPER),
    })
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let (print_only, path) = match args.as_slice() {
        [_, path] => (false, PathBuf::from(path)),
        [_, flag, path] if flag == "--print" => (true, PathBuf::from(path)),
        _ => {
            eprintln!("Usage: {} [--print] <file.md>", args[0]);
            process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    init_logging(config.log_file.as_deref())?;
    log::info!("Config path: {}", Config::config_path().display());

    let mut app = App::open(path, engine_options(&config.editor))?;

    // Loads and re-serializes without touching the terminal
    if print_only {
        print!("{}", app.editor.get_markdown());
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.editor.destroy();
    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let now = Instant::now();
        let timeout = app
            .editor
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL);

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                KeyCode::Char('q') if ctrl => return Ok(()),
                KeyCode::Esc => return Ok(()),
                KeyCode::Char('s') if ctrl => {
                    if let Err(e) = app.save() {
                        app.status = format!("{e:#}");
                        log::warn!("{}", app.status);
                    }
                }
                _ => {
                    if let Some(input) = key_input(key) {
                        app.status.clear();
                        app.editor.handle_key(input, Instant::now());
                    }
                }
            }
        }

        app.editor.tick(Instant::now());
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let view = view::render(&app.editor);
    let inner_height = chunks[0].height.saturating_sub(2);
    if let Some((_, row)) = view.caret {
        app.keep_caret_visible(row, inner_height);
    }

    let title = format!(
        "{}{}",
        app.path.display(),
        if app.is_dirty() { " [+]" } else { "" }
    );
    let content = Paragraph::new(view.lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((app.scroll, 0));
    f.render_widget(content, chunks[0]);

    if let Some((col, row)) = view.caret
        && row >= app.scroll
    {
        let x = chunks[0].x + 1 + col;
        let y = chunks[0].y + 1 + (row - app.scroll);
        f.set_cursor_position((x, y));
    }

    let metrics = app.editor.history_metrics();
    let help_text = Line::from(vec![
        Span::raw("Esc/Ctrl+Q: Quit | "),
        Span::raw("Ctrl+S: Save | "),
        Span::raw("Ctrl+Z / Ctrl+Y: Undo / Redo | "),
        Span::styled(
            format!("history {}", metrics.stack_size),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(if app.status.is_empty() { "" } else { " | " }),
        Span::styled(app.status.clone(), Style::default().fg(Color::Yellow)),
    ]);
    f.render_widget(Paragraph::new(vec![help_text]), chunks[1]);
}
