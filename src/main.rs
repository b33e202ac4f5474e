mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
};
use velo::{
    app_dirs::AppDirs,
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore},
    corpus::{Category, Corpus, Difficulty},
    history::{export_csv, Scoreboard, SessionOutcome, SessionRecord},
    logging,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    session::{Outcome, SessionConfig, TimerMode, DURATION_CHOICES},
    store::{KeyValueStore, MemoryStore, SqliteStore},
    SessionEvent, SessionStatus, TypingEngine,
};

/// Frame step handed to the confetti animation, matching the runner's frame cadence
const FRAME_SECS: f64 = 0.1;

/// typing speed test with live wpm, accuracy and a local personal best
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test. Type the passage shown; words per minute, accuracy and your streak update live, and each finished session is compared against your personal best."
)]
pub struct Cli {
    /// passage difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// passage category
    #[clap(short = 'c', long, value_enum)]
    category: Option<Category>,

    /// timed countdown or type the whole passage
    #[clap(short = 'm', long, value_enum)]
    mode: Option<TimerMode>,

    /// countdown length in seconds for timed mode (15, 30 or 60)
    #[clap(short = 's', long, value_parser = parse_duration)]
    duration: Option<u32>,

    /// custom passage to type instead of one from the corpus
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// disable the bell on mistakes
    #[clap(long)]
    mute: bool,

    /// number of past results to keep
    #[clap(long)]
    history_limit: Option<usize>,

    /// write the result history as csv to PATH and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// ignore saved preferences and start from defaults
    #[clap(long)]
    reset_config: bool,
}

fn parse_duration(s: &str) -> Result<u32, String> {
    let secs: u32 = s.parse().map_err(|e| format!("{e}"))?;
    if DURATION_CHOICES.contains(&secs) {
        Ok(secs)
    } else {
        Err(format!("duration must be one of {DURATION_CHOICES:?}"))
    }
}

impl Cli {
    /// Flags given on the command line win over saved preferences
    fn merge_into(&self, config: &mut Config) {
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(category) = self.category {
            config.category = category;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(limit) = self.history_limit {
            config.history_limit = limit.max(1);
        }
        if self.mute {
            config.sound = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
    History,
}

pub struct App {
    pub engine: TypingEngine<Box<dyn KeyValueStore>>,
    pub config: Config,
    pub config_store: FileConfigStore,
    pub state: AppState,
    pub last_result: Option<(SessionRecord, SessionOutcome)>,
    pub celebration: Celebration,
    pub history_scroll: usize,
    pub custom_prompt: Option<String>,
    pending_bell: bool,
}

impl App {
    pub fn new(
        config: Config,
        config_store: FileConfigStore,
        store: Box<dyn KeyValueStore>,
        custom_prompt: Option<String>,
    ) -> Self {
        let engine = TypingEngine::new(
            Corpus::embedded(),
            store,
            config.session_config(),
            config.history_limit,
        );

        let mut app = Self {
            engine,
            config,
            config_store,
            state: AppState::Typing,
            last_result: None,
            celebration: Celebration::new(),
            history_scroll: 0,
            custom_prompt,
            pending_bell: false,
        };
        if app.custom_prompt.is_some() {
            app.new_session();
        }
        app
    }

    pub fn new_session(&mut self) {
        let session_config = self.config.session_config();
        match self.custom_prompt.as_deref().filter(|p| !p.is_empty()) {
            Some(prompt) => self.engine.initialize_with_passage(session_config, prompt),
            None => self.engine.initialize(session_config),
        }
        self.celebration.stop();
        self.last_result = None;
    }

    fn change_settings(&mut self, change: impl FnOnce(&mut SessionConfig)) {
        let mut session_config = *self.engine.session().config();
        change(&mut session_config);
        self.config.apply_session_config(&session_config);
        self.save_config();
        self.new_session();
    }

    fn toggle_sound(&mut self) {
        self.config.sound = !self.config.sound;
        self.save_config();
    }

    fn save_config(&self) {
        if let Err(e) = self.config_store.save(&self.config) {
            tracing::warn!(error = %e, "failed to save config");
        }
    }

    /// Apply engine notifications to presentation state
    fn handle_session_events(&mut self, width: u16, height: u16) {
        for event in self.engine.drain_events() {
            match event {
                SessionEvent::FocusRequested => {
                    self.state = AppState::Typing;
                    self.history_scroll = 0;
                }
                SessionEvent::Keystroke(Outcome::Incorrect) if self.config.sound => {
                    self.pending_bell = true;
                }
                SessionEvent::Keystroke(_) => {}
                SessionEvent::Finished { record, outcome } => {
                    if outcome == SessionOutcome::HighScore {
                        self.celebration.start(width, height);
                    }
                    self.last_result = Some((record, outcome));
                    self.state = AppState::Results;
                }
            }
        }
    }

    fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.pending_bell)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let _log_guard = AppDirs::state_dir().and_then(|dir| logging::init(&dir, "info").ok());

    let config_store = FileConfigStore::new();
    let mut config = if cli.reset_config {
        Config::default()
    } else {
        config_store.load()
    };
    cli.merge_into(&mut config);
    if let Err(e) = config_store.save(&config) {
        tracing::warn!(error = %e, "failed to save config");
    }

    let store = open_score_store();

    if let Some(path) = cli.export_history.as_ref() {
        let board = Scoreboard::load(&store, config.history_limit);
        let rows = export_csv(board.history(), path)?;
        println!("exported {rows} results to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, config_store, store, cli.prompt);
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let res = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn open_score_store() -> Box<dyn KeyValueStore> {
    let Some(path) = AppDirs::scores_db_path() else {
        tracing::warn!("no state directory, scores will not be kept");
        return Box::new(MemoryStore::new());
    };

    match SqliteStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "falling back to in-memory scores");
            Box::new(MemoryStore::new())
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Continue,
    /// First keystroke of a session; the clock starts now
    Started,
    NewSession,
    Quit,
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let size = terminal.size()?;

        match runner.step() {
            AppEvent::Tick => {
                if app.engine.session().has_started() {
                    app.engine.tick();
                    app.handle_session_events(size.width, size.height);
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            AppEvent::Frame => {
                if app.celebration.is_active {
                    app.celebration.update(FRAME_SECS);
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Key(key) => {
                match handle_key(app, key) {
                    KeyAction::Quit => break,
                    KeyAction::Started | KeyAction::NewSession => runner.reset_ticks(),
                    KeyAction::Continue => {}
                }
                app.handle_session_events(size.width, size.height);
                if app.take_bell() {
                    let mut out = io::stdout();
                    out.write_all(b"\x07")?;
                    out.flush()?;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Tab => {
            app.new_session();
            return KeyAction::NewSession;
        }
        _ => {}
    }

    if ctrl {
        return match key.code {
            KeyCode::Char('d') => {
                app.change_settings(|c| c.difficulty = c.difficulty.next());
                KeyAction::NewSession
            }
            KeyCode::Char('g') => {
                app.change_settings(|c| c.category = c.category.next());
                KeyAction::NewSession
            }
            KeyCode::Char('t') => {
                app.change_settings(|c| {
                    c.mode = match c.mode {
                        TimerMode::Timed => TimerMode::Passage,
                        TimerMode::Passage => TimerMode::Timed,
                    }
                });
                KeyAction::NewSession
            }
            KeyCode::Char('l') => {
                app.change_settings(|c| c.duration_secs = next_duration(c.duration_secs));
                KeyAction::NewSession
            }
            KeyCode::Char('s') => {
                app.toggle_sound();
                KeyAction::Continue
            }
            _ => KeyAction::Continue,
        };
    }

    match app.state {
        AppState::Typing => {
            let was_idle = app.engine.status() == SessionStatus::Idle;
            match key.code {
                KeyCode::Backspace => app.engine.backspace(),
                KeyCode::Char(c) => app.engine.type_char(c),
                _ => {}
            }
            if was_idle && app.engine.status() == SessionStatus::Running {
                return KeyAction::Started;
            }
        }
        AppState::Results => match key.code {
            KeyCode::Char('r') | KeyCode::Enter => {
                app.new_session();
                return KeyAction::NewSession;
            }
            KeyCode::Char('h') => app.state = AppState::History,
            KeyCode::Char('q') => return KeyAction::Quit,
            _ => {}
        },
        AppState::History => match key.code {
            KeyCode::Char('b') | KeyCode::Backspace => {
                app.state = if app.last_result.is_some() {
                    AppState::Results
                } else {
                    AppState::Typing
                };
            }
            KeyCode::Char('r') | KeyCode::Enter => {
                app.new_session();
                return KeyAction::NewSession;
            }
            KeyCode::Up => app.history_scroll = app.history_scroll.saturating_sub(1),
            KeyCode::Down => app.history_scroll += 1,
            KeyCode::PageUp => app.history_scroll = app.history_scroll.saturating_sub(10),
            KeyCode::PageDown => app.history_scroll += 10,
            KeyCode::Home => app.history_scroll = 0,
            KeyCode::Char('q') => return KeyAction::Quit,
            _ => {}
        },
    }

    KeyAction::Continue
}

fn next_duration(current: u32) -> u32 {
    DURATION_CHOICES
        .iter()
        .copied()
        .find(|&d| d > current)
        .unwrap_or(DURATION_CHOICES[0])
}
