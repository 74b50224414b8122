//! App state and main loop: input handling, polling the agent, and drawing.
//!
//! Key handling and bridge results are applied synchronously to `App`; anything
//! that needs the agent is returned as a [`Task`] and run on a spawned tokio
//! task, which reports back through a channel as a [`UiEvent`].

use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::boot::BootSequence;
use crate::console::{self, Builtin, Console, ConsoleAction};
use crate::explorer::{start_path, Activation, Explorer};
use crate::history::StatHistory;
use crate::types::{CommandResult, DirectoryListing, SystemSnapshot};
use crate::ui::{
    boot::draw_boot, console::draw_console, detail::draw_detail, explorer::draw_explorer,
    header::draw_header, processes::draw_top_processes, stats::draw_stats,
};
use crate::ws::{BridgeClient, BridgeError};

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
const FRAME: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Terminal,
    Browser,
}

/// Work that needs the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Poll(u64),
    Execute(String),
    List(String),
}

#[derive(Debug)]
pub enum UiEvent {
    Snapshot(u64, Result<SystemSnapshot, BridgeError>),
    Command(Result<CommandResult, BridgeError>),
    Listing(String, Result<DirectoryListing, BridgeError>),
}

pub struct App {
    pub snapshot: Option<SystemSnapshot>,
    pub history: StatHistory,
    pub console: Console,
    pub explorer: Explorer,
    pub boot: BootSequence,
    pub focus: Focus,
    pub show_detail: bool,
    pub connected: bool,
    pub should_quit: bool,

    // Poll results older than the newest applied one are dropped
    next_poll: u64,
    applied_poll: u64,
    last_poll: Option<Instant>,
}

impl App {
    pub fn new(boot: BootSequence) -> Self {
        Self {
            snapshot: None,
            history: StatHistory::default(),
            console: Console::default(),
            explorer: Explorer::new(start_path()),
            boot,
            focus: Focus::Terminal,
            show_detail: false,
            connected: true,
            should_quit: false,
            next_poll: 0,
            applied_poll: 0,
            last_poll: None,
        }
    }

    /// Tasks to run when the main screen first comes up.
    pub fn startup_tasks(&mut self) -> Vec<Task> {
        vec![self.poll_task(Instant::now()), Task::List(self.explorer.path.clone())]
    }

    /// A poll task if the interval has passed.
    pub fn due_poll(&mut self, now: Instant) -> Option<Task> {
        match self.last_poll {
            Some(t) if now.duration_since(t) < POLL_INTERVAL => None,
            _ => Some(self.poll_task(now)),
        }
    }

    fn poll_task(&mut self, now: Instant) -> Task {
        self.last_poll = Some(now);
        self.next_poll += 1;
        Task::Poll(self.next_poll)
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<Task> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c || key.code == KeyCode::Esc {
            self.should_quit = true;
            return None;
        }
        if !self.boot.is_done(now) {
            self.boot.skip();
            return None;
        }
        if key.code == KeyCode::Tab {
            self.focus = match self.focus {
                Focus::Terminal => Focus::Browser,
                Focus::Browser => Focus::Terminal,
            };
            return None;
        }
        match self.focus {
            Focus::Browser => self.browser_key(key.code),
            Focus::Terminal => self.terminal_key(key.code),
        }
    }

    fn browser_key(&mut self, code: KeyCode) -> Option<Task> {
        match code {
            KeyCode::Up => self.explorer.select_prev(),
            KeyCode::Down => self.explorer.select_next(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('d') | KeyCode::Char('D') => self.show_detail = !self.show_detail,
            KeyCode::Enter => match self.explorer.activate() {
                Activation::Navigate(target) => return Some(Task::List(target)),
                Activation::File(name) => {
                    self.console.print(&format!("[INFO] Selected file: {name}"))
                }
                Activation::AtRoot | Activation::Nothing => {}
            },
            _ => {}
        }
        None
    }

    fn terminal_key(&mut self, code: KeyCode) -> Option<Task> {
        match code {
            KeyCode::Char(c) => self.console.type_char(c),
            KeyCode::Backspace => self.console.backspace(),
            KeyCode::Enter => match self.console.submit() {
                ConsoleAction::Nothing => {}
                ConsoleAction::Builtin(b) => self.run_builtin(b),
                ConsoleAction::Shell(line) => return Some(Task::Execute(line)),
            },
            _ => {}
        }
        None
    }

    fn run_builtin(&mut self, builtin: Builtin) {
        let now = chrono::Local::now();
        let text = match (builtin, self.snapshot.as_ref()) {
            (Builtin::Help, _) => console::help_text().to_string(),
            (Builtin::Clear, _) => {
                self.console.clear();
                return;
            }
            (Builtin::Time, _) => console::time_text(now),
            (Builtin::Date, _) => console::date_text(now),
            (Builtin::Dir, _) => format!("[Current Path: {}]", self.explorer.path),
            (Builtin::System, Some(s)) => console::system_summary(s),
            (Builtin::Processes, Some(s)) => console::processes_text(s),
            (Builtin::Uptime, Some(s)) => console::uptime_text(s.uptime_seconds),
            (Builtin::Ipconfig, Some(s)) => console::ipconfig_text(s),
            (_, None) => "[INFO] System data not available yet".into(),
        };
        self.console.print(&text);
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Snapshot(seq, result) => {
                if seq <= self.applied_poll {
                    return;
                }
                self.applied_poll = seq;
                match result {
                    Ok(s) => {
                        self.connected = true;
                        self.history
                            .push(s.cpu.load_percent.value(), s.memory.used_percent());
                        self.snapshot = Some(s);
                    }
                    // Keep showing the last snapshot; flag the link
                    Err(_) => self.connected = false,
                }
            }
            UiEvent::Command(Ok(r)) => self.console.print(&console::format_result(&r)),
            UiEvent::Command(Err(e)) => self.console.print(&format!("[ERROR] {e}")),
            UiEvent::Listing(target, Ok(listing)) => {
                if self.explorer.apply(listing).is_err() {
                    self.console
                        .print(&format!("[ERROR] Access denied: \"{target}\""));
                }
            }
            UiEvent::Listing(_, Err(e)) => self.console.print(&format!("[ERROR] {e}")),
        }
    }

    pub async fn run(&mut self, client: BridgeClient) -> anyhow::Result<()> {
        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal, &client).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        client: &BridgeClient,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<UiEvent>();
        let mut started = false;

        self.boot.start(Instant::now());

        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    if let Some(task) = self.handle_key(k, Instant::now()) {
                        spawn_task(client, &tx, task);
                    }
                }
            }
            if self.should_quit {
                break;
            }

            let now = Instant::now();
            if self.boot.is_done(now) {
                let tasks = if started {
                    self.due_poll(now).into_iter().collect()
                } else {
                    started = true;
                    self.startup_tasks()
                };
                for task in tasks {
                    spawn_task(client, &tx, task);
                }
            }

            while let Ok(ev) = rx.try_recv() {
                self.apply(ev);
            }

            terminal.draw(|f| self.draw(f))?;
            sleep(FRAME).await;
        }

        Ok(())
    }

    pub fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();
        let now = Instant::now();
        if !self.boot.is_done(now) {
            draw_boot(f, area, &self.boot, now);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(10)])
            .split(area);
        draw_header(f, rows[0], self.snapshot.as_ref(), self.connected);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(36), Constraint::Percentage(64)])
            .split(rows[1]);

        // Left: stats + processes, or the detail view
        if self.show_detail {
            draw_detail(f, cols[0], self.snapshot.as_ref());
        } else {
            let left = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(14), Constraint::Min(5)])
                .split(cols[0]);
            draw_stats(f, left[0], self.snapshot.as_ref(), &self.history);
            draw_top_processes(f, left[1], self.snapshot.as_ref());
        }

        // Right: browser over terminal
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(cols[1]);
        draw_explorer(f, right[0], &self.explorer, self.focus == Focus::Browser);
        draw_console(f, right[1], &self.console, self.focus == Focus::Terminal);
    }
}

fn spawn_task(client: &BridgeClient, tx: &mpsc::UnboundedSender<UiEvent>, task: Task) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match task {
            Task::Poll(seq) => UiEvent::Snapshot(seq, client.system_info().await),
            Task::Execute(line) => UiEvent::Command(client.execute(&line).await),
            Task::List(path) => {
                let result = client.dir_contents(&path).await;
                UiEvent::Listing(path, result)
            }
        };
        let _ = tx.send(event);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CpuInfo, DirEntry, GpuInfo, MemoryInfo, NetworkInfo, OsInfo, Reading, Sentinel,
    };

    fn app() -> App {
        let mut a = App::new(BootSequence::finished());
        a.explorer.path = "/srv".into();
        a
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot(load: f64) -> SystemSnapshot {
        SystemSnapshot {
            cpu: CpuInfo {
                name: "cpu".into(),
                cores: 4,
                speed_ghz: 2.5,
                load_percent: Reading::Value(load),
            },
            gpu: GpuInfo {
                name: "unavailable".into(),
                load_percent: Reading::Missing(Sentinel::Unavailable),
            },
            memory: MemoryInfo {
                used_gib: 4.0,
                total_gib: 8.0,
            },
            os: OsInfo {
                description: "Linux".into(),
                hostname: "box".into(),
            },
            network: NetworkInfo {
                primary_ipv4: "10.0.0.2".into(),
            },
            processes: vec![],
            uptime_seconds: 3600,
        }
    }

    fn last_line(a: &App) -> String {
        a.console.lines().back().cloned().unwrap_or_default()
    }

    #[test]
    fn stale_poll_results_are_discarded() {
        let mut a = app();
        let t0 = Instant::now();
        let Some(Task::Poll(first)) = a.due_poll(t0) else {
            panic!("expected poll");
        };
        assert_eq!(a.due_poll(t0 + Duration::from_millis(500)), None);
        let Some(Task::Poll(second)) = a.due_poll(t0 + POLL_INTERVAL) else {
            panic!("expected poll");
        };
        assert!(second > first);

        a.apply(UiEvent::Snapshot(second, Ok(snapshot(20.0))));
        a.apply(UiEvent::Snapshot(first, Ok(snapshot(90.0))));
        assert_eq!(
            a.snapshot.as_ref().map(|s| s.cpu.load_percent),
            Some(Reading::Value(20.0))
        );
        assert_eq!(a.history.len(), 1);
    }

    #[test]
    fn failed_poll_keeps_last_snapshot_and_flags_link() {
        let mut a = app();
        a.apply(UiEvent::Snapshot(1, Ok(snapshot(5.0))));
        a.apply(UiEvent::Snapshot(2, Err(BridgeError::Disconnected)));
        assert!(!a.connected);
        assert!(a.snapshot.is_some());
    }

    #[test]
    fn typed_shell_command_becomes_execute_task() {
        let mut a = app();
        let now = Instant::now();
        for c in "echo hi".chars() {
            assert_eq!(a.handle_key(key(KeyCode::Char(c)), now), None);
        }
        assert_eq!(
            a.handle_key(key(KeyCode::Enter), now),
            Some(Task::Execute("echo hi".into()))
        );
        assert_eq!(last_line(&a), "> echo hi");
    }

    #[test]
    fn command_results_are_printed() {
        let mut a = app();
        a.apply(UiEvent::Command(Ok(CommandResult {
            output: String::new(),
            error: "Invalid command".into(),
        })));
        assert_eq!(last_line(&a), "[ERROR] Invalid command");
        a.apply(UiEvent::Command(Ok(CommandResult {
            output: String::new(),
            error: String::new(),
        })));
        assert_eq!(last_line(&a), "[OK] Command executed successfully");
    }

    #[test]
    fn builtins_run_locally() {
        let mut a = app();
        let now = Instant::now();
        for c in "ls".chars() {
            a.handle_key(key(KeyCode::Char(c)), now);
        }
        assert_eq!(a.handle_key(key(KeyCode::Enter), now), None);
        assert_eq!(last_line(&a), "[Current Path: /srv]");

        a.apply(UiEvent::Snapshot(1, Ok(snapshot(1.0))));
        for c in "uptime".chars() {
            a.handle_key(key(KeyCode::Char(c)), now);
        }
        a.handle_key(key(KeyCode::Enter), now);
        assert_eq!(last_line(&a), "System uptime: 0d 1h 0m");
    }

    #[test]
    fn browser_focus_navigation_and_file_selection() {
        let mut a = app();
        let now = Instant::now();
        a.handle_key(key(KeyCode::Tab), now);
        assert_eq!(a.focus, Focus::Browser);

        a.apply(UiEvent::Listing(
            "/srv".into(),
            Ok(DirectoryListing {
                success: true,
                resolved_path: Some("/srv".into()),
                entries: Some(vec![
                    DirEntry {
                        name: "..".into(),
                        is_directory: true,
                        is_parent_marker: true,
                    },
                    DirEntry {
                        name: "data".into(),
                        is_directory: true,
                        is_parent_marker: false,
                    },
                    DirEntry {
                        name: "readme.md".into(),
                        is_directory: false,
                        is_parent_marker: false,
                    },
                ]),
                error: None,
            }),
        ));
        a.handle_key(key(KeyCode::Down), now);
        let task = a.handle_key(key(KeyCode::Enter), now);
        assert!(matches!(task, Some(Task::List(ref p)) if p.ends_with("data")));

        a.handle_key(key(KeyCode::Down), now);
        assert_eq!(a.handle_key(key(KeyCode::Enter), now), None);
        assert_eq!(last_line(&a), "[INFO] Selected file: readme.md");

        a.handle_key(key(KeyCode::Char('d')), now);
        assert!(a.show_detail);
        a.handle_key(key(KeyCode::Char('q')), now);
        assert!(a.should_quit);
    }

    #[test]
    fn failed_listing_reports_access_denied() {
        let mut a = app();
        a.apply(UiEvent::Listing(
            "/root".into(),
            Ok(DirectoryListing {
                success: false,
                resolved_path: None,
                entries: None,
                error: Some("Cannot access directory: permission denied".into()),
            }),
        ));
        assert_eq!(last_line(&a), "[ERROR] Access denied: \"/root\"");
        assert_eq!(a.explorer.path, "/srv");
    }

    #[test]
    fn any_key_skips_boot_and_esc_quits() {
        let t0 = Instant::now();
        let mut boot = BootSequence::new();
        boot.start(t0);
        let mut a = App::new(boot);
        assert_eq!(a.handle_key(key(KeyCode::Char('x')), t0), None);
        assert!(a.boot.is_done(t0));
        assert!(a.console.input.is_empty());
        a.handle_key(key(KeyCode::Esc), t0);
        assert!(a.should_quit);
    }

    #[test]
    fn ctrl_c_quits_from_terminal_focus() {
        let mut a = app();
        a.handle_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(a.should_quit);
        assert!(a.console.input.is_empty());
    }
}
