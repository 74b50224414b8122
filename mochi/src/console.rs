//! Terminal pane: input line, bounded scrollback and built-in commands.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::history::push_capped;
use crate::types::{CommandResult, SystemSnapshot};

pub const SCROLLBACK: usize = 1000;
pub const WELCOME: &str = "Welcome to Mochi v2.0\n> Type 'help' for available commands";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Help,
    Clear,
    System,
    Processes,
    Time,
    Date,
    Uptime,
    Ipconfig,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    Nothing,
    Builtin(Builtin),
    Shell(String),
}

/// Classify a submitted line. Built-ins match case-insensitively on the whole line.
pub fn parse(line: &str) -> ConsoleAction {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleAction::Nothing;
    }
    let builtin = match line.to_ascii_lowercase().as_str() {
        "help" => Builtin::Help,
        "clear" => Builtin::Clear,
        "system" => Builtin::System,
        "processes" => Builtin::Processes,
        "time" => Builtin::Time,
        "date" => Builtin::Date,
        "uptime" => Builtin::Uptime,
        "ipconfig" => Builtin::Ipconfig,
        "dir" | "ls" => Builtin::Dir,
        _ => return ConsoleAction::Shell(line.to_string()),
    };
    ConsoleAction::Builtin(builtin)
}

pub struct Console {
    lines: VecDeque<String>,
    pub input: String,
    cap: usize,
}

impl Console {
    pub fn new(cap: usize) -> Self {
        let mut c = Self {
            lines: VecDeque::with_capacity(cap.min(SCROLLBACK)),
            input: String::new(),
            cap,
        };
        c.print(WELCOME);
        c
    }

    pub fn lines(&self) -> &VecDeque<String> {
        &self.lines
    }

    /// Append text; embedded newlines become separate scrollback lines.
    pub fn print(&mut self, text: &str) {
        let text = text.strip_suffix('\n').unwrap_or(text);
        for line in text.split('\n') {
            push_capped(&mut self.lines, line.trim_end_matches('\r').to_string(), self.cap);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.print("Terminal cleared.");
    }

    pub fn type_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Take the input line, echo it, and classify it.
    pub fn submit(&mut self) -> ConsoleAction {
        let line = std::mem::take(&mut self.input);
        let action = parse(&line);
        if action != ConsoleAction::Nothing {
            self.print(&format!("> {}", line.trim()));
        }
        action
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(SCROLLBACK)
    }
}

pub fn help_text() -> &'static str {
    "\
╔════════════════════════════════════════════════╗
║             MOCHI v2.0 - Help Menu             ║
╠════════════════════════════════════════════════╣
║ AVAILABLE COMMANDS:                            ║
║                                                ║
║  help              - Show this help menu       ║
║  clear             - Clear terminal output     ║
║  system            - Show system info          ║
║  processes         - List top processes        ║
║  time              - Show current time         ║
║  date              - Show current date         ║
║  uptime            - Show host uptime          ║
║  ipconfig          - Show network info         ║
║  dir/ls            - Show browser directory    ║
║                                                ║
║ Any other command is run by the system shell   ║
║ Keys: Tab focus · d details (files) · Esc quit ║
╚════════════════════════════════════════════════╝"
}

pub fn system_summary(s: &SystemSnapshot) -> String {
    format!(
        "\
╔════════════════════════════════════════════════╗
║         SYSTEM INFORMATION SUMMARY             ║
╠════════════════════════════════════════════════╣
OS:           {}
Hostname:     {}
IP Address:   {}

CPU:          {}
Cores:        {}
Clock Speed:  {:.2} GHz
Load:         {}

Memory:       {:.2} GB / {:.2} GB
GPU:          {} ({})
╚════════════════════════════════════════════════╝",
        s.os.description,
        s.os.hostname,
        s.network.primary_ipv4,
        s.cpu.name,
        s.cpu.cores,
        s.cpu.speed_ghz,
        s.cpu.load_percent.percent_label(),
        s.memory.used_gib,
        s.memory.total_gib,
        s.gpu.name,
        s.gpu.load_percent.percent_label(),
    )
}

pub fn processes_text(s: &SystemSnapshot) -> String {
    let mut out = format!("{:<30}  {:>6}  {:>10}", "NAME", "CPU %", "RAM MB");
    for p in &s.processes {
        out.push_str(&format!(
            "\n{:<30}  {:>6.1}  {:>10.1}",
            p.name, p.cpu_percent, p.memory_mb
        ));
    }
    if s.processes.is_empty() {
        out.push_str("\n(no process data)");
    }
    out
}

pub fn uptime_text(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    format!("System uptime: {days}d {hours}h {minutes}m")
}

pub fn ipconfig_text(s: &SystemSnapshot) -> String {
    format!(
        "IP Address: {}\nHostname: {}",
        s.network.primary_ipv4, s.os.hostname
    )
}

pub fn time_text(now: DateTime<Local>) -> String {
    now.format("%H:%M:%S").to_string()
}

pub fn date_text(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Terminal text for one shell result: error first, then output, then the OK line.
pub fn format_result(r: &CommandResult) -> String {
    if !r.error.is_empty() {
        format!("[ERROR] {}", r.error)
    } else if !r.output.is_empty() {
        r.output.clone()
    } else {
        "[OK] Command executed successfully".into()
    }
}
