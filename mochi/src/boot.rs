//! Boot screen timeline: one line revealed per tick, a short hold, then done.

use std::time::{Duration, Instant};

pub const BOOT_TICK: Duration = Duration::from_millis(50);
pub const BOOT_HOLD: Duration = Duration::from_millis(500);

pub const BOOT_LINES: &[&str] = &[
    "⚡ Initializing Mochi v2.0 boot sequence...",
    "📡 Detecting system architecture...",
    "🔍 Scanning hardware configuration...",
    "🔐 Loading security protocols...",
    "💾 Initializing kernel modules...",
    "⚙️  Configuring core components...",
    "🌐 Establishing agent link...",
    "📊 Initializing performance monitoring...",
    "🎨 Loading terminal interface...",
    "📁 Mounting file system...",
    "🎯 Running system diagnostics...",
    "✅ All systems operational...",
    "🚀 Ready for user interaction...",
    " ",
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━",
    "  ✓ MOCHI system ready",
    "  Type 'help' for available commands",
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Idle,
    /// Number of lines on screen; stays at the full count during the hold.
    Playing(usize),
    Done,
}

#[derive(Debug, Clone)]
pub struct BootSequence {
    started: Option<Instant>,
    lines: &'static [&'static str],
    skipped: bool,
}

impl BootSequence {
    pub fn new() -> Self {
        Self {
            started: None,
            lines: BOOT_LINES,
            skipped: false,
        }
    }

    /// A sequence that is already finished (`--no-boot`).
    pub fn finished() -> Self {
        Self {
            skipped: true,
            ..Self::new()
        }
    }

    /// Idle -> Playing(1). Later calls keep the first start time.
    pub fn start(&mut self, now: Instant) {
        self.started.get_or_insert(now);
    }

    pub fn skip(&mut self) {
        self.skipped = true;
    }

    pub fn lines(&self) -> &'static [&'static str] {
        self.lines
    }

    fn reveal_time(&self) -> Duration {
        BOOT_TICK * self.lines.len().saturating_sub(1) as u32
    }

    pub fn phase(&self, now: Instant) -> BootPhase {
        if self.skipped {
            return BootPhase::Done;
        }
        let Some(started) = self.started else {
            return BootPhase::Idle;
        };
        let elapsed = now.saturating_duration_since(started);
        if elapsed >= self.reveal_time() + BOOT_HOLD {
            return BootPhase::Done;
        }
        let ticks = (elapsed.as_millis() / BOOT_TICK.as_millis()) as usize;
        BootPhase::Playing((ticks + 1).min(self.lines.len()))
    }

    /// Number of lines on screen at `now`.
    pub fn visible(&self, now: Instant) -> usize {
        match self.phase(now) {
            BootPhase::Idle => 0,
            BootPhase::Playing(n) => n,
            BootPhase::Done => self.lines.len(),
        }
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.phase(now) == BootPhase::Done
    }
}

impl Default for BootSequence {
    fn default() -> Self {
        Self::new()
    }
}
