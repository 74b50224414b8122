//! Small utilities to manage bounded history buffers for charts.

use std::collections::VecDeque;

/// Samples kept for the CPU/RAM sparklines.
pub const STATS_HISTORY: usize = 60;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if cap == 0 {
        return;
    }
    while dq.len() >= cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

// CPU load and RAM usage percentages (0..=100), oldest first
pub struct StatHistory {
    pub cpu: VecDeque<u64>,
    pub ram: VecDeque<u64>,
    cap: usize,
}

impl StatHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            cpu: VecDeque::with_capacity(cap),
            ram: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// A missing CPU reading is charted as 0 so both series stay aligned.
    pub fn push(&mut self, cpu: Option<f64>, ram: f64) {
        let pct = |v: f64| v.clamp(0.0, 100.0).round() as u64;
        push_capped(&mut self.cpu, cpu.map(pct).unwrap_or(0), self.cap);
        push_capped(&mut self.ram, pct(ram), self.cap);
    }

    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }
}

impl Default for StatHistory {
    fn default() -> Self {
        Self::new(STATS_HISTORY)
    }
}
