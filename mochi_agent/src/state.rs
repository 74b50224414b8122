//! Shared agent state: persistent sysinfo handles and the command executor.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tokio::sync::Mutex;

use crate::config::AgentConfig;
use crate::exec::{ExecError, Executor};
use crate::metrics::process_refresh_kind;

pub type SharedSystem = Arc<Mutex<System>>;

#[derive(Clone)]
pub struct AppState {
    // Persistent sysinfo handles; CPU usage is a delta between refreshes, so
    // the handles outlive single requests. Snapshots themselves are never kept.
    pub sys: SharedSystem,   // cpu + memory
    pub procs: SharedSystem, // process table

    pub executor: Arc<Executor>,
    pub source_timeout: Duration,

    // GPU probing is skipped once the first probe found nothing
    pub gpu_checked: Arc<AtomicBool>,
    pub gpu_present: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &AgentConfig) -> Result<Self, ExecError> {
        let sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        let procs = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing())
                .with_processes(process_refresh_kind()),
        );

        Ok(Self {
            sys: Arc::new(Mutex::new(sys)),
            procs: Arc::new(Mutex::new(procs)),
            executor: Arc::new(Executor::new(&config.exec)?),
            source_timeout: config.source_timeout,
            gpu_checked: Arc::new(AtomicBool::new(false)),
            gpu_present: Arc::new(AtomicBool::new(false)),
        })
    }
}
