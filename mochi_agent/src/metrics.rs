//! Snapshot collection using sysinfo for mochi_agent.
//!
//! Every field group is read on the blocking pool under its own timeout and the
//! groups are joined concurrently. A group that errors, panics or stalls is
//! replaced by its degraded default, so `collect_snapshot` always returns a
//! complete snapshot within roughly one source timeout.

use std::cmp::Ordering;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::Duration;

use sysinfo::{Networks, ProcessRefreshKind, ProcessesToUpdate, System};
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tracing::warn;

use crate::gpu::{gpu_enabled, probe_gpu};
use crate::state::{AppState, SharedSystem};
use crate::types::{
    CpuInfo, GpuInfo, MemoryInfo, NetworkInfo, OsInfo, ProcessSample, Reading, SystemSnapshot,
    UNAVAILABLE,
};

pub const TOP_PROCESSES: usize = 10;
pub const PROCESS_NAME_MAX: usize = 30;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0} source returned no data")]
    Empty(&'static str),

    #[error("gpu probe failed: {0}")]
    Gpu(String),
}

pub async fn collect_snapshot(state: &AppState) -> SystemSnapshot {
    let limit = state.source_timeout;

    let (cpu, gpu, memory, os, network, processes) = tokio::join!(
        gather_locked("cpu", limit, state.sys.clone(), read_cpu),
        collect_gpu(state),
        gather_locked("memory", limit, state.sys.clone(), read_memory),
        gather("os", limit, || Ok(read_os())),
        gather("network", limit, read_network),
        gather_locked("processes", limit, state.procs.clone(), read_processes),
    );

    SystemSnapshot {
        cpu: cpu.unwrap_or_else(degraded_cpu),
        gpu,
        memory: memory.unwrap_or(MemoryInfo {
            used_gib: 0.0,
            total_gib: 0.0,
        }),
        os: os.unwrap_or_else(|| OsInfo {
            description: "unknown".into(),
            hostname: "unknown".into(),
        }),
        network: network.unwrap_or_else(|| NetworkInfo {
            primary_ipv4: UNAVAILABLE.into(),
        }),
        processes: processes.unwrap_or_default(),
        uptime_seconds: System::uptime(),
    }
}

/// Run one source on the blocking pool, bounded by `limit`. `None` means degrade.
async fn gather<T, F>(source: &'static str, limit: Duration, read: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SourceError> + Send + 'static,
{
    settle(
        source,
        limit,
        tokio::time::timeout(limit, tokio::task::spawn_blocking(read)).await,
    )
}

/// Like [`gather`], for sources that refresh a shared sysinfo handle.
///
/// The lock is awaited inside the timeout, before any blocking thread is taken,
/// so a refresh that stalls while holding the handle ties up one thread at most.
async fn gather_locked<T, F>(
    source: &'static str,
    limit: Duration,
    handle: SharedSystem,
    read: F,
) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(&mut System) -> Result<T, SourceError> + Send + 'static,
{
    let job = async move {
        let mut sys = handle.lock_owned().await;
        tokio::task::spawn_blocking(move || read(&mut *sys)).await
    };
    settle(source, limit, tokio::time::timeout(limit, job).await)
}

fn settle<T>(
    source: &'static str,
    limit: Duration,
    outcome: Result<Result<Result<T, SourceError>, JoinError>, Elapsed>,
) -> Option<T> {
    match outcome {
        Ok(Ok(Ok(v))) => Some(v),
        Ok(Ok(Err(e))) => {
            warn!(source, error = %e, "stat source unavailable");
            None
        }
        Ok(Err(e)) => {
            warn!(source, error = %e, "stat source panicked");
            None
        }
        Err(_) => {
            warn!(source, timeout_ms = limit.as_millis() as u64, "stat source timed out");
            None
        }
    }
}

async fn collect_gpu(state: &AppState) -> GpuInfo {
    if !gpu_enabled() {
        return GpuInfo::unavailable();
    }
    // If we already determined none exist, short-circuit (no repeated probing)
    if state.gpu_checked.load(AtomicOrdering::Acquire)
        && !state.gpu_present.load(AtomicOrdering::Relaxed)
    {
        return GpuInfo::unavailable();
    }
    let found = gather("gpu", state.source_timeout, probe_gpu).await;
    if !state.gpu_checked.swap(true, AtomicOrdering::AcqRel) {
        state
            .gpu_present
            .store(found.is_some(), AtomicOrdering::Release);
    }
    found.unwrap_or_else(GpuInfo::unavailable)
}

fn read_cpu(sys: &mut System) -> Result<CpuInfo, SourceError> {
    sys.refresh_cpu_all();

    let cpus = sys.cpus();
    let first = cpus.first().ok_or(SourceError::Empty("cpu"))?;
    let brand = first.brand().trim();

    Ok(CpuInfo {
        name: if brand.is_empty() {
            UNAVAILABLE.into()
        } else {
            brand.to_string()
        },
        cores: cpus.len(),
        speed_ghz: round2(first.frequency() as f64 / 1000.0),
        load_percent: Reading::Value(round1(
            f64::from(sys.global_cpu_usage()).clamp(0.0, 100.0),
        )),
    })
}

fn degraded_cpu() -> CpuInfo {
    CpuInfo {
        name: UNAVAILABLE.into(),
        cores: available_cores(),
        speed_ghz: 0.0,
        load_percent: Reading::unavailable(),
    }
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn read_memory(sys: &mut System) -> Result<MemoryInfo, SourceError> {
    sys.refresh_memory();

    let total = sys.total_memory();
    if total == 0 {
        return Err(SourceError::Empty("memory"));
    }
    let used = memory_used(total, sys.used_memory(), sys.available_memory());
    Ok(MemoryInfo {
        used_gib: round2(used as f64 / GIB),
        total_gib: round2(total as f64 / GIB),
    })
}

/// Prefer the direct "used" figure; fall back to total minus available. Never above total.
pub fn memory_used(total: u64, used: u64, available: u64) -> u64 {
    if used == 0 || used > total {
        total.saturating_sub(available)
    } else {
        used
    }
}

fn read_os() -> OsInfo {
    let description = System::long_os_version()
        .or_else(|| match (System::name(), System::kernel_version()) {
            (Some(name), Some(kernel)) => Some(format!("{name} {kernel}")),
            (Some(name), None) => Some(name),
            _ => None,
        })
        .unwrap_or_else(|| "unknown".into());
    let hostname = System::host_name()
        .filter(|h| !h.is_empty())
        .or_else(|| hostname::get().ok().and_then(|h| h.into_string().ok()))
        .unwrap_or_else(|| "unknown".into());
    OsInfo {
        description,
        hostname,
    }
}

fn read_network() -> Result<NetworkInfo, SourceError> {
    let networks = Networks::new_with_refreshed_list();
    let interfaces: Vec<(String, Vec<IpAddr>)> = networks
        .iter()
        .map(|(name, data)| {
            (
                name.clone(),
                data.ip_networks().iter().map(|n| n.addr).collect(),
            )
        })
        .collect();

    Ok(NetworkInfo {
        primary_ipv4: primary_ipv4(interfaces)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNAVAILABLE.into()),
    })
}

/// First non-internal IPv4 address. Interfaces are walked in name order so the
/// pick is stable across polls; the first match wins.
pub fn primary_ipv4(mut interfaces: Vec<(String, Vec<IpAddr>)>) -> Option<Ipv4Addr> {
    interfaces.sort_by(|a, b| a.0.cmp(&b.0));
    interfaces
        .into_iter()
        .flat_map(|(_, addrs)| addrs)
        .find_map(|addr| match addr {
            IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
            _ => None,
        })
}

/// CPU and memory per process. Linux threads (tasks) are left out so each
/// program is listed once.
pub fn process_refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing()
        .with_cpu()
        .with_memory()
        .without_tasks()
}

fn refresh_process_table(sys: &mut System) {
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, process_refresh_kind());
}

fn read_processes(sys: &mut System) -> Result<Vec<ProcessSample>, SourceError> {
    refresh_process_table(sys);
    if sys.processes().is_empty() {
        return Err(SourceError::Empty("process list"));
    }

    // Normalize per-process CPU to a 0..100 share of the whole machine
    let cores = match sys.cpus().len() {
        0 => available_cores(),
        n => n,
    } as f64;
    let samples = sys
        .processes()
        .values()
        .map(|p| ProcessSample {
            name: truncate_name(&p.name().to_string_lossy()),
            cpu_percent: round1((f64::from(p.cpu_usage()) / cores).clamp(0.0, 100.0)),
            memory_mb: round1(p.memory() as f64 / MIB),
        })
        .collect();

    Ok(top_processes(samples, TOP_PROCESSES))
}

/// Drop idle zero-footprint entries, order by CPU (then memory) descending, keep `limit`.
pub fn top_processes(mut samples: Vec<ProcessSample>, limit: usize) -> Vec<ProcessSample> {
    samples.retain(|p| p.cpu_percent > 0.0 || p.memory_mb > 0.0);
    samples.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.memory_mb.partial_cmp(&a.memory_mb).unwrap_or(Ordering::Equal))
    });
    samples.truncate(limit);
    samples
}

fn truncate_name(name: &str) -> String {
    name.chars().take(PROCESS_NAME_MAX).collect()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use std::net::Ipv6Addr;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::sync::Mutex;

    fn sample(name: &str, cpu: f64, mem: f64) -> ProcessSample {
        ProcessSample {
            name: name.into(),
            cpu_percent: cpu,
            memory_mb: mem,
        }
    }

    #[test]
    fn top_processes_filters_sorts_and_truncates() {
        let mut input: Vec<ProcessSample> = (0..15)
            .map(|i| sample(&format!("p{i}"), i as f64, 10.0))
            .collect();
        input.push(sample("idle", 0.0, 0.0));
        input.push(sample("tie-small", 14.0, 1.0));

        let top = top_processes(input, TOP_PROCESSES);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].name, "p14");
        assert_eq!(top[1].name, "tie-small");
        assert!(top.windows(2).all(|w| w[0].cpu_percent >= w[1].cpu_percent));
        assert!(top.iter().all(|p| p.name != "idle"));
    }

    #[test]
    fn primary_ipv4_skips_loopback_and_ipv6() {
        let ifaces = vec![
            (
                "wlan0".to_string(),
                vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))],
            ),
            ("lo".to_string(), vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]),
            (
                "eth0".to_string(),
                vec![
                    IpAddr::V6(Ipv6Addr::LOCALHOST),
                    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
                ],
            ),
        ];
        assert_eq!(primary_ipv4(ifaces), Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(
            primary_ipv4(vec![("lo".into(), vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])]),
            None
        );
    }

    #[test]
    fn memory_used_falls_back_to_total_minus_available() {
        assert_eq!(memory_used(100, 40, 70), 40);
        assert_eq!(memory_used(100, 0, 70), 30);
        assert_eq!(memory_used(100, 150, 20), 80);
        assert_eq!(memory_used(100, 0, 150), 0);
    }

    #[test]
    fn process_names_are_cut_on_char_boundaries() {
        let long = "é".repeat(40);
        assert_eq!(truncate_name(&long).chars().count(), PROCESS_NAME_MAX);
        assert_eq!(truncate_name("bash"), "bash");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn snapshot_completes_within_bound_and_holds_invariants() {
        let config = AgentConfig::default();
        let state = AppState::new(&config).unwrap();

        let start = Instant::now();
        let snap = collect_snapshot(&state).await;
        assert!(start.elapsed() < config.source_timeout + Duration::from_secs(2));

        assert!(snap.cpu.cores >= 1);
        assert!(snap.memory.used_gib >= 0.0);
        assert!(snap.memory.used_gib <= snap.memory.total_gib);
        if let Some(load) = snap.cpu.load_percent.value() {
            assert!((0.0..=100.0).contains(&load));
        }
        assert!(snap.processes.len() <= TOP_PROCESSES);
        assert!(snap
            .processes
            .windows(2)
            .all(|w| w[0].cpu_percent >= w[1].cpu_percent));
        assert!(snap
            .processes
            .iter()
            .all(|p| p.name.chars().count() <= PROCESS_NAME_MAX));
        assert!(!snap.os.hostname.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn static_fields_are_stable_between_snapshots() {
        let state = AppState::new(&AgentConfig::default()).unwrap();
        let a = collect_snapshot(&state).await;
        let b = collect_snapshot(&state).await;
        assert_eq!(a.cpu.name, b.cpu.name);
        assert_eq!(a.cpu.cores, b.cpu.cores);
        assert_eq!(a.os.description, b.os.description);
        assert_eq!(a.os.hostname, b.os.hostname);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stalled_source_degrades_instead_of_hanging() {
        let start = Instant::now();
        let out: Option<u8> = gather("stall", Duration::from_millis(100), || {
            std::thread::sleep(Duration::from_millis(600));
            Ok(1)
        })
        .await;
        assert!(out.is_none());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn held_handle_times_out_without_running_the_source() {
        let handle: SharedSystem = Arc::new(Mutex::new(System::new()));
        let held = handle.clone().lock_owned().await;
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        let start = Instant::now();
        let out: Option<u8> = gather_locked("held", Duration::from_millis(100), handle, move |_| {
            flag.store(true, AtomicOrdering::SeqCst);
            Ok(1)
        })
        .await;
        assert!(out.is_none());
        assert!(start.elapsed() < Duration::from_millis(500));

        drop(held);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!ran.load(AtomicOrdering::SeqCst), "source ran after its timeout");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn busy_threads_are_not_listed_as_processes() {
        const SPIN_NAME: &str = "mochi-spin";
        let stop = Arc::new(AtomicBool::new(false));
        let spinners: Vec<_> = (0..3)
            .map(|_| {
                let stop = stop.clone();
                std::thread::Builder::new()
                    .name(SPIN_NAME.into())
                    .spawn(move || {
                        while !stop.load(AtomicOrdering::Relaxed) {
                            std::hint::spin_loop();
                        }
                    })
                    .unwrap()
            })
            .collect();

        let mut sys = System::new();
        refresh_process_table(&mut sys);
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        refresh_process_table(&mut sys);
        let top = read_processes(&mut sys).unwrap();

        stop.store(true, AtomicOrdering::Relaxed);
        for t in spinners {
            t.join().unwrap();
        }

        let own = sysinfo::Pid::from_u32(std::process::id());
        assert!(sys.process(own).is_some());
        assert!(sys.processes().values().all(|p| p.name() != SPIN_NAME));
        assert!(top.iter().all(|p| p.name != SPIN_NAME), "{top:?}");
    }

    #[tokio::test]
    async fn panicking_source_degrades() {
        let out: Option<u8> = gather("boom", Duration::from_secs(1), || panic!("driver bug")).await;
        assert!(out.is_none());
    }
}
