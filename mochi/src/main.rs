//! Entry point for the Mochi TUI. Parses args, starts the agent, and runs the App.

use std::env;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Context};
use url::{Host, Url};

use mochi::app::App;
use mochi::boot::BootSequence;
use mochi::ws::BridgeClient;

const DEFAULT_PORT: u16 = 3131;
const CONNECT_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, PartialEq, Eq)]
struct ParsedArgs {
    port: u16,
    agent: Option<PathBuf>,
    url: Option<String>,
    boot: bool,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--port PORT|-p PORT] [--agent PATH] [--url ws://127.0.0.1:PORT/ws] [--no-boot]"
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "mochi".into());
    let mut port: Option<String> = None;
    let mut agent: Option<PathBuf> = None;
    let mut url: Option<String> = None;
    let mut boot = true; // --no-boot

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--port" | "-p" => port = it.next(),
            "--agent" => agent = it.next().map(PathBuf::from),
            "--url" => url = it.next(),
            "--no-boot" => boot = false,
            _ if arg.starts_with("--port=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    port = Some(v.to_string());
                }
            }
            _ if arg.starts_with("--url=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        url = Some(v.to_string());
                    }
                }
            }
            _ => return Err(format!("Unexpected argument '{arg}'. {}", usage(&prog))),
        }
    }

    let port = match port {
        Some(p) => p
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| format!("Invalid port '{p}'. {}", usage(&prog)))?,
        None => DEFAULT_PORT,
    };
    Ok(ParsedArgs {
        port,
        agent,
        url,
        boot,
    })
}

/// The bridge is local IPC; refuse anything that is not a loopback ws:// URL.
fn validate_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid url '{raw}'"))?;
    if url.scheme() != "ws" {
        bail!("url must use ws://, got '{raw}'");
    }
    let loopback = match url.host() {
        Some(Host::Domain(d)) => d.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    if !loopback {
        bail!("url must point at a loopback address, got '{raw}'");
    }
    Ok(url.to_string())
}

// Kills the spawned agent when the UI exits, however it exits
struct AgentGuard(Option<Child>);

impl Drop for AgentGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.0.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn spawn_agent(path: PathBuf, port: u16) -> anyhow::Result<AgentGuard> {
    let child = Command::new(&path)
        .arg("--port")
        .arg(port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start agent '{}'", path.display()))?;
    Ok(AgentGuard(Some(child)))
}

fn find_agent_executable() -> PathBuf {
    #[cfg(windows)]
    let name = "mochi_agent.exe";
    #[cfg(not(windows))]
    let name = "mochi_agent";

    if let Some(parent) = env::current_exe().ok().as_deref().and_then(|e| e.parent()) {
        let candidate = parent.join(name);
        if candidate.exists() {
            return candidate;
        }
    }
    // Fallback to relying on PATH
    PathBuf::from(name)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) if msg.starts_with("Usage:") => {
            eprintln!("{msg}");
            return Ok(());
        }
        Err(msg) => bail!(msg),
    };

    let (url, _agent) = match parsed.url.as_deref() {
        Some(raw) => (validate_url(raw)?, None),
        None => {
            let path = parsed.agent.clone().unwrap_or_else(find_agent_executable);
            let guard = spawn_agent(path, parsed.port)?;
            (format!("ws://127.0.0.1:{}/ws", parsed.port), Some(guard))
        }
    };

    let client = BridgeClient::connect_with_retry(&url, CONNECT_WINDOW)
        .await
        .with_context(|| format!("agent did not come up at {url}"))?;

    let boot = if parsed.boot {
        BootSequence::new()
    } else {
        BootSequence::finished()
    };

    let mut app = App::new(boot);
    app.run(client).await
}
