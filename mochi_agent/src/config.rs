//! Agent configuration: command-line flags plus `MOCHI_AGENT_*` environment overrides.

use std::time::Duration;

use crate::exec::{ExecConfig, DEFAULT_MAX_OUTPUT, DEFAULT_TIMEOUT};

pub const DEFAULT_PORT: u16 = 3131;
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentArgs {
    pub port: u16,
}

pub fn usage(prog: &str) -> String {
    format!("Usage: {prog} [--port PORT|-p PORT]")
}

/// Parse `--port`, `-p`, `--port=`. `Err` carries the text to print (help or a usage error).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<AgentArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "mochi_agent".into());
    let mut port: Option<String> = None;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--port" | "-p" => port = it.next(),
            _ if arg.starts_with("--port=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    port = Some(v.to_string());
                }
            }
            _ => return Err(format!("Unexpected argument '{arg}'. {}", usage(&prog))),
        }
    }

    let port = match port {
        Some(p) => p
            .parse::<u16>()
            .map_err(|_| format!("Invalid port '{p}'. {}", usage(&prog)))?,
        None => DEFAULT_PORT,
    };
    Ok(AgentArgs { port })
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub port: u16,
    /// Bound for each stat source inside one snapshot.
    pub source_timeout: Duration,
    pub exec: ExecConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            exec: ExecConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn from_env(port: u16) -> Self {
        Self::from_lookup(port, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(port: u16, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        let allow_patterns = lookup("MOCHI_AGENT_COMMAND_ALLOW")
            .map(|v| {
                v.split(';')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            port,
            source_timeout: millis("MOCHI_AGENT_SOURCE_TIMEOUT_MS", DEFAULT_SOURCE_TIMEOUT),
            exec: ExecConfig {
                shell: lookup("MOCHI_AGENT_SHELL").filter(|s| !s.trim().is_empty()),
                timeout: millis("MOCHI_AGENT_COMMAND_TIMEOUT_MS", DEFAULT_TIMEOUT),
                max_output_bytes: lookup("MOCHI_AGENT_MAX_OUTPUT_BYTES")
                    .and_then(|v| v.parse().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(DEFAULT_MAX_OUTPUT),
                allow_patterns,
            },
        }
    }
}
