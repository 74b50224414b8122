//! Data types sent to the UI process over the bridge.
//! Keep this module minimal and stable; it defines the wire format.

use serde::{Deserialize, Serialize};

/// Placeholder used wherever a source could not produce a value.
pub const UNAVAILABLE: &str = "unavailable";

/// Unit marker that serializes as the string `"unavailable"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentinel {
    #[serde(rename = "unavailable")]
    Unavailable,
}

/// A numeric reading that may be missing: `42.5` or `"unavailable"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Value(f64),
    Missing(Sentinel),
}

impl Reading {
    pub fn unavailable() -> Self {
        Reading::Missing(Sentinel::Unavailable)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Missing(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuInfo {
    pub name: String,
    pub cores: usize,
    #[serde(rename = "speedGHz")]
    pub speed_ghz: f64,
    pub load_percent: Reading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuInfo {
    pub name: String,
    pub load_percent: Reading,
}

impl GpuInfo {
    pub fn unavailable() -> Self {
        Self {
            name: UNAVAILABLE.into(),
            load_percent: Reading::unavailable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    #[serde(rename = "usedGiB")]
    pub used_gib: f64,
    #[serde(rename = "totalGiB")]
    pub total_gib: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsInfo {
    pub description: String,
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    #[serde(rename = "primaryIPv4")]
    pub primary_ipv4: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSample {
    pub name: String,
    pub cpu_percent: f64,
    #[serde(rename = "memoryMB")]
    pub memory_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub cpu: CpuInfo,
    pub gpu: GpuInfo,
    pub memory: MemoryInfo,
    pub os: OsInfo,
    pub network: NetworkInfo,
    pub processes: Vec<ProcessSample>,
    pub uptime_seconds: u64,
}

/// Outcome of one `execute-command` call. `error` is empty on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub output: String,
    pub error: String,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: String::new(),
        }
    }

    pub fn failed(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
    pub is_parent_marker: bool,
}

impl DirEntry {
    pub fn parent_marker() -> Self {
        Self {
            name: "..".into(),
            is_directory: true,
            is_parent_marker: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<DirEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirectoryListing {
    pub fn listed(resolved_path: String, entries: Vec<DirEntry>) -> Self {
        Self {
            success: true,
            resolved_path: Some(resolved_path),
            entries: Some(entries),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            resolved_path: None,
            entries: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
}
