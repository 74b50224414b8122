//! Types that mirror the agent's JSON schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentinel {
    #[serde(rename = "unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Value(f64),
    Missing(Sentinel),
}

impl Reading {
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Missing(_) => None,
        }
    }

    /// `"12.5 %"` or `"N/A"`.
    pub fn percent_label(&self) -> String {
        match self.value() {
            Some(v) => format!("{v:.1} %"),
            None => "N/A".into(),
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    #[serde(rename = "usedGiB")]
    pub used_gib: f64,
    #[serde(rename = "totalGiB")]
    pub total_gib: f64,
}

impl MemoryInfo {
    pub fn used_percent(&self) -> f64 {
        if self.total_gib > 0.0 {
            (self.used_gib / self.total_gib * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub output: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
    pub is_parent_marker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub success: bool,
    #[serde(default)]
    pub resolved_path: Option<String>,
    #[serde(default)]
    pub entries: Option<Vec<DirEntry>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Request {
    GetSystemInfo,
    ExecuteCommand {
        #[serde(rename = "commandLine")]
        command_line: Value,
    },
    GetDirContents {
        path: Value,
    },
    GetVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "result", rename_all = "kebab-case")]
pub enum Response {
    GetSystemInfo(SystemSnapshot),
    ExecuteCommand(CommandResult),
    GetDirContents(DirectoryListing),
    GetVersion(VersionInfo),
    Rejected(Rejection),
}

#[derive(Debug, Clone, Serialize)]
pub struct Call<'a> {
    pub id: u64,
    pub request: &'a Request,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reply {
    pub id: Option<u64>,
    pub response: Response,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_agent_snapshot_with_sentinels() {
        let reply: Reply = serde_json::from_value(json!({
            "id": 5,
            "response": {
                "op": "get-system-info",
                "result": {
                    "cpu": { "name": "unavailable", "cores": 2, "speedGHz": 0.0, "loadPercent": "unavailable" },
                    "gpu": { "name": "unavailable", "loadPercent": "unavailable" },
                    "memory": { "usedGiB": 3.25, "totalGiB": 16.0 },
                    "os": { "description": "Linux", "hostname": "box" },
                    "network": { "primaryIPv4": "unavailable" },
                    "processes": [],
                    "uptimeSeconds": 42
                }
            }
        }))
        .unwrap();
        assert_eq!(reply.id, Some(5));
        let Response::GetSystemInfo(snap) = reply.response else {
            panic!("wrong op");
        };
        assert_eq!(snap.cpu.load_percent.percent_label(), "N/A");
        assert_eq!(snap.memory.used_percent(), 3.25 / 16.0 * 100.0);
        assert_eq!(snap.uptime_seconds, 42);
    }

    #[test]
    fn requests_encode_as_kebab_case_ops() {
        let req = Request::ExecuteCommand {
            command_line: json!("ls -la"),
        };
        let v = serde_json::to_value(Call { id: 1, request: &req }).unwrap();
        assert_eq!(
            v,
            json!({ "id": 1, "request": { "op": "execute-command", "commandLine": "ls -la" } })
        );
        let v = serde_json::to_value(&Request::GetVersion).unwrap();
        assert_eq!(v, json!({ "op": "get-version" }));
    }

    #[test]
    fn zero_total_memory_is_zero_percent() {
        let m = MemoryInfo {
            used_gib: 0.0,
            total_gib: 0.0,
        };
        assert_eq!(m.used_percent(), 0.0);
    }
}
