use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message shown when a failed response carries no error text.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Response envelope returned by every backend call.
///
/// `status == 0` means success. Any other value is a logical failure and
/// `error` carries the human-readable reason. Transport failures never produce
/// an envelope; they surface as [`BackendError`](crate::services::BackendError).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse<T> {
    pub status: i32,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> RpcResponse<T> {
    /// Successful envelope carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            status: 0,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope carrying a reason
    pub fn err(status: i32, error: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// The backend-supplied reason, or [`UNKNOWN_ERROR`] when it sent none.
    pub fn error_message(&self) -> &str {
        match self.error.as_deref() {
            Some(message) if !message.trim().is_empty() => message,
            _ => UNKNOWN_ERROR,
        }
    }
}

/// One reclaimable directory as reported by a scan.
///
/// `path` is the unique key within a result set. `total_bytes` is exact and
/// is what selection totals are summed from; `occupied` is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    pub path: String,
    pub occupied: String,
    pub category: String,
    pub updated_at: String,
    pub total_bytes: u64,
}

/// Payload of a successful `scan` or `clean` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    #[serde(default)]
    pub rows: Vec<RowRecord>,
    #[serde(default)]
    pub occupied_summary: Option<String>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub elapsed_millis: u64,
}

/// Payload of a successful `quick-find` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickFindResponse {
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub elapsed_millis: u64,
}

/// Category filter sent with a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Any,
    Cargo,
    Maven,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::Any => "any",
            ProjectType::Cargo => "cargo",
            ProjectType::Maven => "maven",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(ProjectType::Any),
            "cargo" => Ok(ProjectType::Cargo),
            "maven" => Ok(ProjectType::Maven),
            other => Err(format!("unknown project type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub root_path: String,
    pub project_type: ProjectType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickFindRequest {
    pub root_path: String,
    pub glob_pattern: String,
}

/// Request written to the backend, tagged by call name.
///
/// Serializes as `{"call": "<name>", "args": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", content = "args", rename_all = "kebab-case")]
pub enum RpcRequest {
    Scan(ScanRequest),
    Clean { targets: Vec<RowRecord> },
    #[serde(rename_all = "camelCase")]
    RevealInFolder { path: String },
    QuickFind(QuickFindRequest),
}

impl RpcRequest {
    /// Call name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            RpcRequest::Scan(_) => "scan",
            RpcRequest::Clean { .. } => "clean",
            RpcRequest::RevealInFolder { .. } => "reveal-in-folder",
            RpcRequest::QuickFind(_) => "quick-find",
        }
    }
}
