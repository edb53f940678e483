use crate::models::{
    QuickFindRequest, QuickFindResponse, RowRecord, RpcRequest, RpcResponse, ScanRequest,
    ScanResponse,
};
use crate::models::config::BackendSettings;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Transport-level failures. Logical failures arrive as an [`RpcResponse`]
/// with a non-zero status instead.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to start backend '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend exited with code {code:?}: {stderr}")]
    Exited { code: Option<i32>, stderr: String },

    #[error("Malformed backend message: {0}")]
    Codec(#[from] serde_json::Error),
}

/// The privileged side of the application.
///
/// Every call resolves to a response envelope, or to a [`BackendError`] when
/// the call itself could not be completed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    async fn scan(&self, request: ScanRequest) -> Result<RpcResponse<ScanResponse>, BackendError>;

    async fn clean(
        &self,
        targets: Vec<RowRecord>,
    ) -> Result<RpcResponse<ScanResponse>, BackendError>;

    async fn reveal_in_folder(&self, path: String) -> Result<RpcResponse<()>, BackendError>;

    async fn quick_find(
        &self,
        request: QuickFindRequest,
    ) -> Result<RpcResponse<QuickFindResponse>, BackendError>;
}

/// Backend reached by spawning a helper process per call.
///
/// The request is written to the child's stdin as one JSON document
/// (`{"call": ..., "args": ...}`), stdin is closed, and the child is expected
/// to print a single [`RpcResponse`] JSON document on stdout and exit 0.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
    args: Vec<String>,
}

impl ProcessBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self::new(settings.program.clone(), settings.args.clone())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: &RpcRequest,
    ) -> Result<RpcResponse<T>, BackendError> {
        let payload = serde_json::to_vec(request)?;

        tracing::debug!(call = request.name(), program = %self.program, "Dispatching backend call");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BackendError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(BackendError::Exited {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let response: RpcResponse<T> = serde_json::from_slice(&output.stdout)?;
        tracing::debug!(
            call = request.name(),
            status = response.status,
            "Backend call settled"
        );
        Ok(response)
    }
}

#[async_trait]
impl Backend for ProcessBackend {
    async fn scan(&self, request: ScanRequest) -> Result<RpcResponse<ScanResponse>, BackendError> {
        self.call(&RpcRequest::Scan(request)).await
    }

    async fn clean(
        &self,
        targets: Vec<RowRecord>,
    ) -> Result<RpcResponse<ScanResponse>, BackendError> {
        self.call(&RpcRequest::Clean { targets }).await
    }

    async fn reveal_in_folder(&self, path: String) -> Result<RpcResponse<()>, BackendError> {
        self.call(&RpcRequest::RevealInFolder { path }).await
    }

    async fn quick_find(
        &self,
        request: QuickFindRequest,
    ) -> Result<RpcResponse<QuickFindResponse>, BackendError> {
        self.call(&RpcRequest::QuickFind(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectType;

    fn scan_request() -> ScanRequest {
        ScanRequest {
            root_path: "/tmp/proj".to_string(),
            project_type: ProjectType::Any,
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let backend = ProcessBackend::new("pandorust-backend-that-does-not-exist", vec![]);
        let result = backend.scan(scan_request()).await;
        assert!(matches!(result, Err(BackendError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reads_envelope_from_stdout() {
        let script = r#"cat > /dev/null; echo '{"status":0,"data":{"rows":[],"occupiedSummary":"0 Bytes","count":0,"elapsedMillis":3}}'"#;
        let backend = ProcessBackend::new("sh", vec!["-c".to_string(), script.to_string()]);

        let response = backend.scan(scan_request()).await.unwrap();
        assert!(response.is_success());
        let data = response.data.unwrap();
        assert_eq!(data.count, 0);
        assert_eq!(data.occupied_summary.as_deref(), Some("0 Bytes"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_request_is_written_to_stdin() {
        // Reports which call arrived on stdin through the error text.
        let script = r#"req=$(cat); case "$req" in *'"call":"reveal-in-folder"'*) echo '{"status":-1,"error":"saw reveal"}';; *) echo '{"status":-1,"error":"other"}';; esac"#;
        let backend = ProcessBackend::new("sh", vec!["-c".to_string(), script.to_string()]);

        let response = backend.reveal_in_folder("/a".to_string()).await.unwrap();
        assert!(!response.is_success());
        assert_eq!(response.error_message(), "saw reveal");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_transport_error() {
        let backend = ProcessBackend::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; echo boom >&2; exit 3".to_string()],
        );
        match backend.scan(scan_request()).await {
            Err(BackendError::Exited { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("Expected Exited error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_garbage_output_is_codec_error() {
        let backend = ProcessBackend::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; echo not-json".to_string()],
        );
        let result = backend.scan(scan_request()).await;
        assert!(matches!(result, Err(BackendError::Codec(_))));
    }
}
