//! Backend task handles and their lifecycle
//!
//! A task is created by a trigger operation and mutated only by the backend.
//! The client reads snapshots until it observes a terminal status.

use crate::AxonError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// What a backend job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Free-form text interpretation of a paper
    Interpret,
    /// Audio podcast synthesized from the interpretation
    Podcast,
    /// Upload or arXiv import that the backend chose to run asynchronously
    Ingest,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interpret => "interpret",
            Self::Podcast => "podcast",
            Self::Ingest => "ingest",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = AxonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interpret" | "interpretation" => Ok(Self::Interpret),
            "podcast" => Ok(Self::Podcast),
            "ingest" | "upload" | "import" => Ok(Self::Ingest),
            other => Err(AxonError::InvalidArgument(format!(
                "unknown task kind '{}'",
                other
            ))),
        }
    }
}

/// Lifecycle status as reported by the backend.
///
/// `Pending` and `Running` are non-terminal, `Succeeded` and `Failed` are
/// terminal. Any status outside the known vocabulary is kept verbatim in
/// `Unknown` and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" | "queued" => Self::Pending,
            "running" | "processing" => Self::Running,
            "success" | "succeeded" | "completed" | "done" => Self::Succeeded,
            "failed" | "failure" | "error" => Self::Failed,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a task as returned by `GET /tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "task_id", alias = "id")]
    pub id: String,
    /// The status endpoint does not always echo the kind.
    #[serde(
        default,
        alias = "type",
        deserialize_with = "lenient_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<TaskKind>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<TaskKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Handle returned by a trigger operation. The id is the only key used for
/// later status queries; the kind is fixed by the trigger that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
}

/// Body of a trigger response: `{"task_id": "..."}`, optionally with a status,
/// or `{"task_id": null, "message": "..."}` when nothing needs to run.
#[derive(Debug, Deserialize)]
struct TriggerResponse {
    #[serde(default, alias = "id")]
    task_id: Option<String>,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    message: Option<String>,
}

impl TaskRef {
    pub fn new(id: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            id: id.into(),
            kind,
            status: TaskStatus::Pending,
        }
    }

    /// Build a handle from a trigger response body.
    pub fn from_trigger(body: Value, kind: TaskKind) -> crate::Result<Self> {
        let resp: TriggerResponse = serde_json::from_value(body)?;
        match resp.task_id {
            Some(id) if !id.is_empty() => Ok(Self {
                id,
                kind,
                status: resp.status.unwrap_or_default(),
            }),
            _ => Err(missing_task_id(kind)),
        }
    }
}

fn missing_task_id(kind: TaskKind) -> AxonError {
    AxonError::Decode(<serde_json::Error as serde::de::Error>::custom(format!(
        "{} trigger response carries no task_id",
        kind
    )))
}

/// Outcome of `POST /papers/{id}/podcast`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodcastTrigger {
    /// A synthesis job was queued.
    Started(TaskRef),
    /// Playable audio already exists; nothing was queued.
    AlreadyAvailable { message: Option<String> },
}

impl PodcastTrigger {
    pub fn from_response(body: Value) -> crate::Result<Self> {
        let resp: TriggerResponse = serde_json::from_value(body)?;
        match resp.task_id {
            Some(id) if !id.is_empty() => Ok(Self::Started(TaskRef {
                id,
                kind: TaskKind::Podcast,
                status: resp.status.unwrap_or_default(),
            })),
            _ => Ok(Self::AlreadyAvailable {
                message: resp.message,
            }),
        }
    }
}

/// A task that reached `Succeeded`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task_id: String,
    pub kind: TaskKind,
    pub result: Option<Value>,
}

impl TaskOutcome {
    /// Decode the backend's result payload into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> crate::Result<T> {
        let value = self.result.clone().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }
}

/// Result payload of a finished interpretation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretResult {
    pub paper_id: String,
    #[serde(default)]
    pub interpretation_path: Option<String>,
}

/// Result payload of a finished podcast job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastResult {
    #[serde(default)]
    pub paper_id: String,
    #[serde(default)]
    pub podcast_url: Option<String>,
    /// True when TTS is not configured and only a script was produced.
    #[serde(default)]
    pub is_placeholder: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_vocabulary() {
        assert_eq!(TaskStatus::from("success".to_string()), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::from("SUCCEEDED".to_string()), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::from("failed".to_string()), TaskStatus::Failed);
        assert_eq!(TaskStatus::from("running".to_string()), TaskStatus::Running);
        assert_eq!(
            TaskStatus::from("uploading".to_string()),
            TaskStatus::Unknown("uploading".to_string())
        );
    }

    #[test]
    fn only_succeeded_and_failed_are_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::Unknown("queued-remote".into()).is_terminal());
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn task_snapshot_from_backend_shape() {
        let task: Task = serde_json::from_value(json!({
            "task_id": "t1",
            "status": "success",
            "result": {"paper_id": "p1", "interpretation_path": "/data/p1.md"},
            "error": null
        }))
        .unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.kind, None);
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert!(task.error.is_none());
    }

    #[test]
    fn task_snapshot_tolerates_unknown_kind() {
        let task: Task = serde_json::from_value(json!({
            "id": "t2",
            "type": "summarize",
            "status": "pending"
        }))
        .unwrap();
        assert_eq!(task.id, "t2");
        assert_eq!(task.kind, None);

        let task: Task =
            serde_json::from_value(json!({"id": "t3", "kind": "podcast"})).unwrap();
        assert_eq!(task.kind, Some(TaskKind::Podcast));
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn trigger_response_keeps_reported_status() {
        let task =
            TaskRef::from_trigger(json!({"task_id": "t1", "status": "success"}), TaskKind::Interpret)
                .unwrap();
        assert_eq!(task.kind, TaskKind::Interpret);
        assert_eq!(task.status, TaskStatus::Succeeded);

        let task = TaskRef::from_trigger(json!({"task_id": "t2"}), TaskKind::Interpret).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn trigger_response_without_id_is_a_decode_error() {
        let err = TaskRef::from_trigger(json!({"ok": true}), TaskKind::Interpret).unwrap_err();
        assert!(matches!(err, AxonError::Decode(_)));
    }

    #[test]
    fn podcast_trigger_variants() {
        let started = PodcastTrigger::from_response(json!({"task_id": "t9"})).unwrap();
        assert_eq!(started, PodcastTrigger::Started(TaskRef::new("t9", TaskKind::Podcast)));

        let existing =
            PodcastTrigger::from_response(json!({"task_id": null, "message": "exists"})).unwrap();
        assert_eq!(
            existing,
            PodcastTrigger::AlreadyAvailable {
                message: Some("exists".to_string())
            }
        );
    }

    #[test]
    fn outcome_decodes_typed_results() {
        let outcome = TaskOutcome {
            task_id: "t1".to_string(),
            kind: TaskKind::Podcast,
            result: Some(json!({
                "paper_id": "p1",
                "podcast_url": "/api/papers/p1/podcast",
                "is_placeholder": true
            })),
        };
        let result: PodcastResult = outcome.decode().unwrap();
        assert_eq!(result.podcast_url.as_deref(), Some("/api/papers/p1/podcast"));
        assert!(result.is_placeholder);
    }

    #[test]
    fn kind_parses_from_cli_text() {
        assert_eq!("Interpret".parse::<TaskKind>().unwrap(), TaskKind::Interpret);
        assert_eq!("podcast".parse::<TaskKind>().unwrap(), TaskKind::Podcast);
        assert!("video".parse::<TaskKind>().is_err());
    }
}
