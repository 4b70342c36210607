//! Paper projections and listing parameters

use crate::task::{TaskKind, TaskRef, TaskStatus};
use crate::AxonError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only projection of a paper. Only the id is guaranteed; the upload
/// endpoint returns nothing but `{"paper_id": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(rename = "paper_id", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Comma-separated author list as stored by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,
    /// `local_pdf`, `arxiv`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Backend fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Paper {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.id)
    }
}

/// One page of `GET /papers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperPage {
    pub items: Vec<Paper>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageWire {
    Envelope {
        items: Vec<Paper>,
        #[serde(default)]
        limit: Option<u64>,
        #[serde(default)]
        offset: Option<u64>,
    },
    Bare(Vec<Paper>),
}

impl PaperPage {
    pub fn from_response(body: Value) -> crate::Result<Self> {
        Ok(match serde_json::from_value(body)? {
            PageWire::Envelope {
                items,
                limit,
                offset,
            } => Self {
                items,
                limit,
                offset,
            },
            PageWire::Bare(items) => Self {
                items,
                limit: None,
                offset: None,
            },
        })
    }
}

/// Decode a list that may come bare or wrapped as `{"items": [...]}`.
pub(crate) fn items_from_response<T: DeserializeOwned>(body: Value) -> crate::Result<Vec<T>> {
    let list = match body {
        Value::Object(mut map) => map.remove("items").unwrap_or(Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

/// A paper suggested by the related-papers search. These come from an external
/// index and usually have no local paper id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPaper {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RelatedPaper {
    pub fn list_from_response(body: Value) -> crate::Result<Vec<Self>> {
        items_from_response(body)
    }
}

/// Ordered query parameters for `GET /papers`. Passed through as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperQuery {
    pairs: Vec<(String, String)>,
}

impl PaperQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(self, limit: u64) -> Self {
        self.param("limit", limit.to_string())
    }

    pub fn offset(self, offset: u64) -> Self {
        self.param("offset", offset.to_string())
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PaperQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Input for `POST /papers/from-arxiv`: a bare identifier or an abs/pdf URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArxivSource {
    Id(String),
    Url(String),
}

impl ArxivSource {
    pub fn parse(input: &str) -> crate::Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AxonError::InvalidArgument(
                "arXiv identifier or URL is empty".to_string(),
            ));
        }
        let lower = input.to_ascii_lowercase();
        if lower.contains("://") || lower.starts_with("arxiv.org") || lower.starts_with("www.") {
            Ok(Self::Url(input.to_string()))
        } else {
            Ok(Self::Id(input.to_string()))
        }
    }

    pub fn to_body(&self) -> Value {
        match self {
            Self::Id(id) => serde_json::json!({ "arxiv_id": id }),
            Self::Url(url) => serde_json::json!({ "url": url }),
        }
    }
}

/// Response of an upload or arXiv import.
///
/// The backend may finish ingestion synchronously and return the paper, or
/// hand back a task to poll. The shape is inspected at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Paper(Paper),
    Task(TaskRef),
}

impl Submission {
    pub fn from_response(body: Value) -> crate::Result<Self> {
        if let Some(task) = task_ref_in(&body) {
            return Ok(Self::Task(task));
        }
        Ok(Self::Paper(serde_json::from_value(body)?))
    }

    pub fn paper_id(&self) -> Option<&str> {
        match self {
            Self::Paper(paper) => Some(&paper.id),
            Self::Task(_) => None,
        }
    }
}

fn task_ref_in(body: &Value) -> Option<TaskRef> {
    let map = body.as_object()?;
    let status = map
        .get("status")
        .and_then(Value::as_str)
        .map(|s| TaskStatus::from(s.to_string()));
    let task_id = map.get("task_id").and_then(Value::as_str);
    let has_task_status = matches!(&status, Some(s) if !matches!(s, TaskStatus::Unknown(_)));

    let id = match task_id {
        Some(id) => id,
        None if has_task_status && !map.contains_key("paper_id") => {
            map.get("id").and_then(Value::as_str)?
        }
        None => return None,
    };
    Some(TaskRef {
        id: id.to_string(),
        kind: TaskKind::Ingest,
        status: status.unwrap_or_default(),
    })
}
