//! Collect settings and the read-only aggregate views

use crate::paper::items_from_response;
use crate::AxonError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Daily auto-collect configuration. Read returns the current record, write
/// replaces it entirely. Fields the client does not model are kept in `extra`
/// so a write followed by a read returns the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectSettings {
    pub auto_collect_enabled: bool,
    /// Local time of the daily run, `HH:mm`
    pub collect_time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            auto_collect_enabled: false,
            collect_time: "00:00".to_string(),
            extra: Map::new(),
        }
    }
}

impl CollectSettings {
    pub fn new(auto_collect_enabled: bool, collect_time: impl Into<String>) -> Self {
        Self {
            auto_collect_enabled,
            collect_time: collect_time.into(),
            extra: Map::new(),
        }
    }

    /// Check that `collect_time` is a valid 24h `HH:mm` value.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = || {
            AxonError::InvalidArgument(format!(
                "collect_time must be HH:mm, got '{}'",
                self.collect_time
            ))
        };
        let (h, m) = self.collect_time.split_once(':').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(invalid());
        }
        let h: u8 = h.parse().map_err(|_| invalid())?;
        let m: u8 = m.parse().map_err(|_| invalid())?;
        if h > 23 || m > 59 {
            return Err(invalid());
        }
        Ok(())
    }

    /// Interpret the body of `PUT /settings/collect`. A body carrying settings
    /// fields is decoded as the stored record; an acknowledgement such as
    /// `{"ok": true}` means `sent` was stored.
    pub fn from_update_response(body: Value, sent: &CollectSettings) -> crate::Result<Self> {
        let is_record = body.as_object().is_some_and(|map| {
            map.contains_key("auto_collect_enabled") || map.contains_key("collect_time")
        });
        if !is_record {
            return Ok(sent.clone());
        }
        Ok(serde_json::from_value(body)?)
    }
}

/// Graph of papers and authors as built by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraphView {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl GraphNode {
    /// `paper` or `author`
    pub fn node_type(&self) -> Option<&str> {
        self.data.get("type").and_then(Value::as_str)
    }

    pub fn label(&self) -> &str {
        self.data
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KnowledgeGraphView {
    pub fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges.iter().filter_map(move |e| {
            if e.source == id {
                Some(e.target.as_str())
            } else if e.target == id {
                Some(e.source.as_str())
            } else {
                None
            }
        })
    }
}

/// Entry of the trending list, most recently updated first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingItem {
    #[serde(alias = "id")]
    pub paper_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrendingItem {
    pub fn list_from_response(body: Value) -> crate::Result<Vec<Self>> {
        items_from_response(body)
    }
}
