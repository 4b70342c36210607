//! PaperAxon Core - Shared model for the PaperAxon access layer
//!
//! Everything here is a snapshot of backend state. The client never holds
//! authoritative data; these types only describe what the backend returned.

pub mod config;
pub mod error;
pub mod paper;
pub mod settings;
pub mod task;

pub use config::Config;
pub use error::AxonError;
pub use paper::{ArxivSource, Paper, PaperPage, PaperQuery, RelatedPaper, Submission};
pub use settings::{CollectSettings, GraphEdge, GraphNode, KnowledgeGraphView, TrendingItem};
pub use task::{
    InterpretResult, PodcastResult, PodcastTrigger, Task, TaskKind, TaskOutcome, TaskRef,
    TaskStatus,
};

/// Result type alias for paperaxon operations
pub type Result<T> = std::result::Result<T, AxonError>;
