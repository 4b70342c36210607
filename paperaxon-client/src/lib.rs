//! PaperAxon Client - Async access layer for the PaperAxon backend
//!
//! Layers, leaf first:
//! - [`transport`]: one HTTP request in, one decoded payload or [`AxonError`] out
//! - [`paper_client`]: typed operations over papers, tasks, settings and views
//! - [`poller`]: turns a task handle into a single awaitable outcome
//!
//! [`AxonError`]: paperaxon_core::AxonError

pub mod paper_client;
pub mod poller;
pub mod transport;

pub use paper_client::{podcast_media_path, PaperClient, PodcastReady};
pub use poller::{Poller, TaskSource, DEFAULT_POLL_INTERVAL, DEFAULT_TASK_TIMEOUT};
pub use transport::{FilePart, Payload, RequestBody, RequestOptions, ResponseKind, Transport};
