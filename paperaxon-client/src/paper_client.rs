//! Typed operations over the PaperAxon REST resources
//!
//! Each method is a thin wrapper over [`Transport::request`]. Errors are
//! propagated unchanged; nothing is cached between calls.

use crate::poller::{Poller, TaskSource};
use crate::transport::{FilePart, RequestOptions, ResponseKind, Transport, API_PREFIX};
use async_trait::async_trait;
use paperaxon_core::{
    ArxivSource, AxonError, CollectSettings, Config, KnowledgeGraphView, Paper, PaperPage,
    PaperQuery, PodcastResult, PodcastTrigger, RelatedPaper, Result, Submission, Task, TaskKind,
    TaskRef, TrendingItem,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

/// Multipart field the upload endpoint reads the PDF from.
const UPLOAD_FIELD: &str = "file";

/// Path the backend streams podcast audio from, e.g. `/api/papers/p1/podcast`.
///
/// Pure string construction; no request is made.
pub fn podcast_media_path(paper_id: &str) -> String {
    format!("{}/papers/{}/podcast", API_PREFIX, segment(paper_id))
}

/// Percent-encode one path segment. Backend ids are URL-safe, so this is the
/// identity for them.
fn segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

/// Where a podcast can be played from once [`PaperClient::podcast_and_wait`]
/// returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodcastReady {
    pub paper_id: String,
    pub media_url: String,
    /// True when a job ran during this call, false when audio already existed
    pub generated: bool,
    /// True when only a script was produced; the media URL answers 503
    pub is_placeholder: bool,
}

#[derive(Debug, Clone)]
pub struct PaperClient {
    transport: Transport,
}

impl PaperClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self::with_transport(Transport::new(base_url)?))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_transport(Transport::with_timeout(
            config.base_url(),
            config.request_timeout(),
        )?))
    }

    pub fn with_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    async fn send_json(&self, method: Method, path: &str, options: RequestOptions) -> Result<Value> {
        Ok(self.transport.request(method, path, options).await?.into_json())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.send_json(Method::GET, path, RequestOptions::new()).await?;
        Ok(serde_json::from_value(body)?)
    }

    // ---------- papers ----------

    /// `GET /papers?...`. Parameters are passed through unvalidated.
    pub async fn list_papers(&self, query: &PaperQuery) -> Result<PaperPage> {
        let body = self
            .send_json(
                Method::GET,
                "/papers",
                RequestOptions::new().query(query.pairs()),
            )
            .await?;
        PaperPage::from_response(body)
    }

    pub async fn get_paper(&self, paper_id: &str) -> Result<Paper> {
        self.get(&format!("/papers/{}", segment(paper_id))).await
    }

    /// Upload a PDF as the single multipart field `file`.
    pub async fn upload_pdf(&self, bytes: Vec<u8>, filename: &str) -> Result<Submission> {
        let file = FilePart {
            field: UPLOAD_FIELD.to_string(),
            filename: filename.to_string(),
            bytes,
            content_type: Some("application/pdf".to_string()),
        };
        let body = self
            .send_json(
                Method::POST,
                "/papers/upload",
                RequestOptions::new().multipart(file),
            )
            .await?;
        Submission::from_response(body)
    }

    /// Read a PDF from disk and upload it under its own file name.
    pub async fn upload_pdf_file(&self, path: &Path) -> Result<Submission> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                AxonError::InvalidArgument(format!("{} has no file name", path.display()))
            })?;
        let bytes = tokio::fs::read(path).await?;
        self.upload_pdf(bytes, &filename).await
    }

    /// Import from arXiv given a bare id (`2401.12345`) or an abs/pdf URL.
    pub async fn create_from_arxiv(&self, id_or_url: &str) -> Result<Submission> {
        let source = ArxivSource::parse(id_or_url)?;
        let body = self
            .send_json(
                Method::POST,
                "/papers/from-arxiv",
                RequestOptions::new().json(source.to_body()),
            )
            .await?;
        Submission::from_response(body)
    }

    /// `DELETE /papers/{id}`. The confirmation body is not inspected.
    pub async fn delete_paper(&self, paper_id: &str) -> Result<()> {
        self.send_json(
            Method::DELETE,
            &format!("/papers/{}", segment(paper_id)),
            RequestOptions::new(),
        )
        .await?;
        Ok(())
    }

    pub async fn get_related(&self, paper_id: &str) -> Result<Vec<RelatedPaper>> {
        let body = self
            .send_json(
                Method::GET,
                &format!("/papers/{}/related", segment(paper_id)),
                RequestOptions::new(),
            )
            .await?;
        RelatedPaper::list_from_response(body)
    }

    // ---------- derived content ----------

    pub async fn trigger_interpret(&self, paper_id: &str) -> Result<TaskRef> {
        let body = self
            .send_json(
                Method::POST,
                &format!("/papers/{}/interpret", segment(paper_id)),
                RequestOptions::new(),
            )
            .await?;
        let task = TaskRef::from_trigger(body, TaskKind::Interpret)?;
        debug!(paper_id, task_id = %task.id, "interpretation queued");
        Ok(task)
    }

    /// Interpretation text. Only meaningful once the interpret task succeeded.
    pub async fn get_interpretation(&self, paper_id: &str) -> Result<String> {
        let payload = self
            .transport
            .request(
                Method::GET,
                &format!("/papers/{}/interpretation", segment(paper_id)),
                RequestOptions::new().expect(ResponseKind::Text),
            )
            .await?;
        Ok(payload.into_text())
    }

    pub async fn trigger_podcast(&self, paper_id: &str) -> Result<PodcastTrigger> {
        let body = self
            .send_json(
                Method::POST,
                &format!("/papers/{}/podcast", segment(paper_id)),
                RequestOptions::new(),
            )
            .await?;
        PodcastTrigger::from_response(body)
    }

    /// Download the podcast audio. The backend answers 503 while only a
    /// script placeholder exists.
    pub async fn download_podcast(&self, paper_id: &str) -> Result<Vec<u8>> {
        let payload = self
            .transport
            .request(
                Method::GET,
                &format!("/papers/{}/podcast", segment(paper_id)),
                RequestOptions::new().expect(ResponseKind::Bytes),
            )
            .await?;
        Ok(payload.into_bytes())
    }

    /// Absolute URL of the podcast stream, for handing to a media player.
    pub fn podcast_media_url(&self, paper_id: &str) -> String {
        let api_root = self.transport.api_root();
        let origin = api_root.strip_suffix(API_PREFIX).unwrap_or(api_root);
        format!("{}{}", origin, podcast_media_path(paper_id))
    }

    // ---------- tasks ----------

    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.get(&format!("/tasks/{}", segment(task_id))).await
    }

    /// Trigger an interpretation, wait for it and fetch the text.
    pub async fn interpret_and_wait(&self, paper_id: &str, poller: &Poller) -> Result<String> {
        let task = self.trigger_interpret(paper_id).await?;
        poller.await_task(self, &task).await?;
        self.get_interpretation(paper_id).await
    }

    /// Trigger a podcast and wait for it. Returns at once when playable audio
    /// already exists.
    pub async fn podcast_and_wait(&self, paper_id: &str, poller: &Poller) -> Result<PodcastReady> {
        let media_url = self.podcast_media_url(paper_id);
        match self.trigger_podcast(paper_id).await? {
            PodcastTrigger::AlreadyAvailable { .. } => Ok(PodcastReady {
                paper_id: paper_id.to_string(),
                media_url,
                generated: false,
                is_placeholder: false,
            }),
            PodcastTrigger::Started(task) => {
                let outcome = poller.await_task(self, &task).await?;
                let is_placeholder = outcome.decode::<PodcastResult>()?.is_placeholder;
                Ok(PodcastReady {
                    paper_id: paper_id.to_string(),
                    media_url,
                    generated: true,
                    is_placeholder,
                })
            }
        }
    }

    // ---------- settings & views ----------

    pub async fn get_collect_settings(&self) -> Result<CollectSettings> {
        self.get("/settings/collect").await
    }

    /// Replace the collect settings wholesale.
    pub async fn update_collect_settings(
        &self,
        settings: &CollectSettings,
    ) -> Result<CollectSettings> {
        let body = self
            .send_json(
                Method::PUT,
                "/settings/collect",
                RequestOptions::new().json(serde_json::to_value(settings)?),
            )
            .await?;
        CollectSettings::from_update_response(body, settings)
    }

    pub async fn get_knowledge_graph(&self) -> Result<KnowledgeGraphView> {
        self.get("/knowledge-graph").await
    }

    pub async fn get_trending(&self) -> Result<Vec<TrendingItem>> {
        let body = self
            .send_json(Method::GET, "/trending", RequestOptions::new())
            .await?;
        TrendingItem::list_from_response(body)
    }
}

#[async_trait]
impl TaskSource for PaperClient {
    async fn fetch_task(&self, task_id: &str) -> Result<Task> {
        self.get_task(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn podcast_path_is_exact() {
        assert_eq!(podcast_media_path("p1"), "/api/papers/p1/podcast");
        assert_eq!(
            podcast_media_path("V1StGXR8_Z5j"),
            "/api/papers/V1StGXR8_Z5j/podcast"
        );
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
        assert_eq!(segment("abc-_.~"), "abc-_.~");
    }

    #[test]
    fn podcast_media_url_is_absolute() {
        let client = PaperClient::new("http://127.0.0.1:18527/").unwrap();
        assert_eq!(
            client.podcast_media_url("p1"),
            "http://127.0.0.1:18527/api/papers/p1/podcast"
        );
    }
}
