//! In-memory stand-in for the PaperAxon backend, served through wiremock.
//!
//! Tasks advance one scripted status per `GET /api/tasks/{id}`, the way the
//! real worker moves them from pending to running to success.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const INTERPRETATION_TEXT: &str = "# Summary\n\nThe paper shows that attention is enough.";

struct FakeTask {
    kind: &'static str,
    paper_id: String,
    remaining: VecDeque<String>,
    status: String,
}

struct State {
    next_id: usize,
    papers: BTreeMap<String, Value>,
    interpretations: HashMap<String, String>,
    podcasts: HashSet<String>,
    tasks: HashMap<String, FakeTask>,
    task_script: Vec<String>,
    settings: Value,
}

#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_id: 0,
                papers: BTreeMap::new(),
                interpretations: HashMap::new(),
                podcasts: HashSet::new(),
                tasks: HashMap::new(),
                task_script: vec!["running".to_string(), "success".to_string()],
                settings: json!({"auto_collect_enabled": false, "collect_time": "00:00"}),
            })),
        }
    }

    /// Statuses reported by successive status checks of every new task.
    /// The last one sticks.
    pub fn with_task_script(self, statuses: &[&str]) -> Self {
        self.state.lock().unwrap().task_script = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_paper(self, paper_id: &str, title: &str) -> Self {
        self.state.lock().unwrap().papers.insert(
            paper_id.to_string(),
            json!({
                "paper_id": paper_id,
                "title": title,
                "authors": "Ada Lovelace, Alan Turing",
                "abstract": "",
                "arxiv_id": null,
                "source_type": "local_pdf",
                "published_at": null,
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            }),
        );
        self
    }

    pub fn with_podcast(self, paper_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .podcasts
            .insert(paper_id.to_string());
        self
    }

    pub async fn start(self) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(self).mount(&server).await;
        server
    }

    fn route(&self, method: &str, segments: &[&str], body: &[u8]) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        match (method, segments) {
            ("GET", ["api", "papers"]) => {
                let items: Vec<Value> = state.papers.values().cloned().collect();
                ResponseTemplate::new(200).set_body_json(json!({
                    "items": items,
                    "limit": 50,
                    "offset": 0
                }))
            }
            ("POST", ["api", "papers", "upload"]) => {
                let body = String::from_utf8_lossy(body);
                let Some(filename) = multipart_filename(&body) else {
                    return text(400, "missing file field");
                };
                if !filename.to_lowercase().ends_with(".pdf") {
                    return text(400, "please upload a PDF file");
                }
                let paper_id = state.new_id("p");
                state.papers.insert(
                    paper_id.clone(),
                    json!({"paper_id": paper_id, "title": filename, "source_type": "local_pdf"}),
                );
                ResponseTemplate::new(200).set_body_json(json!({ "paper_id": paper_id }))
            }
            ("POST", ["api", "papers", "from-arxiv"]) => {
                let body: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
                let arxiv_id = body["arxiv_id"]
                    .as_str()
                    .map(str::to_string)
                    .or_else(|| {
                        body["url"]
                            .as_str()
                            .and_then(|u| u.rsplit('/').next())
                            .map(str::to_string)
                    });
                let Some(arxiv_id) = arxiv_id else {
                    return text(400, "url or arxiv_id required");
                };
                let paper_id = state.new_id("p");
                state.papers.insert(
                    paper_id.clone(),
                    json!({"paper_id": paper_id, "arxiv_id": arxiv_id, "source_type": "arxiv"}),
                );
                ResponseTemplate::new(200).set_body_json(json!({ "paper_id": paper_id }))
            }
            ("GET", ["api", "papers", id]) => match state.papers.get(*id) {
                Some(paper) => ResponseTemplate::new(200).set_body_json(paper.clone()),
                None => text(404, "paper not found"),
            },
            ("DELETE", ["api", "papers", id]) => {
                if state.papers.remove(*id).is_none() {
                    return text(404, "paper not found");
                }
                state.interpretations.remove(*id);
                state.podcasts.remove(*id);
                ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
            }
            ("POST", ["api", "papers", id, "interpret"]) => {
                if !state.papers.contains_key(*id) {
                    return text(404, "paper not found");
                }
                let task_id = state.new_task("interpret", id);
                ResponseTemplate::new(200)
                    .set_body_json(json!({"task_id": task_id, "status": "pending"}))
            }
            ("GET", ["api", "papers", id, "interpretation"]) => {
                match state.interpretations.get(*id) {
                    Some(text_body) => ResponseTemplate::new(200)
                        .set_body_raw(text_body.clone().into_bytes(), "text/markdown"),
                    None => text(404, "no interpretation yet"),
                }
            }
            ("POST", ["api", "papers", id, "podcast"]) => {
                if !state.papers.contains_key(*id) {
                    return text(404, "paper not found");
                }
                if state.podcasts.contains(*id) {
                    return ResponseTemplate::new(200)
                        .set_body_json(json!({"task_id": null, "message": "podcast exists"}));
                }
                let task_id = state.new_task("podcast", id);
                ResponseTemplate::new(200).set_body_json(json!({ "task_id": task_id }))
            }
            ("GET", ["api", "papers", id, "podcast"]) => {
                if state.podcasts.contains(*id) {
                    ResponseTemplate::new(200).set_body_raw(b"ID3fake-mp3".to_vec(), "audio/mpeg")
                } else {
                    text(404, "no podcast")
                }
            }
            ("GET", ["api", "papers", id, "related"]) => {
                if !state.papers.contains_key(*id) {
                    return text(404, "paper not found");
                }
                ResponseTemplate::new(200).set_body_json(json!({"items": [
                    {"title": "Neighbouring work", "authors": "Grace Hopper",
                     "arxiv_id": "2401.00001v1", "summary": "...", "published": null}
                ]}))
            }
            ("GET", ["api", "tasks", id]) => {
                let State {
                    tasks,
                    interpretations,
                    podcasts,
                    ..
                } = &mut *state;
                let Some(task) = tasks.get_mut(*id) else {
                    return text(404, "task not found");
                };
                if let Some(next) = task.remaining.pop_front() {
                    task.status = next;
                }
                let mut result = Value::Null;
                if task.status == "success" {
                    if task.kind == "interpret" {
                        interpretations.insert(task.paper_id.clone(), INTERPRETATION_TEXT.to_string());
                        result = json!({
                            "paper_id": task.paper_id,
                            "interpretation_path": format!("/data/interpretations/{}.md", task.paper_id)
                        });
                    } else {
                        podcasts.insert(task.paper_id.clone());
                        result = json!({
                            "paper_id": task.paper_id,
                            "podcast_url": format!("/api/papers/{}/podcast", task.paper_id),
                            "is_placeholder": false
                        });
                    }
                }
                let error = if task.status == "failed" {
                    json!("interpretation model unavailable")
                } else {
                    Value::Null
                };
                ResponseTemplate::new(200).set_body_json(json!({
                    "task_id": id,
                    "status": task.status,
                    "result": result,
                    "error": error
                }))
            }
            ("GET", ["api", "settings", "collect"]) => {
                ResponseTemplate::new(200).set_body_json(state.settings.clone())
            }
            ("PUT", ["api", "settings", "collect"]) => match serde_json::from_slice(body) {
                Ok(settings) => {
                    state.settings = settings;
                    ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
                }
                Err(_) => text(422, "invalid settings body"),
            },
            ("GET", ["api", "knowledge-graph"]) => {
                let mut nodes = Vec::new();
                let mut edges = Vec::new();
                for (id, paper) in &state.papers {
                    nodes.push(json!({"id": id, "data": {"type": "paper", "label": paper["title"]}}));
                    for author in paper["authors"].as_str().unwrap_or("").split(',') {
                        let author = author.trim();
                        if author.is_empty() {
                            continue;
                        }
                        let author_id = format!("author:{}", author);
                        nodes.push(json!({"id": author_id, "data": {"type": "author", "label": author}}));
                        edges.push(json!({"source": id, "target": author_id}));
                    }
                }
                ResponseTemplate::new(200).set_body_json(json!({"nodes": nodes, "edges": edges}))
            }
            ("GET", ["api", "trending"]) => {
                let items: Vec<Value> = state
                    .papers
                    .values()
                    .map(|p| {
                        json!({
                            "paper_id": p["paper_id"],
                            "title": p["title"],
                            "authors": p["authors"],
                            "updated_at": p["updated_at"]
                        })
                    })
                    .collect();
                ResponseTemplate::new(200).set_body_json(json!({ "items": items }))
            }
            _ => text(404, "Not Found"),
        }
    }
}

impl State {
    fn new_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn new_task(&mut self, kind: &'static str, paper_id: &str) -> String {
        let task_id = self.new_id("t");
        self.tasks.insert(
            task_id.clone(),
            FakeTask {
                kind,
                paper_id: paper_id.to_string(),
                remaining: self.task_script.iter().cloned().collect(),
                status: "pending".to_string(),
            },
        );
        task_id
    }
}

impl Respond for FakeBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let segments: Vec<&str> = request
            .url
            .path()
            .trim_matches('/')
            .split('/')
            .collect();
        self.route(request.method.as_str(), &segments, &request.body)
    }
}

fn text(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "text/plain")
}

fn multipart_filename(body: &str) -> Option<String> {
    if !body.contains("name=\"file\"") {
        return None;
    }
    let start = body.find("filename=\"")? + "filename=\"".len();
    let end = body[start..].find('"')? + start;
    Some(body[start..end].to_string())
}

/// Number of requests the server saw for `method path`.
pub async fn count_requests(server: &MockServer, method: &str, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == method && r.url.path() == path)
        .count()
}
