//! Human and JSON rendering of command results

use colored::Colorize;
use paperaxon_core::{
    CollectSettings, KnowledgeGraphView, Paper, PaperPage, RelatedPaper, Submission, Task,
    TaskOutcome, TaskRef, TaskStatus, TrendingItem,
};
use serde::Serialize;
use std::path::Path;

type Result = paperaxon_core::Result<()>;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_colored(status: &TaskStatus) -> colored::ColoredString {
    match status {
        TaskStatus::Succeeded => status.as_str().green(),
        TaskStatus::Failed => status.as_str().red(),
        TaskStatus::Running => status.as_str().yellow(),
        _ => status.as_str().normal(),
    }
}

pub fn papers(page: &PaperPage, json: bool) -> Result {
    if json {
        return print_json(page);
    }
    if page.items.is_empty() {
        println!("{}", "No papers".dimmed());
        return Ok(());
    }
    for paper in &page.items {
        let authors = paper.authors.as_deref().unwrap_or("");
        println!(
            "{}  {}  {}",
            paper.id.cyan(),
            paper.display_title(),
            authors.dimmed()
        );
    }
    if let (Some(limit), Some(offset)) = (page.limit, page.offset) {
        println!(
            "{}",
            format!("({} shown, offset {}, limit {})", page.items.len(), offset, limit).dimmed()
        );
    }
    Ok(())
}

pub fn paper(paper: &Paper, json: bool) -> Result {
    if json {
        return print_json(paper);
    }
    println!("{}: {}", "Paper".blue(), paper.id.cyan());
    println!("{}: {}", "Title".blue(), paper.display_title());
    let fields = [
        ("Authors", &paper.authors),
        ("arXiv", &paper.arxiv_id),
        ("Source", &paper.source_type),
        ("Published", &paper.published_at),
        ("Updated", &paper.updated_at),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            println!("{}: {}", label.blue(), value);
        }
    }
    if let Some(abstract_text) = paper.abstract_text.as_deref().filter(|a| !a.is_empty()) {
        println!();
        println!("{}", abstract_text);
    }
    Ok(())
}

pub fn submission(submission: &Submission, json: bool) -> Result {
    match submission {
        Submission::Paper(paper) => {
            if json {
                return print_json(paper);
            }
            println!("{}: {}", "Created".green(), paper.id.cyan());
            Ok(())
        }
        Submission::Task(task) => task_ref(task, json),
    }
}

pub fn task_ref(task: &TaskRef, json: bool) -> Result {
    if json {
        return print_json(task);
    }
    println!(
        "{}: {} task {} ({})",
        "Queued".green(),
        task.kind,
        task.id.cyan(),
        status_colored(&task.status)
    );
    Ok(())
}

pub fn task(task: &Task, json: bool) -> Result {
    if json {
        return print_json(task);
    }
    let kind = task.kind.map(|k| k.to_string()).unwrap_or_default();
    println!(
        "{}: {} {}",
        "Task".blue(),
        task.id.cyan(),
        kind.dimmed()
    );
    println!("{}: {}", "Status".blue(), status_colored(&task.status));
    if let Some(error) = &task.error {
        println!("{}: {}", "Error".red(), error);
    }
    if let Some(result) = task.result.as_ref().filter(|r| !r.is_null()) {
        println!("{}: {}", "Result".blue(), result);
    }
    Ok(())
}

pub fn outcome(outcome: &TaskOutcome, json: bool) -> Result {
    if json {
        return print_json(&serde_json::json!({
            "task_id": outcome.task_id,
            "kind": outcome.kind,
            "status": TaskStatus::Succeeded,
            "result": outcome.result,
        }));
    }
    println!(
        "{}: {} task {}",
        "Done".green(),
        outcome.kind,
        outcome.task_id.cyan()
    );
    if let Some(result) = outcome.result.as_ref().filter(|r| !r.is_null()) {
        println!("{}: {}", "Result".blue(), result);
    }
    Ok(())
}

pub fn interpretation(paper_id: &str, text: &str, json: bool) -> Result {
    if json {
        return print_json(&serde_json::json!({
            "paper_id": paper_id,
            "interpretation": text,
        }));
    }
    println!("{}", text);
    Ok(())
}

pub fn podcast_url(paper_id: &str, url: &str, json: bool) -> Result {
    if json {
        return print_json(&serde_json::json!({ "paper_id": paper_id, "url": url }));
    }
    println!("{}", url);
    Ok(())
}

pub fn saved(path: &Path, bytes: usize, json: bool) -> Result {
    if json {
        return print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "bytes": bytes,
        }));
    }
    println!(
        "{}: {} ({:.1} KB)",
        "Saved".green(),
        path.display(),
        bytes as f64 / 1024.0
    );
    Ok(())
}

pub fn deleted(paper_id: &str, json: bool) -> Result {
    if json {
        return print_json(&serde_json::json!({ "deleted": paper_id }));
    }
    println!("{}: {}", "Deleted".green(), paper_id);
    Ok(())
}

pub fn related(items: &[RelatedPaper], json: bool) -> Result {
    if json {
        return print_json(items);
    }
    if items.is_empty() {
        println!("{}", "No related papers".dimmed());
    }
    for item in items {
        let title = item.title.as_deref().unwrap_or("(untitled)");
        match &item.arxiv_id {
            Some(arxiv_id) => println!("{}  {}", arxiv_id.cyan(), title),
            None => println!("{}", title),
        }
        if let Some(authors) = &item.authors {
            println!("    {}", authors.dimmed());
        }
    }
    Ok(())
}

pub fn settings(settings: &CollectSettings, json: bool) -> Result {
    if json {
        return print_json(settings);
    }
    let enabled = if settings.auto_collect_enabled {
        "enabled".green()
    } else {
        "disabled".yellow()
    };
    println!("{}: {}", "Auto-collect".blue(), enabled);
    println!("{}: {}", "Collect time".blue(), settings.collect_time);
    Ok(())
}

pub fn graph(graph: &KnowledgeGraphView, json: bool) -> Result {
    if json {
        return print_json(graph);
    }
    let papers = graph
        .nodes
        .iter()
        .filter(|n| n.node_type() == Some("paper"));
    for node in papers {
        let authors: Vec<&str> = graph
            .neighbors(&node.id)
            .filter_map(|id| graph.nodes.iter().find(|n| n.id == id))
            .map(|n| n.label())
            .collect();
        println!("{}  {}", node.id.cyan(), node.label());
        if !authors.is_empty() {
            println!("    {}", authors.join(", ").dimmed());
        }
    }
    println!(
        "{}",
        format!("{} nodes, {} edges", graph.nodes.len(), graph.edges.len()).dimmed()
    );
    Ok(())
}

pub fn trending(items: &[TrendingItem], json: bool) -> Result {
    if json {
        return print_json(items);
    }
    if items.is_empty() {
        println!("{}", "Nothing trending".dimmed());
    }
    for (rank, item) in items.iter().enumerate() {
        println!(
            "{:>3}. {}  {}",
            rank + 1,
            item.paper_id.cyan(),
            item.title.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
