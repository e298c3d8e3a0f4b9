//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde_json::{json, Value};

use feedlink_core::{
    Committed, FeedbackEntry, FeedbackId, FeedbackView, LinkId, LinkInfo, SubmissionEntry,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is in JSON mode
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a success message (human mode only)
    pub fn success(&self, message: &str) {
        if matches!(self.format, OutputFormat::Human) {
            println!("✓ {}", message);
        }
    }

    /// Whether interactive prompts are appropriate
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message (human mode only)
    pub fn message(&self, msg: &str) {
        if matches!(self.format, OutputFormat::Human) {
            println!("{}", msg);
        }
    }

    /// Print a JSON value (pretty)
    pub fn print_json(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", value),
        }
    }

    /// Print a single link's metadata
    pub fn print_link(&self, info: &LinkInfo) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", info.link_id);
                println!("Creator:     {}", info.creator);
                println!("Topic:       {}", lossy(&info.topic));
                if !info.description.is_empty() {
                    println!("Description: {}", lossy(&info.description));
                }
                println!("Status:      {}", status_label(info));
                println!("Private:     {}", yes_no(info.is_private));
                println!("Feedback:    {}", info.feedback_count);
            }
            OutputFormat::Json => self.print_json(&link_json(info)),
            OutputFormat::Quiet => println!("{}", info.link_id),
        }
    }

    /// Print a list of links
    pub fn print_links(&self, links: &[LinkInfo]) {
        match self.format {
            OutputFormat::Human => {
                if links.is_empty() {
                    println!("No links found.");
                    return;
                }
                for info in links {
                    let private = if info.is_private { " [private]" } else { "" };
                    println!(
                        "{} | {:<8} | {}{} | {} feedback",
                        info.link_id.short(),
                        status_label(info),
                        truncate(&lossy(&info.topic), 40),
                        private,
                        info.feedback_count
                    );
                }
                println!("\n{} link(s)", links.len());
            }
            OutputFormat::Json => {
                self.print_json(&Value::Array(links.iter().map(link_json).collect()));
            }
            OutputFormat::Quiet => {
                for info in links {
                    println!("{}", info.link_id);
                }
            }
        }
    }

    /// Print feedback ids
    pub fn print_feedback_ids(&self, link_id: &LinkId, ids: &[FeedbackId]) {
        match self.format {
            OutputFormat::Human => {
                if ids.is_empty() {
                    println!("No visible feedback on {}.", link_id.short());
                    return;
                }
                let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                println!("{}", joined.join(", "));
            }
            OutputFormat::Json => {
                self.print_json(&json!(ids.iter().map(|id| id.value()).collect::<Vec<_>>()));
            }
            OutputFormat::Quiet => {
                for id in ids {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print a single feedback record as seen by the caller
    pub fn print_feedback(&self, id: FeedbackId, view: &FeedbackView) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", id);
                println!("Author:    {}", view.author);
                println!("Submitted: {}", view.timestamp.format("%Y-%m-%d %H:%M:%S"));
                if view.redacted {
                    println!("Content:   {} (redacted)", lossy(&view.content));
                } else {
                    println!("Content:   {}", lossy(&view.content));
                }
            }
            OutputFormat::Json => self.print_json(&json!({
                "feedback_id": id.value(),
                "author": view.author.as_str(),
                "timestamp": view.timestamp.to_rfc3339(),
                "content": lossy(&view.content),
                "redacted": view.redacted,
            })),
            OutputFormat::Quiet => println!("{}", lossy(&view.content)),
        }
    }

    /// Print every feedback record of a link
    pub fn print_feedback_entries(&self, entries: &[FeedbackEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No feedback yet.");
                    return;
                }
                for entry in entries {
                    println!("────────────────────────────────────────");
                    println!(
                        "#{}  {}  {}",
                        entry.feedback_id,
                        entry.author,
                        entry.timestamp.format("%Y-%m-%d %H:%M")
                    );
                    println!("{}", lossy(&entry.content));
                }
                println!("────────────────────────────────────────");
                println!("{} feedback item(s)", entries.len());
            }
            OutputFormat::Json => {
                let items: Vec<Value> = entries
                    .iter()
                    .map(|entry| {
                        json!({
                            "feedback_id": entry.feedback_id.value(),
                            "author": entry.author.as_str(),
                            "timestamp": entry.timestamp.to_rfc3339(),
                            "content": lossy(&entry.content),
                        })
                    })
                    .collect();
                self.print_json(&Value::Array(items));
            }
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.feedback_id);
                }
            }
        }
    }

    /// Print one submitter's submissions
    pub fn print_submissions(&self, entries: &[SubmissionEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No visible submissions.");
                    return;
                }
                for entry in entries {
                    println!(
                        "#{} [{}] {}",
                        entry.feedback_id,
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        truncate_line(&lossy(&entry.content), 60)
                    );
                }
            }
            OutputFormat::Json => {
                let items: Vec<Value> = entries
                    .iter()
                    .map(|entry| {
                        json!({
                            "feedback_id": entry.feedback_id.value(),
                            "timestamp": entry.timestamp.to_rfc3339(),
                            "content": lossy(&entry.content),
                        })
                    })
                    .collect();
                self.print_json(&Value::Array(items));
            }
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.feedback_id);
                }
            }
        }
    }

    /// Print journaled notifications
    pub fn print_events(&self, events: &[Committed]) {
        match self.format {
            OutputFormat::Human => {
                if events.is_empty() {
                    println!("No events recorded.");
                    return;
                }
                for event in events {
                    println!(
                        "{:>5}  {}  {}",
                        event.revision,
                        event.at.format("%Y-%m-%d %H:%M:%S"),
                        event.notification
                    );
                }
            }
            OutputFormat::Json => match serde_json::to_value(events) {
                Ok(value) => self.print_json(&value),
                Err(e) => eprintln!("Failed to encode events: {}", e),
            },
            OutputFormat::Quiet => {
                for event in events {
                    println!("{}", event.revision);
                }
            }
        }
    }
}

/// Render an opaque payload for display
pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn link_json(info: &LinkInfo) -> Value {
    json!({
        "link_id": info.link_id.to_string(),
        "creator": info.creator.as_str(),
        "topic": lossy(&info.topic),
        "description": lossy(&info.description),
        "is_active": info.is_active,
        "is_private": info.is_private,
        "is_deleted": info.is_deleted,
        "feedback_count": info.feedback_count,
    })
}

fn status_label(info: &LinkInfo) -> &'static str {
    if info.is_deleted {
        "deleted"
    } else if info.is_active {
        "active"
    } else {
        "inactive"
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Truncate a string to max characters, adding ellipsis if needed
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// First line only, truncated
fn truncate_line(s: &str, max: usize) -> String {
    truncate(s.lines().next().unwrap_or(""), max)
}
