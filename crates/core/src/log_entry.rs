// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entries of a job's `log.jsonl`.
//!
//! Every line of the log is one JSON object with a `type` discriminator.
//! Lines are either objects passed through verbatim from the agent's
//! `stream-json` output, or synthetic `system`/`error` notes written by the
//! orchestrator itself. Classification happens here, at the parse boundary.

use crate::time_fmt::utc_now;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Kind of activity a log line records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    System,
    Error,
    AgentMessage,
    ToolInvocation,
    ToolResult,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::System => "system",
            EventKind::Error => "error",
            EventKind::AgentMessage => "agent-message",
            EventKind::ToolInvocation => "tool-invocation",
            EventKind::ToolResult => "tool-result",
        };
        f.write_str(s)
    }
}

/// Object emitted by the agent process, kept exactly as received.
///
/// `text` is the original line (surrounding whitespace trimmed); it is what
/// gets written back to the log, so key order and number formatting survive.
/// The parsed form is only used to classify the event.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentEvent {
    pub kind: EventKind,
    pub text: String,
}

impl AgentEvent {
    fn new(text: &str, obj: &Map<String, Value>) -> Self {
        Self {
            kind: classify(obj),
            text: text.to_string(),
        }
    }
}

/// One line of `log.jsonl`.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    /// Synthetic informational note (also used to wrap non-JSON agent output)
    System { content: String, timestamp: String },
    /// Synthetic error note
    Error { content: String, timestamp: String },
    /// Pass-through object from the agent
    Agent(AgentEvent),
}

impl LogEntry {
    pub fn system(content: impl Into<String>) -> Self {
        LogEntry::System {
            content: content.into(),
            timestamp: utc_now(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        LogEntry::Error {
            content: content.into(),
            timestamp: utc_now(),
        }
    }

    /// Interpret one line of agent stdout.
    ///
    /// A line holding a JSON object is passed through unchanged. Anything
    /// else (plain text, truncated JSON, bare scalars) is wrapped as a
    /// `system` note carrying the trimmed text, so no output is lost.
    pub fn from_agent_line(line: &str) -> Self {
        let text = line.trim();
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(obj)) => LogEntry::Agent(AgentEvent::new(text, &obj)),
            _ => LogEntry::system(text),
        }
    }

    /// Interpret one line read back from `log.jsonl`.
    ///
    /// Synthetic notes are recognised by their exact shape; every other
    /// object is treated as an agent event. Unparseable lines become a
    /// `system` note describing the damage.
    pub fn from_log_line(line: &str) -> Self {
        let text = line.trim();
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(obj)) => Self::from_object(text, &obj),
            _ => {
                let preview: String = line.chars().take(100).collect();
                LogEntry::System {
                    content: format!("Malformed log entry: {preview}..."),
                    timestamp: String::new(),
                }
            }
        }
    }

    fn from_object(text: &str, obj: &Map<String, Value>) -> Self {
        let is_note = obj
            .keys()
            .all(|k| matches!(k.as_str(), "type" | "content" | "timestamp"))
            && obj.get("content").is_some_and(Value::is_string);
        if is_note {
            let content = get_str(obj, "content").unwrap_or_default().to_string();
            let timestamp = get_str(obj, "timestamp").unwrap_or_default().to_string();
            match get_str(obj, "type") {
                Some("system") => return LogEntry::System { content, timestamp },
                Some("error") => return LogEntry::Error { content, timestamp },
                _ => {}
            }
        }
        LogEntry::Agent(AgentEvent::new(text, obj))
    }

    pub fn kind(&self) -> EventKind {
        match self {
            LogEntry::System { .. } => EventKind::System,
            LogEntry::Error { .. } => EventKind::Error,
            LogEntry::Agent(event) => event.kind,
        }
    }

    /// Serialize to a single JSON line (without the trailing newline).
    ///
    /// Agent events are returned as the text they were read from.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        match self {
            LogEntry::System { content, timestamp } => serde_json::to_string(&Note {
                kind: "system",
                content,
                timestamp,
            }),
            LogEntry::Error { content, timestamp } => serde_json::to_string(&Note {
                kind: "error",
                content,
                timestamp,
            }),
            LogEntry::Agent(event) => Ok(event.text.clone()),
        }
    }
}

#[derive(Serialize)]
struct Note<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
    timestamp: &'a str,
}

fn get_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// Content blocks of a `message` envelope (`{"message": {"content": [...]}}`).
fn content_blocks(obj: &Map<String, Value>) -> &[Value] {
    obj.get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn has_block(obj: &Map<String, Value>, block_type: &str) -> bool {
    content_blocks(obj)
        .iter()
        .any(|b| b.get("type").and_then(Value::as_str) == Some(block_type))
}

fn classify(obj: &Map<String, Value>) -> EventKind {
    match get_str(obj, "type").unwrap_or("") {
        "assistant" if has_block(obj, "tool_use") => EventKind::ToolInvocation,
        "assistant" | "message" => EventKind::AgentMessage,
        "user" if has_block(obj, "tool_result") => EventKind::ToolResult,
        "user" => EventKind::AgentMessage,
        "tool_use" | "tool_call" => EventKind::ToolInvocation,
        "tool_result" => EventKind::ToolResult,
        "result" => {
            let is_error = obj.get("is_error").and_then(Value::as_bool) == Some(true)
                || get_str(obj, "subtype").is_some_and(|s| s.starts_with("error"));
            if is_error {
                EventKind::Error
            } else {
                EventKind::AgentMessage
            }
        }
        "error" => EventKind::Error,
        _ => EventKind::System,
    }
}

#[cfg(test)]
#[path = "log_entry_tests.rs"]
mod tests;
