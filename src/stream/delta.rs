use serde::Deserialize;

use crate::error::{Result, SubtransError};

/// `data` payload marking the end of a chat-completion event stream
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    delta: Option<CompletionDelta>,
}

#[derive(Debug, Deserialize)]
struct CompletionDelta {
    #[serde(default)]
    content: Option<String>,
}

/// What one framed event contributes to the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaEvent {
    Content(String),
    /// Heartbeat or empty delta
    Skip,
    Done,
}

/// Classify the `data` field of one event. The sentinel is matched on the raw
/// string before any JSON parsing is attempted.
pub fn extract_delta(data: &str) -> Result<DeltaEvent> {
    if data == DONE_SENTINEL {
        return Ok(DeltaEvent::Done);
    }
    if data.trim().is_empty() {
        return Ok(DeltaEvent::Skip);
    }

    let chunk: CompletionChunk = serde_json::from_str(data)
        .map_err(|e| SubtransError::Parse(format!("Failed to parse event data: {}", e)))?;

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty());

    Ok(match content {
        Some(text) => DeltaEvent::Content(text),
        None => DeltaEvent::Skip,
    })
}
