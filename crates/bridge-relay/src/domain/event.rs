//! Upstream bridge event payloads.
//!
//! The agent bridge streams JSON objects tagged by `type`. Everything the
//! relay cares about is decoded once here, at the reassembler boundary;
//! downstream code matches on the closed enum instead of re-inspecting JSON.

use serde::Deserialize;

/// One parsed event payload from the upstream stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Incremental assistant output carrying nested content blocks.
    Assistant {
        #[serde(default)]
        message: AssistantMessage,
    },
    /// Terminal event for one agent turn with the consolidated result text.
    Result {
        #[serde(default)]
        result: String,
    },
    /// Any other `type` value. Forwarded raw to clients but ignored by the
    /// history projection.
    #[serde(other)]
    Unrecognized,
}

impl BridgeEvent {
    /// The consolidated result text, when this event completes a turn with a
    /// non-empty result.
    pub fn completed_result(&self) -> Option<&str> {
        match self {
            Self::Result { result } if !result.is_empty() => Some(result),
            _ => None,
        }
    }
}

/// Message envelope inside an `assistant` event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One content block of an assistant message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Concatenable text delta.
    Text {
        #[serde(default)]
        text: String,
    },
    /// Interactive question from the agent; `input` carries the question and
    /// its nested `options`.
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}
