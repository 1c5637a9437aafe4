//! Conversation history: an append-only, process-lifetime log.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use super::event::BridgeEvent;

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One recorded conversation turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered conversation log shared across request handlers and relay
/// sessions. Cleared only by an explicit reset; no durability across
/// restarts.
#[derive(Default)]
pub struct ConversationLog {
    entries: RwLock<Vec<ConversationEntry>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user-submitted command or response at submission time.
    pub fn record_user(&self, content: impl Into<String>) {
        self.append(Role::User, content.into());
    }

    /// Project a parsed upstream event into the log.
    ///
    /// Only a terminal result with non-empty text is recorded; incremental
    /// deltas pass through the relay without individual entries.
    pub fn project(&self, event: &BridgeEvent) {
        if let Some(result) = event.completed_result() {
            self.append(Role::Assistant, result.to_string());
        }
    }

    pub fn entries(&self) -> Vec<ConversationEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn append(&self, role: Role, content: String) {
        self.entries.write().push(ConversationEntry {
            role,
            content,
            timestamp: Utc::now(),
        });
    }
}
