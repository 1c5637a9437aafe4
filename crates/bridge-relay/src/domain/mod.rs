//! Core relay types: configuration, errors, upstream events, and the
//! conversation log.

pub mod config;
pub mod error;
pub mod event;
pub mod history;

pub use config::RelayConfig;
pub use error::{ConfigError, ErrorBody, RelayError, StoreError};
pub use event::{AssistantMessage, BridgeEvent, ContentBlock};
pub use history::{ConversationEntry, ConversationLog, Role};
