//! Allow/deny decisions combining static and dynamic rules.

use std::sync::Arc;

use super::matcher::{normalize, AccessRule, LOOPBACK};
use super::store::AllowListStore;

/// Admission-control policy applied to guarded endpoints.
///
/// Rules are rebuilt from the raw configuration string and the dynamic store
/// on every check. The rule set is small and mutations are rare; recomputing
/// keeps mutations and checks trivially consistent.
pub struct AccessPolicy {
    static_entries: String,
    store: Arc<AllowListStore>,
}

impl AccessPolicy {
    /// `static_entries` is the comma-separated configured list; malformed
    /// entries are skipped at check time.
    pub fn new(static_entries: impl Into<String>, store: Arc<AllowListStore>) -> Self {
        Self {
            static_entries: static_entries.into(),
            store,
        }
    }

    /// Decide whether `client` may reach a guarded endpoint.
    ///
    /// Loopback callers are always allowed. An empty combined rule set means
    /// no policy is configured and everything is allowed (fail-open).
    pub fn is_allowed(&self, client: &str) -> bool {
        if normalize(client) == LOOPBACK {
            return true;
        }

        let mut rules: Vec<AccessRule> = self
            .static_entries
            .split(',')
            .filter_map(AccessRule::parse)
            .collect();
        rules.extend(
            self.store
                .snapshot()
                .iter()
                .map(|entry| AccessRule::Exact(normalize(entry).to_string())),
        );

        if rules.is_empty() {
            return true;
        }
        rules.iter().any(|rule| rule.matches(client))
    }
}
