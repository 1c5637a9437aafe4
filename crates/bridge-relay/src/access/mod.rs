//! IP admission control: pure matching, policy decisions, and the persisted
//! dynamic allow-list.

pub mod matcher;
pub mod policy;
pub mod store;

pub use matcher::{normalize, to_numeric, AccessRule, LOOPBACK};
pub use policy::AccessPolicy;
pub use store::{AllowListStore, SettingsDocument};
