//! Relay-Admin: command-line client for the bridge relay's admin API.

pub mod api;
