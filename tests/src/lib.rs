//! # Bridge-Relay Test Suite
//!
//! Unified test crate containing:
//!
//! ```text
//! tests/src/
//! ├── fake_bridge.rs    # Scripted upstream bridge server
//! └── integration/      # End-to-end relay flows over real sockets
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p relay-tests
//!
//! # By category
//! cargo test -p relay-tests integration::
//! ```

pub mod fake_bridge;
