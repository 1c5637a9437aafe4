//! Tower middleware: admission control and client tracking.

pub mod admission;
pub mod clients;

pub use admission::AdmissionLayer;
pub use clients::{ClientRecord, ClientTable, ClientTrackerLayer, ClientView};
