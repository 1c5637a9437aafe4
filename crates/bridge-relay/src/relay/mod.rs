//! Event relay: frame reassembly and the client-facing streaming session.

pub mod reassembler;
pub mod session;

pub use reassembler::FrameReassembler;
