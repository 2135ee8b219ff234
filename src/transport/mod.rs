//! Stream-side helpers for GT06 connections.
//!
//! Sockets, timeouts and connection lifecycle stay with the caller; this
//! module only turns each connection's reads into whole frames.

mod reassembly;
mod table;

pub use reassembly::{Reassembler, ReassemblyConfig};
pub use table::ConnectionTable;
