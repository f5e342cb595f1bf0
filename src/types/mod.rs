//! Core type definitions using newtype patterns for type safety.

mod port;
mod target;

pub use port::{BatchDescriptor, Batches, Port, PortError, PortRange};
pub use target::{ScanTarget, TargetError};
