//! Port types with validation and batch partitioning.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRange` is the immutable range a run covers, and `BatchDescriptor`
//! is one contiguous slice of it processed behind a completion barrier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value))
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u16),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
}

/// An inclusive range of ports scanned in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    /// Create a new port range. `start` must not exceed `end`.
    pub fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if start > end {
            Err(PortError::InvalidRange(start.0, end.0))
        } else {
            Ok(Self { start, end })
        }
    }

    /// Build a range from raw numbers.
    pub fn from_bounds(start: u16, end: u16) -> Result<Self, PortError> {
        Self::new(Port::try_from(start)?, Port::try_from(end)?)
    }

    pub const fn start(&self) -> Port {
        self.start
    }

    pub const fn end(&self) -> Port {
        self.end
    }

    /// Number of ports in this range (`end - start + 1`).
    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// A valid range always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Split the range into contiguous batches of at most `size` ports,
    /// in increasing port order. The last batch may be shorter.
    ///
    /// A `size` of zero is treated as one.
    pub fn batches(&self, size: usize) -> Batches {
        Batches {
            next: Some(self.start.0),
            end: self.end.0,
            size: size.max(1),
            index: 0,
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// One contiguous sub-range of a [`PortRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchDescriptor {
    /// Zero-based position of this batch within the run.
    pub index: usize,
    pub start: Port,
    pub end: Port,
}

impl BatchDescriptor {
    /// Number of ports in the batch.
    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Ports of this batch in ascending order.
    pub fn ports(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

impl fmt::Display for BatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Iterator returned by [`PortRange::batches`].
#[derive(Debug, Clone)]
pub struct Batches {
    next: Option<u16>,
    end: u16,
    size: usize,
    index: usize,
}

impl Iterator for Batches {
    type Item = BatchDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next?;
        let span = (self.end - start) as usize;
        let last = start + span.min(self.size - 1) as u16;

        // `end` may be 65535, so never step past it.
        self.next = if last < self.end { Some(last + 1) } else { None };

        let batch = BatchDescriptor {
            index: self.index,
            start: Port(start),
            end: Port(last),
        };
        self.index += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(start) => ((self.end - start) as usize + 1).div_ceil(self.size),
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches {}
