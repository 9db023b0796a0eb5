//! IPv4 address range iteration
//!
//! This module provides the inclusive address range walked by the scanner.
//! Parsing is deliberately deferred to scan time: a malformed range is a
//! per-sweep condition, logged and skipped, not a startup failure.

use std::net::Ipv4Addr;

use crate::common::{MonitorError, Result};

/// An inclusive IPv4 address range.
///
/// Produces a lazy, finite, restartable sequence of addresses in ascending
/// numeric order, including both endpoints, plus a membership test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    start: Ipv4Addr,
    end: Ipv4Addr,
}

impl AddressRange {
    /// Parse inclusive bounds into a range.
    ///
    /// Fails with [`MonitorError::InvalidRange`] when either bound does not
    /// parse or start is above end in address-integer order.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start: Ipv4Addr = start.parse().map_err(|_| {
            MonitorError::InvalidRange(format!("unparseable start address: {}", start))
        })?;
        let end: Ipv4Addr = end.parse().map_err(|_| {
            MonitorError::InvalidRange(format!("unparseable end address: {}", end))
        })?;
        if u32::from(start) > u32::from(end) {
            return Err(MonitorError::InvalidRange(format!(
                "start {} is above end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// First address of the range
    pub fn start(&self) -> Ipv4Addr {
        self.start
    }

    /// Last address of the range
    pub fn end(&self) -> Ipv4Addr {
        self.end
    }

    /// Whether `address` falls within the inclusive bounds
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        let address = u32::from(address);
        u32::from(self.start) <= address && address <= u32::from(self.end)
    }

    /// Number of addresses in the range (always at least one)
    pub fn len(&self) -> u64 {
        u64::from(u32::from(self.end)) - u64::from(u32::from(self.start)) + 1
    }

    /// A parsed range is never empty; both endpoints are included.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// A fresh iterator over the range; restartable by calling again.
    pub fn iter(&self) -> AddressIter {
        AddressIter {
            next: Some(u32::from(self.start)),
            end: u32::from(self.end),
        }
    }
}

impl IntoIterator for &AddressRange {
    type Item = Ipv4Addr;
    type IntoIter = AddressIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator state for [`AddressRange`].
///
/// `next` is `None` once exhausted, which also keeps an end bound of
/// 255.255.255.255 from overflowing.
#[derive(Debug, Clone)]
pub struct AddressIter {
    next: Option<u32>,
    end: u32,
}

impl Iterator for AddressIter {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current < self.end { Some(current + 1) } else { None };
        Some(Ipv4Addr::from(current))
    }
}
