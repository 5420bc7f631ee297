//! Test doubles for the collaborator traits, grounded on the
//! retrieval pack's own mock-memory test pattern (an in-memory `Vec<u8>`
//! standing in for guest RAM, plain counters standing in for the host's
//! eventfd/timer plumbing).

use std::cell::Cell;

use crate::collaborators::{FrameTimer, GuestMemory, IrqLine, VirtualClock};
use crate::config::ApuConfig;
use crate::device::McpxApu;

pub struct TestGuestMemory {
    bytes: Vec<u8>,
}

impl TestGuestMemory {
    pub fn new(len: usize) -> Self {
        TestGuestMemory { bytes: vec![0u8; len] }
    }
}

impl GuestMemory for TestGuestMemory {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_bytes(&self, addr: u64, buf: &mut [u8]) {
        let addr = addr as usize;
        buf.copy_from_slice(&self.bytes[addr..addr + buf.len()]);
    }

    fn write_bytes(&mut self, addr: u64, buf: &[u8]) {
        let addr = addr as usize;
        self.bytes[addr..addr + buf.len()].copy_from_slice(buf);
    }

    fn mark_dirty(&mut self, _addr: u64, _len: u64) {}
}

/// Records every assert/deassert transition so tests can inspect call
/// history, not just the final level.
#[derive(Default)]
pub struct RecordingIrqLine {
    pub asserts: u32,
    pub deasserts: u32,
}

impl IrqLine for RecordingIrqLine {
    fn assert(&mut self) {
        self.asserts += 1;
    }

    fn deassert(&mut self) {
        self.deasserts += 1;
    }
}

/// A clock double that advances on every read, so `XGSCNT`'s
/// monotonic-non-decreasing property holds without depending on host wall
/// clock resolution.
pub struct TickingClock {
    ns: Cell<u64>,
}

impl TickingClock {
    pub fn new() -> Self {
        TickingClock { ns: Cell::new(0) }
    }
}

impl VirtualClock for TickingClock {
    fn now_ns(&self) -> u64 {
        let current = self.ns.get();
        self.ns.set(current + 100);
        current
    }
}

#[derive(Default)]
pub struct NullFrameTimer {
    pub armed_for_ms: Option<u64>,
}

impl FrameTimer for NullFrameTimer {
    fn arm(&mut self, deadline_ms: u64) {
        self.armed_for_ms = Some(deadline_ms);
    }

    fn cancel(&mut self) {
        self.armed_for_ms = None;
    }
}

/// A freshly constructed device wired to the test doubles above: 4 MiB of
/// guest RAM (enough room for voice records and scatter/gather tables at the
/// small fixed addresses the unit tests use), a recording IRQ line, a
/// ticking clock, and a no-op frame timer.
pub fn test_apu() -> McpxApu {
    McpxApu::new(
        11,
        Box::new(TestGuestMemory::new(4 << 20)),
        Box::new(RecordingIrqLine::default()),
        Box::new(TickingClock::new()),
        Box::new(NullFrameTimer::default()),
        ApuConfig::default(),
    )
}
