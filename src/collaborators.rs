//! Abstract seams the core consumes but does not implement: guest RAM, the
//! PCI interrupt line, the virtual clock/frame timer, and the two embedded
//! signal processors. Concrete bindings (KVM eventfd, host-mapped guest RAM,
//! a real DSP core) belong to the embedder, not this crate.

/// Flat guest-physical memory plus the page-table indirection the
/// scatter/gather engine (`crate::dma`) walks on top of it.
///
/// `read_bytes`/`write_bytes` operate on arbitrary physical addresses, not
/// just the page-table-mapped region `dma` resolves into — this mirrors the
/// original's split between `memcpy` against a fixed-size RAM region and
/// `ldl_le_phys`/`stl_le_phys` against the wider physical address space
/// (used for voice records and the front-end's `FEMEMDATA` magic write).
pub trait GuestMemory {
    fn size(&self) -> u64;
    fn read_bytes(&self, addr: u64, buf: &mut [u8]);
    fn write_bytes(&mut self, addr: u64, buf: &[u8]);
    fn mark_dirty(&mut self, addr: u64, len: u64);

    fn ldl_le(&self, addr: u64) -> u32 {
        let mut buf = [0u8; 4];
        self.read_bytes(addr, &mut buf);
        u32::from_le_bytes(buf)
    }

    fn stl_le(&mut self, addr: u64, word: u32) {
        self.write_bytes(addr, &word.to_le_bytes());
        self.mark_dirty(addr, 4);
    }
}

/// The PCI interrupt line owned by the host bus. Level-triggered: repeated
/// `assert`/`deassert` calls with no edge are idempotent from the device's
/// point of view.
pub trait IrqLine {
    fn assert(&mut self);
    fn deassert(&mut self);
}

/// A source of host wall-clock time. `now_ns` backs `XGSCNT` directly;
/// `now_ms` is what the frame timer is armed against.
pub trait VirtualClock {
    fn now_ns(&self) -> u64;

    fn now_ms(&self) -> u64 {
        self.now_ns() / 1_000_000
    }
}

/// The frame-tick timer. `timer_new`/`timer_mod`/`timer_del` from the
/// collaborator contract are folded into construction (the embedder builds
/// one `FrameTimer` and hands it to `McpxApu::new`) plus `arm`/`cancel`; see
/// DESIGN.md for the reasoning.
pub trait FrameTimer {
    fn arm(&mut self, deadline_ms: u64);
    fn cancel(&mut self);
}

/// Which DSP data/program bank a memory access targets.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DspBank {
    X,
    Y,
    P,
}

/// The opaque signal-processor core. Per-voice rendering and DSP instruction
/// execution are out of scope; this is the seam the frame scheduler and the
/// reset handshake drive.
pub trait SignalProcessor {
    fn reset(&mut self);
    fn bootstrap(&mut self);
    fn start_frame(&mut self);
    fn run(&mut self, cycles: u32);
    fn read_memory(&self, bank: DspBank, addr: u32) -> u32;
    fn write_memory(&mut self, bank: DspBank, addr: u32, value: u32);
}

/// Default `SignalProcessor`: backs each bank with a plain word array and
/// never produces anything but silence. A sufficient stub; real
/// instruction decode/ALU/loop hardware is out of scope for this core.
pub struct SilentProcessor {
    x: Vec<u32>,
    y: Vec<u32>,
    p: Vec<u32>,
}

impl SilentProcessor {
    pub fn new(x_words: usize, y_words: usize, p_words: usize) -> Self {
        SilentProcessor {
            x: vec![0; x_words],
            y: vec![0; y_words],
            p: vec![0; p_words],
        }
    }

    fn bank_mut(&mut self, bank: DspBank) -> &mut Vec<u32> {
        match bank {
            DspBank::X => &mut self.x,
            DspBank::Y => &mut self.y,
            DspBank::P => &mut self.p,
        }
    }

    fn bank(&self, bank: DspBank) -> &Vec<u32> {
        match bank {
            DspBank::X => &self.x,
            DspBank::Y => &self.y,
            DspBank::P => &self.p,
        }
    }
}

impl SignalProcessor for SilentProcessor {
    fn reset(&mut self) {}
    fn bootstrap(&mut self) {}
    fn start_frame(&mut self) {}
    fn run(&mut self, _cycles: u32) {}

    fn read_memory(&self, bank: DspBank, addr: u32) -> u32 {
        self.bank(bank).get(addr as usize).copied().unwrap_or(0)
    }

    fn write_memory(&mut self, bank: DspBank, addr: u32, value: u32) {
        if let Some(slot) = self.bank_mut(bank).get_mut(addr as usize) {
            *slot = value & 0x00FF_FFFF;
        }
    }
}
