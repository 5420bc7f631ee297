mod collaborators;
mod config;
mod device;
mod dma;
mod frontend;
mod interrupt;
mod io;
mod processor;
mod regs;
mod scheduler;
mod voice;

pub use collaborators::{
    DspBank, FrameTimer, GuestMemory, IrqLine, SignalProcessor, SilentProcessor, VirtualClock,
};
pub use config::ApuConfig;
pub use device::McpxApu;
pub use io::pci::{PciAddress, PciBar, PciBarAllocation, PciConfiguration, PciDevice};

#[cfg(test)]
pub(crate) mod test_support;
