use crate::io::pci::PciConfiguration;

#[derive(Copy,Clone,Eq,PartialEq)]
#[repr(u8)]
pub enum PciBar {
    Bar0 = 0,
    Bar1 = 1,
    Bar2 = 2,
    Bar3 = 3,
    Bar4 = 4,
    Bar5 = 5,
}

impl PciBar {
    pub fn idx(&self) -> usize {
        *self as usize
    }
}

pub enum PciBarAllocation {
    Mmio(PciBar, usize),
}

/// The seam between a device's register model and whatever owns the PCI
/// bus/BAR address decoding on the host side. The host-side half of this
/// contract (bus aggregation, BAR allocation) is out of scope for this
/// crate; only the device-facing half is implemented here.
pub trait PciDevice: Send {
    fn config(&self) -> &PciConfiguration;
    fn config_mut(&mut self) -> &mut PciConfiguration;

    fn read_bar(&mut self, bar: PciBar, offset: u64, data: &mut [u8]) {
        let (_,_,_) = (bar, offset, data);
    }

    fn write_bar(&mut self, bar: PciBar, offset: u64, data: &[u8]) {
        let (_,_,_) = (bar,offset, data);
    }

    fn irq(&self) -> Option<u8> { None }

    fn bar_allocations(&self) -> Vec<PciBarAllocation> { vec![] }

    fn configure_bars(&mut self, allocations: Vec<(PciBar, u64)>) { let _ = allocations; }
}
