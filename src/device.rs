//! Register file & MMIO router (C1): the top-level device type. Dispatches
//! guest reads/writes by address to the right region and applies the
//! side-effectful special registers; everything else in a region reads and
//! writes plain storage.

use crate::collaborators::{FrameTimer, GuestMemory, IrqLine, SignalProcessor, SilentProcessor, VirtualClock};
use crate::config::ApuConfig;
use crate::frontend;
use crate::interrupt;
use crate::io::pci::{PciBar, PciBarAllocation, PciConfiguration, PciDevice};
use crate::processor;
use crate::regs::*;
use crate::scheduler;

const PCI_VENDOR_ID_NVIDIA: u16 = 0x10DE;
const PCI_DEVICE_ID_NVIDIA_MCPX_APU: u16 = 0x01B0;
const PCI_CLASS_MULTIMEDIA_AUDIO: u16 = 0x0401;
const MCPX_APU_REVISION: u8 = 210;

/// The MCPX APU device. Owns the register file, the two DSP processor
/// instances, and the embedder-supplied collaborators. `mmio_read`/
/// `mmio_write`/`frame_tick` run under the caller's single big device lock —
/// nothing here does its own locking.
pub struct McpxApu {
    config: ApuConfig,
    pci_config: PciConfiguration,

    mem: Box<dyn GuestMemory>,
    irq: Box<dyn IrqLine>,
    clock: Box<dyn VirtualClock>,
    timer: Box<dyn FrameTimer>,

    top: WordStore,
    gp_regs: WordStore,
    ep_regs: WordStore,

    gp: Box<dyn SignalProcessor>,
    ep: Box<dyn SignalProcessor>,

    irq_asserted: bool,
    gp_frame_started: bool,
    ep_frame_started: bool,
}

impl McpxApu {
    pub fn new(
        irq: u8,
        mem: Box<dyn GuestMemory>,
        irq_line: Box<dyn IrqLine>,
        clock: Box<dyn VirtualClock>,
        timer: Box<dyn FrameTimer>,
        config: ApuConfig,
    ) -> Self {
        let gp: Box<dyn SignalProcessor> = Box::new(SilentProcessor::new(
            GP_X_BANK_WORDS as usize,
            GP_YMEM_WORDS as usize,
            DSP_PMEM_WORDS as usize,
        ));
        let ep: Box<dyn SignalProcessor> = Box::new(SilentProcessor::new(
            EP_XMEM_WORDS as usize,
            EP_YMEM_WORDS as usize,
            DSP_PMEM_WORDS as usize,
        ));

        let mut pci_config = PciConfiguration::new(
            irq,
            PCI_VENDOR_ID_NVIDIA,
            PCI_DEVICE_ID_NVIDIA_MCPX_APU,
            PCI_CLASS_MULTIMEDIA_AUDIO,
        );
        pci_config.set_revision(MCPX_APU_REVISION);

        McpxApu {
            pci_config,
            config,
            mem,
            irq: irq_line,
            clock,
            timer,
            top: WordStore::new(TOP_REGION_SIZE),
            gp_regs: WordStore::new(GP_SIZE),
            ep_regs: WordStore::new(EP_SIZE),
            gp,
            ep,
            irq_asserted: false,
            gp_frame_started: false,
            ep_frame_started: false,
        }
    }

    pub fn config(&self) -> &ApuConfig {
        &self.config
    }

    pub(crate) fn mem(&self) -> &dyn GuestMemory {
        self.mem.as_ref()
    }

    pub(crate) fn mem_mut(&mut self) -> &mut dyn GuestMemory {
        self.mem.as_mut()
    }

    pub(crate) fn voice_table_base(&self) -> u64 {
        self.read_top_reg(VPVADDR) as u64
    }

    pub(crate) fn read_top_reg(&self, offset: u64) -> u32 {
        self.top.read(offset)
    }

    pub(crate) fn write_top_reg(&mut self, offset: u64, value: u32) {
        self.top.write(offset, value);
    }

    pub(crate) fn read_gp_reg(&self, offset: u64) -> u32 {
        self.gp_regs.read(offset)
    }

    pub(crate) fn write_gp_reg(&mut self, offset: u64, value: u32) {
        self.gp_regs.write(offset, value);
    }

    pub(crate) fn read_ep_reg(&self, offset: u64) -> u32 {
        self.ep_regs.read(offset)
    }

    pub(crate) fn write_ep_reg(&mut self, offset: u64, value: u32) {
        self.ep_regs.write(offset, value);
    }

    pub(crate) fn gp_mut(&mut self) -> &mut dyn SignalProcessor {
        self.gp.as_mut()
    }

    pub(crate) fn ep_mut(&mut self) -> &mut dyn SignalProcessor {
        self.ep.as_mut()
    }

    pub(crate) fn gp_start_frame(&mut self) {
        self.gp_frame_started = true;
        self.gp.start_frame();
    }

    pub(crate) fn ep_start_frame(&mut self) {
        self.ep_frame_started = true;
        self.ep.start_frame();
    }

    pub(crate) fn gp_run(&mut self, cycles: u32) {
        self.gp.run(cycles);
    }

    pub fn gp_started_frame(&self) -> bool {
        self.gp_frame_started
    }

    pub fn ep_started_frame(&self) -> bool {
        self.ep_frame_started
    }

    pub(crate) fn irq_assert(&mut self) {
        self.irq_asserted = true;
        self.irq.assert();
    }

    pub(crate) fn irq_deassert(&mut self) {
        self.irq_asserted = false;
        self.irq.deassert();
    }

    pub fn irq_line_asserted(&self) -> bool {
        self.irq_asserted
    }

    pub(crate) fn arm_timer(&mut self, deadline_ms: u64) {
        self.timer.arm(deadline_ms);
    }

    /// Called by the embedder when its `FrameTimer` fires.
    pub fn frame_tick(&mut self, now_ms: u64) {
        scheduler::frame_tick(self, now_ms);
    }

    /// `size` must be 4; anything else is a precondition violation.
    pub fn mmio_read(&mut self, addr: u64, size: u32) -> u32 {
        assert_eq!(size, 4, "MCPX APU MMIO accesses are always 4 bytes");
        assert_eq!(addr % 4, 0, "MCPX APU MMIO accesses are always aligned");

        if addr >= EP_BASE && addr < EP_BASE + EP_SIZE {
            self.read_ep(addr - EP_BASE)
        } else if addr >= GP_BASE && addr < GP_BASE + GP_SIZE {
            self.read_gp(addr - GP_BASE)
        } else if addr >= VP_BASE && addr < VP_BASE + VP_SIZE {
            frontend::vp_read(addr - VP_BASE)
        } else {
            self.read_top(addr)
        }
    }

    pub fn mmio_write(&mut self, addr: u64, size: u32, value: u32) {
        assert_eq!(size, 4, "MCPX APU MMIO accesses are always 4 bytes");
        assert_eq!(addr % 4, 0, "MCPX APU MMIO accesses are always aligned");

        if addr >= EP_BASE && addr < EP_BASE + EP_SIZE {
            self.write_ep(addr - EP_BASE, value);
        } else if addr >= GP_BASE && addr < GP_BASE + GP_SIZE {
            self.write_gp(addr - GP_BASE, value);
        } else if addr >= VP_BASE && addr < VP_BASE + VP_SIZE {
            frontend::vp_write(self, addr - VP_BASE, value);
        } else {
            self.write_top(addr, value);
        }
    }

    fn read_top(&self, addr: u64) -> u32 {
        match addr {
            XGSCNT => (self.clock.now_ns() / 100) as u32, // ??? — preserved verbatim
            _ => self.top.read(addr),
        }
    }

    fn write_top(&mut self, addr: u64, value: u32) {
        match addr {
            ISTS => interrupt::ists_write(self, value),
            SECTL => {
                self.top.write(SECTL, value);
                if get_mask(value, SECTL_XCNTMODE) == SECTL_XCNTMODE_OFF {
                    log::debug!("SECTL counter-mode OFF: cancelling frame timer");
                    self.timer.cancel();
                } else {
                    let now_ms = self.clock.now_ms();
                    self.timer.arm(now_ms + 10);
                }
            }
            FEMEMDATA => {
                let target = self.top.read(FEMEMADDR) as u64;
                self.mem.stl_le(target, value);
                self.top.write(FEMEMDATA, value);
            }
            IEN => {
                self.top.write(IEN, value);
                interrupt::update_irq(self);
            }
            _ => self.top.write(addr, value),
        }
    }

    fn read_gp(&self, offset: u64) -> u32 {
        if offset == DSP_RST {
            return self.gp_regs.read(DSP_RST);
        }
        processor::dsp_region_read(self.gp.as_ref(), offset, GP_XMEM_WORDS, GP_YMEM_WORDS, true)
            .unwrap_or_else(|| self.gp_regs.read(offset))
    }

    fn write_gp(&mut self, offset: u64, value: u32) {
        if offset == DSP_RST {
            let oldval = self.gp_regs.read(DSP_RST);
            processor::rst_write(self.gp.as_mut(), oldval, value);
            self.gp_regs.write(DSP_RST, value);
            return;
        }
        let handled = processor::dsp_region_write(self.gp.as_mut(), offset, value, GP_XMEM_WORDS, GP_YMEM_WORDS, true);
        if !handled {
            self.gp_regs.write(offset, value);
        }
    }

    fn read_ep(&self, offset: u64) -> u32 {
        if offset == DSP_RST {
            return self.ep_regs.read(DSP_RST);
        }
        processor::dsp_region_read(self.ep.as_ref(), offset, EP_XMEM_WORDS, EP_YMEM_WORDS, false)
            .unwrap_or_else(|| self.ep_regs.read(offset))
    }

    fn write_ep(&mut self, offset: u64, value: u32) {
        if offset == DSP_RST {
            let oldval = self.ep_regs.read(DSP_RST);
            processor::rst_write(self.ep.as_mut(), oldval, value);
            self.ep_regs.write(DSP_RST, value);
            return;
        }
        let handled = processor::dsp_region_write(self.ep.as_mut(), offset, value, EP_XMEM_WORDS, EP_YMEM_WORDS, false);
        if !handled {
            self.ep_regs.write(offset, value);
        }
    }
}

impl PciDevice for McpxApu {
    fn config(&self) -> &PciConfiguration {
        &self.pci_config
    }

    fn config_mut(&mut self) -> &mut PciConfiguration {
        &mut self.pci_config
    }

    fn read_bar(&mut self, bar: PciBar, offset: u64, data: &mut [u8]) {
        if bar == PciBar::Bar0 && data.len() == 4 {
            let value = self.mmio_read(offset, 4);
            data.copy_from_slice(&value.to_le_bytes());
        }
    }

    fn write_bar(&mut self, bar: PciBar, offset: u64, data: &[u8]) {
        if bar == PciBar::Bar0 && data.len() == 4 {
            let value = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
            self.mmio_write(offset, 4, value);
        }
    }

    fn irq(&self) -> Option<u8> {
        Some(self.pci_config.irq())
    }

    fn bar_allocations(&self) -> Vec<PciBarAllocation> {
        vec![PciBarAllocation::Mmio(PciBar::Bar0, BAR_SIZE as usize)]
    }

    fn configure_bars(&mut self, allocations: Vec<(PciBar, u64)>) {
        for (bar, base) in allocations {
            if bar == PciBar::Bar0 {
                self.pci_config.set_mmio_bar(bar, base, BAR_SIZE);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_apu;

    #[test]
    fn plain_storage_roundtrips() {
        let mut apu = test_apu();
        apu.mmio_write(0x1800, 4, 0xDEAD_BEEF);
        assert_eq!(apu.mmio_read(0x1800, 4), 0xDEAD_BEEF);
    }

    #[test]
    fn gp_region_plain_storage_roundtrips() {
        let mut apu = test_apu();
        let addr = GP_BASE + 0x9000; // between the Y and P banks, unspecified
        apu.mmio_write(addr, 4, 0xCAFE_BABE);
        assert_eq!(apu.mmio_read(addr, 4), 0xCAFE_BABE);
    }

    #[test]
    fn ep_region_plain_storage_roundtrips() {
        let mut apu = test_apu();
        let addr = EP_BASE + 0x9000;
        apu.mmio_write(addr, 4, 0xFACE_FEED);
        assert_eq!(apu.mmio_read(addr, 4), 0xFACE_FEED);
    }

    #[test]
    #[should_panic]
    fn non_word_size_is_fatal() {
        let mut apu = test_apu();
        apu.mmio_read(0x1800, 2);
    }

    #[test]
    fn xgscnt_is_monotonic_non_decreasing() {
        let mut apu = test_apu();
        let a = apu.mmio_read(XGSCNT, 4);
        let b = apu.mmio_read(XGSCNT, 4);
        assert!(b >= a);
    }

    #[test]
    fn pci_identity_reports_nvidia_vendor() {
        let apu = test_apu();
        let mut vendor = [0u8; 2];
        apu.config().read(0x00, &mut vendor);
        assert_eq!(u16::from_le_bytes(vendor), PCI_VENDOR_ID_NVIDIA);
    }
}
