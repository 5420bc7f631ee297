//! Interrupt arbiter (C7): combines `ISTS`/`IEN` into the shared PCI
//! interrupt line and implements `ISTS`'s write-one-to-clear semantics.

use crate::device::McpxApu;
use crate::regs::{IEN, ISTS, ISTS_GINTSTS};

/// Applies a write-one-to-clear update to `ISTS`, then re-evaluates the
/// interrupt line.
pub fn ists_write(apu: &mut McpxApu, written: u32) {
    let cleared = apu.read_top_reg(ISTS) & !written;
    apu.write_top_reg(ISTS, cleared);
    update_irq(apu);
}

/// Recomputes `ISTS.GINTSTS` from `ISTS`/`IEN` and asserts or deasserts the
/// PCI interrupt line accordingly. Called whenever either register changes.
pub fn update_irq(apu: &mut McpxApu) {
    let ien = apu.read_top_reg(IEN);
    let ists = apu.read_top_reg(ISTS);

    if (ien & ISTS_GINTSTS != 0) && ((ists & !ISTS_GINTSTS) & ien != 0) {
        apu.write_top_reg(ISTS, ists | ISTS_GINTSTS);
        log::trace!("asserting MCPX APU interrupt line (ISTS={:#x} IEN={:#x})", ists, ien);
        apu.irq_assert();
    } else {
        apu.write_top_reg(ISTS, ists & !ISTS_GINTSTS);
        apu.irq_deassert();
    }
}
