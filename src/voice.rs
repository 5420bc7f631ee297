//! Voice record accessor (C3): bitfield read/modify/write against the
//! 128-byte voice record stored in guest RAM at `VPVADDR + handle * 128`.

use crate::collaborators::GuestMemory;
use crate::regs::VOICE_RECORD_SIZE;

fn voice_addr(table_base: u64, handle: u32, field_offset: u64) -> u64 {
    table_base + (handle as u64) * VOICE_RECORD_SIZE + field_offset
}

/// Reads the masked, shifted field at `field_offset` within voice `handle`'s
/// record. `handle` must be `< 0xFFFF`; the null handle is never a valid
/// storage location.
pub fn voice_get(
    mem: &dyn GuestMemory,
    table_base: u64,
    handle: u32,
    field_offset: u64,
    mask: u32,
) -> u32 {
    assert!(handle < 0xFFFF, "voice_get on null handle");
    let word = mem.ldl_le(voice_addr(table_base, handle, field_offset));
    (word & mask) >> mask.trailing_zeros()
}

/// Read-modify-writes the masked field at `field_offset` within voice
/// `handle`'s record, replacing it with `value` shifted into place.
pub fn voice_set(
    mem: &mut dyn GuestMemory,
    table_base: u64,
    handle: u32,
    field_offset: u64,
    mask: u32,
    value: u32,
) {
    assert!(handle < 0xFFFF, "voice_set on null handle");
    let addr = voice_addr(table_base, handle, field_offset);
    let word = mem.ldl_le(addr);
    let new_word = (word & !mask) | ((value << mask.trailing_zeros()) & mask);
    mem.stl_le(addr, new_word);
}
