//! Front-end voice-list method engine (C2). The VP command window dispatches
//! recognized offsets to [`fe_method`], which maintains the three singly
//! linked voice lists and the `FEDECMETH`/`FEDECPARAM`/`FEAV`/`FECV` latches.

use crate::device::McpxApu;
use crate::interrupt;
use crate::regs::*;
use crate::voice;

pub const PIO_FREE: u64 = 0x010;
pub const SET_ANTECEDENT_VOICE: u32 = 0x120;
pub const VOICE_ON: u32 = 0x124;
pub const VOICE_OFF: u32 = 0x128;
pub const VOICE_PAUSE: u32 = 0x140;
pub const SET_CURRENT_VOICE: u32 = 0x2F8;
pub const SE2FE_IDLE_VOICE: u32 = 0x8000;

const LIST_INHERIT: u32 = 0;
const VOICE_HANDLE_MASK: u32 = 0x0000_FFFF;
const VOICE_PAUSE_ACTION: u32 = 1 << 18;

/// `(top, current, next)` register offsets for list selector `1..=3`
/// (2D, 3D, MP), indexed by `list - 1`.
const VOICE_LIST_REGS: [(u64, u64, u64); 3] = [
    (TVL2D, CVL2D, NVL2D),
    (TVL3D, CVL3D, NVL3D),
    (TVLMP, CVLMP, NVLMP),
];

/// Read offset `NV1BA0_PIO_FREE` always returns `0x80` — the command queue
/// is not simulated, so it is reported as perpetually empty.
pub fn vp_read(_offset: u64) -> u32 {
    0x80
}

pub fn vp_write(apu: &mut McpxApu, offset: u64, value: u32) {
    let method = match offset as u32 {
        SET_ANTECEDENT_VOICE | VOICE_ON | VOICE_OFF | VOICE_PAUSE | SET_CURRENT_VOICE => offset as u32,
        _ => return,
    };
    fe_method(apu, method, value);
}

/// Interprets `method` with `argument`. Unknown methods and
/// `SE2FE_IDLE_VOICE` without its enable bit are fatal precondition
/// violations.
pub fn fe_method(apu: &mut McpxApu, method: u32, argument: u32) {
    apu.write_top_reg(FEDECMETH, method);
    apu.write_top_reg(FEDECPARAM, argument);

    match method {
        SET_ANTECEDENT_VOICE => {
            apu.write_top_reg(FEAV, argument);
        }
        VOICE_ON => voice_on(apu, argument),
        VOICE_OFF => {
            let handle = argument & VOICE_HANDLE_MASK;
            let table_base = apu.voice_table_base();
            voice::voice_set(apu.mem_mut(), table_base, handle, PAR_STATE, PAR_STATE_ACTIVE, 0);
        }
        VOICE_PAUSE => {
            let handle = argument & VOICE_HANDLE_MASK;
            let paused = u32::from((argument & VOICE_PAUSE_ACTION) != 0);
            let table_base = apu.voice_table_base();
            voice::voice_set(apu.mem_mut(), table_base, handle, PAR_STATE, PAR_STATE_PAUSED, paused);
        }
        SET_CURRENT_VOICE => {
            apu.write_top_reg(FECV, argument);
        }
        SE2FE_IDLE_VOICE => idle_voice_trap(apu, argument),
        other => panic!("unknown front-end method 0x{:x}", other),
    }
}

fn voice_on(apu: &mut McpxApu, argument: u32) {
    let handle = argument & VOICE_HANDLE_MASK;
    let list = get_mask(apu.read_top_reg(FEAV), FEAV_LST);
    let table_base = apu.voice_table_base();

    if list != LIST_INHERIT {
        let (top_reg, _, _) = VOICE_LIST_REGS[(list - 1) as usize];
        let current_top = apu.read_top_reg(top_reg);
        voice::voice_set(
            apu.mem_mut(),
            table_base,
            handle,
            TAR_PITCH_LINK,
            TAR_PITCH_LINK_NEXT_HANDLE,
            current_top,
        );
        apu.write_top_reg(top_reg, handle);
    } else {
        let antecedent = get_mask(apu.read_top_reg(FEAV), FEAV_VALUE);
        assert!(antecedent != 0xFFFF, "inherit-insert with null antecedent");

        let next_handle = voice::voice_get(
            apu.mem(),
            table_base,
            antecedent,
            TAR_PITCH_LINK,
            TAR_PITCH_LINK_NEXT_HANDLE,
        );
        voice::voice_set(
            apu.mem_mut(),
            table_base,
            handle,
            TAR_PITCH_LINK,
            TAR_PITCH_LINK_NEXT_HANDLE,
            next_handle,
        );
        voice::voice_set(
            apu.mem_mut(),
            table_base,
            antecedent,
            TAR_PITCH_LINK,
            TAR_PITCH_LINK_NEXT_HANDLE,
            handle,
        );
    }

    voice::voice_set(apu.mem_mut(), table_base, handle, PAR_STATE, PAR_STATE_ACTIVE, 1);
}

fn idle_voice_trap(apu: &mut McpxApu, handle: u32) {
    assert!(
        apu.read_top_reg(FETFORCE1) & FETFORCE1_SE2FE_IDLE_VOICE != 0,
        "SE2FE_IDLE_VOICE without its trap-force enable bit"
    );

    log::warn!("front end trapped: idle voice {:#06x} observed mid-list", handle);

    let mut fectl = apu.read_top_reg(FECTL);
    fectl &= !FECTL_FEMETHMODE;
    fectl |= FECTL_FEMETHMODE_TRAPPED;
    fectl &= !FECTL_FETRAPREASON;
    fectl |= FECTL_FETRAPREASON_REQUESTED;
    apu.write_top_reg(FECTL, fectl);

    let ists = apu.read_top_reg(ISTS) | ISTS_FETINTSTS;
    apu.write_top_reg(ISTS, ists);

    interrupt::update_irq(apu);
}

pub(crate) fn voice_list_regs(list_index: usize) -> (u64, u64, u64) {
    VOICE_LIST_REGS[list_index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_apu;

    #[test]
    fn top_insert_on_empty_list() {
        let mut apu = test_apu();
        apu.write_top_reg(TVL3D, 0xFFFF);

        fe_method(&mut apu, SET_ANTECEDENT_VOICE, 0x0002_0000); // list = 2 (3D), inherit value ignored
        fe_method(&mut apu, VOICE_ON, 0x0005);

        assert_eq!(apu.read_top_reg(TVL3D), 5);
        let table_base = apu.voice_table_base();
        assert_eq!(
            voice::voice_get(apu.mem(), table_base, 5, TAR_PITCH_LINK, TAR_PITCH_LINK_NEXT_HANDLE),
            0xFFFF
        );
        assert_eq!(voice::voice_get(apu.mem(), table_base, 5, PAR_STATE, PAR_STATE_ACTIVE), 1);
    }

    #[test]
    fn insert_after_antecedent() {
        let mut apu = test_apu();
        apu.write_top_reg(TVL3D, 0xFFFF);
        fe_method(&mut apu, SET_ANTECEDENT_VOICE, 0x0002_0000);
        fe_method(&mut apu, VOICE_ON, 0x0005);

        fe_method(&mut apu, SET_ANTECEDENT_VOICE, 0x0000_0005); // inherit, antecedent = 5
        fe_method(&mut apu, VOICE_ON, 0x0009);

        assert_eq!(apu.read_top_reg(TVL3D), 5);
        let table_base = apu.voice_table_base();
        assert_eq!(
            voice::voice_get(apu.mem(), table_base, 5, TAR_PITCH_LINK, TAR_PITCH_LINK_NEXT_HANDLE),
            9
        );
        assert_eq!(
            voice::voice_get(apu.mem(), table_base, 9, TAR_PITCH_LINK, TAR_PITCH_LINK_NEXT_HANDLE),
            0xFFFF
        );
    }

    #[test]
    fn three_top_inserts_reverse_on_traversal() {
        let mut apu = test_apu();
        apu.write_top_reg(TVL2D, 0xFFFF);
        fe_method(&mut apu, SET_ANTECEDENT_VOICE, 0x0001_0000); // 2D top
        fe_method(&mut apu, VOICE_ON, 1);
        fe_method(&mut apu, SET_ANTECEDENT_VOICE, 0x0001_0000);
        fe_method(&mut apu, VOICE_ON, 2);
        fe_method(&mut apu, SET_ANTECEDENT_VOICE, 0x0001_0000);
        fe_method(&mut apu, VOICE_ON, 3);

        let table_base = apu.voice_table_base();
        let mut order = vec![];
        let mut cur = apu.read_top_reg(TVL2D);
        while cur != 0xFFFF {
            order.push(cur);
            cur = voice::voice_get(apu.mem(), table_base, cur, TAR_PITCH_LINK, TAR_PITCH_LINK_NEXT_HANDLE);
        }
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    #[should_panic]
    fn unknown_method_panics() {
        let mut apu = test_apu();
        fe_method(&mut apu, 0xDEAD, 0);
    }
}
