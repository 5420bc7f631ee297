//! Frame scheduler (C5): the periodic tick that traverses the three voice
//! lists, mixes active voices into the mixbin buffer, publishes it to GP
//! X-memory, and kicks the two signal processors.

use crate::collaborators::DspBank;
use crate::device::McpxApu;
use crate::frontend::{self, SE2FE_IDLE_VOICE};
use crate::regs::*;
use crate::voice;

const FRAME_PERIOD_MS: u64 = 10;

/// Invoked by the embedder when its `FrameTimer` fires. Re-arms for the
/// next period, then runs one frame.
pub fn frame_tick(apu: &mut McpxApu, now_ms: u64) {
    apu.arm_timer(now_ms + FRAME_PERIOD_MS);

    let mut mixbins = [[0i32; NUM_SAMPLES_PER_FRAME]; NUM_MIXBINS];
    let table_base = apu.voice_table_base();

    for list_index in 0..3 {
        let (top_reg, cur_reg, next_reg) = frontend::voice_list_regs(list_index);

        let mut current = apu.read_top_reg(top_reg);
        apu.write_top_reg(cur_reg, current);

        while current != VOICE_NULL_HANDLE {
            let next = voice::voice_get(apu.mem(), table_base, current, TAR_PITCH_LINK, TAR_PITCH_LINK_NEXT_HANDLE);
            apu.write_top_reg(next_reg, next);

            let active = voice::voice_get(apu.mem(), table_base, current, PAR_STATE, PAR_STATE_ACTIVE);
            if active == 0 {
                frontend::fe_method(apu, SE2FE_IDLE_VOICE, current);
            } else {
                process_voice(&mut mixbins, current);
            }

            current = apu.read_top_reg(next_reg);
        }
    }

    publish_mixbins(apu, &mixbins);

    let gp_rst = apu.read_gp_reg(DSP_RST);
    if gp_rst & RST_GPRST != 0 && gp_rst & RST_GPDSPRST != 0 {
        let cycles = apu.config().gp_run_cycles;
        apu.gp_start_frame();
        apu.gp_run(cycles);
    }

    let ep_rst = apu.read_ep_reg(DSP_RST);
    if ep_rst & RST_GPRST != 0 && ep_rst & RST_GPDSPRST != 0 {
        apu.ep_start_frame();
        // Running EP is deferred until the embedded processor core exists.
    }
}

/// Per-voice audio rendering (pitch, envelopes, filters, mixbin routing) is
/// out of scope; the hook point is preserved but always contributes
/// silence.
fn process_voice(_mixbins: &mut [[i32; NUM_SAMPLES_PER_FRAME]; NUM_MIXBINS], _handle: u32) {}

fn publish_mixbins(apu: &mut McpxApu, mixbins: &[[i32; NUM_SAMPLES_PER_FRAME]; NUM_MIXBINS]) {
    for (mixbin, samples) in mixbins.iter().enumerate() {
        for (sample, value) in samples.iter().enumerate() {
            let addr = GP_DSP_MIXBUF_BASE + (mixbin as u32) * 0x20 + sample as u32;
            apu.gp_mut().write_memory(DspBank::X, addr, (*value as u32) & 0x00FF_FFFF);
        }
    }
}
