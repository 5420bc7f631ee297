/// The host page size the scatter/gather engine decomposes addresses
/// against, and the GP `run()` cycle-per-frame heuristic.
#[derive(Copy, Clone, Debug)]
pub struct ApuConfig {
    pub page_size: u32,
    pub gp_run_cycles: u32,
}

impl Default for ApuConfig {
    fn default() -> Self {
        ApuConfig {
            page_size: 4096,
            gp_run_cycles: 1000,
        }
    }
}
