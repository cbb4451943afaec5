//! Tunable population thresholds, carried as an explicit value instead of process-wide
//! globals (the original C module keeps these as file-scope statics `bpMinBAPop` /
//! `bpMinAvgBinPop`).

/// Population thresholds that govern when the [`crate::BPlane`] bothers to bin at all, and
/// how densely it packs bins once it does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Minimum element population before a region is worth binning, and the reject
    /// threshold that triggers dynamic subbinning of an over-full bucket during a query.
    pub min_pop: usize,
    /// Target ceiling on average population per bin when the sizer chooses bin dimensions.
    pub min_avg_pop: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config { min_pop: 10, min_avg_pop: 1.0 }
    }
}
