//! Replicate Keys
//!
//! Every persisted table is keyed by replicate id and source correlation.

use serde::{Deserialize, Serialize};

/// Width of the zero-padded replicate label.
pub const REPLICATE_LABEL_WIDTH: usize = 2;

/// Identifies one replicate run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplicateKey {
    pub replicate: u32,
    pub gamma: f64,
}

impl ReplicateKey {
    pub fn new(replicate: u32, gamma: f64) -> Self {
        Self { replicate, gamma }
    }

    /// Zero-padded replicate label, e.g. `"03"` or `"117"`.
    pub fn replicate_label(&self) -> String {
        format!("{:0width$}", self.replicate, width = REPLICATE_LABEL_WIDTH)
    }

    /// Directory label for the gamma value, e.g. `"gamma0.5"`.
    pub fn gamma_label(&self) -> String {
        format!("gamma{}", format_gamma(self.gamma))
    }
}

/// Formats gamma so that whole numbers keep one decimal (`1.0`, `-1.0`, `0.0`).
pub fn format_gamma(gamma: f64) -> String {
    if gamma.fract() == 0.0 {
        format!("{:.1}", gamma)
    } else {
        format!("{}", gamma)
    }
}
