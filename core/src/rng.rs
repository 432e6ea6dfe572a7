//! Deterministic random number generation for synthetic output.
//!
//! RULE: Synthetic data never touches a platform RNG.
//! Each run of a sweep gets its own stream, seeded from
//! (master_seed XOR run_index * golden ratio), so adding runs never
//! changes the data of existing ones.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct RunRng {
    inner: Pcg64Mcg,
}

impl RunRng {
    pub fn new(master_seed: u64, run_index: u64) -> Self {
        let derived_seed = master_seed ^ run_index.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self { inner: Pcg64Mcg::seed_from_u64(derived_seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Standard normal sample (Box-Muller).
    pub fn normal(&mut self) -> f64 {
        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}
