//! Synthetic MacArthur-style sweeps for demos and tests.
//!
//! Resources (type 0) sit on a fixed trait grid with a Gaussian carrying
//! capacity. Consumers (type 1) start at random traits and drift towards
//! resource-rich regions; their niche width is the sweep parameter
//! `fixed_y`. Consumers feed on resources within two niche widths, which
//! is also what the interaction graph records.

use crate::{
    error::AnalysisResult,
    frame::{Edge, Frame},
    rng::RunRng,
    run::{Run, RunParams},
    types::SpeciesType,
};
use serde::{Deserialize, Serialize};

const RESOURCE: SpeciesType = 0;
const CONSUMER: SpeciesType = 1;
const TRAIT_RANGE: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyntheticSweep {
    pub seed:        u64,
    pub runs:        usize,
    pub frames:      usize,
    pub resources:   usize,
    pub consumers:   usize,
    /// Niche width of the first run; run `k` uses `(k + 1) * base_width`.
    pub base_width:  f64,
    pub write_every: u64,
    pub dt2:         f64,
}

impl Default for SyntheticSweep {
    fn default() -> Self {
        Self {
            seed:        42,
            runs:        5,
            frames:      20,
            resources:   21,
            consumers:   12,
            base_width:  0.5,
            write_every: 10,
            dt2:         0.1,
        }
    }
}

impl SyntheticSweep {
    pub fn generate(&self) -> AnalysisResult<Vec<Run>> {
        (0..self.runs).map(|k| self.generate_run(k)).collect()
    }

    fn generate_run(&self, k: usize) -> AnalysisResult<Run> {
        let mut rng = RunRng::new(self.seed, k as u64);
        let width = self.base_width * (k + 1) as f64;
        let params = RunParams {
            integrator:  "rkck".into(),
            fixed_y:     Some(width),
            dt:          None,
            error:       Some(1e-6),
            dt2:         self.dt2,
            write_every: self.write_every,
            num_steps:   self.frames as u64 * self.write_every,
        };
        let mut run = Run::new(format!("sweep-{}-{k}", self.seed), k as u32, params);

        let resource_traits: Vec<f64> = (0..self.resources)
            .map(|i| {
                if self.resources < 2 {
                    0.0
                } else {
                    -TRAIT_RANGE + 2.0 * TRAIT_RANGE * i as f64 / (self.resources - 1) as f64
                }
            })
            .collect();
        let mut consumer_traits: Vec<f64> = (0..self.consumers)
            .map(|_| rng.uniform(-TRAIT_RANGE, TRAIT_RANGE))
            .collect();

        for f in 0..self.frames {
            let timestep = f as u64 * self.write_every;
            let growth = 1.0 - (-(f as f64 + 1.0) / 5.0).exp();

            let mut types = Vec::new();
            let mut traits = Vec::new();
            let mut masses = Vec::new();
            let mut widths = Vec::new();
            let mut errors = Vec::new();

            for &x in &resource_traits {
                types.push(RESOURCE);
                traits.push(x);
                masses.push(capacity(x));
                widths.push(0.0);
                errors.push(0.0);
            }
            for x in consumer_traits.iter_mut() {
                *x = (*x - 0.05 * *x + 0.1 * rng.normal()).clamp(-TRAIT_RANGE, TRAIT_RANGE);
                let food = width * capacity(*x);
                types.push(CONSUMER);
                traits.push(*x);
                masses.push((growth * food * (1.0 + 0.05 * rng.normal())).max(0.0));
                widths.push(width);
                errors.push(1e-7 * rng.next_f64());
            }

            let n_res = resource_traits.len();
            let mut edges = Vec::new();
            for (c, &xc) in consumer_traits.iter().enumerate() {
                for (r, &xr) in resource_traits.iter().enumerate() {
                    let d = (xc - xr).abs();
                    if d < 2.0 * width {
                        edges.push(Edge {
                            source: (n_res + c) as u64,
                            target: r as u64,
                            weight: (-d * d / (2.0 * width * width)).exp(),
                        });
                    }
                }
            }

            let dts = (0..self.write_every)
                .map(|_| self.dt2 * rng.uniform(0.5, 1.5))
                .collect();

            let frame = Frame::new(timestep, types, traits, masses, widths)?
                .with_errors(errors)?
                .with_edges(edges)
                .with_dts(dts);
            run.push_frame(frame);
        }
        Ok(run)
    }
}

fn capacity(x: f64) -> f64 {
    10.0 * (-x * x / 32.0).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sweep() {
        let a = SyntheticSweep::default().generate().unwrap();
        let b = SyntheticSweep::default().generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn shape_matches_request() {
        let sweep = SyntheticSweep { runs: 3, frames: 4, resources: 5, consumers: 2, ..SyntheticSweep::default() };
        let runs = sweep.generate().unwrap();
        assert_eq!(runs.len(), 3);
        for (k, run) in runs.iter().enumerate() {
            assert_eq!(run.sweep_index, k as u32);
            assert_eq!(run.frames.len(), 4);
            assert_eq!(run.params.fixed_y, Some(0.5 * (k + 1) as f64));
            for frame in &run.frames {
                assert_eq!(frame.num_species, 7);
                assert_eq!(frame.dts.len(), 10);
                assert!(frame.masses.iter().all(|m| *m >= 0.0));
            }
        }
        assert_eq!(runs[0].timesteps(), vec![0, 10, 20, 30]);
    }
}
