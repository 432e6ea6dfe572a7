//! Derived time series over a run's frames.
//!
//! Every function here is a single read-only pass over already loaded
//! frames. Nothing is cached between calls.

use crate::{
    error::{AnalysisError, AnalysisResult},
    frame::{Field, Frame},
    run::TaggedRun,
    types::{SpeciesType, Timestep},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap};

/// A real used as a map key, ordered by `f64::total_cmp`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Label(pub f64);

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Timesteps of a run's frames, ascending.
pub fn time_grid(frames: &[Frame]) -> Vec<Timestep> {
    let mut t: Vec<Timestep> = frames.iter().map(|f| f.timestep).collect();
    t.sort_unstable();
    t
}

/// Number of species classes present: highest type id plus one.
pub fn species_classes(frames: &[Frame]) -> usize {
    frames
        .iter()
        .flat_map(|f| f.types.iter())
        .max()
        .map_or(0, |&t| t as usize + 1)
}

/// Total biomass of each species class over time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TypeSeries {
    pub timesteps: Vec<Timestep>,
    /// `totals[class][frame]`.
    pub totals:    Vec<Vec<f64>>,
}

/// NaN-ignoring total mass per class and frame.
pub fn total_mass_by_type(frames: &[Frame], num_classes: usize) -> TypeSeries {
    let mut series = TypeSeries {
        timesteps: Vec::with_capacity(frames.len()),
        totals:    vec![Vec::with_capacity(frames.len()); num_classes],
    };
    for frame in frames {
        series.timesteps.push(frame.timestep);
        let mut sums = vec![0.0; num_classes];
        for (&t, &m) in frame.types.iter().zip(&frame.masses) {
            if let Some(sum) = sums.get_mut(t as usize) {
                if !m.is_nan() {
                    *sum += m;
                }
            }
        }
        for (class, sum) in sums.into_iter().enumerate() {
            series.totals[class].push(sum);
        }
    }
    series
}

/// All unordered pairs of classes, for phase-space plots.
pub fn phase_pairs(series: &TypeSeries) -> Vec<(usize, usize)> {
    let n = series.totals.len();
    (0..n)
        .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
        .collect()
}

/// Total biomass of one class for one (run, frame) pair of a sweep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SweepPoint {
    pub timestep:   Timestep,
    pub tag:        f64,
    pub total_mass: f64,
}

pub fn total_mass_sweep(runs: &[TaggedRun<'_>], spec_type: SpeciesType) -> Vec<SweepPoint> {
    runs.iter()
        .flat_map(|run| {
            run.frames.iter().map(move |frame| SweepPoint {
                timestep:   frame.timestep,
                tag:        run.tag,
                total_mass: frame
                    .slots_of_type(spec_type)
                    .into_iter()
                    .map(|s| frame.masses[s])
                    .sum(),
            })
        })
        .collect()
}

/// Traits and masses of one class at one timestep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScatterColumn {
    pub timestep: Timestep,
    pub traits:   Vec<f64>,
    pub masses:   Vec<f64>,
}

/// Bifurcation-diagram data of one class: a column per frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassScatter {
    pub spec_type: SpeciesType,
    pub columns:   Vec<ScatterColumn>,
    /// Largest mass seen in any column, for colour normalisation.
    pub max_mass:  f64,
}

pub fn trait_bifurcation(frames: &[Frame], trait_field: Field, num_classes: usize) -> Vec<ClassScatter> {
    (0..num_classes as SpeciesType)
        .map(|spec_type| {
            let columns: Vec<ScatterColumn> = frames
                .iter()
                .map(|frame| {
                    let values = frame.field(trait_field);
                    let slots = frame.slots_of_type(spec_type);
                    ScatterColumn {
                        timestep: frame.timestep,
                        traits:   slots.iter().map(|&s| values[s]).collect(),
                        masses:   slots.iter().map(|&s| frame.masses[s]).collect(),
                    }
                })
                .collect();
            let max_mass = columns
                .iter()
                .flat_map(|c| c.masses.iter().copied())
                .fold(0.0, f64::max);
            ClassScatter { spec_type, columns, max_mass }
        })
        .collect()
}

/// Per distinct `label` value, the `(timestep, value)` series of one class.
///
/// Used when a run holds species with fixed niche widths: the width labels
/// each mass curve.
pub fn mass_by_label(
    frames:    &[Frame],
    spec_type: SpeciesType,
    label:     Field,
    value:     Field,
) -> BTreeMap<Label, Vec<(Timestep, f64)>> {
    let mut out: BTreeMap<Label, Vec<(Timestep, f64)>> = BTreeMap::new();
    for frame in frames {
        let labels = frame.field(label);
        let values = frame.field(value);
        for s in frame.slots_of_type(spec_type) {
            out.entry(Label(labels[s])).or_default().push((frame.timestep, values[s]));
        }
    }
    out
}

/// Min/max of three fields across every frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Limits {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
}

pub fn limits(frames: &[Frame], x: Field, y: Field, z: Field) -> AnalysisResult<Limits> {
    let range = |field: Field| {
        frames
            .iter()
            .flat_map(|f| f.field(field))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    };
    let out = Limits { x: range(x), y: range(y), z: range(z) };
    let bounds = [out.x.0, out.x.1, out.y.0, out.y.1, out.z.0, out.z.1];
    if bounds.iter().any(|b| b.is_infinite()) {
        return Err(AnalysisError::NoLimits);
    }
    Ok(out)
}

/// Integrator sub-steps laid out on the cumulative time axis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepSeries {
    /// Simulated time at the start of each sub-step.
    pub t:      Vec<f64>,
    pub dt:     Vec<f64>,
    /// Alternates 0/1 per frame so frame boundaries stay visible.
    pub marker: Vec<u8>,
}

pub fn step_size_series(frames: &[Frame]) -> StepSeries {
    let mut out = StepSeries::default();
    let mut now = 0.0;
    let mut marker = 0u8;
    for frame in frames {
        for &dt in &frame.dts {
            out.t.push(now);
            out.dt.push(dt);
            out.marker.push(marker);
            now += dt;
        }
        marker ^= 1;
    }
    out
}

/// Total simulated time covered by a run's sub-steps.
pub fn integration_time(frames: &[Frame]) -> f64 {
    frames.iter().flat_map(|f| f.dts.iter()).sum()
}

/// The shortest integration time in a sweep; the common x range when
/// comparing integrators.
pub fn common_horizon(runs: &[TaggedRun<'_>]) -> Option<f64> {
    runs.iter().map(|r| integration_time(r.frames)).reduce(f64::min)
}

/// Local error estimates of one species (keyed by trait) over time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ErrorTrack {
    pub time:  Vec<f64>,
    pub error: Vec<f64>,
}

pub fn error_by_trait(frames: &[Frame], spec_type: SpeciesType) -> BTreeMap<Label, ErrorTrack> {
    let mut out: BTreeMap<Label, ErrorTrack> = BTreeMap::new();
    let mut now = 0.0;
    for frame in frames {
        now += frame.dts.iter().sum::<f64>();
        for s in frame.slots_of_type(spec_type) {
            let track = out.entry(Label(frame.traits[s])).or_default();
            track.time.push(now);
            track.error.push(frame.errors[s]);
        }
    }
    out
}
