//! Trajectory extraction for sweep comparison plots.
//!
//! Turns the frame at one timestep of every run in a sweep into flat,
//! NaN-segmented coordinate arrays ready for surface / contour drawing:
//!
//!   x = trait (or any `Field`), y = run tag, z = mass, c = run index
//!
//! Each run contributes one block, ordered by x descending and terminated by
//! a NaN sentinel so downstream line plots never join two runs.
//!
//! RULES:
//!   - Extraction is pure. Same inputs, same outputs.
//!   - A timestep index some run cannot resolve is not an error: it yields
//!     `None`, which animation drivers use as end-of-data.
//!   - A malformed frame is fatal and propagates.

use crate::{
    error::AnalysisResult,
    frame::{Field, Frame},
    run::TaggedRun,
    types::{resolve_index, SpeciesType},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What to pull out of each run's frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrajectoryQuery {
    pub x:         Field,
    pub z:         Field,
    pub spec_type: SpeciesType,
    /// Frame index; negative counts from the end (`-1` = last frame).
    pub time:      i64,
}

impl Default for TrajectoryQuery {
    fn default() -> Self {
        Self { x: Field::Trait, z: Field::Mass, spec_type: 1, time: -1 }
    }
}

impl TrajectoryQuery {
    pub fn at(self, time: i64) -> Self {
        Self { time, ..self }
    }
}

/// Concatenated, NaN-segmented per-run blocks of a sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SweepTrajectory {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub c: Vec<f64>,
}

/// The per-run variant: no sentinel, y is a per-species field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunTrajectory {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl SweepTrajectory {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Index ranges of each run's block, sentinel excluded.
    pub fn blocks(&self) -> Vec<std::ops::Range<usize>> {
        let mut blocks = Vec::new();
        let mut start = 0;
        for (i, c) in self.c.iter().enumerate() {
            if c.is_nan() {
                blocks.push(start..i);
                start = i + 1;
            }
        }
        blocks
    }

    /// Keep only the given indices, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            x: indices.iter().map(|&i| self.x[i]).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            z: indices.iter().map(|&i| self.z[i]).collect(),
            c: indices.iter().map(|&i| self.c[i]).collect(),
        }
    }

    /// The points with the sentinels stripped, as a per-run style triple.
    /// This is what gets triangulated for surface plots.
    pub fn points(&self) -> RunTrajectory {
        let keep: Vec<usize> = (0..self.len()).filter(|&i| !self.c[i].is_nan()).collect();
        RunTrajectory {
            x: keep.iter().map(|&i| self.x[i]).collect(),
            y: keep.iter().map(|&i| self.y[i]).collect(),
            z: keep.iter().map(|&i| self.z[i]).collect(),
        }
    }
}

impl RunTrajectory {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Keep only the given indices, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            x: indices.iter().map(|&i| self.x[i]).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            z: indices.iter().map(|&i| self.z[i]).collect(),
        }
    }
}

/// Ascending order with NaN above every number.
fn ascending_nan_last(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Slots of `spec_type` in `frame`, ordered by `key` descending.
///
/// Descending means a stable ascending sort then a reversal, so species
/// with equal keys come out in reverse storage order.
pub(crate) fn ordered_slots(frame: &Frame, spec_type: SpeciesType, key: &[f64]) -> Vec<usize> {
    let mut slots = frame.slots_of_type(spec_type);
    slots.sort_by(|&a, &b| ascending_nan_last(key[a], key[b]));
    slots.reverse();
    slots
}

/// Pick each run's frame at `time`, or `None` if any run is too short.
fn resolve_frames<'a>(runs: &[TaggedRun<'a>], time: i64) -> Option<Vec<&'a Frame>> {
    runs.iter()
        .map(|run| resolve_index(run.frames.len(), time).map(|i| &run.frames[i]))
        .collect()
}

/// Extract the sweep trajectory at `query.time`.
pub fn extract(
    runs:  &[TaggedRun<'_>],
    query: &TrajectoryQuery,
) -> AnalysisResult<Option<SweepTrajectory>> {
    let Some(frames) = resolve_frames(runs, query.time) else {
        debug!("extract: time index {} not reached by every run", query.time);
        return Ok(None);
    };

    let mut out = SweepTrajectory::default();
    for (k, (run, frame)) in runs.iter().zip(frames).enumerate() {
        frame.validate()?;
        let xs = frame.field(query.x);
        let zs = frame.field(query.z);

        for slot in ordered_slots(frame, query.spec_type, &xs) {
            out.x.push(xs[slot]);
            out.z.push(zs[slot]);
            out.y.push(run.tag);
            out.c.push(k as f64);
        }
        out.x.push(f64::NAN);
        out.z.push(f64::NAN);
        out.y.push(f64::NAN);
        out.c.push(f64::NAN);
    }

    debug!(
        "extract: {} runs at time {} -> {} entries",
        runs.len(),
        query.time,
        out.len()
    );
    Ok(Some(out))
}

/// Extract one run's frame at `query.time`, with `y` as a per-species field
/// (usually the niche width).
pub fn extract_single(
    frames: &[Frame],
    query:  &TrajectoryQuery,
    y:      Field,
) -> AnalysisResult<Option<RunTrajectory>> {
    let Some(i) = resolve_index(frames.len(), query.time) else {
        return Ok(None);
    };
    let frame = &frames[i];
    frame.validate()?;

    let xs = frame.field(query.x);
    let ys = frame.field(y);
    let zs = frame.field(query.z);
    let slots = ordered_slots(frame, query.spec_type, &xs);

    Ok(Some(RunTrajectory {
        x: slots.iter().map(|&s| xs[s]).collect(),
        y: slots.iter().map(|&s| ys[s]).collect(),
        z: slots.iter().map(|&s| zs[s]).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunParams;

    fn frame(traits: Vec<f64>, types: Vec<SpeciesType>) -> Frame {
        let n = traits.len();
        let masses = (0..n).map(|i| i as f64).collect();
        Frame::new(0, types, traits, masses, vec![0.1; n]).unwrap()
    }

    #[test]
    fn equal_traits_come_out_in_reverse_storage_order() {
        // masses are the slot index, so they reveal the ordering
        let f = frame(vec![1.0, 2.0, 1.0, 2.0], vec![1, 1, 1, 1]);
        let run = extract_single(std::slice::from_ref(&f), &TrajectoryQuery::default(), Field::NicheWidth)
            .unwrap()
            .unwrap();
        assert_eq!(run.x, vec![2.0, 2.0, 1.0, 1.0]);
        assert_eq!(run.z, vec![3.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn nan_traits_lead_the_block() {
        let f = frame(vec![1.0, f64::NAN, 3.0], vec![1, 1, 1]);
        let slots = ordered_slots(&f, 1, &f.traits);
        assert_eq!(slots, vec![1, 2, 0]);
    }

    #[test]
    fn other_types_are_filtered_out() {
        let f = frame(vec![1.0, 2.0, 3.0], vec![0, 1, 0]);
        let params = RunParams::default();
        let frames = [f];
        let runs = [TaggedRun { tag: 0.5, params: &params, frames: &frames }];
        let out = extract(&runs, &TrajectoryQuery::default()).unwrap().unwrap();
        assert_eq!(out.x[0], 2.0);
        assert!(out.x[1].is_nan());
        assert_eq!(out.len(), 2);
        assert_eq!(out.blocks(), vec![0..1]);
    }

    #[test]
    fn points_strip_sentinels() {
        let out = SweepTrajectory {
            x: vec![3.0, f64::NAN, 5.0, f64::NAN],
            y: vec![0.1, f64::NAN, 0.2, f64::NAN],
            z: vec![30.0, f64::NAN, 50.0, f64::NAN],
            c: vec![0.0, f64::NAN, 1.0, f64::NAN],
        };
        let p = out.points();
        assert_eq!(p.x, vec![3.0, 5.0]);
        assert_eq!(p.y, vec![0.1, 0.2]);
    }
}
