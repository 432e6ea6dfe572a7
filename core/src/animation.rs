//! Frame drivers for animated sweep / run plots.
//!
//! A driver advances a frame cursor and re-runs extraction until the data
//! runs out. Each yielded frame carries everything a renderer needs; the
//! renderer itself lives outside this crate.

use crate::{
    error::AnalysisResult,
    extract::{extract, extract_single, RunTrajectory, SweepTrajectory, TrajectoryQuery},
    frame::{Field, Frame},
    peaks::find_peaks,
    run::{RunParams, TaggedRun},
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fewer points than this cannot be triangulated.
pub const MIN_SURFACE_POINTS: usize = 3;

/// Simulated time of a frame: `step = index * write_every`, `time = step * dt2`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Timestamp {
    pub step: u64,
    pub time: f64,
}

impl Timestamp {
    pub fn at_step(step: u64, params: &RunParams) -> Self {
        Self { step, time: step as f64 * params.dt2 }
    }

    pub fn at_index(index: u64, params: &RunParams) -> Self {
        Self::at_step(index * params.write_every, params)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={} ({}dt)", self.time, self.step)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepFrame {
    pub index:      u64,
    pub timestamp:  Timestamp,
    pub trajectory: SweepTrajectory,
}

/// Iterates sweep frames from `start` until some run runs out of frames.
pub struct SweepFrames<'a, 'r> {
    runs:     &'a [TaggedRun<'r>],
    query:    TrajectoryQuery,
    params:   RunParams,
    next:     u64,
    peaks:    bool,
    finished: bool,
}

impl<'a, 'r> SweepFrames<'a, 'r> {
    /// Timestamps follow the first run's parameters.
    pub fn new(runs: &'a [TaggedRun<'r>], query: TrajectoryQuery, start: u64) -> Self {
        let params = runs.first().map(|r| r.params.clone()).unwrap_or_default();
        Self { runs, query, params, next: start, peaks: false, finished: false }
    }

    /// Reduce every frame to the local maxima of its z values.
    pub fn peaks_only(mut self, on: bool) -> Self {
        self.peaks = on;
        self
    }
}

impl Iterator for SweepFrames<'_, '_> {
    type Item = AnalysisResult<SweepFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        // An empty sweep never runs out of data; stop immediately.
        if self.finished || self.runs.is_empty() {
            return None;
        }
        let index = self.next;
        let query = self.query.at(index as i64);
        match extract(self.runs, &query) {
            Ok(Some(mut trajectory)) => {
                self.next += 1;
                if self.peaks {
                    trajectory = trajectory.select(&find_peaks(&trajectory.z));
                }
                Some(Ok(SweepFrame {
                    index,
                    timestamp: Timestamp::at_index(index, &self.params),
                    trajectory,
                }))
            }
            Ok(None) => {
                debug!("sweep animation ended after {} frames", index);
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// The last frame of every run, stamped with the run's total step count.
pub fn final_state(
    runs:  &[TaggedRun<'_>],
    query: &TrajectoryQuery,
    peaks: bool,
) -> AnalysisResult<Option<SweepFrame>> {
    let Some(mut trajectory) = extract(runs, &query.at(-1))? else {
        return Ok(None);
    };
    if peaks {
        trajectory = trajectory.select(&find_peaks(&trajectory.z));
    }
    let params = runs.first().map(|r| r.params.clone()).unwrap_or_default();
    let last = runs.iter().map(|r| r.frames.len() as u64).min().unwrap_or(0);
    Ok(Some(SweepFrame {
        index:     last.saturating_sub(1),
        timestamp: Timestamp::at_step(params.num_steps, &params),
        trajectory,
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunFrame {
    pub index:      u64,
    pub timestamp:  Timestamp,
    pub trajectory: RunTrajectory,
}

/// Iterates one run's frames, skipping those too sparse to draw as a surface.
pub struct RunFrames<'a> {
    frames:   &'a [Frame],
    params:   &'a RunParams,
    query:    TrajectoryQuery,
    y:        Field,
    next:     u64,
    peaks:    bool,
    finished: bool,
}

impl<'a> RunFrames<'a> {
    pub fn new(
        frames: &'a [Frame],
        params: &'a RunParams,
        query:  TrajectoryQuery,
        y:      Field,
        start:  u64,
    ) -> Self {
        Self { frames, params, query, y, next: start, peaks: false, finished: false }
    }

    pub fn peaks_only(mut self, on: bool) -> Self {
        self.peaks = on;
        self
    }
}

impl Iterator for RunFrames<'_> {
    type Item = AnalysisResult<RunFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let index = self.next;
            let query = self.query.at(index as i64);
            match extract_single(self.frames, &query, self.y) {
                Ok(Some(mut trajectory)) => {
                    self.next += 1;
                    if self.peaks {
                        trajectory = trajectory.select(&find_peaks(&trajectory.z));
                    }
                    if trajectory.len() < MIN_SURFACE_POINTS {
                        warn!("skipping frame {index}: only {} points", trajectory.len());
                        continue;
                    }
                    return Some(Ok(RunFrame {
                        index,
                        timestamp: Timestamp::at_index(index, self.params),
                        trajectory,
                    }));
                }
                Ok(None) => self.finished = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_scales_by_write_every_and_dt2() {
        let params = RunParams { write_every: 10, dt2: 0.5, ..RunParams::default() };
        let ts = Timestamp::at_index(3, &params);
        assert_eq!(ts.step, 30);
        assert_eq!(ts.time, 15.0);
        assert_eq!(ts.to_string(), "t=15 (30dt)");
    }

    #[test]
    fn empty_sweep_yields_nothing() {
        let runs: Vec<TaggedRun<'_>> = Vec::new();
        assert_eq!(SweepFrames::new(&runs, TrajectoryQuery::default(), 0).count(), 0);
    }

    #[test]
    fn run_frames_skip_sparse_frames() {
        let params = RunParams::default();
        let frames = vec![
            Frame::new(0, vec![1, 1], vec![0.0, 1.0], vec![1.0, 1.0], vec![0.1, 0.1]).unwrap(),
            Frame::new(1, vec![1, 1, 1], vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0], vec![0.1; 3])
                .unwrap(),
        ];
        let out: Vec<_> = RunFrames::new(&frames, &params, TrajectoryQuery::default(), Field::NicheWidth, 0)
            .collect::<AnalysisResult<_>>()
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].index, 1);
        assert_eq!(out[0].trajectory.x, vec![2.0, 1.0, 0.0]);
    }
}
