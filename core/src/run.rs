//! A simulation run: typed parameters plus its time-ordered frames.

use crate::{
    error::{AnalysisError, AnalysisResult},
    frame::Frame,
    types::{RunId, Timestep},
};
use serde::{Deserialize, Serialize};

/// Model parameters of a run, resolved once when the run is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunParams {
    #[serde(default = "default_integrator")]
    pub integrator:  String,
    #[serde(default)]
    pub fixed_y:     Option<f64>,
    #[serde(default)]
    pub dt:          Option<f64>,
    #[serde(default)]
    pub error:       Option<f64>,
    /// Length of one model step in simulated time.
    #[serde(default = "default_dt2")]
    pub dt2:         f64,
    #[serde(default = "default_write_every")]
    pub write_every: u64,
    #[serde(default)]
    pub num_steps:   u64,
}

fn default_integrator() -> String { "rkck".into() }
fn default_dt2() -> f64 { 1.0 }
fn default_write_every() -> u64 { 1 }

impl Default for RunParams {
    fn default() -> Self {
        Self {
            integrator:  default_integrator(),
            fixed_y:     None,
            dt:          None,
            error:       None,
            dt2:         default_dt2(),
            write_every: default_write_every(),
            num_steps:   0,
        }
    }
}

/// The scalar parameter a sweep varies across its runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SweepParam {
    FixedY,
    Dt,
    Dt2,
    Error,
}

impl SweepParam {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FixedY => "fixed_y",
            Self::Dt     => "dt",
            Self::Dt2    => "dt2",
            Self::Error  => "error",
        }
    }
}

impl RunParams {
    pub fn get(&self, param: SweepParam) -> Option<f64> {
        match param {
            SweepParam::FixedY => self.fixed_y,
            SweepParam::Dt     => self.dt,
            SweepParam::Dt2    => Some(self.dt2),
            SweepParam::Error  => self.error,
        }
    }

    /// Human label of the step-size control, e.g. `Error: 0.001` for an
    /// adaptive integrator or `dt: 0.1` for a fixed-step one.
    pub fn step_label(&self) -> String {
        match (self.integrator.as_str(), self.error, self.dt) {
            ("rkck", Some(e), _) => format!("Error: {e}"),
            (_, _, Some(dt))     => format!("dt: {dt}"),
            (_, Some(e), None)   => format!("Error: {e}"),
            _                    => String::from("dt: ?"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub run_id:      RunId,
    pub sweep_index: u32,
    pub params:      RunParams,
    pub frames:      Vec<Frame>,
}

/// A run paired with the resolved value of the swept parameter.
#[derive(Debug, Clone, Copy)]
pub struct TaggedRun<'a> {
    pub tag:    f64,
    pub params: &'a RunParams,
    pub frames: &'a [Frame],
}

impl Run {
    pub fn new(run_id: impl Into<RunId>, sweep_index: u32, params: RunParams) -> Self {
        Self {
            run_id: run_id.into(),
            sweep_index,
            params,
            frames: Vec::new(),
        }
    }

    /// Append a frame, keeping frames ordered by timestep.
    pub fn push_frame(&mut self, frame: Frame) {
        let pos = self.frames.partition_point(|f| f.timestep <= frame.timestep);
        self.frames.insert(pos, frame);
    }

    pub fn timesteps(&self) -> Vec<Timestep> {
        self.frames.iter().map(|f| f.timestep).collect()
    }

    pub fn tagged(&self, param: SweepParam) -> AnalysisResult<TaggedRun<'_>> {
        let tag = self.params.get(param).ok_or_else(|| AnalysisError::MissingParameter {
            run_id: self.run_id.clone(),
            param:  param.name(),
        })?;
        Ok(TaggedRun { tag, params: &self.params, frames: &self.frames })
    }
}

/// Tag every run of a sweep with the same parameter.
pub fn tag_sweep(runs: &[Run], param: SweepParam) -> AnalysisResult<Vec<TaggedRun<'_>>> {
    runs.iter().map(|r| r.tagged(param)).collect()
}
