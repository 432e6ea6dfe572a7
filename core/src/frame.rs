//! One snapshot of every living species at a single timestep.
//!
//! RULE: Frames are read-only once built. Every per-species array has
//! exactly `num_species` entries; constructors refuse anything else.

use crate::{
    error::{AnalysisError, AnalysisResult},
    types::{SpeciesType, Timestep},
};
use serde::{Deserialize, Serialize};

/// A per-species dataset of a frame, addressable by name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Field {
    #[serde(rename = "_types")]
    Type,
    #[serde(rename = "_traits")]
    Trait,
    #[serde(rename = "_masses")]
    Mass,
    #[serde(rename = "_niche_w")]
    NicheWidth,
    #[serde(rename = "_error")]
    Error,
    #[serde(rename = "_graph_vertex")]
    VertexId,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Type       => "_types",
            Self::Trait      => "_traits",
            Self::Mass       => "_masses",
            Self::NicheWidth => "_niche_w",
            Self::Error      => "_error",
            Self::VertexId   => "_graph_vertex",
        }
    }
}

/// A directed interaction between two species (by vertex id).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub source: u64,
    pub target: u64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    pub timestep:     Timestep,
    pub num_species:  usize,
    pub types:        Vec<SpeciesType>,
    pub traits:       Vec<f64>,
    pub masses:       Vec<f64>,
    pub niche_widths: Vec<f64>,
    pub errors:       Vec<f64>,
    pub vertex_ids:   Vec<u64>,
    pub edges:        Vec<Edge>,
    /// Integrator sub-steps taken since the previous frame.
    pub dts:          Vec<f64>,
}

impl Frame {
    /// Build a frame from its core arrays. Errors default to zero and vertex
    /// ids to the species slot; use the `with_*` builders to override.
    pub fn new(
        timestep:     Timestep,
        types:        Vec<SpeciesType>,
        traits:       Vec<f64>,
        masses:       Vec<f64>,
        niche_widths: Vec<f64>,
    ) -> AnalysisResult<Self> {
        let n = types.len();
        let frame = Self {
            timestep,
            num_species: n,
            types,
            traits,
            masses,
            niche_widths,
            errors: vec![0.0; n],
            vertex_ids: (0..n as u64).collect(),
            edges: Vec::new(),
            dts: Vec::new(),
        };
        frame.validate()?;
        Ok(frame)
    }

    pub fn with_errors(mut self, errors: Vec<f64>) -> AnalysisResult<Self> {
        self.errors = errors;
        self.validate()?;
        Ok(self)
    }

    pub fn with_vertex_ids(mut self, vertex_ids: Vec<u64>) -> AnalysisResult<Self> {
        self.vertex_ids = vertex_ids;
        self.validate()?;
        Ok(self)
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_dts(mut self, dts: Vec<f64>) -> Self {
        self.dts = dts;
        self
    }

    /// Check that every parallel array matches the recorded species count.
    pub fn validate(&self) -> AnalysisResult<()> {
        let lengths = [
            (Field::Type,       self.types.len()),
            (Field::Trait,      self.traits.len()),
            (Field::Mass,       self.masses.len()),
            (Field::NicheWidth, self.niche_widths.len()),
            (Field::Error,      self.errors.len()),
            (Field::VertexId,   self.vertex_ids.len()),
        ];
        for (field, actual) in lengths {
            if actual != self.num_species {
                return Err(AnalysisError::MalformedFrame {
                    timestep: self.timestep,
                    field:    field.name(),
                    expected: self.num_species,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// A per-species dataset as reals.
    pub fn field(&self, field: Field) -> Vec<f64> {
        match field {
            Field::Type       => self.types.iter().map(|&t| t as f64).collect(),
            Field::Trait      => self.traits.clone(),
            Field::Mass       => self.masses.clone(),
            Field::NicheWidth => self.niche_widths.clone(),
            Field::Error      => self.errors.clone(),
            Field::VertexId   => self.vertex_ids.iter().map(|&v| v as f64).collect(),
        }
    }

    /// Species slots belonging to `spec_type`, in storage order.
    pub fn slots_of_type(&self, spec_type: SpeciesType) -> Vec<usize> {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == spec_type)
            .map(|(i, _)| i)
            .collect()
    }
}
