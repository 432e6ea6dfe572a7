use crate::{
    contour::ContourSpec,
    extract::TrajectoryQuery,
    frame::Field,
    run::SweepParam,
    types::SpeciesType,
};
use serde::{Deserialize, Serialize};

// ── Sweep comparison (carrying capacity over a fixed parameter) ────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepPlotConfig {
    /// The run parameter that distinguishes sweep points.
    pub param:       SweepParam,
    pub x_name:      Field,
    pub z_name:      Field,
    pub spec_type:   SpeciesType,
    pub start_frame: u64,
    /// Emit one product per frame.
    pub mov:         bool,
    /// Emit the last frame of every run.
    pub final_state: bool,
    /// Reduce frames to the local maxima of z.
    pub plot_peaks:  bool,
    /// Surface (3D) output. Peak reduction only applies to flat output.
    pub plt_3d:      bool,
    pub contour:     ContourSpec,
}

impl Default for SweepPlotConfig {
    fn default() -> Self {
        Self {
            param:       SweepParam::FixedY,
            x_name:      Field::Trait,
            z_name:      Field::Mass,
            spec_type:   1,
            start_frame: 0,
            mov:         true,
            final_state: true,
            plot_peaks:  false,
            plt_3d:      false,
            contour:     ContourSpec::default(),
        }
    }
}

impl SweepPlotConfig {
    pub fn query(&self) -> TrajectoryQuery {
        TrajectoryQuery { x: self.x_name, z: self.z_name, spec_type: self.spec_type, time: -1 }
    }

    pub fn peaks(&self) -> bool {
        self.plot_peaks && !self.plt_3d
    }
}

// ── Single run (carrying capacity over niche width) ─────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UniversePlotConfig {
    pub x_name:      Field,
    pub y_name:      Field,
    pub z_name:      Field,
    pub spec_type:   SpeciesType,
    pub start_frame: u64,
    pub mov:         bool,
    pub final_state: bool,
    /// Frame indices to export individually; the first one also replaces
    /// the last frame as the final state.
    pub timeframes:  Vec<i64>,
    pub plot_peaks:  bool,
    pub plt_3d:      bool,
    pub contour:     ContourSpec,
}

impl Default for UniversePlotConfig {
    fn default() -> Self {
        Self {
            x_name:      Field::Trait,
            y_name:      Field::NicheWidth,
            z_name:      Field::Mass,
            spec_type:   1,
            start_frame: 0,
            mov:         true,
            final_state: true,
            timeframes:  Vec::new(),
            plot_peaks:  false,
            plt_3d:      false,
            contour:     ContourSpec::default(),
        }
    }
}

impl UniversePlotConfig {
    pub fn query(&self) -> TrajectoryQuery {
        TrajectoryQuery { x: self.x_name, z: self.z_name, spec_type: self.spec_type, time: -1 }
    }

    pub fn final_time(&self) -> i64 {
        self.timeframes.first().copied().unwrap_or(-1)
    }

    pub fn peaks(&self) -> bool {
        self.plot_peaks && !self.plt_3d
    }
}

// ── Graph ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub time:        i64,
    /// Size of the heaviest node in the embedding.
    pub size_scale:  f64,
    /// Width of the heaviest edge in the embedding.
    pub width_scale: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { time: -1, size_scale: 200.0, width_scale: 3.0 }
    }
}

// ── Biomass ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomassConfig {
    /// Display label per species class, indexed by type id.
    pub class_labels: Vec<String>,
    pub phase_space:  bool,
}

impl Default for BiomassConfig {
    fn default() -> Self {
        Self {
            class_labels: vec!["resource".into(), "consumer".into()],
            phase_space:  true,
        }
    }
}

impl BiomassConfig {
    pub fn label(&self, class: usize) -> String {
        self.class_labels.get(class).cloned().unwrap_or_else(|| class.to_string())
    }
}

// ── Export ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Columns of the species table.
    pub save: Vec<Field>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { save: vec![Field::Type, Field::Trait, Field::Mass] }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sweep:    SweepPlotConfig,
    pub universe: UniversePlotConfig,
    pub graph:    GraphConfig,
    pub biomass:  BiomassConfig,
    pub export:   ExportConfig,
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing sections and keys take defaults.
    /// In tests, use AnalysisConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Defaults with animation output switched off.
    pub fn default_test() -> Self {
        let mut config = Self::default();
        config.sweep.mov = false;
        config.universe.mov = false;
        config
    }
}
