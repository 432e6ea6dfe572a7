//! mulan-post: headless post-processing of MuLAN MacArthur output.
//!
//! Usage:
//!   mulan-post seed     --db sweep.db --seed 42 --runs 5 --frames 20
//!   mulan-post summary  --db sweep.db
//!   mulan-post sweep    --db sweep.db --config analysis.json --out plots/cc.pdf
//!   mulan-post universe --db sweep.db --run sweep-42-0 --out plots/uni.pdf
//!   mulan-post biomass  --db sweep.db --run sweep-42-0 --out plots/mass.pdf
//!   mulan-post graph    --db sweep.db --run sweep-42-0 --out plots/graph.pdf
//!   mulan-post timestep --db sweep.db --out plots/dt.pdf
//!   mulan-post save     --db sweep.db --run sweep-42-0 --out plots/state.pdf

use anyhow::{bail, Result};
use mulan_core::{
    aggregate::{self, Label},
    animation::{final_state, RunFrames, SweepFrame, SweepFrames, Timestamp},
    config::AnalysisConfig,
    contour::{mask_for_log, ContourSpec},
    export,
    extract::{extract_single, RunTrajectory},
    graph,
    peaks::find_peaks,
    run::{tag_sweep, Run, SweepParam},
    store::OutputStore,
    synthetic::SyntheticSweep,
    types::resolve_index,
};
use serde::Serialize;
use std::{collections::BTreeMap, env, path::Path};

/// A sweep frame plus the contour levels a flat renderer should use.
#[derive(Serialize)]
struct SweepProduct {
    #[serde(flatten)]
    frame:  SweepFrame,
    levels: Option<Vec<f64>>,
}

#[derive(Serialize)]
struct BiomassProduct {
    labels:      Vec<String>,
    series:      aggregate::TypeSeries,
    phase_pairs: Vec<(usize, usize)>,
    bifurcation: Vec<aggregate::ClassScatter>,
    by_width:    Vec<(f64, Vec<(u64, f64)>)>,
}

#[derive(Serialize)]
struct StepProduct {
    run_id: String,
    label:  String,
    steps:  aggregate::StepSeries,
    errors: Vec<(f64, aggregate::ErrorTrack)>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("summary");
    let db = flag(&args, "--db").unwrap_or("sweep.db");
    let out = flag(&args, "--out").unwrap_or("out.pdf");
    let config = match flag(&args, "--config") {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    let store = OutputStore::open(db)?;
    store.migrate()?;
    let out = Path::new(out);

    match command {
        "seed" => seed(&store, &args),
        "summary" => summary(&store, db),
        "sweep" => sweep(&store, &config, out),
        "universe" => universe(&store, &config, out, flag(&args, "--run")),
        "biomass" => biomass(&store, &config, out, flag(&args, "--run")),
        "graph" => graph_products(&store, &config, out, flag(&args, "--run")),
        "timestep" => timestep(&store, out),
        "save" => save(&store, &config, out, flag(&args, "--run")),
        other => bail!("Unknown command: {other}"),
    }
}

fn seed(store: &OutputStore, args: &[String]) -> Result<()> {
    let defaults = SyntheticSweep::default();
    let sweep = SyntheticSweep {
        seed:   parse_arg(args, "--seed", defaults.seed),
        runs:   parse_arg(args, "--runs", defaults.runs),
        frames: parse_arg(args, "--frames", defaults.frames),
        ..defaults
    };
    store.insert_sweep(&sweep.generate()?)?;
    println!("seeded {} runs x {} frames (seed {})", sweep.runs, sweep.frames, sweep.seed);
    Ok(())
}

fn summary(store: &OutputStore, db: &str) -> Result<()> {
    let ids = store.run_ids()?;
    println!("=== OUTPUT SUMMARY ===");
    println!("  db:    {db}");
    println!("  runs:  {}", ids.len());
    for id in &ids {
        let (index, params) = store.run_params(id)?;
        let frames = store.frame_count(id)?;
        println!(
            "  [{index:>3}] {id:<20} frames: {frames:>5}  {}  fixed_y: {}",
            params.step_label(),
            params.fixed_y.map_or("-".into(), |v| v.to_string()),
        );
    }
    Ok(())
}

fn sweep(store: &OutputStore, config: &AnalysisConfig, out: &Path) -> Result<()> {
    let cfg = &config.sweep;
    let runs = store.load_sweep()?;
    let tagged = tag_sweep(&runs, cfg.param)?;
    let levels = |frame: &SweepFrame| contour_levels(&cfg.contour, &frame.trajectory.x, &frame.trajectory.z);

    if cfg.mov {
        let frames = SweepFrames::new(&tagged, cfg.query(), cfg.start_frame)
            .peaks_only(cfg.peaks())
            .map(|f| f.map(|frame| SweepProduct { levels: levels(&frame), frame }));
        let n = export::write_jsonl(&export::with_suffix(out, "frames", "jsonl"), frames)?;
        println!("sweep animation: {n} frames");
    }

    if cfg.final_state {
        match final_state(&tagged, &cfg.query(), cfg.peaks())? {
            Some(frame) => {
                let product = SweepProduct { levels: levels(&frame), frame };
                export::write_json(&export::with_suffix(out, "final", "json"), "sweep_final", &product)?;
            }
            None => log::warn!("no final state: sweep has an empty run"),
        }
    }

    let totals = aggregate::total_mass_sweep(&tagged, cfg.spec_type);
    export::write_json(&export::with_suffix(out, "total_mass", "json"), "sweep_total_mass", &totals)?;
    Ok(())
}

fn contour_levels(contour: &ContourSpec, x: &[f64], z: &[f64]) -> Option<Vec<f64>> {
    if contour.log {
        let z: Vec<f64> = mask_for_log(x, z).into_iter().map(|i| z[i]).collect();
        contour.levels(&z)
    } else {
        contour.levels(z)
    }
}

fn pick_run(store: &OutputStore, run_id: Option<&str>) -> Result<Run> {
    let id = match run_id {
        Some(id) => id.to_string(),
        None => match store.run_ids()?.into_iter().next() {
            Some(id) => id,
            None => bail!("Store holds no runs"),
        },
    };
    Ok(store.load_run(&id)?)
}

fn universe(store: &OutputStore, config: &AnalysisConfig, out: &Path, run_id: Option<&str>) -> Result<()> {
    let cfg = &config.universe;
    let run = pick_run(store, run_id)?;

    if cfg.mov {
        let frames = RunFrames::new(&run.frames, &run.params, cfg.query(), cfg.y_name, cfg.start_frame)
            .peaks_only(cfg.peaks());
        let n = export::write_jsonl(&export::with_suffix(out, "frames", "jsonl"), frames)?;
        println!("universe animation: {n} frames");
    }

    let pick = |time: i64| -> Result<Option<RunTrajectory>> {
        let Some(mut t) = extract_single(&run.frames, &cfg.query().at(time), cfg.y_name)? else {
            return Ok(None);
        };
        if cfg.peaks() {
            t = t.select(&find_peaks(&t.z));
        }
        Ok(Some(t))
    };

    for &time in &cfg.timeframes {
        if let Some(t) = pick(time)? {
            export::write_json(&export::with_suffix(out, &time.to_string(), "json"), "universe_frame", &t)?;
        }
    }

    if cfg.final_state {
        if let Some(t) = pick(cfg.final_time())? {
            let stamp = Timestamp::at_step(run.params.num_steps, &run.params);
            let levels = contour_levels(&cfg.contour, &t.x, &t.z);
            let product = serde_json::json!({ "timestamp": stamp, "trajectory": t, "levels": levels });
            export::write_json(&export::with_suffix(out, "final", "json"), "universe_final", &product)?;
        }
    }
    Ok(())
}

fn biomass(store: &OutputStore, config: &AnalysisConfig, out: &Path, run_id: Option<&str>) -> Result<()> {
    let run = pick_run(store, run_id)?;
    let classes = aggregate::species_classes(&run.frames);
    let series = aggregate::total_mass_by_type(&run.frames, classes);
    let phase_pairs = if config.biomass.phase_space {
        aggregate::phase_pairs(&series)
    } else {
        Vec::new()
    };
    let by_width = aggregate::mass_by_label(
        &run.frames,
        config.universe.spec_type,
        config.universe.y_name,
        config.universe.z_name,
    );

    let product = BiomassProduct {
        labels: (0..classes).map(|c| config.biomass.label(c)).collect(),
        series,
        phase_pairs,
        bifurcation: aggregate::trait_bifurcation(&run.frames, config.universe.x_name, classes),
        by_width: flatten_labels(by_width),
    };
    export::write_json(&export::with_suffix(out, "biomass", "json"), "biomass", &product)?;

    match aggregate::limits(&run.frames, config.universe.x_name, config.universe.y_name, config.universe.z_name) {
        Ok(lim) => export::write_json(&export::with_suffix(out, "limits", "json"), "limits", &lim)?,
        Err(e) => log::warn!("skipping limits for {}: {e}", run.run_id),
    }
    Ok(())
}

fn flatten_labels<T>(map: BTreeMap<Label, T>) -> Vec<(f64, T)> {
    map.into_iter().map(|(k, v)| (k.0, v)).collect()
}

fn graph_products(store: &OutputStore, config: &AnalysisConfig, out: &Path, run_id: Option<&str>) -> Result<()> {
    let run = pick_run(store, run_id)?;
    let density = graph::density_series(&run.frames);
    export::write_json(&export::with_suffix(out, "density", "json"), "graph_density", &density)?;

    let Some(i) = resolve_index(run.frames.len(), config.graph.time) else {
        log::warn!("run {} has no frame {}", run.run_id, config.graph.time);
        return Ok(());
    };
    let embedding = graph::embed(&run.frames[i], config.graph.size_scale, config.graph.width_scale);
    export::write_json(&export::with_suffix(out, "embedding", "json"), "graph_embedding", &embedding)?;
    Ok(())
}

fn timestep(store: &OutputStore, out: &Path) -> Result<()> {
    let runs = store.load_sweep()?;
    let products: Vec<StepProduct> = runs
        .iter()
        .map(|run| StepProduct {
            run_id: run.run_id.clone(),
            label:  format!("{}  {}", run.params.integrator, run.params.step_label()),
            steps:  aggregate::step_size_series(&run.frames),
            errors: flatten_labels(aggregate::error_by_trait(&run.frames, 1)),
        })
        .collect();
    let tagged = tag_sweep(&runs, SweepParam::Dt2)?;
    let product = serde_json::json!({
        "horizon": aggregate::common_horizon(&tagged),
        "runs": products,
    });
    export::write_json(&export::with_suffix(out, "timestep", "json"), "timestep", &product)?;
    Ok(())
}

fn save(store: &OutputStore, config: &AnalysisConfig, out: &Path, run_id: Option<&str>) -> Result<()> {
    let run = pick_run(store, run_id)?;
    let Some(frame) = run.frames.last() else {
        bail!("Run {} has no frames", run.run_id);
    };
    export::write_species_table(&export::with_suffix(out, "", "graph"), frame, &config.export.save)?;
    Ok(())
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
