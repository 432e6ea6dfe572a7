//! Writing analysis products to disk for an external renderer.
//!
//! RULE: Only export.rs touches output files. Analyses return plain data.

use crate::{
    error::AnalysisResult,
    frame::{Field, Frame},
};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Metadata wrapped around every JSON product.
#[derive(Debug, Serialize)]
pub struct ExportEnvelope<'a, T: Serialize> {
    pub generated_at: DateTime<Utc>,
    pub kind:         &'a str,
    pub data:         &'a T,
}

/// `out.pdf` + (`final`, `json`) → `out_final.json`.
pub fn with_suffix(out: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = out.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    let name = if suffix.is_empty() {
        format!("{stem}.{ext}")
    } else {
        format!("{stem}_{suffix}.{ext}")
    };
    out.with_file_name(name)
}

fn format_value(field: Field, v: f64) -> String {
    match field {
        Field::Type | Field::VertexId => format!("{}", v as i64),
        _ => format!("{v}"),
    }
}

/// One comma-separated line per species with the requested fields.
pub fn species_table(frame: &Frame, fields: &[Field]) -> String {
    let columns: Vec<Vec<f64>> = fields.iter().map(|&f| frame.field(f)).collect();
    let mut out = String::new();
    for slot in 0..frame.num_species {
        let line: Vec<String> = fields
            .iter()
            .zip(&columns)
            .map(|(&f, col)| format_value(f, col[slot]))
            .collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

pub fn write_species_table(path: &Path, frame: &Frame, fields: &[Field]) -> AnalysisResult<()> {
    frame.validate()?;
    std::fs::write(path, species_table(frame, fields))?;
    info!("wrote {} species of t={} to {}", frame.num_species, frame.timestep, path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, kind: &str, data: &T) -> AnalysisResult<()> {
    let envelope = ExportEnvelope { generated_at: Utc::now(), kind, data };
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut w, &envelope)?;
    w.flush()?;
    info!("wrote {kind} to {}", path.display());
    Ok(())
}

/// Stream items as JSON lines; returns how many were written.
pub fn write_jsonl<T, I>(path: &Path, items: I) -> AnalysisResult<usize>
where
    T: Serialize,
    I: IntoIterator<Item = AnalysisResult<T>>,
{
    let mut w = BufWriter::new(File::create(path)?);
    let mut count = 0;
    for item in items {
        serde_json::to_writer(&mut w, &item?)?;
        w.write_all(b"\n")?;
        count += 1;
    }
    w.flush()?;
    info!("wrote {count} lines to {}", path.display());
    Ok(count)
}
