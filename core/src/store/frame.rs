use super::OutputStore;
use crate::{
    error::AnalysisResult,
    frame::{Edge, Frame},
    types::Timestep,
};
use rusqlite::{params, Connection};

/// SQLite has no NaN; it comes back as NULL.
fn real(v: Option<f64>) -> f64 {
    v.unwrap_or(f64::NAN)
}

/// Write every row of one frame through `conn`. Callers own the transaction.
pub(super) fn write_frame(conn: &Connection, run_id: &str, frame: &Frame) -> AnalysisResult<()> {
    frame.validate()?;
    conn.execute(
        "INSERT INTO frame (run_id, timestep, num_species) VALUES (?1, ?2, ?3)",
        params![run_id, frame.timestep as i64, frame.num_species as i64],
    )?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO species (run_id, timestep, slot, vertex_id, species_type,
                              trait, mass, niche_w, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for slot in 0..frame.num_species {
        stmt.execute(params![
            run_id,
            frame.timestep as i64,
            slot as i64,
            frame.vertex_ids[slot] as i64,
            frame.types[slot],
            frame.traits[slot],
            frame.masses[slot],
            frame.niche_widths[slot],
            frame.errors[slot],
        ])?;
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO edge (run_id, timestep, seq, source, target, weight)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (seq, e) in frame.edges.iter().enumerate() {
        stmt.execute(params![
            run_id,
            frame.timestep as i64,
            seq as i64,
            e.source as i64,
            e.target as i64,
            e.weight,
        ])?;
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO substep (run_id, timestep, seq, dt) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (seq, dt) in frame.dts.iter().enumerate() {
        stmt.execute(params![run_id, frame.timestep as i64, seq as i64, dt])?;
    }
    Ok(())
}

impl OutputStore {
    // ── Frame ──────────────────────────────────────────────────

    /// Persist one frame atomically.
    pub fn insert_frame(&self, run_id: &str, frame: &Frame) -> AnalysisResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_frame(&tx, run_id, frame)?;
        tx.commit()?;
        Ok(())
    }

    /// Timesteps recorded for a run, ascending.
    pub fn timesteps(&self, run_id: &str) -> AnalysisResult<Vec<Timestep>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestep FROM frame WHERE run_id = ?1 ORDER BY timestep ASC",
        )?;
        let ts = stmt
            .query_map(params![run_id], |row| Ok(row.get::<_, i64>(0)? as u64))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ts)
    }

    /// Load one frame. A species row count that disagrees with the recorded
    /// `num_species` is reported as a malformed frame.
    pub fn load_frame(&self, run_id: &str, timestep: Timestep) -> AnalysisResult<Frame> {
        let num_species: i64 = self.conn.query_row(
            "SELECT num_species FROM frame WHERE run_id = ?1 AND timestep = ?2",
            params![run_id, timestep as i64],
            |row| row.get(0),
        )?;

        let mut frame = Frame {
            timestep,
            num_species: num_species as usize,
            types: Vec::new(),
            traits: Vec::new(),
            masses: Vec::new(),
            niche_widths: Vec::new(),
            errors: Vec::new(),
            vertex_ids: Vec::new(),
            edges: Vec::new(),
            dts: Vec::new(),
        };

        let mut stmt = self.conn.prepare(
            "SELECT vertex_id, species_type, trait, mass, niche_w, error
             FROM species WHERE run_id = ?1 AND timestep = ?2
             ORDER BY slot ASC",
        )?;
        let mut rows = stmt.query(params![run_id, timestep as i64])?;
        while let Some(row) = rows.next()? {
            frame.vertex_ids.push(row.get::<_, i64>(0)? as u64);
            frame.types.push(row.get(1)?);
            frame.traits.push(real(row.get(2)?));
            frame.masses.push(real(row.get(3)?));
            frame.niche_widths.push(real(row.get(4)?));
            frame.errors.push(real(row.get(5)?));
        }

        let mut stmt = self.conn.prepare(
            "SELECT source, target, weight FROM edge
             WHERE run_id = ?1 AND timestep = ?2
             ORDER BY seq ASC",
        )?;
        frame.edges = stmt
            .query_map(params![run_id, timestep as i64], |row| {
                Ok(Edge {
                    source: row.get::<_, i64>(0)? as u64,
                    target: row.get::<_, i64>(1)? as u64,
                    weight: real(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT dt FROM substep
             WHERE run_id = ?1 AND timestep = ?2
             ORDER BY seq ASC",
        )?;
        frame.dts = stmt
            .query_map(params![run_id, timestep as i64], |row| Ok(real(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        frame.validate()?;
        Ok(frame)
    }

    /// Number of frames recorded for a run.
    pub fn frame_count(&self, run_id: &str) -> AnalysisResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM frame WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Test helpers ───────────────────────────────────────────

    /// Overwrite the recorded species count of a frame, leaving a malformed
    /// store behind.
    #[cfg(feature = "test-helpers")]
    #[doc(hidden)]
    pub fn set_species_count(&self, run_id: &str, timestep: Timestep, n: i64) -> AnalysisResult<()> {
        self.conn.execute(
            "UPDATE frame SET num_species = ?1 WHERE run_id = ?2 AND timestep = ?3",
            params![n, run_id, timestep as i64],
        )?;
        Ok(())
    }
}
