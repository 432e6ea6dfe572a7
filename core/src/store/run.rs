use super::{frame::write_frame, OutputStore};
use crate::{
    error::{AnalysisError, AnalysisResult},
    run::{Run, RunParams},
    types::RunId,
};
use rusqlite::{params, Connection, OptionalExtension};

fn write_run(conn: &Connection, run: &Run) -> AnalysisResult<()> {
    conn.execute(
        "INSERT INTO run (run_id, sweep_index, params_json) VALUES (?1, ?2, ?3)",
        params![run.run_id, run.sweep_index, serde_json::to_string(&run.params)?],
    )?;
    for frame in &run.frames {
        write_frame(conn, &run.run_id, frame)?;
    }
    Ok(())
}

impl OutputStore {
    // ── Run ────────────────────────────────────────────────────

    /// Persist a run and all of its frames in one transaction. A bad frame
    /// leaves nothing of the run behind.
    pub fn insert_run(&self, run: &Run) -> AnalysisResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_run(&tx, run)?;
        tx.commit()?;
        log::info!("stored run {} ({} frames)", run.run_id, run.frames.len());
        Ok(())
    }

    /// Persist a whole sweep atomically: either every run is stored or none.
    pub fn insert_sweep(&self, runs: &[Run]) -> AnalysisResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for run in runs {
            write_run(&tx, run)?;
        }
        tx.commit()?;
        log::info!("stored sweep of {} runs", runs.len());
        Ok(())
    }

    /// Run ids ordered by their position in the sweep.
    pub fn run_ids(&self) -> AnalysisResult<Vec<RunId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT run_id FROM run ORDER BY sweep_index ASC, run_id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    pub fn run_params(&self, run_id: &str) -> AnalysisResult<(u32, RunParams)> {
        let row: Option<(u32, String)> = self
            .conn
            .query_row(
                "SELECT sweep_index, params_json FROM run WHERE run_id = ?1",
                params![run_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (sweep_index, json) = row.ok_or_else(|| AnalysisError::RunNotFound {
            run_id: run_id.to_string(),
        })?;
        Ok((sweep_index, serde_json::from_str(&json)?))
    }

    /// Load a run with every frame, in timestep order.
    pub fn load_run(&self, run_id: &str) -> AnalysisResult<Run> {
        let (sweep_index, params) = self.run_params(run_id)?;
        let mut run = Run::new(run_id, sweep_index, params);
        for t in self.timesteps(run_id)? {
            run.frames.push(self.load_frame(run_id, t)?);
        }
        Ok(run)
    }

    /// Load every run of the sweep, in sweep order.
    pub fn load_sweep(&self) -> AnalysisResult<Vec<Run>> {
        let runs = self
            .run_ids()?
            .iter()
            .map(|id| self.load_run(id))
            .collect::<AnalysisResult<Vec<_>>>()?;
        log::info!("loaded sweep of {} runs", runs.len());
        Ok(runs)
    }
}
