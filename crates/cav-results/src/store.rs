//! Run storage API.
//!
//! Each run lives in `<root>/<run_id>/` with:
//! - `manifest.json`: case identity and final outcome
//! - `history.dat`: Tecplot residual history
//! - `cavity.dat`: Tecplot field zones, one per snapshot
//! - `restart.json`: latest [`RestartRecord`], overwritten at every snapshot

use crate::types::{RestartRecord, RunManifest};
use crate::{ResultsError, ResultsResult};
use cav_core::Real;
use cav_solver::{NEQ, OutputSink, Snapshot, SolverError, SolverResult};
use nalgebra::Vector3;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const HISTORY_FILE: &str = "history.dat";
pub const FIELD_FILE: &str = "cavity.dat";
pub const RESTART_FILE: &str = "restart.json";

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST_FILE).exists()
    }

    /// Open the output files of a run. With `resume` the history and field
    /// files are appended to; otherwise they start over.
    pub fn open_run(&self, run_id: &str, manufactured: bool, resume: bool) -> ResultsResult<RunWriter> {
        let run_dir = self.run_dir(run_id);
        fs::create_dir_all(&run_dir)?;

        let history_path = run_dir.join(HISTORY_FILE);
        let field_path = run_dir.join(FIELD_FILE);
        let fresh_history = !resume || !history_path.exists();
        let fresh_field = !resume || !field_path.exists();

        let mut history = BufWriter::new(open_output(&history_path, !fresh_history)?);
        if fresh_history {
            writeln!(history, "TITLE = \"Cavity Iterative Residual History\"")?;
            writeln!(history, "variables=\"Iteration\"\"Time(s)\"\"Res1\"\"Res2\"\"Res3\"")?;
        }

        let mut field = BufWriter::new(open_output(&field_path, !fresh_field)?);
        if fresh_field {
            writeln!(field, "TITLE = \"Cavity Field Data\"")?;
            write!(field, "variables=\"x(m)\"\"y(m)\"\"p(N/m^2)\"\"u(m/s)\"\"v(m/s)\"")?;
            if manufactured {
                write!(field, "\"p-exact\"\"u-exact\"\"v-exact\"\"DE-p\"\"DE-u\"\"DE-v\"")?;
            }
            writeln!(field)?;
        }

        tracing::debug!(dir = %run_dir.display(), resume, "opened run output");
        Ok(RunWriter {
            run_dir,
            history,
            field,
        })
    }

    pub fn save_manifest(&self, manifest: &RunManifest) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST_FILE), manifest_json)?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join(MANIFEST_FILE);

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    /// Latest restart record of a run.
    pub fn load_restart(&self, run_id: &str) -> ResultsResult<RestartRecord> {
        let path = self.run_dir(run_id).join(RESTART_FILE);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        load_restart_file(&path)
    }

    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }
        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

fn open_output(path: &Path, append: bool) -> std::io::Result<File> {
    if append {
        OpenOptions::new().append(true).open(path)
    } else {
        File::create(path)
    }
}

/// Read a restart record from any path.
pub fn load_restart_file(path: &Path) -> ResultsResult<RestartRecord> {
    let content = fs::read_to_string(path)?;
    let record: RestartRecord = serde_json::from_str(&content)?;
    if !record.is_finite() {
        return Err(ResultsError::InvalidRecord {
            what: format!("{} holds non-finite values", path.display()),
        });
    }
    Ok(record)
}

/// Open output files of one run; the solver's output sink.
pub struct RunWriter {
    run_dir: PathBuf,
    history: BufWriter<File>,
    field: BufWriter<File>,
}

impl RunWriter {
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn append_history(&mut self, iteration: usize, time: Real, res: &Vector3<Real>) -> ResultsResult<()> {
        writeln!(
            self.history,
            "{} {:e} {:e} {:e} {:e}",
            iteration, time, res[0], res[1], res[2]
        )?;
        self.history.flush()?;
        Ok(())
    }

    fn append_zone(&mut self, snapshot: &Snapshot<'_>) -> ResultsResult<()> {
        let setup = snapshot.setup;
        let u = snapshot.field;
        let out = &mut self.field;

        writeln!(out, "zone T=\"n={}\"", snapshot.iteration)?;
        writeln!(out, "I= {} J= {}", setup.nx, setup.ny)?;
        writeln!(out, "DATAPACKING=POINT")?;
        // Tecplot POINT data runs fastest in I
        for j in 0..setup.ny {
            let y = setup.y(j);
            for i in 0..setup.nx {
                let x = setup.x(i);
                write!(out, "{:e} {:e}", x, y)?;
                for k in 0..NEQ {
                    write!(out, " {:e}", u[(i, j, k)])?;
                }
                if let Some(exact) = snapshot.exact {
                    let e: [Real; NEQ] = std::array::from_fn(|k| exact.exact(x, y, k));
                    for value in e {
                        write!(out, " {:e}", value)?;
                    }
                    for (k, value) in e.iter().enumerate() {
                        write!(out, " {:e}", u[(i, j, k)] - value)?;
                    }
                }
                writeln!(out)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    fn write_restart(&self, snapshot: &Snapshot<'_>) -> ResultsResult<()> {
        let record = RestartRecord::from_snapshot(snapshot);
        if !record.is_finite() {
            tracing::warn!(iteration = snapshot.iteration, "skipping restart record with non-finite values");
            return Ok(());
        }
        let json = serde_json::to_string(&record)?;
        fs::write(self.run_dir.join(RESTART_FILE), json)?;
        Ok(())
    }
}

fn sink_error(e: ResultsError) -> SolverError {
    SolverError::Output {
        what: e.to_string(),
    }
}

impl OutputSink for RunWriter {
    fn record_residuals(
        &mut self,
        iteration: usize,
        time: Real,
        _dtmin: Real,
        res: &Vector3<Real>,
    ) -> SolverResult<()> {
        self.append_history(iteration, time, res).map_err(sink_error)
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> SolverResult<()> {
        self.append_zone(snapshot).map_err(sink_error)?;
        self.write_restart(snapshot).map_err(sink_error)
    }
}
