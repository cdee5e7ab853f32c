use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cav_results::store::{FIELD_FILE, HISTORY_FILE, RESTART_FILE};
use cav_results::{RunManifest, RunOutcomeRecord, RunStore, compute_run_id, load_restart_file};
use cav_solver::{
    FlowState, GridDims, InitialStateProvider, Mode, Numerics, OutputSink, PhysicalInputs,
    ProblemSetup, Scheme, Solver,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn small_solver(mode: Mode, max_iterations: usize, state: Option<FlowState>) -> Solver {
    let setup = ProblemSetup::new(&PhysicalInputs::default(), GridDims::new(7, 7)).unwrap();
    let numerics = Numerics {
        max_iterations,
        residual_out: 5,
        iterout: 10,
        ..Numerics::default()
    };
    let state = state.unwrap_or_else(|| FlowState::fresh(&setup));
    Solver::new(setup, numerics, mode, Scheme::SymmetricGaussSeidel, state).unwrap()
}

#[test]
fn run_writes_history_field_and_restart() {
    let store = RunStore::new(unique_temp_dir("cav_results_run")).unwrap();
    let mut writer = store.open_run("run-a", false, false).unwrap();
    let mut solver = small_solver(Mode::Cavity, 20, None);
    solver.run(&mut writer, None).unwrap();
    drop(writer);

    let dir = store.run_dir("run-a");
    let history = fs::read_to_string(dir.join(HISTORY_FILE)).unwrap();
    let lines: Vec<&str> = history.lines().collect();
    assert!(lines[1].starts_with("variables=\"Iteration\""));
    // header + iterations 1, 5, 10, 15, 20
    assert_eq!(lines.len(), 2 + 5);
    assert!(lines[2].starts_with("1 "));
    assert_eq!(lines[2].split_whitespace().count(), 5);

    let field = fs::read_to_string(dir.join(FIELD_FILE)).unwrap();
    // snapshots at 10, 20 and the final one
    assert_eq!(field.matches("zone T=").count(), 3);
    assert!(field.contains("zone T=\"n=20\""));
    let first_row = field.lines().find(|l| l.starts_with("0e0")).unwrap();
    assert_eq!(first_row.split_whitespace().count(), 5);

    let restart = load_restart_file(&dir.join(RESTART_FILE)).unwrap();
    assert_eq!(restart.iteration, 20);
    assert_eq!((restart.nx, restart.ny), (7, 7));
    assert_eq!(restart.p.len(), 49);
    assert!(restart.resinit.is_some());
    assert_eq!(store.load_restart("run-a").unwrap(), restart);
}

#[test]
fn manufactured_zones_carry_exact_and_error_columns() {
    let store = RunStore::new(unique_temp_dir("cav_results_mms")).unwrap();
    let mut writer = store.open_run("mms", true, false).unwrap();
    let solver = small_solver(Mode::Manufactured, 1, None);
    writer.write_snapshot(&solver.snapshot(0)).unwrap();
    drop(writer);

    let field = fs::read_to_string(store.run_dir("mms").join(FIELD_FILE)).unwrap();
    assert!(field.contains("\"DE-v\""));
    let row = field.lines().nth(5).unwrap();
    assert_eq!(row.split_whitespace().count(), 11);
}

#[test]
fn restart_continues_where_the_record_left_off() {
    let store = RunStore::new(unique_temp_dir("cav_results_restart")).unwrap();
    let mut writer = store.open_run("r", false, false).unwrap();
    let mut first = small_solver(Mode::Cavity, 20, None);
    first.run(&mut writer, None).unwrap();
    drop(writer);

    let record = store.load_restart("r").unwrap();
    let setup = ProblemSetup::new(&PhysicalInputs::default(), GridDims::new(7, 7)).unwrap();
    let state = record.initial_state(&setup).unwrap();
    assert_eq!(state.iteration, 21);
    assert_eq!(state.field, *first.field());

    let mut writer = store.open_run("r", false, true).unwrap();
    let mut second = small_solver(Mode::Cavity, 30, Some(state));
    let outcome = second.run(&mut writer, None).unwrap();
    drop(writer);
    assert_eq!(outcome.iterations, 30);

    let history = fs::read_to_string(store.run_dir("r").join(HISTORY_FILE)).unwrap();
    // one header, first run 1,5,10,15,20, resumed run 21,25,30
    assert_eq!(history.matches("TITLE").count(), 1);
    assert_eq!(history.lines().count(), 2 + 5 + 3);
}

#[test]
fn manifest_save_list_load_roundtrip() {
    let store = RunStore::new(unique_temp_dir("cav_results_manifest")).unwrap();
    let case = cav_project::CaseConfig::default();
    let run_id = compute_run_id(&case, "0.1.0");

    let manifest = RunManifest {
        run_id: run_id.clone(),
        case_name: case.name.clone(),
        timestamp: "2026-02-26T00:00:00Z".to_string(),
        solver_version: "0.1.0".to_string(),
        mode: "cavity".to_string(),
        scheme: "sgs".to_string(),
        nx: 65,
        ny: 65,
        summary: RunOutcomeRecord {
            termination: "diverged".to_string(),
            iterations: 12,
            time_s: 0.1,
            residuals: None,
            ratio: None,
            error_norms: None,
        },
    };
    store.save_manifest(&manifest).unwrap();

    assert!(store.has_run(&run_id));
    let runs = store.list_runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(store.load_manifest(&run_id).unwrap(), manifest);

    store.delete_run(&run_id).unwrap();
    assert!(!store.has_run(&run_id));
    assert!(store.load_manifest(&run_id).is_err());
}
