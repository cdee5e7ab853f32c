//! Integration tests for running cases through the service layer.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cav_app::{
    AppError, RunProgressEvent, RunStage, case_service, list_runs, load_run, run_case,
};
use cav_project::{CaseConfig, ModeDef, SchemeDef};
use cav_results::store::{FIELD_FILE, HISTORY_FILE, RESTART_FILE};
use cav_solver::Termination;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn small_case(max_iterations: usize) -> CaseConfig {
    let mut case = CaseConfig::default();
    case.name = "small".to_string();
    case.grid.nx = 7;
    case.grid.ny = 7;
    case.numerics.max_iterations = max_iterations;
    case.output.iterout = 10;
    case.output.residual_out = 5;
    case
}

#[test]
fn run_reports_progress_and_saves_manifest() {
    let out = unique_temp_dir("cav_app_run");
    let mut events: Vec<RunProgressEvent> = Vec::new();
    let summary = run_case(&small_case(30), &out, Some(&mut |e| events.push(e)))
        .expect("run should succeed");

    assert_eq!(summary.termination, Termination::MaxIterationsReached);
    assert_eq!(summary.iterations, 30);
    assert_eq!(summary.timing.iterations, 30);
    assert!(summary.timing.total_time_s >= summary.timing.solve_time_s);

    let solving: Vec<_> = events.iter().filter(|e| e.iteration.is_some()).collect();
    assert_eq!(solving.len(), 30);
    assert_eq!(solving[0].iteration, Some(1));
    assert!(solving.iter().all(|e| e.stage == RunStage::Solving));
    assert!(events.iter().any(|e| e.stage == RunStage::LoadingCase));
    assert_eq!(events.last().map(|e| e.stage), Some(RunStage::Completed));

    let manifest = load_run(&out, &summary.run_id).expect("manifest should load");
    assert_eq!(manifest, summary.manifest);
    assert_eq!(manifest.summary.termination, "max_iterations_reached");
    assert_eq!(manifest.scheme, "sgs");
    assert!(manifest.summary.error_norms.is_none());
    assert_eq!(list_runs(&out).unwrap().len(), 1);

    let field = fs::read_to_string(summary.run_dir.join(FIELD_FILE)).unwrap();
    // initial, 10, 20, 30 and the final one
    assert_eq!(field.matches("zone T=").count(), 5);
    assert!(field.contains("zone T=\"n=0\""));
}

#[test]
fn manufactured_run_records_error_norms() {
    let out = unique_temp_dir("cav_app_mms");
    let mut case = small_case(20);
    case.mode = ModeDef::Manufactured;
    case.numerics.scheme = SchemeDef::PointJacobi;
    let summary = run_case(&case, &out, None).unwrap();

    let norms = summary.error_norms.expect("manufactured runs carry norms");
    assert!(norms.l2.iter().all(|v| v.is_finite()));
    let record = summary.manifest.summary.error_norms.unwrap();
    assert_eq!(record.linf, norms.linf);
    assert_eq!(summary.manifest.mode, "manufactured");
    assert_eq!(summary.manifest.scheme, "point_jacobi");
}

#[test]
fn restart_continues_from_the_recorded_iteration() {
    let out = unique_temp_dir("cav_app_restart");
    let first = run_case(&small_case(20), &out, None).unwrap();
    let restart_path = first.run_dir.join(RESTART_FILE);
    let record = cav_results::load_restart_file(&restart_path).unwrap();
    assert_eq!(record.iteration, 20);

    let mut case = small_case(35);
    case.restart = Some(restart_path);
    let second = run_case(&case, &out, None).unwrap();
    assert_eq!(second.iterations, 35);
    assert_eq!(second.timing.iterations, 15);

    let history = fs::read_to_string(second.run_dir.join(HISTORY_FILE)).unwrap();
    let first_line = history.lines().nth(2).unwrap();
    assert!(first_line.starts_with("21 "));
    // resumed output starts without the initial zone
    let field = fs::read_to_string(second.run_dir.join(FIELD_FILE)).unwrap();
    assert!(!field.contains("zone T=\"n=0\""));
}

#[test]
fn configuration_faults_are_flagged() {
    let out = unique_temp_dir("cav_app_bad");
    let mut case = small_case(10);
    case.grid.ny = 8;
    let err = run_case(&case, &out, None).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.is_configuration_fault());

    let mut case = small_case(10);
    case.restart = Some(out.join("missing.json"));
    let err = run_case(&case, &out, None).unwrap_err();
    assert!(!err.is_configuration_fault());
}

#[test]
fn default_case_file_roundtrips() {
    let dir = unique_temp_dir("cav_app_init");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("case.yaml");
    case_service::write_default_case(&path).unwrap();

    let loaded = case_service::load_case(&path).unwrap();
    assert_eq!(loaded, CaseConfig::default());
    let summary = case_service::validate_case_file(&path).unwrap();
    assert_eq!((summary.nx, summary.ny), (65, 65));
    assert!(summary.viscous_dt_bound_s > 0.0);

    assert!(case_service::write_default_case(&path).is_err());
}
