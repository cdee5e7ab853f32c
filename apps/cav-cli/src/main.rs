use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use cav_app::{
    AppResult, RunProgressEvent, RunStage, RunSummary, Termination, case_service, run_service,
};
use cav_project::SchemeDef;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cav-cli")]
#[command(about = "Lid-driven cavity solver (artificial compressibility)", long_about = None)]
struct Cli {
    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a case
    Run {
        /// Path to the case YAML (or JSON) file
        case_path: PathBuf,
        /// Output directory holding one subdirectory per run
        #[arg(short, long, default_value = "runs")]
        out: PathBuf,
        /// Continue from this restart record
        #[arg(long)]
        restart: Option<PathBuf>,
        /// Override the iteration cap
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Override the relaxation scheme
        #[arg(long, value_enum)]
        scheme: Option<SchemeArg>,
        /// Print the kernel timing breakdown
        #[arg(long)]
        timing: bool,
    },
    /// Validate a case file
    Validate {
        /// Path to the case YAML (or JSON) file
        case_path: PathBuf,
    },
    /// Write the reference case file
    Init {
        /// Destination; prints to stdout when omitted
        path: Option<PathBuf>,
    },
    /// List runs stored in an output directory
    Runs {
        #[arg(default_value = "runs")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    Sgs,
    PointJacobi,
}

impl From<SchemeArg> for SchemeDef {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Sgs => SchemeDef::Sgs,
            SchemeArg::PointJacobi => SchemeDef::PointJacobi,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            case_path,
            out,
            restart,
            max_iterations,
            scheme,
            timing,
        } => cmd_run(&case_path, &out, restart, max_iterations, scheme, timing),
        Commands::Validate { case_path } => cmd_validate(&case_path).map(|_| ExitCode::SUCCESS),
        Commands::Init { path } => cmd_init(path.as_deref()).map(|_| ExitCode::SUCCESS),
        Commands::Runs { out } => cmd_runs(&out).map(|_| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            if err.is_configuration_fault() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn cmd_run(
    case_path: &Path,
    out: &Path,
    restart: Option<PathBuf>,
    max_iterations: Option<usize>,
    scheme: Option<SchemeArg>,
    timing: bool,
) -> AppResult<ExitCode> {
    if timing {
        cav_core::timing::enable_timing();
    }

    let mut case = case_service::load_case(case_path)?;
    if restart.is_some() {
        case.restart = restart;
    }
    if let Some(max) = max_iterations {
        case.numerics.max_iterations = max;
    }
    if let Some(scheme) = scheme {
        case.numerics.scheme = scheme.into();
    }
    tracing::debug!(path = %case_path.display(), ?case, "case loaded with overrides");

    println!(
        "Running case '{}' on a {}x{} grid",
        case.name, case.grid.nx, case.grid.ny
    );

    let mut last_emit = Instant::now();
    let summary = run_service::run_case(
        &case,
        out,
        Some(&mut |event| {
            let emit_now = event.stage != RunStage::Solving
                || event.iteration.is_none()
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    print_run_summary(&summary);
    if summary.termination == Termination::Diverged {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(case_path: &Path) -> AppResult<()> {
    let summary = case_service::validate_case_file(case_path)?;
    println!("✓ Case is valid: {}", summary.name);
    println!("  Mode:   {}", summary.mode);
    println!("  Scheme: {}", summary.scheme);
    println!("  Grid:   {}x{}", summary.nx, summary.ny);
    println!("  Re:     {}", summary.re);
    println!("  Viscous dt bound: {:.3e} s", summary.viscous_dt_bound_s);
    if let Some(restart) = &summary.restart {
        println!("  Restart: {}", restart);
    }
    Ok(())
}

fn cmd_init(path: Option<&Path>) -> AppResult<()> {
    match path {
        Some(path) => {
            case_service::write_default_case(path)?;
            println!("✓ Wrote default case to {}", path.display());
        }
        None => print!("{}", case_service::default_case_yaml()?),
    }
    Ok(())
}

fn cmd_runs(out: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(out)?;
    if runs.is_empty() {
        println!("No runs found in {}", out.display());
    } else {
        println!("Runs in {}:", out.display());
        for manifest in runs {
            println!(
                "  {} {} ({}, {} after {} iterations)",
                manifest.run_id,
                manifest.case_name,
                manifest.timestamp,
                manifest.summary.termination,
                manifest.summary.iterations
            );
        }
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let mut line = format!(
        "\r{}  elapsed={:.2}s",
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(iter) = event.iteration {
        line.push_str(&format!("  iter={}", iter));
    }
    if let Some(ratio) = event.ratio {
        line.push_str(&format!("  ratio={:.3e}", ratio));
    }
    if let Some(res) = event.residuals {
        line.push_str(&format!(
            "  res=[{:.3e} {:.3e} {:.3e}]",
            res[0], res[1], res[2]
        ));
    }
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_run_summary(summary: &RunSummary) {
    println!("✓ Run {}: {}", summary.termination, summary.run_id);
    println!("  Output:     {}", summary.run_dir.display());
    println!("  Iterations: {}", summary.iterations);
    println!("  Time:       {:.6e} s", summary.time);
    println!(
        "  Residuals:  {:.3e} {:.3e} {:.3e}  (ratio {:.3e})",
        summary.residuals[0], summary.residuals[1], summary.residuals[2], summary.ratio
    );
    if let Some(norms) = &summary.error_norms {
        println!("\nDiscretization error (p, u, v):");
        println!("  L1:   {:.6e} {:.6e} {:.6e}", norms.l1[0], norms.l1[1], norms.l1[2]);
        println!("  L2:   {:.6e} {:.6e} {:.6e}", norms.l2[0], norms.l2[1], norms.l2[2]);
        println!(
            "  Linf: {:.6e} {:.6e} {:.6e}",
            norms.linf[0], norms.linf[1], norms.linf[2]
        );
    }

    let timing = &summary.timing;
    let total = timing.total_time_s.max(1.0e-12);
    println!("\nTiming summary:");
    println!(
        "  Setup: {:.3}s ({:.1}%)",
        timing.setup_time_s,
        100.0 * timing.setup_time_s / total
    );
    println!(
        "  Solve: {:.3}s ({:.1}%)",
        timing.solve_time_s,
        100.0 * timing.solve_time_s / total
    );
    println!(
        "  Save:  {:.3}s ({:.1}%)",
        timing.save_time_s,
        100.0 * timing.save_time_s / total
    );
    println!("  Total: {:.3}s", timing.total_time_s);
    if timing.iterations > 0 {
        println!(
            "  Avg iteration: {:.4}ms",
            1000.0 * timing.solve_time_s / timing.iterations as f64
        );
    }
    if let Some(kernels) = &summary.kernel_timing {
        print!("{}", kernels);
    }
}
