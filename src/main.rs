use clap::{Parser, Subcommand};
use log::{error, info};
use orrery::constants::YEAR_IN_S;
use orrery::generator::{random_cluster, ClusterParams};
use orrery::{export, study, Body, Integrator, Result, Scenario, SimulationConfig, SimulationState};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(about = "Fixed-step N-body gravity simulation")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario file and export its history
    Run {
        scenario: PathBuf,
        #[arg(short, long, default_value = "experiment_data")]
        out: PathBuf,
        /// Override the scenario's integrator
        #[arg(short, long)]
        integrator: Option<Integrator>,
        /// Check for NaN/Inf after every batch
        #[arg(long)]
        strict: bool,
    },
    /// Run a scenario once per time step and report energy drift
    Sweep {
        scenario: PathBuf,
        /// Smallest time step in years
        #[arg(long, default_value_t = 1e-3)]
        dt_min: f64,
        /// Largest time step in years
        #[arg(long, default_value_t = 1e-1)]
        dt_max: f64,
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Simulated duration in years
        #[arg(long, default_value_t = 12.0)]
        years: f64,
        #[arg(short, long)]
        integrator: Option<Integrator>,
    },
    /// Simulate a random equal-mass cluster
    Cluster {
        #[arg(short, long, default_value_t = 10)]
        n_bodies: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 100_000)]
        steps: usize,
        #[arg(long, default_value_t = 100)]
        interval: usize,
        #[arg(short, long, default_value = "experiment_data")]
        out: PathBuf,
    },
}

fn label_of(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string())
}

fn print_state(sim: &SimulationState) {
    println!("x");
    for x in sim.physical_positions() {
        println!("  [{:.6e}, {:.6e}, {:.6e}]", x.x, x.y, x.z);
    }
    println!("v");
    for v in sim.physical_velocities() {
        println!("  [{:.6e}, {:.6e}, {:.6e}]", v.x, v.y, v.z);
    }
    println!("a");
    for a in sim.physical_accelerations() {
        println!("  [{:.6e}, {:.6e}, {:.6e}]", a.x, a.y, a.z);
    }
}

fn run_and_export(
    bodies: &[Body],
    config: &SimulationConfig,
    steps: usize,
    interval: usize,
    integrator: Integrator,
    out: &std::path::Path,
    label: &str,
) -> Result<()> {
    let mut sim = SimulationState::new(bodies, config)?;
    sim.run(steps, interval, integrator)?;
    print_state(&sim);
    export::export_run(out, label, bodies, &sim, steps, interval, integrator)?;
    info!("Exported {} snapshots to {}", sim.history().len(), out.display());
    Ok(())
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Run {
            scenario,
            out,
            integrator,
            strict,
        } => {
            let label = label_of(&scenario);
            let scenario = Scenario::load(&scenario)?;
            let bodies = scenario.resolve_bodies()?;
            let config = scenario
                .simulation
                .clone()
                .with_strict(scenario.simulation.strict || strict)
                .with_progress(true);
            let integrator = integrator.unwrap_or(scenario.run.integrator);
            run_and_export(
                &bodies,
                &config,
                scenario.run.steps,
                scenario.run.interval,
                integrator,
                &out,
                &label,
            )
        }
        Command::Sweep {
            scenario,
            dt_min,
            dt_max,
            count,
            years,
            integrator,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let bodies = scenario.resolve_bodies()?;
            let integrator = integrator.unwrap_or(scenario.run.integrator);
            // Time steps are given in years; convert to the scenario's input units.
            let unit = if scenario.simulation.scaling == orrery::ScalingMode::Natural {
                YEAR_IN_S
            } else {
                1.0
            };
            let ratio = (dt_max / dt_min).powf(1.0 / count.saturating_sub(1).max(1) as f64);
            let dts: Vec<f64> = (0..count)
                .map(|i| dt_min * ratio.powi(i as i32) * unit)
                .collect();
            let runs = study::timestep_sweep(
                &bodies,
                &scenario.simulation,
                &dts,
                years * unit,
                100,
                integrator,
            )?;
            println!("dt_years,steps,snapshots,relative_energy_drift");
            for run in runs {
                println!(
                    "{:e},{},{},{:e}",
                    run.dt / unit,
                    run.steps,
                    run.history.len(),
                    run.relative_energy_drift
                );
            }
            Ok(())
        }
        Command::Cluster {
            n_bodies,
            seed,
            steps,
            interval,
            out,
        } => {
            let params = ClusterParams {
                n_bodies,
                ..ClusterParams::default()
            };
            let bodies = random_cluster(&params, seed);
            let config = SimulationConfig::new(1e-3, 1e-3).with_progress(true);
            run_and_export(
                &bodies,
                &config,
                steps,
                interval,
                Integrator::Symplectic,
                &out,
                &format!("cluster_{seed}"),
            )
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
