use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ic_controls::{ControlError, ControlSystem, InjectionPoint, MatrixSeries, SignalKind};
use ic_plant::TabulatedPlant;
use ic_project::{ProjectDef, ProjectError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ic-cli")]
#[command(about = "ifoctl CLI - interferometer control loop modelling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a loop description file
    Validate {
        /// Path to the loop description (YAML or JSON)
        project_path: PathBuf,
    },
    /// List the degrees of freedom of a loop description
    Dofs {
        /// Path to the loop description (YAML or JSON)
        project_path: PathBuf,
    },
    /// Export an open-loop transfer function
    Oltf {
        #[command(flatten)]
        inputs: Inputs,
        /// Output name
        to: String,
        /// Input name
        from: String,
        /// Point where the loop is broken (err, ctrl, comp, drive, sens)
        #[arg(long, default_value = "err")]
        point: InjectionPoint,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a closed-loop transfer function
    Cltf {
        #[command(flatten)]
        inputs: Inputs,
        /// Output name
        to: String,
        /// Input name
        from: String,
        /// Point where the loop is broken (err, ctrl, comp, drive, sens)
        #[arg(long, default_value = "err")]
        point: InjectionPoint,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a transfer function between two signals
    Tf {
        #[command(flatten)]
        inputs: Inputs,
        /// Output name (DOF, drive or probe depending on the signal)
        to: String,
        /// Output signal (err, ctrl, comp, drive, sens, pos, spot)
        to_sig: SignalKind,
        /// Input name (DOF, drive or probe depending on the signal)
        from: String,
        /// Input signal (err, ctrl, comp, drive, sens, cal)
        from_sig: SignalKind,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct Inputs {
    /// Path to the loop description (YAML or JSON)
    project_path: PathBuf,
    /// Path to the tabulated plant (YAML or JSON)
    plant_path: PathBuf,
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Dofs { project_path } => cmd_dofs(&project_path),
        Commands::Oltf {
            inputs,
            to,
            from,
            point,
            output,
        } => {
            let cs = tickled_system(&inputs)?;
            let tf = cs.get_oltf(&to, &from, point)?;
            write_csv(&cs, tf.iter().copied(), output.as_deref())
        }
        Commands::Cltf {
            inputs,
            to,
            from,
            point,
            output,
        } => {
            let cs = tickled_system(&inputs)?;
            let tf = cs.get_cltf(&to, &from, point)?;
            write_csv(&cs, tf.iter().copied(), output.as_deref())
        }
        Commands::Tf {
            inputs,
            to,
            to_sig,
            from,
            from_sig,
            output,
        } => {
            let cs = tickled_system(&inputs)?;
            let tf: MatrixSeries = cs.get_tf(Some(&to), to_sig, Some(&from), from_sig)?;
            let entry = tf.entry(0, 0)?;
            write_csv(&cs, entry.iter().copied(), output.as_deref())
        }
    }
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    println!("Validating loop description: {}", project_path.display());
    let project = load_project(project_path)?;
    println!(
        "✓ Loop description is valid ({} DOFs, {} filters)",
        project.dofs.len(),
        project.filters.len()
    );
    Ok(())
}

fn cmd_dofs(project_path: &Path) -> CliResult<()> {
    let project = load_project(project_path)?;

    if project.dofs.is_empty() {
        println!("No degrees of freedom found in {}", project.name);
        return Ok(());
    }

    println!("Degrees of freedom in {}:", project.name);
    for dof in &project.dofs {
        let probes: Vec<String> = dof
            .probes
            .iter()
            .map(|(n, c)| format!("{c}*{n}"))
            .collect();
        let drives: Vec<String> = dof
            .drives
            .iter()
            .map(|(n, c)| format!("{c}*{}", ic_core::drive_key(n, dof.motion)))
            .collect();
        println!(
            "  {} - probes [{}], drives [{}]",
            dof.name,
            probes.join(", "),
            drives.join(", ")
        );
    }
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn load_project(path: &Path) -> CliResult<ProjectDef> {
    let project = if is_json(path) {
        ic_project::load_json(path)?
    } else {
        ic_project::load_yaml(path)?
    };
    Ok(project)
}

fn load_plant(path: &Path) -> CliResult<TabulatedPlant> {
    let plant = if is_json(path) {
        ic_project::load_plant_json(path)?
    } else {
        ic_project::load_plant_yaml(path)?
    };
    Ok(plant)
}

fn tickled_system(inputs: &Inputs) -> CliResult<ControlSystem> {
    let project = load_project(&inputs.project_path)?;
    let plant = load_plant(&inputs.plant_path)?;
    let mut cs = ic_project::build_control_system(&project, Arc::new(plant))?;
    cs.tickle()?;
    tracing::info!(project = %project.name, dofs = cs.dofs().len(), "loops closed");
    Ok(cs)
}

fn write_csv(
    cs: &ControlSystem,
    values: impl Iterator<Item = ic_controls::Complex64>,
    output: Option<&Path>,
) -> CliResult<()> {
    let freqs = cs.frequencies()?;

    let mut csv = String::from("freq_hz,re,im,mag,phase_deg\n");
    let mut rows = 0;
    for (f, v) in freqs.hz().iter().zip(values) {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            f,
            v.re,
            v.im,
            v.norm(),
            v.arg().to_degrees()
        ));
        rows += 1;
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Exported {} frequency points to {}", rows, path.display());
    } else {
        print!("{}", csv);
    }

    Ok(())
}
