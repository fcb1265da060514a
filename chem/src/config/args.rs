//! Command-line argument parsing for the method drivers.

use clap::Parser;

/// Electronic-structure calculation driven by a YAML configuration file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override density mixing parameter
    #[arg(long)]
    pub density_mixing: Option<f64>,

    /// Override maximum SCF cycles
    #[arg(long)]
    pub max_cycle: Option<usize>,

    /// Override DIIS subspace size (0 disables DIIS)
    #[arg(long)]
    pub diis_subspace_size: Option<usize>,

    /// Override SCF convergence threshold
    #[arg(long)]
    pub convergence_threshold: Option<f64>,

    /// Molecular charge (default: 0 for neutral)
    #[arg(long)]
    pub charge: Option<i32>,

    /// Directory with NWChem-format basis set files
    #[arg(long)]
    pub basis_dir: Option<String>,

    /// Write Cholesky restart files even if the config does not ask for it
    #[arg(long)]
    pub write_restart: bool,

    /// Read Cholesky restart files when present
    #[arg(long)]
    pub read_restart: bool,

    /// Generate the FCIDUMP file and skip the determinant solver
    #[arg(long)]
    pub fcidump_only: bool,
}
