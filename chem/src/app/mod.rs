//! Application layer: wire the configuration to the method drivers.

mod basis;
mod geometry;
mod report;
mod runner;
mod tasks;
mod workspace;

pub use basis::{BasisLoader, BasisMap, BasisRegistry, NwchemLoader};
pub use geometry::{build_geometry, Geometry};
pub use runner::run_restricted;
pub use tasks::{ensure_cholesky, generate_fcidump, run_followups};
pub use workspace::{CalculationWorkspace, FileLayout};

use self::report::report_scf_summary;
use crate::config::{Args, Config};
use crate::io::setup_output;
use ::basis::cgto::NwchemBasis;
use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fs;
use tracing::info;

pub struct ChemApplication {
    args: Args,
    config: Config,
}

impl ChemApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());

        let geometry = build_geometry(&self.config)?;
        let charge = self.args.charge.or(self.config.charge).unwrap_or(0);
        let num_electrons = geometry.num_electrons(charge);
        if num_electrons <= 0 {
            return Err(eyre!("Charge {} leaves no electrons to correlate", charge));
        }
        if num_electrons % 2 != 0 {
            return Err(eyre!(
                "The restricted driver needs an even electron count, got {} \
                 (adjust the charge or the geometry)",
                num_electrons
            ));
        }

        let mut registry = BasisRegistry::<NwchemBasis, _>::new(NwchemLoader {
            basis_dir: self.args.basis_dir.clone(),
        });
        let basis_map = registry.load_for_elements(&self.config, &geometry.elements)?;
        let workspace =
            CalculationWorkspace::new(geometry.elements, geometry.coords, basis_map);
        let layout = FileLayout::new(
            &self.config.output_file_prefix(),
            &self.config.basis_name(),
        );

        info!(
            "Running restricted SCF for {} atoms, {} electrons",
            workspace.elements.len(),
            num_electrons
        );
        let scf = run_restricted(&workspace, &self.args, &self.config, &layout)?;
        report_scf_summary(&scf);

        run_followups(&scf, &self.args, &self.config, &layout)
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
